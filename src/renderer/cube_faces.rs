/// Camera rotations for rendering into cube map faces.
///
/// Each face camera looks along one of the six signed axes, composed with
/// a 180° roll about Z so that all face images share a consistent up axis
/// and sample correctly as a cube map.

use std::f64::consts::{FRAC_PI_2, PI};
use glam::DQuat;
use crate::graphics_device::CubeFace;

/// Camera rotation used when drawing into the given cube map face.
pub(crate) fn cube_face_camera_rotation(face: CubeFace) -> DQuat {
    let z180 = DQuat::from_rotation_z(PI);

    let look = match face {
        CubeFace::PositiveX => DQuat::from_rotation_y(-FRAC_PI_2),
        CubeFace::NegativeX => DQuat::from_rotation_y(FRAC_PI_2),
        CubeFace::PositiveY => DQuat::from_rotation_x(FRAC_PI_2),
        CubeFace::NegativeY => DQuat::from_rotation_x(-FRAC_PI_2),
        CubeFace::PositiveZ => DQuat::IDENTITY,
        CubeFace::NegativeZ => DQuat::from_rotation_y(PI),
    };

    look * z180
}

#[cfg(test)]
#[path = "cube_faces_tests.rs"]
mod tests;
