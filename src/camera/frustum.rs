/// Frustum — six-sided convex volume visible through a rectangular viewport.
///
/// The view points along the -z axis of camera space. Two of the bounding
/// planes are z = -near_z and z = -far_z; the other four are planes through
/// the origin with the normals in `plane_normals` (inward-pointing). For an
/// orthographic projection the side "planes" degenerate to the axis
/// directions and the volume is a box.

use glam::{DVec3, Vec3};
use super::bounding_sphere::BoundingSphere;

/// Camera-space view frustum used for bounding-sphere visibility tests.
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    /// Distance to the near plane (positive, along -z)
    pub near_z: f32,
    /// Distance to the far plane (positive, along -z)
    pub far_z: f32,
    /// Inward normals of the four side planes (left, right, bottom, top)
    pub plane_normals: [DVec3; 4],
}

impl Frustum {
    /// A degenerate frustum: unit depth range, no side planes.
    pub fn empty() -> Self {
        Self {
            near_z: 0.0,
            far_z: 1.0,
            plane_normals: [DVec3::ZERO; 4],
        }
    }

    /// Return true if the sphere intersects the frustum, false if not.
    pub fn intersects(&self, sphere: &BoundingSphere) -> bool {
        // Test the near and far planes
        if sphere.center().z - sphere.radius() > -self.near_z
            || sphere.center().z + sphere.radius() < -self.far_z
        {
            return false;
        }

        for normal in &self.plane_normals {
            let n = Vec3::new(normal.x as f32, normal.y as f32, normal.z as f32);
            if n.dot(sphere.center()) <= -sphere.radius() {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
