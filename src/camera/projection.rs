/// PlanarProjection — perspective and orthographic view projections.
///
/// Matrix conventions match OpenGL's glFrustum/glOrtho. A projection can be
/// `slice`d to a narrower near/far range without changing its field of
/// view, which is how the renderer maps each depth-buffer span onto the
/// full hardware depth range.

use glam::{DVec3, Mat4, Vec2, Vec4};
use super::frustum::Frustum;

/// Projection type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionType {
    Perspective,
    Orthographic,
}

/// Handedness of the projected coordinate system.
///
/// Cube-map faces are rendered with left-handed projections; the renderer
/// flips the triangle winding accordingly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chirality {
    LeftHanded,
    RightHanded,
}

/// A planar projection defined by its clipping planes.
#[derive(Debug, Clone, Copy)]
pub struct PlanarProjection {
    projection_type: ProjectionType,
    left: f32,
    right: f32,
    bottom: f32,
    top: f32,
    near_distance: f32,
    far_distance: f32,
}

impl PlanarProjection {
    /// Create a new planar projection.
    ///
    /// With `ProjectionType::Perspective` this is equivalent to glFrustum,
    /// with `ProjectionType::Orthographic` to glOrtho. Near and far are
    /// positive distances to the clipping planes.
    pub fn new(
        projection_type: ProjectionType,
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near_distance: f32,
        far_distance: f32,
    ) -> Self {
        Self {
            projection_type,
            left,
            right,
            bottom,
            top,
            near_distance,
            far_distance,
        }
    }

    /// Create a right-handed symmetric perspective projection
    /// (same projection as gluPerspective).
    ///
    /// `fov_y` is the vertical field of view in radians.
    pub fn perspective(fov_y: f32, aspect_ratio: f32, near_distance: f32, far_distance: f32) -> Self {
        let y = (0.5 * fov_y).tan() * near_distance;
        let x = y * aspect_ratio;
        Self::new(ProjectionType::Perspective, -x, x, -y, y, near_distance, far_distance)
    }

    /// Create a left-handed symmetric perspective projection.
    pub fn perspective_lh(fov_y: f32, aspect_ratio: f32, near_distance: f32, far_distance: f32) -> Self {
        let mut projection = Self::perspective(fov_y, aspect_ratio, near_distance, far_distance);
        projection.left = -projection.left;
        projection.right = -projection.right;
        projection
    }

    /// Create an orthographic projection (same projection as glOrtho).
    pub fn orthographic(
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near_distance: f32,
        far_distance: f32,
    ) -> Self {
        Self::new(ProjectionType::Orthographic, left, right, bottom, top, near_distance, far_distance)
    }

    /// Create an orthographic projection for 2D rendering on the z = 0
    /// plane (near = -1, far = +1).
    pub fn orthographic_2d(left: f32, right: f32, bottom: f32, top: f32) -> Self {
        Self::orthographic(left, right, bottom, top, -1.0, 1.0)
    }

    // ===== GETTERS =====

    /// Projection type (Perspective or Orthographic).
    pub fn projection_type(&self) -> ProjectionType {
        self.projection_type
    }

    /// Coordinate of the left vertical clipping plane.
    pub fn left(&self) -> f32 {
        self.left
    }

    /// Coordinate of the right vertical clipping plane.
    pub fn right(&self) -> f32 {
        self.right
    }

    /// Coordinate of the bottom horizontal clipping plane.
    pub fn bottom(&self) -> f32 {
        self.bottom
    }

    /// Coordinate of the top horizontal clipping plane.
    pub fn top(&self) -> f32 {
        self.top
    }

    /// Distance to the near clipping plane.
    pub fn near_distance(&self) -> f32 {
        self.near_distance
    }

    /// Distance to the far clipping plane.
    pub fn far_distance(&self) -> f32 {
        self.far_distance
    }

    /// Handedness of the projection.
    pub fn chirality(&self) -> Chirality {
        if (self.right < self.left) ^ (self.top < self.bottom) {
            Chirality::LeftHanded
        } else {
            Chirality::RightHanded
        }
    }

    /// Ratio of width to height.
    pub fn aspect_ratio(&self) -> f32 {
        (self.right - self.left) / (self.top - self.bottom)
    }

    /// Vertical field of view in radians.
    pub fn fov_y(&self) -> f32 {
        ((self.top - self.bottom).abs() * 0.5 / self.near_distance).atan() * 2.0
    }

    /// Horizontal field of view in radians.
    pub fn fov_x(&self) -> f32 {
        ((self.right - self.left).abs() * 0.5 / self.near_distance).atan() * 2.0
    }

    /// Diagonal field of view in radians.
    pub fn fov_diagonal(&self) -> f32 {
        let diagonal = Vec2::new(self.right - self.left, self.top - self.bottom).length();
        (diagonal * 0.5 / self.near_distance).atan() * 2.0
    }

    /// The 4x4 matrix applying this projection to a homogeneous coordinate.
    pub fn matrix(&self) -> Mat4 {
        let x = self.right - self.left;
        let y = self.top - self.bottom;
        let z = self.far_distance - self.near_distance;

        match self.projection_type {
            ProjectionType::Perspective => {
                let near2 = self.near_distance * 2.0;
                Mat4::from_cols(
                    Vec4::new(near2 / x, 0.0, 0.0, 0.0),
                    Vec4::new(0.0, near2 / y, 0.0, 0.0),
                    Vec4::new(
                        (self.right + self.left) / x,
                        (self.top + self.bottom) / y,
                        -(self.far_distance + self.near_distance) / z,
                        -1.0,
                    ),
                    Vec4::new(
                        0.0,
                        0.0,
                        -(2.0 * self.far_distance * self.near_distance) / z,
                        0.0,
                    ),
                )
            }
            ProjectionType::Orthographic => Mat4::from_cols(
                Vec4::new(2.0 / x, 0.0, 0.0, 0.0),
                Vec4::new(0.0, 2.0 / y, 0.0, 0.0),
                Vec4::new(0.0, 0.0, -2.0 / z, 0.0),
                Vec4::new(
                    -(self.right + self.left) / x,
                    -(self.top + self.bottom) / y,
                    -(self.far_distance + self.near_distance) / z,
                    1.0,
                ),
            ),
        }
    }

    /// The viewing frustum for this projection: a truncated pyramid for
    /// perspective projections, a box for orthographic ones.
    pub fn frustum(&self) -> Frustum {
        let mut f = Frustum::empty();
        f.near_z = self.near_distance;
        f.far_z = self.far_distance;

        let sign_x = if self.left < self.right { 1.0 } else { -1.0 };
        let sign_y = if self.bottom < self.top { 1.0 } else { -1.0 };

        match self.projection_type {
            ProjectionType::Perspective => {
                let n = self.near_distance as f64;
                f.plane_normals[0] =
                    DVec3::new(n, 0.0, (self.left * sign_x) as f64).normalize();
                f.plane_normals[1] =
                    DVec3::new(-n, 0.0, (-self.right * sign_x) as f64).normalize();
                f.plane_normals[2] =
                    DVec3::new(0.0, n, (self.bottom * sign_y) as f64).normalize();
                f.plane_normals[3] =
                    DVec3::new(0.0, -n, (-self.top * sign_y) as f64).normalize();
            }
            ProjectionType::Orthographic => {
                f.plane_normals[0] = DVec3::NEG_X;
                f.plane_normals[1] = DVec3::X;
                f.plane_normals[2] = DVec3::NEG_Y;
                f.plane_normals[3] = DVec3::Y;
            }
        }

        f
    }

    /// A projection identical to this one except for the near and far
    /// planes. For perspective projections the lateral planes are scaled
    /// so the field of view is preserved.
    pub fn slice(&self, near_distance: f32, far_distance: f32) -> PlanarProjection {
        match self.projection_type {
            ProjectionType::Orthographic => Self::new(
                self.projection_type,
                self.left,
                self.right,
                self.bottom,
                self.top,
                near_distance,
                far_distance,
            ),
            ProjectionType::Perspective => {
                let near_ratio = near_distance as f64 / self.near_distance as f64;
                Self::new(
                    self.projection_type,
                    (self.left as f64 * near_ratio) as f32,
                    (self.right as f64 * near_ratio) as f32,
                    (self.bottom as f64 * near_ratio) as f32,
                    (self.top as f64 * near_ratio) as f32,
                    near_distance,
                    far_distance,
                )
            }
        }
    }
}

#[cfg(test)]
#[path = "projection_tests.rs"]
mod tests;
