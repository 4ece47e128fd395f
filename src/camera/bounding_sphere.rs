/// BoundingSphere — spherical bounding volume.
///
/// A sphere with a negative radius is *null* (contains nothing); note that
/// a zero-radius sphere is distinct from a null sphere. Null spheres are
/// the identity element of `merge`, which lets shadow passes fold an
/// arbitrary set of receiver bounds starting from `BoundingSphere::null()`.

use glam::Vec3;

/// Spherical bounding volume. Negative radius denotes the null sphere.
#[derive(Debug, Clone, Copy)]
pub struct BoundingSphere {
    center: Vec3,
    radius: f32,
}

impl BoundingSphere {
    /// Construct a null bounding sphere.
    pub fn null() -> Self {
        Self {
            center: Vec3::ZERO,
            radius: -1.0,
        }
    }

    /// Construct a bounding sphere with the specified center and radius.
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Center of this bounding sphere.
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Radius of this bounding sphere.
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Return true if the sphere is null (contains nothing).
    pub fn is_null(&self) -> bool {
        self.radius < 0.0
    }

    /// Return true if this bounding sphere completely contains the other.
    pub fn contains(&self, other: &BoundingSphere) -> bool {
        if other.radius < self.radius {
            let rdiff = self.radius - other.radius;
            (self.center - other.center).length_squared() <= rdiff * rdiff
        } else {
            false
        }
    }

    /// Return true if this bounding sphere intersects the other.
    pub fn intersects(&self, other: &BoundingSphere) -> bool {
        let rsum = self.radius + other.radius;
        (self.center - other.center).length_squared() <= rsum * rsum
    }

    /// Grow this sphere to the minimum radius sphere containing both it
    /// and the other sphere.
    pub fn merge(&mut self, other: &BoundingSphere) {
        if self.is_null() {
            *self = *other;
        } else if other.is_null() {
            // Merging a null sphere is a no-op
        } else {
            let v = other.center - self.center;
            let center_distance = v.length();

            if center_distance + other.radius <= self.radius {
                // Other sphere already contained in this one
            } else if center_distance + self.radius <= other.radius {
                // This sphere completely contained in the other
                *self = *other;
            } else {
                self.center += (0.5 * (other.radius + center_distance - self.radius)
                    / center_distance)
                    * v;
                self.radius = 0.5 * (other.radius + center_distance + self.radius);
            }
        }
    }
}

#[cfg(test)]
#[path = "bounding_sphere_tests.rs"]
mod tests;
