/// Observer — a viewpoint in the scene.
///
/// Positions and orientations are sampled at double precision; the
/// renderer subtracts the observer position from entity positions before
/// narrowing to single precision, which is what keeps meter-scale detail
/// stable at astronomical distances.

use glam::{DQuat, DVec3};

/// A camera viewpoint sampled at a simulation time.
pub trait Observer: Send + Sync {
    /// Absolute position at time t (seconds).
    fn absolute_position(&self, t: f64) -> DVec3;

    /// Absolute orientation at time t (seconds).
    fn absolute_orientation(&self, t: f64) -> DQuat;
}

/// An observer fixed at a position and orientation, ignoring time.
#[derive(Debug, Clone, Copy)]
pub struct FixedObserver {
    position: DVec3,
    orientation: DQuat,
}

impl FixedObserver {
    pub fn new(position: DVec3, orientation: DQuat) -> Self {
        Self {
            position,
            orientation,
        }
    }
}

impl Observer for FixedObserver {
    fn absolute_position(&self, _t: f64) -> DVec3 {
        self.position
    }

    fn absolute_orientation(&self, _t: f64) -> DQuat {
        self.orientation
    }
}
