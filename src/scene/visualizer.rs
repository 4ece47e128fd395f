/// Visualizer — auxiliary geometry attached to an entity.
///
/// Visualizers draw markers, labels, axes, sensor footprints, and other
/// annotations at an entity's position. Their size is usually unrelated to
/// the entity's physical size, so they are exempt from the projected-size
/// cull. A visualizer resolves its orientation against its host entity;
/// the host is passed by reference at query time and never retained.

use std::sync::Arc;
use glam::DQuat;
use super::entity::SceneEntity;
use super::geometry::Geometry;

/// How a visualizer is positioned in depth relative to its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthAdjustment {
    /// Draw at the host position.
    KeepDepth,
    /// Pull the visualizer toward the camera so it is drawn in front of
    /// the host geometry.
    AdjustToFront,
}

/// Annotation geometry attached to a scene entity.
pub trait Visualizer: Send + Sync {
    /// True if the visualizer should be drawn.
    fn is_visible(&self) -> bool {
        true
    }

    /// The geometry drawn for this visualizer.
    fn geometry(&self) -> &Arc<dyn Geometry>;

    /// Orientation of the visualizer at time t. `host` is the entity the
    /// visualizer is attached to; body-fixed visualizers return the host
    /// orientation, camera-facing ones ignore it.
    fn orientation(&self, _host: &SceneEntity, _t: f64) -> DQuat {
        DQuat::IDENTITY
    }

    /// Depth positioning relative to the host geometry.
    fn depth_adjustment(&self) -> DepthAdjustment {
        DepthAdjustment::KeepDepth
    }
}
