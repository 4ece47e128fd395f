//! Renderer module — the per-view render orchestrator and its parts.
//!
//! `ViewRenderer` drives the whole pipeline; the submodules hold the
//! individually testable stages: light filtering, visible item
//! collection, and depth span partitioning.

mod cube_faces;
mod depth_spans;
mod lights;
mod view_renderer;
mod visible_set;

pub use depth_spans::DepthBufferSpan;
pub use lights::{LightBinding, LightSourceItem, VisibleLightSourceItem};
pub use view_renderer::{
    ViewRenderer, MAXIMUM_FAR_DISTANCE, MAX_OMNI_SHADOW_MAPS, MAX_SHADOW_MAPS,
    MINIMUM_NEAR_DISTANCE,
};
pub use visible_set::VisibleItem;
