//! Scene management module
//!
//! Provides the scene container, entities with double-precision motion
//! states, geometry and visualizer capability traits, light sources, and
//! sky layers.

mod entity;
mod geometry;
mod light;
mod lighting;
mod scene;
mod sky_layer;
mod visualizer;

pub use entity::{EntityKey, FixedMotion, MotionState, SceneEntity};
pub use geometry::{ClippingPolicy, Geometry};
pub use light::{LightSource, Spectrum};
pub use lighting::{LightingEnvironment, ReflectionRegion};
pub use scene::Scene;
pub use sky_layer::SkyLayer;
pub use visualizer::{DepthAdjustment, Visualizer};
