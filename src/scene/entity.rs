/// SceneEntity — a body, spacecraft, or abstract point in the scene.
///
/// An entity couples a motion state (double-precision position and
/// orientation over time) with optional geometry, an optional light
/// source, and a table of visualizers. Entities with neither geometry nor
/// visualizers are legal; they can still carry a light source.

use std::sync::Arc;
use glam::{DQuat, DVec3};
use rustc_hash::FxHashMap;
use super::geometry::Geometry;
use super::light::LightSource;
use super::visualizer::Visualizer;

slotmap::new_key_type! {
    /// Stable key identifying an entity within a Scene.
    pub struct EntityKey;
}

/// Position and orientation of an entity over time, at double precision.
pub trait MotionState: Send + Sync {
    /// Position at time t (seconds).
    fn position(&self, t: f64) -> DVec3;

    /// Orientation at time t (seconds).
    fn orientation(&self, _t: f64) -> DQuat {
        DQuat::IDENTITY
    }
}

/// A motion state fixed at a constant position and orientation.
#[derive(Debug, Clone, Copy)]
pub struct FixedMotion {
    position: DVec3,
    orientation: DQuat,
}

impl FixedMotion {
    pub fn new(position: DVec3) -> Self {
        Self {
            position,
            orientation: DQuat::IDENTITY,
        }
    }

    pub fn with_orientation(position: DVec3, orientation: DQuat) -> Self {
        Self {
            position,
            orientation,
        }
    }
}

impl MotionState for FixedMotion {
    fn position(&self, _t: f64) -> DVec3 {
        self.position
    }

    fn orientation(&self, _t: f64) -> DQuat {
        self.orientation
    }
}

/// An entity in the scene: motion state plus optional geometry, light
/// source, and visualizers.
pub struct SceneEntity {
    name: String,
    visible: bool,
    motion: Arc<dyn MotionState>,
    geometry: Option<Arc<dyn Geometry>>,
    light_source: Option<Arc<LightSource>>,
    visualizers: FxHashMap<String, Arc<dyn Visualizer>>,
}

impl SceneEntity {
    /// Create a visible entity with the given motion state and no
    /// geometry, light, or visualizers.
    pub fn new(name: impl Into<String>, motion: Arc<dyn MotionState>) -> Self {
        Self {
            name: name.into(),
            visible: true,
            motion,
            geometry: None,
            light_source: None,
            visualizers: FxHashMap::default(),
        }
    }

    /// Entity name (for diagnostics; not required to be unique).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True if the entity exists and should be considered at time t.
    pub fn is_visible(&self, _t: f64) -> bool {
        self.visible
    }

    /// Show or hide the entity.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Position at time t, double precision.
    pub fn position(&self, t: f64) -> DVec3 {
        self.motion.position(t)
    }

    /// Orientation at time t, double precision.
    pub fn orientation(&self, t: f64) -> DQuat {
        self.motion.orientation(t)
    }

    /// The geometry assigned to this entity, if any.
    pub fn geometry(&self) -> Option<&Arc<dyn Geometry>> {
        self.geometry.as_ref()
    }

    /// Assign or remove the entity's geometry.
    pub fn set_geometry(&mut self, geometry: Option<Arc<dyn Geometry>>) {
        self.geometry = geometry;
    }

    /// The light source attached to this entity, if any.
    pub fn light_source(&self) -> Option<&Arc<LightSource>> {
        self.light_source.as_ref()
    }

    /// Attach or remove a light source.
    pub fn set_light_source(&mut self, light: Option<Arc<LightSource>>) {
        self.light_source = light;
    }

    /// True if any visualizers are attached.
    pub fn has_visualizers(&self) -> bool {
        !self.visualizers.is_empty()
    }

    /// Attach a visualizer under a tag, replacing any previous visualizer
    /// with the same tag.
    pub fn set_visualizer(&mut self, tag: impl Into<String>, visualizer: Arc<dyn Visualizer>) {
        self.visualizers.insert(tag.into(), visualizer);
    }

    /// Remove the visualizer with the given tag.
    pub fn remove_visualizer(&mut self, tag: &str) -> Option<Arc<dyn Visualizer>> {
        self.visualizers.remove(tag)
    }

    /// Look up a visualizer by tag.
    pub fn visualizer(&self, tag: &str) -> Option<&Arc<dyn Visualizer>> {
        self.visualizers.get(tag)
    }

    /// Iterate over all attached visualizers.
    pub fn visualizers(&self) -> impl Iterator<Item = (&str, &Arc<dyn Visualizer>)> {
        self.visualizers.iter().map(|(tag, v)| (tag.as_str(), v))
    }
}
