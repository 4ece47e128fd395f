/// Scene — the collection of entities and sky layers to render.
///
/// Entities are stored in a SlotMap for O(1) insert/remove with stable
/// keys. The renderer holds the scene immutably for the duration of a
/// view set; all mutation happens between view sets.

use std::sync::Arc;
use slotmap::SlotMap;
use rustc_hash::FxHashMap;
use super::entity::{EntityKey, SceneEntity};
use super::sky_layer::SkyLayer;

/// A renderable scene: entities plus keyed sky layers.
#[derive(Default)]
pub struct Scene {
    /// Entities stored in a slot map for O(1) insert/remove
    entities: SlotMap<EntityKey, SceneEntity>,
    /// Sky layers keyed by tag; draw order is a property of the layer
    sky_layers: FxHashMap<String, Arc<dyn SkyLayer>>,
}

impl Scene {
    /// Create a new empty scene.
    pub fn new() -> Self {
        Self {
            entities: SlotMap::with_key(),
            sky_layers: FxHashMap::default(),
        }
    }

    /// Add an entity to the scene.
    ///
    /// Returns a stable key that remains valid until the entity is
    /// removed.
    pub fn add_entity(&mut self, entity: SceneEntity) -> EntityKey {
        self.entities.insert(entity)
    }

    /// Remove an entity. Returns the entity, or None if the key is
    /// invalid.
    pub fn remove_entity(&mut self, key: EntityKey) -> Option<SceneEntity> {
        self.entities.remove(key)
    }

    /// Get an entity by key.
    pub fn entity(&self, key: EntityKey) -> Option<&SceneEntity> {
        self.entities.get(key)
    }

    /// Get a mutable entity by key.
    pub fn entity_mut(&mut self, key: EntityKey) -> Option<&mut SceneEntity> {
        self.entities.get_mut(key)
    }

    /// Iterate over all entities (key, entity).
    pub fn entities(&self) -> impl Iterator<Item = (EntityKey, &SceneEntity)> {
        self.entities.iter()
    }

    /// Number of entities in the scene.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Add or replace the sky layer with the given tag.
    pub fn set_sky_layer(&mut self, tag: impl Into<String>, layer: Arc<dyn SkyLayer>) {
        self.sky_layers.insert(tag.into(), layer);
    }

    /// Remove the sky layer with the given tag.
    pub fn remove_sky_layer(&mut self, tag: &str) -> Option<Arc<dyn SkyLayer>> {
        self.sky_layers.remove(tag)
    }

    /// Look up a sky layer by tag.
    pub fn sky_layer(&self, tag: &str) -> Option<&Arc<dyn SkyLayer>> {
        self.sky_layers.get(tag)
    }

    /// Iterate over all sky layers.
    pub fn sky_layers(&self) -> impl Iterator<Item = (&str, &Arc<dyn SkyLayer>)> {
        self.sky_layers.iter().map(|(tag, l)| (tag.as_str(), l))
    }

    /// Remove all entities and sky layers.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.sky_layers.clear();
    }
}

#[cfg(test)]
#[path = "scene_tests.rs"]
mod tests;
