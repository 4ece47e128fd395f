/// Light source lists and visibility filtering.
///
/// The light list is snapshotted at begin_view_set and filtered per view:
/// a point light survives only if its influence sphere covers at least a
/// pixel and intersects the view frustum. The Sun, the implicit primary
/// directional light at the world origin, is modeled as its own variant,
/// is never culled, and always occupies slot 0 so the directional shadow
/// pass can assume it.

use std::sync::Arc;
use glam::{DVec3, Mat3};
use crate::camera::{BoundingSphere, Frustum};
use crate::scene::{LightSource, Scene};

/// Lights whose influence projects to less than this many pixels are
/// culled.
const LIGHT_CULL_THRESHOLD: f32 = 1.0;

/// A light in the scene: either the implicit Sun or an entity-attached
/// source.
#[derive(Clone)]
pub enum LightBinding {
    /// The primary directional light at the world origin.
    Sun,
    /// A point light attached to a scene entity.
    Source(Arc<LightSource>),
}

impl LightBinding {
    /// True if this light casts shadows. The Sun always does.
    pub fn is_shadow_caster(&self) -> bool {
        match self {
            LightBinding::Sun => true,
            LightBinding::Source(light) => light.is_shadow_caster(),
        }
    }

    /// The attached light source, if this is not the Sun.
    pub fn source(&self) -> Option<&Arc<LightSource>> {
        match self {
            LightBinding::Sun => None,
            LightBinding::Source(light) => Some(light),
        }
    }
}

/// A light with its world position, snapshotted at begin_view_set.
#[derive(Clone)]
pub struct LightSourceItem {
    pub binding: LightBinding,
    pub position: DVec3,
}

/// A light that survived per-view filtering.
#[derive(Clone)]
pub struct VisibleLightSourceItem {
    pub binding: LightBinding,
    pub position: DVec3,
    pub camera_relative_position: DVec3,
}

/// Build the view-set light list: the Sun sentinel first, then a light
/// for every visible entity that carries one.
pub(crate) fn build_light_source_list(
    scene: &Scene,
    t: f64,
    lights: &mut Vec<LightSourceItem>,
) {
    lights.clear();

    // The Sun is always present at the world origin.
    lights.push(LightSourceItem {
        binding: LightBinding::Sun,
        position: DVec3::ZERO,
    });

    for (_key, entity) in scene.entities() {
        if let Some(light) = entity.light_source() {
            if entity.is_visible(t) {
                lights.push(LightSourceItem {
                    binding: LightBinding::Source(Arc::clone(light)),
                    position: entity.position(t),
                });
            }
        }
    }
}

/// Filter the light list down to lights that interact with the view
/// frustum, ordered so that shadow casters come first. The Sun is never
/// culled.
pub(crate) fn build_visible_light_list(
    light_sources: &[LightSourceItem],
    camera_position: DVec3,
    to_camera_space: Mat3,
    pixel_size: f32,
    view_frustum: &Frustum,
    visible: &mut Vec<VisibleLightSourceItem>,
) {
    visible.clear();

    for item in light_sources {
        let camera_relative_position = item.position - camera_position;

        let cull = match &item.binding {
            LightBinding::Sun => false,
            LightBinding::Source(light) => {
                let projected_size = (light.range()
                    / camera_relative_position.length() as f32)
                    / pixel_size;
                if projected_size < LIGHT_CULL_THRESHOLD {
                    // The light may be in view, but it affects a region
                    // of less than a pixel.
                    true
                } else {
                    let camera_space_position =
                        to_camera_space * camera_relative_position.as_vec3();
                    !view_frustum.intersects(&BoundingSphere::new(
                        camera_space_position,
                        light.range(),
                    ))
                }
            }
        };

        if !cull {
            visible.push(VisibleLightSourceItem {
                binding: item.binding.clone(),
                position: item.position,
                camera_relative_position,
            });
        }
    }

    // Shadow casters first; the sort is stable, so the Sun stays in
    // front.
    visible.sort_by_key(|light| !light.binding.is_shadow_caster());
}

#[cfg(test)]
#[path = "lights_tests.rs"]
mod tests;
