/// LightingEnvironment — per-view lighting state beyond the light list.
///
/// Currently carries reflection regions: captured environment cube maps
/// with the bounding sphere of the region they are valid for. The
/// renderer binds the first region's cube map as the environment map
/// when drawing shadow receivers.

use crate::camera::BoundingSphere;
use crate::graphics_device::TextureHandle;

/// A region of space with a captured reflection cube map.
#[derive(Debug, Clone, Copy)]
pub struct ReflectionRegion {
    /// Bounds of the region the capture is valid for.
    pub region: BoundingSphere,
    /// The captured environment cube map.
    pub cube_map: TextureHandle,
}

/// Lighting state supplied per view by the caller.
#[derive(Debug, Clone, Default)]
pub struct LightingEnvironment {
    reflection_regions: Vec<ReflectionRegion>,
}

impl LightingEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all lighting environment state.
    pub fn reset(&mut self) {
        self.reflection_regions.clear();
    }

    /// Captured reflection regions.
    pub fn reflection_regions(&self) -> &[ReflectionRegion] {
        &self.reflection_regions
    }

    /// Add a reflection region.
    pub fn add_reflection_region(&mut self, region: ReflectionRegion) {
        self.reflection_regions.push(region);
    }
}
