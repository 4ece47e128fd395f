/// RenderContext — the shading-state collaborator geometry renders
/// through.
///
/// The context owns the projection and model-view stacks, the per-draw
/// light set, and the shadow and environment map bindings. The renderer
/// drives it; geometry implementations read from it while drawing. One
/// context exists per backend and is installed into the renderer with
/// `initialize_graphics`.

use glam::{DVec3, Mat4, Quat, Vec3};
use crate::camera::{Frustum, PlanarProjection};
use crate::scene::Spectrum;
use super::framebuffer::TextureHandle;

/// What the fragment stage writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererOutput {
    /// Ordinary shaded color.
    FragmentColor,
    /// Distance from the fragment to the camera, in the red channel.
    /// Used when building omnidirectional shadow maps.
    CameraDistance,
}

/// Which sub-pass is being drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPassType {
    OpaquePass,
    TranslucentPass,
}

/// Shading capability of the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderCapability {
    /// Fixed-function pipeline only; shadows are unavailable.
    FixedFunction,
    /// Programmable shaders available.
    Shaders,
}

/// Kind of a bound light.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightType {
    Directional,
    Point,
}

/// A light bound to a context slot for the current draw.
#[derive(Debug, Clone, Copy)]
pub struct Light {
    pub light_type: LightType,
    /// Direction (for directional lights) or camera-relative position
    /// (for point lights).
    pub position: Vec3,
    pub color: Spectrum,
    pub attenuation: f32,
}

impl Light {
    pub fn new(light_type: LightType, position: Vec3, color: Spectrum, attenuation: f32) -> Self {
        Self {
            light_type,
            position,
            color,
            attenuation,
        }
    }
}

/// Backend shading state driven by the renderer.
pub trait RenderContext {
    // ===== PROJECTION =====

    /// Push the current projection onto the projection stack.
    fn push_projection(&mut self);

    /// Pop the projection stack.
    fn pop_projection(&mut self);

    /// Replace the current projection.
    fn set_projection(&mut self, projection: &PlanarProjection);

    /// View frustum of the current projection, in camera space.
    fn frustum(&self) -> Frustum;

    // ===== MODEL-VIEW =====

    /// Push the current model-view matrix onto the stack.
    fn push_model_view(&mut self);

    /// Pop the model-view stack.
    fn pop_model_view(&mut self);

    /// Replace the current model-view matrix.
    fn set_model_view(&mut self, matrix: Mat4);

    /// The current model-view matrix.
    fn model_view(&self) -> Mat4;

    /// Post-multiply the model-view by a rotation.
    fn rotate_model_view(&mut self, rotation: Quat);

    /// Post-multiply the model-view by a translation.
    fn translate_model_view(&mut self, translation: Vec3);

    // ===== CAMERA =====

    /// Set the camera orientation (kept separately from the model-view
    /// for view-dependent effects).
    fn set_camera_orientation(&mut self, orientation: Quat);
    fn camera_orientation(&self) -> Quat;

    /// Set the double-precision world-space model translation for the
    /// current draw (used for high-precision vertex transforms).
    fn set_model_translation(&mut self, translation: DVec3);

    /// Set the angular size of one pixel, in radians.
    fn set_pixel_size(&mut self, pixel_size: f32);
    fn pixel_size(&self) -> f32;

    /// Set the viewport dimensions available to shaders.
    fn set_viewport_size(&mut self, width: u32, height: u32);

    // ===== LIGHTS =====

    /// Number of lights active for the next draw.
    fn set_active_light_count(&mut self, count: usize);

    /// Bind a light to a slot.
    fn set_light(&mut self, index: usize, light: Light);

    /// Set the scene-wide ambient fill light.
    fn set_ambient_light(&mut self, color: Spectrum);

    // ===== SHADOWS =====

    /// Number of directional shadow maps active for the next draw.
    fn set_shadow_map_count(&mut self, count: usize);

    /// Number of omnidirectional shadow maps active for the next draw.
    fn set_omni_shadow_map_count(&mut self, count: usize);

    /// Set the camera-to-shadow-texture transform for a slot.
    fn set_shadow_map_matrix(&mut self, index: usize, matrix: Mat4);

    /// Bind a directional shadow map depth texture to a slot.
    fn set_shadow_map(&mut self, index: usize, texture: TextureHandle);

    /// Bind an omnidirectional shadow distance cube map to a slot.
    fn set_omni_shadow_map(&mut self, index: usize, texture: TextureHandle);

    /// Bind or clear the environment reflection cube map.
    fn set_environment_map(&mut self, texture: Option<TextureHandle>);

    // ===== PASS CONTROL =====

    /// Select what the fragment stage writes.
    fn set_renderer_output(&mut self, output: RendererOutput);

    /// Select the sub-pass (opaque or translucent).
    fn set_pass(&mut self, pass: RenderPassType);

    /// Unbind any active shader program.
    fn unbind_shader(&mut self);

    /// Shading capability of the backend.
    fn shader_capability(&self) -> ShaderCapability;
}
