/// Mock graphics collaborators for unit tests (no GPU required)
///
/// MockGraphicsDevice tracks render state like a real backend would, and
/// MockRenderContext keeps working projection/model-view stacks while
/// recording every call, so renderer tests can assert on both final
/// state and the exact command stream.

use std::sync::{Arc, Mutex};
use glam::{DVec3, Mat4, Quat, Vec3};
use crate::camera::{Frustum, PlanarProjection};
use crate::error::{Error, Result};
use crate::scene::{ClippingPolicy, Geometry, Spectrum};
use super::device::{CullFace, GraphicsDevice, Viewport, Winding};
use super::framebuffer::{CubeFace, CubeMapFramebuffer, Framebuffer, TextureHandle};
use super::render_context::{
    Light, RenderContext, RenderPassType, RendererOutput, ShaderCapability,
};

// ============================================================================
// Mock Framebuffer
// ============================================================================

#[derive(Debug)]
pub struct MockFramebuffer {
    pub width: u32,
    pub height: u32,
    pub valid: bool,
    pub depth_texture: TextureHandle,
    pub color_texture: Option<TextureHandle>,
}

impl MockFramebuffer {
    pub fn new(width: u32, height: u32, depth_texture: TextureHandle) -> Self {
        Self {
            width,
            height,
            valid: true,
            depth_texture,
            color_texture: None,
        }
    }
}

impl Framebuffer for MockFramebuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn depth_texture(&self) -> Option<TextureHandle> {
        Some(self.depth_texture)
    }

    fn color_texture(&self) -> Option<TextureHandle> {
        self.color_texture
    }
}

// ============================================================================
// Mock CubeMapFramebuffer
// ============================================================================

pub struct MockCubeMapFramebuffer {
    pub size: u32,
    pub faces: [Arc<dyn Framebuffer>; 6],
    pub color_texture: TextureHandle,
}

impl MockCubeMapFramebuffer {
    pub fn new(size: u32, color_texture: TextureHandle, first_depth_handle: u64) -> Self {
        let faces: [Arc<dyn Framebuffer>; 6] = std::array::from_fn(|i| {
            let mut fb = MockFramebuffer::new(
                size,
                size,
                TextureHandle(first_depth_handle + i as u64),
            );
            fb.color_texture = Some(color_texture);
            Arc::new(fb) as Arc<dyn Framebuffer>
        });
        Self {
            size,
            faces,
            color_texture,
        }
    }
}

impl CubeMapFramebuffer for MockCubeMapFramebuffer {
    fn size(&self) -> u32 {
        self.size
    }

    fn face(&self, face: CubeFace) -> Option<Arc<dyn Framebuffer>> {
        Some(Arc::clone(&self.faces[face.index()]))
    }

    fn color_texture(&self) -> Option<TextureHandle> {
        Some(self.color_texture)
    }
}

// ============================================================================
// Mock GraphicsDevice
// ============================================================================

/// Stateful mock device. State starts at the GL defaults; tests compare
/// snapshots before and after a render to verify restoration.
pub struct MockGraphicsDevice {
    pub color_mask: [bool; 4],
    pub depth_mask: bool,
    pub depth_test: bool,
    pub cull_enabled: bool,
    pub cull_face: CullFace,
    pub front_face: Winding,
    pub depth_range: (f32, f32),
    pub viewport: Viewport,
    pub clear_color: [f32; 4],
    pub bound_framebuffer: Option<Arc<dyn Framebuffer>>,

    pub supports_framebuffers: bool,
    pub supports_float_cube_maps: bool,
    pub max_texture_size: u32,
    pub fail_framebuffer_creation: bool,

    pub created_framebuffers: Vec<(u32, u32)>,
    pub created_cube_maps: Vec<u32>,
    pub clear_calls: usize,
    pub depth_range_history: Vec<(f32, f32)>,
    next_texture_handle: u64,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self {
            color_mask: [true; 4],
            depth_mask: true,
            depth_test: false,
            cull_enabled: false,
            cull_face: CullFace::Back,
            front_face: Winding::CounterClockwise,
            depth_range: (0.0, 1.0),
            viewport: Viewport::new(1, 1),
            clear_color: [0.0, 0.0, 0.0, 0.0],
            bound_framebuffer: None,
            supports_framebuffers: true,
            supports_float_cube_maps: true,
            max_texture_size: 4096,
            fail_framebuffer_creation: false,
            created_framebuffers: Vec::new(),
            created_cube_maps: Vec::new(),
            clear_calls: 0,
            depth_range_history: Vec::new(),
            next_texture_handle: 1,
        }
    }

    /// Snapshot of the restorable state, for before/after comparisons.
    pub fn state_snapshot(&self) -> String {
        format!(
            "mask:{:?} cull:{}/{:?} front:{:?} range:{:?} vp:{:?} clear:{:?} fb:{:?}",
            self.color_mask,
            self.cull_enabled,
            self.cull_face,
            self.front_face,
            self.depth_range,
            self.viewport,
            self.clear_color,
            self.bound_framebuffer.as_ref().map(|fb| fb.depth_texture()),
        )
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn framebuffers_supported(&self) -> bool {
        self.supports_framebuffers
    }

    fn float_cube_maps_supported(&self) -> bool {
        self.supports_float_cube_maps
    }

    fn max_texture_size(&self) -> u32 {
        self.max_texture_size
    }

    fn create_depth_framebuffer(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<Arc<dyn Framebuffer>> {
        if self.fail_framebuffer_creation {
            return Err(Error::OutOfMemory);
        }
        let handle = TextureHandle(self.next_texture_handle);
        self.next_texture_handle += 1;
        self.created_framebuffers.push((width, height));
        Ok(Arc::new(MockFramebuffer::new(width, height, handle)))
    }

    fn create_distance_cube_map(&mut self, size: u32) -> Result<Arc<dyn CubeMapFramebuffer>> {
        if self.fail_framebuffer_creation {
            return Err(Error::OutOfMemory);
        }
        let color = TextureHandle(self.next_texture_handle);
        let first_depth = self.next_texture_handle + 1;
        self.next_texture_handle += 7;
        self.created_cube_maps.push(size);
        Ok(Arc::new(MockCubeMapFramebuffer::new(size, color, first_depth)))
    }

    fn set_color_mask(&mut self, mask: [bool; 4]) {
        self.color_mask = mask;
    }

    fn color_mask(&self) -> [bool; 4] {
        self.color_mask
    }

    fn set_depth_mask(&mut self, enabled: bool) {
        self.depth_mask = enabled;
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;
    }

    fn set_cull_enabled(&mut self, enabled: bool) {
        self.cull_enabled = enabled;
    }

    fn cull_enabled(&self) -> bool {
        self.cull_enabled
    }

    fn set_cull_face(&mut self, face: CullFace) {
        self.cull_face = face;
    }

    fn cull_face(&self) -> CullFace {
        self.cull_face
    }

    fn set_front_face(&mut self, winding: Winding) {
        self.front_face = winding;
    }

    fn front_face(&self) -> Winding {
        self.front_face
    }

    fn set_depth_range(&mut self, front: f32, back: f32) {
        self.depth_range = (front, back);
        self.depth_range_history.push((front, back));
    }

    fn depth_range(&self) -> (f32, f32) {
        self.depth_range
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_clear_color(&mut self, color: [f32; 4]) {
        self.clear_color = color;
    }

    fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    fn clear(&mut self, _color: bool, _depth: bool) {
        self.clear_calls += 1;
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<&Arc<dyn Framebuffer>>) {
        self.bound_framebuffer = framebuffer.map(Arc::clone);
    }

    fn bound_framebuffer(&self) -> Option<Arc<dyn Framebuffer>> {
        self.bound_framebuffer.as_ref().map(Arc::clone)
    }
}

// ============================================================================
// Mock RenderContext
// ============================================================================

/// Render context with working projection/model-view stacks that records
/// every call into a shared log.
pub struct MockRenderContext {
    pub calls: Arc<Mutex<Vec<String>>>,
    projection: Option<PlanarProjection>,
    projection_stack: Vec<Option<PlanarProjection>>,
    model_view: Mat4,
    model_view_stack: Vec<Mat4>,
    camera_orientation: Quat,
    pixel_size: f32,
    pub shadow_map_count: usize,
    pub omni_shadow_map_count: usize,
    pub renderer_output: RendererOutput,
    pub shader_capability: ShaderCapability,
}

impl MockRenderContext {
    pub fn new() -> Self {
        Self::with_log(Arc::new(Mutex::new(Vec::new())))
    }

    pub fn with_log(calls: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            calls,
            projection: None,
            projection_stack: Vec::new(),
            model_view: Mat4::IDENTITY,
            model_view_stack: Vec::new(),
            camera_orientation: Quat::IDENTITY,
            pixel_size: 0.001,
            shadow_map_count: 0,
            omni_shadow_map_count: 0,
            renderer_output: RendererOutput::FragmentColor,
            shader_capability: ShaderCapability::Shaders,
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl RenderContext for MockRenderContext {
    fn push_projection(&mut self) {
        self.projection_stack.push(self.projection);
        self.record("push_projection".to_string());
    }

    fn pop_projection(&mut self) {
        if let Some(projection) = self.projection_stack.pop() {
            self.projection = projection;
        }
        self.record("pop_projection".to_string());
    }

    fn set_projection(&mut self, projection: &PlanarProjection) {
        self.projection = Some(*projection);
        self.record(format!(
            "set_projection near:{:e} far:{:e}",
            projection.near_distance(),
            projection.far_distance()
        ));
    }

    fn frustum(&self) -> Frustum {
        match &self.projection {
            Some(projection) => projection.frustum(),
            None => Frustum::empty(),
        }
    }

    fn push_model_view(&mut self) {
        self.model_view_stack.push(self.model_view);
        self.record("push_model_view".to_string());
    }

    fn pop_model_view(&mut self) {
        if let Some(matrix) = self.model_view_stack.pop() {
            self.model_view = matrix;
        }
        self.record("pop_model_view".to_string());
    }

    fn set_model_view(&mut self, matrix: Mat4) {
        self.model_view = matrix;
        self.record("set_model_view".to_string());
    }

    fn model_view(&self) -> Mat4 {
        self.model_view
    }

    fn rotate_model_view(&mut self, rotation: Quat) {
        self.model_view = self.model_view * Mat4::from_quat(rotation);
        self.record(format!("rotate_model_view {:?}", rotation));
    }

    fn translate_model_view(&mut self, translation: Vec3) {
        self.model_view = self.model_view * Mat4::from_translation(translation);
        self.record(format!("translate_model_view {:?}", translation));
    }

    fn set_camera_orientation(&mut self, orientation: Quat) {
        self.camera_orientation = orientation;
        self.record(format!("set_camera_orientation {:?}", orientation));
    }

    fn camera_orientation(&self) -> Quat {
        self.camera_orientation
    }

    fn set_model_translation(&mut self, translation: DVec3) {
        self.record(format!("set_model_translation {:?}", translation));
    }

    fn set_pixel_size(&mut self, pixel_size: f32) {
        self.pixel_size = pixel_size;
        self.record(format!("set_pixel_size {:e}", pixel_size));
    }

    fn pixel_size(&self) -> f32 {
        self.pixel_size
    }

    fn set_viewport_size(&mut self, width: u32, height: u32) {
        self.record(format!("set_viewport_size {}x{}", width, height));
    }

    fn set_active_light_count(&mut self, count: usize) {
        self.record(format!("set_active_light_count {}", count));
    }

    fn set_light(&mut self, index: usize, light: Light) {
        self.record(format!(
            "set_light {} {:?} {:?}",
            index, light.light_type, light.position
        ));
    }

    fn set_ambient_light(&mut self, color: Spectrum) {
        self.record(format!("set_ambient_light {:?}", color));
    }

    fn set_shadow_map_count(&mut self, count: usize) {
        self.shadow_map_count = count;
        self.record(format!("set_shadow_map_count {}", count));
    }

    fn set_omni_shadow_map_count(&mut self, count: usize) {
        self.omni_shadow_map_count = count;
        self.record(format!("set_omni_shadow_map_count {}", count));
    }

    fn set_shadow_map_matrix(&mut self, index: usize, _matrix: Mat4) {
        self.record(format!("set_shadow_map_matrix {}", index));
    }

    fn set_shadow_map(&mut self, index: usize, texture: TextureHandle) {
        self.record(format!("set_shadow_map {} {:?}", index, texture));
    }

    fn set_omni_shadow_map(&mut self, index: usize, texture: TextureHandle) {
        self.record(format!("set_omni_shadow_map {} {:?}", index, texture));
    }

    fn set_environment_map(&mut self, texture: Option<TextureHandle>) {
        self.record(format!("set_environment_map {:?}", texture));
    }

    fn set_renderer_output(&mut self, output: RendererOutput) {
        self.renderer_output = output;
        self.record(format!("set_renderer_output {:?}", output));
    }

    fn set_pass(&mut self, pass: RenderPassType) {
        self.record(format!("set_pass {:?}", pass));
    }

    fn unbind_shader(&mut self) {
        self.record("unbind_shader".to_string());
    }

    fn shader_capability(&self) -> ShaderCapability {
        self.shader_capability
    }
}

// ============================================================================
// Test geometry
// ============================================================================

/// Configurable geometry recording its draws into a shared log.
pub struct TestGeometry {
    pub name: String,
    pub radius: f32,
    pub policy: ClippingPolicy,
    pub opaque: bool,
    pub shadow_caster: bool,
    pub shadow_receiver: bool,
    pub draw_log: Arc<Mutex<Vec<String>>>,
}

impl TestGeometry {
    pub fn new(name: &str, radius: f32) -> Self {
        Self {
            name: name.to_string(),
            radius,
            policy: ClippingPolicy::PreserveDepthPrecision,
            opaque: true,
            shadow_caster: false,
            shadow_receiver: false,
            draw_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn splittable(name: &str, radius: f32) -> Self {
        let mut geometry = Self::new(name, radius);
        geometry.policy = ClippingPolicy::SplitToPreventClipping;
        geometry
    }

    pub fn with_draw_log(mut self, draw_log: Arc<Mutex<Vec<String>>>) -> Self {
        self.draw_log = draw_log;
        self
    }

    pub fn draws(&self) -> Vec<String> {
        self.draw_log.lock().unwrap().clone()
    }
}

impl Geometry for TestGeometry {
    fn bounding_sphere_radius(&self) -> f32 {
        self.radius
    }

    fn clipping_policy(&self) -> ClippingPolicy {
        self.policy
    }

    fn is_opaque(&self) -> bool {
        self.opaque
    }

    fn is_shadow_caster(&self) -> bool {
        self.shadow_caster
    }

    fn is_shadow_receiver(&self) -> bool {
        self.shadow_receiver
    }

    fn render(&self, _context: &mut dyn RenderContext, _t: f64) {
        self.draw_log
            .lock()
            .unwrap()
            .push(format!("render:{}", self.name));
    }

    fn render_shadow(&self, _context: &mut dyn RenderContext, _t: f64) {
        self.draw_log
            .lock()
            .unwrap()
            .push(format!("shadow:{}", self.name));
    }
}
