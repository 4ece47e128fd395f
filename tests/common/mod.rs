//! Shared mock collaborators for integration tests.
//!
//! Implements the engine's platform traits (GraphicsDevice,
//! RenderContext, Framebuffer, CubeMapFramebuffer) and a recording
//! Geometry entirely on the CPU, so full render pipelines can run
//! without a GPU.

use std::sync::{Arc, Mutex};
use orrery_3d_engine::camera::{Frustum, PlanarProjection};
use orrery_3d_engine::error::Result;
use orrery_3d_engine::glam::{DVec3, Mat4, Quat, Vec3};
use orrery_3d_engine::graphics_device::{
    CubeFace, CubeMapFramebuffer, CullFace, Framebuffer, GraphicsDevice, Light, RenderContext,
    RenderPassType, RendererOutput, ShaderCapability, TextureHandle, Viewport, Winding,
};
use orrery_3d_engine::scene::{ClippingPolicy, Geometry, Spectrum};

// ============================================================================
// Framebuffers
// ============================================================================

pub struct FakeFramebuffer {
    pub width: u32,
    pub height: u32,
    pub depth_texture: TextureHandle,
    pub color_texture: Option<TextureHandle>,
}

impl Framebuffer for FakeFramebuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn depth_texture(&self) -> Option<TextureHandle> {
        Some(self.depth_texture)
    }

    fn color_texture(&self) -> Option<TextureHandle> {
        self.color_texture
    }
}

pub struct FakeCubeMap {
    pub size: u32,
    pub faces: [Arc<dyn Framebuffer>; 6],
    pub color_texture: TextureHandle,
}

impl FakeCubeMap {
    pub fn new(size: u32, first_handle: u64) -> Self {
        let color_texture = TextureHandle(first_handle);
        let faces: [Arc<dyn Framebuffer>; 6] = std::array::from_fn(|i| {
            Arc::new(FakeFramebuffer {
                width: size,
                height: size,
                depth_texture: TextureHandle(first_handle + 1 + i as u64),
                color_texture: Some(color_texture),
            }) as Arc<dyn Framebuffer>
        });
        Self {
            size,
            faces,
            color_texture,
        }
    }
}

impl CubeMapFramebuffer for FakeCubeMap {
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
// Graphics device
// ============================================================================

pub struct FakeDevice {
    pub color_mask: [bool; 4],
    pub cull_enabled: bool,
    pub cull_face: CullFace,
    pub front_face: Winding,
    pub depth_range: (f32, f32),
    pub viewport: Viewport,
    pub clear_color: [f32; 4],
    pub bound_framebuffer: Option<Arc<dyn Framebuffer>>,
    next_handle: u64,
}

impl FakeDevice {
    pub fn new() -> Self {
        Self {
            color_mask: [true; 4],
            cull_enabled: false,
            cull_face: CullFace::Back,
            front_face: Winding::CounterClockwise,
            depth_range: (0.0, 1.0),
            viewport: Viewport::new(1, 1),
            clear_color: [0.0; 4],
            bound_framebuffer: None,
            next_handle: 1,
        }
    }

    pub fn state_snapshot(&self) -> String {
        format!(
            "{:?} {} {:?} {:?} {:?} {:?} {:?} {:?}",
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

impl GraphicsDevice for FakeDevice {
    fn max_texture_size(&self) -> u32 {
        4096
    }

    fn create_depth_framebuffer(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<Arc<dyn Framebuffer>> {
        let handle = TextureHandle(self.next_handle);
        self.next_handle += 1;
        Ok(Arc::new(FakeFramebuffer {
            width,
            height,
            depth_texture: handle,
            color_texture: None,
        }))
    }

    fn create_distance_cube_map(&mut self, size: u32) -> Result<Arc<dyn CubeMapFramebuffer>> {
        let first = self.next_handle;
        self.next_handle += 7;
        Ok(Arc::new(FakeCubeMap::new(size, first)))
    }

    fn set_color_mask(&mut self, mask: [bool; 4]) {
        self.color_mask = mask;
    }

    fn color_mask(&self) -> [bool; 4] {
        self.color_mask
    }

    fn set_depth_mask(&mut self, _enabled: bool) {}

    fn set_depth_test(&mut self, _enabled: bool) {}

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

    fn clear(&mut self, _color: bool, _depth: bool) {}

    fn bind_framebuffer(&mut self, framebuffer: Option<&Arc<dyn Framebuffer>>) {
        self.bound_framebuffer = framebuffer.map(Arc::clone);
    }

    fn bound_framebuffer(&self) -> Option<Arc<dyn Framebuffer>> {
        self.bound_framebuffer.as_ref().map(Arc::clone)
    }
}

// ============================================================================
// Render context
// ============================================================================

pub struct FakeContext {
    projection: Option<PlanarProjection>,
    projection_stack: Vec<Option<PlanarProjection>>,
    model_view: Mat4,
    model_view_stack: Vec<Mat4>,
    camera_orientation: Quat,
    pixel_size: f32,
}

impl FakeContext {
    pub fn new() -> Self {
        Self {
            projection: None,
            projection_stack: Vec::new(),
            model_view: Mat4::IDENTITY,
            model_view_stack: Vec::new(),
            camera_orientation: Quat::IDENTITY,
            pixel_size: 0.001,
        }
    }
}

impl RenderContext for FakeContext {
    fn push_projection(&mut self) {
        self.projection_stack.push(self.projection);
    }

    fn pop_projection(&mut self) {
        if let Some(projection) = self.projection_stack.pop() {
            self.projection = projection;
        }
    }

    fn set_projection(&mut self, projection: &PlanarProjection) {
        self.projection = Some(*projection);
    }

    fn frustum(&self) -> Frustum {
        match &self.projection {
            Some(projection) => projection.frustum(),
            None => Frustum::empty(),
        }
    }

    fn push_model_view(&mut self) {
        self.model_view_stack.push(self.model_view);
    }

    fn pop_model_view(&mut self) {
        if let Some(matrix) = self.model_view_stack.pop() {
            self.model_view = matrix;
        }
    }

    fn set_model_view(&mut self, matrix: Mat4) {
        self.model_view = matrix;
    }

    fn model_view(&self) -> Mat4 {
        self.model_view
    }

    fn rotate_model_view(&mut self, rotation: Quat) {
        self.model_view = self.model_view * Mat4::from_quat(rotation);
    }

    fn translate_model_view(&mut self, translation: Vec3) {
        self.model_view = self.model_view * Mat4::from_translation(translation);
    }

    fn set_camera_orientation(&mut self, orientation: Quat) {
        self.camera_orientation = orientation;
    }

    fn camera_orientation(&self) -> Quat {
        self.camera_orientation
    }

    fn set_model_translation(&mut self, _translation: DVec3) {}

    fn set_pixel_size(&mut self, pixel_size: f32) {
        self.pixel_size = pixel_size;
    }

    fn pixel_size(&self) -> f32 {
        self.pixel_size
    }

    fn set_viewport_size(&mut self, _width: u32, _height: u32) {}

    fn set_active_light_count(&mut self, _count: usize) {}

    fn set_light(&mut self, _index: usize, _light: Light) {}

    fn set_ambient_light(&mut self, _color: Spectrum) {}

    fn set_shadow_map_count(&mut self, _count: usize) {}

    fn set_omni_shadow_map_count(&mut self, _count: usize) {}

    fn set_shadow_map_matrix(&mut self, _index: usize, _matrix: Mat4) {}

    fn set_shadow_map(&mut self, _index: usize, _texture: TextureHandle) {}

    fn set_omni_shadow_map(&mut self, _index: usize, _texture: TextureHandle) {}

    fn set_environment_map(&mut self, _texture: Option<TextureHandle>) {}

    fn set_renderer_output(&mut self, _output: RendererOutput) {}

    fn set_pass(&mut self, _pass: RenderPassType) {}

    fn unbind_shader(&mut self) {}

    fn shader_capability(&self) -> ShaderCapability {
        ShaderCapability::Shaders
    }
}

// ============================================================================
// Recording geometry
// ============================================================================

pub struct RecordingGeometry {
    pub name: String,
    pub radius: f32,
    pub policy: ClippingPolicy,
    pub shadow_caster: bool,
    pub shadow_receiver: bool,
    pub draw_log: Arc<Mutex<Vec<String>>>,
}

impl RecordingGeometry {
    pub fn new(name: &str, radius: f32, draw_log: &Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            name: name.to_string(),
            radius,
            policy: ClippingPolicy::PreserveDepthPrecision,
            shadow_caster: false,
            shadow_receiver: false,
            draw_log: Arc::clone(draw_log),
        }
    }
}

impl Geometry for RecordingGeometry {
    fn bounding_sphere_radius(&self) -> f32 {
        self.radius
    }

    fn clipping_policy(&self) -> ClippingPolicy {
        self.policy
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
