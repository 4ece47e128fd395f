/// ViewRenderer — the per-view render orchestrator.
///
/// Draws views of a scene at a simulation time. Views are drawn in sets;
/// within a view set the scene is assumed immutable, so the light list is
/// snapshotted once. A typical frame looks like:
///
/// ```ignore
/// renderer.begin_view_set(&scene, simulation_time)?;
/// renderer.render_view_from_observer(None, &observer, fov, viewport, None)?;
/// renderer.end_view_set()?;
/// ```
///
/// Each view runs the same pipeline: filter lights, collect visible items
/// with double-precision camera-relative positions, partition the depth
/// range into coalesced spans, then render the spans far to front, each
/// with its own sliced projection, its own fraction of the hardware depth
/// buffer, and (when enabled) its own shadow maps.

use std::sync::{Arc, Mutex};
use glam::{DQuat, DVec3, Mat3, Mat4, Vec3, Vec4};
use crate::camera::{BoundingSphere, Chirality, Observer, PlanarProjection};
use crate::error::{Error, Result};
use crate::graphics_device::{
    CubeFace, CubeMapFramebuffer, CullFace, Framebuffer, GraphicsDevice, Light, LightType,
    RenderContext, RenderPassType, RenderStateGuard, RendererOutput, ShaderCapability,
    Viewport, Winding,
};
use crate::scene::{LightSource, LightingEnvironment, Scene, Spectrum};
use crate::{engine_info, engine_warn};
use super::cube_faces::cube_face_camera_rotation;
use super::depth_spans::{self, DepthBufferSpan};
use super::lights::{self, LightBinding, LightSourceItem, VisibleLightSourceItem};
use super::visible_set::{self, ViewParams, VisibleItem};

/// Maximum number of directional shadow maps.
pub const MAX_SHADOW_MAPS: usize = 3;

/// Maximum number of omnidirectional shadow maps.
pub const MAX_OMNI_SHADOW_MAPS: usize = 3;

/// Minimum distance to the near clipping plane; objects nearer to the
/// observer are always culled.
pub const MINIMUM_NEAR_DISTANCE: f32 = 1.0e-5;

/// Maximum distance to the far clipping plane; objects further from the
/// observer are always culled.
pub const MAXIMUM_FAR_DISTANCE: f32 = 1.0e12;

/// Sliced far planes are pushed out by this factor so items at the very
/// back of a span survive 32-bit float round-off. The factor must exceed
/// one ulp but stay small enough that spans barely overlap in depth.
const FAR_PLANE_SAFETY: f32 = 1.0 + 1.0e-6;

const LOG_SOURCE: &str = "orrery3d::ViewRenderer";

/// Scene snapshot held between begin_view_set and end_view_set.
struct ViewSet {
    scene: Arc<Scene>,
    time: f64,
}

/// Immutable per-view state shared by the span rendering functions.
struct RenderFrame<'a> {
    device: &'a Arc<Mutex<dyn GraphicsDevice>>,
    visible_items: &'a [VisibleItem],
    splittable_items: &'a [VisibleItem],
    visible_lights: &'a [VisibleLightSourceItem],
    shadow_maps: &'a [Arc<dyn Framebuffer>],
    omni_shadow_maps: &'a [Arc<dyn CubeMapFramebuffer>],
    shadows_enabled: bool,
    lighting: Option<&'a LightingEnvironment>,
    render_surface: Option<&'a Arc<dyn Framebuffer>>,
    render_viewport: Viewport,
    render_color_mask: [bool; 4],
    current_time: f64,
}

/// The per-view render orchestrator.
pub struct ViewRenderer {
    device: Arc<Mutex<dyn GraphicsDevice>>,
    context: Option<Box<dyn RenderContext>>,

    view_set: Option<ViewSet>,
    light_sources: Vec<LightSourceItem>,

    visible_lights: Vec<VisibleLightSourceItem>,
    visible_items: Vec<VisibleItem>,
    splittable_items: Vec<VisibleItem>,
    depth_spans: Vec<DepthBufferSpan>,
    merged_spans: Vec<DepthBufferSpan>,

    ambient_light: Spectrum,
    shadow_maps: Vec<Arc<dyn Framebuffer>>,
    omni_shadow_maps: Vec<Arc<dyn CubeMapFramebuffer>>,
    shadows_enabled: bool,
    visualizers_enabled: bool,
    sky_layers_enabled: bool,
}

impl ViewRenderer {
    /// Create a renderer over a graphics device. The renderer cannot draw
    /// until `initialize_graphics` installs a render context.
    pub fn new(device: Arc<Mutex<dyn GraphicsDevice>>) -> Self {
        Self {
            device,
            context: None,
            view_set: None,
            light_sources: Vec::new(),
            visible_lights: Vec::new(),
            visible_items: Vec::new(),
            splittable_items: Vec::new(),
            depth_spans: Vec::new(),
            merged_spans: Vec::new(),
            ambient_light: Spectrum::BLACK,
            shadow_maps: Vec::new(),
            omni_shadow_maps: Vec::new(),
            shadows_enabled: false,
            visualizers_enabled: true,
            sky_layers_enabled: true,
        }
    }

    // ===== LIFECYCLE =====

    /// Install the backend render context. Must be called before any view
    /// set is started. Calling it again once initialized is a no-op.
    pub fn initialize_graphics(&mut self, context: Box<dyn RenderContext>) -> Result<()> {
        if self.context.is_none() {
            self.context = Some(context);
        }
        Ok(())
    }

    /// True if `initialize_graphics` has been called.
    pub fn is_initialized(&self) -> bool {
        self.context.is_some()
    }

    /// True if shadows are supported: the backend must have framebuffers
    /// and programmable shaders.
    pub fn shadows_supported(&self) -> bool {
        let context_capable = match &self.context {
            Some(context) => context.shader_capability() != ShaderCapability::FixedFunction,
            None => false,
        };
        context_capable && self.device.lock().unwrap().framebuffers_supported()
    }

    /// True if omnidirectional shadows are supported: additionally
    /// requires float cube map render targets.
    pub fn omni_shadows_supported(&self) -> bool {
        self.shadows_supported() && self.device.lock().unwrap().float_cube_maps_supported()
    }

    /// Allocate directional shadow map resources.
    ///
    /// `shadow_map_size` is the dimension of the square map; it is
    /// clamped to the hardware limit. `shadow_map_count` bounds the
    /// number of shadows cast on any one body and is clamped to
    /// `MAX_SHADOW_MAPS`.
    ///
    /// Returns true if the resources were created. On failure the shadow
    /// maps are cleared and shadows stay off; rendering proceeds without
    /// them.
    pub fn initialize_shadow_maps(
        &mut self,
        shadow_map_size: u32,
        shadow_map_count: usize,
    ) -> bool {
        if self.context.is_none() {
            engine_warn!(
                LOG_SOURCE,
                "initialize_shadow_maps() called before initialize_graphics()"
            );
            return false;
        }

        if !self.shadows_supported() {
            engine_info!(
                LOG_SOURCE,
                "Shadows not supported by graphics hardware and/or drivers."
            );
            return false;
        }

        if shadow_map_size == 0 || shadow_map_count == 0 {
            engine_warn!(LOG_SOURCE, "Zero-size shadow map requested. Shadows not enabled.");
            return false;
        }

        let mut shadow_map_count = shadow_map_count;
        if shadow_map_count > MAX_SHADOW_MAPS {
            engine_info!(
                LOG_SOURCE,
                "Too many shadow maps requested. Using limit of {}",
                MAX_SHADOW_MAPS
            );
            shadow_map_count = MAX_SHADOW_MAPS;
        }

        self.shadows_enabled = false;
        self.shadow_maps.clear();

        let mut device = self.device.lock().unwrap();
        let shadow_map_size = shadow_map_size.min(device.max_texture_size());

        for i in 0..shadow_map_count {
            match device.create_depth_framebuffer(shadow_map_size, shadow_map_size) {
                Ok(shadow_map) => self.shadow_maps.push(shadow_map),
                Err(error) => {
                    engine_warn!(
                        LOG_SOURCE,
                        "Failed to create shadow buffer {}: {}. Shadows not enabled.",
                        i,
                        error
                    );
                    self.shadow_maps.clear();
                    return false;
                }
            }
        }

        engine_info!(
            LOG_SOURCE,
            "Created {} {}x{} shadow buffer(s) for ViewRenderer.",
            shadow_map_count,
            shadow_map_size,
            shadow_map_size
        );

        true
    }

    /// Allocate omnidirectional shadow map resources: cube maps storing
    /// the camera-to-fragment distance in a 32-bit float red channel.
    ///
    /// Same clamping and failure behavior as `initialize_shadow_maps`.
    pub fn initialize_omni_shadow_maps(
        &mut self,
        shadow_map_size: u32,
        shadow_map_count: usize,
    ) -> bool {
        if self.context.is_none() {
            engine_warn!(
                LOG_SOURCE,
                "initialize_omni_shadow_maps() called before initialize_graphics()"
            );
            return false;
        }

        if !self.omni_shadows_supported() {
            engine_info!(
                LOG_SOURCE,
                "Omnidirectional shadows not supported by graphics hardware and/or drivers."
            );
            return false;
        }

        if shadow_map_size == 0 || shadow_map_count == 0 {
            engine_warn!(
                LOG_SOURCE,
                "Zero-size omni shadow map requested. Omni shadows not enabled."
            );
            return false;
        }

        let mut shadow_map_count = shadow_map_count;
        if shadow_map_count > MAX_OMNI_SHADOW_MAPS {
            engine_info!(
                LOG_SOURCE,
                "Too many omni shadow maps requested. Using limit of {}",
                MAX_OMNI_SHADOW_MAPS
            );
            shadow_map_count = MAX_OMNI_SHADOW_MAPS;
        }

        self.omni_shadow_maps.clear();

        let mut device = self.device.lock().unwrap();
        let shadow_map_size = shadow_map_size.min(device.max_cube_map_size());

        for i in 0..shadow_map_count {
            match device.create_distance_cube_map(shadow_map_size) {
                Ok(shadow_map) => self.omni_shadow_maps.push(shadow_map),
                Err(error) => {
                    engine_warn!(
                        LOG_SOURCE,
                        "Failed to create omni shadow buffer {}: {}. Omni shadows not enabled.",
                        i,
                        error
                    );
                    self.omni_shadow_maps.clear();
                    return false;
                }
            }
        }

        engine_info!(
            LOG_SOURCE,
            "Created {} {}x{} cube map shadow buffer(s) for ViewRenderer.",
            shadow_map_count,
            shadow_map_size,
            shadow_map_size
        );

        true
    }

    // ===== TOGGLES =====

    /// True if this renderer has shadows enabled.
    pub fn shadows_enabled(&self) -> bool {
        self.shadows_enabled
    }

    /// Enable or disable the drawing of shadows. A no-op until shadow
    /// maps have been initialized.
    pub fn set_shadows_enabled(&mut self, enable: bool) {
        if let Some(shadow_map) = self.shadow_maps.first() {
            if shadow_map.is_valid() {
                self.shadows_enabled = enable;
            }
        }
    }

    /// True if visualizers will be drawn. Visualizers are on by default.
    pub fn visualizers_enabled(&self) -> bool {
        self.visualizers_enabled
    }

    /// Enable or disable the drawing of visualizers.
    pub fn set_visualizers_enabled(&mut self, enable: bool) {
        self.visualizers_enabled = enable;
    }

    /// True if sky layers will be drawn. Sky layers are on by default.
    pub fn sky_layers_enabled(&self) -> bool {
        self.sky_layers_enabled
    }

    /// Enable or disable the drawing of sky layers. A layer is drawn only
    /// if both this flag and the layer's own visibility are set.
    pub fn set_sky_layers_enabled(&mut self, enable: bool) {
        self.sky_layers_enabled = enable;
    }

    /// The scene-wide ambient fill light.
    pub fn ambient_light(&self) -> Spectrum {
        self.ambient_light
    }

    /// Set the ambient fill light. Black (the default) is realistic for
    /// space scenes; some ambient light helps when clarity matters more
    /// than realism.
    pub fn set_ambient_light(&mut self, spectrum: Spectrum) {
        self.ambient_light = spectrum;
    }

    // ===== VIEW SETS =====

    /// Start drawing one or more views of a scene at the given time.
    ///
    /// The scene must not be modified until `end_view_set`; the light
    /// list is snapshotted here and reused by every view in the set.
    pub fn begin_view_set(&mut self, scene: &Arc<Scene>, time: f64) -> Result<()> {
        if self.context.is_none() {
            return Err(Error::Uninitialized);
        }

        if self.view_set.is_some() {
            return Err(Error::ViewSetAlreadyStarted);
        }

        lights::build_light_source_list(scene, time, &mut self.light_sources);

        self.view_set = Some(ViewSet {
            scene: Arc::clone(scene),
            time,
        });

        Ok(())
    }

    /// Finish the current view set.
    pub fn end_view_set(&mut self) -> Result<()> {
        if self.view_set.is_none() {
            return Err(Error::NoViewSet);
        }

        self.view_set = None;
        self.light_sources.clear();

        Ok(())
    }

    // ===== DIAGNOSTICS =====

    /// The merged depth buffer spans computed by the most recent view,
    /// far-first.
    pub fn merged_depth_spans(&self) -> &[DepthBufferSpan] {
        &self.merged_spans
    }

    /// The visible items collected by the most recent view, sorted by far
    /// distance.
    pub fn visible_items(&self) -> &[VisibleItem] {
        &self.visible_items
    }

    /// The splittable items collected by the most recent view.
    pub fn splittable_items(&self) -> &[VisibleItem] {
        &self.splittable_items
    }

    /// The lights that survived filtering in the most recent view.
    pub fn visible_light_count(&self) -> usize {
        self.visible_lights.len()
    }

    // ===== RENDERING =====

    /// Render a view from the point of view of an observer, with the
    /// standard full-range perspective projection.
    pub fn render_view_from_observer(
        &mut self,
        lighting: Option<&LightingEnvironment>,
        observer: &dyn Observer,
        field_of_view: f64,
        viewport: Viewport,
        render_surface: Option<&Arc<dyn Framebuffer>>,
    ) -> Result<()> {
        let time = match &self.view_set {
            Some(view_set) => view_set.time,
            None => return Err(Error::NoViewSet),
        };

        let projection = PlanarProjection::perspective(
            field_of_view as f32,
            viewport.aspect_ratio(),
            MINIMUM_NEAR_DISTANCE,
            MAXIMUM_FAR_DISTANCE,
        );

        self.render_view(
            lighting,
            observer.absolute_position(time),
            observer.absolute_orientation(time),
            &projection,
            viewport,
            render_surface,
        )
    }

    /// Render visible entities using the given camera position,
    /// orientation, and projection.
    ///
    /// `render_surface` is the framebuffer shadow passes rebind after
    /// rendering into their own targets; None means the default back
    /// buffer. All graphics state touched during the render is restored
    /// before this method returns, on success and on error.
    pub fn render_view(
        &mut self,
        lighting: Option<&LightingEnvironment>,
        camera_position: DVec3,
        camera_orientation: DQuat,
        projection: &PlanarProjection,
        viewport: Viewport,
        render_surface: Option<&Arc<dyn Framebuffer>>,
    ) -> Result<()> {
        if self.context.is_none() {
            return Err(Error::Uninitialized);
        }

        let (scene, current_time) = match &self.view_set {
            Some(view_set) => (Arc::clone(&view_set.scene), view_set.time),
            None => return Err(Error::NoViewSet),
        };

        if viewport.width == 0 || viewport.height == 0 {
            return Err(Error::BadParameter("viewport has zero area".to_string()));
        }

        let device = Arc::clone(&self.device);

        // Capture color mask, culling, winding, depth range, viewport,
        // clear color, and framebuffer binding; all are restored when the
        // guard drops, on every exit path.
        let state_guard = RenderStateGuard::capture(&device);
        let render_color_mask = state_guard.saved_color_mask();

        let to_camera_space = Mat3::from_quat(camera_orientation.conjugate().as_quat());
        let aspect_ratio = viewport.aspect_ratio();
        let field_of_view = projection.fov_y();

        {
            let mut device = device.lock().unwrap();
            device.set_viewport(viewport);

            // All geometry assumes a right-handed projection; reverse the
            // winding when drawing with a left-handed one.
            if projection.chirality() == Chirality::LeftHanded {
                device.set_front_face(Winding::Clockwise);
            }

            device.set_cull_enabled(true);
        }

        let context = match self.context.as_mut() {
            Some(context) => context,
            None => return Err(Error::Uninitialized),
        };
        let context = context.as_mut();

        context.set_camera_orientation(camera_orientation.as_quat());
        context.set_pixel_size(
            (2.0 * (field_of_view as f64 / 2.0).tan() / viewport.height as f64) as f32,
        );
        context.set_viewport_size(viewport.width, viewport.height);

        context.push_model_view();
        context.rotate_model_view(camera_orientation.conjugate().as_quat());

        // Sky layers are drawn first, at infinite depth: no depth writes,
        // no depth test.
        {
            let mut device = device.lock().unwrap();
            device.set_depth_mask(false);
            device.set_depth_test(false);
        }

        context.set_projection(&projection.slice(0.1, 1.0));

        if self.sky_layers_enabled {
            let mut visible_layers: Vec<_> = scene
                .sky_layers()
                .filter(|(_, layer)| layer.is_visible())
                .map(|(_, layer)| Arc::clone(layer))
                .collect();
            visible_layers.sort_by_key(|layer| layer.draw_order());

            for layer in &visible_layers {
                layer.render(context);
            }
        }

        {
            let mut device = device.lock().unwrap();
            device.set_depth_test(true);
            device.set_depth_mask(true);
        }

        context.set_active_light_count(1);
        context.set_ambient_light(self.ambient_light);

        let view_frustum = projection.frustum();

        // Pull the near plane in so that the frustum's corners clear the
        // geometry, not just its center axis.
        let near_adjust = ((field_of_view as f64 / 2.0).cos()
            / (1.0 + (aspect_ratio as f64) * (aspect_ratio as f64)).sqrt())
            as f32;

        lights::build_visible_light_list(
            &self.light_sources,
            camera_position,
            to_camera_space,
            context.pixel_size(),
            &view_frustum,
            &mut self.visible_lights,
        );

        let params = ViewParams {
            current_time,
            camera_position,
            to_camera_space,
            pixel_size: context.pixel_size(),
            near_adjust,
            view_frustum,
            visualizers_enabled: self.visualizers_enabled,
        };

        visible_set::collect_visible_items(
            &scene,
            &params,
            &mut self.visible_items,
            &mut self.splittable_items,
        );

        depth_spans::split_spans(&self.visible_items, &mut self.depth_spans);
        depth_spans::coalesce_spans(&self.depth_spans, &mut self.merged_spans);

        // Splittable geometry may extend beyond the spans of the normal
        // items; pad the span list so it is never clipped.
        if !self.splittable_items.is_empty() {
            depth_spans::extend_spans_for_splittables(
                &mut self.merged_spans,
                &self.splittable_items,
                projection,
            );
        }

        let frame = RenderFrame {
            device: &device,
            visible_items: &self.visible_items,
            splittable_items: &self.splittable_items,
            visible_lights: &self.visible_lights,
            shadow_maps: &self.shadow_maps,
            omni_shadow_maps: &self.omni_shadow_maps,
            shadows_enabled: self.shadows_enabled,
            lighting,
            render_surface,
            render_viewport: viewport,
            render_color_mask,
            current_time,
        };

        // Draw depth buffer spans from back to front. Each span gets its
        // own fraction of the hardware depth range so earlier spans can
        // never depth-test against later ones.
        let span_count = self.merged_spans.len();
        let span_range = if span_count > 0 {
            1.0 / span_count as f32
        } else {
            1.0
        };

        for (i, span) in self.merged_spans.iter().enumerate() {
            let span_index = span_count - 1 - i;
            let span_depth_range = (
                span_index as f32 * span_range,
                (span_index + 1) as f32 * span_range,
            );
            frame
                .device
                .lock()
                .unwrap()
                .set_depth_range(span_depth_range.0, span_depth_range.1);

            render_depth_buffer_span(context, &frame, span, projection, span_depth_range);
        }

        device.lock().unwrap().set_depth_range(0.0, 1.0);

        context.pop_model_view();
        context.unbind_shader();

        Ok(())
    }

    /// Render six views into the faces of a cube map from the given
    /// position. The views point along the universal coordinate axes
    /// unless a rotation is supplied.
    ///
    /// Reflection maps are expected to be in world coordinates: pass an
    /// identity rotation for cube maps used as environment reflections.
    /// Nearby geometry can be excluded by raising `near_distance` above
    /// `MINIMUM_NEAR_DISTANCE`.
    pub fn render_cube_map(
        &mut self,
        lighting: Option<&LightingEnvironment>,
        position: DVec3,
        cube_map: &Arc<dyn CubeMapFramebuffer>,
        near_distance: f32,
        far_distance: f32,
        rotation: DQuat,
    ) -> Result<()> {
        let viewport = Viewport::new(cube_map.size(), cube_map.size());
        let projection = PlanarProjection::perspective_lh(
            std::f32::consts::FRAC_PI_2,
            1.0,
            near_distance,
            far_distance,
        );

        for face in CubeFace::ALL {
            if let Some(framebuffer) = cube_map.face(face) {
                {
                    let mut device = self.device.lock().unwrap();
                    device.bind_framebuffer(Some(&framebuffer));
                    device.set_depth_mask(true);
                    device.clear(true, true);
                }

                let status = self.render_view(
                    lighting,
                    position,
                    rotation * cube_face_camera_rotation(face),
                    &projection,
                    viewport,
                    Some(&framebuffer),
                );

                if let Err(error) = status {
                    self.device.lock().unwrap().bind_framebuffer(None);
                    return Err(error);
                }
            }
        }

        self.device.lock().unwrap().bind_framebuffer(None);

        Ok(())
    }

    /// Render six views into the faces of a shadow cube map, writing
    /// camera distance instead of color.
    pub fn render_shadow_cube_map(
        &mut self,
        lighting: Option<&LightingEnvironment>,
        position: DVec3,
        cube_map: &Arc<dyn CubeMapFramebuffer>,
    ) -> Result<()> {
        if self.context.is_none() {
            return Err(Error::Uninitialized);
        }

        let viewport = Viewport::new(cube_map.size(), cube_map.size());
        let projection = PlanarProjection::perspective_lh(
            std::f32::consts::FRAC_PI_2,
            1.0,
            MINIMUM_NEAR_DISTANCE,
            MAXIMUM_FAR_DISTANCE,
        );

        if let Some(context) = self.context.as_mut() {
            context.set_renderer_output(RendererOutput::CameraDistance);
        }

        let mut status = Ok(());

        for face in CubeFace::ALL {
            if let Some(framebuffer) = cube_map.face(face) {
                {
                    let mut device = self.device.lock().unwrap();
                    device.bind_framebuffer(Some(&framebuffer));
                    device.set_depth_mask(true);
                    device.clear(true, true);
                }

                status = self.render_view(
                    lighting,
                    position,
                    cube_face_camera_rotation(face),
                    &projection,
                    viewport,
                    Some(&framebuffer),
                );

                if status.is_err() {
                    break;
                }
            }
        }

        self.device.lock().unwrap().bind_framebuffer(None);
        if let Some(context) = self.context.as_mut() {
            context.set_renderer_output(RendererOutput::FragmentColor);
        }

        status
    }
}

// ============================================================================
// Span rendering
// ============================================================================

/// Render all items in one depth buffer span.
fn render_depth_buffer_span(
    context: &mut dyn RenderContext,
    frame: &RenderFrame,
    span: &DepthBufferSpan,
    projection: &PlanarProjection,
    span_depth_range: (f32, f32),
) {
    if span.item_count == 0 && frame.splittable_items.is_empty() {
        return;
    }

    let near_distance = projection.near_distance().max(span.near_distance);
    let far_distance = projection.far_distance().min(span.far_distance);
    if far_distance <= near_distance {
        // Entire span lies in front of or behind the view frustum
        return;
    }

    let mut shadows_on = false;
    let mut omni_shadow_count = 0;
    if frame.shadows_enabled && !frame.visible_lights.is_empty() {
        // Shadows from the Sun, which is always the first light source
        shadows_on = render_span_shadows(
            context,
            frame,
            span,
            0,
            frame.visible_lights[0].camera_relative_position,
            span_depth_range,
        );

        // Additional shadow-casting light sources get omni shadow maps,
        // up to the configured capacity.
        for visible_light in &frame.visible_lights[1..] {
            if omni_shadow_count >= frame.omni_shadow_maps.len() {
                break;
            }

            if let LightBinding::Source(light) = &visible_light.binding {
                if light.is_shadow_caster() {
                    render_span_omni_shadows(
                        context,
                        frame,
                        span,
                        omni_shadow_count,
                        light,
                        visible_light.camera_relative_position,
                        span_depth_range,
                    );
                    omni_shadow_count += 1;
                }
            }
        }
    }

    let safe_far_distance = far_distance * FAR_PLANE_SAFETY;

    context.set_projection(&projection.slice(near_distance, safe_far_distance));

    // Translucent rendering is order dependent; drawing opaque items
    // first and translucent items second removes the worst artifacts.
    for pass in [RenderPassType::OpaquePass, RenderPassType::TranslucentPass] {
        context.set_pass(pass);

        // Items in the span, starting from the furthest
        for i in 0..span.item_count {
            let item = &frame.visible_items[span.back_item_index - i];

            if pass == RenderPassType::OpaquePass || !item.geometry.is_opaque() {
                if shadows_on && item.geometry.is_shadow_receiver() {
                    context.set_shadow_map_count(1);
                } else {
                    context.set_shadow_map_count(0);
                }

                if item.geometry.is_shadow_receiver() {
                    context.set_omni_shadow_map_count(omni_shadow_count);
                } else {
                    context.set_omni_shadow_map_count(0);
                }

                let environment_map = frame
                    .lighting
                    .and_then(|lighting| lighting.reflection_regions().first())
                    .map(|region| region.cube_map);
                context.set_environment_map(environment_map);

                draw_item(context, frame, item);
            }
        }

        context.set_shadow_map_count(0);
        context.set_omni_shadow_map_count(0);

        // Splittable items crossing this span, far to near
        for item in frame.splittable_items.iter().rev() {
            if item.near_distance < span.far_distance && item.far_distance > span.near_distance
            {
                if pass == RenderPassType::OpaquePass || !item.geometry.is_opaque() {
                    draw_item(context, frame, item);
                }
            }
        }
    }
}

/// Draw one visible item: bind its lights, position the model-view, and
/// invoke the geometry. Items outside the view frustum get the full
/// setup but no draw call; they exist for shadow casting only.
fn draw_item(context: &mut dyn RenderContext, frame: &RenderFrame, item: &VisibleItem) {
    context.set_model_translation(
        Mat3::from_mat4(context.model_view()).as_dmat3() * item.camera_relative_position,
    );

    let mut light_count = 0;
    for visible_light in frame.visible_lights {
        match &visible_light.binding {
            LightBinding::Sun => {
                context.set_light(
                    0,
                    Light::new(
                        LightType::Directional,
                        visible_light.camera_relative_position.as_vec3(),
                        Spectrum::WHITE,
                        1.0,
                    ),
                );
                light_count += 1;
            }
            LightBinding::Source(light) => {
                let light_position = (visible_light.position - item.position).as_vec3();
                let distance_to_light = light_position.length() - item.bounding_radius;
                let attenuation = 1.0 / (256.0 * light.range() * light.range());
                if distance_to_light < light.range() {
                    context.set_light(
                        light_count,
                        Light::new(
                            LightType::Point,
                            visible_light.camera_relative_position.as_vec3(),
                            light.spectrum(),
                            attenuation,
                        ),
                    );
                    light_count += 1;
                }
            }
        }
    }

    context.set_active_light_count(light_count);

    context.push_model_view();
    context.translate_model_view(item.camera_relative_position.as_vec3());
    context.rotate_model_view(item.orientation);

    if !item.outside_frustum {
        item.geometry.render(context, frame.current_time);
    }

    context.pop_model_view();
}

// ============================================================================
// Shadow rendering
// ============================================================================

/// Bounding sphere of all shadow receivers in a span, and whether any
/// caster is present.
fn span_shadow_group(frame: &RenderFrame, span: &DepthBufferSpan) -> (BoundingSphere, bool) {
    let mut receiver_bounds = BoundingSphere::null();
    let mut casters_present = false;

    for i in 0..span.item_count {
        let item = &frame.visible_items[span.back_item_index - i];

        if item.geometry.is_shadow_receiver() {
            receiver_bounds.merge(&BoundingSphere::new(
                item.camera_relative_position.as_vec3(),
                item.bounding_radius,
            ));
        }

        if item.geometry.is_shadow_caster() {
            casters_present = true;
        }
    }

    (receiver_bounds, casters_present)
}

fn begin_shadow_rendering(device: &Arc<Mutex<dyn GraphicsDevice>>) {
    let mut device = device.lock().unwrap();

    // Depth-only rendering
    device.set_color_mask([false, false, false, false]);
    device.set_depth_mask(true);
    device.set_depth_test(true);

    // Render back faces into the map; the residual acne lands on the
    // unilluminated side where it is far less visible.
    device.set_cull_face(CullFace::Front);
}

fn begin_cubic_shadow_rendering(device: &Arc<Mutex<dyn GraphicsDevice>>) {
    let mut device = device.lock().unwrap();

    // Distance goes into the red channel only
    device.set_color_mask([true, false, false, false]);
    device.set_depth_mask(true);
    device.set_depth_test(true);

    device.set_cull_face(CullFace::Front);
}

/// Restore state touched by shadow rendering: render target, color mask,
/// and cull mode.
fn finish_shadow_rendering(
    device: &Arc<Mutex<dyn GraphicsDevice>>,
    render_surface: Option<&Arc<dyn Framebuffer>>,
    color_mask: [bool; 4],
) {
    let mut device = device.lock().unwrap();
    device.bind_framebuffer(render_surface);
    device.set_color_mask(color_mask);
    device.set_cull_face(CullFace::Back);
}

/// View matrix for drawing the scene from the point of view of a light
/// source, built on a stable orthonormal basis around the light
/// direction.
fn shadow_view_matrix(light_direction: Vec3) -> Mat4 {
    let u = light_direction.any_orthonormal_vector();
    let v = u.cross(light_direction);

    // Rows are v, u, and the light direction
    Mat4::from_cols(
        Vec4::new(v.x, u.x, light_direction.x, 0.0),
        Vec4::new(v.y, u.y, light_direction.y, 0.0),
        Vec4::new(v.z, u.z, light_direction.z, 0.0),
        Vec4::W,
    )
}

/// Bias matrix mapping clip space [-1, 1] onto texture space [0, 1].
fn shadow_bias() -> Mat4 {
    Mat4::from_cols(
        Vec4::new(0.5, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 0.5, 0.0, 0.0),
        Vec4::new(0.0, 0.0, 0.5, 0.0),
        Vec4::new(0.5, 0.5, 0.5, 1.0),
    )
}

/// Bind the shadow framebuffer and set up the light-space orthographic
/// projection. Returns the matrix for sampling this shadow map while
/// drawing geometry; the pushed projection and model-view are popped by
/// the caller.
fn setup_shadow_rendering(
    context: &mut dyn RenderContext,
    device: &Arc<Mutex<dyn GraphicsDevice>>,
    shadow_map: &Arc<dyn Framebuffer>,
    light_direction: Vec3,
    shadow_group_size: f32,
) -> Mat4 {
    {
        let mut device = device.lock().unwrap();
        device.bind_framebuffer(Some(shadow_map));
        device.clear(false, true);
        device.set_viewport(Viewport::new(shadow_map.width(), shadow_map.height()));
        device.set_depth_range(0.0, 1.0);
    }

    let shadow_projection = PlanarProjection::orthographic(
        -shadow_group_size,
        shadow_group_size,
        -shadow_group_size,
        shadow_group_size,
        -shadow_group_size,
        shadow_group_size,
    );
    let model_view = shadow_view_matrix(light_direction);

    context.push_projection();
    context.set_projection(&shadow_projection);
    context.push_model_view();
    context.set_model_view(model_view);

    shadow_bias() * shadow_projection.matrix() * model_view
}

/// Render all shadow casters in a span into the directional shadow map
/// at `shadow_index`. Returns true if a usable shadow map was produced.
///
/// `light_position` is the light position relative to the camera. The
/// light is treated as directional: the span's shadow group is assumed
/// far enough away that its rays are parallel.
fn render_span_shadows(
    context: &mut dyn RenderContext,
    frame: &RenderFrame,
    span: &DepthBufferSpan,
    shadow_index: usize,
    light_position: DVec3,
    span_depth_range: (f32, f32),
) -> bool {
    if !frame.shadows_enabled {
        return false;
    }

    if !frame.device.lock().unwrap().framebuffers_supported() {
        return false;
    }

    let shadow_map = match frame.shadow_maps.get(shadow_index) {
        Some(shadow_map) if shadow_map.is_valid() => shadow_map,
        _ => return false,
    };

    let (receiver_bounds, casters_present) = span_shadow_group(frame, span);

    // Nothing to do without both receivers and casters
    if !casters_present || receiver_bounds.is_null() {
        return false;
    }

    frame.device.lock().unwrap().set_depth_range(0.0, 1.0);
    begin_shadow_rendering(frame.device);

    let shadow_group_center = receiver_bounds.center();
    let shadow_group_radius = receiver_bounds.radius();

    // All objects in the shadow group are far enough from the light that
    // the rays are near parallel and one direction serves the group.
    let light_direction = (light_position + shadow_group_center.as_dvec3())
        .as_vec3()
        .normalize();

    // The shadow transform maps from "shadow group space" (axes aligned
    // with world space, origin at the center of the group of mutually
    // shadowing objects) into shadow texture space.
    let inverse_camera_transform = context.model_view().transpose();
    let mut shadow_transform = setup_shadow_rendering(
        context,
        frame.device,
        shadow_map,
        light_direction,
        shadow_group_radius,
    );
    shadow_transform = shadow_transform
        * Mat4::from_translation(-shadow_group_center)
        * inverse_camera_transform;

    for i in 0..span.item_count {
        let item = &frame.visible_items[span.back_item_index - i];

        if item.geometry.is_shadow_caster() {
            let item_position = item.camera_relative_position.as_vec3();
            context.push_model_view();
            context.translate_model_view(item_position - shadow_group_center);
            context.rotate_model_view(item.orientation);
            item.geometry.render_shadow(context, frame.current_time);
            context.pop_model_view();
        }
    }

    // Matrices pushed in setup_shadow_rendering()
    context.pop_projection();
    context.pop_model_view();

    finish_shadow_rendering(frame.device, frame.render_surface, frame.render_color_mask);

    {
        let mut device = frame.device.lock().unwrap();
        device.set_depth_range(span_depth_range.0, span_depth_range.1);
        device.set_viewport(frame.render_viewport);
    }

    context.set_shadow_map_matrix(shadow_index, shadow_transform);
    if let Some(texture) = shadow_map.depth_texture() {
        context.set_shadow_map(shadow_index, texture);
    }

    true
}

/// Render all shadow casters in a span into the distance cube map at
/// `shadow_index`, one face at a time. Returns true if a usable map was
/// produced.
fn render_span_omni_shadows(
    context: &mut dyn RenderContext,
    frame: &RenderFrame,
    span: &DepthBufferSpan,
    shadow_index: usize,
    light: &Arc<LightSource>,
    light_position: DVec3,
    span_depth_range: (f32, f32),
) -> bool {
    if !frame.shadows_enabled {
        return false;
    }

    if !frame.device.lock().unwrap().framebuffers_supported() {
        return false;
    }

    let cube_map = match frame.omni_shadow_maps.get(shadow_index) {
        Some(cube_map) => cube_map,
        None => return false,
    };

    let (receiver_bounds, casters_present) = span_shadow_group(frame, span);

    if !casters_present || receiver_bounds.is_null() {
        return false;
    }

    {
        let mut device = frame.device.lock().unwrap();
        device.set_viewport(Viewport::new(cube_map.size(), cube_map.size()));
        device.set_depth_range(0.0, 1.0);
    }

    // Cube faces use a left-handed projection, so reverse the winding.
    // The fragment output is switched to camera distance, and the clear
    // distance is huge so unshadowed directions read as unoccluded.
    begin_cubic_shadow_rendering(frame.device);
    frame
        .device
        .lock()
        .unwrap()
        .set_front_face(Winding::Clockwise);
    context.set_renderer_output(RendererOutput::CameraDistance);
    frame
        .device
        .lock()
        .unwrap()
        .set_clear_color([1.0e15, 0.0, 0.0, 0.0]);

    context.push_projection();

    for face in CubeFace::ALL {
        let framebuffer = match cube_map.face(face) {
            Some(framebuffer) => framebuffer,
            None => continue,
        };

        {
            let mut device = frame.device.lock().unwrap();
            device.bind_framebuffer(Some(&framebuffer));
            device.set_depth_mask(true);
            device.clear(true, true);
        }

        let camera_orientation = cube_face_camera_rotation(face).as_quat();
        let to_camera_space = Mat3::from_quat(camera_orientation.conjugate());

        context.push_model_view();
        context.set_model_view(Mat4::IDENTITY);
        context.rotate_model_view(camera_orientation.conjugate());

        // The camera orientation is stored separately; restore it after
        // this face.
        let saved_camera = context.camera_orientation();
        context.set_camera_orientation(camera_orientation);

        let face_projection = PlanarProjection::perspective_lh(
            std::f32::consts::FRAC_PI_2,
            1.0,
            light.range() * 1.0e-4,
            light.range(),
        );
        let face_frustum = face_projection.frustum();

        context.set_projection(&face_projection);

        for i in 0..span.item_count {
            let item = &frame.visible_items[span.back_item_index - i];

            if item.geometry.is_shadow_caster() {
                let item_position = (item.camera_relative_position - light_position).as_vec3();
                let camera_space_position = to_camera_space * item_position;

                // Cull casters against the face frustum to avoid
                // redrawing into faces they cannot affect
                if face_frustum.intersects(&BoundingSphere::new(
                    camera_space_position,
                    light.range(),
                )) {
                    context.push_model_view();
                    context.translate_model_view(item_position);
                    context.rotate_model_view(item.orientation);
                    item.geometry.render_shadow(context, frame.current_time);
                    context.pop_model_view();
                }
            }
        }

        context.pop_model_view();
        context.set_camera_orientation(saved_camera);
    }

    context.pop_projection();

    context.set_renderer_output(RendererOutput::FragmentColor);
    finish_shadow_rendering(frame.device, frame.render_surface, frame.render_color_mask);

    {
        let mut device = frame.device.lock().unwrap();
        device.set_front_face(Winding::CounterClockwise);
        device.set_depth_range(span_depth_range.0, span_depth_range.1);
        device.set_viewport(frame.render_viewport);
        device.set_clear_color([0.0, 0.0, 0.0, 0.0]);
    }

    if let Some(texture) = cube_map.color_texture() {
        context.set_omni_shadow_map(shadow_index, texture);
    }

    true
}

#[cfg(test)]
#[path = "view_renderer_tests.rs"]
mod tests;
