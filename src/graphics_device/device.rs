/// GraphicsDevice — the platform render-state owner.
///
/// One implementation exists per backend (GL, Vulkan, mock). The device
/// owns exactly the state the renderer mutates during a frame: masks,
/// culling, winding, depth range, viewport, clear color, and the bound
/// framebuffer. Every setter has a matching getter so a scoped guard can
/// capture and restore state across a render (see `RenderStateGuard`).
///
/// All rendering happens on the thread owning the GPU context; the
/// device is shared as `Arc<Mutex<dyn GraphicsDevice>>` only so that the
/// renderer and its guards can hold it at the same time.

use std::sync::Arc;
use crate::error::Result;
use super::framebuffer::{CubeMapFramebuffer, Framebuffer};

/// Which faces are discarded by culling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullFace {
    Front,
    Back,
}

/// Triangle winding treated as front-facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winding {
    Clockwise,
    CounterClockwise,
}

/// A rectangular region of the render surface, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// A viewport at the surface origin.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    /// Ratio of width to height.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Platform graphics state and framebuffer factory.
pub trait GraphicsDevice: Send {
    // ===== CAPABILITIES =====

    /// True if off-screen framebuffers are available. Without them,
    /// shadows are unsupported.
    fn framebuffers_supported(&self) -> bool {
        true
    }

    /// True if cube maps with 32-bit float color attachments are
    /// available. Without them, omnidirectional shadows are unsupported.
    fn float_cube_maps_supported(&self) -> bool {
        true
    }

    /// Largest supported square texture dimension.
    fn max_texture_size(&self) -> u32;

    /// Largest supported cube map face dimension.
    fn max_cube_map_size(&self) -> u32 {
        self.max_texture_size()
    }

    // ===== RESOURCE CREATION =====

    /// Create a square depth-only framebuffer for shadow rendering.
    fn create_depth_framebuffer(&mut self, width: u32, height: u32)
        -> Result<Arc<dyn Framebuffer>>;

    /// Create a cube map framebuffer with a single-channel 32-bit float
    /// color attachment, for storing fragment distances.
    fn create_distance_cube_map(&mut self, size: u32) -> Result<Arc<dyn CubeMapFramebuffer>>;

    // ===== RENDER STATE =====

    /// Enable or disable writes per color channel (RGBA).
    fn set_color_mask(&mut self, mask: [bool; 4]);
    fn color_mask(&self) -> [bool; 4];

    /// Enable or disable depth writes.
    fn set_depth_mask(&mut self, enabled: bool);

    /// Enable or disable the depth test.
    fn set_depth_test(&mut self, enabled: bool);

    /// Enable or disable face culling.
    fn set_cull_enabled(&mut self, enabled: bool);
    fn cull_enabled(&self) -> bool;

    /// Select which faces are culled.
    fn set_cull_face(&mut self, face: CullFace);
    fn cull_face(&self) -> CullFace;

    /// Select the front-facing winding.
    fn set_front_face(&mut self, winding: Winding);
    fn front_face(&self) -> Winding;

    /// Map normalized depth onto a sub-range of the hardware depth
    /// buffer. Each depth-buffer span renders into its own sub-range.
    fn set_depth_range(&mut self, front: f32, back: f32);
    fn depth_range(&self) -> (f32, f32);

    /// Set the viewport rectangle.
    fn set_viewport(&mut self, viewport: Viewport);
    fn viewport(&self) -> Viewport;

    /// Set the color buffer clear value.
    fn set_clear_color(&mut self, color: [f32; 4]);
    fn clear_color(&self) -> [f32; 4];

    /// Clear the color and/or depth attachments of the bound framebuffer.
    fn clear(&mut self, color: bool, depth: bool);

    /// Bind a framebuffer, or None for the default back buffer.
    fn bind_framebuffer(&mut self, framebuffer: Option<&Arc<dyn Framebuffer>>);
    fn bound_framebuffer(&self) -> Option<Arc<dyn Framebuffer>>;
}
