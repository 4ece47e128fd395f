/// RenderStateGuard — scoped capture and restore of device render state.
///
/// The renderer mutates process-wide graphics state (masks, culling,
/// winding, depth range, viewport, clear color, framebuffer binding).
/// Callers must observe none of that after a render returns, on success
/// or on any early exit. The guard captures the state on construction
/// and restores it on drop, so every exit path of a render is covered.

use std::sync::{Arc, Mutex};
use super::device::{CullFace, GraphicsDevice, Viewport, Winding};
use super::framebuffer::Framebuffer;

/// Saved device state, restored when the guard drops.
struct SavedState {
    color_mask: [bool; 4],
    cull_enabled: bool,
    cull_face: CullFace,
    front_face: Winding,
    depth_range: (f32, f32),
    viewport: Viewport,
    clear_color: [f32; 4],
    framebuffer: Option<Arc<dyn Framebuffer>>,
}

/// Scoped guard restoring graphics device state on drop.
pub struct RenderStateGuard {
    device: Arc<Mutex<dyn GraphicsDevice>>,
    saved: SavedState,
}

impl RenderStateGuard {
    /// Capture the current device state.
    pub fn capture(device: &Arc<Mutex<dyn GraphicsDevice>>) -> Self {
        let saved = {
            let device = device.lock().unwrap();
            SavedState {
                color_mask: device.color_mask(),
                cull_enabled: device.cull_enabled(),
                cull_face: device.cull_face(),
                front_face: device.front_face(),
                depth_range: device.depth_range(),
                viewport: device.viewport(),
                clear_color: device.clear_color(),
                framebuffer: device.bound_framebuffer(),
            }
        };

        Self {
            device: Arc::clone(device),
            saved,
        }
    }

    /// The color mask at capture time.
    pub fn saved_color_mask(&self) -> [bool; 4] {
        self.saved.color_mask
    }
}

impl Drop for RenderStateGuard {
    fn drop(&mut self) {
        let mut device = self.device.lock().unwrap();
        device.set_color_mask(self.saved.color_mask);
        device.set_cull_enabled(self.saved.cull_enabled);
        device.set_cull_face(self.saved.cull_face);
        device.set_front_face(self.saved.front_face);
        device.set_depth_range(self.saved.depth_range.0, self.saved.depth_range.1);
        device.set_viewport(self.saved.viewport);
        device.set_clear_color(self.saved.clear_color);
        device.bind_framebuffer(self.saved.framebuffer.as_ref());
    }
}
