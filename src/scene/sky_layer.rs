/// SkyLayer — background layers drawn behind all scene geometry.
///
/// Star fields, constellation figures, and coordinate grids are sky
/// layers. They are drawn first in each view, in draw-order, with depth
/// writes and depth testing disabled.

use crate::graphics_device::RenderContext;

/// A background layer (star field, grid, ...) drawn at infinite depth.
pub trait SkyLayer: Send + Sync {
    /// True if the layer should be drawn. Layers are also subject to the
    /// renderer-wide sky-layer toggle.
    fn is_visible(&self) -> bool {
        true
    }

    /// Layers with lower draw order are drawn first.
    fn draw_order(&self) -> i32 {
        0
    }

    /// Draw the layer.
    fn render(&self, context: &mut dyn RenderContext);
}
