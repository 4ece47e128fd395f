//! Graphics device module — the platform seam.
//!
//! The renderer drives a backend through two trait objects: the
//! `GraphicsDevice` (process-wide render state, framebuffer factory) and
//! the `RenderContext` (projection/model-view stacks, lights, shadow and
//! environment bindings). Backends implement both; the engine never
//! touches a graphics API directly.

mod device;
mod framebuffer;
mod render_context;
mod state_guard;

#[cfg(test)]
pub mod mock_graphics;

pub use device::{CullFace, GraphicsDevice, Viewport, Winding};
pub use framebuffer::{CubeFace, CubeMapFramebuffer, Framebuffer, TextureHandle};
pub use render_context::{
    Light, LightType, RenderContext, RenderPassType, RendererOutput, ShaderCapability,
};
pub use state_guard::RenderStateGuard;
