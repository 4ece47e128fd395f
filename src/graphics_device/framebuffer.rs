/// Framebuffer abstractions — depth-only shadow targets and distance
/// cube maps.
///
/// Framebuffers are created by the GraphicsDevice and handed to the
/// renderer as trait objects. Textures cross the trait boundary as opaque
/// handles; the render context knows how to bind them.

use std::sync::Arc;

/// Opaque handle to a backend texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// One face of a cube map, in the conventional ±X/±Y/±Z order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    /// All six faces in index order.
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    /// Index of this face in `ALL`.
    pub fn index(&self) -> usize {
        match self {
            CubeFace::PositiveX => 0,
            CubeFace::NegativeX => 1,
            CubeFace::PositiveY => 2,
            CubeFace::NegativeY => 3,
            CubeFace::PositiveZ => 4,
            CubeFace::NegativeZ => 5,
        }
    }
}

/// A render target. Shadow maps are square depth-only framebuffers; cube
/// map faces carry a single-channel float color attachment as well.
pub trait Framebuffer: Send + Sync {
    /// Width in pixels.
    fn width(&self) -> u32;

    /// Height in pixels.
    fn height(&self) -> u32;

    /// True if the framebuffer was completely allocated and can be
    /// rendered into.
    fn is_valid(&self) -> bool {
        true
    }

    /// The depth attachment, if any.
    fn depth_texture(&self) -> Option<TextureHandle>;

    /// The color attachment, if any.
    fn color_texture(&self) -> Option<TextureHandle> {
        None
    }
}

/// A six-faced cube map render target.
///
/// Omni shadow maps store the camera-to-fragment distance in a 32-bit
/// float red channel; reflection captures store ordinary color.
pub trait CubeMapFramebuffer: Send + Sync {
    /// Edge length of each (square) face in pixels.
    fn size(&self) -> u32;

    /// The framebuffer for one face, if it was allocated.
    fn face(&self, face: CubeFace) -> Option<Arc<dyn Framebuffer>>;

    /// The cube map color texture shared by all faces.
    fn color_texture(&self) -> Option<TextureHandle>;
}
