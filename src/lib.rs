/*!
# Orrery 3D Engine

Rendering engine for scenes of astronomically separated, physically large
bodies: planets, spacecraft, orbits, labels. A camera in low orbit can see
surface detail meters away and a star field light-seconds away in the same
frame, a depth range no single hardware depth buffer can resolve. The
engine partitions each view into depth-buffer spans, renders them far to
front with sliced projections and private fractions of the hardware depth
range, and generates directional and omnidirectional shadow maps per span.

## Architecture

- **ViewRenderer**: the per-view orchestrator (view sets, span rendering,
  shadow passes, cube map capture)
- **Scene**: entities with double-precision motion states, geometry and
  visualizer capability traits, light sources, sky layers
- **GraphicsDevice / RenderContext**: the platform seam; backends
  implement these traits, the engine never touches a graphics API
- **Camera**: projections, frusta, bounding spheres, observers

Positions are carried at double precision until the camera-relative
subtraction, then narrowed to single precision.
*/

pub mod camera;
pub mod engine;
pub mod error;
pub mod graphics_device;
pub mod log;
pub mod renderer;
pub mod scene;

pub use engine::Engine;
pub use error::{Error, Result};

// Re-export math library
pub use glam;
