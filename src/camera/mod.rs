//! Camera module — projection, frustum, bounding sphere, and observer.
//!
//! Passive geometric tools consumed by the renderer. The renderer does
//! not store cameras; every view is described by the caller through a
//! position, an orientation, and a `PlanarProjection`.

mod bounding_sphere;
mod frustum;
mod observer;
mod projection;

pub use bounding_sphere::BoundingSphere;
pub use frustum::Frustum;
pub use observer::{FixedObserver, Observer};
pub use projection::{Chirality, PlanarProjection, ProjectionType};
