/// Geometry — the renderable capability set of a scene entity.
///
/// The engine never inspects meshes or shaders; it only needs the bounds,
/// the clipping policy, the opacity and shadow flags, and the two render
/// entry points. Concrete geometry (planet ellipsoids, trajectory plots,
/// billboards, sensor volumes) lives outside this crate.

use glam::Vec3;
use crate::graphics_device::RenderContext;

/// How the renderer may trade near-plane position against depth precision
/// for a piece of geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClippingPolicy {
    /// Keep the near plane far enough out that depth precision is never
    /// worse than 1/1000 of the bounding diameter. Appropriate for solid
    /// bodies; the nearest sliver may be clipped when the camera is
    /// almost touching the surface.
    PreserveDepthPrecision,

    /// Never clip: the near plane may come as close as the global
    /// minimum. Depth precision suffers for large geometry.
    PreventClipping,

    /// Never clip, and redraw the geometry into every depth-buffer span
    /// it crosses. Required for trajectories and other geometry spanning
    /// many orders of magnitude in depth.
    SplitToPreventClipping,
}

/// Renderable geometry attached to a scene entity or visualizer.
pub trait Geometry: Send + Sync {
    /// Radius of a sphere centered at the geometry origin that contains
    /// the geometry at all times.
    fn bounding_sphere_radius(&self) -> f32;

    /// Largest safe distance from the camera plane to the near clipping
    /// plane. `to_camera` is the vector from the geometry origin to the
    /// camera, in the geometry's local frame.
    ///
    /// The default is the distance to the bounding sphere surface, which
    /// is exact for spherical bodies and conservative otherwise.
    fn near_plane_distance(&self, to_camera: Vec3) -> f32 {
        (to_camera.length() - self.bounding_sphere_radius()).max(0.0)
    }

    /// Near-plane handling for this geometry.
    fn clipping_policy(&self) -> ClippingPolicy {
        ClippingPolicy::PreserveDepthPrecision
    }

    /// True if the geometry has no translucent parts. Opaque geometry is
    /// drawn in the opaque sub-pass only.
    fn is_opaque(&self) -> bool {
        true
    }

    /// True if this geometry writes depth into shadow maps.
    fn is_shadow_caster(&self) -> bool {
        false
    }

    /// True if this geometry samples shadow maps when drawn.
    fn is_shadow_receiver(&self) -> bool {
        false
    }

    /// Draw the geometry. The model-view on the context is already
    /// positioned at the geometry origin with its orientation applied.
    fn render(&self, context: &mut dyn RenderContext, t: f64);

    /// Draw the geometry into a shadow map. Defaults to the normal
    /// render path; geometry with cheaper depth-only representations can
    /// override.
    fn render_shadow(&self, context: &mut dyn RenderContext, t: f64) {
        self.render(context, t);
    }
}
