/// Visible item collection — the per-view scan over scene entities.
///
/// For each visible entity the camera-relative position is computed as a
/// double-precision difference and only then narrowed to single
/// precision, so meter-scale offsets survive at astronomical distances.
/// Items smaller than half a pixel are culled; survivors get near/far
/// distances honoring their geometry's clipping policy and are routed
/// into the normal or splittable list.

use std::sync::Arc;
use glam::{DVec3, Mat3, Quat, Vec3};
use crate::camera::{BoundingSphere, Frustum};
use crate::scene::{ClippingPolicy, DepthAdjustment, EntityKey, Geometry, Scene, SceneEntity};

/// Minimum distance from the camera plane to any near clipping plane.
pub(crate) const MINIMUM_NEAR_PLANE_DISTANCE: f32 = 1.0e-5;

/// Near distance is kept above twice this fraction of the bounding radius
/// for geometry that preserves depth precision.
pub(crate) const MINIMUM_NEAR_FAR_RATIO: f32 = 0.001;

/// Geometry projecting to less than this many pixels is skipped.
const SIZE_CULL_THRESHOLD: f32 = 0.5;

/// A geometry instance that survived culling for the current view.
#[derive(Clone)]
pub struct VisibleItem {
    /// Key of the owning entity.
    pub entity: EntityKey,
    /// The geometry to draw (the entity's own, or a visualizer's).
    pub geometry: Arc<dyn Geometry>,
    /// World position, double precision.
    pub position: DVec3,
    /// Position relative to the camera, double precision.
    pub camera_relative_position: DVec3,
    /// Orientation narrowed to single precision.
    pub orientation: Quat,
    /// Bounding sphere radius.
    pub bounding_radius: f32,
    /// Signed distance from the camera plane to the nearest drawable
    /// point.
    pub near_distance: f32,
    /// Signed distance from the camera plane to the farthest point.
    pub far_distance: f32,
    /// True if the bounding sphere misses the view frustum. Such items
    /// are kept (they may cast shadows into the view) but are not drawn.
    pub outside_frustum: bool,
}

/// Per-view parameters of the collection pass.
pub(crate) struct ViewParams {
    pub current_time: f64,
    pub camera_position: DVec3,
    /// World-to-camera rotation, single precision.
    pub to_camera_space: Mat3,
    /// Angular size of one pixel, radians.
    pub pixel_size: f32,
    /// Near-plane pull-in factor cos(fov/2) / sqrt(1 + aspect^2), so
    /// off-axis extremities of geometry stay in front of the near plane.
    pub near_adjust: f32,
    pub view_frustum: Frustum,
    pub visualizers_enabled: bool,
}

/// Scan the scene and fill the normal and splittable item lists, both
/// sorted ascending by far distance.
pub(crate) fn collect_visible_items(
    scene: &Scene,
    params: &ViewParams,
    visible: &mut Vec<VisibleItem>,
    splittable: &mut Vec<VisibleItem>,
) {
    visible.clear();
    splittable.clear();

    for (key, entity) in scene.entities() {
        if !entity.is_visible(params.current_time) {
            continue;
        }

        let position = entity.position(params.current_time);

        // Difference at double precision, then narrow to single
        // precision for the rest of the work.
        let camera_relative_position = position - params.camera_position;

        // Cull objects based on size. Visualizers have sizes that may be
        // unrelated to the size of the object, so they are not culled.
        let size_cull = match entity.geometry() {
            Some(geometry) => {
                let projected_size = (geometry.bounding_sphere_radius()
                    / camera_relative_position.length() as f32)
                    / params.pixel_size;
                projected_size < SIZE_CULL_THRESHOLD
            }
            // Objects without geometry are always culled.
            None => true,
        };

        // Camera space position, needed to depth sort the objects.
        let camera_space_position =
            params.to_camera_space * camera_relative_position.as_vec3();

        if !size_cull {
            if let Some(geometry) = entity.geometry() {
                add_visible_item(
                    key,
                    geometry,
                    position,
                    camera_relative_position,
                    camera_space_position,
                    entity.orientation(params.current_time).as_quat(),
                    params,
                    visible,
                    splittable,
                );
            }
        }

        if entity.has_visualizers() && params.visualizers_enabled {
            collect_visualizer_items(
                key,
                entity,
                position,
                camera_relative_position,
                camera_space_position,
                params,
                visible,
                splittable,
            );
        }
    }

    // Depth sort all visible items
    visible.sort_by(|a, b| a.far_distance.total_cmp(&b.far_distance));
    splittable.sort_by(|a, b| a.far_distance.total_cmp(&b.far_distance));
}

fn collect_visualizer_items(
    key: EntityKey,
    entity: &SceneEntity,
    position: DVec3,
    camera_relative_position: DVec3,
    camera_space_position: Vec3,
    params: &ViewParams,
    visible: &mut Vec<VisibleItem>,
    splittable: &mut Vec<VisibleItem>,
) {
    for (_tag, visualizer) in entity.visualizers() {
        if !visualizer.is_visible() {
            continue;
        }

        let mut adjusted_position = camera_relative_position;
        let mut adjusted_camera_space_position = camera_space_position;

        if visualizer.depth_adjustment() == DepthAdjustment::AdjustToFront {
            // Pull the visualizer toward the camera so that it is drawn
            // in front of the object it is attached to.
            if let Some(geometry) = entity.geometry() {
                let z = -camera_space_position.z - geometry.bounding_sphere_radius();
                let f = z / -camera_space_position.z;
                adjusted_position *= f as f64;
                adjusted_camera_space_position *= f;
            }
        }

        add_visible_item(
            key,
            visualizer.geometry(),
            position,
            adjusted_position,
            adjusted_camera_space_position,
            visualizer
                .orientation(entity, params.current_time)
                .as_quat(),
            params,
            visible,
            splittable,
        );
    }
}

fn add_visible_item(
    entity: EntityKey,
    geometry: &Arc<dyn Geometry>,
    position: DVec3,
    camera_relative_position: DVec3,
    camera_space_position: Vec3,
    orientation: Quat,
    params: &ViewParams,
    visible: &mut Vec<VisibleItem>,
    splittable: &mut Vec<VisibleItem>,
) {
    // Signed distance from the camera plane to the most distant part of
    // the geometry. far <= 0 means it lies completely behind the camera.
    let bounding_radius = geometry.bounding_sphere_radius();
    let far_distance = -camera_space_position.z + bounding_radius;

    // A near distance as far from the camera as the geometry allows.
    let mut near_distance = geometry
        .near_plane_distance(orientation.conjugate() * -camera_relative_position.as_vec3());

    // The near distance for an ordinary object never drops below
    // MINIMUM_NEAR_FAR_RATIO times the bounding diameter. The exceptions
    // are things like trajectories, which must never be clipped by the
    // near plane; splittable geometry is instead drawn into multiple
    // depth buffer spans when necessary.
    match geometry.clipping_policy() {
        ClippingPolicy::PreserveDepthPrecision => {
            near_distance =
                near_distance.max(bounding_radius * MINIMUM_NEAR_FAR_RATIO * 2.0);
        }
        ClippingPolicy::PreventClipping | ClippingPolicy::SplitToPreventClipping => {
            near_distance = near_distance.max(MINIMUM_NEAR_PLANE_DISTANCE);
        }
    }

    // ...but keep the view frustum near plane out of the geometry even
    // at the viewport corners. If this drives near past far, the object
    // lies outside the view frustum.
    near_distance *= params.near_adjust;

    let intersects_frustum = params
        .view_frustum
        .intersects(&BoundingSphere::new(camera_space_position, bounding_radius));

    // Objects outside the frustum that cast no shadows could be dropped
    // here, but doing so makes visualizers of on-screen entities vanish;
    // they stay in the list and are skipped at draw time instead.

    if far_distance > 0.0 && near_distance < far_distance {
        let item = VisibleItem {
            entity,
            geometry: Arc::clone(geometry),
            position,
            camera_relative_position,
            orientation,
            bounding_radius,
            near_distance,
            far_distance,
            outside_frustum: !intersects_frustum,
        };

        if geometry.clipping_policy() == ClippingPolicy::SplitToPreventClipping {
            splittable.push(item);
        } else {
            visible.push(item);
        }
    }
}

#[cfg(test)]
#[path = "visible_set_tests.rs"]
mod tests;
