/// Depth buffer span partitioning.
///
/// A single 24-bit depth buffer cannot resolve a scene whose depth range
/// runs from meters to light-seconds. The renderer instead partitions the
/// sorted visible items into disjoint depth spans, renders each span with
/// its own sliced projection, and gives each span a private fraction of
/// the hardware depth range. Splitting first produces minimal spans;
/// coalescing then merges neighbors whose combined near/far ratio is
/// still benign, so the pass count stays low without losing precision.
///
/// Span lists are ordered far-first: the foreground span is the *last*
/// element.

use crate::camera::PlanarProjection;
use super::visible_set::VisibleItem;

/// Merged spans keep near/far above this ratio; spans that would violate
/// it when merged stay separate.
pub(crate) const PREFERRED_NEAR_FAR_RATIO: f32 = 0.002;

/// Far/near bound for the synthetic spans added to cover splittable
/// geometry.
pub(crate) const MAX_FAR_NEAR_RATIO: f32 = 10000.0;

/// A contiguous sub-range of world depth rendered with one sliced
/// projection.
#[derive(Debug, Clone, Copy)]
pub struct DepthBufferSpan {
    /// Distance to the near edge of the span.
    pub near_distance: f32,
    /// Distance to the far edge of the span.
    pub far_distance: f32,
    /// Index (into the sorted visible item list) of the furthest item in
    /// the span. Items are drawn from this index downward.
    pub back_item_index: usize,
    /// Number of items contained in the span.
    pub item_count: usize,
}

/// Split the depth buffer into one or more spans covering the visible
/// items. `items` must be sorted ascending by far distance; the spans
/// come out far-first, with empty spans filling gaps between disjoint
/// groups.
pub(crate) fn split_spans(items: &[VisibleItem], spans: &mut Vec<DepthBufferSpan>) {
    spans.clear();

    // Iterate over the visible items from back to front
    for i in (0..items.len()).rev() {
        let item = &items[i];
        let near_distance = item.near_distance;

        match spans.last_mut() {
            None => {
                spans.push(DepthBufferSpan {
                    back_item_index: i,
                    item_count: 1,
                    far_distance: item.far_distance,
                    near_distance,
                });
            }
            Some(span) => {
                let is_disjoint = item.far_distance < span.near_distance;

                if is_disjoint {
                    // Item doesn't overlap the current span. Create two
                    // new spans: one containing the item, and an empty
                    // one covering the gap in between.
                    let empty_span = DepthBufferSpan {
                        far_distance: span.near_distance,
                        near_distance: item.far_distance,
                        item_count: 0,
                        back_item_index: i,
                    };

                    let new_span = DepthBufferSpan {
                        far_distance: item.far_distance,
                        near_distance,
                        back_item_index: i,
                        item_count: 1,
                    };

                    spans.push(empty_span);
                    spans.push(new_span);
                } else {
                    span.item_count += 1;
                    if near_distance < span.near_distance {
                        span.near_distance = near_distance;
                    }
                }
            }
        }
    }
}

/// Coalesce adjacent spans of approximately the same scale. This
/// prevents over-partitioning of the depth buffer while keeping every
/// merged span's near/far ratio above `PREFERRED_NEAR_FAR_RATIO`.
pub(crate) fn coalesce_spans(split: &[DepthBufferSpan], merged: &mut Vec<DepthBufferSpan>) {
    merged.clear();

    let mut i = 0;
    while i < split.len() {
        let far_distance = split[i].far_distance;
        let mut item_count = split[i].item_count;

        // Extend the merge window as far as possible without dropping
        // near/far below the preferred ratio.
        let mut j = i;
        while j < split.len() - 1 {
            if split[j + 1].near_distance / far_distance < PREFERRED_NEAR_FAR_RATIO {
                break;
            }

            item_count += split[j + 1].item_count;
            j += 1;
        }

        merged.push(DepthBufferSpan {
            far_distance,
            near_distance: split[j].near_distance,
            back_item_index: split[i].back_item_index,
            item_count,
        });

        i = j + 1;
    }
}

/// Extend the merged span list so that splittable geometry is covered
/// from the projection near plane to its farthest extent. Synthetic
/// spans are bounded to a far/near ratio of `MAX_FAR_NEAR_RATIO`.
///
/// The step order matters: the far extension must happen before the
/// near-side fill loop, and the final sky-dome span is prepended last.
pub(crate) fn extend_spans_for_splittables(
    merged: &mut Vec<DepthBufferSpan>,
    splittable: &[VisibleItem],
    projection: &PlanarProjection,
) {
    if splittable.is_empty() {
        return;
    }

    let furthest_distance = splittable[0]
        .far_distance
        .min(projection.far_distance());

    if merged.is_empty() {
        // The only visible geometry is splittable. This happens in solar
        // system views where just the orbit plots are in view; a single
        // far span is enough to anchor the fill loop below.
        let far_distance = projection.far_distance();
        merged.push(DepthBufferSpan {
            back_item_index: 0,
            item_count: 0,
            far_distance,
            near_distance: projection
                .near_distance()
                .max(far_distance / MAX_FAR_NEAR_RATIO),
        });
    } else if furthest_distance > merged[0].far_distance {
        let near_distance = merged[0].far_distance;
        merged.insert(
            0,
            DepthBufferSpan {
                back_item_index: 0,
                item_count: 0,
                far_distance: furthest_distance,
                near_distance,
            },
        );
    }

    // Spans are stored in reverse order, so the foreground span is the
    // *last* one in the list.
    while merged[merged.len() - 1].near_distance > projection.near_distance() {
        let far_distance = merged[merged.len() - 1].near_distance;
        merged.push(DepthBufferSpan {
            back_item_index: 0,
            item_count: 0,
            far_distance,
            near_distance: projection
                .near_distance()
                .max(far_distance / MAX_FAR_NEAR_RATIO),
        });
    }

    // One more span behind everything, stretching the depth range of the
    // sky dome.
    let near_distance = merged[0].far_distance;
    merged.insert(
        0,
        DepthBufferSpan {
            back_item_index: 0,
            item_count: 0,
            near_distance,
            far_distance: near_distance * MAX_FAR_NEAR_RATIO,
        },
    );
}

#[cfg(test)]
#[path = "depth_spans_tests.rs"]
mod tests;
