use crate::ir::Point;

use super::model::GraphModel;

const MAX_PASSES: usize = 3;

/// Pushes overlapping boxes apart vertically until every pair is at least
/// `min_gap` apart on one axis, or the pass budget runs out.
///
/// Boxes are centred on their position. For each overlapping pair the
/// lower-priority node moves (on a tie, the one further down) so that its centre
/// sits `(h_a + h_b) / 2 + min_gap` away from the other. Returns `true` when the
/// last pass found nothing to fix; dense graphs can still end with residual
/// overlap after the final pass.
pub fn resolve_overlaps(model: &GraphModel<'_>, positions: &mut [Point], min_gap: f32) -> bool {
    if positions.len() < 2 {
        return true;
    }
    let mut ids: Vec<usize> = (0..positions.len()).collect();
    ids.sort_by(|a, b| {
        model
            .priority(*b)
            .cmp(&model.priority(*a))
            .then(a.cmp(b))
    });

    for _ in 0..MAX_PASSES {
        let mut moved = false;
        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                let (a, b) = (ids[i], ids[j]);
                if !boxes_overlap(model, positions, a, b, min_gap) {
                    continue;
                }
                let (anchor, mover) = if model.priority(a) > model.priority(b) {
                    (a, b)
                } else if positions[b].y >= positions[a].y {
                    (a, b)
                } else {
                    (b, a)
                };
                let separation =
                    (model.size(anchor).height + model.size(mover).height) / 2.0 + min_gap;
                let sign = if positions[mover].y >= positions[anchor].y {
                    1.0
                } else {
                    -1.0
                };
                positions[mover].y = positions[anchor].y + sign * separation;
                moved = true;
            }
        }
        if !moved {
            return true;
        }
    }

    let clean = !has_overlap(model, positions, min_gap);
    if !clean {
        tracing::debug!(
            nodes = positions.len(),
            passes = MAX_PASSES,
            "overlap resolution left residual overlap"
        );
    }
    clean
}

/// Axis-aligned test with both boxes inflated by `min_gap`.
fn boxes_overlap(
    model: &GraphModel<'_>,
    positions: &[Point],
    a: usize,
    b: usize,
    min_gap: f32,
) -> bool {
    let (size_a, size_b) = (model.size(a), model.size(b));
    let dx = (positions[a].x - positions[b].x).abs();
    let dy = (positions[a].y - positions[b].y).abs();
    dx < (size_a.width + size_b.width) / 2.0 + min_gap
        && dy < (size_a.height + size_b.height) / 2.0 + min_gap
}

pub fn has_overlap(model: &GraphModel<'_>, positions: &[Point], min_gap: f32) -> bool {
    for a in 0..positions.len() {
        for b in (a + 1)..positions.len() {
            if boxes_overlap(model, positions, a, b, min_gap) {
                return true;
            }
        }
    }
    false
}
