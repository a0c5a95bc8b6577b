use crate::config::{Distribution, LayoutOptions};
use crate::ir::Point;

use super::model::GraphModel;
use super::ranking::{Levels, median};

/// Per-handle nudge applied to a predecessor's `y` when computing a desired `y`.
const HANDLE_NUDGE: f32 = 12.0;
/// Priorities closer than this to a band's leader are ordered by desired `y` instead.
const PRIORITY_TOLERANCE: i32 = 5;
/// Upper bound on conflict resolution steps for one node.
const MAX_RESOLUTION_ATTEMPTS: usize = 10;

#[derive(Debug, Clone, Copy)]
struct Candidate {
    node: usize,
    order: usize,
    priority: i32,
    desired: Option<f32>,
}

impl Candidate {
    fn desired_key(&self) -> f32 {
        self.desired.unwrap_or(f32::INFINITY)
    }
}

/// Turns levels and intra-level order into coordinates. `x` depends only on the
/// level; the distribution strategy decides `y`.
pub fn place_nodes(model: &GraphModel<'_>, levels: &Levels, options: &LayoutOptions) -> Vec<Point> {
    let mut ys: Vec<Option<f32>> = vec![None; model.len()];
    for level in 0..levels.count() {
        let members = levels.members(level);
        match options.distribution {
            Distribution::Even => place_even(members, options, &mut ys),
            Distribution::Compact => place_compact(model, level, members, options, &mut ys),
            Distribution::Priority => place_by_priority(model, level, members, options, &mut ys),
        }
    }

    (0..model.len())
        .map(|node| {
            let x = options.start_x + levels.level(node) as f32 * options.level_width;
            Point::new(x, ys[node].unwrap_or(options.start_y))
        })
        .collect()
}

fn fan_in_padding(model: &GraphModel<'_>, node: usize, options: &LayoutOptions) -> f32 {
    model.fan_in(node) as f32 * options.fan_in_padding_per_edge
}

/// Median of already placed predecessors' `y`, each nudged by its target handle.
fn desired_y(model: &GraphModel<'_>, node: usize, ys: &[Option<f32>]) -> Option<f32> {
    let values: Vec<f32> = model
        .incoming(node)
        .iter()
        .filter_map(|&edge_idx| {
            let edge = model.edge(edge_idx);
            ys[edge.source].map(|y| y + edge.target_handle as f32 * HANDLE_NUDGE)
        })
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(median(values))
    }
}

fn candidates(
    model: &GraphModel<'_>,
    members: &[usize],
    ys: &[Option<f32>],
) -> Vec<Candidate> {
    members
        .iter()
        .enumerate()
        .map(|(order, &node)| Candidate {
            node,
            order,
            priority: model.priority(node),
            desired: desired_y(model, node, ys),
        })
        .collect()
}

fn place_even(members: &[usize], options: &LayoutOptions, ys: &mut [Option<f32>]) {
    for (idx, &node) in members.iter().enumerate() {
        ys[node] = Some(options.start_y + idx as f32 * options.node_spacing);
    }
}

fn place_compact(
    model: &GraphModel<'_>,
    level: usize,
    members: &[usize],
    options: &LayoutOptions,
    ys: &mut [Option<f32>],
) {
    if level == 0 {
        for (idx, &node) in members.iter().enumerate() {
            ys[node] = Some(
                options.start_y
                    + idx as f32 * options.node_spacing
                    + fan_in_padding(model, node, options),
            );
        }
        return;
    }

    let mut pending = candidates(model, members, ys);
    sort_into_priority_bands(&mut pending);

    let mut cursor = options.start_y;
    for candidate in pending {
        let y = candidate.desired.unwrap_or(cursor).max(cursor);
        ys[candidate.node] = Some(y);
        cursor = y + options.node_spacing + fan_in_padding(model, candidate.node, options);
    }
}

/// Sorts by priority, then groups nodes within `PRIORITY_TOLERANCE` of each
/// band's leader and orders every band by desired `y`.
fn sort_into_priority_bands(pending: &mut [Candidate]) {
    pending.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.order.cmp(&b.order)));
    let mut start = 0;
    while start < pending.len() {
        let leader = pending[start].priority;
        let mut end = start + 1;
        while end < pending.len() && leader - pending[end].priority <= PRIORITY_TOLERANCE {
            end += 1;
        }
        pending[start..end].sort_by(|a, b| {
            a.desired_key()
                .total_cmp(&b.desired_key())
                .then(a.order.cmp(&b.order))
        });
        start = end;
    }
}

fn spacing_multiplier(priority: i32) -> f32 {
    if priority > 80 {
        1.2
    } else if priority < 40 {
        0.8
    } else {
        1.0
    }
}

fn adaptive_spacing(model: &GraphModel<'_>, node: usize, options: &LayoutOptions) -> f32 {
    options.node_spacing * spacing_multiplier(model.priority(node))
        + fan_in_padding(model, node, options)
}

fn place_by_priority(
    model: &GraphModel<'_>,
    level: usize,
    members: &[usize],
    options: &LayoutOptions,
    ys: &mut [Option<f32>],
) {
    if level == 0 {
        let mut ordered: Vec<(usize, usize)> = members.iter().copied().enumerate().collect();
        ordered.sort_by(|a, b| {
            model
                .priority(b.1)
                .cmp(&model.priority(a.1))
                .then(a.0.cmp(&b.0))
        });
        let mut cursor = options.start_y;
        for (_, node) in ordered {
            ys[node] = Some(cursor);
            cursor += options.node_spacing + fan_in_padding(model, node, options);
        }
        return;
    }

    let mut pending = candidates(model, members, ys);
    pending.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then(a.desired_key().total_cmp(&b.desired_key()))
            .then(a.order.cmp(&b.order))
    });

    let mut running_min = options.start_y;
    let mut placed: Vec<(usize, f32)> = Vec::with_capacity(pending.len());
    for candidate in pending {
        let flexibility = (1.0 - candidate.priority as f32 / 100.0).max(0.1);
        let own_spacing = adaptive_spacing(model, candidate.node, options);
        let mut y = candidate.desired.unwrap_or(running_min).max(running_min);

        for _ in 0..MAX_RESOLUTION_ATTEMPTS {
            let conflict = placed.iter().position(|&(other, other_y)| {
                let spacing = own_spacing.max(adaptive_spacing(model, other, options));
                (y - other_y).abs() < spacing
            });
            let Some(slot) = conflict else {
                break;
            };
            // Placed nodes never rank below the candidate, so the candidate is
            // the one that moves: a full increment past a higher-priority node,
            // a flexibility-scaled step (at least half) past an equal one.
            let (other, other_y) = placed[slot];
            let spacing = own_spacing.max(adaptive_spacing(model, other, options));
            if candidate.priority < model.priority(other) {
                y = other_y + spacing;
            } else {
                y += spacing * flexibility.max(0.5);
            }
        }

        running_min = running_min.max(y);
        placed.push((candidate.node, y));
    }

    for (node, y) in placed {
        ys[node] = Some(y);
    }
}
