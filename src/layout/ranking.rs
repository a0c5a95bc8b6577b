use std::cmp::Ordering;
use std::collections::VecDeque;

use super::model::GraphModel;

/// Weight of the target handle index in the upward sweep score.
const HANDLE_TIEBREAK: f32 = 0.1;

/// Level assignment plus the current order of each level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Levels {
    level_of: Vec<usize>,
    members: Vec<Vec<usize>>,
}

impl Levels {
    pub fn level(&self, node: usize) -> usize {
        self.level_of[node]
    }

    pub fn members(&self, level: usize) -> &[usize] {
        self.members.get(level).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self) -> usize {
        self.members.len()
    }

    pub fn max_level(&self) -> usize {
        self.members.len().saturating_sub(1)
    }

    fn positions(&self) -> Vec<usize> {
        let mut positions = vec![0; self.level_of.len()];
        for bucket in &self.members {
            for (idx, node) in bucket.iter().enumerate() {
                positions[*node] = idx;
            }
        }
        positions
    }
}

/// Breadth-first leveling from the nodes without incoming edges.
///
/// A node keeps the level of the first parent that reaches it. That is not a
/// longest-path layering: a node with parents on different levels may sit only
/// one level below the shallower parent. When every node has an incoming edge the
/// first node seeds the traversal, and anything never reached lands on level 0.
pub fn assign_levels(model: &GraphModel<'_>) -> Levels {
    let count = model.len();
    let mut level_of: Vec<Option<usize>> = vec![None; count];
    let mut queue: VecDeque<usize> = VecDeque::new();

    for node in 0..count {
        if model.fan_in(node) == 0 {
            level_of[node] = Some(0);
            queue.push_back(node);
        }
    }
    if queue.is_empty() && count > 0 {
        level_of[0] = Some(0);
        queue.push_back(0);
    }

    while let Some(node) = queue.pop_front() {
        let level = level_of[node].unwrap_or(0);
        for &edge_idx in model.outgoing(node) {
            let child = model.edge(edge_idx).target;
            if level_of[child].is_none() {
                level_of[child] = Some(level + 1);
                queue.push_back(child);
            }
        }
    }

    let level_of: Vec<usize> = level_of.into_iter().map(|l| l.unwrap_or(0)).collect();
    let max_level = level_of.iter().copied().max().unwrap_or(0);
    let mut members: Vec<Vec<usize>> = if count == 0 {
        Vec::new()
    } else {
        vec![Vec::new(); max_level + 1]
    };
    for (node, level) in level_of.iter().enumerate() {
        members[*level].push(node);
    }

    Levels { level_of, members }
}

/// Median-heuristic crossing reduction, alternating downward and upward sweeps.
pub fn order_levels(model: &GraphModel<'_>, levels: &mut Levels, sweeps: usize) {
    if levels.count() <= 1 {
        return;
    }
    let mut positions = levels.positions();

    for _ in 0..sweeps.max(1) {
        for level in 1..levels.count() {
            let scores: Vec<f32> = levels.members[level]
                .iter()
                .map(|&node| {
                    let values = model.incoming(node).iter().filter_map(|&edge_idx| {
                        let parent = model.edge(edge_idx).source;
                        (levels.level_of[parent] == level - 1).then(|| positions[parent] as f32)
                    });
                    median(values.collect())
                })
                .collect();
            sort_bucket(model, &mut levels.members[level], &scores);
            refresh_positions(&levels.members[level], &mut positions);
        }
        for level in (0..levels.max_level()).rev() {
            let scores: Vec<f32> = levels.members[level]
                .iter()
                .map(|&node| {
                    let values = model.outgoing(node).iter().filter_map(|&edge_idx| {
                        let edge = model.edge(edge_idx);
                        (levels.level_of[edge.target] == level + 1).then(|| {
                            positions[edge.target] as f32
                                + HANDLE_TIEBREAK * edge.target_handle as f32
                        })
                    });
                    median(values.collect())
                })
                .collect();
            sort_bucket(model, &mut levels.members[level], &scores);
            refresh_positions(&levels.members[level], &mut positions);
        }
    }
}

fn sort_bucket(model: &GraphModel<'_>, bucket: &mut Vec<usize>, scores: &[f32]) {
    if bucket.len() <= 1 {
        return;
    }
    let mut keyed: Vec<(f32, usize)> = bucket
        .iter()
        .zip(scores.iter())
        .map(|(&node, &score)| (score, node))
        .collect();
    keyed.sort_by(|a, b| match a.0.total_cmp(&b.0) {
        Ordering::Equal => model.id(a.1).cmp(model.id(b.1)),
        other => other,
    });
    bucket.clear();
    bucket.extend(keyed.into_iter().map(|(_, node)| node));
}

fn refresh_positions(bucket: &[usize], positions: &mut [usize]) {
    for (idx, &node) in bucket.iter().enumerate() {
        positions[node] = idx;
    }
}

/// Median of `values`; the mean of the two middle values for even counts and
/// `+inf` when there is nothing to take the median of.
pub fn median(mut values: Vec<f32>) -> f32 {
    if values.is_empty() {
        return f32::INFINITY;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutOptions;
    use crate::ir::{EdgeRef, NodeRef};

    fn nodes(ids: &[&str]) -> Vec<NodeRef> {
        ids.iter().map(|id| NodeRef::new(*id)).collect()
    }

    fn edges(pairs: &[(&str, &str)]) -> Vec<EdgeRef> {
        pairs.iter().map(|(a, b)| EdgeRef::new(*a, *b)).collect()
    }

    fn level_ids(model: &GraphModel<'_>, levels: &Levels, level: usize) -> Vec<String> {
        levels
            .members(level)
            .iter()
            .map(|&n| model.id(n).to_string())
            .collect()
    }

    #[test]
    fn chain_levels_increase() {
        let nodes = nodes(&["A", "B", "C"]);
        let edges = edges(&[("A", "B"), ("B", "C")]);
        let model = GraphModel::new(&nodes, &edges, &LayoutOptions::default());
        let levels = assign_levels(&model);
        assert_eq!(levels.level(0), 0);
        assert_eq!(levels.level(1), 1);
        assert_eq!(levels.level(2), 2);
    }

    #[test]
    fn first_reached_level_wins() {
        // D is reached from A (level 0) before C (level 2) pushes it further.
        let nodes = nodes(&["A", "B", "C", "D"]);
        let edges = edges(&[("A", "B"), ("B", "C"), ("A", "D"), ("C", "D")]);
        let model = GraphModel::new(&nodes, &edges, &LayoutOptions::default());
        let levels = assign_levels(&model);
        assert_eq!(levels.level(3), 1);
        assert_eq!(levels.level(2), 2);
    }

    #[test]
    fn full_cycle_is_seeded_by_first_node() {
        let nodes = nodes(&["A", "B", "C"]);
        let edges = edges(&[("A", "B"), ("B", "C"), ("C", "A")]);
        let model = GraphModel::new(&nodes, &edges, &LayoutOptions::default());
        let levels = assign_levels(&model);
        assert_eq!(levels.level(0), 0);
        assert_eq!(levels.level(1), 1);
        assert_eq!(levels.level(2), 2);
    }

    #[test]
    fn unreachable_cycle_defaults_to_level_zero() {
        let nodes = nodes(&["S", "T", "X", "Y"]);
        let edges = edges(&[("S", "T"), ("X", "Y"), ("Y", "X")]);
        let model = GraphModel::new(&nodes, &edges, &LayoutOptions::default());
        let levels = assign_levels(&model);
        assert_eq!(levels.level(1), 1);
        assert_eq!(levels.level(2), 0);
        assert_eq!(levels.level(3), 0);
        assert_eq!(level_ids(&model, &levels, 0), vec!["S", "X", "Y"]);
    }

    #[test]
    fn empty_graph_has_no_levels() {
        let nodes: Vec<NodeRef> = Vec::new();
        let model = GraphModel::new(&nodes, &[], &LayoutOptions::default());
        let mut levels = assign_levels(&model);
        assert_eq!(levels.count(), 0);
        order_levels(&model, &mut levels, 4);
        assert_eq!(levels.members(0), &[] as &[usize]);
    }

    #[test]
    fn ordering_uncrosses_swapped_children() {
        // a1 -> b2, a2 -> b1: input order crosses, the sweep should straighten it.
        let nodes = nodes(&["a1", "a2", "b2", "b1"]);
        let edges = edges(&[("a1", "b1"), ("a2", "b2")]);
        let model = GraphModel::new(&nodes, &edges, &LayoutOptions::default());
        let mut levels = assign_levels(&model);
        assert_eq!(level_ids(&model, &levels, 1), vec!["b2", "b1"]);
        order_levels(&model, &mut levels, 4);
        let top = level_ids(&model, &levels, 0);
        let bottom = level_ids(&model, &levels, 1);
        let a1 = top.iter().position(|id| id == "a1").unwrap();
        let a2 = top.iter().position(|id| id == "a2").unwrap();
        let b1 = bottom.iter().position(|id| id == "b1").unwrap();
        let b2 = bottom.iter().position(|id| id == "b2").unwrap();
        assert_eq!(a1 < a2, b1 < b2);
    }

    #[test]
    fn upward_sweep_orders_sources_by_target_handle() {
        let nodes = nodes(&["y", "x", "join"]);
        let edges = vec![
            EdgeRef::new("y", "join").with_handles(None, Some(1)),
            EdgeRef::new("x", "join").with_handles(None, Some(0)),
        ];
        let model = GraphModel::new(&nodes, &edges, &LayoutOptions::default());
        let mut levels = assign_levels(&model);
        order_levels(&model, &mut levels, 1);
        assert_eq!(level_ids(&model, &levels, 0), vec!["x", "y"]);
    }

    #[test]
    fn nodes_without_neighbours_sort_last_by_id() {
        let nodes = nodes(&["p", "z", "m", "q"]);
        let edges = edges(&[("p", "q")]);
        let model = GraphModel::new(&nodes, &edges, &LayoutOptions::default());
        let mut levels = assign_levels(&model);
        order_levels(&model, &mut levels, 2);
        assert_eq!(level_ids(&model, &levels, 0), vec!["p", "m", "z"]);
    }

    #[test]
    fn median_handles_even_and_empty() {
        assert_eq!(median(vec![3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(vec![4.0, 1.0]), 2.5);
        assert!(median(Vec::new()).is_infinite());
    }
}
