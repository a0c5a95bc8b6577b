use std::collections::HashMap;

use crate::config::LayoutOptions;
use crate::ir::{Dimensions, EdgeRef, NodeRef};

use super::priority::resolve_priority;

/// Edge with both endpoints resolved to node indices.
#[derive(Debug, Clone, Copy)]
pub struct ModelEdge {
    pub source: usize,
    pub target: usize,
    pub source_handle: u32,
    pub target_handle: u32,
}

/// Read-only view over one graph snapshot.
///
/// Node indices follow input order with duplicate ids dropped. Edges whose
/// endpoints are unknown are skipped here so no later stage has to care.
#[derive(Debug)]
pub struct GraphModel<'a> {
    nodes: Vec<&'a NodeRef>,
    index: HashMap<&'a str, usize>,
    edges: Vec<ModelEdge>,
    incoming: Vec<Vec<usize>>,
    outgoing: Vec<Vec<usize>>,
    priorities: Vec<i32>,
    sizes: Vec<Dimensions>,
}

impl<'a> GraphModel<'a> {
    pub fn new(nodes: &'a [NodeRef], edges: &[EdgeRef], options: &LayoutOptions) -> Self {
        let mut kept: Vec<&'a NodeRef> = Vec::with_capacity(nodes.len());
        let mut index: HashMap<&'a str, usize> = HashMap::with_capacity(nodes.len());
        for node in nodes {
            if index.contains_key(node.id.as_str()) {
                continue;
            }
            index.insert(node.id.as_str(), kept.len());
            kept.push(node);
        }

        let mut model_edges = Vec::with_capacity(edges.len());
        let mut incoming = vec![Vec::new(); kept.len()];
        let mut outgoing = vec![Vec::new(); kept.len()];
        for edge in edges {
            let (Some(&source), Some(&target)) = (
                index.get(edge.source.as_str()),
                index.get(edge.target.as_str()),
            ) else {
                continue;
            };
            let edge_idx = model_edges.len();
            model_edges.push(ModelEdge {
                source,
                target,
                source_handle: edge.source_handle_index(),
                target_handle: edge.target_handle_index(),
            });
            outgoing[source].push(edge_idx);
            incoming[target].push(edge_idx);
        }

        let priorities = kept
            .iter()
            .map(|node| resolve_priority(node, options))
            .collect();
        let sizes = kept.iter().map(|node| node.size()).collect();

        Self {
            nodes: kept,
            index,
            edges: model_edges,
            incoming,
            outgoing,
            priorities,
            sizes,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, idx: usize) -> &'a NodeRef {
        self.nodes[idx]
    }

    pub fn id(&self, idx: usize) -> &'a str {
        self.nodes[idx].id.as_str()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn edges(&self) -> &[ModelEdge] {
        &self.edges
    }

    pub fn edge(&self, idx: usize) -> &ModelEdge {
        &self.edges[idx]
    }

    /// Indices of edges ending at `node`.
    pub fn incoming(&self, node: usize) -> &[usize] {
        &self.incoming[node]
    }

    /// Indices of edges starting at `node`.
    pub fn outgoing(&self, node: usize) -> &[usize] {
        &self.outgoing[node]
    }

    pub fn fan_in(&self, node: usize) -> usize {
        self.incoming[node].len()
    }

    pub fn priority(&self, node: usize) -> i32 {
        self.priorities[node]
    }

    pub fn size(&self, node: usize) -> Dimensions {
        self.sizes[node]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_duplicates_and_dangling_edges() {
        let nodes = vec![NodeRef::new("a"), NodeRef::new("b"), NodeRef::new("a")];
        let edges = vec![
            EdgeRef::new("a", "b"),
            EdgeRef::new("a", "ghost"),
            EdgeRef::new("ghost", "b"),
        ];
        let model = GraphModel::new(&nodes, &edges, &LayoutOptions::default());
        assert_eq!(model.len(), 2);
        assert_eq!(model.edges().len(), 1);
        assert_eq!(model.fan_in(1), 1);
        assert_eq!(model.fan_in(0), 0);
        assert_eq!(model.outgoing(0), &[0]);
        assert_eq!(model.index_of("ghost"), None);
    }
}
