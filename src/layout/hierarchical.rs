use std::collections::{HashMap, HashSet};

use dagre_rust::{
    GraphConfig as DagreConfig, GraphEdge as DagreEdge, GraphNode as DagreNode,
    layout as dagre_layout,
};
use futures::future::BoxFuture;
use graphlib_rust::{Graph as DagreGraph, GraphOption};

use crate::config::{Direction, LayoutOptions};
use crate::ir::Point;

use super::error::LayoutError;
use super::model::GraphModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortSide {
    North,
    East,
    South,
    West,
}

impl PortSide {
    /// Sides carrying (inputs, outputs) for a flow direction.
    pub fn for_direction(direction: Direction) -> (PortSide, PortSide) {
        match direction {
            Direction::Right => (PortSide::West, PortSide::East),
            Direction::Left => (PortSide::East, PortSide::West),
            Direction::Down => (PortSide::North, PortSide::South),
            Direction::Up => (PortSide::South, PortSide::North),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub id: String,
    pub side: PortSide,
    /// Position among the ports on the same side, top/left first.
    pub index: u32,
}

#[derive(Debug, Clone)]
pub struct HierarchicalNode {
    pub id: String,
    pub width: f32,
    pub height: f32,
    pub inputs: Vec<Port>,
    pub outputs: Vec<Port>,
}

#[derive(Debug, Clone)]
pub struct HierarchicalEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub source_port: String,
    pub target_port: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeRouting {
    Orthogonal,
    Polyline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossingMinimization {
    LayerSweep,
    None,
}

#[derive(Debug, Clone)]
pub struct LayeredSettings {
    pub direction: Direction,
    pub edge_routing: EdgeRouting,
    pub crossing_minimization: CrossingMinimization,
    pub post_compaction: bool,
    /// Free space between neighbouring boxes in one layer.
    pub node_gap: f32,
    /// Free space between consecutive layers.
    pub layer_gap: f32,
}

/// Everything a layered engine needs: port-annotated nodes, port-to-port edges
/// and the algorithm settings.
#[derive(Debug, Clone)]
pub struct HierarchicalRequest {
    pub nodes: Vec<HierarchicalNode>,
    pub edges: Vec<HierarchicalEdge>,
    pub settings: LayeredSettings,
}

/// Node centres in engine coordinates, keyed by node id.
pub type EnginePositions = HashMap<String, Point>;

/// An external layered layout engine.
pub trait HierarchicalLayoutProvider: Send + Sync {
    fn layout<'a>(
        &'a self,
        request: &'a HierarchicalRequest,
    ) -> BoxFuture<'a, Result<EnginePositions, LayoutError>>;
}

pub fn build_request(model: &GraphModel<'_>, options: &LayoutOptions) -> HierarchicalRequest {
    let (input_side, output_side) = PortSide::for_direction(options.direction);
    let horizontal = options.direction.is_horizontal();

    let mut edge_source_port: Vec<String> = vec![String::new(); model.edges().len()];
    let mut edge_target_port: Vec<String> = vec![String::new(); model.edges().len()];
    let mut nodes = Vec::with_capacity(model.len());
    let mut max_main = 0.0f32;
    let mut max_cross = 0.0f32;

    for idx in 0..model.len() {
        let id = model.id(idx);
        let size = model.size(idx);
        let (main, cross) = if horizontal {
            (size.width, size.height)
        } else {
            (size.height, size.width)
        };
        max_main = max_main.max(main);
        max_cross = max_cross.max(cross);

        let mut incoming: Vec<usize> = model.incoming(idx).to_vec();
        incoming.sort_by_key(|&e| (model.edge(e).target_handle, e));
        let inputs = if incoming.is_empty() {
            vec![Port {
                id: format!("{id}:in"),
                side: input_side,
                index: 0,
            }]
        } else {
            incoming
                .iter()
                .enumerate()
                .map(|(slot, &edge_idx)| {
                    let port_id = format!("{id}:in:{slot}");
                    edge_target_port[edge_idx] = port_id.clone();
                    Port {
                        id: port_id,
                        side: input_side,
                        index: slot as u32,
                    }
                })
                .collect()
        };

        let mut outgoing: Vec<usize> = model.outgoing(idx).to_vec();
        outgoing.sort_by_key(|&e| (model.edge(e).source_handle, e));
        let outputs = if outgoing.is_empty() {
            vec![Port {
                id: format!("{id}:out"),
                side: output_side,
                index: 0,
            }]
        } else {
            outgoing
                .iter()
                .enumerate()
                .map(|(slot, &edge_idx)| {
                    let port_id = format!("{id}:out:{slot}");
                    edge_source_port[edge_idx] = port_id.clone();
                    Port {
                        id: port_id,
                        side: output_side,
                        index: slot as u32,
                    }
                })
                .collect()
        };

        nodes.push(HierarchicalNode {
            id: id.to_string(),
            width: size.width,
            height: size.height,
            inputs,
            outputs,
        });
    }

    let edges = model
        .edges()
        .iter()
        .enumerate()
        .map(|(idx, edge)| HierarchicalEdge {
            id: format!("e{idx}"),
            source: model.id(edge.source).to_string(),
            target: model.id(edge.target).to_string(),
            source_port: edge_source_port[idx].clone(),
            target_port: edge_target_port[idx].clone(),
        })
        .collect();

    HierarchicalRequest {
        nodes,
        edges,
        settings: LayeredSettings {
            direction: options.direction,
            edge_routing: EdgeRouting::Orthogonal,
            crossing_minimization: CrossingMinimization::LayerSweep,
            post_compaction: true,
            node_gap: (options.node_spacing - max_cross).max(options.min_node_gap),
            layer_gap: (options.level_width - max_main).max(options.min_node_gap),
        },
    }
}

/// Layered layout through `dagre_rust`.
///
/// Dagre has no port model: ports only decide the order edges are handed to it,
/// which seeds its initial ordering. Routing settings are ignored since only node
/// positions are read back; dagre's own coordinate assignment compacts layers.
#[derive(Debug, Clone, Copy, Default)]
pub struct DagreProvider;

impl HierarchicalLayoutProvider for DagreProvider {
    fn layout<'a>(
        &'a self,
        request: &'a HierarchicalRequest,
    ) -> BoxFuture<'a, Result<EnginePositions, LayoutError>> {
        Box::pin(async move { run_dagre(request) })
    }
}

fn dagre_rankdir(direction: Direction) -> &'static str {
    match direction {
        Direction::Down => "tb",
        Direction::Up => "bt",
        Direction::Right => "lr",
        Direction::Left => "rl",
    }
}

fn run_dagre(request: &HierarchicalRequest) -> Result<EnginePositions, LayoutError> {
    if request.nodes.is_empty() {
        return Ok(EnginePositions::new());
    }

    let mut dagre_graph: DagreGraph<DagreConfig, DagreNode, DagreEdge> =
        DagreGraph::new(Some(GraphOption {
            directed: Some(true),
            multigraph: Some(false),
            compound: Some(false),
        }));

    let mut graph_config = DagreConfig::default();
    graph_config.rankdir = Some(dagre_rankdir(request.settings.direction).to_string());
    graph_config.nodesep = Some(request.settings.node_gap);
    graph_config.ranksep = Some(request.settings.layer_gap);
    graph_config.marginx = Some(0.0);
    graph_config.marginy = Some(0.0);
    dagre_graph.set_graph(graph_config);

    for node in &request.nodes {
        let mut dagre_node = DagreNode::default();
        dagre_node.width = node.width;
        dagre_node.height = node.height;
        dagre_graph.set_node(node.id.clone(), Some(dagre_node));
    }

    let port_slot: HashMap<&str, u32> = request
        .nodes
        .iter()
        .flat_map(|node| node.inputs.iter().chain(node.outputs.iter()))
        .map(|port| (port.id.as_str(), port.index))
        .collect();
    let mut ordered_edges: Vec<&HierarchicalEdge> =
        request.edges.iter().collect();
    ordered_edges.sort_by_key(|edge| {
        (
            port_slot.get(edge.source_port.as_str()).copied().unwrap_or(0),
            port_slot.get(edge.target_port.as_str()).copied().unwrap_or(0),
        )
    });

    let mut edge_set: HashSet<(String, String)> = HashSet::new();
    for edge in ordered_edges {
        let from = edge.source.clone();
        let to = edge.target.clone();
        if !edge_set.insert((from.clone(), to.clone())) {
            continue;
        }
        let edge_label = DagreEdge::default();
        let _ = dagre_graph.set_edge(&from, &to, Some(edge_label), None);
    }

    dagre_layout::run_layout(&mut dagre_graph);

    let mut positions = EnginePositions::with_capacity(request.nodes.len());
    for node in &request.nodes {
        let Some(dagre_node) = dagre_graph.node(&node.id) else {
            continue;
        };
        positions.insert(node.id.clone(), Point::new(dagre_node.x, dagre_node.y));
    }
    Ok(positions)
}

/// Maps engine centres onto the model. The engine's output is translated so the
/// box reaching furthest left (and, separately, furthest up) has its centre on
/// `(startX, startY)`, which is where the leveled path puts its first box. A node
/// the engine skipped keeps its previous position when it has one.
pub fn map_positions(
    model: &GraphModel<'_>,
    engine: &EnginePositions,
    options: &LayoutOptions,
) -> Result<Vec<Point>, LayoutError> {
    let (offset_x, offset_y) = engine_offset(model, engine, options);
    (0..model.len())
        .map(|idx| {
            let node = model.node(idx);
            let point = match (engine.get(node.id.as_str()), node.position) {
                (Some(p), _) => Point::new(p.x + offset_x, p.y + offset_y),
                (None, Some(previous)) => previous,
                (None, None) => return Err(LayoutError::MissingCoordinates(node.id.clone())),
            };
            if point.is_finite() {
                Ok(point)
            } else {
                Err(LayoutError::NonFiniteCoordinates(node.id.clone()))
            }
        })
        .collect()
}

fn engine_offset(
    model: &GraphModel<'_>,
    engine: &EnginePositions,
    options: &LayoutOptions,
) -> (f32, f32) {
    // (leading edge, half extent) of the box reaching furthest on each axis.
    let mut left: Option<(f32, f32)> = None;
    let mut top: Option<(f32, f32)> = None;
    for idx in 0..model.len() {
        let Some(centre) = engine.get(model.id(idx)) else {
            continue;
        };
        if !centre.is_finite() {
            continue;
        }
        let size = model.size(idx);
        let (hw, hh) = (size.width / 2.0, size.height / 2.0);
        if left.is_none_or(|(edge, _)| centre.x - hw < edge) {
            left = Some((centre.x - hw, hw));
        }
        if top.is_none_or(|(edge, _)| centre.y - hh < edge) {
            top = Some((centre.y - hh, hh));
        }
    }
    let offset_x = left.map_or(options.start_x, |(edge, hw)| options.start_x - edge - hw);
    let offset_y = top.map_or(options.start_y, |(edge, hh)| options.start_y - edge - hh);
    (offset_x, offset_y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{EdgeRef, NodeRef};

    fn model_parts() -> (Vec<NodeRef>, Vec<EdgeRef>) {
        let nodes = vec![
            NodeRef::new("a").with_dimensions(100.0, 40.0),
            NodeRef::new("b").with_dimensions(100.0, 40.0),
            NodeRef::new("c").with_dimensions(100.0, 40.0),
        ];
        let edges = vec![
            EdgeRef::new("a", "c").with_handles(Some(1), Some(1)),
            EdgeRef::new("b", "c").with_handles(None, Some(0)),
        ];
        (nodes, edges)
    }

    #[test]
    fn request_has_one_port_per_edge_or_a_default() {
        let (nodes, edges) = model_parts();
        let options = LayoutOptions::default();
        let model = GraphModel::new(&nodes, &edges, &options);
        let request = build_request(&model, &options);

        let a = &request.nodes[0];
        assert_eq!(a.inputs.len(), 1);
        assert_eq!(a.inputs[0].id, "a:in");
        assert_eq!(a.outputs.len(), 1);
        assert_eq!(a.outputs[0].side, PortSide::East);

        let c = &request.nodes[2];
        assert_eq!(c.inputs.len(), 2);
        assert!(c.inputs.iter().all(|p| p.side == PortSide::West));
        // b feeds handle 0, so it takes the first input slot.
        assert_eq!(request.edges[1].target_port, "c:in:0");
        assert_eq!(request.edges[0].target_port, "c:in:1");
        assert_eq!(request.edges[0].source_port, "a:out:0");
    }

    #[test]
    fn port_sides_follow_direction() {
        assert_eq!(
            PortSide::for_direction(Direction::Down),
            (PortSide::North, PortSide::South)
        );
        assert_eq!(
            PortSide::for_direction(Direction::Left),
            (PortSide::East, PortSide::West)
        );
        assert_eq!(
            PortSide::for_direction(Direction::Up),
            (PortSide::South, PortSide::North)
        );
    }

    #[test]
    fn gaps_never_drop_below_min_node_gap() {
        let (nodes, edges) = model_parts();
        let options = LayoutOptions::default();
        let model = GraphModel::new(&nodes, &edges, &options);
        let request = build_request(&model, &options);
        assert_eq!(request.settings.node_gap, 160.0 - 40.0);
        assert_eq!(request.settings.layer_gap, 240.0 - 100.0);

        let wide = vec![NodeRef::new("w").with_dimensions(500.0, 400.0)];
        let model = GraphModel::new(&wide, &[], &options);
        let request = build_request(&model, &options);
        assert_eq!(request.settings.node_gap, options.min_node_gap);
        assert_eq!(request.settings.layer_gap, options.min_node_gap);
    }

    #[test]
    fn engine_output_is_anchored_on_leading_box_centres() {
        let nodes = vec![
            NodeRef::new("a"),
            NodeRef::new("b").with_dimensions(100.0, 40.0),
        ];
        let options = LayoutOptions::default().with_start(5.0, 7.0);
        let model = GraphModel::new(&nodes, &[], &options);

        let mut engine = EnginePositions::new();
        engine.insert("a".to_string(), Point::new(110.0, 50.0));
        engine.insert("b".to_string(), Point::new(350.0, 10.0));
        let mapped = map_positions(&model, &engine, &options).unwrap();
        // a reaches furthest left, b reaches furthest up.
        assert_eq!(mapped[0], Point::new(5.0, 47.0));
        assert_eq!(mapped[1], Point::new(245.0, 7.0));
    }

    #[test]
    fn missing_engine_coordinates_use_previous_position_or_fail() {
        let mut nodes = vec![NodeRef::new("a"), NodeRef::new("b")];
        nodes[1].position = Some(Point::new(7.0, 9.0));
        let options = LayoutOptions::default().with_start(100.0, 50.0);
        let model = GraphModel::new(&nodes, &[], &options);

        let mut engine = EnginePositions::new();
        engine.insert("a".to_string(), Point::new(10.0, 20.0));
        let mapped = map_positions(&model, &engine, &options).unwrap();
        // a is the only engine box, so its centre lands on the start point.
        assert_eq!(mapped[0], Point::new(100.0, 50.0));
        assert_eq!(mapped[1], Point::new(7.0, 9.0));

        engine.clear();
        let err = map_positions(&model, &engine, &options).unwrap_err();
        assert!(matches!(err, LayoutError::MissingCoordinates(id) if id == "a"));

        engine.insert("a".to_string(), Point::new(f32::NAN, 0.0));
        let err = map_positions(&model, &engine, &options).unwrap_err();
        assert!(matches!(err, LayoutError::NonFiniteCoordinates(_)));
    }
}
