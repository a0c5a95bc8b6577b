mod error;
mod generation;
pub mod hierarchical;
pub(crate) mod model;
mod overlap;
mod placement;
pub mod priority;
pub mod ranking;

pub use error::LayoutError;
pub use generation::{LayoutGeneration, LayoutTicket};
pub use hierarchical::{DagreProvider, EnginePositions, HierarchicalLayoutProvider, HierarchicalRequest};
pub use model::GraphModel;
pub use priority::{KeywordPriority, KeywordRule, PriorityPolicy, RuleField};

use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use serde::Serialize;

use crate::config::{Distribution, LayoutOptions};
use crate::ir::{Dimensions, EdgeRef, NodeRef, Point};

use hierarchical::{build_request, map_positions};
use overlap::resolve_overlaps;
use placement::place_nodes;
use ranking::{Levels, assign_levels, order_levels};

/// Which path produced a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "distribution")]
pub enum LayoutSource {
    Leveled(Distribution),
    Hierarchical,
    /// The hierarchical engine failed and compact placement was used instead.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

/// Node centres keyed by id, plus the level each node was placed on when the
/// leveled path ran.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutResult {
    positions: BTreeMap<String, Point>,
    levels: BTreeMap<String, usize>,
    source: LayoutSource,
}

impl LayoutResult {
    fn empty(source: LayoutSource) -> Self {
        Self {
            positions: BTreeMap::new(),
            levels: BTreeMap::new(),
            source,
        }
    }

    fn from_model(
        model: &GraphModel<'_>,
        positions: Vec<Point>,
        levels: Option<&Levels>,
        source: LayoutSource,
    ) -> Self {
        let mut result = Self::empty(source);
        for (idx, point) in positions.into_iter().enumerate() {
            let id = model.id(idx).to_string();
            if let Some(levels) = levels {
                result.levels.insert(id.clone(), levels.level(idx));
            }
            result.positions.insert(id, point);
        }
        result
    }

    pub fn get(&self, id: &str) -> Option<Point> {
        self.positions.get(id).copied()
    }

    pub fn level(&self, id: &str) -> Option<usize> {
        self.levels.get(id).copied()
    }

    pub fn source(&self) -> LayoutSource {
        self.source
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Point)> {
        self.positions.iter().map(|(id, point)| (id.as_str(), *point))
    }

    pub fn positions(&self) -> &BTreeMap<String, Point> {
        &self.positions
    }

    pub fn into_positions(self) -> BTreeMap<String, Point> {
        self.positions
    }

    /// Box around every laid-out node, using the sizes from `nodes`.
    pub fn bounds(&self, nodes: &[NodeRef]) -> Option<Bounds> {
        let mut sizes: HashMap<&str, Dimensions> = HashMap::with_capacity(nodes.len());
        for node in nodes {
            sizes.entry(node.id.as_str()).or_insert_with(|| node.size());
        }
        let mut bounds: Option<Bounds> = None;
        for (id, point) in &self.positions {
            let Some(size) = sizes.get(id.as_str()) else {
                continue;
            };
            let (hw, hh) = (size.width / 2.0, size.height / 2.0);
            let b = bounds.get_or_insert(Bounds {
                min_x: point.x - hw,
                min_y: point.y - hh,
                max_x: point.x + hw,
                max_y: point.y + hh,
            });
            b.min_x = b.min_x.min(point.x - hw);
            b.min_y = b.min_y.min(point.y - hh);
            b.max_x = b.max_x.max(point.x + hw);
            b.max_y = b.max_y.max(point.y + hh);
        }
        bounds
    }
}

/// Leveled layout: BFS levels, median ordering, the configured distribution and,
/// when enabled, overlap resolution. Always returns a position for every node.
pub fn compute_layout(nodes: &[NodeRef], edges: &[EdgeRef], options: &LayoutOptions) -> LayoutResult {
    let options = options.normalized();
    let source = LayoutSource::Leveled(options.distribution);
    let model = GraphModel::new(nodes, edges, &options);
    if model.is_empty() {
        return LayoutResult::empty(source);
    }

    let mut levels = assign_levels(&model);
    order_levels(&model, &mut levels, options.sweeps);
    let mut positions = place_nodes(&model, &levels, &options);
    if options.overlap_prevention {
        resolve_overlaps(&model, &mut positions, options.min_node_gap);
    }

    tracing::debug!(
        nodes = model.len(),
        edges = model.edges().len(),
        levels = levels.count(),
        distribution = ?options.distribution,
        "computed leveled layout"
    );
    LayoutResult::from_model(&model, positions, Some(&levels), source)
}

/// Hierarchical layout through the bundled dagre engine.
pub async fn compute_hierarchical_layout(
    nodes: &[NodeRef],
    edges: &[EdgeRef],
    options: &LayoutOptions,
) -> LayoutResult {
    compute_hierarchical_layout_with(&DagreProvider, nodes, edges, options).await
}

/// Hierarchical layout through `provider`. Errors and panics of the provider end
/// in a compact leveled layout tagged [`LayoutSource::Fallback`]; this never fails.
pub async fn compute_hierarchical_layout_with(
    provider: &dyn HierarchicalLayoutProvider,
    nodes: &[NodeRef],
    edges: &[EdgeRef],
    options: &LayoutOptions,
) -> LayoutResult {
    let options = options.normalized();
    let outcome = {
        let model = GraphModel::new(nodes, edges, &options);
        if model.is_empty() {
            return LayoutResult::empty(LayoutSource::Hierarchical);
        }
        let request = build_request(&model, &options);
        match AssertUnwindSafe(provider.layout(&request)).catch_unwind().await {
            Ok(Ok(engine)) => map_positions(&model, &engine, &options).map(|positions| {
                LayoutResult::from_model(&model, positions, None, LayoutSource::Hierarchical)
            }),
            Ok(Err(err)) => Err(err),
            Err(payload) => Err(LayoutError::EnginePanicked(error::panic_message(&*payload))),
        }
    };

    match outcome {
        Ok(result) => result,
        Err(err) => {
            tracing::warn!(error = %err, "hierarchical layout failed, using compact placement");
            let fallback_options = options.clone().with_distribution(Distribution::Compact);
            let mut result = compute_layout(nodes, edges, &fallback_options);
            result.source = LayoutSource::Fallback;
            result
        }
    }
}
