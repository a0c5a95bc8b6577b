use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static TRAILING_DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*$").unwrap());

/// Default box size for nodes whose type mentions "input" or "output".
pub const IO_NODE_SIZE: Dimensions = Dimensions {
    width: 180.0,
    height: 80.0,
};
/// Default box size for every other unmeasured node.
pub const DEFAULT_NODE_SIZE: Dimensions = Dimensions {
    width: 220.0,
    height: 100.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f32,
    pub height: f32,
}

/// A diagram node as handed over by the canvas.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRef {
    pub id: String,
    #[serde(rename = "type", default)]
    pub node_type: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub position: Option<Point>,
}

impl NodeRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = node_type.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_dimensions(mut self, width: f32, height: f32) -> Self {
        self.dimensions = Some(Dimensions { width, height });
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Measured size, or the type-based default when the canvas has not measured it yet.
    pub fn size(&self) -> Dimensions {
        if let Some(dims) = self.dimensions {
            let usable = |v: f32| v.is_finite() && v > 0.0;
            if usable(dims.width) && usable(dims.height) {
                return dims;
            }
        }
        let kind = self.node_type.to_ascii_lowercase();
        if kind.contains("input") || kind.contains("output") {
            IO_NODE_SIZE
        } else {
            DEFAULT_NODE_SIZE
        }
    }
}

/// Connection point on a multi-port node. Canvases send either a bare index or a
/// string such as `"2"` or `"input-2"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HandleId {
    Index(u32),
    Name(String),
}

impl HandleId {
    pub fn index(&self) -> u32 {
        match self {
            HandleId::Index(idx) => *idx,
            HandleId::Name(name) => {
                let trimmed = name.trim();
                if let Ok(idx) = trimmed.parse::<u32>() {
                    return idx;
                }
                TRAILING_DIGITS_RE
                    .captures(trimmed)
                    .and_then(|caps| caps.get(1))
                    .and_then(|m| m.as_str().parse::<u32>().ok())
                    .unwrap_or(0)
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRef {
    #[serde(default)]
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub source_handle: Option<HandleId>,
    #[serde(default)]
    pub target_handle: Option<HandleId>,
}

impl EdgeRef {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: format!("{source}->{target}"),
            source,
            target,
            source_handle: None,
            target_handle: None,
        }
    }

    pub fn with_handles(mut self, source_handle: Option<u32>, target_handle: Option<u32>) -> Self {
        self.source_handle = source_handle.map(HandleId::Index);
        self.target_handle = target_handle.map(HandleId::Index);
        self
    }

    pub fn source_handle_index(&self) -> u32 {
        self.source_handle.as_ref().map(HandleId::index).unwrap_or(0)
    }

    pub fn target_handle_index(&self) -> u32 {
        self.target_handle.as_ref().map(HandleId::index).unwrap_or(0)
    }
}

/// Graph snapshot as read from a JSON document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphInput {
    #[serde(default)]
    pub nodes: Vec<NodeRef>,
    #[serde(default)]
    pub edges: Vec<EdgeRef>,
}
