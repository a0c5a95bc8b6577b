use crate::layout::priority::{KeywordPriority, KeywordRule, PriorityPolicy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_LEVEL_WIDTH: f32 = 240.0;
pub const MIN_LEVEL_WIDTH: f32 = 80.0;
pub const DEFAULT_NODE_SPACING: f32 = 160.0;
pub const MIN_NODE_SPACING: f32 = 60.0;
pub const DEFAULT_FAN_IN_PADDING: f32 = 10.0;
pub const DEFAULT_MIN_NODE_GAP: f32 = 20.0;
pub const MIN_NODE_GAP: f32 = 10.0;
pub const DEFAULT_SWEEPS: usize = 4;
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(50);

/// How the cross axis (`y`) is distributed inside a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Distribution {
    Even,
    #[default]
    Compact,
    Priority,
}

/// Main flow direction for the hierarchical path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Direction {
    #[default]
    Right,
    Down,
    Left,
    Up,
}

impl Direction {
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Right | Direction::Left)
    }
}

/// Shared handle to a priority policy so options stay cheap to clone.
#[derive(Clone)]
pub struct SharedPriorityPolicy(pub Arc<dyn PriorityPolicy + Send + Sync>);

impl SharedPriorityPolicy {
    pub fn new(policy: impl PriorityPolicy + Send + Sync + 'static) -> Self {
        Self(Arc::new(policy))
    }
}

impl fmt::Debug for SharedPriorityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedPriorityPolicy(..)")
    }
}

#[derive(Debug, Clone)]
pub struct LayoutOptions {
    pub start_x: f32,
    pub start_y: f32,
    pub level_width: f32,
    pub node_spacing: f32,
    pub fan_in_padding_per_edge: f32,
    pub distribution: Distribution,
    /// Overrides the keyword table. An explicit `NodeRef::priority` still wins.
    pub priority_function: Option<SharedPriorityPolicy>,
    pub overlap_prevention: bool,
    pub min_node_gap: f32,
    pub direction: Direction,
    pub fit_view: bool,
    /// Passed through to the rendering surface untouched.
    pub fit_view_options: serde_json::Value,
    pub sweeps: usize,
    pub settle_delay: Duration,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            start_x: 0.0,
            start_y: 0.0,
            level_width: DEFAULT_LEVEL_WIDTH,
            node_spacing: DEFAULT_NODE_SPACING,
            fan_in_padding_per_edge: DEFAULT_FAN_IN_PADDING,
            distribution: Distribution::default(),
            priority_function: None,
            overlap_prevention: true,
            min_node_gap: DEFAULT_MIN_NODE_GAP,
            direction: Direction::default(),
            fit_view: false,
            fit_view_options: serde_json::Value::Null,
            sweeps: DEFAULT_SWEEPS,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

impl LayoutOptions {
    pub fn with_distribution(mut self, distribution: Distribution) -> Self {
        self.distribution = distribution;
        self
    }

    pub fn with_start(mut self, x: f32, y: f32) -> Self {
        self.start_x = x;
        self.start_y = y;
        self
    }

    pub fn with_priority_function(
        mut self,
        policy: impl PriorityPolicy + Send + Sync + 'static,
    ) -> Self {
        self.priority_function = Some(SharedPriorityPolicy::new(policy));
        self
    }

    /// Copy with every numeric option clamped into its supported range.
    pub fn normalized(&self) -> Self {
        let mut out = self.clone();
        out.start_x = finite_or(out.start_x, 0.0);
        out.start_y = finite_or(out.start_y, 0.0);
        out.level_width = finite_or(out.level_width, DEFAULT_LEVEL_WIDTH).max(MIN_LEVEL_WIDTH);
        out.node_spacing = finite_or(out.node_spacing, DEFAULT_NODE_SPACING).max(MIN_NODE_SPACING);
        out.fan_in_padding_per_edge =
            finite_or(out.fan_in_padding_per_edge, DEFAULT_FAN_IN_PADDING).max(0.0);
        out.min_node_gap = finite_or(out.min_node_gap, DEFAULT_MIN_NODE_GAP).max(MIN_NODE_GAP);
        out.sweeps = out.sweeps.max(1);
        out
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    start_x: Option<f32>,
    start_y: Option<f32>,
    level_width: Option<f32>,
    node_spacing: Option<f32>,
    fan_in_padding_per_edge: Option<f32>,
    distribution: Option<Distribution>,
    overlap_prevention: Option<bool>,
    min_node_gap: Option<f32>,
    direction: Option<Direction>,
    fit_view: Option<bool>,
    fit_view_options: Option<serde_json::Value>,
    sweeps: Option<usize>,
    settle_delay_ms: Option<u64>,
    priority_rules: Option<Vec<KeywordRule>>,
}

pub fn load_options(path: Option<&Path>) -> anyhow::Result<LayoutOptions> {
    let Some(path) = path else {
        return Ok(LayoutOptions::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_options(&contents)
}

/// Reads options from JSON5 text (plain JSON is accepted as well).
pub fn parse_options(contents: &str) -> anyhow::Result<LayoutOptions> {
    let parsed: ConfigFile = json5::from_str(contents)?;
    let mut options = LayoutOptions::default();

    if let Some(v) = parsed.start_x {
        options.start_x = v;
    }
    if let Some(v) = parsed.start_y {
        options.start_y = v;
    }
    if let Some(v) = parsed.level_width {
        options.level_width = v;
    }
    if let Some(v) = parsed.node_spacing {
        options.node_spacing = v;
    }
    if let Some(v) = parsed.fan_in_padding_per_edge {
        options.fan_in_padding_per_edge = v;
    }
    if let Some(v) = parsed.distribution {
        options.distribution = v;
    }
    if let Some(v) = parsed.overlap_prevention {
        options.overlap_prevention = v;
    }
    if let Some(v) = parsed.min_node_gap {
        options.min_node_gap = v;
    }
    if let Some(v) = parsed.direction {
        options.direction = v;
    }
    if let Some(v) = parsed.fit_view {
        options.fit_view = v;
    }
    if let Some(v) = parsed.fit_view_options {
        options.fit_view_options = v;
    }
    if let Some(v) = parsed.sweeps {
        options.sweeps = v;
    }
    if let Some(ms) = parsed.settle_delay_ms {
        options.settle_delay = Duration::from_millis(ms);
    }
    if let Some(rules) = parsed.priority_rules {
        options.priority_function = Some(SharedPriorityPolicy::new(KeywordPriority::new(rules)));
    }

    Ok(options.normalized())
}
