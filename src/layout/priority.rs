use crate::config::LayoutOptions;
use crate::ir::NodeRef;
use serde::{Deserialize, Serialize};

pub const MIN_PRIORITY: i32 = 0;
pub const MAX_PRIORITY: i32 = 100;
pub const DEFAULT_PRIORITY: i32 = 50;

/// Maps a node to its resistance against displacement, 0 (movable) to 100 (pinned).
pub trait PriorityPolicy {
    fn priority(&self, node: &NodeRef) -> i32;
}

impl<F> PriorityPolicy for F
where
    F: Fn(&NodeRef) -> i32,
{
    fn priority(&self, node: &NodeRef) -> i32 {
        self(node)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleField {
    Type,
    Label,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub keywords: Vec<String>,
    pub field: RuleField,
    pub priority: i32,
}

impl KeywordRule {
    fn new(field: RuleField, keywords: &[&str], priority: i32) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            field,
            priority,
        }
    }

    fn matches(&self, node: &NodeRef) -> bool {
        let haystack = match self.field {
            RuleField::Type => node.node_type.to_ascii_lowercase(),
            RuleField::Label => match node.label.as_deref() {
                Some(label) => label.to_ascii_lowercase(),
                None => return false,
            },
        };
        self.keywords
            .iter()
            .any(|keyword| haystack.contains(&keyword.to_ascii_lowercase()))
    }
}

/// First matching rule wins; unmatched nodes get `fallback`.
#[derive(Debug, Clone)]
pub struct KeywordPriority {
    rules: Vec<KeywordRule>,
    fallback: i32,
}

impl KeywordPriority {
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        Self {
            rules,
            fallback: DEFAULT_PRIORITY,
        }
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }
}

impl Default for KeywordPriority {
    fn default() -> Self {
        Self::new(vec![
            KeywordRule::new(RuleField::Type, &["input", "source"], 100),
            KeywordRule::new(RuleField::Type, &["output", "sink", "target"], 90),
            KeywordRule::new(RuleField::Type, &["transform", "process"], 80),
            KeywordRule::new(RuleField::Type, &["filter", "condition"], 70),
            KeywordRule::new(RuleField::Type, &["join", "merge"], 60),
            KeywordRule::new(RuleField::Label, &["critical"], 85),
            KeywordRule::new(RuleField::Label, &["optional", "secondary"], 30),
        ])
    }
}

impl PriorityPolicy for KeywordPriority {
    fn priority(&self, node: &NodeRef) -> i32 {
        self.rules
            .iter()
            .find(|rule| rule.matches(node))
            .map(|rule| rule.priority)
            .unwrap_or(self.fallback)
    }
}

/// Explicit node priority, then the configured policy, then the keyword table.
pub fn resolve_priority(node: &NodeRef, options: &LayoutOptions) -> i32 {
    let raw = match (node.priority, options.priority_function.as_ref()) {
        (Some(explicit), _) => explicit,
        (None, Some(policy)) => policy.0.priority(node),
        (None, None) => KeywordPriority::default().priority(node),
    };
    raw.clamp(MIN_PRIORITY, MAX_PRIORITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_table_follows_type_then_label() {
        let table = KeywordPriority::default();
        assert_eq!(table.priority(&NodeRef::new("a").with_type("csvInput")), 100);
        assert_eq!(table.priority(&NodeRef::new("a").with_type("DataSink")), 90);
        assert_eq!(table.priority(&NodeRef::new("a").with_type("transform")), 80);
        assert_eq!(table.priority(&NodeRef::new("a").with_type("condition")), 70);
        assert_eq!(table.priority(&NodeRef::new("a").with_type("merge")), 60);
        assert_eq!(
            table.priority(&NodeRef::new("a").with_type("step").with_label("Critical path")),
            85
        );
        assert_eq!(
            table.priority(&NodeRef::new("a").with_type("step").with_label("secondary")),
            30
        );
        assert_eq!(table.priority(&NodeRef::new("a").with_type("step")), 50);
    }

    #[test]
    fn explicit_priority_is_clamped_and_wins() {
        let options = LayoutOptions::default().with_priority_function(|_: &NodeRef| 10);
        let node = NodeRef::new("a").with_type("source").with_priority(250);
        assert_eq!(resolve_priority(&node, &options), 100);
        let negative = NodeRef::new("b").with_priority(-4);
        assert_eq!(resolve_priority(&negative, &options), 0);
    }

    #[test]
    fn custom_policy_replaces_keywords() {
        let options = LayoutOptions::default().with_priority_function(|node: &NodeRef| {
            if node.id.starts_with("hot") { 99 } else { 1 }
        });
        assert_eq!(resolve_priority(&NodeRef::new("hot-1").with_type("sink"), &options), 99);
        assert_eq!(resolve_priority(&NodeRef::new("cold").with_type("source"), &options), 1);
        assert_eq!(
            resolve_priority(&NodeRef::new("cold").with_type("source"), &LayoutOptions::default()),
            100
        );
    }
}
