//! Node model representing entries in the dimensional graph.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Dimension;

/// A directed edge from one node to a candidate next node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fork {
    /// Target node id.
    pub target: String,
    /// Explicit lock override. A locked fork blocks navigation and preview
    /// regardless of gate state.
    #[serde(default)]
    pub locked: bool,
    /// Human-readable hint shown when the fork is blocked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// One entry in the dimensional graph.
///
/// The schema is strict about the fields the engine consults; anything else
/// in the source JSON is carried in `extra` as opaque passthrough data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique id across the whole atlas.
    #[serde(default)]
    pub id: String,
    /// Ordinal tier. Missing means the node is treated as belonging to the
    /// eternal dimension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<Dimension>,
    /// Depth within the node's source. Missing means no depth restriction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<u32>,
    /// Originating source file, stamped by the loader.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Classification markers (e.g. the bypass tag).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Outgoing edges in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub forks: Vec<Fork>,
    /// Marks a node with no onward navigation.
    #[serde(default)]
    pub terminal: bool,
    /// Fields outside the schema, preserved but never consulted.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Node {
    /// Creates a bare node with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            dimension: None,
            layer: None,
            source: None,
            tags: Vec::new(),
            forks: Vec::new(),
            terminal: false,
            extra: Map::new(),
        }
    }

    /// Case-insensitive tag lookup.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Finds the declared fork toward `target`, if any.
    pub fn fork_to(&self, target: &str) -> Option<&Fork> {
        self.forks.iter().find(|f| f.target == target)
    }
}

/// A flattened source → target edge pair, derived from forks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    pub target: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_deserializes_with_defaults() {
        let node: Node = serde_json::from_str(r#"{"layer": 2}"#).unwrap();
        assert!(node.id.is_empty());
        assert_eq!(node.layer, Some(2));
        assert!(node.dimension.is_none());
        assert!(node.forks.is_empty());
        assert!(!node.terminal);
    }

    #[test]
    fn test_unknown_fields_pass_through() {
        let raw = r#"{"dimension": "4D", "symbol": "*", "profound": "text"}"#;
        let node: Node = serde_json::from_str(raw).unwrap();
        assert_eq!(node.extra.get("symbol").and_then(Value::as_str), Some("*"));

        let back = serde_json::to_value(&node).unwrap();
        assert_eq!(back["profound"], "text");
        assert_eq!(back["dimension"], "4D");
    }

    #[test]
    fn test_fork_lock_defaults_to_open() {
        let fork: Fork = serde_json::from_str(r#"{"target": "next"}"#).unwrap();
        assert!(!fork.locked);
        assert!(fork.hint.is_none());
    }

    #[test]
    fn test_has_tag_is_case_insensitive() {
        let mut node = Node::new("n");
        node.tags.push("SYNC".to_string());
        assert!(node.has_tag("sync"));
        assert!(!node.has_tag("time"));
    }

    #[test]
    fn test_fork_to_follows_declaration() {
        let mut node = Node::new("n");
        node.forks.push(Fork {
            target: "a".into(),
            locked: true,
            hint: None,
        });
        assert!(node.fork_to("a").unwrap().locked);
        assert!(node.fork_to("b").is_none());
    }
}
