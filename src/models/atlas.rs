//! Atlas: the finalized node collection for one graph.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::{Dimension, Link, Node};

/// One source file registered in the index, with any dimensional metadata
/// the index attached to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEntry {
    /// File name, also used as the node `source` key.
    pub file: String,
    /// Dimension the index assigns to this file, if any.
    pub dimension: Option<Dimension>,
    /// Layer label from the dimensional index (e.g. "Layer1").
    pub layer_name: Option<String>,
    /// Display name of the dimension from the index.
    pub dimension_name: Option<String>,
}

impl SourceEntry {
    /// A source entry with no dimensional metadata (legacy index format).
    pub fn flat(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            dimension: None,
            layer_name: None,
            dimension_name: None,
        }
    }
}

/// The loaded node collection.
///
/// Node ids are unique across the atlas; the first file to declare an id
/// wins and later duplicates are rejected at insert. Dimension and layer are
/// immutable once a node is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Atlas {
    nodes: HashMap<String, Node>,
    sources: Vec<SourceEntry>,
    source_nodes: HashMap<String, HashSet<String>>,
    entry: String,
}

impl Atlas {
    /// Creates an empty atlas with the designated entry node id.
    pub fn new(entry: impl Into<String>) -> Self {
        Self {
            nodes: HashMap::new(),
            sources: Vec::new(),
            source_nodes: HashMap::new(),
            entry: entry.into(),
        }
    }

    /// Single-node atlas used when data loading fails, so gate and resolver
    /// queries keep well-defined answers.
    pub fn fallback(entry: impl Into<String>) -> Self {
        let entry = entry.into();
        let mut atlas = Atlas::new(entry.clone());
        let mut node = Node::new(entry);
        node.dimension = Some(Dimension::MIN);
        node.layer = Some(0);
        atlas.insert(node);
        atlas
    }

    /// Registers a source file. Order follows the index.
    pub fn register_source(&mut self, source: SourceEntry) {
        self.source_nodes.entry(source.file.clone()).or_default();
        self.sources.push(source);
    }

    /// Inserts a node, enforcing id uniqueness. Returns false (and leaves the
    /// existing node untouched) when the id is already taken.
    pub fn insert(&mut self, node: Node) -> bool {
        if self.nodes.contains_key(&node.id) {
            return false;
        }
        if let Some(source) = &node.source {
            self.source_nodes
                .entry(source.clone())
                .or_default()
                .insert(node.id.clone());
        }
        self.nodes.insert(node.id.clone(), node);
        true
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Designated entry node id.
    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Registered source files in index order.
    pub fn sources(&self) -> &[SourceEntry] {
        &self.sources
    }

    /// Node ids declared by one source file.
    pub fn nodes_in_source(&self, file: &str) -> impl Iterator<Item = &String> {
        self.source_nodes.get(file).into_iter().flatten()
    }

    /// Flattens forks into source → target link pairs, skipping targets that
    /// do not resolve to a loaded node.
    pub fn links(&self) -> Vec<Link> {
        let mut links = Vec::new();
        for node in self.nodes.values() {
            for fork in &node.forks {
                if self.nodes.contains_key(&fork.target) {
                    links.push(Link {
                        source: node.id.clone(),
                        target: fork.target.clone(),
                    });
                }
            }
        }
        links
    }

    /// Node counts keyed by dimension; nodes without a dimension are counted
    /// under `None`.
    pub fn dimension_counts(&self) -> BTreeMap<Option<Dimension>, usize> {
        let mut counts = BTreeMap::new();
        for node in self.nodes.values() {
            *counts.entry(node.dimension).or_insert(0) += 1;
        }
        counts
    }
}
