//! Data ingestion: index parsing, source-file loading, fork validation.
//!
//! The index file either carries the dimensional structure
//! (`dimensions → layers → file`) or a legacy flat `sources` list. Each
//! source file is a JSON object of `id → node`; top-level keys starting
//! with `_` are metadata and skipped. Source files load concurrently, but
//! insertion follows index order so the first-declaration-wins rule for
//! duplicate ids is deterministic.
//!
//! Loading is the only fallible boundary of the engine. `load_or_fallback`
//! degrades to a single-entry atlas on any failure so the gate and resolver
//! stay queryable.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::Config;
use crate::error::AppError;
use crate::models::{Atlas, Dimension, Node, SourceEntry};

/// Cross-dimensional jumps the cascade considers natural. Forks outside
/// this table draw a warning unless the source node carries the bypass tag.
static VALID_TRANSITIONS: Lazy<HashMap<Dimension, Vec<Dimension>>> = Lazy::new(|| {
    let dim = |n: u8| Dimension::new(n).expect("built-in dimension ordinal");
    HashMap::from([
        (dim(1), vec![dim(2), dim(3)]),
        (dim(2), vec![dim(3), dim(4)]),
        (dim(3), vec![dim(4), dim(6)]),
        (dim(4), vec![dim(5), dim(7)]),
        (dim(5), vec![dim(6)]),
        (dim(6), vec![dim(7)]),
        // The highest cascade step also folds back to the eternal dimension.
        (dim(7), vec![dim(12), dim(1)]),
    ])
});

// ============================================================================
// Index formats
// ============================================================================

#[derive(Debug, Deserialize)]
struct IndexFile {
    #[serde(default)]
    dimensions: Option<BTreeMap<String, IndexDimension>>,
    #[serde(default)]
    sources: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct IndexDimension {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    layers: BTreeMap<String, IndexLayer>,
}

#[derive(Debug, Deserialize)]
struct IndexLayer {
    #[serde(default)]
    file: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

// ============================================================================
// Warnings and report
// ============================================================================

/// Non-fatal issues found while wiring forks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForkWarning {
    /// Fork points at an id no source file declared.
    Dangling { from: String, target: String },
    /// Cross-dimensional fork outside the transition table, with no bypass
    /// tag on the source node.
    OffCascade {
        from: String,
        from_dimension: Dimension,
        target: String,
        target_dimension: Dimension,
    },
}

impl std::fmt::Display for ForkWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForkWarning::Dangling { from, target } => {
                write!(f, "{} forks to unknown node '{}'", from, target)
            }
            ForkWarning::OffCascade {
                from,
                from_dimension,
                target,
                target_dimension,
            } => write!(
                f,
                "{} ({}) forks to {} ({}) outside the transition table",
                from, from_dimension, target, target_dimension
            ),
        }
    }
}

/// Outcome of a successful load.
#[derive(Debug)]
pub struct LoadReport {
    pub atlas: Atlas,
    pub warnings: Vec<ForkWarning>,
}

// ============================================================================
// Loader
// ============================================================================

/// Loads the atlas described by [`crate::config::DataConfig`].
pub struct DataLoader {
    config: Arc<Config>,
}

impl DataLoader {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Loads index and source files, builds the atlas, validates forks.
    pub async fn load(&self) -> Result<LoadReport, AppError> {
        let index_path = self.data_path(&self.config.data.index);
        tracing::info!(path = %index_path.display(), "loading index");

        let index_text = tokio::fs::read_to_string(&index_path).await?;
        let index: IndexFile = serde_json::from_str(&index_text)?;
        let file_list = self.extract_file_list(index)?;

        if file_list.is_empty() {
            return Err(AppError::DataFormat {
                file: self.config.data.index.clone(),
                message: "index declares no source files".to_string(),
            });
        }

        // Read every source file concurrently; order is restored below.
        let reads = file_list.iter().map(|entry| {
            let path = self.data_path(&entry.file);
            let file = entry.file.clone();
            async move {
                tracing::debug!(%file, "loading source file");
                let text = tokio::fs::read_to_string(&path).await?;
                let raw: Map<String, Value> =
                    serde_json::from_str(&text).map_err(|err| AppError::DataFormat {
                        file: file.clone(),
                        message: err.to_string(),
                    })?;
                Ok::<_, AppError>(raw)
            }
        });
        let contents = futures::future::try_join_all(reads).await?;

        let mut atlas = Atlas::new(self.config.data.entry_node.clone());
        for (entry, raw) in file_list.into_iter().zip(contents) {
            self.insert_source(&mut atlas, entry, raw);
        }

        if !atlas.contains(atlas.entry()) {
            tracing::warn!(
                entry = atlas.entry(),
                "entry node not present in loaded data"
            );
        }

        let warnings = self.validate_forks(&atlas);
        for warning in &warnings {
            tracing::warn!(%warning, "fork validation");
        }
        tracing::info!(
            nodes = atlas.len(),
            links = atlas.links().len(),
            sources = atlas.sources().len(),
            "atlas loaded"
        );

        Ok(LoadReport { atlas, warnings })
    }

    /// Loads the atlas, degrading to the single-entry fallback on failure.
    pub async fn load_or_fallback(&self) -> LoadReport {
        match self.load().await {
            Ok(report) => report,
            Err(err) => {
                tracing::error!(error = %err, "load failed, using fallback atlas");
                LoadReport {
                    atlas: Atlas::fallback(self.config.data.entry_node.clone()),
                    warnings: Vec::new(),
                }
            }
        }
    }

    fn data_path(&self, file: &str) -> PathBuf {
        PathBuf::from(&self.config.data.dir).join(file)
    }

    /// Flattens the index into an ordered source list.
    fn extract_file_list(&self, index: IndexFile) -> Result<Vec<SourceEntry>, AppError> {
        if let Some(dimensions) = index.dimensions {
            let mut files = Vec::new();
            for (dim_key, dim_data) in dimensions {
                let dimension: Dimension = dim_key
                    .parse()
                    .map_err(|_| AppError::UnknownDimension(dim_key.clone()))?;
                for (layer_key, layer) in dim_data.layers {
                    let IndexLayer { file, name } = layer;
                    if let Some(file) = file {
                        files.push(SourceEntry {
                            file,
                            dimension: Some(dimension),
                            layer_name: name.or(Some(layer_key)),
                            dimension_name: dim_data.name.clone(),
                        });
                    }
                }
            }
            return Ok(files);
        }

        if let Some(sources) = index.sources {
            tracing::debug!("legacy flat index format");
            return Ok(sources.into_iter().map(SourceEntry::flat).collect());
        }

        Err(AppError::DataFormat {
            file: self.config.data.index.clone(),
            message: "index has neither 'dimensions' nor 'sources'".to_string(),
        })
    }

    /// Parses one source file's nodes into the atlas.
    fn insert_source(&self, atlas: &mut Atlas, entry: SourceEntry, raw: Map<String, Value>) {
        let file = entry.file.clone();
        let file_dimension = entry.dimension;
        atlas.register_source(entry);

        for (id, value) in raw {
            // Top-level keys starting with '_' are file metadata, not nodes.
            if id.starts_with('_') {
                continue;
            }

            let mut node: Node = match serde_json::from_value(value) {
                Ok(node) => node,
                Err(err) => {
                    tracing::warn!(%file, %id, error = %err, "skipping malformed node");
                    continue;
                }
            };
            node.id = id;
            node.source = Some(file.clone());
            if node.dimension.is_none() {
                node.dimension = file_dimension;
            }

            let node_id = node.id.clone();
            if !atlas.insert(node) {
                tracing::warn!(%file, id = %node_id, "duplicate node id, first declaration wins");
            }
        }
    }

    /// Checks fork targets and cross-dimensional jumps. Warnings only -
    /// content issues never block a load.
    fn validate_forks(&self, atlas: &Atlas) -> Vec<ForkWarning> {
        let bypass_tag = &self.config.progression.bypass_tag;
        let mut warnings = Vec::new();

        for node in atlas.nodes() {
            for fork in &node.forks {
                let Some(target) = atlas.get(&fork.target) else {
                    warnings.push(ForkWarning::Dangling {
                        from: node.id.clone(),
                        target: fork.target.clone(),
                    });
                    continue;
                };

                let (Some(from_dimension), Some(target_dimension)) =
                    (node.dimension, target.dimension)
                else {
                    continue;
                };
                if from_dimension == target_dimension {
                    continue;
                }
                if node.has_tag(bypass_tag) {
                    continue;
                }
                let allowed = VALID_TRANSITIONS
                    .get(&from_dimension)
                    .is_some_and(|targets| targets.contains(&target_dimension));
                if !allowed {
                    warnings.push(ForkWarning::OffCascade {
                        from: node.id.clone(),
                        from_dimension,
                        target: fork.target.clone(),
                        target_dimension,
                    });
                }
            }
        }

        warnings
    }
}
