//! Configuration with layered resolution using figment.
//!
//! Resolution order (highest priority last):
//! 1. User config: `~/.config/labyrinth/config.toml` (XDG) or platform config dir
//! 2. Project config: `.labyrinth.toml`
//! 3. Environment variables: `LABYRINTH_*`
//!
//! # Intended Usage
//!
//! **Project config** (`.labyrinth.toml` next to the data directory):
//! ```toml
//! [data]
//! dir = "data"
//! index = "index.json"
//! entry_node = "entry_root"
//!
//! [progression]
//! gating_enabled = true
//! anchor_dimensions = ["1D", "3D", "6D", "7D"]
//!
//! [progression.anchor_prerequisites]
//! "6D" = ["1D", "3D"]
//! "7D" = ["6D"]
//! "12D" = ["7D"]
//!
//! [[progression.evolution]]
//! anchor = "1D"
//! unlocks = 3
//! ```
//!
//! Every field has a default, so an empty config is valid. Progression
//! tables are validated once at load; queries never fail due to config
//! shape after `Config::load` returns.

use std::collections::HashMap;
use std::ops::Deref;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::Dimension;

/// Boxed wrapper for figment::Error to reduce Result size on the stack.
#[derive(Debug)]
pub struct ConfigError(Box<figment::Error>);

impl Deref for ConfigError {
    type Target = figment::Error;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self(Box::new(err))
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub progression: ProgressionConfig,
}

/// Where the graph data lives and which node the session starts on.
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Directory containing the index and source files.
    #[serde(default = "default_data_dir")]
    pub dir: String,
    /// Index file name within the data directory.
    #[serde(default = "default_index_file")]
    pub index: String,
    /// Node id every session starts from (and falls back to on load failure).
    #[serde(default = "default_entry_node")]
    pub entry_node: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            index: default_index_file(),
            entry_node: default_entry_node(),
        }
    }
}

/// One step of the evolution cascade: completing `anchor` raises the
/// player's clearance to `unlocks`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EvolutionStep {
    pub anchor: Dimension,
    pub unlocks: u8,
}

/// Feature flags and gating tables for the dual-gate progression system.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressionConfig {
    /// Master toggle for the dual-gate system. Off means every node is
    /// accessible.
    #[serde(default)]
    pub gating_enabled: bool,
    /// Allows bypass-tagged nodes to skip the clearance check.
    #[serde(default = "default_true")]
    pub bypass_enabled: bool,
    /// Dev/test escape hatch: every gate passes, every visible node is
    /// clickable.
    #[serde(default)]
    pub override_all_gates: bool,
    /// Cap on the reachable-preview set.
    #[serde(default = "default_reachable_limit")]
    pub reachable_limit: usize,
    /// Dimensions that can be completed as anchors.
    #[serde(default = "default_anchor_dimensions")]
    pub anchor_dimensions: Vec<Dimension>,
    /// Dimension → anchors that must all be completed before it opens.
    #[serde(default = "default_anchor_prerequisites")]
    pub anchor_prerequisites: HashMap<Dimension, Vec<Dimension>>,
    /// Ordered cascade of clearance raises driven by anchor completion.
    #[serde(default = "default_evolution")]
    pub evolution: Vec<EvolutionStep>,
    /// The always-accessible dimension.
    #[serde(default = "default_eternal_dimension")]
    pub eternal_dimension: Dimension,
    /// Layer a node must reach for its dimension to count as completed.
    #[serde(default = "default_anchor_completion_layer")]
    pub anchor_completion_layer: u32,
    /// Tag that grants the clearance-check exception.
    #[serde(default = "default_bypass_tag")]
    pub bypass_tag: String,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            gating_enabled: false,
            bypass_enabled: default_true(),
            override_all_gates: false,
            reachable_limit: default_reachable_limit(),
            anchor_dimensions: default_anchor_dimensions(),
            anchor_prerequisites: default_anchor_prerequisites(),
            evolution: default_evolution(),
            eternal_dimension: default_eternal_dimension(),
            anchor_completion_layer: default_anchor_completion_layer(),
            bypass_tag: default_bypass_tag(),
        }
    }
}

impl ProgressionConfig {
    /// Validates the gating tables. Rejected configurations never reach the
    /// gate - queries must not fail at runtime due to config shape.
    pub fn validate(&self) -> Result<(), AppError> {
        for (dimension, prereqs) in &self.anchor_prerequisites {
            for prereq in prereqs {
                if !self.anchor_dimensions.contains(prereq) {
                    return Err(AppError::InvalidConfig(format!(
                        "prerequisite {} for {} is not an anchor dimension",
                        prereq, dimension
                    )));
                }
            }
        }
        for step in &self.evolution {
            if !self.anchor_dimensions.contains(&step.anchor) {
                return Err(AppError::InvalidConfig(format!(
                    "evolution step references {} which is not an anchor dimension",
                    step.anchor
                )));
            }
            if !(1..=Dimension::MAX.ordinal()).contains(&step.unlocks) {
                return Err(AppError::InvalidConfig(format!(
                    "evolution step for {} unlocks level {} (valid: 1..=12)",
                    step.anchor, step.unlocks
                )));
            }
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_index_file() -> String {
    "index.json".to_string()
}

fn default_entry_node() -> String {
    "entry_root".to_string()
}

fn default_reachable_limit() -> usize {
    3
}

fn dim(ordinal: u8) -> Dimension {
    Dimension::new(ordinal).expect("built-in dimension ordinal")
}

fn default_anchor_dimensions() -> Vec<Dimension> {
    vec![dim(1), dim(3), dim(6), dim(7)]
}

fn default_anchor_prerequisites() -> HashMap<Dimension, Vec<Dimension>> {
    HashMap::from([
        (dim(6), vec![dim(1), dim(3)]),
        (dim(7), vec![dim(6)]),
        (dim(12), vec![dim(7)]),
    ])
}

fn default_evolution() -> Vec<EvolutionStep> {
    vec![
        EvolutionStep {
            anchor: dim(1),
            unlocks: 3,
        },
        EvolutionStep {
            anchor: dim(3),
            unlocks: 6,
        },
        EvolutionStep {
            anchor: dim(6),
            unlocks: 7,
        },
        EvolutionStep {
            anchor: dim(7),
            unlocks: 12,
        },
    ]
}

fn default_eternal_dimension() -> Dimension {
    Dimension::MIN
}

fn default_anchor_completion_layer() -> u32 {
    3
}

fn default_bypass_tag() -> String {
    "sync".to_string()
}

impl Config {
    /// Load config with layered resolution (user → project → env), then
    /// validate the progression tables. Fails fast on invalid tables.
    pub fn load() -> Result<Self, AppError> {
        let user_config = Self::user_config_path();

        let config: Config = Figment::new()
            // Layer 1: User config (lowest priority)
            .merge(Toml::file(user_config))
            // Layer 2: Project config
            .merge(Toml::file(".labyrinth.toml"))
            // Layer 3: Environment variables (highest priority)
            .merge(Env::prefixed("LABYRINTH_").split("_"))
            .extract()
            .map_err(ConfigError::from)?;

        config.progression.validate()?;
        Ok(config)
    }

    /// User config path: ~/.config/labyrinth/config.toml (XDG) or platform
    /// config dir.
    fn user_config_path() -> std::path::PathBuf {
        // Prefer XDG config location (~/.config) on all platforms
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home.join(".config").join("labyrinth").join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }
        // Fall back to platform-specific config dir
        dirs::config_dir()
            .map(|p| p.join("labyrinth").join("config.toml"))
            .unwrap_or_default()
    }
}
