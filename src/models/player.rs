//! Player progression state for one session.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use super::Dimension;

/// Mutable progression record, one per active session.
///
/// All fields grow monotonically under `ProgressionGate::unlock`;
/// only an explicit reset clears them. The gate owns every mutation -
/// hosts read this struct, they never write it directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    /// Session identifier (ULID), used in log correlation.
    pub session_id: String,
    /// Session start timestamp.
    pub started_at: DateTime<Utc>,
    /// Currently unlocked maximum dimension ordinal (1..=12).
    pub clearance_level: u8,
    /// Anchor dimensions that have been fully satisfied.
    pub anchors_completed: HashSet<Dimension>,
    /// Highest layer reached per source.
    pub depth_reached: HashMap<String, u32>,
    /// Every node id ever marked reachable or visited.
    pub unlocked_nodes: HashSet<String>,
}

impl PlayerState {
    /// Creates a fresh session state with the entry node unlocked.
    pub fn new(entry_node: impl Into<String>) -> Self {
        let mut unlocked_nodes = HashSet::new();
        unlocked_nodes.insert(entry_node.into());
        Self {
            session_id: Ulid::new().to_string(),
            started_at: Utc::now(),
            clearance_level: 1,
            anchors_completed: HashSet::new(),
            depth_reached: HashMap::new(),
            unlocked_nodes,
        }
    }

    /// Highest layer reached in `source`, 0 when the source is untouched.
    pub fn depth_in(&self, source: &str) -> u32 {
        self.depth_reached.get(source).copied().unwrap_or(0)
    }

    /// Whether `id` has been unlocked this session.
    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked_nodes.contains(id)
    }
}
