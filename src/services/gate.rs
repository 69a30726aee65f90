//! Dual-gate progression engine.
//!
//! Two independent gates govern navigation: dimensional clearance (coarse,
//! per player) and source depth (fine, per data file). Two exceptions cut
//! across them: the eternal dimension always passes, and bypass-tagged nodes
//! skip the clearance check. Anchor prerequisites sit above both - a
//! dimension whose anchors are incomplete stays closed no matter what.
//!
//! Mutations go through [`ProgressionGate::unlock`], which returns the list
//! of progression events it caused so hosts can update their displays
//! without watching the state for diffs.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::config::Config;
use crate::models::{Atlas, Dimension, Node, PlayerState};

// ============================================================================
// Events and Denials
// ============================================================================

/// State transitions caused by an unlock, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressionEvent {
    /// A node id was added to the unlocked set.
    NodeUnlocked { id: String },
    /// The depth record for a source advanced.
    DepthAdvanced { source: String, layer: u32 },
    /// An anchor dimension was completed.
    AnchorCompleted { dimension: Dimension },
    /// The evolution cascade raised the clearance level.
    ClearanceRaised { level: u8 },
}

/// Why a node is not accessible, for host display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessDenial {
    /// Dimension of the blocked node.
    pub dimension: Dimension,
    /// Anchor prerequisites still missing for that dimension.
    pub missing_anchors: Vec<Dimension>,
    /// Clearance the node's dimension demands.
    pub required_clearance: u8,
    /// Clearance the player currently holds.
    pub current_clearance: u8,
}

impl std::fmt::Display for AccessDenial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.missing_anchors.is_empty() {
            write!(
                f,
                "requires {} (your clearance: {}D)",
                self.dimension, self.current_clearance
            )
        } else {
            let anchors: Vec<String> = self
                .missing_anchors
                .iter()
                .map(|anchor| anchor.to_string())
                .collect();
            write!(
                f,
                "requires {}; complete anchors: {}",
                self.dimension,
                anchors.join(", ")
            )
        }
    }
}

// ============================================================================
// Gate Service
// ============================================================================

/// Service deciding node accessibility and applying unlock-time transitions.
#[derive(Clone)]
pub struct ProgressionGate {
    config: Arc<Config>,
}

impl ProgressionGate {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Effective dimension of a node. A missing dimension field reads as the
    /// eternal dimension.
    pub fn dimension_of(&self, node: &Node) -> Dimension {
        node.dimension
            .unwrap_or(self.config.progression.eternal_dimension)
    }

    /// Dual-gate accessibility check.
    ///
    /// Rule order (first match wins):
    /// 1. `override_all_gates` → accessible
    /// 2. gating disabled → accessible
    /// 3. eternal dimension → accessible
    /// 4. missing anchor prerequisite → blocked (absolute, bypass cannot skip)
    /// 5. bypass tag with bypass enabled → accessible
    /// 6. dimension above clearance → blocked
    /// 7. layer more than one ahead of the source's depth record → blocked
    /// 8. otherwise accessible
    pub fn is_accessible(&self, node: &Node, player: &PlayerState) -> bool {
        let progression = &self.config.progression;

        if progression.override_all_gates {
            return true;
        }
        if !progression.gating_enabled {
            return true;
        }

        let dimension = self.dimension_of(node);
        if dimension == progression.eternal_dimension {
            return true;
        }

        // Anchor gate comes first: it cannot be bypassed.
        let missing = self.missing_anchors(dimension, player);
        if !missing.is_empty() {
            tracing::debug!(
                id = %node.id,
                %dimension,
                ?missing,
                "anchor gate blocked"
            );
            return false;
        }

        if progression.bypass_enabled && node.has_tag(&progression.bypass_tag) {
            tracing::debug!(id = %node.id, "bypass tag active");
            return true;
        }

        // Gate 1: dimensional clearance.
        if dimension.ordinal() > player.clearance_level {
            return false;
        }

        // Gate 2: source depth. A node may sit at most one layer ahead of the
        // deepest point reached in its source. Nodes without source or layer
        // carry no depth restriction.
        if let (Some(source), Some(layer)) = (node.source.as_deref(), node.layer) {
            if layer > player.depth_in(source) + 1 {
                tracing::debug!(
                    id = %node.id,
                    source,
                    layer,
                    reached = player.depth_in(source),
                    "depth gate blocked"
                );
                return false;
            }
        }

        true
    }

    /// Builds the denial record for a blocked node, for host display.
    pub fn explain_denial(&self, node: &Node, player: &PlayerState) -> AccessDenial {
        let dimension = self.dimension_of(node);
        AccessDenial {
            dimension,
            missing_anchors: self.missing_anchors(dimension, player),
            required_clearance: dimension.ordinal(),
            current_clearance: player.clearance_level,
        }
    }

    fn missing_anchors(&self, dimension: Dimension, player: &PlayerState) -> Vec<Dimension> {
        self.config
            .progression
            .anchor_prerequisites
            .get(&dimension)
            .map(|required| {
                required
                    .iter()
                    .filter(|anchor| !player.anchors_completed.contains(anchor))
                    .copied()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Marks a node unlocked and applies the progression bookkeeping.
    ///
    /// Safe to call repeatedly for the same node: the unlocked set is a set,
    /// and depth/anchor records only ever advance. Returned events reflect
    /// what actually changed on this call.
    pub fn unlock(&self, node: &Node, player: &mut PlayerState) -> Vec<ProgressionEvent> {
        let mut events = Vec::new();

        if player.unlocked_nodes.insert(node.id.clone()) {
            tracing::debug!(id = %node.id, "node unlocked");
            events.push(ProgressionEvent::NodeUnlocked {
                id: node.id.clone(),
            });
        }

        if let (Some(source), Some(layer)) = (node.source.clone(), node.layer) {
            let reached = player.depth_reached.entry(source.clone()).or_insert(0);
            if layer > *reached {
                *reached = layer;
                tracing::debug!(%source, layer, "source depth advanced");
                events.push(ProgressionEvent::DepthAdvanced { source, layer });
            }
        }

        let progression = &self.config.progression;
        let dimension = self.dimension_of(node);
        if progression.anchor_dimensions.contains(&dimension)
            && node
                .layer
                .is_some_and(|layer| layer >= progression.anchor_completion_layer)
            && player.anchors_completed.insert(dimension)
        {
            tracing::info!(%dimension, "anchor completed");
            events.push(ProgressionEvent::AnchorCompleted { dimension });
            self.cascade(player, &mut events);
        }

        events
    }

    /// Walks the evolution order and raises clearance to every level whose
    /// anchor is satisfied. Never lowers.
    fn cascade(&self, player: &mut PlayerState, events: &mut Vec<ProgressionEvent>) {
        for step in &self.config.progression.evolution {
            if player.anchors_completed.contains(&step.anchor)
                && player.clearance_level < step.unlocks
            {
                player.clearance_level = step.unlocks;
                tracing::info!(level = step.unlocks, anchor = %step.anchor, "clearance raised");
                events.push(ProgressionEvent::ClearanceRaised {
                    level: step.unlocks,
                });
            }
        }
    }

    /// Manual clearance raise (operator command). Never lowers.
    pub fn force_clearance(
        &self,
        dimension: Dimension,
        player: &mut PlayerState,
    ) -> Option<ProgressionEvent> {
        if dimension.ordinal() <= player.clearance_level {
            return None;
        }
        player.clearance_level = dimension.ordinal();
        tracing::info!(%dimension, "manual clearance raise");
        Some(ProgressionEvent::ClearanceRaised {
            level: dimension.ordinal(),
        })
    }

    /// Clears all progression back to the session-start state: clearance 1,
    /// empty records, only the entry node unlocked.
    pub fn reset(&self, player: &mut PlayerState, entry_node: &str) {
        player.clearance_level = 1;
        player.anchors_completed.clear();
        player.depth_reached.clear();
        player.unlocked_nodes.clear();
        player.unlocked_nodes.insert(entry_node.to_string());
        tracing::info!(entry = entry_node, "progression reset");
    }

    /// Fork targets of `from` that are still locked but could be taken next.
    ///
    /// Follows fork declaration order; skips unlocked targets, explicitly
    /// locked forks, and targets that do not resolve in the atlas; filters
    /// through the gate; de-duplicates; caps at `reachable_limit`.
    pub fn reachable_from(
        &self,
        from: &Node,
        atlas: &Atlas,
        player: &PlayerState,
    ) -> Vec<String> {
        let limit = self.config.progression.reachable_limit;
        let mut seen = HashSet::new();
        let mut reachable = Vec::new();

        for fork in &from.forks {
            if reachable.len() >= limit {
                break;
            }
            if fork.locked || player.is_unlocked(&fork.target) {
                continue;
            }
            let Some(target) = atlas.get(&fork.target) else {
                continue;
            };
            if !self.is_accessible(target, player) {
                continue;
            }
            if seen.insert(fork.target.clone()) {
                reachable.push(fork.target.clone());
            }
        }

        reachable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvolutionStep;
    use crate::models::Fork;

    fn dim(n: u8) -> Dimension {
        Dimension::new(n).unwrap()
    }

    fn gated_config() -> Arc<Config> {
        let mut config = Config::default();
        config.progression.gating_enabled = true;
        Arc::new(config)
    }

    fn gate(config: Arc<Config>) -> ProgressionGate {
        ProgressionGate::new(config)
    }

    fn node(id: &str, dimension: u8, layer: u32, source: &str) -> Node {
        let mut n = Node::new(id);
        n.dimension = Some(dim(dimension));
        n.layer = Some(layer);
        n.source = Some(source.to_string());
        n
    }

    #[test]
    fn test_eternal_dimension_always_accessible() {
        let gate = gate(gated_config());
        let player = PlayerState::new("entry");
        let eternal = node("a", 1, 9, "deep.json");
        // Depth and clearance are irrelevant for the eternal dimension.
        assert!(gate.is_accessible(&eternal, &player));
    }

    #[test]
    fn test_gating_disabled_opens_everything() {
        let gate = gate(Arc::new(Config::default()));
        let player = PlayerState::new("entry");
        assert!(gate.is_accessible(&node("a", 12, 9, "s.json"), &player));
    }

    #[test]
    fn test_override_all_gates_passes_even_anchor_gate() {
        let mut config = Config::default();
        config.progression.gating_enabled = true;
        config.progression.override_all_gates = true;
        let gate = gate(Arc::new(config));
        let player = PlayerState::new("entry");
        assert!(gate.is_accessible(&node("a", 6, 1, "s.json"), &player));
    }

    #[test]
    fn test_anchor_gate_is_absolute_despite_bypass() {
        // 6D requires 1D+3D; only 1D complete; clearance 12; bypass tag
        // present and enabled - still blocked.
        let gate = gate(gated_config());
        let mut player = PlayerState::new("entry");
        player.clearance_level = 12;
        player.anchors_completed.insert(dim(1));

        let mut blocked = node("b", 6, 1, "s.json");
        blocked.tags.push("sync".to_string());
        assert!(!gate.is_accessible(&blocked, &player));

        // Scenario 3: completing the missing anchor opens it.
        player.anchors_completed.insert(dim(3));
        assert!(gate.is_accessible(&blocked, &player));
    }

    #[test]
    fn test_bypass_tag_skips_clearance_gate() {
        let gate = gate(gated_config());
        let player = PlayerState::new("entry");
        // 4D has no anchor prerequisites; clearance is only 1.
        let mut tagged = node("c", 4, 1, "s.json");
        tagged.tags.push("SYNC".to_string());
        assert!(gate.is_accessible(&tagged, &player));

        let untagged = node("d", 4, 1, "s.json");
        assert!(!gate.is_accessible(&untagged, &player));
    }

    #[test]
    fn test_bypass_disabled_restores_clearance_gate() {
        let mut config = Config::default();
        config.progression.gating_enabled = true;
        config.progression.bypass_enabled = false;
        let gate = gate(Arc::new(config));
        let player = PlayerState::new("entry");
        let mut tagged = node("c", 4, 1, "s.json");
        tagged.tags.push("sync".to_string());
        assert!(!gate.is_accessible(&tagged, &player));
    }

    #[test]
    fn test_depth_gate_allows_one_layer_ahead() {
        let gate = gate(gated_config());
        let mut player = PlayerState::new("entry");
        player.clearance_level = 12;
        player.depth_reached.insert("s1".to_string(), 3);

        let far = node("c", 2, 5, "s1");
        assert!(!gate.is_accessible(&far, &player));

        let events = gate.unlock(&node("step", 2, 4, "s1"), &mut player);
        assert!(events.contains(&ProgressionEvent::DepthAdvanced {
            source: "s1".to_string(),
            layer: 4,
        }));
        assert!(gate.is_accessible(&far, &player));
    }

    #[test]
    fn test_missing_layer_skips_depth_gate() {
        let gate = gate(gated_config());
        let mut player = PlayerState::new("entry");
        player.clearance_level = 4;
        let mut no_layer = node("c", 2, 0, "untouched.json");
        no_layer.layer = None;
        assert!(gate.is_accessible(&no_layer, &player));
    }

    #[test]
    fn test_missing_dimension_reads_as_eternal() {
        let gate = gate(gated_config());
        let player = PlayerState::new("entry");
        let mut bare = Node::new("x");
        bare.layer = Some(9);
        bare.source = Some("s.json".to_string());
        assert!(gate.is_accessible(&bare, &player));
    }

    #[test]
    fn test_unlock_completes_anchor_and_cascades() {
        let gate = gate(gated_config());
        let mut player = PlayerState::new("entry");

        let events = gate.unlock(&node("deep_1d", 1, 3, "one.json"), &mut player);
        assert!(events.contains(&ProgressionEvent::AnchorCompleted { dimension: dim(1) }));
        assert!(events.contains(&ProgressionEvent::ClearanceRaised { level: 3 }));
        assert_eq!(player.clearance_level, 3);

        // Completing 3D raises to 6.
        gate.unlock(&node("deep_3d", 3, 4, "three.json"), &mut player);
        assert_eq!(player.clearance_level, 6);
        assert!(player.anchors_completed.contains(&dim(3)));
    }

    #[test]
    fn test_unlock_below_threshold_leaves_anchor_open() {
        let gate = gate(gated_config());
        let mut player = PlayerState::new("entry");
        let events = gate.unlock(&node("shallow", 1, 2, "one.json"), &mut player);
        assert!(!events
            .iter()
            .any(|e| matches!(e, ProgressionEvent::AnchorCompleted { .. })));
        assert_eq!(player.clearance_level, 1);
    }

    #[test]
    fn test_unlock_is_idempotent_and_monotone() {
        let gate = gate(gated_config());
        let mut player = PlayerState::new("entry");
        let n = node("deep_1d", 1, 3, "one.json");

        let first = gate.unlock(&n, &mut player);
        assert!(!first.is_empty());
        let second = gate.unlock(&n, &mut player);
        assert!(second.is_empty());

        // A shallower node in the same source never lowers the record.
        gate.unlock(&node("shallower", 1, 1, "one.json"), &mut player);
        assert_eq!(player.depth_in("one.json"), 3);
        assert_eq!(player.clearance_level, 3);
        assert_eq!(player.unlocked_nodes.len(), 3);
    }

    #[test]
    fn test_cascade_never_lowers_clearance() {
        let mut config = Config::default();
        config.progression.gating_enabled = true;
        config.progression.evolution = vec![EvolutionStep {
            anchor: dim(1),
            unlocks: 3,
        }];
        let gate = gate(Arc::new(config));
        let mut player = PlayerState::new("entry");
        player.clearance_level = 7;

        gate.unlock(&node("deep_1d", 1, 3, "one.json"), &mut player);
        assert_eq!(player.clearance_level, 7);
    }

    #[test]
    fn test_force_clearance_only_raises() {
        let gate = gate(gated_config());
        let mut player = PlayerState::new("entry");

        let event = gate.force_clearance(dim(6), &mut player);
        assert_eq!(event, Some(ProgressionEvent::ClearanceRaised { level: 6 }));
        assert_eq!(player.clearance_level, 6);

        assert!(gate.force_clearance(dim(2), &mut player).is_none());
        assert_eq!(player.clearance_level, 6);
    }

    #[test]
    fn test_reset_restores_entry_only_state() {
        let gate = gate(gated_config());
        let mut player = PlayerState::new("entry_root");
        gate.unlock(&node("deep_1d", 1, 3, "one.json"), &mut player);
        gate.unlock(&node("other", 2, 1, "two.json"), &mut player);

        gate.reset(&mut player, "entry_root");
        assert_eq!(player.clearance_level, 1);
        assert!(player.anchors_completed.is_empty());
        assert!(player.depth_reached.is_empty());
        assert_eq!(
            player.unlocked_nodes,
            HashSet::from(["entry_root".to_string()])
        );
    }

    #[test]
    fn test_explain_denial_reports_missing_anchors() {
        let gate = gate(gated_config());
        let mut player = PlayerState::new("entry");
        player.anchors_completed.insert(dim(1));

        let denial = gate.explain_denial(&node("b", 6, 1, "s.json"), &player);
        assert_eq!(denial.dimension, dim(6));
        assert_eq!(denial.missing_anchors, vec![dim(3)]);
        assert_eq!(denial.required_clearance, 6);
        assert_eq!(denial.current_clearance, 1);
        assert!(denial.to_string().contains("3D"));
    }

    fn reachability_atlas() -> Atlas {
        let mut atlas = Atlas::new("entry");
        let mut entry = Node::new("entry");
        entry.dimension = Some(dim(1));
        for target in ["a", "b", "a", "c", "d", "e"] {
            entry.forks.push(Fork {
                target: target.to_string(),
                locked: false,
                hint: None,
            });
        }
        entry.forks[4].locked = true; // "d" explicitly locked
        atlas.insert(entry);
        for id in ["a", "b", "c", "d", "e"] {
            atlas.insert(node(id, 1, 1, "s.json"));
        }
        atlas
    }

    #[test]
    fn test_reachable_caps_dedups_and_skips_locks() {
        let gate = gate(gated_config());
        let atlas = reachability_atlas();
        let player = PlayerState::new("entry");

        let reachable = gate.reachable_from(atlas.get("entry").unwrap(), &atlas, &player);
        // "a" duplicated, "d" locked; cap of 3 leaves a, b, c.
        assert_eq!(reachable, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_reachable_excludes_unlocked_and_unknown() {
        let gate = gate(gated_config());
        let atlas = reachability_atlas();
        let mut player = PlayerState::new("entry");
        player.unlocked_nodes.insert("a".to_string());

        // Point one fork at a node that is not in the atlas.
        let mut entry = atlas.get("entry").unwrap().clone();
        entry.forks[1].target = "ghost".to_string();
        let reachable = gate.reachable_from(&entry, &atlas, &player);
        assert_eq!(reachable, vec!["c", "e"]);
    }

    #[test]
    fn test_reachable_respects_gate_filter() {
        let gate = gate(gated_config());
        let mut atlas = Atlas::new("entry");
        let mut entry = Node::new("entry");
        entry.dimension = Some(dim(1));
        entry.forks.push(Fork {
            target: "high".to_string(),
            locked: false,
            hint: None,
        });
        atlas.insert(entry);
        atlas.insert(node("high", 9, 1, "s.json"));

        let player = PlayerState::new("entry");
        assert!(gate
            .reachable_from(atlas.get("entry").unwrap(), &atlas, &player)
            .is_empty());
    }
}
