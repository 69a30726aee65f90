//! Three-tier visibility resolution (dimension > layer > source).

use std::sync::Arc;

use crate::config::Config;
use crate::models::{Node, PlayerState, Tier, ViewMode, VisibilityOverrides};

/// Service mapping a node to its display tier and interactivity.
///
/// Hidden at any override level hides unconditionally; otherwise the most
/// specific dimmed override applies; absent any override, visible. A node
/// that is not fully visible is never clickable - dimming is a strict
/// interaction block, not a cosmetic effect.
#[derive(Clone)]
pub struct VisibilityResolver {
    config: Arc<Config>,
}

impl VisibilityResolver {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Resolves a node's display tier.
    ///
    /// Order: restricted-view clearance hiding, then the dimension, layer,
    /// and source override levels. Hidden short-circuits; dimmed falls
    /// through so a finer level may still hide.
    pub fn resolve_tier(
        &self,
        node: &Node,
        overrides: &VisibilityOverrides,
        player: &PlayerState,
        view_mode: ViewMode,
    ) -> Tier {
        let progression = &self.config.progression;

        // Restricted view hides out-of-clearance content outright.
        if view_mode == ViewMode::Player && progression.gating_enabled {
            if let Some(dimension) = node.dimension {
                if dimension.ordinal() > player.clearance_level {
                    return Tier::Hidden;
                }
            }
        }

        let mut tier = Tier::Visible;

        if let Some(dimension) = node.dimension {
            match overrides.dimension(dimension) {
                Tier::Hidden => return Tier::Hidden,
                Tier::Dimmed => tier = Tier::Dimmed,
                Tier::Visible => {}
            }

            if let Some(layer) = node.layer {
                match overrides.layer(dimension, layer) {
                    Tier::Hidden => return Tier::Hidden,
                    Tier::Dimmed => tier = Tier::Dimmed,
                    Tier::Visible => {}
                }
            }
        }

        if let Some(source) = node.source.as_deref() {
            match overrides.source(source) {
                Tier::Hidden => return Tier::Hidden,
                Tier::Dimmed => tier = Tier::Dimmed,
                Tier::Visible => {}
            }
        }

        tier
    }

    /// Whether a node accepts interaction.
    ///
    /// Requires full visibility, then membership in the unlocked or
    /// reachable sets - or the dev override, which skips the membership
    /// check but never the visibility one.
    pub fn is_clickable(
        &self,
        node: &Node,
        overrides: &VisibilityOverrides,
        player: &PlayerState,
        view_mode: ViewMode,
        reachable: &[String],
    ) -> bool {
        if self.resolve_tier(node, overrides, player, view_mode) != Tier::Visible {
            return false;
        }

        player.is_unlocked(&node.id)
            || reachable.iter().any(|id| id == &node.id)
            || self.config.progression.override_all_gates
    }
}
