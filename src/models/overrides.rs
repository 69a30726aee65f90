//! Operator-controlled visibility override maps.

use std::collections::HashMap;

use serde::Serialize;

use super::{Dimension, Tier};

/// Three independent override layers, each mapping a key to a display tier.
///
/// These are operator and debug controls, not derived state: the host sets
/// them directly and the resolver reads them. Any key not explicitly set
/// defaults to [`Tier::Visible`].
#[derive(Debug, Clone, Default)]
pub struct VisibilityOverrides {
    dimensions: HashMap<Dimension, Tier>,
    layers: HashMap<(Dimension, u32), Tier>,
    sources: HashMap<String, Tier>,
}

impl VisibilityOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tier override for a whole dimension.
    pub fn dimension(&self, dim: Dimension) -> Tier {
        self.dimensions.get(&dim).copied().unwrap_or_default()
    }

    /// Tier override for one layer within a dimension.
    pub fn layer(&self, dim: Dimension, layer: u32) -> Tier {
        self.layers.get(&(dim, layer)).copied().unwrap_or_default()
    }

    /// Tier override for one source file.
    pub fn source(&self, source: &str) -> Tier {
        self.sources.get(source).copied().unwrap_or_default()
    }

    pub fn set_dimension(&mut self, dim: Dimension, tier: Tier) {
        tracing::debug!(%dim, %tier, "dimension override set");
        self.dimensions.insert(dim, tier);
    }

    pub fn set_layer(&mut self, dim: Dimension, layer: u32, tier: Tier) {
        tracing::debug!(%dim, layer, %tier, "layer override set");
        self.layers.insert((dim, layer), tier);
    }

    pub fn set_source(&mut self, source: impl Into<String>, tier: Tier) {
        let source = source.into();
        tracing::debug!(%source, %tier, "source override set");
        self.sources.insert(source, tier);
    }

    /// Clears every override back to the visible default.
    pub fn set_all_visible(&mut self) {
        self.dimensions.clear();
        self.layers.clear();
        self.sources.clear();
    }

    /// Counts explicit overrides per tier, per level.
    pub fn stats(&self) -> OverrideStats {
        OverrideStats {
            dimensions: TierCounts::tally(self.dimensions.values()),
            layers: TierCounts::tally(self.layers.values()),
            sources: TierCounts::tally(self.sources.values()),
        }
    }
}

/// Explicit override counts for each of the three levels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OverrideStats {
    pub dimensions: TierCounts,
    pub layers: TierCounts,
    pub sources: TierCounts,
}

/// Tier tally for one override level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    pub visible: usize,
    pub dimmed: usize,
    pub hidden: usize,
}

impl TierCounts {
    fn tally<'a>(tiers: impl Iterator<Item = &'a Tier>) -> Self {
        let mut counts = TierCounts::default();
        for tier in tiers {
            match tier {
                Tier::Visible => counts.visible += 1,
                Tier::Dimmed => counts.dimmed += 1,
                Tier::Hidden => counts.hidden += 1,
            }
        }
        counts
    }
}
