//! Domain models for the dimensional graph.

mod atlas;
mod dimension;
mod node;
mod overrides;
mod player;
mod tier;

pub use atlas::{Atlas, SourceEntry};
pub use dimension::Dimension;
pub use node::{Fork, Link, Node};
pub use overrides::{OverrideStats, TierCounts, VisibilityOverrides};
pub use player::PlayerState;
pub use tier::{Tier, ViewMode};
