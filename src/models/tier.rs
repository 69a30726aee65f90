//! Visibility tiers and view modes.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Display and interaction state of a node.
///
/// Hidden dominates: a node hidden at any override level stays hidden no
/// matter what the other levels say. Dimmed blocks interaction but keeps the
/// node on screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    #[default]
    Visible,
    Dimmed,
    Hidden,
}

impl Tier {
    /// Returns all tiers, most visible first.
    pub fn all() -> &'static [Tier] {
        &[Tier::Visible, Tier::Dimmed, Tier::Hidden]
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Visible => write!(f, "visible"),
            Tier::Dimmed => write!(f, "dimmed"),
            Tier::Hidden => write!(f, "hidden"),
        }
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "visible" | "Visible" => Ok(Tier::Visible),
            "dimmed" | "Dimmed" => Ok(Tier::Dimmed),
            "hidden" | "Hidden" => Ok(Tier::Hidden),
            _ => Err(format!(
                "Invalid tier '{}'. Valid values: visible, dimmed, hidden",
                s
            )),
        }
    }
}

/// How the host renders the graph.
///
/// `Player` is the restricted mode: nodes above the player's clearance are
/// hidden outright when gating is enabled. The other two modes are operator
/// views that show everything (subject to explicit overrides).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Everything shown at full brightness, overrides still apply.
    Fullbright,
    /// Default operator view: locked content visible but previewed.
    #[default]
    Tease,
    /// Restricted player view: out-of-clearance content hidden.
    Player,
}

impl std::fmt::Display for ViewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewMode::Fullbright => write!(f, "fullbright"),
            ViewMode::Tease => write!(f, "tease"),
            ViewMode::Player => write!(f, "player"),
        }
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fullbright" => Ok(ViewMode::Fullbright),
            "tease" => Ok(ViewMode::Tease),
            "player" => Ok(ViewMode::Player),
            _ => Err(format!(
                "Invalid view mode '{}'. Valid values: fullbright, tease, player",
                s
            )),
        }
    }
}
