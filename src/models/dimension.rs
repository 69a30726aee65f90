//! Dimension type representing the ordinal progression tiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An ordinal progression tier, `1D` through `12D`.
///
/// Dimensions partition nodes into progression stages. The lowest dimension
/// is conventionally the "eternal" one - always accessible as a guaranteed
/// return path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Dimension(u8);

impl Dimension {
    /// Lowest dimension (`1D`).
    pub const MIN: Dimension = Dimension(1);
    /// Highest dimension (`12D`).
    pub const MAX: Dimension = Dimension(12);

    /// Creates a dimension from its ordinal (1..=12).
    pub fn new(ordinal: u8) -> Result<Self, String> {
        if (1..=12).contains(&ordinal) {
            Ok(Dimension(ordinal))
        } else {
            Err(format!(
                "Invalid dimension ordinal {}. Valid range: 1..=12",
                ordinal
            ))
        }
    }

    /// Returns the ordinal (1..=12) for clearance comparisons.
    pub fn ordinal(&self) -> u8 {
        self.0
    }

    /// Iterates all dimensions in ascending order.
    pub fn all() -> impl Iterator<Item = Dimension> {
        (1..=12).map(Dimension)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}D", self.0)
    }
}

impl FromStr for Dimension {
    type Err = String;

    /// Parses `"7D"`, `"7d"`, or a bare `"7"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_end_matches(['D', 'd']);
        let ordinal: u8 = digits
            .parse()
            .map_err(|_| format!("Invalid dimension '{}'. Expected \"1D\"..\"12D\"", s))?;
        Dimension::new(ordinal)
    }
}

impl TryFrom<String> for Dimension {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Dimension> for String {
    fn from(d: Dimension) -> Self {
        d.to_string()
    }
}
