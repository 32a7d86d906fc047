// ============================================================
// JOIN MODE ENUM
// ============================================================
// Which unmatched key groups survive a merge

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinMode {
    /// Matched keys only
    #[default]
    Inner,

    /// Matched keys plus left-only rows
    Left,

    /// Matched keys plus right-only rows
    Right,

    /// Everything
    #[serde(alias = "full")]
    Outer,
}

impl JoinMode {
    pub fn keeps_left_only(&self) -> bool {
        matches!(self, JoinMode::Left | JoinMode::Outer)
    }

    pub fn keeps_right_only(&self) -> bool {
        matches!(self, JoinMode::Right | JoinMode::Outer)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JoinMode::Inner => "inner",
            JoinMode::Left => "left",
            JoinMode::Right => "right",
            JoinMode::Outer => "outer",
        }
    }
}

impl fmt::Display for JoinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JoinMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inner" => Ok(JoinMode::Inner),
            "left" => Ok(JoinMode::Left),
            "right" => Ok(JoinMode::Right),
            "outer" | "full" => Ok(JoinMode::Outer),
            other => Err(format!("unknown join type: {}", other)),
        }
    }
}
