// ============================================================
// JOIN SELECTION
// ============================================================
// Key and mode parameters consumed by a merge

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{JoinMode, Table};

/// Which uploaded table an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableSide {
    Left,
    Right,
}

impl fmt::Display for TableSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableSide::Left => f.write_str("left"),
            TableSide::Right => f.write_str("right"),
        }
    }
}

impl FromStr for TableSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(TableSide::Left),
            "right" => Ok(TableSide::Right),
            other => Err(format!("unknown table side: {}", other)),
        }
    }
}

/// Anything that can be previewed in the workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewTarget {
    Left,
    Right,
    Merged,
}

impl From<TableSide> for PreviewTarget {
    fn from(side: TableSide) -> Self {
        match side {
            TableSide::Left => PreviewTarget::Left,
            TableSide::Right => PreviewTarget::Right,
        }
    }
}

/// Join keys and mode for one merge
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JoinSelection {
    pub left_key: String,
    pub right_key: String,
    #[serde(default)]
    pub join_type: JoinMode,
}

impl JoinSelection {
    pub fn new(left_key: impl Into<String>, right_key: impl Into<String>, join_type: JoinMode) -> Self {
        Self {
            left_key: left_key.into(),
            right_key: right_key.into(),
            join_type,
        }
    }

    pub fn set_key(&mut self, side: TableSide, key: impl Into<String>) {
        match side {
            TableSide::Left => self.left_key = key.into(),
            TableSide::Right => self.right_key = key.into(),
        }
    }

    /// Overlay the fields a request actually carries
    pub fn apply(&mut self, request: &MergeRequest) {
        if let Some(key) = &request.left_key {
            self.left_key = key.clone();
        }
        if let Some(key) = &request.right_key {
            self.right_key = key.clone();
        }
        if let Some(mode) = request.join_type {
            self.join_type = mode;
        }
    }
}

/// Default join key for a freshly loaded table
pub fn default_key(table: &Table) -> String {
    table.headers().first().cloned().unwrap_or_default()
}

/// Partial selection sent along with a merge call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRequest {
    #[serde(default)]
    pub left_key: Option<String>,
    #[serde(default)]
    pub right_key: Option<String>,
    #[serde(default)]
    pub join_type: Option<JoinMode>,
}
