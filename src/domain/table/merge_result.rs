// ============================================================
// MERGE RESULT TYPES
// ============================================================
// What a merge reports back and what an export hands out

use serde::{Deserialize, Serialize};

use super::{JoinSelection, TablePreview};

/// Outcome of one merge call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeSummary {
    pub selection: JoinSelection,
    pub row_count: usize,
    pub column_count: usize,
    pub preview: TablePreview,
}

/// A rendered merge ready to be downloaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedFile {
    pub file_name: String,
    pub content: String,
}
