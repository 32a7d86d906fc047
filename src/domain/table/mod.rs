// ============================================================
// TABLE DOMAIN LAYER
// ============================================================
// Core types and value objects for uploaded and merged tables
// No I/O, no async

mod join_mode;
mod merge_result;
mod selection;
#[allow(clippy::module_inception)]
mod table;

pub use join_mode::JoinMode;
pub use merge_result::{ExportedFile, MergeSummary};
pub use selection::{default_key, JoinSelection, MergeRequest, PreviewTarget, TableSide};
pub use table::{Row, Table, TablePreview};

/// A merged table is an ordinary table produced by the join engine
pub type MergedTable = Table;
