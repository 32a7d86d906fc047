pub mod use_cases;

pub use use_cases::auth::AuthUseCase;
pub use use_cases::table_merge::{merge_tables, TableMerger};
pub use use_cases::upload_merge::UploadMergeUseCase;
