mod app;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;

pub use app::{run, serve};
pub use application::{merge_tables, TableMerger};
pub use domain::error::{AppError, Result};
pub use domain::table::{JoinMode, JoinSelection, MergedTable, Table};
