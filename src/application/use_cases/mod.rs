pub mod auth;
pub mod table_merge;
pub mod upload_merge;
