pub mod error;
pub mod user;

// Uploaded and merged tables
pub mod table;
