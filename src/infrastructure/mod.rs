pub mod config;
pub mod csv;
pub mod security;
pub mod storage;
pub mod users;
