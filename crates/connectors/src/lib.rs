pub mod adapter;
pub mod error;
pub mod file;
pub mod format;
pub mod retry;
pub mod seed;
pub mod sql;
