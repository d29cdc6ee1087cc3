use connectors::{
    error::AdapterError, file::csv::error::FileError, seed::SeedError, sql::base::error::DbError,
};
use paging::{CursorError, retry::RetryError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid connection format provided: {0}")]
    InvalidConnectionFormat(String),

    #[error("{0}")]
    Adapter(#[from] AdapterError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("File error: {0}")]
    File(#[from] FileError),

    #[error("Seed failed: {0}")]
    Seed(#[from] SeedError),

    #[error("{0}")]
    SqlCursor(#[from] CursorError<DbError>),

    #[error("{0}")]
    RetriedSqlCursor(#[from] CursorError<RetryError<DbError>>),

    #[error("{0}")]
    CsvCursor(#[from] CursorError<FileError>),

    #[error("Blocking read task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Shutdown requested")]
    ShutdownRequested,
}
