use crate::sql::base::{dialect::Dialect, error::DbError};
use async_trait::async_trait;
use model::{core::value::Value, records::row::Row};

/// Minimal query surface shared by the MySQL and PostgreSQL adapters.
#[async_trait]
pub trait SqlAdapter: Send + Sync {
    fn dialect(&self) -> &dyn Dialect;

    /// Runs a parameterized query and decodes every returned row, tagging
    /// it with `entity`.
    async fn query(&self, entity: &str, sql: &str, params: Vec<Value>)
    -> Result<Vec<Row>, DbError>;

    /// Runs a parameterized statement and returns the affected row count.
    async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<u64, DbError>;

    /// Round-trips `SELECT 1`.
    async fn ping(&self) -> Result<(), DbError>;
}
