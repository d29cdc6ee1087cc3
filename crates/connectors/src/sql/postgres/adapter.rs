use crate::sql::{
    base::{
        adapter::SqlAdapter,
        dialect::{Dialect, Postgres},
        error::{ConnectorError, DbError},
    },
    postgres::{params::PgParamStore, row::to_row, utils::connect_client},
};
use async_trait::async_trait;
use model::{core::value::Value, records::row::Row};
use std::sync::Arc;
use tokio_postgres::Client;
use tracing::{debug, info};

/// A single PostgreSQL session shared by every clone of the adapter.
/// `tokio_postgres` pipelines concurrent queries over it.
#[derive(Clone)]
pub struct PgAdapter {
    client: Arc<Client>,
    dialect: Postgres,
}

impl PgAdapter {
    pub async fn connect(url: &str) -> Result<Self, ConnectorError> {
        let client = connect_client(url).await?;
        info!("Connected to PostgreSQL");
        Ok(PgAdapter {
            client: Arc::new(client),
            dialect: Postgres,
        })
    }
}

#[async_trait]
impl SqlAdapter for PgAdapter {
    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    async fn query(
        &self,
        entity: &str,
        sql: &str,
        params: Vec<Value>,
    ) -> Result<Vec<Row>, DbError> {
        debug!(sql, ?params, "PostgreSQL query");
        let bindings = PgParamStore::from_values(params)?;
        let rows = self.client.query(sql, &bindings.as_refs()).await?;
        rows.iter().map(|row| to_row(entity, row)).collect()
    }

    async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<u64, DbError> {
        debug!(sql, ?params, "PostgreSQL execute");
        let bindings = PgParamStore::from_values(params)?;
        let affected = self.client.execute(sql, &bindings.as_refs()).await?;
        Ok(affected)
    }

    async fn ping(&self) -> Result<(), DbError> {
        let row = self.client.query_one("SELECT 1", &[]).await?;
        let one: i32 = row.try_get(0)?;
        if one == 1 {
            Ok(())
        } else {
            Err(DbError::Unknown(format!("unexpected ping result: {one}")))
        }
    }
}
