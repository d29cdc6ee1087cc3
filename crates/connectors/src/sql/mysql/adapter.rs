use crate::sql::{
    base::{
        adapter::SqlAdapter,
        dialect::{Dialect, MySql},
        error::{ConnectorError, DbError},
    },
    mysql::{params::MySqlParamStore, row::to_row},
};
use async_trait::async_trait;
use model::{core::value::Value, records::row::Row};
use mysql_async::{Opts, Pool, Row as MySqlRow, prelude::Queryable};
use tracing::{debug, info};

/// Pooled MySQL/MariaDB access. Every call checks a connection out of the
/// pool, so concurrent fetches never share a session.
#[derive(Clone)]
pub struct MySqlAdapter {
    pool: Pool,
    dialect: MySql,
}

impl MySqlAdapter {
    pub async fn connect(url: &str) -> Result<Self, ConnectorError> {
        let opts = Opts::from_url(url).map_err(|e| ConnectorError::InvalidUrl(e.to_string()))?;
        let pool = Pool::new(opts);

        // Surface bad credentials or an unreachable host at connect time
        let conn = pool.get_conn().await?;
        drop(conn);

        info!("Connected to MySQL");
        Ok(MySqlAdapter {
            pool,
            dialect: MySql,
        })
    }
}

#[async_trait]
impl SqlAdapter for MySqlAdapter {
    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    async fn query(
        &self,
        entity: &str,
        sql: &str,
        params: Vec<Value>,
    ) -> Result<Vec<Row>, DbError> {
        debug!(sql, ?params, "MySQL query");
        let store = MySqlParamStore::from_values(&params);

        let mut conn = self.pool.get_conn().await?;
        let rows: Vec<MySqlRow> = conn.exec(sql, store.params()).await?;

        rows.iter().map(|row| to_row(entity, row)).collect()
    }

    async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<u64, DbError> {
        debug!(sql, ?params, "MySQL execute");
        let store = MySqlParamStore::from_values(&params);

        let mut conn = self.pool.get_conn().await?;
        conn.exec_drop(sql, store.params()).await?;
        Ok(conn.affected_rows())
    }

    async fn ping(&self) -> Result<(), DbError> {
        let mut conn = self.pool.get_conn().await?;
        let one: Option<i32> = conn.query_first("SELECT 1").await?;
        match one {
            Some(1) => Ok(()),
            other => Err(DbError::Unknown(format!(
                "unexpected ping result: {other:?}"
            ))),
        }
    }
}
