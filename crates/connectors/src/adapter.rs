use crate::{
    error::AdapterError,
    format::DataFormat,
    sql::{base::adapter::SqlAdapter, mysql::adapter::MySqlAdapter, postgres::adapter::PgAdapter},
};
use std::sync::Arc;

#[derive(Clone)]
pub enum Adapter {
    MySql(MySqlAdapter),
    Postgres(PgAdapter),
}

impl Adapter {
    pub async fn sql(format: DataFormat, conn_str: &str) -> Result<Self, AdapterError> {
        match format {
            DataFormat::MySql => {
                let adapter = MySqlAdapter::connect(conn_str).await?;
                Ok(Adapter::MySql(adapter))
            }
            DataFormat::Postgres => {
                let adapter = PgAdapter::connect(conn_str).await?;
                Ok(Adapter::Postgres(adapter))
            }
            DataFormat::Csv => Err(AdapterError::UnsupportedFormat(format.to_string())),
        }
    }

    pub fn format(&self) -> DataFormat {
        match self {
            Adapter::MySql(_) => DataFormat::MySql,
            Adapter::Postgres(_) => DataFormat::Postgres,
        }
    }

    pub fn get_sql(&self) -> &(dyn SqlAdapter + Send + Sync) {
        match self {
            Adapter::MySql(adapter) => adapter,
            Adapter::Postgres(adapter) => adapter,
        }
    }

    /// Type-erased handle for sharing between fetchers.
    pub fn into_shared(self) -> Arc<dyn SqlAdapter> {
        match self {
            Adapter::MySql(adapter) => Arc::new(adapter),
            Adapter::Postgres(adapter) => Arc::new(adapter),
        }
    }
}
