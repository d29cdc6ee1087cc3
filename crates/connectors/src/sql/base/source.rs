use crate::sql::base::{adapter::SqlAdapter, error::DbError, query::PageQuery};
use async_trait::async_trait;
use model::{core::value::Value, records::row::Row};
use paging::AsyncPageFetcher;
use std::{sync::Arc, time::Instant};
use tracing::{debug, warn};

/// Pages through one table with `LIMIT ? OFFSET ?`.
///
/// The statement is rendered once, up front, for the adapter's dialect.
/// Offsets are only meaningful under a stable total order, so an unordered
/// query is accepted but logged.
#[derive(Clone)]
pub struct SqlPageFetcher {
    adapter: Arc<dyn SqlAdapter>,
    query: PageQuery,
    sql: String,
}

impl SqlPageFetcher {
    pub fn new(adapter: Arc<dyn SqlAdapter>, query: PageQuery) -> Self {
        let sql = query.render(adapter.dialect());

        if !query.is_ordered() {
            warn!(
                table = %query.table,
                "No ORDER BY given; pages may overlap or skip rows if the table changes"
            );
        }
        debug!(%sql, dialect = %adapter.dialect().name(), "Prepared page query");

        SqlPageFetcher {
            adapter,
            query,
            sql,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn query(&self) -> &PageQuery {
        &self.query
    }
}

#[async_trait]
impl AsyncPageFetcher for SqlPageFetcher {
    type Row = Row;
    type Error = DbError;

    async fn fetch_page(&self, page_size: u64, offset: u64) -> Result<Vec<Row>, DbError> {
        let start = Instant::now();
        let rows = self
            .adapter
            .query(
                self.query.entity(),
                &self.sql,
                vec![Value::Uint(page_size), Value::Uint(offset)],
            )
            .await?;

        debug!(
            table = %self.query.table,
            offset,
            rows = rows.len(),
            took_ms = start.elapsed().as_millis() as u64,
            "Fetched rows"
        );
        Ok(rows)
    }
}
