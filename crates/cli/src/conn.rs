use crate::{commands::SourceArgs, env::EnvManager, error::CliError};
use connectors::{
    adapter::Adapter,
    file::csv::source::{CsvPageFetcher, CsvSettings},
    format::DataFormat,
    retry::classify_db_error,
    sql::base::{query::PageQuery, source::SqlPageFetcher},
};
use futures::{
    StreamExt, TryStreamExt,
    stream::{self, BoxStream},
};
use model::{pagination::page::Page, records::row::Row};
use paging::retry::{RetryPolicy, Retrying};
use std::str::FromStr;
use tokio::task;
use tracing::{info, warn};

pub type PageSource = BoxStream<'static, Result<Page<Row>, CliError>>;

pub fn parse_format(format: &str) -> Result<DataFormat, CliError> {
    DataFormat::from_str(format).map_err(|_| CliError::InvalidConnectionFormat(format.to_string()))
}

/// Opens the configured source and returns its pages as one stream,
/// whatever the backend.
pub async fn open_pages(args: &SourceArgs, env: &EnvManager) -> Result<PageSource, CliError> {
    let format = parse_format(&args.format)?;
    let conn_str = env.resolve_conn_str(args.conn_str.as_deref())?;

    match format {
        DataFormat::Csv => {
            if args.retry {
                warn!("--retry has no effect on CSV sources");
            }
            let fetcher = CsvPageFetcher::open(&conn_str, CsvSettings::default())?;
            info!(path = %conn_str, page_size = args.page_size, "Streaming CSV file");

            Ok(blocking_pages(paging::pages(fetcher, args.page_size)?))
        }
        DataFormat::MySql | DataFormat::Postgres => {
            let adapter = Adapter::sql(format, &conn_str).await?.into_shared();
            let query = PageQuery::new(args.table.clone())
                .columns(args.columns.iter().filter(|c| !c.trim().is_empty()).cloned())
                .order_by(&args.order_by);
            let fetcher = SqlPageFetcher::new(adapter, query);
            info!(%format, table = %args.table, page_size = args.page_size, "Streaming table");

            if args.retry {
                let fetcher = Retrying::new(fetcher, RetryPolicy::for_database(), classify_db_error);
                Ok(paging::page_stream(fetcher, args.page_size)?.err_into::<CliError>().boxed())
            } else {
                Ok(paging::page_stream(fetcher, args.page_size)?.err_into::<CliError>().boxed())
            }
        }
    }
}

/// Drives a blocking page iterator from async code. Each pull moves the
/// iterator onto the blocking pool for one fetch and takes it back after.
pub fn blocking_pages<I, E>(pages: I) -> PageSource
where
    I: Iterator<Item = Result<Page<Row>, E>> + Send + 'static,
    CliError: From<E>,
    E: Send + 'static,
{
    stream::try_unfold(Some(pages), |pages| async move {
        let Some(mut pages) = pages else {
            return Ok::<_, CliError>(None);
        };
        let (next, pages) = task::spawn_blocking(move || (pages.next(), pages)).await?;
        match next {
            Some(page) => Ok(Some((page?, Some(pages)))),
            None => Ok(None),
        }
    })
    .boxed()
}

/// Flattens pages into rows, preserving order.
pub fn rows_of(pages: PageSource) -> BoxStream<'static, Result<Row, CliError>> {
    pages
        .map_ok(|page| stream::iter(page.into_rows().into_iter().map(Ok::<Row, CliError>)))
        .try_flatten()
        .boxed()
}

/// Runs `SELECT 1` against a database, or opens a CSV file.
pub async fn test_connection(format: &str, conn_str: &str) -> Result<(), CliError> {
    match parse_format(format)? {
        DataFormat::Csv => {
            let fetcher = CsvPageFetcher::open(conn_str, CsvSettings::default())?;
            info!(columns = ?fetcher.headers(), "CSV file is readable");
        }
        format => {
            let adapter = Adapter::sql(format, conn_str).await?;
            adapter.get_sql().ping().await?;
            info!(%format, "Ping succeeded");
        }
    }
    Ok(())
}
