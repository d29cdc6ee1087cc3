use crate::{
    commands::{Commands, SourceArgs},
    conn::{open_pages, parse_format, rows_of, test_connection},
    env::EnvManager,
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
    stats::{RunningMean, exceeds},
};
use clap::Parser;
use connectors::{adapter::Adapter, seed};
use futures::{Stream, StreamExt};
use std::{future::Future, io};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod conn;
mod env;
mod error;
mod output;
mod shutdown;
mod stats;

#[derive(Parser)]
#[command(
    name = "pagestream",
    version,
    about = "Stream database tables and CSV files one page at a time"
)]
struct Cli {
    /// Load KEY=VALUE lines from this file on top of the environment
    #[arg(long, global = true)]
    env_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers();

    let code = match run(cli, shutdown.cancel_token()).await {
        Ok(()) => ExitCode::Success,
        Err(CliError::ShutdownRequested) => {
            warn!("Interrupted before completion");
            ExitCode::ShutdownRequested
        }
        Err(err) => {
            error!("{err}");
            ExitCode::GeneralError
        }
    };

    code.into()
}

/// Logs go to stderr so stdout carries only data.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: Cli, token: CancellationToken) -> Result<(), CliError> {
    let mut env = EnvManager::new();
    if let Some(path) = &cli.env_file {
        env.load_from_file(path)?;
    }

    match cli.command {
        Commands::Stream { source } => stream_rows(&source, &env, &token).await,
        Commands::Pages { source } => stream_pages(&source, &env, &token).await,
        Commands::Batch {
            source,
            column,
            min,
        } => stream_filtered(&source, &env, &token, &column, min).await,
        Commands::Average { source, column } => average(&source, &env, &token, &column).await,
        Commands::Seed {
            format,
            conn_str,
            csv,
            table,
        } => {
            let format = parse_format(&format)?;
            if !format.is_sql() {
                return Err(CliError::InvalidConnectionFormat(
                    "seeding needs a database, not csv".into(),
                ));
            }
            let conn_str = env.resolve_conn_str(conn_str.as_deref())?;
            let users = seed::read_users(&csv)?;
            info!(users = users.len(), csv = %csv, "Loaded seed file");

            let report = cancellable(&token, async {
                let adapter = Adapter::sql(format, &conn_str).await?;
                let sql = adapter.get_sql();
                seed::create_user_table(sql, &table).await?;
                Ok::<_, CliError>(seed::insert_users(sql, &table, &users).await?)
            })
            .await?;

            println!("{}", output::seed_summary(&table, &report));
            Ok(())
        }
        Commands::TestConn { format, conn_str } => {
            let conn_str = env.resolve_conn_str(conn_str.as_deref())?;
            cancellable(&token, test_connection(&format, &conn_str)).await?;
            println!("Connection OK");
            Ok(())
        }
    }
}

async fn stream_rows(
    source: &SourceArgs,
    env: &EnvManager,
    token: &CancellationToken,
) -> Result<(), CliError> {
    let mut rows = rows_of(cancellable(token, open_pages(source, env)).await?);
    let mut out = io::stdout().lock();
    let mut count = 0u64;

    while let Some(row) = next_or_cancel(&mut rows, token).await? {
        output::write_row(&mut out, &row)?;
        count += 1;
    }

    info!(rows = count, "Stream finished");
    Ok(())
}

async fn stream_pages(
    source: &SourceArgs,
    env: &EnvManager,
    token: &CancellationToken,
) -> Result<(), CliError> {
    let mut pages = cancellable(token, open_pages(source, env)).await?;
    let mut out = io::stdout().lock();
    let mut index = 0u64;

    while let Some(page) = next_or_cancel(&mut pages, token).await? {
        output::write_page_header(&mut out, index, &page)?;
        for row in page.iter() {
            output::write_row(&mut out, row)?;
        }
        index += 1;
    }

    info!(pages = index, "Stream finished");
    Ok(())
}

async fn stream_filtered(
    source: &SourceArgs,
    env: &EnvManager,
    token: &CancellationToken,
    column: &str,
    min: f64,
) -> Result<(), CliError> {
    let mut pages = cancellable(token, open_pages(source, env)).await?;
    let mut out = io::stdout().lock();
    let (mut seen, mut matched) = (0u64, 0u64);

    while let Some(page) = next_or_cancel(&mut pages, token).await? {
        seen += page.len() as u64;
        for row in page.iter().filter(|row| exceeds(row, column, min)) {
            output::write_row(&mut out, row)?;
            matched += 1;
        }
    }

    info!(seen, matched, column, min, "Batch filter finished");
    Ok(())
}

async fn average(
    source: &SourceArgs,
    env: &EnvManager,
    token: &CancellationToken,
    column: &str,
) -> Result<(), CliError> {
    let mut rows = rows_of(cancellable(token, open_pages(source, env)).await?);
    let mut mean = RunningMean::default();
    let mut ignored = 0u64;

    while let Some(row) = next_or_cancel(&mut rows, token).await? {
        if !mean.push_row(&row, column) {
            ignored += 1;
        }
    }

    if ignored > 0 {
        warn!(ignored, column, "Rows without a numeric value were left out");
    }
    println!("{}", output::average_line(column, mean.mean()));
    Ok(())
}

/// Resolves `fut`, unless shutdown is requested first.
async fn cancellable<F, T>(token: &CancellationToken, fut: F) -> Result<T, CliError>
where
    F: Future<Output = Result<T, CliError>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(CliError::ShutdownRequested),
        res = fut => res,
    }
}

async fn next_or_cancel<S, T>(stream: &mut S, token: &CancellationToken) -> Result<Option<T>, CliError>
where
    S: Stream<Item = Result<T, CliError>> + Unpin,
{
    cancellable(token, async { stream.next().await.transpose() }).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[tokio::test]
    async fn cancelled_token_stops_pulling() {
        let token = CancellationToken::new();
        let mut pulled = 0;
        let mut items = stream::iter(0..10)
            .inspect(|_| pulled += 1)
            .map(Ok::<_, CliError>)
            .boxed_local();

        assert_eq!(next_or_cancel(&mut items, &token).await.unwrap(), Some(0));
        token.cancel();
        assert!(matches!(
            next_or_cancel(&mut items, &token).await,
            Err(CliError::ShutdownRequested)
        ));
        drop(items);
        assert_eq!(pulled, 1);
    }

    #[test]
    fn cli_parses_source_flags() {
        let cli = Cli::try_parse_from([
            "pagestream",
            "--env-file",
            ".env",
            "batch",
            "--format",
            "mysql",
            "--order-by",
            "user_id,age desc",
            "--page-size",
            "50",
            "--min",
            "30",
        ])
        .unwrap();

        assert_eq!(cli.env_file.as_deref(), Some(".env"));
        match cli.command {
            Commands::Batch {
                source,
                column,
                min,
            } => {
                assert_eq!(source.format, "mysql");
                assert_eq!(source.order_by, vec!["user_id", "age desc"]);
                assert_eq!(source.page_size, 50);
                assert_eq!(source.table, "user_data");
                assert_eq!(column, "age");
                assert_eq!(min, 30.0);
                assert!(!source.retry);
            }
            _ => panic!("expected batch"),
        }
    }
}
