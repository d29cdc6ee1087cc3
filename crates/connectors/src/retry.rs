//! Sorting failed page reads into "try the same page again" and "give up".
//!
//! A page read is a single `SELECT .. LIMIT .. OFFSET ..`; re-issuing it
//! changes nothing on the server. What matters is whether the statement
//! itself is at fault, which is decided from the SQLSTATE class where the
//! driver reports one.

use crate::sql::base::error::DbError;
use mysql_async::Error as MySqlError;
use paging::retry::RetryDisposition;
use std::error::Error as _;
use tokio_postgres::Error as PgError;

/// Why a page read failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFailure {
    /// The session broke or could not be opened.
    Connection,
    /// Lost a lock wait, deadlock or serialization conflict to a writer.
    Contention,
    /// The server is shutting down, out of resources or cancelled the read.
    Unavailable,
    /// The statement or the decoding of its result is wrong.
    Query,
}

impl FetchFailure {
    pub fn of(err: &DbError) -> Self {
        match err {
            DbError::MySqlError(err) => mysql_failure(err),
            DbError::PgError(err) => pg_failure(err),
            DbError::Conversion(_) | DbError::Unknown(_) => FetchFailure::Query,
        }
    }

    pub fn disposition(self) -> RetryDisposition {
        match self {
            FetchFailure::Query => RetryDisposition::Stop,
            _ => RetryDisposition::Retry,
        }
    }
}

/// Classifier for `paging::retry::Retrying` over a SQL page fetcher.
pub fn classify_db_error(err: &DbError) -> RetryDisposition {
    FetchFailure::of(err).disposition()
}

/// Maps a five-character SQLSTATE to a failure kind. Both servers use the
/// standard classes for connection (08) and rollback (40) errors.
fn sqlstate_failure(state: &str) -> FetchFailure {
    match state {
        // lock_not_available, ODBC timeout
        "55P03" | "HYT00" => FetchFailure::Contention,
        // fdw_unable_to_establish_connection
        "HV00N" => FetchFailure::Connection,
        // database_dropped
        "57P04" => FetchFailure::Query,
        _ => match state.get(..2) {
            Some("08") => FetchFailure::Connection,
            Some("40") => FetchFailure::Contention,
            Some("53") | Some("57") => FetchFailure::Unavailable,
            _ => FetchFailure::Query,
        },
    }
}

fn pg_failure(err: &PgError) -> FetchFailure {
    if err.is_closed() {
        return FetchFailure::Connection;
    }

    match err.code() {
        Some(code) => sqlstate_failure(code.code()),
        // No SQLSTATE: the client failed before the server answered.
        None if err.source().is_some_and(|source| source.is::<std::io::Error>()) => {
            FetchFailure::Connection
        }
        None => FetchFailure::Query,
    }
}

const ER_LOCK_WAIT_TIMEOUT: u16 = 1205;
const CR_CONNECTION_ERROR: u16 = 2002;
const CR_CONN_HOST_ERROR: u16 = 2003;
const CR_SERVER_GONE_ERROR: u16 = 2006;
const CR_SERVER_LOST: u16 = 2013;

fn mysql_failure(err: &MySqlError) -> FetchFailure {
    match err {
        MySqlError::Io(_) | MySqlError::Driver(_) | MySqlError::Other(_) => {
            FetchFailure::Connection
        }
        MySqlError::Server(server) => match server.code {
            // Reported under the generic HY000 state.
            ER_LOCK_WAIT_TIMEOUT => FetchFailure::Contention,
            CR_CONNECTION_ERROR | CR_CONN_HOST_ERROR | CR_SERVER_GONE_ERROR | CR_SERVER_LOST => {
                FetchFailure::Connection
            }
            _ => sqlstate_failure(&server.state),
        },
        _ => FetchFailure::Query,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mysql_async::ServerError;

    fn server_error(code: u16, state: &str) -> DbError {
        DbError::MySqlError(MySqlError::Server(ServerError {
            code,
            message: "server said no".into(),
            state: state.into(),
        }))
    }

    #[test]
    fn sqlstate_classes() {
        assert_eq!(sqlstate_failure("08006"), FetchFailure::Connection);
        assert_eq!(sqlstate_failure("08S01"), FetchFailure::Connection);
        assert_eq!(sqlstate_failure("40001"), FetchFailure::Contention);
        assert_eq!(sqlstate_failure("40P01"), FetchFailure::Contention);
        assert_eq!(sqlstate_failure("55P03"), FetchFailure::Contention);
        assert_eq!(sqlstate_failure("53300"), FetchFailure::Unavailable);
        assert_eq!(sqlstate_failure("57P01"), FetchFailure::Unavailable);
        assert_eq!(sqlstate_failure("57P04"), FetchFailure::Query);
        assert_eq!(sqlstate_failure("42P01"), FetchFailure::Query);
        assert_eq!(sqlstate_failure(""), FetchFailure::Query);
    }

    #[test]
    fn mysql_contention_retries() {
        assert_eq!(FetchFailure::of(&server_error(1213, "40001")), FetchFailure::Contention);
        assert_eq!(FetchFailure::of(&server_error(1205, "HY000")), FetchFailure::Contention);
        assert_eq!(classify_db_error(&server_error(1205, "HY000")), RetryDisposition::Retry);
    }

    #[test]
    fn mysql_connection_limits_retry() {
        // ER_CON_COUNT_ERROR
        assert_eq!(FetchFailure::of(&server_error(1040, "08004")), FetchFailure::Connection);
        assert_eq!(FetchFailure::of(&server_error(2013, "HY000")), FetchFailure::Connection);
    }

    #[test]
    fn bad_statements_stop() {
        // unknown table, syntax error
        assert_eq!(classify_db_error(&server_error(1146, "42S02")), RetryDisposition::Stop);
        assert_eq!(classify_db_error(&server_error(1064, "42000")), RetryDisposition::Stop);
    }

    #[test]
    fn io_failures_retry() {
        let err = DbError::MySqlError(std::io::Error::other("connection reset").into());
        assert_eq!(FetchFailure::of(&err), FetchFailure::Connection);
        assert_eq!(classify_db_error(&err), RetryDisposition::Retry);
    }

    #[test]
    fn decoding_problems_stop() {
        assert_eq!(
            classify_db_error(&DbError::Conversion("bad decimal".into())),
            RetryDisposition::Stop
        );
        assert_eq!(
            classify_db_error(&DbError::Unknown("no driver".into())),
            RetryDisposition::Stop
        );
    }
}
