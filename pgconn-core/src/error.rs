//! Structured error types for pgconn-core.
//!
//! Two failure families are surfaced to callers: connection failures
//! (pool exhaustion, acquisition timeout, closed pool, network/TLS) and
//! query failures (bad SQL, constraint violations, decoding). Every error
//! is logged once where it is detected and then returned unchanged.
use std::fmt;

use thiserror::Error;
use tracing::error;

/// Why a connection could not be obtained or used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionFailure {
    /// No connection became available within the acquisition timeout
    Timeout,
    /// The pool has been closed
    Closed,
    /// Network, TLS or protocol level failure talking to the server
    Unreachable,
}

impl fmt::Display for ConnectionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionFailure::Timeout => "timeout",
            ConnectionFailure::Closed => "pool closed",
            ConnectionFailure::Unreachable => "unreachable",
        };
        f.write_str(label)
    }
}

/// Main error type for pgconn-core operations
#[derive(Error, Debug)]
pub enum DbError {
    /// A connection could not be acquired or the server could not be reached
    #[error("Connection error in {operation} ({kind}): {source}")]
    Connection {
        operation: &'static str,
        kind: ConnectionFailure,
        source: sqlx::Error,
    },

    /// The statement failed to execute or its result could not be decoded
    #[error("Query error in {operation}: {source}")]
    Query {
        operation: &'static str,
        source: sqlx::Error,
    },

    /// A transaction handle was used after commit or rollback
    #[error("Transaction already finished ({operation})")]
    Finished { operation: &'static str },

    /// Configuration is missing or invalid
    #[error("Configuration error: {reason}")]
    Config { reason: String },
}

/// Result type alias for pgconn-core operations
pub type Result<T> = std::result::Result<T, DbError>;

impl DbError {
    /// Create a connection error, classifying the failure from the driver error.
    ///
    /// Used where any failure means "could not talk to the database", such as
    /// the liveness check or acquiring a dedicated connection.
    pub fn connection(operation: &'static str, source: sqlx::Error) -> Self {
        Self::Connection {
            operation,
            kind: classify_connection(&source).unwrap_or(ConnectionFailure::Unreachable),
            source,
        }
    }

    /// Create a query error without classification.
    pub fn query(operation: &'static str, source: sqlx::Error) -> Self {
        Self::Query { operation, source }
    }

    /// Sort a driver error into the connection or query family.
    pub fn from_sqlx(operation: &'static str, source: sqlx::Error) -> Self {
        match classify_connection(&source) {
            Some(kind) => Self::Connection {
                operation,
                kind,
                source,
            },
            None => Self::Query { operation, source },
        }
    }

    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Whether this error belongs to the connection family.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// Whether this error belongs to the query family.
    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query { .. })
    }

    /// Whether acquisition gave up after the configured timeout.
    pub fn is_timeout(&self) -> bool {
        self.connection_failure() == Some(ConnectionFailure::Timeout)
    }

    pub fn connection_failure(&self) -> Option<ConnectionFailure> {
        match self {
            Self::Connection { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// SQLSTATE code reported by the server, if the failure came from it.
    pub fn sqlstate(&self) -> Option<String> {
        match self {
            Self::Query {
                source: sqlx::Error::Database(db_err),
                ..
            } => db_err.code().map(|code| code.into_owned()),
            _ => None,
        }
    }

    /// Name of the violated constraint, for unique/foreign-key/check failures.
    pub fn constraint(&self) -> Option<&str> {
        match self {
            Self::Query {
                source: sqlx::Error::Database(db_err),
                ..
            } => db_err.constraint(),
            _ => None,
        }
    }

    /// Log the error at the point of detection and hand it back.
    pub(crate) fn logged(self) -> Self {
        match &self {
            Self::Connection {
                operation,
                kind,
                source,
            } => error!(operation = *operation, kind = %kind, error = %source, "database connection failed"),
            Self::Query { operation, source } => {
                error!(operation = *operation, error = %source, "database query failed")
            }
            Self::Finished { operation } => {
                error!(operation = *operation, "transaction handle used after completion")
            }
            Self::Config { reason } => error!(reason = %reason, "database configuration invalid"),
        }
        self
    }
}

fn classify_connection(source: &sqlx::Error) -> Option<ConnectionFailure> {
    match source {
        sqlx::Error::PoolTimedOut => Some(ConnectionFailure::Timeout),
        sqlx::Error::PoolClosed => Some(ConnectionFailure::Closed),
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Configuration(_) => Some(ConnectionFailure::Unreachable),
        _ => None,
    }
}
