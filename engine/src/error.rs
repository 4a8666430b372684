//! Gateway error types.

use common::errors::AppError;
use common::models::DbType;
use thiserror::Error;

/// Result alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failure reported by an engine driver.
#[derive(Debug, Error)]
pub enum DriverError {
    /// PostgreSQL or SQLite via sqlx.
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    /// SQL Server via tiberius.
    #[error(transparent)]
    Tds(#[from] tiberius::error::Error),

    /// Oracle via OCI.
    #[error(transparent)]
    Oracle(#[from] oracle::Error),

    /// A blocking driver call panicked or was cancelled.
    #[error("driver task failed: {0}")]
    Blocking(#[from] tokio::task::JoinError),
}

/// Errors surfaced by [`QueryGateway`](crate::QueryGateway).
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Profile `type` is not a supported engine. Raised before any I/O.
    #[error("unsupported database type: {0}")]
    UnsupportedEngine(String),

    /// No profile is marked active.
    #[error("no active database connection found, configure one in settings")]
    NoActiveConnection,

    /// Connection or authentication failed.
    #[error("failed to connect to {engine}: {source}")]
    Connection {
        engine: DbType,
        #[source]
        source: DriverError,
    },

    /// Statement execution failed; the connection was still closed.
    #[error("query failed on {engine}: {source}")]
    Query {
        engine: DbType,
        #[source]
        source: DriverError,
    },

    /// Table name outside the identifier allow-list. Raised before any I/O.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::UnsupportedEngine(tag) => AppError::UnsupportedDatabaseType(tag),
            GatewayError::NoActiveConnection => AppError::NoActiveConnection,
            GatewayError::InvalidIdentifier(name) => AppError::InvalidIdentifier(name),
            err @ GatewayError::Connection { .. } => AppError::DatabaseConnection(err.to_string()),
            err @ GatewayError::Query { .. } => AppError::DatabaseQuery(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cause_message_is_preserved() {
        let err = GatewayError::Query {
            engine: DbType::SQLite,
            source: DriverError::Sqlx(sqlx::Error::Protocol("no such table: widgets".into())),
        };
        let app: AppError = err.into();
        assert!(matches!(&app, AppError::DatabaseQuery(msg) if msg.contains("no such table: widgets")));
        assert!(app.to_string().contains("sqlite"));
    }
}
