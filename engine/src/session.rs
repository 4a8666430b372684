//! Engine dispatch.
//!
//! [`Connector`] opens a [`Session`] for a resolved engine. The production
//! [`DriverConnector`] matches on the closed [`DbType`] set, so adding an
//! engine means adding one enum variant and one driver arm.

use async_trait::async_trait;
use common::models::{ConnectionProfile, DbType, Row};
use serde_json::Value;
use sqlx::postgres::PgConnection;
use sqlx::sqlite::SqliteConnection;
use sqlx::Connection as _;

use crate::drivers::{oracle, postgres, sqlite, sqlserver};
use crate::error::DriverError;

/// Rows of one statement plus the column names the driver reported, which
/// are known even when no row matched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// One open connection to one engine.
#[async_trait]
pub trait Session: Send {
    /// Runs a single statement and returns its rows in projection order.
    async fn execute(&mut self, statement: &str, params: &[Value]) -> Result<RowSet, DriverError>;

    /// Releases the connection. Consumes the session so it can't be reused.
    async fn close(self) -> Result<(), DriverError>;
}

/// Opens sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    type Session: Session;

    async fn connect(
        &self,
        engine: DbType,
        profile: &ConnectionProfile,
    ) -> Result<Self::Session, DriverError>;
}

/// Connector backed by the real engine drivers.
#[derive(Debug, Default, Clone, Copy)]
pub struct DriverConnector;

/// Open connection for one of the supported engines.
pub enum DriverSession {
    Postgres(PgConnection),
    Oracle(oracle::Client),
    SqlServer(Box<sqlserver::Client>),
    Sqlite(SqliteConnection),
}

#[async_trait]
impl Connector for DriverConnector {
    type Session = DriverSession;

    async fn connect(
        &self,
        engine: DbType,
        profile: &ConnectionProfile,
    ) -> Result<DriverSession, DriverError> {
        let session = match engine {
            DbType::Postgres => DriverSession::Postgres(postgres::connect(profile).await?),
            DbType::Oracle => DriverSession::Oracle(oracle::connect(profile).await?),
            DbType::SqlServer => DriverSession::SqlServer(Box::new(sqlserver::connect(profile).await?)),
            DbType::SQLite => DriverSession::Sqlite(sqlite::connect(profile).await?),
        };
        Ok(session)
    }
}

#[async_trait]
impl Session for DriverSession {
    async fn execute(&mut self, statement: &str, params: &[Value]) -> Result<RowSet, DriverError> {
        let rows = match self {
            DriverSession::Postgres(conn) => postgres::execute(conn, statement, params).await?,
            DriverSession::Oracle(client) => oracle::execute(client, statement, params).await?,
            DriverSession::SqlServer(client) => sqlserver::execute(client, statement, params).await?,
            DriverSession::Sqlite(conn) => sqlite::execute(conn, statement, params).await?,
        };
        Ok(rows)
    }

    async fn close(self) -> Result<(), DriverError> {
        match self {
            DriverSession::Postgres(conn) => conn.close().await?,
            DriverSession::Oracle(client) => oracle::close(client).await?,
            DriverSession::SqlServer(client) => (*client).close().await?,
            DriverSession::Sqlite(conn) => conn.close().await?,
        }
        Ok(())
    }
}
