//! The query gateway.
//!
//! Every operation takes the active profile explicitly. Callers resolve it
//! (from the profile store or over HTTP) and pass `None` when nothing is
//! active; the gateway keeps no state of its own beyond its connector.

use std::time::Instant;

use common::models::{ColumnDescriptor, ConnectionProfile, DbType, QueryResult};
use common::utils::SqlValidator;
use serde::Serialize;
use serde_json::Value;

use crate::catalog;
use crate::error::{GatewayError, GatewayResult};
use crate::session::{Connector, DriverConnector, RowSet, Session};

/// Outcome of [`QueryGateway::test_connection`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionCheck {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Time to connect and close, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl ConnectionCheck {
    fn passed(latency_ms: u64) -> Self {
        Self { ok: true, reason: None, latency_ms: Some(latency_ms) }
    }

    fn failed(reason: impl Into<String>) -> Self {
        Self { ok: false, reason: Some(reason.into()), latency_ms: None }
    }
}

/// Runs queries and catalog lookups on one connection per call.
#[derive(Debug, Clone, Default)]
pub struct QueryGateway<C = DriverConnector> {
    connector: C,
}

impl QueryGateway {
    pub fn new() -> Self {
        Self::with_connector(DriverConnector)
    }
}

impl<C: Connector> QueryGateway<C> {
    pub fn with_connector(connector: C) -> Self {
        Self { connector }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Runs `statement` with positional `params` on the active profile.
    ///
    /// The statement kind is not checked here; read-only enforcement belongs
    /// to the caller. `executionTimeMs` covers connect, execute and close.
    pub async fn query(
        &self,
        active: Option<&ConnectionProfile>,
        statement: &str,
        params: &[Value],
    ) -> GatewayResult<QueryResult> {
        let started = Instant::now();
        let (profile, engine) = resolve(active)?;
        let set = self.run_on(engine, profile, statement, params).await?;
        let result = QueryResult::new(set.columns, set.rows, elapsed_ms(started));
        tracing::debug!(
            %engine,
            rows = result.row_count,
            elapsed_ms = result.execution_time_ms,
            "query completed"
        );
        Ok(result)
    }

    /// Base table names of the active profile's default schema, sorted.
    pub async fn list_tables(&self, active: Option<&ConnectionProfile>) -> GatewayResult<Vec<String>> {
        let (profile, engine) = resolve(active)?;
        let set = self
            .run_on(engine, profile, catalog::list_tables_sql(engine), &[])
            .await?;
        Ok(set.rows.iter().filter_map(catalog::table_name).collect())
    }

    /// Columns of `table` in ordinal order. An unknown table yields an
    /// empty list.
    pub async fn describe_table(
        &self,
        active: Option<&ConnectionProfile>,
        table: &str,
    ) -> GatewayResult<Vec<ColumnDescriptor>> {
        SqlValidator::validate_identifier(table)
            .map_err(|_| GatewayError::InvalidIdentifier(table.to_string()))?;
        let (profile, engine) = resolve(active)?;
        let (statement, params) = catalog::describe_table_sql(engine, table);
        let set = self.run_on(engine, profile, &statement, &params).await?;
        Ok(set.rows.iter().filter_map(catalog::column_descriptor).collect())
    }

    /// Opens and immediately closes a connection. Never fails; every error
    /// becomes `ok: false` with the cause as `reason`.
    pub async fn test_connection(&self, profile: &ConnectionProfile) -> ConnectionCheck {
        let started = Instant::now();
        let engine = match engine_of(profile) {
            Ok(engine) => engine,
            Err(err) => return ConnectionCheck::failed(err.to_string()),
        };

        match self.connector.connect(engine, profile).await {
            Ok(session) => {
                close_quietly(engine, session).await;
                ConnectionCheck::passed(elapsed_ms(started))
            }
            Err(source) => {
                let err = GatewayError::Connection { engine, source };
                tracing::info!(%engine, profile = %profile.name, error = %err, "connection test failed");
                ConnectionCheck::failed(err.to_string())
            }
        }
    }

    /// connect → execute → close. Close runs whether or not execute failed.
    async fn run_on(
        &self,
        engine: DbType,
        profile: &ConnectionProfile,
        statement: &str,
        params: &[Value],
    ) -> GatewayResult<RowSet> {
        let mut session = self
            .connector
            .connect(engine, profile)
            .await
            .map_err(|source| GatewayError::Connection { engine, source })?;

        let outcome = session.execute(statement, params).await;
        close_quietly(engine, session).await;
        outcome.map_err(|source| GatewayError::Query { engine, source })
    }
}

async fn close_quietly<S: Session>(engine: DbType, session: S) {
    if let Err(err) = session.close().await {
        tracing::warn!(%engine, error = %err, "failed to close connection");
    }
}

fn resolve(active: Option<&ConnectionProfile>) -> GatewayResult<(&ConnectionProfile, DbType)> {
    let profile = active.ok_or(GatewayError::NoActiveConnection)?;
    Ok((profile, engine_of(profile)?))
}

fn engine_of(profile: &ConnectionProfile) -> GatewayResult<DbType> {
    profile
        .engine()
        .ok_or_else(|| GatewayError::UnsupportedEngine(profile.db_type.clone()))
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
