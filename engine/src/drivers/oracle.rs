//! Oracle arm. Placeholders are `:1`, `:2`, ...
//!
//! The OCI driver blocks, so connect, execute and close each run on the
//! blocking pool. `database` is the service name in the
//! `//host:port/service` connect string.

use std::sync::Arc;

use ::oracle::sql_type::{OracleType, ToSql};
use ::oracle::Connection;
use common::models::{ConnectionProfile, Row};
use serde_json::Value;

use super::{bytes, naive_datetime, numeric_param, port_or, NumericParam};
use crate::error::DriverError;
use crate::session::RowSet;

const DEFAULT_PORT: u16 = 1521;

/// Shared so the blocking tasks can borrow the connection.
pub type Client = Arc<Connection>;

pub async fn connect(profile: &ConnectionProfile) -> Result<Client, DriverError> {
    let connect_string = format!(
        "//{}:{}/{}",
        profile.host,
        port_or(profile, DEFAULT_PORT),
        profile.database
    );
    let username = profile.username.clone();
    let password = profile.password.clone();

    let conn = tokio::task::spawn_blocking(move || {
        Connection::connect(username, password, connect_string)
    })
    .await??;
    Ok(Arc::new(conn))
}

pub async fn execute(
    client: &Client,
    statement: &str,
    params: &[Value],
) -> Result<RowSet, DriverError> {
    let conn = Arc::clone(client);
    let statement = statement.to_string();
    let params = params.to_vec();

    let rows = tokio::task::spawn_blocking(move || fetch_all(&conn, &statement, &params)).await??;
    Ok(rows)
}

pub async fn close(client: Client) -> Result<(), DriverError> {
    tokio::task::spawn_blocking(move || client.close()).await??;
    Ok(())
}

fn fetch_all(conn: &Connection, statement: &str, params: &[Value]) -> Result<RowSet, ::oracle::Error> {
    let owned: Vec<Box<dyn ToSql>> = params.iter().map(to_sql).collect();
    let bound: Vec<&dyn ToSql> = owned.iter().map(|p| p.as_ref()).collect();

    let result_set = conn.query(statement, &bound)?;
    let columns: Vec<(String, OracleType)> = result_set
        .column_info()
        .iter()
        .map(|info| (info.name().to_string(), info.oracle_type().clone()))
        .collect();

    let mut rows = Vec::new();
    for row in result_set {
        let row = row?;
        rows.push(
            columns
                .iter()
                .enumerate()
                .map(|(idx, (name, ty))| (name.clone(), extract_value(&row, idx, ty)))
                .collect::<Row>(),
        );
    }

    Ok(RowSet {
        columns: columns.into_iter().map(|(name, _)| name).collect(),
        rows,
    })
}

/// Oracle has no boolean column type before 23c, so bools bind as 1/0.
fn to_sql(value: &Value) -> Box<dyn ToSql> {
    match value {
        Value::Null => Box::new(Option::<String>::None),
        Value::Bool(b) => Box::new(i64::from(*b)),
        Value::Number(n) => match numeric_param(n) {
            NumericParam::Int(i) => Box::new(i),
            NumericParam::Float(f) => Box::new(f),
        },
        Value::String(s) => Box::new(s.clone()),
        Value::Array(_) | Value::Object(_) => Box::new(value.to_string()),
    }
}

fn extract_value(row: &::oracle::Row, idx: usize, ty: &OracleType) -> Value {
    let decoded = match ty {
        OracleType::Number(_, _)
        | OracleType::Float(_)
        | OracleType::BinaryFloat
        | OracleType::BinaryDouble
        | OracleType::Int64
        | OracleType::UInt64 => number(row, idx),
        OracleType::Date | OracleType::Timestamp(_) => row
            .get::<usize, Option<chrono::NaiveDateTime>>(idx)
            .map(|v| v.map(naive_datetime)),
        OracleType::TimestampTZ(_) | OracleType::TimestampLTZ(_) => row
            .get::<usize, Option<chrono::DateTime<chrono::FixedOffset>>>(idx)
            .map(|v| v.map(|dt| Value::String(dt.to_rfc3339()))),
        OracleType::Raw(_) | OracleType::LongRaw | OracleType::BLOB => row
            .get::<usize, Option<Vec<u8>>>(idx)
            .map(|v| v.map(bytes)),
        _ => row.get::<usize, Option<String>>(idx).map(|v| v.map(Value::String)),
    };

    match decoded {
        Ok(value) => value.unwrap_or(Value::Null),
        Err(err) => {
            tracing::debug!(column = idx, oracle_type = %ty, error = %err, "failed to decode column, returning null");
            Value::Null
        }
    }
}

/// NUMBER carries no integer/decimal split, so whole values come back as
/// integers and everything else as f64.
fn number(row: &::oracle::Row, idx: usize) -> Result<Option<Value>, ::oracle::Error> {
    if let Ok(int) = row.get::<usize, Option<i64>>(idx) {
        return Ok(int.map(Value::from));
    }
    Ok(row.get::<usize, Option<f64>>(idx)?.map(Value::from))
}

