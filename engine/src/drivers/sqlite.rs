//! SQLite arm. The profile's `database` is the file path; placeholders are `?`.

use common::models::{ConnectionProfile, Row};
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column, Connection, Executor, Row as _, Sqlite};

use super::{bytes, numeric_param, NumericParam};
use crate::session::RowSet;

/// Opens an existing database file. A missing file is a connection error,
/// never a freshly created empty database.
pub async fn connect(profile: &ConnectionProfile) -> Result<SqliteConnection, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(&profile.database)
        .create_if_missing(false);
    SqliteConnection::connect_with(&options).await
}

pub async fn execute(
    conn: &mut SqliteConnection,
    statement: &str,
    params: &[Value],
) -> Result<RowSet, sqlx::Error> {
    let query = params.iter().fold(sqlx::query(statement), bind_param);
    let rows = query.fetch_all(&mut *conn).await?;

    // No row to read names from; ask the prepared statement instead.
    let columns = match rows.first() {
        Some(row) => row.columns().iter().map(|c| c.name().to_string()).collect(),
        None => (&mut *conn)
            .describe(statement)
            .await?
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect(),
    };
    Ok(RowSet {
        columns,
        rows: rows.iter().map(convert_row).collect(),
    })
}

fn bind_param<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &'q Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => match numeric_param(n) {
            NumericParam::Int(i) => query.bind(i),
            NumericParam::Float(f) => query.bind(f),
        },
        Value::String(s) => query.bind(s.as_str()),
        Value::Array(_) | Value::Object(_) => query.bind(value.to_string()),
    }
}

fn convert_row(row: &SqliteRow) -> Row {
    row.columns()
        .iter()
        .map(|col| (col.name().to_string(), extract_value(row, col.ordinal())))
        .collect()
}

/// SQLite types values, not columns, so four storage classes cover everything.
fn extract_value(row: &SqliteRow, idx: usize) -> Value {
    try_column!(row, idx, i64, Value::from);
    try_column!(row, idx, f64, Value::from);
    try_column!(row, idx, String, Value::String);
    try_column!(row, idx, Vec<u8>, bytes);
    Value::Null
}
