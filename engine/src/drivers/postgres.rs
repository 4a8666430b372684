//! PostgreSQL arm. Placeholders are `$1`, `$2`, ...

use common::models::{ConnectionProfile, Row};
use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::error::BoxDynError;
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgArgumentBuffer, PgArguments, PgConnectOptions, PgConnection, PgRow, PgTypeInfo};
use sqlx::query::Query;
use sqlx::{Column, Connection, Executor, Postgres, Row as _, Type, TypeInfo};

use super::{bytes, decimal, naive_date, naive_datetime, naive_time, numeric_param, port_or, NumericParam};
use crate::session::RowSet;

const DEFAULT_PORT: u16 = 5432;

pub async fn connect(profile: &ConnectionProfile) -> Result<PgConnection, sqlx::Error> {
    let options = PgConnectOptions::new()
        .host(&profile.host)
        .port(port_or(profile, DEFAULT_PORT))
        .database(&profile.database)
        .username(&profile.username)
        .password(&profile.password);
    PgConnection::connect_with(&options).await
}

pub async fn execute(
    conn: &mut PgConnection,
    statement: &str,
    params: &[Value],
) -> Result<RowSet, sqlx::Error> {
    let query = params.iter().fold(sqlx::query(statement), bind_param);
    let rows = query.fetch_all(&mut *conn).await?;

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

/// Parameter declared with type oid 0, so the server infers its type from
/// context. A string compared with a `date` or `integer` column then works
/// the same as an untyped literal would.
struct Untyped<T>(T);

impl<T> Type<Postgres> for Untyped<T> {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_oid(Oid(0))
    }
}

impl<'q, T: Encode<'q, Postgres>> Encode<'q, Postgres> for Untyped<T> {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        self.0.encode_by_ref(buf)
    }

    fn size_hint(&self) -> usize {
        self.0.size_hint()
    }
}

fn bind_param<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &'q Value,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(Untyped(Option::<&str>::None)),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => match numeric_param(n) {
            NumericParam::Int(i) => query.bind(i),
            NumericParam::Float(f) => query.bind(f),
        },
        Value::String(s) => query.bind(Untyped(s.as_str())),
        Value::Array(_) | Value::Object(_) => query.bind(Untyped(value.to_string())),
    }
}

fn convert_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .map(|col| (col.name().to_string(), extract_value(row, col.ordinal())))
        .collect()
}

fn extract_value(row: &PgRow, idx: usize) -> Value {
    // Integers before bool.
    try_column!(row, idx, i64, Value::from);
    try_column!(row, idx, i32, Value::from);
    try_column!(row, idx, i16, Value::from);
    try_column!(row, idx, bool, Value::Bool);
    try_column!(row, idx, f64, Value::from);
    try_column!(row, idx, f32, Value::from);
    try_column!(row, idx, rust_decimal::Decimal, decimal);
    try_column!(row, idx, String, Value::String);
    try_column!(row, idx, chrono::DateTime<chrono::Utc>, |dt| Value::String(dt.to_rfc3339()));
    try_column!(row, idx, chrono::NaiveDateTime, naive_datetime);
    try_column!(row, idx, chrono::NaiveDate, naive_date);
    try_column!(row, idx, chrono::NaiveTime, naive_time);
    try_column!(row, idx, Vec<u8>, bytes);
    try_column!(row, idx, Value, |json| json);

    tracing::debug!(
        column = row.column(idx).name(),
        pg_type = row.column(idx).type_info().name(),
        "unsupported column type, returning null"
    );
    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_and_null_params_leave_the_type_to_the_server() {
        let unspecified = PgTypeInfo::with_oid(Oid(0));
        assert_eq!(<Untyped<&str> as Type<Postgres>>::type_info(), unspecified);
        assert_eq!(<Untyped<Option<&str>> as Type<Postgres>>::type_info(), unspecified);
        assert_eq!(<Untyped<String> as Type<Postgres>>::type_info(), unspecified);
        assert_ne!(<&str as Type<Postgres>>::type_info(), unspecified);
    }

    #[test]
    fn test_untyped_encodes_like_the_inner_value() {
        let mut plain = PgArgumentBuffer::default();
        let mut wrapped = PgArgumentBuffer::default();
        let plain_null = <&str as Encode<'_, Postgres>>::encode_by_ref(&"2023-02-01", &mut plain);
        let wrapped_null = <Untyped<&str> as Encode<'_, Postgres>>::encode_by_ref(&Untyped("2023-02-01"), &mut wrapped);
        assert!(matches!(plain_null, Ok(IsNull::No)));
        assert!(matches!(wrapped_null, Ok(IsNull::No)));
        assert_eq!(&plain[..], &wrapped[..]);

        let mut null = PgArgumentBuffer::default();
        let none = <Untyped<Option<&str>> as Encode<'_, Postgres>>::encode_by_ref(&Untyped(None), &mut null);
        assert!(matches!(none, Ok(IsNull::Yes)));
    }
}
