//! SQL Server arm over TDS. Placeholders are `@P1`, `@P2`, ...

use common::models::{ConnectionProfile, Row};
use serde_json::Value;
use tiberius::{AuthMethod, ColumnData, Config, EncryptionLevel, FromSql, Query};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use super::{bytes, naive_date, naive_datetime, naive_time, numeric_param, port_or, NumericParam};
use crate::session::RowSet;

const DEFAULT_PORT: u16 = 1433;

pub type Client = tiberius::Client<Compat<TcpStream>>;

/// Opens a TDS session. The server certificate is trusted as-is and only the
/// login exchange is encrypted.
pub async fn connect(profile: &ConnectionProfile) -> Result<Client, tiberius::error::Error> {
    let mut config = Config::new();
    config.host(&profile.host);
    config.port(port_or(profile, DEFAULT_PORT));
    config.database(&profile.database);
    config.authentication(AuthMethod::sql_server(&profile.username, &profile.password));
    config.encryption(EncryptionLevel::Off);
    config.trust_cert();

    let tcp = TcpStream::connect(config.get_addr()).await?;
    tcp.set_nodelay(true)?;
    Client::connect(config, tcp.compat_write()).await
}

pub async fn execute(
    client: &mut Client,
    statement: &str,
    params: &[Value],
) -> Result<RowSet, tiberius::error::Error> {
    let mut query = Query::new(statement);
    for param in params {
        match param {
            Value::Null => query.bind(Option::<String>::None),
            Value::Bool(b) => query.bind(*b),
            Value::Number(n) => match numeric_param(n) {
                NumericParam::Int(i) => query.bind(i),
                NumericParam::Float(f) => query.bind(f),
            },
            Value::String(s) => query.bind(s.clone()),
            Value::Array(_) | Value::Object(_) => query.bind(param.to_string()),
        }
    }

    let mut stream = query.query(client).await?;
    let columns = stream
        .columns()
        .await?
        .map(|columns| columns.iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();
    let rows = stream.into_first_result().await?;
    Ok(RowSet {
        columns,
        rows: rows.into_iter().map(convert_row).collect(),
    })
}

fn convert_row(row: tiberius::Row) -> Row {
    let names: Vec<String> = row.columns().iter().map(|c| c.name().to_string()).collect();
    names.into_iter().zip(row).map(|(name, data)| (name, decode(data))).collect()
}

fn decode(data: ColumnData<'static>) -> Value {
    match data {
        ColumnData::U8(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::I16(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::I32(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::I64(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::F32(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::F64(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::Bit(v) => v.map(Value::Bool).unwrap_or(Value::Null),
        ColumnData::String(v) => v.map(|s| Value::String(s.into_owned())).unwrap_or(Value::Null),
        ColumnData::Guid(v) => v.map(|g| Value::String(g.to_string())).unwrap_or(Value::Null),
        ColumnData::Binary(v) => v.map(bytes).unwrap_or(Value::Null),
        ColumnData::Numeric(v) => v
            .map(|n| Value::from(n.value() as f64 / 10f64.powi(i32::from(n.scale()))))
            .unwrap_or(Value::Null),
        ColumnData::Xml(v) => v
            .map(|xml| Value::String(xml.into_owned().into_string()))
            .unwrap_or(Value::Null),
        ref temporal @ (ColumnData::DateTime(_)
        | ColumnData::SmallDateTime(_)
        | ColumnData::DateTime2(_)) => decode_with(temporal, naive_datetime),
        ref temporal @ ColumnData::Date(_) => decode_with(temporal, naive_date),
        ref temporal @ ColumnData::Time(_) => decode_with(temporal, naive_time),
        ref temporal @ ColumnData::DateTimeOffset(_) => {
            decode_with(temporal, |dt: chrono::DateTime<chrono::FixedOffset>| {
                Value::String(dt.to_rfc3339())
            })
        }
        #[allow(unreachable_patterns)]
        _ => Value::Null,
    }
}

fn decode_with<'a, T, F>(data: &'a ColumnData<'static>, map: F) -> Value
where
    T: FromSql<'a>,
    F: FnOnce(T) -> Value,
{
    match T::from_sql(data) {
        Ok(value) => value.map(map).unwrap_or(Value::Null),
        Err(err) => {
            tracing::debug!(error = %err, "failed to decode temporal column, returning null");
            Value::Null
        }
    }
}
