//! Per-engine driver arms.
//!
//! Each arm exposes the same three pieces: `connect(profile)`,
//! `execute(conn, statement, params)` returning a [`RowSet`](crate::RowSet),
//! and a row decoder that turns the engine-native row into a
//! [`Row`](common::models::Row). Closing is done by
//! [`DriverSession`](crate::DriverSession) so teardown stays in one place.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;

/// Returns from the enclosing decoder if the column decodes as `Option<$ty>`.
///
/// sqlx checks type compatibility before decoding, so the first type in the
/// cascade that matches the column wins. Integer types must come before
/// `bool` and `f64`.
macro_rules! try_column {
    ($row:expr, $idx:expr, $ty:ty, $map:expr) => {
        if let Ok(value) = $row.try_get::<Option<$ty>, _>($idx) {
            return value.map($map).unwrap_or(serde_json::Value::Null);
        }
    };
}

pub mod oracle;
pub mod postgres;
pub mod sqlite;
pub mod sqlserver;

/// Stored port, or the engine default when the profile left it at zero.
pub(crate) fn port_or(profile: &common::models::ConnectionProfile, default: u16) -> u16 {
    if profile.port == 0 {
        default
    } else {
        profile.port
    }
}

pub(crate) fn decimal(value: Decimal) -> Value {
    value.to_f64().map(Value::from).unwrap_or(Value::Null)
}

pub(crate) fn bytes(value: impl AsRef<[u8]>) -> Value {
    Value::String(STANDARD.encode(value))
}

pub(crate) fn naive_datetime(value: chrono::NaiveDateTime) -> Value {
    Value::String(value.format("%Y-%m-%d %H:%M:%S%.f").to_string())
}

pub(crate) fn naive_date(value: chrono::NaiveDate) -> Value {
    Value::String(value.format("%Y-%m-%d").to_string())
}

pub(crate) fn naive_time(value: chrono::NaiveTime) -> Value {
    Value::String(value.format("%H:%M:%S%.f").to_string())
}

/// Integer parameters bind as i64, everything else numeric as f64.
pub(crate) enum NumericParam {
    Int(i64),
    Float(f64),
}

pub(crate) fn numeric_param(number: &serde_json::Number) -> NumericParam {
    match number.as_i64() {
        Some(int) => NumericParam::Int(int),
        None => NumericParam::Float(number.as_f64().unwrap_or(f64::NAN)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decimal_and_bytes() {
        assert_eq!(decimal(Decimal::new(12345, 2)), json!(123.45));
        assert_eq!(bytes([0xde, 0xad]), json!("3q0="));
    }

    #[test]
    fn test_temporal_formatting() {
        let date = chrono::NaiveDate::from_ymd_opt(2020, 1, 15).unwrap();
        assert_eq!(naive_date(date), json!("2020-01-15"));
        let datetime = date.and_hms_opt(8, 30, 0).unwrap();
        assert_eq!(naive_datetime(datetime), json!("2020-01-15 08:30:00"));
    }

    #[test]
    fn test_numeric_param_split() {
        assert!(matches!(numeric_param(&json!(7).as_number().unwrap().clone()), NumericParam::Int(7)));
        assert!(matches!(numeric_param(&json!(1.5).as_number().unwrap().clone()), NumericParam::Float(f) if f == 1.5));
    }
}
