//! Per-engine catalog queries.
//!
//! Listing and introspection SQL differs per engine, but every query aliases
//! its output to the same field names so [`table_name`] and
//! [`column_descriptor`] can read any engine's rows. Field lookups ignore
//! case because some engines fold unquoted aliases.

use common::models::{ColumnDescriptor, DbType, Row};
use serde_json::Value;

/// SQL listing the base tables of the current schema, ordered by name.
pub fn list_tables_sql(engine: DbType) -> &'static str {
    match engine {
        DbType::Postgres => {
            "SELECT table_name::text AS name \
             FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_type = 'BASE TABLE' \
             ORDER BY table_name"
        }
        DbType::Oracle => "SELECT table_name AS name FROM user_tables ORDER BY table_name",
        DbType::SqlServer => {
            "SELECT TABLE_NAME AS name \
             FROM INFORMATION_SCHEMA.TABLES \
             WHERE TABLE_SCHEMA = SCHEMA_NAME() AND TABLE_TYPE = 'BASE TABLE' \
             ORDER BY TABLE_NAME"
        }
        DbType::SQLite => {
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             ORDER BY name"
        }
    }
}

/// SQL and parameters describing the columns of `table`, in ordinal order.
///
/// The caller must have validated `table` as an identifier: sqlite's
/// `PRAGMA` cannot take a bound parameter, so the name is embedded there.
pub fn describe_table_sql(engine: DbType, table: &str) -> (String, Vec<Value>) {
    let bound = vec![Value::String(table.to_string())];
    match engine {
        DbType::Postgres => (
            "SELECT c.column_name::text AS name, c.data_type::text AS type, \
                    CASE WHEN c.is_nullable = 'NO' THEN 1 ELSE 0 END AS notnull, \
                    CASE WHEN EXISTS ( \
                        SELECT 1 FROM information_schema.table_constraints tc \
                        JOIN information_schema.key_column_usage kcu \
                          ON kcu.constraint_name = tc.constraint_name \
                         AND kcu.table_schema = tc.table_schema \
                         AND kcu.table_name = tc.table_name \
                        WHERE tc.constraint_type = 'PRIMARY KEY' \
                          AND tc.table_schema = c.table_schema \
                          AND tc.table_name = c.table_name \
                          AND kcu.column_name = c.column_name \
                    ) THEN 1 ELSE 0 END AS primarykey \
             FROM information_schema.columns c \
             WHERE c.table_schema = current_schema() AND c.table_name::text = $1 \
             ORDER BY c.ordinal_position"
                .to_string(),
            bound,
        ),
        // Unquoted Oracle names are stored upper-case.
        DbType::Oracle => (
            "SELECT c.column_name AS name, c.data_type AS type, \
                    CASE WHEN c.nullable = 'N' THEN 1 ELSE 0 END AS notnull, \
                    CASE WHEN EXISTS ( \
                        SELECT 1 FROM user_cons_columns cc \
                        JOIN user_constraints uc ON uc.constraint_name = cc.constraint_name \
                        WHERE uc.constraint_type = 'P' \
                          AND uc.table_name = c.table_name \
                          AND cc.column_name = c.column_name \
                    ) THEN 1 ELSE 0 END AS primarykey \
             FROM user_tab_columns c \
             WHERE c.table_name = UPPER(:1) \
             ORDER BY c.column_id"
                .to_string(),
            bound,
        ),
        DbType::SqlServer => (
            "SELECT c.COLUMN_NAME AS name, c.DATA_TYPE AS type, \
                    CASE WHEN c.IS_NULLABLE = 'NO' THEN 1 ELSE 0 END AS notnull, \
                    CASE WHEN EXISTS ( \
                        SELECT 1 FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc \
                        JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu \
                          ON kcu.CONSTRAINT_NAME = tc.CONSTRAINT_NAME \
                         AND kcu.TABLE_SCHEMA = tc.TABLE_SCHEMA \
                         AND kcu.TABLE_NAME = tc.TABLE_NAME \
                        WHERE tc.CONSTRAINT_TYPE = 'PRIMARY KEY' \
                          AND tc.TABLE_SCHEMA = c.TABLE_SCHEMA \
                          AND tc.TABLE_NAME = c.TABLE_NAME \
                          AND kcu.COLUMN_NAME = c.COLUMN_NAME \
                    ) THEN 1 ELSE 0 END AS primarykey \
             FROM INFORMATION_SCHEMA.COLUMNS c \
             WHERE c.TABLE_SCHEMA = SCHEMA_NAME() AND c.TABLE_NAME = @P1 \
             ORDER BY c.ORDINAL_POSITION"
                .to_string(),
            bound,
        ),
        DbType::SQLite => (format!("PRAGMA table_info(\"{table}\")"), Vec::new()),
    }
}

/// Table name from a listing row (`name` or `table_name`).
pub fn table_name(row: &Row) -> Option<String> {
    field(row, &["name", "table_name"]).and_then(as_text)
}

/// Column descriptor from an introspection row.
///
/// sqlite's `pk` is the column's position in the primary key, so any
/// positive value marks a key column. Key columns always report `notNull`;
/// sqlite leaves `notnull` at 0 for an `INTEGER PRIMARY KEY` rowid alias.
pub fn column_descriptor(row: &Row) -> Option<ColumnDescriptor> {
    let name = field(row, &["name", "column_name"]).and_then(as_text)?;
    let primary_key = field(row, &["primarykey", "pk"]).is_some_and(truthy);
    Some(ColumnDescriptor {
        name,
        data_type: field(row, &["type", "data_type"]).and_then(as_text).unwrap_or_default(),
        not_null: primary_key || field(row, &["notnull"]).is_some_and(truthy),
        primary_key,
    })
}

fn field<'a>(row: &'a Row, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|wanted| {
        row.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(wanted))
            .map(|(_, value)| value)
    })
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Bool, non-zero number, or `Y`/`YES`/`TRUE`/`1` in any case.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_uppercase().as_str(),
            "Y" | "YES" | "TRUE" | "1"
        ),
        _ => false,
    }
}
