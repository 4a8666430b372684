//! SQL query models.
//!
//! Contains the request/response shapes for query execution and schema
//! introspection. Rows are column-name → value maps whose key order follows
//! the driver's projection order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use validator::Validate;

/// One result row.
pub type Row = Map<String, Value>;

/// Request body for executing a SQL query against the active connection.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct QueryRequest {
    /// SQL statement to execute. Placeholders follow the engine's native
    /// syntax (`$1` postgres, `:1` oracle, `@P1` sqlserver, `?` sqlite).
    #[validate(length(min = 1, message = "SQL query is required"))]
    pub sql: String,

    /// Positional parameters.
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub params: Vec<Value>,
}

/// Result of a SQL query execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    /// Column names in projection order, reported by the driver even when
    /// no row matched.
    pub columns: Vec<String>,

    /// Row data.
    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<Row>,

    /// Number of rows returned.
    pub row_count: usize,

    /// Wall-clock time including connect and teardown, in milliseconds.
    pub execution_time_ms: u64,
}

impl QueryResult {
    /// Wraps fetched rows. A repeated column name is listed once, matching
    /// the row maps where the last value under that name wins.
    pub fn new(columns: Vec<String>, rows: Vec<Row>, execution_time_ms: u64) -> Self {
        let mut seen = std::collections::HashSet::new();
        let columns = columns
            .into_iter()
            .filter(|name| seen.insert(name.clone()))
            .collect();
        Self {
            columns,
            row_count: rows.len(),
            rows,
            execution_time_ms,
        }
    }
}

/// Request body for exporting a query result as an `.xlsx` workbook.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ExportRequest {
    /// SQL statement to execute, same rules as [`QueryRequest::sql`].
    #[validate(length(min = 1, message = "SQL query is required"))]
    pub sql: String,

    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub params: Vec<Value>,

    /// Download name without extension; unsafe characters become `_`.
    #[serde(default = "default_export_name")]
    pub filename: String,
}

fn default_export_name() -> String {
    "report".to_string()
}

/// One column of an introspected table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub name: String,
    /// Raw engine-reported type, not normalized.
    #[serde(rename = "type")]
    pub data_type: String,
    pub not_null: bool,
    pub primary_key: bool,
}

/// Response body for table introspection.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<ColumnDescriptor>,
}
