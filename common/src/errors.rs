//! Application error type shared by the HTTP services.
//!
//! Every handler returns `Result<_, AppError>`; the `IntoResponse` impl turns
//! the error into a status code plus the standard [`ApiResponse`] envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::response::ApiResponse;

/// Result alias used across services.
pub type AppResult<T> = Result<T, AppError>;

/// Errors surfaced to HTTP callers.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request body or parameter failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Statement rejected by the SQL guard.
    #[error("unsafe SQL: {0}")]
    UnsafeSql(String),

    /// Table or column name outside the allowed identifier charset.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// No stored connection with the given id.
    #[error("connection not found: {0}")]
    ConnectionNotFound(String),

    /// Another connection already uses this name.
    #[error("connection name already exists: {0}")]
    DuplicateName(String),

    /// Engine tag is not one of the supported database types.
    #[error("unsupported database type: {0}")]
    UnsupportedDatabaseType(String),

    /// No connection profile is marked active.
    #[error("no active database connection found, configure one in settings")]
    NoActiveConnection,

    /// Could not open a connection to the target database.
    #[error("database connection failed: {0}")]
    DatabaseConnection(String),

    /// Statement execution failed on the target database.
    #[error("query execution failed: {0}")]
    DatabaseQuery(String),

    /// Reading or writing the profile store failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// A peer service was unreachable or answered garbage.
    #[error("external service error: {0}")]
    ExternalService(String),

    /// The export query matched no rows.
    #[error("No data to export")]
    NoData,

    /// Building the export file failed.
    #[error("export failed: {0}")]
    Export(String),
}

impl AppError {
    /// Stable machine-readable code for the response envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::UnsafeSql(_) => "UNSAFE_SQL",
            AppError::InvalidIdentifier(_) => "INVALID_IDENTIFIER",
            AppError::ConnectionNotFound(_) => "NOT_FOUND",
            AppError::DuplicateName(_) => "DUPLICATE_NAME",
            AppError::UnsupportedDatabaseType(_) => "UNSUPPORTED_DATABASE_TYPE",
            AppError::NoActiveConnection => "NO_ACTIVE_CONNECTION",
            AppError::DatabaseConnection(_) => "DATABASE_CONNECTION_ERROR",
            AppError::DatabaseQuery(_) => "QUERY_ERROR",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            AppError::NoData => "NO_DATA",
            AppError::Export(_) => "EXPORT_ERROR",
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::UnsafeSql(_)
            | AppError::InvalidIdentifier(_)
            | AppError::UnsupportedDatabaseType(_)
            | AppError::NoActiveConnection
            | AppError::NoData => StatusCode::BAD_REQUEST,
            AppError::ConnectionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateName(_) => StatusCode::CONFLICT,
            AppError::DatabaseQuery(_) | AppError::Storage(_) | AppError::Export(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::DatabaseConnection(_) | AppError::ExternalService(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = self.code(), error = %self, "request rejected");
        }
        let body = ApiResponse::err(self.code(), self.to_string());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::NoActiveConnection.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::ConnectionNotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::DuplicateName("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::NoData.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::DatabaseConnection("refused".into()).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_message_keeps_cause() {
        let err = AppError::DatabaseQuery("no such table: widgets".into());
        assert!(err.to_string().contains("no such table: widgets"));
        assert_eq!(err.code(), "QUERY_ERROR");
    }
}
