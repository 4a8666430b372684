//! 路由模块

use axum::{
    routing::{get, post},
    Router,
};
use crate::handlers;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/query", post(handlers::execute_query))
        .route("/api/query/tables", get(handlers::list_tables))
        .route("/api/query/schema/{table}", get(handlers::table_schema))
        .route("/api/export/excel", post(handlers::export_excel))
        .route("/api/health", get(handlers::health_check))
}
