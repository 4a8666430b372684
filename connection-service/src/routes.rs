//! 连接服务路由模块

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{
    activate_connection, active_profile, create_connection, delete_connection, get_connection,
    health_check, list_connections, test_connection, update_connection,
};
use crate::state::AppState;

/// 创建连接管理路由
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/connections", get(list_connections).post(create_connection))
        .route(
            "/api/connections/{id}",
            get(get_connection).put(update_connection).delete(delete_connection),
        )
        .route("/api/connections/{id}/test", post(test_connection))
        .route("/api/connections/{id}/activate", post(activate_connection))
        .route("/api/health", get(health_check))
        .route("/internal/profiles/active", get(active_profile))
}
