//! Handler模块

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use common::errors::AppError;
use common::middleware::RequestId;
use common::models::{ConnectionItem, ConnectionProfile, CreateConnectionRequest};
use common::response::ApiResponse;
use crate::service::{ConnectionService, ConnectionServiceTrait};
use crate::state::AppState;

type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

fn service(state: &AppState) -> ConnectionService {
    ConnectionService::new(state.store.clone(), state.gateway.clone())
}

fn respond<T: Serialize>(state: &AppState, request_id: &RequestId, data: T) -> ApiResult<T> {
    Ok(Json(
        ApiResponse::ok_with_service(data, state.config.service_name.as_str())
            .with_request_id(request_id.as_str()),
    ))
}

/// 列出所有已保存的数据库连接
#[utoipa::path(
    get,
    path = "/api/connections",
    tag = "connections",
    responses(
        (status = 200, description = "连接列表（不含密码）", body = ApiResponse<Vec<ConnectionItem>>)
    )
)]
pub async fn list_connections(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> ApiResult<Vec<ConnectionItem>> {
    let data = service(&state).list().await?;
    respond(&state, &request_id, data)
}

/// 创建新的数据库连接
#[utoipa::path(
    post,
    path = "/api/connections",
    tag = "connections",
    request_body = CreateConnectionRequest,
    responses(
        (status = 200, description = "连接已创建", body = ApiResponse<ConnectionItem>),
        (status = 400, description = "参数校验失败或数据库类型不支持"),
        (status = 409, description = "连接名称已存在")
    )
)]
pub async fn create_connection(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(req): Json<CreateConnectionRequest>,
) -> ApiResult<ConnectionItem> {
    let data = service(&state).create(req).await?;
    respond(&state, &request_id, data)
}

/// 根据 ID 获取连接
#[utoipa::path(
    get,
    path = "/api/connections/{id}",
    tag = "connections",
    params(
        ("id" = String, Path, description = "连接 ID")
    ),
    responses(
        (status = 200, description = "连接详情", body = ApiResponse<ConnectionItem>),
        (status = 404, description = "连接未找到")
    )
)]
pub async fn get_connection(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> ApiResult<ConnectionItem> {
    let data = service(&state).get(&id).await?;
    respond(&state, &request_id, data)
}

/// 更新数据库连接
#[utoipa::path(
    put,
    path = "/api/connections/{id}",
    tag = "connections",
    params(
        ("id" = String, Path, description = "连接 ID")
    ),
    request_body = CreateConnectionRequest,
    responses(
        (status = 200, description = "连接已更新", body = ApiResponse<ConnectionItem>),
        (status = 404, description = "连接未找到"),
        (status = 409, description = "连接名称已存在")
    )
)]
pub async fn update_connection(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
    Json(req): Json<CreateConnectionRequest>,
) -> ApiResult<ConnectionItem> {
    let data = service(&state).update(&id, req).await?;
    respond(&state, &request_id, data)
}

/// 根据 ID 删除数据库连接
#[utoipa::path(
    delete,
    path = "/api/connections/{id}",
    tag = "connections",
    params(
        ("id" = String, Path, description = "连接 ID")
    ),
    responses(
        (status = 200, description = "连接已删除", body = ApiResponse<bool>),
        (status = 404, description = "连接未找到")
    )
)]
pub async fn delete_connection(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> ApiResult<bool> {
    service(&state).delete(&id).await?;
    respond(&state, &request_id, true)
}

/// 测试数据库连接
///
/// A failed test is still a 200 with `ok: false`; only an unknown id is an
/// error.
#[utoipa::path(
    post,
    path = "/api/connections/{id}/test",
    tag = "connections",
    params(
        ("id" = String, Path, description = "连接 ID")
    ),
    responses(
        (status = 200, description = "连接测试结果", body = ApiResponse<ConnectionTestResult>),
        (status = 404, description = "连接未找到")
    )
)]
pub async fn test_connection(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> ApiResult<ConnectionTestResult> {
    let check = service(&state).test(&id).await?;
    respond(
        &state,
        &request_id,
        ConnectionTestResult {
            id,
            ok: check.ok,
            reason: check.reason,
            latency_ms: check.latency_ms,
        },
    )
}

/// 设为当前活动连接
#[utoipa::path(
    post,
    path = "/api/connections/{id}/activate",
    tag = "connections",
    params(
        ("id" = String, Path, description = "连接 ID")
    ),
    responses(
        (status = 200, description = "连接已激活", body = ApiResponse<ConnectionItem>),
        (status = 404, description = "连接未找到")
    )
)]
pub async fn activate_connection(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> ApiResult<ConnectionItem> {
    let data = service(&state).activate(&id).await?;
    respond(&state, &request_id, data)
}

/// 内部端点，供查询服务获取当前活动连接（含凭据）
#[utoipa::path(
    get,
    path = "/internal/profiles/active",
    tag = "internal",
    responses(
        (status = 200, description = "活动连接，未设置时为 null", body = ApiResponse<ConnectionProfile>)
    )
)]
pub async fn active_profile(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> ApiResult<Option<ConnectionProfile>> {
    let data = service(&state).active().await?;
    respond(&state, &request_id, data)
}

/// 健康检查端点
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "服务运行正常", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let connections = match state.store.count().await {
        Ok(count) => count,
        Err(e) => {
            tracing::warn!(error = %e, "health check could not read profile store");
            0
        }
    };
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: state.config.service_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        connections,
    })
}

/// 连接测试结果
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionTestResult {
    /// 连接 ID
    pub id: String,
    /// 测试是否成功
    pub ok: bool,
    /// 失败原因
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// 连接延迟（毫秒）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// 健康检查响应
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// 服务状态
    pub status: String,
    /// 服务名称
    pub service: String,
    /// 服务版本
    pub version: String,
    /// 当前时间戳
    pub timestamp: DateTime<Utc>,
    /// 已保存的连接数
    pub connections: usize,
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
        Router,
    };
    use common::config::AppConfig;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::state::AppState;

    fn app() -> (TempDir, Router) {
        let dir = TempDir::new().unwrap();
        let config = AppConfig {
            service_name: "connection-service".into(),
            host: "127.0.0.1".into(),
            port: 0,
            data_dir: dir.path().to_path_buf(),
        };
        (dir, crate::create_router(AppState::new(config)))
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn sqlite_body(name: &str, path: &str) -> Value {
        json!({"name": name, "type": "sqlite", "database": path})
    }

    #[tokio::test]
    async fn test_create_list_hides_password() {
        let (_dir, app) = app();
        let body = json!({
            "name": "Warehouse", "type": "postgres", "host": "db", "database": "dw",
            "username": "report", "password": "secret"
        });
        let (status, created) = call(&app, Method::POST, "/api/connections", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["data"]["port"], 5432);
        assert!(created["data"].get("password").is_none());
        assert!(created["meta"]["requestId"].is_string());

        let (_, listed) = call(&app, Method::GET, "/api/connections", None).await;
        assert_eq!(listed["data"].as_array().unwrap().len(), 1);
        assert!(listed["data"][0].get("password").is_none());
    }

    #[tokio::test]
    async fn test_error_envelopes() {
        let (_dir, app) = app();
        let (status, body) = call(&app, Method::GET, "/api/connections/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");

        let db2 = json!({"name": "Legacy", "type": "db2", "host": "h", "database": "SAMPLE", "username": "u"});
        let (status, body) = call(&app, Method::POST, "/api/connections", Some(db2)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "UNSUPPORTED_DATABASE_TYPE");

        call(&app, Method::POST, "/api/connections", Some(sqlite_body("Dup", "a.db"))).await;
        let (status, body) = call(&app, Method::POST, "/api/connections", Some(sqlite_body("Dup", "b.db"))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "DUPLICATE_NAME");

        let (status, body) = call(&app, Method::PUT, "/api/connections/nope", Some(sqlite_body("Dup", "c.db"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_create_oracle_connection() {
        let (_dir, app) = app();
        let oracle = json!({"name": "Finance", "type": "oracle", "host": "ora.internal", "database": "XEPDB1", "username": "report", "password": "secret"});
        let (status, body) = call(&app, Method::POST, "/api/connections", Some(oracle)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["type"], "oracle");
        assert_eq!(body["data"]["port"], 1521);
        assert!(body["data"].get("password").is_none());
    }

    #[tokio::test]
    async fn test_activate_and_internal_active_profile() {
        let (_dir, app) = app();
        let (_, body) = call(&app, Method::GET, "/internal/profiles/active", None).await;
        assert!(body["data"].is_null());

        let (_, a) = call(&app, Method::POST, "/api/connections", Some(sqlite_body("A", "a.db"))).await;
        let (_, b) = call(&app, Method::POST, "/api/connections", Some(sqlite_body("B", "b.db"))).await;
        let a_id = a["data"]["id"].as_str().unwrap().to_string();
        let b_id = b["data"]["id"].as_str().unwrap().to_string();

        call(&app, Method::POST, &format!("/api/connections/{a_id}/activate"), None).await;
        let (status, _) = call(&app, Method::POST, &format!("/api/connections/{b_id}/activate"), None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = call(&app, Method::GET, "/internal/profiles/active", None).await;
        assert_eq!(body["data"]["id"], b_id.as_str());
        assert_eq!(body["data"]["type"], "sqlite");

        let (_, listed) = call(&app, Method::GET, "/api/connections", None).await;
        let active: Vec<_> = listed["data"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|p| p["isActive"] == true)
            .collect();
        assert_eq!(active.len(), 1);
    }

    #[tokio::test]
    async fn test_connection_reports_failure_as_ok_false() {
        let (dir, app) = app();
        let missing = dir.path().join("missing.db");
        let (_, created) = call(
            &app,
            Method::POST,
            "/api/connections",
            Some(sqlite_body("Missing", missing.to_str().unwrap())),
        )
        .await;
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = call(&app, Method::POST, &format!("/api/connections/{id}/test"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], id.as_str());
        assert_eq!(body["data"]["ok"], false);
        assert!(body["data"]["reason"].is_string());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (_dir, app) = app();
        let (_, created) = call(&app, Method::POST, "/api/connections", Some(sqlite_body("A", "a.db"))).await;
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let (status, updated) = call(
            &app,
            Method::PUT,
            &format!("/api/connections/{id}"),
            Some(sqlite_body("A2", "a2.db")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["data"]["name"], "A2");
        assert!(updated["data"]["updatedAt"].is_string());

        let (status, _) = call(&app, Method::DELETE, &format!("/api/connections/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(&app, Method::DELETE, &format!("/api/connections/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health() {
        let (_dir, app) = app();
        let (status, body) = call(&app, Method::GET, "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["connections"], 0);
    }
}
