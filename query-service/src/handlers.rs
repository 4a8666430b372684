//! Handler模块

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use common::errors::AppError;
use common::middleware::RequestId;
use common::models::{ExportRequest, QueryRequest, QueryResult, TableSchema};
use common::response::ApiResponse;
use crate::export::XLSX_CONTENT_TYPE;
use crate::service::QueryService;
use crate::state::AppState;

type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

fn service(state: &AppState) -> QueryService {
    QueryService::new(state.profiles.clone(), state.gateway.clone())
}

fn respond<T: Serialize>(state: &AppState, request_id: &RequestId, data: T) -> ApiResult<T> {
    Ok(Json(
        ApiResponse::ok_with_service(data, state.config.service_name.as_str())
            .with_request_id(request_id.as_str()),
    ))
}

/// 在活动连接上执行只读 SQL 查询
#[utoipa::path(
    post,
    path = "/api/query",
    tag = "query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "查询执行成功", body = ApiResponse<QueryResult>),
        (status = 400, description = "SQL 不安全、校验失败或未设置活动连接"),
        (status = 500, description = "查询执行失败"),
        (status = 502, description = "数据库或连接服务不可达")
    )
)]
pub async fn execute_query(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(req): Json<QueryRequest>,
) -> ApiResult<QueryResult> {
    let result = service(&state).execute(req).await?;
    respond(&state, &request_id, result)
}

/// 列出活动连接下的所有表
#[utoipa::path(
    get,
    path = "/api/query/tables",
    tag = "query",
    responses(
        (status = 200, description = "表名列表（按名称排序）", body = ApiResponse<Vec<String>>),
        (status = 400, description = "未设置活动连接")
    )
)]
pub async fn list_tables(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> ApiResult<Vec<String>> {
    let tables = service(&state).list_tables().await?;
    respond(&state, &request_id, tables)
}

/// 获取表结构
#[utoipa::path(
    get,
    path = "/api/query/schema/{table}",
    tag = "query",
    params(
        ("table" = String, Path, description = "表名")
    ),
    responses(
        (status = 200, description = "表结构", body = ApiResponse<TableSchema>),
        (status = 400, description = "表名不合法或未设置活动连接")
    )
)]
pub async fn table_schema(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(table): Path<String>,
) -> ApiResult<TableSchema> {
    let schema = service(&state).describe_table(&table).await?;
    respond(&state, &request_id, schema)
}

/// 执行查询并以 xlsx 附件返回结果
#[utoipa::path(
    post,
    path = "/api/export/excel",
    tag = "export",
    request_body = ExportRequest,
    responses(
        (status = 200, description = "Excel 文件", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet", body = Vec<u8>),
        (status = 400, description = "SQL 不安全、结果为空或未设置活动连接"),
        (status = 500, description = "查询或导出失败")
    )
)]
pub async fn export_excel(
    State(state): State<AppState>,
    Json(req): Json<ExportRequest>,
) -> Result<Response, AppError> {
    let (filename, bytes) = service(&state).export(req).await?;
    let disposition = format!("attachment; filename=\"{filename}.xlsx\"");
    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
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
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: state.config.service_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
        Router,
    };
    use common::config::{AppConfig, ServiceUrls};
    use engine::sample::create_sample_database;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::state::AppState;

    /// Query service wired to a mocked connection service whose active
    /// profile is `active`.
    async fn app(active: Value) -> (MockServer, Router) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/internal/profiles/active"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": active,
                "meta": {"timestamp": "2024-01-01T00:00:00Z"}
            })))
            .mount(&server)
            .await;

        let config = AppConfig {
            service_name: "query-service".into(),
            host: "127.0.0.1".into(),
            port: 0,
            data_dir: std::env::temp_dir(),
        };
        let urls = ServiceUrls {
            connection_service: server.uri(),
        };
        let router = crate::create_router(AppState::new(config, urls));
        (server, router)
    }

    async fn sample_profile() -> (TempDir, Value) {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("sample.db");
        create_sample_database(&db).await.unwrap();
        let profile = json!({
            "id": "sample", "name": "Sample", "type": "sqlite",
            "database": db.to_string_lossy(), "isActive": true,
            "createdAt": "2024-01-01T00:00:00Z"
        });
        (dir, profile)
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

    #[tokio::test]
    async fn test_query_against_active_sqlite_profile() {
        let (_dir, profile) = sample_profile().await;
        let (_server, app) = app(profile).await;

        let body = json!({"sql": "SELECT name, budget FROM departments WHERE budget > ? ORDER BY name;", "params": [250000]});
        let (status, res) = call(&app, Method::POST, "/api/query", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(res["data"]["columns"], json!(["name", "budget"]));
        assert_eq!(res["data"]["rowCount"], 2);
        assert_eq!(res["data"]["rows"][0]["name"], "Engineering");
        assert!(res["data"]["executionTimeMs"].is_u64());
        assert_eq!(res["meta"]["service"], "query-service");
    }

    #[tokio::test]
    async fn test_non_select_is_rejected_before_any_lookup() {
        let (server, app) = app(Value::Null).await;
        let body = json!({"sql": "DELETE FROM employees"});
        let (status, res) = call(&app, Method::POST, "/api/query", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(res["error"]["code"], "UNSAFE_SQL");
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_active_profile() {
        let (_server, app) = app(Value::Null).await;
        let (status, res) = call(&app, Method::GET, "/api/query/tables", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(res["error"]["code"], "NO_ACTIVE_CONNECTION");
    }

    #[tokio::test]
    async fn test_tables_and_schema() {
        let (_dir, profile) = sample_profile().await;
        let (_server, app) = app(profile).await;

        let (status, res) = call(&app, Method::GET, "/api/query/tables", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(res["data"], json!(["departments", "employees", "sales"]));

        let (status, res) = call(&app, Method::GET, "/api/query/schema/employees", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(res["data"]["tableName"], "employees");
        assert_eq!(
            res["data"]["columns"][0],
            json!({"name": "id", "type": "INTEGER", "notNull": true, "primaryKey": true})
        );
    }

    #[tokio::test]
    async fn test_schema_rejects_bad_identifier() {
        let (_dir, profile) = sample_profile().await;
        let (_server, app) = app(profile).await;
        let (status, res) = call(&app, Method::GET, "/api/query/schema/emp%22loyees", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(res["error"]["code"], "INVALID_IDENTIFIER");
    }

    #[tokio::test]
    async fn test_query_error_keeps_driver_message() {
        let (_dir, profile) = sample_profile().await;
        let (_server, app) = app(profile).await;
        let body = json!({"sql": "SELECT * FROM payroll"});
        let (status, res) = call(&app, Method::POST, "/api/query", Some(body)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res["error"]["code"], "QUERY_ERROR");
        assert!(res["error"]["message"].as_str().unwrap().contains("payroll"));
    }

    #[tokio::test]
    async fn test_unsupported_active_engine() {
        let db2 = json!({
            "id": "d", "name": "Legacy", "type": "db2", "host": "h", "port": 50000,
            "database": "SAMPLE", "isActive": true, "createdAt": "2024-01-01T00:00:00Z"
        });
        let (_server, app) = app(db2).await;
        let (status, res) = call(&app, Method::GET, "/api/query/tables", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(res["error"]["code"], "UNSUPPORTED_DATABASE_TYPE");
    }

    async fn export(app: &Router, body: Value) -> (StatusCode, Option<String>, Vec<u8>) {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/export/excel")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let disposition = res
            .headers()
            .get("content-disposition")
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, disposition, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_export_excel_uses_sanitized_filename() {
        let (_dir, profile) = sample_profile().await;
        let (_server, app) = app(profile).await;

        let body = json!({"sql": "SELECT name, budget FROM departments ORDER BY name", "filename": "Q1 report (2024)"});
        let (status, disposition, bytes) = export(&app, body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(disposition.as_deref(), Some("attachment; filename=\"Q1_report__2024_.xlsx\""));
        assert!(bytes.starts_with(b"PK"));
    }

    #[tokio::test]
    async fn test_export_empty_result_is_rejected() {
        let (_dir, profile) = sample_profile().await;
        let (_server, app) = app(profile).await;

        let body = json!({"sql": "SELECT * FROM employees WHERE salary < ?", "params": [0]});
        let (status, disposition, bytes) = export(&app, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(disposition.is_none());
        let res: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(res["error"]["code"], "NO_DATA");
        assert_eq!(res["error"]["message"], "No data to export");
    }

    #[tokio::test]
    async fn test_export_refuses_writes() {
        let (server, app) = app(Value::Null).await;
        let body = json!({"sql": "UPDATE employees SET salary = 0"});
        let (status, _, bytes) = export(&app, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let res: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(res["error"]["code"], "UNSAFE_SQL");
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
