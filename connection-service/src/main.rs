//! 数据库连接管理服务
//!
//! 提供连接配置管理功能，包括：
//! - 连接配置的增删改查（JSON 文件存储）
//! - 连接测试
//! - 活动连接切换，以及供查询服务读取的内部端点

mod handlers;
mod routes;
mod service;
mod state;
mod store;

use axum::{middleware, routing::get, Json, Router};
use common::config::{load_dotenv, AppConfig};
use common::middleware::request_id_middleware;
use state::AppState;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

const SERVICE_NAME: &str = "connection-service";
const DEFAULT_PORT: u16 = 8081;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "连接服务 API",
        version = "0.1.0",
        description = "数据库连接配置管理微服务"
    ),
    paths(
        handlers::list_connections,
        handlers::create_connection,
        handlers::get_connection,
        handlers::update_connection,
        handlers::delete_connection,
        handlers::test_connection,
        handlers::activate_connection,
        handlers::active_profile,
        handlers::health_check,
    ),
    components(schemas(
        common::models::ConnectionItem,
        common::models::ConnectionProfile,
        common::models::CreateConnectionRequest,
        common::models::DbType,
        handlers::ConnectionTestResult,
        handlers::HealthResponse,
    )),
    tags(
        (name = "connections", description = "连接管理端点"),
        (name = "internal", description = "服务间调用端点"),
        (name = "health", description = "健康检查端点")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Load .env file (if present) before anything else
    load_dotenv();

    // 初始化日志追踪
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // 加载配置
    let mut config = AppConfig::load_with_service(SERVICE_NAME);
    config.port = std::env::var("SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let state = AppState::new(config.clone());
    info!(store = %state.store.path().display(), "连接配置文件");

    // 创建路由
    let app = create_router(state);

    // 启动服务
    let addr = format!("{}:{}", config.host, config.port);
    info!(service = SERVICE_NAME, address = %addr, "启动服务");

    let listener = TcpListener::bind(&addr).await.expect("绑定地址失败");
    axum::serve(listener, app).await.expect("服务启动失败");
}

fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::router())
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
