//! 初始化示例 SQLite 数据库
//!
//! Usage: `init-sample-db [path]`. Without a path the database is written to
//! `<DATA_DIR>/sample.db`. Existing demo tables are dropped and reseeded.

use std::path::PathBuf;

use anyhow::Context;
use common::config::{load_dotenv, AppConfig};
use engine::sample::create_sample_database;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let path = match std::env::args_os().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => AppConfig::load_with_service("init-sample-db").sample_db_path(),
    };

    create_sample_database(&path)
        .await
        .with_context(|| format!("failed to create sample database at {}", path.display()))?;

    info!(path = %path.display(), tables = "departments, employees, sales", "示例数据库已创建");
    Ok(())
}
