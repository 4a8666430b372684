//! Service configuration loaded from the environment.

use std::path::PathBuf;

/// Per-service runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Name used in logs and response metadata.
    pub service_name: String,
    /// Bind address.
    pub host: String,
    /// Bind port; each binary overrides this with its own default.
    pub port: u16,
    /// Directory holding `connections.json` and the sample database.
    pub data_dir: PathBuf,
}

impl AppConfig {
    /// Loads configuration for the named service.
    ///
    /// Reads `SERVER_HOST`, `SERVER_PORT` and `DATA_DIR`, falling back to
    /// `0.0.0.0`, `8080` and `./data`.
    pub fn load_with_service(service_name: &str) -> Self {
        Self {
            service_name: service_name.to_string(),
            host: env_or("SERVER_HOST", "0.0.0.0"),
            port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            data_dir: PathBuf::from(env_or("DATA_DIR", "./data")),
        }
    }

    /// Path of the JSON profile store.
    pub fn profiles_path(&self) -> PathBuf {
        self.data_dir.join("connections.json")
    }

    /// Default location of the seeded sample database.
    pub fn sample_db_path(&self) -> PathBuf {
        self.data_dir.join("sample.db")
    }
}

/// Base URLs of the peer services.
#[derive(Debug, Clone)]
pub struct ServiceUrls {
    pub connection_service: String,
}

impl ServiceUrls {
    /// Reads `CONNECTION_SERVICE_URL`.
    pub fn load() -> Self {
        Self {
            connection_service: env_or("CONNECTION_SERVICE_URL", "http://127.0.0.1:8081"),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Load .env file from the working directory (best-effort, no error if missing).
pub fn load_dotenv() {
    let Ok(content) = std::fs::read_to_string(".env") else {
        return;
    };
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            let value = value.trim().trim_matches('"');
            // Only set if not already set by the environment
            if std::env::var(key).is_err() {
                std::env::set_var(key, value);
            }
        }
    }
}
