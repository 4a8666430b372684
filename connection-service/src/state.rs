//! Application state for connection service.

use std::sync::Arc;

use common::config::AppConfig;
use engine::QueryGateway;

use crate::store::ProfileStore;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<ProfileStore>,
    pub gateway: Arc<QueryGateway>,
}

impl AppState {
    /// Creates a new application state backed by `<DATA_DIR>/connections.json`.
    pub fn new(config: AppConfig) -> Self {
        Self {
            store: Arc::new(ProfileStore::new(config.profiles_path())),
            gateway: Arc::new(QueryGateway::new()),
            config,
        }
    }
}
