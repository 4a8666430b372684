//! Application state for query service.

use std::sync::Arc;

use common::config::{AppConfig, ServiceUrls};
use engine::QueryGateway;

use crate::client::ProfileClient;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub profiles: ProfileClient,
    pub gateway: Arc<QueryGateway>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(config: AppConfig, service_urls: ServiceUrls) -> Self {
        Self {
            config,
            profiles: ProfileClient::new(service_urls.connection_service, reqwest::Client::new()),
            gateway: Arc::new(QueryGateway::new()),
        }
    }
}
