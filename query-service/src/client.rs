//! Client for the connection service's internal endpoints.

use common::errors::{AppError, AppResult};
use common::models::ConnectionProfile;
use serde::Deserialize;

/// Only `data` matters here; the rest of the envelope is ignored.
#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<ConnectionProfile>,
}

/// Resolves the active profile from the connection service.
#[derive(Clone)]
pub struct ProfileClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl ProfileClient {
    pub fn new(base_url: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        }
    }

    /// Fetches the active profile, or `None` when nothing is active.
    pub async fn active_profile(&self) -> AppResult<Option<ConnectionProfile>> {
        let url = format!("{}/internal/profiles/active", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("无法连接到连接服务: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "连接服务返回状态码 {}",
                response.status()
            )));
        }

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("连接服务返回无效响应: {}", e)))?;

        Ok(envelope.data)
    }
}
