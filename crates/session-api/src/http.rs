//! HTTP backend client

use std::time::Duration;

use async_trait::async_trait;
use attention::DistractionKind;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::{
    DistractionRequest, EndSessionRequest, FocusAnalytics, FocusSession, SessionSummary, SettingsPatch,
    SettingsSnapshot, StartSessionRequest,
};
use crate::{ApiError, FocusApi};

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL including any path prefix (e.g. "https://learn.example.com/api")
    pub base_url: String,
    /// Bearer token sent with every request
    pub token: Option<String>,
    /// Per-request timeout
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            token: None,
            timeout_ms: 10_000,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// `FocusApi` over JSON/HTTP
pub struct HttpFocusApi {
    client: Client,
    config: ApiConfig,
}

impl HttpFocusApi {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        debug!("{} {}", method, url);

        let request = self.client.request(method, url);
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, path: &str) -> Result<reqwest::Response, ApiError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout(self.config.timeout())
            } else {
                ApiError::Http(e)
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        warn!("{} failed with {}: {}", path, status, message);
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized,
            StatusCode::NOT_FOUND => ApiError::NotFound(path.to_string()),
            StatusCode::CONFLICT => ApiError::Conflict(message),
            _ => ApiError::Status {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn json<R: DeserializeOwned>(&self, request: RequestBuilder, path: &str) -> Result<R, ApiError> {
        let response = self.send(request, path).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(format!("{}: {}", path, e)))
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }
}

#[async_trait]
impl FocusApi for HttpFocusApi {
    async fn settings(&self) -> Result<SettingsSnapshot, ApiError> {
        let path = "/focus/settings";
        self.json(self.request(Method::GET, path), path).await
    }

    async fn update_settings(&self, patch: &SettingsPatch) -> Result<SettingsSnapshot, ApiError> {
        let path = "/focus/settings";
        self.json(self.request(Method::PATCH, path).json(patch), path).await
    }

    async fn active_session(&self) -> Result<Option<FocusSession>, ApiError> {
        let path = "/focus/session/active";
        match self.json::<Option<FocusSession>>(self.request(Method::GET, path), path).await {
            Ok(session) => Ok(session),
            Err(ApiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn start_session(&self, request: &StartSessionRequest) -> Result<FocusSession, ApiError> {
        let path = "/focus/session/start";
        self.json(self.request(Method::POST, path).json(request), path).await
    }

    async fn pause_session(&self, id: &str) -> Result<FocusSession, ApiError> {
        let path = format!("/focus/session/{}/pause", id);
        self.json(self.request(Method::PATCH, &path), &path).await
    }

    async fn resume_session(&self, id: &str) -> Result<FocusSession, ApiError> {
        let path = format!("/focus/session/{}/resume", id);
        self.json(self.request(Method::PATCH, &path), &path).await
    }

    async fn end_session(&self, id: &str, request: &EndSessionRequest) -> Result<SessionSummary, ApiError> {
        let path = format!("/focus/session/{}/end", id);
        self.json(self.request(Method::POST, &path).json(request), &path).await
    }

    async fn log_distraction(&self, id: &str, kind: DistractionKind) -> Result<(), ApiError> {
        let path = format!("/focus/session/{}/distraction", id);
        let body = DistractionRequest { kind };
        self.send(self.request(Method::POST, &path).json(&body), &path).await?;
        Ok(())
    }

    async fn analytics(&self, days: u32) -> Result<FocusAnalytics, ApiError> {
        let path = "/focus/analytics";
        self.json(self.request(Method::GET, path).query(&[("days", days)]), path).await
    }
}
