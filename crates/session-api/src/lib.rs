//! Focus Session Backend
//!
//! `FocusApi` is the contract between the session controller and the
//! backend that owns sessions, settings and analytics. Two implementations:
//! - `HttpFocusApi`: JSON over HTTP with bearer auth
//! - `InMemoryFocusApi`: single-user backend for tests and offline replays

pub mod http;
pub mod memory;
pub mod types;

pub use http::{ApiConfig, HttpFocusApi};
pub use memory::InMemoryFocusApi;
pub use types::{
    DistractionRequest, EndSessionRequest, FocusAnalytics, FocusSession, SessionRecord, SessionStatus,
    SessionSummary, SessionType, SettingsPatch, SettingsSnapshot, StartSessionRequest,
};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use attention::DistractionKind;
use thiserror::Error;

/// Backend error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Session backend contract
#[async_trait]
pub trait FocusApi: Send + Sync {
    async fn settings(&self) -> Result<SettingsSnapshot, ApiError>;

    async fn update_settings(&self, patch: &SettingsPatch) -> Result<SettingsSnapshot, ApiError>;

    /// The user's open session, if any
    async fn active_session(&self) -> Result<Option<FocusSession>, ApiError>;

    async fn start_session(&self, request: &StartSessionRequest) -> Result<FocusSession, ApiError>;

    async fn pause_session(&self, id: &str) -> Result<FocusSession, ApiError>;

    async fn resume_session(&self, id: &str) -> Result<FocusSession, ApiError>;

    async fn end_session(&self, id: &str, request: &EndSessionRequest) -> Result<SessionSummary, ApiError>;

    async fn log_distraction(&self, id: &str, kind: DistractionKind) -> Result<(), ApiError>;

    /// Sessions and totals for the last `days` days
    async fn analytics(&self, days: u32) -> Result<FocusAnalytics, ApiError>;
}

#[async_trait]
impl<T: FocusApi + ?Sized> FocusApi for Arc<T> {
    async fn settings(&self) -> Result<SettingsSnapshot, ApiError> {
        (**self).settings().await
    }

    async fn update_settings(&self, patch: &SettingsPatch) -> Result<SettingsSnapshot, ApiError> {
        (**self).update_settings(patch).await
    }

    async fn active_session(&self) -> Result<Option<FocusSession>, ApiError> {
        (**self).active_session().await
    }

    async fn start_session(&self, request: &StartSessionRequest) -> Result<FocusSession, ApiError> {
        (**self).start_session(request).await
    }

    async fn pause_session(&self, id: &str) -> Result<FocusSession, ApiError> {
        (**self).pause_session(id).await
    }

    async fn resume_session(&self, id: &str) -> Result<FocusSession, ApiError> {
        (**self).resume_session(id).await
    }

    async fn end_session(&self, id: &str, request: &EndSessionRequest) -> Result<SessionSummary, ApiError> {
        (**self).end_session(id, request).await
    }

    async fn log_distraction(&self, id: &str, kind: DistractionKind) -> Result<(), ApiError> {
        (**self).log_distraction(id, kind).await
    }

    async fn analytics(&self, days: u32) -> Result<FocusAnalytics, ApiError> {
        (**self).analytics(days).await
    }
}
