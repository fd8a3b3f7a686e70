//! Replay configuration
//!
//! Layered from an optional `focus-replay.toml` (or an explicit file) and
//! `FOCUS_REPLAY__*` environment variables, e.g.
//! `FOCUS_REPLAY__API__BASE_URL=https://learn.example.com/api`.

use std::path::Path;

use attention::Sensitivity;
use serde::{Deserialize, Serialize};
use session_api::{ApiConfig, SessionType};

use crate::ReplayError;

const DEFAULT_FILE: &str = "focus-replay";
const ENV_PREFIX: &str = "FOCUS_REPLAY";

/// Where sessions are recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Memory,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub backend: Backend,
    pub api: ApiConfig,

    /// Overrides the backend's sensitivity setting
    pub sensitivity: Option<Sensitivity>,
    /// Overrides the backend's strict mode setting
    pub strict_mode: Option<bool>,

    pub session_type: SessionType,
    pub topic: Option<String>,
    /// Work interval in minutes
    pub duration: u32,
    pub pomodoro: Option<bool>,
    /// Reported to the backend when the trace ends
    pub mark_completed: bool,
    /// Route reported with strict mode events
    pub route: String,

    pub log_level: String,
    pub log_json: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            api: ApiConfig::default(),
            sensitivity: None,
            strict_mode: None,
            session_type: SessionType::Focus,
            topic: None,
            duration: 25,
            pomodoro: None,
            mark_completed: true,
            route: "/focus".to_string(),
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl ReplayConfig {
    /// Load from `path` if given (must exist), else from `focus-replay.toml`
    /// in the working directory if present, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ReplayError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_FILE).required(false),
        };

        let settings = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let loaded: Self = settings.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    pub fn validate(&self) -> Result<(), ReplayError> {
        if self.duration == 0 {
            return Err(ReplayError::InvalidConfig("duration must be at least 1 minute".into()));
        }
        if self.log_level.parse::<tracing::Level>().is_err() {
            return Err(ReplayError::InvalidConfig(format!(
                "unknown log level '{}'",
                self.log_level
            )));
        }
        Ok(())
    }
}
