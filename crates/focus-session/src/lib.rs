//! Focus Session Controller
//!
//! Drives one user's focus session:
//! - Work/break countdown with pomodoro auto-advance and long breaks
//! - Pause/resume/end confirmed by the backend before local state changes
//! - Strict mode (tab switches and fullscreen exits raise the siren)
//! - Routing of attention updates to alerts and the distraction log

pub mod controller;
pub mod display;
pub mod timer;

pub use controller::{FocusSessionController, IntervalKind, Phase, StartRequest};
pub use display::{DisplayControl, DisplayError, Headless};
pub use timer::SessionTimer;

use serde::{Deserialize, Serialize};
use session_api::ApiError;
use thiserror::Error;

/// Controller error types
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Backend call failed: {0}")]
    Api(#[from] ApiError),

    #[error("Cannot {action} while {phase:?}")]
    InvalidTransition { phase: Phase, action: &'static str },

    #[error("No open session")]
    NoSession,
}

/// Controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Public routes where strict mode is not enforced. A route matches an
    /// entry exactly or as a path prefix.
    pub excluded_routes: Vec<String>,
    /// History window used for adaptive durations
    pub analytics_days: u32,
    /// Countdown tick period
    pub tick_interval_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            excluded_routes: ["/login", "/register", "/pricing", "/about", "/public"]
                .iter()
                .map(|r| r.to_string())
                .collect(),
            analytics_days: 30,
            tick_interval_ms: 1000,
        }
    }
}

impl ControllerConfig {
    /// Strict mode enforced on every route
    pub fn strict() -> Self {
        Self {
            excluded_routes: Vec::new(),
            ..Self::default()
        }
    }

    pub fn is_excluded(&self, route: &str) -> bool {
        self.excluded_routes.iter().any(|excluded| {
            route == excluded
                || route
                    .strip_prefix(excluded.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excluded_routes() {
        let config = ControllerConfig::default();
        assert!(config.is_excluded("/login"));
        assert!(config.is_excluded("/public/courses"));
        assert!(!config.is_excluded("/publicity"));
        assert!(!config.is_excluded("/focus"));
        assert!(!ControllerConfig::strict().is_excluded("/login"));
    }
}
