//! Focus Replay
//!
//! Offline driver for the focus engine: feeds a recorded landmark trace
//! through the attention processor and a focus session, then reports the
//! aggregate, the backend summary and the closing recommendations.

pub mod cli;
pub mod config;
pub mod runner;
pub mod trace;

pub use cli::Cli;
pub use config::{Backend, ReplayConfig};
pub use runner::{run, ReplayReport};
pub use trace::{load_trace, parse_trace, TraceEvent, TraceSample};

use focus_session::SessionError;
use session_api::ApiError;
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Replay error types
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid trace: {0}")]
    Trace(#[from] serde_json::Error),

    #[error("Trace has no samples")]
    EmptyTrace,

    #[error("Trace timestamps go backwards at sample {index}")]
    OutOfOrder { index: usize },

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Backend error: {0}")]
    Api(#[from] ApiError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Initialize logging to stderr, leaving stdout for the report
pub fn init_logging(level: &str, json: bool) -> Result<(), ReplayError> {
    let level: Level = level
        .parse()
        .map_err(|_| ReplayError::InvalidConfig(format!("unknown log level '{}'", level)))?;
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    let result = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.map_err(|e| ReplayError::Logging(e.to_string()))
}
