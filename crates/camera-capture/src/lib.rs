//! Camera Capture
//!
//! Owns the camera for the length of a tracking run and samples it on a
//! fixed-delay schedule:
//! - Idempotent start with a single device acquisition
//! - Lightweight presence scoring while the landmark model loads
//! - Switch to full landmark processing once the model is ready
//! - Device release on every exit path

pub mod capture;
pub mod frame;
pub mod source;

pub use capture::{CaptureLoop, StartOptions, TrackingMode};
pub use frame::VideoFrame;
pub use source::{CameraSource, LandmarkModel, MediaStream, ModelLoader, StreamConstraints, StreamGuard, VideoSink};

use attention::{AttentionConfig, Sensitivity};
use fallback::HeuristicConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Camera permission denied")]
    PermissionDenied,

    #[error("No camera device found")]
    NotFound,

    /// Device present but could not be opened (for example, in use elsewhere)
    #[error("Failed to open camera: {0}")]
    Open(String),
}

/// Landmark model error types
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to load model: {0}")]
    Load(String),

    #[error("Inference failed: {0}")]
    Inference(String),
}

/// Capture loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Requested capture width
    pub width: u32,
    /// Requested capture height
    pub height: u32,
    /// Delay between the end of one sample and the start of the next
    pub sample_interval_ms: u64,
    /// Capacity of the update channel; updates are dropped when full
    pub channel_capacity: usize,
    pub attention: AttentionConfig,
    pub heuristic: HeuristicConfig,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            sample_interval_ms: 150,
            channel_capacity: 64,
            attention: AttentionConfig::default(),
            heuristic: HeuristicConfig::default(),
        }
    }
}

impl CaptureConfig {
    /// Defaults with attention thresholds for the given sensitivity
    pub fn with_sensitivity(sensitivity: Sensitivity) -> Self {
        Self {
            attention: AttentionConfig::for_sensitivity(sensitivity),
            ..Self::default()
        }
    }

    pub fn constraints(&self) -> StreamConstraints {
        StreamConstraints {
            width: self.width,
            height: self.height,
            facing_user: true,
        }
    }
}
