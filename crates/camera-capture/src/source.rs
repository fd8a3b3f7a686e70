//! Camera, sink and landmark-model seams
//!
//! The device and the landmark network live outside the engine; the capture
//! loop only talks to them through these traits.

use async_trait::async_trait;
use attention::FaceLandmarks;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::frame::VideoFrame;
use crate::{CameraError, ModelError};

/// Requested stream properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConstraints {
    pub width: u32,
    pub height: u32,
    /// Front-facing camera
    pub facing_user: bool,
}

impl Default for StreamConstraints {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            facing_user: true,
        }
    }
}

/// Source of camera streams
#[async_trait]
pub trait CameraSource: Send + Sync {
    async fn acquire(&self, constraints: StreamConstraints) -> Result<Box<dyn MediaStream>, CameraError>;
}

/// A live camera stream
pub trait MediaStream: Send {
    fn id(&self) -> &str;

    /// Most recent frame, if the stream has produced one
    fn latest_frame(&mut self) -> Option<VideoFrame>;

    /// Release the device. Must tolerate repeated calls.
    fn stop_tracks(&mut self);
}

/// Preview surface the stream is shown on
pub trait VideoSink: Send {
    fn attach(&mut self, stream: &dyn MediaStream);
    fn detach(&mut self);
}

/// Face-mesh estimator
pub trait LandmarkModel: Send {
    /// Keypoints of the first face in the frame
    fn estimate(&mut self, frame: &VideoFrame) -> Result<Option<FaceLandmarks>, ModelError>;
}

/// Loads the landmark model in the background
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self) -> Result<Box<dyn LandmarkModel>, ModelError>;
}

/// Owns a stream and stops its tracks on every exit path
pub struct StreamGuard {
    stream: Box<dyn MediaStream>,
}

impl StreamGuard {
    pub fn new(stream: Box<dyn MediaStream>) -> Self {
        Self { stream }
    }

    pub fn latest_frame(&mut self) -> Option<VideoFrame> {
        self.stream.latest_frame()
    }

    pub fn stream(&self) -> &dyn MediaStream {
        self.stream.as_ref()
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.stream.stop_tracks();
        debug!("Camera stream {} released", self.stream.id());
    }
}
