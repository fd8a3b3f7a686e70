//! Fullscreen control

use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("Fullscreen request denied")]
    Denied,

    #[error("Fullscreen not supported")]
    Unsupported,
}

/// Host display the session runs in
pub trait DisplayControl: Send {
    fn request_fullscreen(&mut self) -> Result<(), DisplayError>;
    fn exit_fullscreen(&mut self);
}

/// No display attached; fullscreen is never available
#[derive(Debug, Default)]
pub struct Headless;

impl DisplayControl for Headless {
    fn request_fullscreen(&mut self) -> Result<(), DisplayError> {
        debug!("Headless display: fullscreen unsupported");
        Err(DisplayError::Unsupported)
    }

    fn exit_fullscreen(&mut self) {}
}
