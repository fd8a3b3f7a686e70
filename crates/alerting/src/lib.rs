//! Alerting System
//!
//! Provides per-type cooldown throttling for distraction events and
//! audio alerting (a short synthesized tone and a looping siren).

mod audio;
mod manager;

pub use audio::{AudioAlerts, AudioBackend, AudioError, AudioPolicy, LogAudio, Tone};
pub use manager::{AlertConfig, AlertManager};
