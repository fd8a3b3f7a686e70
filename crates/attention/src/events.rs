//! Distraction events and the update stream delivered to consumers

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::metrics::MetricsSnapshot;

/// Distraction event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistractionKind {
    /// Sustained head/gaze deviation with a low score
    GazeAway,

    /// Face missing from the camera (camera blocked, user left)
    NoFace,

    /// Score in the moderate band without a full look-away
    LowFocus,

    /// Focus tab hidden
    TabSwitch,

    /// Application window lost focus
    AppSwitch,

    /// Eyes closed too long
    Drowsy,
}

impl DistractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistractionKind::GazeAway => "gaze_away",
            DistractionKind::NoFace => "no_face",
            DistractionKind::LowFocus => "low_focus",
            DistractionKind::TabSwitch => "tab_switch",
            DistractionKind::AppSwitch => "app_switch",
            DistractionKind::Drowsy => "drowsy",
        }
    }
}

impl fmt::Display for DistractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transient distraction event, forwarded and never stored
#[derive(Debug, Clone, PartialEq)]
pub struct DistractionEvent {
    pub kind: DistractionKind,
    /// Smoothed deviation at emission
    pub severity: Option<f64>,
    /// Rounded score at emission
    pub score: Option<i32>,
    pub timestamp: Instant,
}

impl DistractionEvent {
    pub fn new(kind: DistractionKind, timestamp: Instant) -> Self {
        Self {
            kind,
            severity: None,
            score: None,
            timestamp,
        }
    }
}

/// Result of processing one sample
#[derive(Debug, Clone, Default)]
pub struct FrameOutcome {
    /// Whether usable landmarks were present
    pub face_detected: bool,

    /// Smoothed gaze deviation (present only with a face)
    pub deviation: Option<f64>,

    /// Events that passed the throttle, in emission order
    pub events: Vec<DistractionEvent>,

    /// Drowsiness raised on this sample
    pub drowsy: bool,

    /// Metrics after processing
    pub metrics: MetricsSnapshot,
}

impl FrameOutcome {
    /// Flatten into consumer updates: events and drowsiness first, metrics last
    pub fn into_updates(self) -> Vec<AttentionUpdate> {
        let mut updates: Vec<AttentionUpdate> = self
            .events
            .into_iter()
            .map(AttentionUpdate::Distraction)
            .collect();
        if self.drowsy {
            updates.push(AttentionUpdate::Drowsiness(self.metrics));
        }
        updates.push(AttentionUpdate::Metrics(self.metrics));
        updates
    }
}

/// Push stream delivered to the session controller and UI
#[derive(Debug, Clone, PartialEq)]
pub enum AttentionUpdate {
    Metrics(MetricsSnapshot),
    Distraction(DistractionEvent),
    Drowsiness(MetricsSnapshot),
}
