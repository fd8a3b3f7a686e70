//! Attention tracking configuration

use serde::{Deserialize, Serialize};

/// User-facing sensitivity preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Low,
    #[default]
    Medium,
    High,
}

/// Attention processor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttentionConfig {
    /// EAR below this counts as eyes closed
    pub ear_threshold: f64,

    /// Eyes closed this long after the last blink counts as drowsiness (milliseconds)
    pub drowsiness_threshold_ms: u64,

    /// Exponential smoothing factor for gaze offsets (weight of newest sample)
    pub smoothing_factor: f64,

    /// Fraction of the gap to the target score closed per sample
    pub score_transition_rate: f64,

    /// Smoothed deviation above which the user is looking away
    pub gaze_away_threshold: f64,

    /// Score below which a look-away is reported
    pub gaze_away_score: f64,

    /// Score band [min, max) reported as low focus
    pub low_focus_min: f64,
    pub low_focus_max: f64,

    /// Consecutive missing frames before `no_face` is reported
    pub no_face_event_frame: u32,

    /// Minimum spacing between two events of the same type (milliseconds)
    pub event_cooldown_ms: u64,

    /// History lengths
    pub ear_history_len: usize,
    pub gaze_history_len: usize,
    pub score_history_len: usize,
}

impl Default for AttentionConfig {
    fn default() -> Self {
        Self {
            ear_threshold: 0.3,
            drowsiness_threshold_ms: 3000,
            smoothing_factor: 0.3,
            score_transition_rate: 0.15,
            gaze_away_threshold: 0.45,
            gaze_away_score: 40.0,
            low_focus_min: 20.0,
            low_focus_max: 50.0,
            no_face_event_frame: 10,
            event_cooldown_ms: 5000,
            ear_history_len: 10,
            gaze_history_len: 10,
            score_history_len: 1000,
        }
    }
}

impl AttentionConfig {
    /// Create strict config (reports look-aways earlier and more often)
    pub fn strict() -> Self {
        Self {
            gaze_away_threshold: 0.35,
            event_cooldown_ms: 3000,
            ..Default::default()
        }
    }

    /// Create lenient config (tolerates wider head movement)
    pub fn lenient() -> Self {
        Self {
            gaze_away_threshold: 0.55,
            event_cooldown_ms: 8000,
            ..Default::default()
        }
    }

    pub fn for_sensitivity(sensitivity: Sensitivity) -> Self {
        match sensitivity {
            Sensitivity::Low => Self::lenient(),
            Sensitivity::Medium => Self::default(),
            Sensitivity::High => Self::strict(),
        }
    }
}
