//! Break and continue/break/stop advice from live metrics

use attention::MetricsSnapshot;
use serde::{Deserialize, Serialize};
use session_api::SettingsSnapshot;

use crate::{Confidence, RecommendationEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakType {
    EyeRest,
    Walk,
    Hydration,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakRecommendation {
    pub break_type: BreakType,
    pub urgency: Urgency,
    /// Minutes
    pub duration: u32,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionAction {
    Continue,
    Break,
    Stop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecommendation {
    pub action: SessionAction,
    pub message: String,
    pub confidence: Confidence,
    pub break_recommendation: Option<BreakRecommendation>,
}

impl RecommendationEngine {
    /// Suggested break, if one is due. Never before the grace period.
    ///
    /// `metrics.blink_count` must cover the same span as `elapsed_minutes`.
    pub fn break_recommendation(
        &self,
        metrics: &MetricsSnapshot,
        elapsed_minutes: f64,
        settings: &SettingsSnapshot,
    ) -> Option<BreakRecommendation> {
        let cfg = &self.config;
        if !elapsed_minutes.is_finite() || elapsed_minutes < cfg.break_grace_minutes {
            return None;
        }

        let blink_rate = f64::from(metrics.blink_count) / elapsed_minutes;
        let short = settings.break_duration;

        let (break_type, urgency, duration, message) = if metrics.gaze_score < cfg.break_low_gaze {
            (
                BreakType::EyeRest,
                Urgency::Medium,
                short,
                "Your attention is drifting. Look at something far away for a moment.",
            )
        } else if metrics.drowsiness_events > cfg.break_drowsiness {
            (
                BreakType::Walk,
                Urgency::High,
                settings.long_break_duration.max(short),
                "You seem tired. A short walk will help you recharge.",
            )
        } else if blink_rate > cfg.strain_blink_rate && elapsed_minutes >= cfg.strain_minutes {
            (
                BreakType::EyeRest,
                Urgency::Medium,
                short,
                "Frequent blinking suggests eye strain. Rest your eyes.",
            )
        } else if elapsed_minutes >= cfg.hydration_minutes && elapsed_minutes < cfg.stretch_minutes {
            (
                BreakType::Hydration,
                Urgency::Low,
                short,
                "Time for a glass of water.",
            )
        } else if elapsed_minutes >= cfg.stretch_minutes {
            (
                BreakType::Stretch,
                Urgency::Low,
                short,
                "You've been sitting a while. Stand up and stretch.",
            )
        } else {
            return None;
        };

        Some(BreakRecommendation {
            break_type,
            urgency,
            duration,
            message: message.to_string(),
        })
    }

    /// Whether to keep going, take a break or stop
    pub fn session_recommendation(
        &self,
        metrics: &MetricsSnapshot,
        elapsed_seconds: u64,
        settings: &SettingsSnapshot,
    ) -> SessionRecommendation {
        let cfg = &self.config;

        if metrics.gaze_score >= cfg.continue_gaze {
            return SessionRecommendation {
                action: SessionAction::Continue,
                message: "Great focus. Keep going!".to_string(),
                confidence: Confidence::High,
                break_recommendation: None,
            };
        }

        if metrics.gaze_score < cfg.break_gaze && elapsed_seconds > cfg.break_after_secs {
            return SessionRecommendation {
                action: SessionAction::Break,
                message: "Your focus is dropping. A short break will help.".to_string(),
                confidence: Confidence::Medium,
                break_recommendation: self.break_recommendation(metrics, elapsed_seconds as f64 / 60.0, settings),
            };
        }

        if metrics.drowsiness_events > cfg.stop_drowsiness {
            return SessionRecommendation {
                action: SessionAction::Stop,
                message: "You're showing signs of fatigue. Consider ending for now.".to_string(),
                confidence: Confidence::High,
                break_recommendation: None,
            };
        }

        SessionRecommendation {
            action: SessionAction::Continue,
            message: "Keep going.".to_string(),
            confidence: Confidence::Low,
            break_recommendation: None,
        }
    }
}
