//! Session Recommendations
//!
//! Stateless advice over session history and live attention metrics. The
//! engine never touches session state; the controller decides what to do
//! with its output.

mod best_time;
mod breaks;
mod durations;

pub use best_time::BestFocusTime;
pub use breaks::{BreakRecommendation, BreakType, SessionAction, SessionRecommendation, Urgency};
pub use durations::DurationRecommendation;

use serde::{Deserialize, Serialize};

/// How much history backs a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Recommendation thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationConfig {
    /// Sessions needed before durations adapt
    pub min_history: usize,
    /// Most recent sessions considered
    pub recent_window: usize,
    /// Samples needed for a duration/hour/weekday bucket to count
    pub min_bucket_samples: usize,
    /// Sessions needed for best-time analysis
    pub min_best_time_sessions: usize,
    /// Weight of the average score against the completion rate
    pub score_weight: f64,
    pub low_score: f64,
    pub high_score: f64,
    pub duration_step: u32,
    pub min_work_duration: u32,
    pub max_work_duration: u32,
    pub break_step: u32,
    pub max_break_duration: u32,
    /// No break advice before this many minutes
    pub break_grace_minutes: f64,
    pub break_low_gaze: u32,
    pub break_drowsiness: u32,
    pub strain_blink_rate: f64,
    pub strain_minutes: f64,
    pub hydration_minutes: f64,
    pub stretch_minutes: f64,
    pub continue_gaze: u32,
    pub break_gaze: u32,
    /// Seconds of work before low attention suggests a break
    pub break_after_secs: u64,
    pub stop_drowsiness: u32,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            min_history: 3,
            recent_window: 10,
            min_bucket_samples: 2,
            min_best_time_sessions: 5,
            score_weight: 0.7,
            low_score: 50.0,
            high_score: 80.0,
            duration_step: 5,
            min_work_duration: 15,
            max_work_duration: 60,
            break_step: 2,
            max_break_duration: 10,
            break_grace_minutes: 15.0,
            break_low_gaze: 50,
            break_drowsiness: 2,
            strain_blink_rate: 25.0,
            strain_minutes: 30.0,
            hydration_minutes: 45.0,
            stretch_minutes: 55.0,
            continue_gaze: 70,
            break_gaze: 40,
            break_after_secs: 1200,
            stop_drowsiness: 3,
        }
    }
}

/// Recommendation engine
#[derive(Debug, Clone, Default)]
pub struct RecommendationEngine {
    config: RecommendationConfig,
}

impl RecommendationEngine {
    pub fn new(config: RecommendationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RecommendationConfig {
        &self.config
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, TimeZone, Utc};
    use session_api::SessionRecord;

    /// 2026-03-02 is a Monday
    pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0)
            .single()
            .unwrap_or_default()
    }

    pub fn record(start: DateTime<Utc>, planned: u32, score: Option<u32>, completed: bool) -> SessionRecord {
        SessionRecord {
            id: format!("{}-{}", start.timestamp(), planned),
            start_time: start,
            planned_duration: planned,
            actual_duration: Some(planned),
            focus_score: score,
            completed,
            distraction_count: 0,
        }
    }
}
