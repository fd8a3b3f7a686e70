//! Best hour of day and weekday for focus

use std::collections::BTreeMap;

use chrono::{Datelike, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use session_api::SessionRecord;

use crate::{mean, RecommendationEngine};

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// When the user focuses best. Fields are `None` when no bucket has enough samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestFocusTime {
    /// Hour of day (0-23, UTC)
    pub best_hour: Option<u32>,
    pub best_hour_score: Option<f64>,
    pub best_day: Option<Weekday>,
    pub best_day_score: Option<f64>,
}

impl RecommendationEngine {
    /// Best-scoring hour and weekday, `None` with too little history
    pub fn best_focus_time(&self, sessions: &[SessionRecord]) -> Option<BestFocusTime> {
        if sessions.len() < self.config.min_best_time_sessions {
            return None;
        }

        let mut by_hour: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
        let mut by_day: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
        for session in sessions {
            let Some(score) = session.focus_score else {
                continue;
            };
            by_hour
                .entry(session.start_time.hour())
                .or_default()
                .push(f64::from(score));
            by_day
                .entry(session.start_time.weekday().num_days_from_monday())
                .or_default()
                .push(f64::from(score));
        }

        let (best_hour, best_hour_score) = self.best_bucket(&by_hour).unzip();
        let (best_day, best_day_score) = self.best_bucket(&by_day).unzip();

        Some(BestFocusTime {
            best_hour,
            best_hour_score,
            best_day: best_day.and_then(|d| WEEKDAYS.get(d as usize).copied()),
            best_day_score,
        })
    }

    fn best_bucket(&self, buckets: &BTreeMap<u32, Vec<f64>>) -> Option<(u32, f64)> {
        buckets
            .iter()
            .filter(|(_, scores)| scores.len() >= self.config.min_bucket_samples)
            .filter_map(|(&key, scores)| mean(scores.iter().copied()).map(|avg| (key, avg)))
            .fold(None, |best, (key, avg)| match best {
                Some((_, best_avg)) if best_avg >= avg => best,
                _ => Some((key, avg)),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{at, record};

    #[test]
    fn test_requires_five_sessions() {
        let engine = RecommendationEngine::default();
        let sessions: Vec<_> = (0..4).map(|i| record(at(2 + i, 9), 25, Some(80), true)).collect();
        assert_eq!(engine.best_focus_time(&sessions), None);
    }

    #[test]
    fn test_best_hour_and_day() {
        let engine = RecommendationEngine::default();
        let sessions = vec![
            // Monday mornings
            record(at(2, 9), 25, Some(90), true),
            record(at(9, 9), 25, Some(80), true),
            // Tuesday afternoons
            record(at(3, 15), 25, Some(50), true),
            record(at(10, 15), 25, Some(60), true),
            // Lone Wednesday evening: single sample, not eligible
            record(at(4, 20), 25, Some(100), true),
        ];

        let best = engine.best_focus_time(&sessions).unwrap();
        assert_eq!(best.best_hour, Some(9));
        assert_eq!(best.best_hour_score, Some(85.0));
        assert_eq!(best.best_day, Some(Weekday::Mon));
        assert_eq!(best.best_day_score, Some(85.0));
    }

    #[test]
    fn test_no_bucket_qualifies() {
        let engine = RecommendationEngine::default();
        let sessions: Vec<_> = (0..5)
            .map(|i| record(at(2 + i, 8 + i), 25, Some(70), true))
            .collect();

        let best = engine.best_focus_time(&sessions).unwrap();
        assert_eq!(best.best_hour, None);
        assert_eq!(best.best_day, None);
        assert_eq!(best.best_day_score, None);
    }
}
