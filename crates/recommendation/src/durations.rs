//! Adaptive work/break durations from session history

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use session_api::{SessionRecord, SettingsSnapshot};
use tracing::debug;

use crate::{mean, Confidence, RecommendationEngine};

/// Suggested interval lengths in minutes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationRecommendation {
    pub work_duration: u32,
    pub break_duration: u32,
    pub confidence: Confidence,
    pub reason: String,
    pub insights: Vec<String>,
}

#[derive(Default)]
struct DurationBucket {
    scores: Vec<f64>,
    completed: usize,
}

impl DurationBucket {
    fn weighted_score(&self, score_weight: f64) -> Option<f64> {
        let avg = mean(self.scores.iter().copied())?;
        let completion_rate = self.completed as f64 / self.scores.len() as f64;
        Some(score_weight * avg + (1.0 - score_weight) * completion_rate * 100.0)
    }
}

impl RecommendationEngine {
    /// Work and break durations adapted to how past sessions went
    pub fn adaptive_durations(&self, past: &[SessionRecord], settings: &SettingsSnapshot) -> DurationRecommendation {
        let cfg = &self.config;

        if past.len() < cfg.min_history {
            return DurationRecommendation {
                work_duration: settings.work_duration,
                break_duration: settings.break_duration,
                confidence: Confidence::Low,
                reason: format!(
                    "Complete at least {} sessions to get personalised durations",
                    cfg.min_history
                ),
                insights: Vec::new(),
            };
        }

        let mut recent: Vec<&SessionRecord> = past.iter().collect();
        recent.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        recent.truncate(cfg.recent_window);

        let mut buckets: BTreeMap<u32, DurationBucket> = BTreeMap::new();
        for session in &recent {
            if let Some(score) = session.focus_score {
                let bucket = buckets.entry(session.planned_duration).or_default();
                bucket.scores.push(f64::from(score));
                if session.completed {
                    bucket.completed += 1;
                }
            }
        }

        let best = buckets
            .iter()
            .filter(|(_, bucket)| bucket.scores.len() >= cfg.min_bucket_samples)
            .filter_map(|(&duration, bucket)| {
                bucket
                    .weighted_score(cfg.score_weight)
                    .map(|score| (duration, score))
            })
            .fold(None, |best: Option<(u32, f64)>, (duration, score)| match best {
                Some((_, best_score)) if best_score >= score => best,
                _ => Some((duration, score)),
            });

        let mut insights = Vec::new();
        let mut work_duration = settings.work_duration;
        let mut break_duration = settings.break_duration;
        let mut reason = match best {
            Some((duration, score)) => {
                work_duration = duration;
                insights.push(format!("{}-minute sessions perform best (weighted score {:.0})", duration, score));
                format!("Your {}-minute sessions have the best focus and completion", duration)
            }
            None => "Not enough repeated session lengths yet, keeping your settings".to_string(),
        };

        let recent_avg = mean(recent.iter().filter_map(|s| s.focus_score.map(f64::from)));
        if let Some(avg) = recent_avg {
            if avg < cfg.low_score {
                work_duration = work_duration
                    .saturating_sub(cfg.duration_step)
                    .max(cfg.min_work_duration);
                break_duration = (break_duration + cfg.break_step).min(cfg.max_break_duration);
                insights.push(format!("Recent focus averages {:.0}", avg));
                reason = "Recent focus has been low, so sessions are shorter with longer breaks".to_string();
            } else if avg > cfg.high_score {
                work_duration = (work_duration + cfg.duration_step).min(cfg.max_work_duration);
                insights.push(format!("Recent focus averages {:.0}", avg));
                reason = "Recent focus has been strong, so sessions are a little longer".to_string();
            }
        }

        let confidence = if recent.len() >= cfg.recent_window {
            Confidence::High
        } else {
            Confidence::Medium
        };

        debug!(
            "Adaptive durations: work {} break {} ({:?}, {} recent sessions)",
            work_duration,
            break_duration,
            confidence,
            recent.len()
        );

        DurationRecommendation {
            work_duration,
            break_duration,
            confidence,
            reason,
            insights,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{at, record};

    #[test]
    fn test_defaults_below_three_sessions() {
        let engine = RecommendationEngine::default();
        let settings = SettingsSnapshot {
            work_duration: 40,
            break_duration: 8,
            ..Default::default()
        };

        for count in 0..3u32 {
            let past: Vec<_> = (0..count)
                .map(|i| record(at(2 + i, 9), 25, Some(95), true))
                .collect();
            let rec = engine.adaptive_durations(&past, &settings);
            assert_eq!(rec.confidence, Confidence::Low);
            assert_eq!(rec.work_duration, 40);
            assert_eq!(rec.break_duration, 8);
        }
    }

    #[test]
    fn test_best_duration_wins() {
        let engine = RecommendationEngine::default();
        let past = vec![
            record(at(2, 9), 25, Some(60), true),
            record(at(3, 9), 25, Some(62), false),
            record(at(4, 9), 45, Some(75), true),
            record(at(5, 9), 45, Some(78), true),
            // Single sample: not eligible
            record(at(6, 9), 60, Some(100), true),
        ];

        let rec = engine.adaptive_durations(&past, &SettingsSnapshot::default());
        // Recent average 75: no adjustment
        assert_eq!(rec.work_duration, 45);
        assert_eq!(rec.break_duration, 5);
        assert_eq!(rec.confidence, Confidence::Medium);
        assert!(!rec.insights.is_empty());
    }

    #[test]
    fn test_low_scores_shorten_work_and_lengthen_break() {
        let engine = RecommendationEngine::default();
        let past = vec![
            record(at(2, 9), 20, Some(30), false),
            record(at(3, 9), 20, Some(40), true),
            record(at(4, 9), 20, Some(35), false),
        ];
        let settings = SettingsSnapshot {
            break_duration: 9,
            ..Default::default()
        };

        let rec = engine.adaptive_durations(&past, &settings);
        // 20 - 5 = 15 (floor), 9 + 2 capped at 10
        assert_eq!(rec.work_duration, 15);
        assert_eq!(rec.break_duration, 10);
    }

    #[test]
    fn test_high_scores_lengthen_work_with_cap() {
        let engine = RecommendationEngine::default();
        let past: Vec<_> = (0..10)
            .map(|i| record(at(2 + i, 9), 60, Some(90), true))
            .collect();

        let rec = engine.adaptive_durations(&past, &SettingsSnapshot::default());
        assert_eq!(rec.work_duration, 60);
        assert_eq!(rec.confidence, Confidence::High);
    }

    #[test]
    fn test_only_most_recent_ten_count() {
        let engine = RecommendationEngine::default();
        let mut past: Vec<_> = (0..10)
            .map(|i| record(at(10 + i, 9), 30, Some(70), true))
            .collect();
        // Older sessions with a better-looking duration fall outside the window
        past.extend((0..5).map(|i| record(at(2 + i, 9), 50, Some(100), true)));

        let rec = engine.adaptive_durations(&past, &SettingsSnapshot::default());
        assert_eq!(rec.work_duration, 30);
    }

    #[test]
    fn test_unscored_sessions_keep_settings() {
        let engine = RecommendationEngine::default();
        let past: Vec<_> = (0..4).map(|i| record(at(2 + i, 9), 30, None, true)).collect();

        let rec = engine.adaptive_durations(&past, &SettingsSnapshot::default());
        assert_eq!(rec.work_duration, 25);
        assert_eq!(rec.break_duration, 5);
        assert_eq!(rec.confidence, Confidence::Medium);
    }
}
