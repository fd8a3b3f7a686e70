//! Attention Tracking
//!
//! Turns a stream of face-mesh keypoints into a bounded attention score and
//! throttled distraction events:
//! - Eye aspect ratio and edge-triggered blink counting
//! - Smoothed nose-tip gaze deviation mapped onto a banded score curve
//! - Staged score decay while the face is missing
//! - Eyes-closed drowsiness detection
//!
//! Only scalar metrics are kept; frames and keypoints are never retained.

pub mod config;
pub mod events;
pub mod landmarks;
pub mod metrics;

pub use config::{AttentionConfig, Sensitivity};
pub use events::{AttentionUpdate, DistractionEvent, DistractionKind, FrameOutcome};
pub use landmarks::{FaceLandmarks, FaceReading, GazeOffset, Keypoint};
pub use metrics::{AggregatedMetrics, AttentionMetrics, MetricsSnapshot};

use std::time::{Duration, Instant};

use alerting::{AlertConfig, AlertManager};
use thiserror::Error;
use tracing::{debug, info};

/// Landmark validation errors. The processor treats all of them as "no face".
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttentionError {
    #[error("Insufficient landmarks: expected {expected}, got {actual}")]
    InsufficientLandmarks { expected: usize, actual: usize },

    #[error("Landmark {0} has non-finite coordinates")]
    NonFinite(usize),

    #[error("Degenerate face geometry: {0}")]
    DegenerateFace(&'static str),
}

/// Staged no-face decay: (missing frames below, points lost per frame)
const NO_FACE_DECAY: [(u32, f64); 3] = [(5, 3.0), (15, 7.0), (30, 12.0)];
const NO_FACE_DECAY_MAX: f64 = 20.0;

/// Score points lost on a frame given the length of the absence so far
pub fn no_face_decay(missing_frames: u32) -> f64 {
    NO_FACE_DECAY
        .iter()
        .find(|(limit, _)| missing_frames < *limit)
        .map_or(NO_FACE_DECAY_MAX, |(_, decay)| *decay)
}

/// Banded deviation-to-score curve
pub fn target_score(deviation: f64) -> f64 {
    let d = deviation.max(0.0);
    let score = if d < 0.10 {
        100.0 - (d / 0.10) * 5.0
    } else if d < 0.20 {
        95.0 - ((d - 0.10) / 0.10) * 15.0
    } else if d < 0.35 {
        80.0 - ((d - 0.20) / 0.15) * 30.0
    } else if d < 0.50 {
        50.0 - ((d - 0.35) / 0.15) * 30.0
    } else {
        20.0 - ((d - 0.50) / 0.10) * 20.0
    };
    score.clamp(0.0, 100.0)
}

/// Attention signal processor for one tracking run
pub struct AttentionProcessor {
    config: AttentionConfig,
    metrics: AttentionMetrics,
    throttle: AlertManager<DistractionKind>,
    /// Consecutive frames without a usable face
    missing_frames: u32,
    /// Drowsiness already counted for the current eye closure
    drowsy_latched: bool,
    run_started_at: Option<Instant>,
    last_sample_at: Option<Instant>,
}

impl AttentionProcessor {
    pub fn new(config: AttentionConfig) -> Self {
        let throttle = AlertManager::new(AlertConfig {
            cooldown_ms: config.event_cooldown_ms,
        });
        Self {
            metrics: AttentionMetrics::new(&config),
            throttle,
            missing_frames: 0,
            drowsy_latched: false,
            run_started_at: None,
            last_sample_at: None,
            config,
        }
    }

    /// Process one sample. `None` or unusable landmarks count as a missing face.
    pub fn process_frame(&mut self, landmarks: Option<&FaceLandmarks>, now: Instant) -> FrameOutcome {
        self.mark_sample(now);
        let mut outcome = FrameOutcome::default();

        let reading = match landmarks.map(FaceLandmarks::read) {
            Some(Ok(reading)) => Some(reading),
            Some(Err(e)) => {
                debug!("Treating frame as no face: {}", e);
                None
            }
            None => None,
        };

        match reading {
            Some(reading) => self.process_face(reading, now, &mut outcome),
            None => self.process_missing_face(now, &mut outcome),
        }

        self.metrics.score_history.push(self.metrics.gaze_score);
        outcome.metrics = self.metrics.snapshot();
        outcome
    }

    /// Record a lightweight-mode score (no landmark model available)
    pub fn record_heuristic_score(&mut self, score: f64, now: Instant) -> MetricsSnapshot {
        self.mark_sample(now);
        self.missing_frames = 0;
        if score.is_finite() {
            self.metrics.gaze_score = score.clamp(0.0, 100.0);
        }
        self.metrics.score_history.push(self.metrics.gaze_score);
        self.metrics.snapshot()
    }

    fn process_face(&mut self, reading: FaceReading, now: Instant, outcome: &mut FrameOutcome) {
        if self.missing_frames > 0 {
            debug!("Face reacquired after {} missing frames", self.missing_frames);
        }
        self.missing_frames = 0;
        outcome.face_detected = true;

        let ear = reading.eye_aspect_ratio;
        self.update_blink(ear, now);
        if self.check_drowsiness(ear, now) {
            outcome.drowsy = true;
            self.emit(DistractionKind::Drowsy, now, None, outcome);
        }

        let deviation = self.smoothed_deviation(reading.gaze_offset);
        outcome.deviation = Some(deviation);

        let score = self.metrics.gaze_score;
        let target = target_score(deviation);
        self.metrics.gaze_score =
            (score + (target - score) * self.config.score_transition_rate).clamp(0.0, 100.0);

        self.evaluate_distraction(deviation, now, outcome);
    }

    fn process_missing_face(&mut self, now: Instant, outcome: &mut FrameOutcome) {
        self.missing_frames = self.missing_frames.saturating_add(1);
        let decay = no_face_decay(self.missing_frames);
        self.metrics.gaze_score = (self.metrics.gaze_score - decay).clamp(0.0, 100.0);

        if self.missing_frames == self.config.no_face_event_frame {
            self.emit(DistractionKind::NoFace, now, None, outcome);
        }
    }

    /// Count a blink on the open-to-closed edge only
    fn update_blink(&mut self, ear: f64, now: Instant) {
        let threshold = self.config.ear_threshold;
        if let Some(&previous) = self.metrics.ear_history.last() {
            if previous > threshold && ear < threshold {
                self.metrics.blink_count += 1;
                self.metrics.last_blink_at = Some(now);
            }
        }
        self.metrics.ear_history.push(ear);
    }

    fn check_drowsiness(&mut self, ear: f64, now: Instant) -> bool {
        if ear >= self.config.ear_threshold {
            self.drowsy_latched = false;
            return false;
        }
        if self.drowsy_latched {
            return false;
        }

        let closed_since = self
            .metrics
            .last_blink_at
            .or(self.run_started_at)
            .unwrap_or(now);
        let closed_for = now.saturating_duration_since(closed_since);
        if closed_for > Duration::from_millis(self.config.drowsiness_threshold_ms) {
            self.drowsy_latched = true;
            self.metrics.drowsiness_events += 1;
            info!(
                "Drowsiness detected: eyes closed for {}ms (events: {})",
                closed_for.as_millis(),
                self.metrics.drowsiness_events
            );
            true
        } else {
            false
        }
    }

    /// Exponentially weighted offset over the history, newest weighted highest
    fn smoothed_deviation(&mut self, offset: GazeOffset) -> f64 {
        self.metrics.gaze_history.push(offset);

        let alpha = self.config.smoothing_factor;
        let mut history = self.metrics.gaze_history.iter();
        let first = history.next().copied().unwrap_or(offset);
        let smoothed = history.fold(first, |acc, sample| GazeOffset {
            horizontal: alpha * sample.horizontal + (1.0 - alpha) * acc.horizontal,
            vertical: alpha * sample.vertical + (1.0 - alpha) * acc.vertical,
        });

        smoothed.magnitude()
    }

    fn evaluate_distraction(&mut self, deviation: f64, now: Instant, outcome: &mut FrameOutcome) {
        let score = self.metrics.gaze_score;

        if deviation > self.config.gaze_away_threshold && score < self.config.gaze_away_score {
            // Look-aways are only counted when the event gets past the throttle
            if self.emit(DistractionKind::GazeAway, now, Some(deviation), outcome) {
                self.metrics.look_away_count += 1;
            }
        } else if score >= self.config.low_focus_min && score < self.config.low_focus_max {
            self.emit(DistractionKind::LowFocus, now, Some(deviation), outcome);
        }
    }

    fn emit(
        &mut self,
        kind: DistractionKind,
        now: Instant,
        severity: Option<f64>,
        outcome: &mut FrameOutcome,
    ) -> bool {
        if !self.throttle.try_fire(kind, now) {
            return false;
        }

        let score = self.metrics.gaze_score.round() as i32;
        debug!("Distraction: {} (score {}, severity {:?})", kind, score, severity);
        outcome.events.push(DistractionEvent {
            kind,
            severity,
            score: Some(score),
            timestamp: now,
        });
        true
    }

    fn mark_sample(&mut self, now: Instant) {
        self.run_started_at.get_or_insert(now);
        self.last_sample_at = Some(now);
    }

    /// Current display snapshot
    pub fn current_metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Whole-run aggregate; zeros when nothing was recorded
    pub fn aggregated_metrics(&self) -> AggregatedMetrics {
        let Some(avg) = self.metrics.score_history.mean() else {
            return AggregatedMetrics::default();
        };

        let minutes = match (self.run_started_at, self.last_sample_at) {
            (Some(start), Some(end)) => end.saturating_duration_since(start).as_secs_f64() / 60.0,
            _ => 0.0,
        };
        let blink_rate_per_min = if minutes > 0.0 {
            (self.metrics.blink_count as f64 / minutes * 10.0).round() / 10.0
        } else {
            0.0
        };

        AggregatedMetrics {
            avg_gaze_score: avg.round() as u32,
            blink_rate_per_min,
            look_away_count: self.metrics.look_away_count,
            drowsiness_events: self.metrics.drowsiness_events,
            samples: self.metrics.score_history.len(),
        }
    }

    /// Clear counters, histories and throttle state for a new run
    pub fn reset(&mut self) {
        self.metrics = AttentionMetrics::new(&self.config);
        self.throttle.clear();
        self.missing_frames = 0;
        self.drowsy_latched = false;
        self.run_started_at = None;
        self.last_sample_at = None;
        debug!("Attention processor reset");
    }

    pub fn gaze_score(&self) -> f64 {
        self.metrics.gaze_score
    }

    pub fn missing_frames(&self) -> u32 {
        self.missing_frames
    }

    /// Read-only view of the live accumulator
    pub fn metrics(&self) -> &AttentionMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &AttentionConfig {
        &self.config
    }
}

impl Default for AttentionProcessor {
    fn default() -> Self {
        Self::new(AttentionConfig::default())
    }
}
