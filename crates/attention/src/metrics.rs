//! Attention metrics accumulated over a tracking run

use std::time::Instant;

use ring_buffer::RingBuffer;
use serde::{Deserialize, Serialize};

use crate::landmarks::GazeOffset;
use crate::AttentionConfig;

/// Live accumulator, owned by the processor for the length of one run
#[derive(Debug, Clone)]
pub struct AttentionMetrics {
    /// Smoothed attention score (0-100)
    pub gaze_score: f64,

    pub blink_count: u32,
    pub look_away_count: u32,
    pub drowsiness_events: u32,

    pub ear_history: RingBuffer<f64>,
    pub gaze_history: RingBuffer<GazeOffset>,
    pub score_history: RingBuffer<f64>,

    /// Last closing edge of the eyes
    pub last_blink_at: Option<Instant>,
}

impl AttentionMetrics {
    pub fn new(config: &AttentionConfig) -> Self {
        Self {
            gaze_score: 100.0,
            blink_count: 0,
            look_away_count: 0,
            drowsiness_events: 0,
            ear_history: RingBuffer::new(config.ear_history_len),
            gaze_history: RingBuffer::new(config.gaze_history_len),
            score_history: RingBuffer::new(config.score_history_len),
            last_blink_at: None,
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            gaze_score: self.gaze_score.round() as u32,
            blink_count: self.blink_count,
            look_away_count: self.look_away_count,
            drowsiness_events: self.drowsiness_events,
        }
    }
}

/// Display snapshot handed to consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub gaze_score: u32,
    pub blink_count: u32,
    pub look_away_count: u32,
    pub drowsiness_events: u32,
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self {
            gaze_score: 100,
            blink_count: 0,
            look_away_count: 0,
            drowsiness_events: 0,
        }
    }
}

/// Whole-run aggregate returned when tracking stops
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedMetrics {
    pub avg_gaze_score: u32,
    /// Blinks per minute, one decimal
    pub blink_rate_per_min: f64,
    pub look_away_count: u32,
    pub drowsiness_events: u32,
    /// Scores the average was computed from
    pub samples: usize,
}
