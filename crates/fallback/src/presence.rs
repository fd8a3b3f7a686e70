//! Frame-level presence assessment

use serde::{Deserialize, Serialize};
use tracing::debug;

/// What the heuristic could tell from a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Frame delivered with usable exposure
    Present,
    /// Frame delivered but too dark to be a lit scene (covered lens, lights off)
    Dark,
    /// Stream produced no frame this sample
    NoFrame,
}

/// Heuristic tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeuristicConfig {
    /// Points gained per present sample
    pub drift_step: f64,
    /// Upper bound of the drift
    pub ceiling: f64,
    /// Mean luma (0-255) below which a frame counts as dark
    pub dark_luma: f64,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            drift_step: 2.0,
            ceiling: 100.0,
            dark_luma: 12.0,
        }
    }
}

/// Lightweight-mode score source
#[derive(Debug, Clone, Default)]
pub struct PresenceHeuristic {
    config: HeuristicConfig,
    last: Option<Presence>,
}

impl PresenceHeuristic {
    pub fn new(config: HeuristicConfig) -> Self {
        Self { config, last: None }
    }

    /// Classify a sample from the frame's mean luma, if a frame arrived
    pub fn assess(&self, mean_luma: Option<f64>) -> Presence {
        match mean_luma {
            None => Presence::NoFrame,
            Some(luma) if !luma.is_finite() || luma < self.config.dark_luma => Presence::Dark,
            Some(_) => Presence::Present,
        }
    }

    /// Next score given the current one
    pub fn next_score(&mut self, current: f64, presence: Presence) -> f64 {
        if self.last != Some(presence) {
            debug!("Presence changed: {:?} -> {:?}", self.last, presence);
            self.last = Some(presence);
        }

        let current = if current.is_finite() {
            current.clamp(0.0, self.config.ceiling)
        } else {
            self.config.ceiling
        };

        match presence {
            Presence::Present => (current + self.config.drift_step).min(self.config.ceiling),
            Presence::Dark | Presence::NoFrame => current,
        }
    }

    pub fn config(&self) -> &HeuristicConfig {
        &self.config
    }
}
