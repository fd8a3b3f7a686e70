//! Alert Manager Implementation

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::{Duration, Instant};
use tracing::debug;

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Cooldown period between alerts of the same type (milliseconds)
    pub cooldown_ms: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self { cooldown_ms: 5000 }
    }
}

impl AlertConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

/// Last time an alert type fired
#[derive(Debug, Clone)]
struct AlertState {
    last_fired: Instant,
}

/// Per-type cooldown throttle.
///
/// Timestamps are passed in by the caller so that replayed or simulated
/// streams throttle exactly like live ones.
#[derive(Debug, Clone)]
pub struct AlertManager<K> {
    config: AlertConfig,
    states: HashMap<K, AlertState>,
}

impl<K> AlertManager<K>
where
    K: Copy + Eq + Hash + Debug,
{
    /// Create a new alert manager
    pub fn new(config: AlertConfig) -> Self {
        Self {
            config,
            states: HashMap::new(),
        }
    }

    /// Check whether an alert of this type is outside its cooldown window
    pub fn should_fire(&self, kind: K, now: Instant) -> bool {
        match self.states.get(&kind) {
            Some(state) => {
                let elapsed = now.saturating_duration_since(state.last_fired);
                if elapsed < self.config.cooldown() {
                    debug!("Alert {:?} suppressed: in cooldown ({:?} elapsed)", kind, elapsed);
                    false
                } else {
                    true
                }
            }
            None => true,
        }
    }

    /// Record that an alert was fired
    pub fn record_fire(&mut self, kind: K, now: Instant) {
        self.states.insert(kind, AlertState { last_fired: now });
        debug!("Alert recorded: {:?}", kind);
    }

    /// Check and record in one step; returns whether the alert fired
    pub fn try_fire(&mut self, kind: K, now: Instant) -> bool {
        if self.should_fire(kind, now) {
            self.record_fire(kind, now);
            true
        } else {
            false
        }
    }

    /// Clear all alert states
    pub fn clear(&mut self) {
        self.states.clear();
    }
}

impl<K> Default for AlertManager<K>
where
    K: Copy + Eq + Hash + Debug,
{
    fn default() -> Self {
        Self::new(AlertConfig::default())
    }
}
