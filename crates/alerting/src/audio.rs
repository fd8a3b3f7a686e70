//! Audio alerting: gentle tones and the warning siren

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Audio error types
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Siren sample failed to load: {0}")]
    SampleLoad(String),

    #[error("Playback failed: {0}")]
    Playback(String),
}

/// Synthesized oscillator tone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tone {
    pub frequency_hz: f32,
    pub duration_ms: u64,
    /// Output gain (0-1)
    pub gain: f32,
}

impl Tone {
    /// Short soft chime used for interval changes and drowsiness nudges
    pub fn gentle() -> Self {
        Self {
            frequency_hz: 880.0,
            duration_ms: 200,
            gain: 0.1,
        }
    }
}

/// Platform audio output
pub trait AudioBackend: Send {
    /// Play a synthesized tone once
    fn play_tone(&mut self, tone: Tone) -> Result<(), AudioError>;

    /// Start the looping siren sample
    fn start_siren(&mut self) -> Result<(), AudioError>;

    /// Stop the siren if it is playing
    fn stop_siren(&mut self);
}

/// User sound preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioPolicy {
    /// Master switch for all sounds
    pub sound_enabled: bool,
    /// Siren may be skipped independently of gentle tones
    pub siren_enabled: bool,
}

impl Default for AudioPolicy {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            siren_enabled: true,
        }
    }
}

/// Alert sound router. At most one siren plays at a time.
pub struct AudioAlerts<B> {
    backend: B,
    policy: AudioPolicy,
    siren_active: bool,
}

impl<B: AudioBackend> AudioAlerts<B> {
    pub fn new(backend: B, policy: AudioPolicy) -> Self {
        Self {
            backend,
            policy,
            siren_active: false,
        }
    }

    /// Play the gentle tone. Failures are logged, never raised.
    pub fn play_alert(&mut self) {
        if !self.policy.sound_enabled {
            return;
        }
        if let Err(e) = self.backend.play_tone(Tone::gentle()) {
            warn!("Gentle alert failed: {}", e);
        }
    }

    /// Start the siren. Re-entrant calls while it plays are no-ops.
    pub fn play_warning(&mut self) {
        if !self.policy.sound_enabled || !self.policy.siren_enabled {
            debug!("Siren skipped by user setting");
            return;
        }
        if self.siren_active {
            return;
        }
        match self.backend.start_siren() {
            Ok(()) => {
                info!("Warning siren started");
                self.siren_active = true;
            }
            Err(e) => warn!("Warning siren failed: {}", e),
        }
    }

    /// Stop the siren if it is playing
    pub fn stop_warning(&mut self) {
        if self.siren_active {
            self.backend.stop_siren();
            self.siren_active = false;
            info!("Warning siren stopped");
        }
    }

    pub fn is_siren_active(&self) -> bool {
        self.siren_active
    }

    /// Replace the policy; turning the siren off stops a playing one
    pub fn set_policy(&mut self, policy: AudioPolicy) {
        self.policy = policy;
        if !policy.sound_enabled || !policy.siren_enabled {
            self.stop_warning();
        }
    }

    pub fn policy(&self) -> AudioPolicy {
        self.policy
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

/// Backend that only logs; used by headless tools
#[derive(Debug, Default)]
pub struct LogAudio;

impl AudioBackend for LogAudio {
    fn play_tone(&mut self, tone: Tone) -> Result<(), AudioError> {
        info!("♪ tone {}Hz for {}ms", tone.frequency_hz, tone.duration_ms);
        Ok(())
    }

    fn start_siren(&mut self) -> Result<(), AudioError> {
        info!("siren on");
        Ok(())
    }

    fn stop_siren(&mut self) {
        info!("siren off");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        tones: usize,
        siren_starts: usize,
        siren_stops: usize,
        fail_siren: bool,
        fail_tone: bool,
    }

    impl AudioBackend for Recorder {
        fn play_tone(&mut self, _tone: Tone) -> Result<(), AudioError> {
            if self.fail_tone {
                return Err(AudioError::Playback("output device lost".into()));
            }
            self.tones += 1;
            Ok(())
        }

        fn start_siren(&mut self) -> Result<(), AudioError> {
            if self.fail_siren {
                return Err(AudioError::SampleLoad("siren.mp3".into()));
            }
            self.siren_starts += 1;
            Ok(())
        }

        fn stop_siren(&mut self) {
            self.siren_stops += 1;
        }
    }

    #[test]
    fn test_single_siren_instance() {
        let mut alerts = AudioAlerts::new(Recorder::default(), AudioPolicy::default());
        alerts.play_warning();
        alerts.play_warning();
        alerts.play_warning();

        assert!(alerts.is_siren_active());
        assert_eq!(alerts.backend().siren_starts, 1);

        alerts.stop_warning();
        alerts.stop_warning();
        assert_eq!(alerts.backend().siren_stops, 1);
    }

    #[test]
    fn test_siren_skippable() {
        let policy = AudioPolicy {
            sound_enabled: true,
            siren_enabled: false,
        };
        let mut alerts = AudioAlerts::new(Recorder::default(), policy);
        alerts.play_warning();
        alerts.play_alert();

        assert!(!alerts.is_siren_active());
        assert_eq!(alerts.backend().siren_starts, 0);
        assert_eq!(alerts.backend().tones, 1);
    }

    #[test]
    fn test_sound_disabled_mutes_everything() {
        let policy = AudioPolicy {
            sound_enabled: false,
            siren_enabled: true,
        };
        let mut alerts = AudioAlerts::new(Recorder::default(), policy);
        alerts.play_alert();
        alerts.play_warning();

        assert_eq!(alerts.backend().tones, 0);
        assert_eq!(alerts.backend().siren_starts, 0);
    }

    #[test]
    fn test_failed_siren_can_retry() {
        let backend = Recorder {
            fail_siren: true,
            ..Default::default()
        };
        let mut alerts = AudioAlerts::new(backend, AudioPolicy::default());
        alerts.play_warning();
        assert!(!alerts.is_siren_active());
    }

    #[test]
    fn test_failed_tone_is_not_raised() {
        let backend = Recorder {
            fail_tone: true,
            ..Default::default()
        };
        let mut alerts = AudioAlerts::new(backend, AudioPolicy::default());
        alerts.play_alert();
        assert_eq!(alerts.backend().tones, 0);

        // Siren is independent of the tone path
        alerts.play_warning();
        assert!(alerts.is_siren_active());
    }

    #[test]
    fn test_disabling_siren_stops_playback() {
        let mut alerts = AudioAlerts::new(Recorder::default(), AudioPolicy::default());
        alerts.play_warning();
        alerts.set_policy(AudioPolicy {
            sound_enabled: true,
            siren_enabled: false,
        });
        assert!(!alerts.is_siren_active());
        assert_eq!(alerts.backend().siren_stops, 1);
    }
}
