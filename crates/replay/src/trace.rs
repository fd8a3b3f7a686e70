//! Recorded landmark traces
//!
//! A trace is a JSON array of samples in capture order:
//!
//! ```json
//! [
//!   { "t_ms": 0, "landmarks": [{ "x": 151.2, "y": 98.4 }, ...] },
//!   { "t_ms": 150, "landmarks": null },
//!   { "t_ms": 300, "landmarks": null, "event": "tab_hidden" }
//! ]
//! ```

use std::fs;
use std::path::Path;

use attention::{FaceLandmarks, Keypoint};
use serde::{Deserialize, Serialize};

use crate::ReplayError;

/// Page or user event recorded alongside a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceEvent {
    TabHidden,
    TabVisible,
    FullscreenExit,
    FullscreenEnter,
    Pause,
    Resume,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceSample {
    /// Milliseconds since the trace started
    pub t_ms: u64,
    /// `null` when the model found no face
    #[serde(default)]
    pub landmarks: Option<Vec<Keypoint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<TraceEvent>,
}

impl TraceSample {
    pub fn face(&self) -> Option<FaceLandmarks> {
        self.landmarks.clone().map(FaceLandmarks::new)
    }
}

pub fn parse_trace(json: &str) -> Result<Vec<TraceSample>, ReplayError> {
    let samples: Vec<TraceSample> = serde_json::from_str(json)?;
    if samples.is_empty() {
        return Err(ReplayError::EmptyTrace);
    }
    if let Some(index) = samples
        .windows(2)
        .position(|pair| pair[1].t_ms < pair[0].t_ms)
    {
        return Err(ReplayError::OutOfOrder { index: index + 1 });
    }
    Ok(samples)
}

pub fn load_trace(path: &Path) -> Result<Vec<TraceSample>, ReplayError> {
    let json = fs::read_to_string(path)?;
    parse_trace(&json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_samples() {
        let samples = parse_trace(
            r#"[
                { "t_ms": 0, "landmarks": [{ "x": 1.0, "y": 2.0 }, { "x": 3.0, "y": 4.0, "z": -0.5 }] },
                { "t_ms": 150, "landmarks": null },
                { "t_ms": 300, "event": "tab_hidden" }
            ]"#,
        )
        .unwrap();

        assert_eq!(samples.len(), 3);
        let first = samples[0].landmarks.as_ref().unwrap();
        assert_eq!(first[0], Keypoint::new(1.0, 2.0));
        assert_eq!(first[1].z, -0.5);
        assert!(samples[0].face().is_some());
        assert!(samples[1].face().is_none());
        assert_eq!(samples[2].landmarks, None);
        assert_eq!(samples[2].event, Some(TraceEvent::TabHidden));
    }

    #[test]
    fn test_rejects_empty_trace() {
        assert!(matches!(parse_trace("[]"), Err(ReplayError::EmptyTrace)));
    }

    #[test]
    fn test_rejects_out_of_order_timestamps() {
        let result = parse_trace(r#"[{ "t_ms": 0 }, { "t_ms": 300 }, { "t_ms": 150 }]"#);
        assert!(matches!(result, Err(ReplayError::OutOfOrder { index: 2 })));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(parse_trace("{"), Err(ReplayError::Trace(_))));
    }
}
