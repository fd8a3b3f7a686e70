//! Lightweight Fallback
//!
//! Presence heuristic used while the landmark model is loading or after it
//! failed to load. Without keypoints there is no gaze signal, so the score
//! drifts up toward the ceiling as long as the camera delivers usable frames
//! and holds otherwise.

mod presence;

pub use presence::{HeuristicConfig, Presence, PresenceHeuristic};
