//! Wire types shared by every backend

use attention::{DistractionKind, Sensitivity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-side session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Paused,
    Break,
    Completed,
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    #[default]
    Focus,
    Pomodoro,
    DeepWork,
}

/// Client mirror of a server session; ids always come from the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusSession {
    pub id: String,
    pub status: SessionStatus,
    pub start_time: DateTime<Utc>,
    /// Minutes
    pub planned_duration: u32,
    pub session_type: SessionType,
    #[serde(default)]
    pub topic: Option<String>,
}

/// User focus settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsSnapshot {
    pub work_duration: u32,
    pub break_duration: u32,
    pub long_break_duration: u32,
    pub sessions_before_long_break: u32,
    pub pomodoro_mode: bool,
    pub strict_mode: bool,
    pub camera_tracking: bool,
    pub sound_enabled: bool,
    pub siren_enabled: bool,
    pub attention_sensitivity: Sensitivity,
}

impl Default for SettingsSnapshot {
    fn default() -> Self {
        Self {
            work_duration: 25,
            break_duration: 5,
            long_break_duration: 15,
            sessions_before_long_break: 4,
            pomodoro_mode: false,
            strict_mode: true,
            camera_tracking: true,
            sound_enabled: true,
            siren_enabled: true,
            attention_sensitivity: Sensitivity::Medium,
        }
    }
}

impl SettingsSnapshot {
    /// Apply the fields present in a patch
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(value) = patch.work_duration {
            self.work_duration = value;
        }
        if let Some(value) = patch.break_duration {
            self.break_duration = value;
        }
        if let Some(value) = patch.long_break_duration {
            self.long_break_duration = value;
        }
        if let Some(value) = patch.sessions_before_long_break {
            self.sessions_before_long_break = value;
        }
        if let Some(value) = patch.pomodoro_mode {
            self.pomodoro_mode = value;
        }
        if let Some(value) = patch.strict_mode {
            self.strict_mode = value;
        }
        if let Some(value) = patch.camera_tracking {
            self.camera_tracking = value;
        }
        if let Some(value) = patch.sound_enabled {
            self.sound_enabled = value;
        }
        if let Some(value) = patch.siren_enabled {
            self.siren_enabled = value;
        }
        if let Some(value) = patch.attention_sensitivity {
            self.attention_sensitivity = value;
        }
    }
}

/// Partial settings update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_break_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sessions_before_long_break: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pomodoro_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_tracking: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub siren_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attention_sensitivity: Option<Sensitivity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartSessionRequest {
    pub session_type: SessionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Minutes
    pub planned_duration: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndSessionRequest {
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_score: Option<u32>,
    /// Minutes of work time actually spent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_duration: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistractionRequest {
    #[serde(rename = "type")]
    pub kind: DistractionKind,
}

/// Result of ending a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Minutes
    pub duration: u32,
    pub focus_score: u32,
    pub distraction_count: u32,
    pub completed: bool,
    #[serde(default)]
    pub topic: Option<String>,
}

/// Past session as reported by analytics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub planned_duration: u32,
    #[serde(default)]
    pub actual_duration: Option<u32>,
    #[serde(default)]
    pub focus_score: Option<u32>,
    pub completed: bool,
    #[serde(default)]
    pub distraction_count: u32,
}

/// Analytics window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusAnalytics {
    pub days: u32,
    pub total_sessions: u32,
    pub completed_sessions: u32,
    /// Minutes
    pub total_focus_time: u32,
    pub average_focus_score: Option<f64>,
    pub sessions: Vec<SessionRecord>,
}

impl FocusAnalytics {
    /// Build the window totals from its records
    pub fn from_records(days: u32, sessions: Vec<SessionRecord>) -> Self {
        let scores: Vec<f64> = sessions
            .iter()
            .filter_map(|s| s.focus_score.map(f64::from))
            .collect();
        let average_focus_score = if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        };

        Self {
            days,
            total_sessions: sessions.len() as u32,
            completed_sessions: sessions.iter().filter(|s| s.completed).count() as u32,
            total_focus_time: sessions.iter().filter_map(|s| s.actual_duration).sum(),
            average_focus_score,
            sessions,
        }
    }
}
