//! In-memory single-user backend

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use attention::DistractionKind;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::types::{
    EndSessionRequest, FocusAnalytics, FocusSession, SessionRecord, SessionStatus, SessionSummary,
    SettingsPatch, SettingsSnapshot, StartSessionRequest,
};
use crate::{ApiError, FocusApi};

/// Max history records retained
const MAX_HISTORY: usize = 10_000;
/// Max distraction log entries retained, across sessions
pub const MAX_DISTRACTION_LOG: usize = 1_000;

struct OpenSession {
    session: FocusSession,
    distractions: u32,
}

#[derive(Default)]
struct MemoryState {
    settings: SettingsSnapshot,
    active: Option<OpenSession>,
    history: Vec<SessionRecord>,
    distraction_log: VecDeque<(String, DistractionKind)>,
    unavailable: bool,
}

/// Backend holding one user's sessions in memory.
///
/// Enforces a single open session and computes summaries the way a server
/// would. `set_unavailable` makes every call fail, for exercising error
/// paths.
#[derive(Default)]
pub struct InMemoryFocusApi {
    state: Mutex<MemoryState>,
}

impl InMemoryFocusApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: SettingsSnapshot) -> Self {
        let api = Self::default();
        if let Ok(mut state) = api.state.lock() {
            state.settings = settings;
        }
        api
    }

    /// Seed past sessions for analytics
    pub fn with_history(self, history: Vec<SessionRecord>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            info!("Seeding in-memory backend with {} sessions", history.len());
            state.history = history;
        }
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, ApiError> {
        let state = self
            .state
            .lock()
            .map_err(|e| ApiError::Unavailable(format!("Lock error: {}", e)))?;
        if state.unavailable {
            return Err(ApiError::Unavailable("backend offline".to_string()));
        }
        Ok(state)
    }

    /// Make every subsequent call fail (or succeed again)
    pub fn set_unavailable(&self, unavailable: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.unavailable = unavailable;
        }
    }

    /// Most recent distractions logged, oldest first
    pub fn distractions(&self) -> Vec<(String, DistractionKind)> {
        self.state
            .lock()
            .map(|s| s.distraction_log.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn history(&self) -> Vec<SessionRecord> {
        self.state.lock().map(|s| s.history.clone()).unwrap_or_default()
    }

    pub fn current_session(&self) -> Option<FocusSession> {
        self.state
            .lock()
            .ok()
            .and_then(|s| s.active.as_ref().map(|open| open.session.clone()))
    }
}

fn open_session<'a>(state: &'a mut MemoryState, id: &str) -> Result<&'a mut OpenSession, ApiError> {
    match state.active.as_mut() {
        Some(open) if open.session.id == id => Ok(open),
        _ => Err(ApiError::NotFound(format!("session {}", id))),
    }
}

fn elapsed_minutes(start: DateTime<Utc>) -> u32 {
    let minutes = (Utc::now() - start).num_minutes();
    u32::try_from(minutes.max(0)).unwrap_or(u32::MAX)
}

#[async_trait]
impl FocusApi for InMemoryFocusApi {
    async fn settings(&self) -> Result<SettingsSnapshot, ApiError> {
        Ok(self.lock()?.settings.clone())
    }

    async fn update_settings(&self, patch: &SettingsPatch) -> Result<SettingsSnapshot, ApiError> {
        let mut state = self.lock()?;
        state.settings.apply(patch);
        debug!("Settings updated: {:?}", patch);
        Ok(state.settings.clone())
    }

    async fn active_session(&self) -> Result<Option<FocusSession>, ApiError> {
        Ok(self.lock()?.active.as_ref().map(|open| open.session.clone()))
    }

    async fn start_session(&self, request: &StartSessionRequest) -> Result<FocusSession, ApiError> {
        let mut state = self.lock()?;
        if let Some(open) = &state.active {
            return Err(ApiError::Conflict(format!("session {} already active", open.session.id)));
        }

        let session = FocusSession {
            id: Uuid::new_v4().to_string(),
            status: SessionStatus::Active,
            start_time: Utc::now(),
            planned_duration: request.planned_duration,
            session_type: request.session_type,
            topic: request.topic.clone(),
        };
        info!("Session {} started ({} min)", session.id, session.planned_duration);
        state.active = Some(OpenSession {
            session: session.clone(),
            distractions: 0,
        });
        Ok(session)
    }

    async fn pause_session(&self, id: &str) -> Result<FocusSession, ApiError> {
        let mut state = self.lock()?;
        let open = open_session(&mut state, id)?;
        if open.session.status != SessionStatus::Active {
            return Err(ApiError::Conflict(format!("session {} is not active", id)));
        }
        open.session.status = SessionStatus::Paused;
        Ok(open.session.clone())
    }

    async fn resume_session(&self, id: &str) -> Result<FocusSession, ApiError> {
        let mut state = self.lock()?;
        let open = open_session(&mut state, id)?;
        if open.session.status != SessionStatus::Paused {
            return Err(ApiError::Conflict(format!("session {} is not paused", id)));
        }
        open.session.status = SessionStatus::Active;
        Ok(open.session.clone())
    }

    async fn end_session(&self, id: &str, request: &EndSessionRequest) -> Result<SessionSummary, ApiError> {
        let mut state = self.lock()?;
        open_session(&mut state, id)?;
        let Some(open) = state.active.take() else {
            return Err(ApiError::NotFound(format!("session {}", id)));
        };

        let duration = request
            .actual_duration
            .unwrap_or_else(|| elapsed_minutes(open.session.start_time));
        let summary = SessionSummary {
            duration,
            focus_score: request.focus_score.unwrap_or(0),
            distraction_count: open.distractions,
            completed: request.completed,
            topic: open.session.topic.clone(),
        };

        if state.history.len() >= MAX_HISTORY {
            state.history.remove(0);
        }
        state.history.push(SessionRecord {
            id: open.session.id.clone(),
            start_time: open.session.start_time,
            planned_duration: open.session.planned_duration,
            actual_duration: Some(duration),
            focus_score: request.focus_score,
            completed: request.completed,
            distraction_count: open.distractions,
        });

        info!(
            "Session {} ended: {} min, {} distractions, completed={}",
            id, duration, open.distractions, request.completed
        );
        Ok(summary)
    }

    async fn log_distraction(&self, id: &str, kind: DistractionKind) -> Result<(), ApiError> {
        let mut state = self.lock()?;
        open_session(&mut state, id)?.distractions += 1;
        if state.distraction_log.len() >= MAX_DISTRACTION_LOG {
            state.distraction_log.pop_front();
        }
        state.distraction_log.push_back((id.to_string(), kind));
        Ok(())
    }

    async fn analytics(&self, days: u32) -> Result<FocusAnalytics, ApiError> {
        let state = self.lock()?;
        let since = Utc::now() - ChronoDuration::days(i64::from(days));
        let sessions = state
            .history
            .iter()
            .filter(|record| record.start_time >= since)
            .cloned()
            .collect();
        Ok(FocusAnalytics::from_records(days, sessions))
    }
}
