//! Session state machine

use alerting::{AudioAlerts, AudioBackend, AudioPolicy};
use attention::{AttentionUpdate, DistractionKind, MetricsSnapshot};
use chrono::Utc;
use recommendation::{BreakRecommendation, DurationRecommendation, RecommendationEngine, SessionRecommendation};
use serde::{Deserialize, Serialize};
use session_api::{
    EndSessionRequest, FocusApi, FocusSession, SessionStatus, SessionSummary, SessionType, SettingsPatch,
    SettingsSnapshot, StartSessionRequest,
};
use tracing::{debug, info, warn};

use crate::display::DisplayControl;
use crate::{ControllerConfig, SessionError};

/// Controller phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    /// Work countdown running
    Active,
    Paused,
    OnBreak,
    /// Between intervals, session still open
    Ready,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalKind {
    Work,
    Break,
}

/// Session start parameters
#[derive(Debug, Clone, PartialEq)]
pub struct StartRequest {
    pub session_type: SessionType,
    pub topic: Option<String>,
    /// Work interval in minutes
    pub duration: u32,
    /// Overrides the pomodoro setting for this session
    pub pomodoro: Option<bool>,
}

impl StartRequest {
    pub fn new(duration: u32) -> Self {
        Self {
            session_type: SessionType::Focus,
            topic: None,
            duration,
            pomodoro: None,
        }
    }
}

/// Focus session controller
pub struct FocusSessionController<A, B> {
    api: A,
    audio: AudioAlerts<B>,
    display: Box<dyn DisplayControl>,
    engine: RecommendationEngine,
    config: ControllerConfig,
    settings: SettingsSnapshot,

    session: Option<FocusSession>,
    phase: Phase,
    interval: IntervalKind,
    remaining_secs: u64,
    /// Break countdown started (non-pomodoro breaks wait for the user)
    break_running: bool,
    pomodoro: bool,
    completed_intervals: u32,
    work_elapsed_secs: u64,

    violation: bool,
    tab_hidden: bool,
    fullscreen_lost: bool,
    active_alert: Option<DistractionKind>,

    metrics: MetricsSnapshot,
    score_sum: u64,
    score_samples: u64,
    /// Blinks seen during work time, the time base of `work_elapsed_secs`
    work_blinks: u32,
    /// Raw blink counter of the last snapshot; restarts with each capture run
    last_blink_count: u32,
}

impl<A: FocusApi, B: AudioBackend> FocusSessionController<A, B> {
    pub fn new(api: A, audio: B, display: Box<dyn DisplayControl>, config: ControllerConfig) -> Self {
        let settings = SettingsSnapshot::default();
        let policy = audio_policy(&settings);
        Self {
            api,
            audio: AudioAlerts::new(audio, policy),
            display,
            engine: RecommendationEngine::default(),
            config,
            settings,
            session: None,
            phase: Phase::Idle,
            interval: IntervalKind::Work,
            remaining_secs: 0,
            break_running: false,
            pomodoro: false,
            completed_intervals: 0,
            work_elapsed_secs: 0,
            violation: false,
            tab_hidden: false,
            fullscreen_lost: false,
            active_alert: None,
            metrics: MetricsSnapshot::default(),
            score_sum: 0,
            score_samples: 0,
            work_blinks: 0,
            last_blink_count: 0,
        }
    }

    pub fn with_engine(mut self, engine: RecommendationEngine) -> Self {
        self.engine = engine;
        self
    }

    // ---- Settings ----

    /// Fetch settings from the backend and apply them
    pub async fn load_settings(&mut self) -> Result<&SettingsSnapshot, SessionError> {
        let settings = self.api.settings().await.map_err(|e| {
            warn!("Failed to load focus settings: {}", e);
            e
        })?;
        self.apply_settings(settings);
        Ok(&self.settings)
    }

    /// Patch settings on the backend; the local copy changes only on success
    pub async fn update_settings(&mut self, patch: &SettingsPatch) -> Result<&SettingsSnapshot, SessionError> {
        let settings = self.api.update_settings(patch).await.map_err(|e| {
            warn!("Failed to update focus settings: {}", e);
            e
        })?;
        self.apply_settings(settings);
        Ok(&self.settings)
    }

    fn apply_settings(&mut self, settings: SettingsSnapshot) {
        self.audio.set_policy(audio_policy(&settings));
        if !settings.strict_mode {
            self.clear_violation();
        }
        self.settings = settings;
        debug!("Focus settings applied: {:?}", self.settings);
    }

    // ---- Session lifecycle ----

    /// Adopt a session the backend reports as still open
    pub async fn restore_active(&mut self) -> Result<Option<&FocusSession>, SessionError> {
        let Some(session) = self.api.active_session().await? else {
            return Ok(None);
        };

        let total = u64::from(session.planned_duration) * 60;
        let elapsed = session_elapsed_secs(&session);
        self.begin(session, self.settings.pomodoro_mode);
        self.remaining_secs = total.saturating_sub(elapsed).max(1);
        self.work_elapsed_secs = elapsed.min(total);
        if self.session.as_ref().is_some_and(|s| s.status == SessionStatus::Paused) {
            self.phase = Phase::Paused;
        }
        info!("Restored open session with {}s remaining", self.remaining_secs);
        Ok(self.session.as_ref())
    }

    pub async fn start_session(&mut self, request: StartRequest) -> Result<&FocusSession, SessionError> {
        if !matches!(self.phase, Phase::Idle | Phase::Ended) {
            return Err(SessionError::InvalidTransition {
                phase: self.phase,
                action: "start",
            });
        }

        let api_request = StartSessionRequest {
            session_type: request.session_type,
            topic: request.topic.clone(),
            planned_duration: request.duration,
        };
        let session = self.api.start_session(&api_request).await.map_err(|e| {
            warn!("Failed to start session: {}", e);
            e
        })?;

        let pomodoro = request.pomodoro.unwrap_or(self.settings.pomodoro_mode);
        self.begin(session, pomodoro);

        if let Err(e) = self.display.request_fullscreen() {
            warn!("Fullscreen request failed: {}", e);
        }

        info!(
            "Focus session started: {} min, pomodoro={}",
            request.duration, self.pomodoro
        );
        self.session.as_ref().ok_or(SessionError::NoSession)
    }

    fn begin(&mut self, session: FocusSession, pomodoro: bool) {
        self.remaining_secs = u64::from(session.planned_duration) * 60;
        self.session = Some(session);
        self.phase = Phase::Active;
        self.interval = IntervalKind::Work;
        self.break_running = false;
        self.pomodoro = pomodoro;
        self.completed_intervals = 0;
        self.work_elapsed_secs = 0;
        self.score_sum = 0;
        self.score_samples = 0;
        self.work_blinks = 0;
        self.metrics = MetricsSnapshot::default();
        self.tab_hidden = false;
        self.fullscreen_lost = false;
        self.clear_violation();
    }

    pub async fn pause(&mut self) -> Result<(), SessionError> {
        if self.phase != Phase::Active {
            return Err(SessionError::InvalidTransition {
                phase: self.phase,
                action: "pause",
            });
        }
        let id = self.session_id()?;

        let session = self.api.pause_session(&id).await.map_err(|e| {
            warn!("Failed to pause session {}: {}", id, e);
            e
        })?;
        self.session = Some(session);
        self.phase = Phase::Paused;
        info!("Session paused with {}s remaining", self.remaining_secs);
        Ok(())
    }

    pub async fn resume(&mut self) -> Result<(), SessionError> {
        if self.phase != Phase::Paused {
            return Err(SessionError::InvalidTransition {
                phase: self.phase,
                action: "resume",
            });
        }
        let id = self.session_id()?;

        let session = self.api.resume_session(&id).await.map_err(|e| {
            warn!("Failed to resume session {}: {}", id, e);
            e
        })?;
        self.session = Some(session);
        self.phase = Phase::Active;
        info!("Session resumed with {}s remaining", self.remaining_secs);
        Ok(())
    }

    /// End the session and return the backend's summary
    pub async fn end_session(&mut self, completed: bool) -> Result<SessionSummary, SessionError> {
        if !matches!(
            self.phase,
            Phase::Active | Phase::Paused | Phase::OnBreak | Phase::Ready
        ) {
            return Err(SessionError::InvalidTransition {
                phase: self.phase,
                action: "end",
            });
        }
        let id = self.session_id()?;

        let request = EndSessionRequest {
            completed,
            focus_score: self.focus_score(),
            actual_duration: Some(minutes_rounded(self.work_elapsed_secs)),
        };
        let summary = self.api.end_session(&id, &request).await.map_err(|e| {
            warn!("Failed to end session {}: {}", id, e);
            e
        })?;

        self.session = None;
        self.phase = Phase::Ended;
        self.remaining_secs = 0;
        self.break_running = false;
        self.tab_hidden = false;
        self.fullscreen_lost = false;
        self.clear_violation();
        self.audio.stop_warning();
        self.display.exit_fullscreen();

        info!(
            "Session ended: {} min, score {}, {} distractions",
            summary.duration, summary.focus_score, summary.distraction_count
        );
        Ok(summary)
    }

    fn session_id(&self) -> Result<String, SessionError> {
        self.session
            .as_ref()
            .map(|s| s.id.clone())
            .ok_or(SessionError::NoSession)
    }

    /// Mean of the scores observed during work time
    fn focus_score(&self) -> Option<u32> {
        (self.score_samples > 0).then(|| {
            let avg = self.score_sum as f64 / self.score_samples as f64;
            avg.round() as u32
        })
    }

    // ---- Countdown ----

    /// Whether a tick would move the countdown
    pub fn is_counting_down(&self) -> bool {
        match self.phase {
            Phase::Active => true,
            Phase::OnBreak => self.break_running,
            _ => false,
        }
    }

    /// Advance the countdown by one second. Returns the interval that just
    /// finished, if any.
    pub fn tick(&mut self) -> Option<IntervalKind> {
        if !self.is_counting_down() {
            return None;
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.interval == IntervalKind::Work {
            self.work_elapsed_secs += 1;
        }

        if self.remaining_secs == 0 {
            let finished = self.interval;
            self.handle_timer_complete();
            Some(finished)
        } else {
            None
        }
    }

    /// Move to the next phase when an interval runs out
    pub fn handle_timer_complete(&mut self) {
        match self.interval {
            IntervalKind::Work => {
                self.completed_intervals += 1;
                let every = self.settings.sessions_before_long_break.max(1);
                let long = self.completed_intervals % every == 0;
                let minutes = if long {
                    self.settings.long_break_duration
                } else {
                    self.settings.break_duration
                };

                self.phase = Phase::OnBreak;
                self.interval = IntervalKind::Break;
                self.remaining_secs = u64::from(minutes.max(1)) * 60;
                self.break_running = self.pomodoro;
                self.end_violation_for_break();
                self.audio.play_alert();
                info!(
                    "Work interval {} complete, {} min {}break{}",
                    self.completed_intervals,
                    minutes,
                    if long { "long " } else { "" },
                    if self.pomodoro { "" } else { " waiting to start" }
                );
            }
            IntervalKind::Break => {
                self.phase = Phase::Ready;
                self.break_running = false;
                self.remaining_secs = 0;
                self.audio.play_alert();
                info!("Break complete");
                if self.pomodoro {
                    self.start_work_interval();
                }
            }
        }
    }

    /// Start a break that is waiting for the user
    pub fn start_break(&mut self) -> Result<(), SessionError> {
        if self.phase != Phase::OnBreak || self.break_running {
            return Err(SessionError::InvalidTransition {
                phase: self.phase,
                action: "start break",
            });
        }
        self.break_running = true;
        info!("Break started: {}s", self.remaining_secs);
        Ok(())
    }

    /// Cut the break short
    pub fn skip_break(&mut self) -> Result<(), SessionError> {
        if self.phase != Phase::OnBreak {
            return Err(SessionError::InvalidTransition {
                phase: self.phase,
                action: "skip break",
            });
        }
        info!("Break skipped");
        self.phase = Phase::Ready;
        self.break_running = false;
        self.remaining_secs = 0;
        if self.pomodoro {
            self.start_work_interval();
        }
        Ok(())
    }

    /// Start the next work interval after a break
    pub fn begin_next_interval(&mut self) -> Result<(), SessionError> {
        if self.phase != Phase::Ready {
            return Err(SessionError::InvalidTransition {
                phase: self.phase,
                action: "begin next interval",
            });
        }
        self.start_work_interval();
        Ok(())
    }

    fn start_work_interval(&mut self) {
        let minutes = self
            .session
            .as_ref()
            .map_or(self.settings.work_duration, |s| s.planned_duration);
        self.phase = Phase::Active;
        self.interval = IntervalKind::Work;
        self.remaining_secs = u64::from(minutes.max(1)) * 60;
        info!("Work interval {} started", self.completed_intervals + 1);
    }

    // ---- Strict mode ----

    fn strict_applies(&self, route: &str) -> bool {
        self.settings.strict_mode && self.phase == Phase::Active && !self.config.is_excluded(route)
    }

    /// Page visibility changed (tab switch)
    pub async fn visibility_changed(&mut self, hidden: bool, route: &str) {
        if !hidden {
            self.tab_hidden = false;
            self.resolve_violation();
            return;
        }
        if !self.strict_applies(route) {
            return;
        }

        self.tab_hidden = true;
        self.active_alert = Some(DistractionKind::TabSwitch);
        self.audio.play_warning();
        warn!("Strict mode: tab hidden on {}", route);
        self.log_distraction(DistractionKind::TabSwitch).await;
    }

    /// Fullscreen entered or exited
    pub fn fullscreen_changed(&mut self, active: bool, route: &str) {
        if active {
            self.fullscreen_lost = false;
            self.resolve_violation();
            return;
        }
        if !self.strict_applies(route) {
            return;
        }

        self.fullscreen_lost = true;
        self.violation = true;
        self.audio.play_warning();
        warn!("Strict mode: fullscreen exited on {}", route);
    }

    fn resolve_violation(&mut self) {
        if self.tab_hidden || self.fullscreen_lost {
            return;
        }
        if self.violation || self.active_alert.is_some() || self.audio.is_siren_active() {
            info!("Strict mode violation resolved");
            self.clear_violation();
        }
    }

    /// Strict mode does not apply during breaks, so nothing would resolve
    /// a violation carried over from the work interval
    fn end_violation_for_break(&mut self) {
        self.tab_hidden = false;
        self.fullscreen_lost = false;
        if self.violation || self.active_alert.is_some() || self.audio.is_siren_active() {
            info!("Strict mode violation cleared for break");
            self.clear_violation();
        }
    }

    fn clear_violation(&mut self) {
        self.violation = false;
        self.active_alert = None;
        self.audio.stop_warning();
    }

    // ---- Attention ----

    /// Route an update from the capture loop
    pub async fn handle_attention(&mut self, update: AttentionUpdate) {
        match update {
            AttentionUpdate::Metrics(snapshot) => {
                self.observe(snapshot);
                if self.phase == Phase::Active {
                    self.score_sum += u64::from(snapshot.gaze_score);
                    self.score_samples += 1;
                }
            }
            AttentionUpdate::Distraction(event) => {
                if self.phase != Phase::Active {
                    debug!("Ignoring {} outside active work", event.kind);
                    return;
                }
                self.audio.play_alert();
                self.log_distraction(event.kind).await;
            }
            AttentionUpdate::Drowsiness(snapshot) => {
                self.observe(snapshot);
                info!("Drowsiness detected ({} events)", snapshot.drowsiness_events);
                self.audio.play_alert();
            }
        }
    }

    fn observe(&mut self, snapshot: MetricsSnapshot) {
        let blinks = if snapshot.blink_count >= self.last_blink_count {
            snapshot.blink_count - self.last_blink_count
        } else {
            snapshot.blink_count
        };
        if self.phase == Phase::Active {
            self.work_blinks = self.work_blinks.saturating_add(blinks);
        }
        self.last_blink_count = snapshot.blink_count;
        self.metrics = snapshot;
    }

    /// Latest metrics with blinks restricted to work time
    fn work_metrics(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            blink_count: self.work_blinks,
            ..self.metrics
        }
    }

    /// Forward a distraction to the backend; failures are logged only
    async fn log_distraction(&self, kind: DistractionKind) {
        let Some(session) = &self.session else {
            return;
        };
        if let Err(e) = self.api.log_distraction(&session.id, kind).await {
            warn!("Failed to log {} distraction: {}", kind, e);
        }
    }

    // ---- Recommendations ----

    pub fn session_recommendation(&self) -> SessionRecommendation {
        self.engine
            .session_recommendation(&self.work_metrics(), self.work_elapsed_secs, &self.settings)
    }

    pub fn break_recommendation(&self) -> Option<BreakRecommendation> {
        self.engine
            .break_recommendation(&self.work_metrics(), self.work_elapsed_secs as f64 / 60.0, &self.settings)
    }

    /// Durations adapted to recent history
    pub async fn adaptive_durations(&self) -> Result<DurationRecommendation, SessionError> {
        let analytics = self.api.analytics(self.config.analytics_days).await.map_err(|e| {
            warn!("Failed to load analytics: {}", e);
            e
        })?;
        Ok(self.engine.adaptive_durations(&analytics.sessions, &self.settings))
    }

    // ---- Audio ----

    pub fn play_alert_sound(&mut self) {
        self.audio.play_alert();
    }

    pub fn play_warning_sound(&mut self) {
        self.audio.play_warning();
    }

    pub fn stop_warning_sound(&mut self) {
        self.audio.stop_warning();
    }

    // ---- Accessors ----

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn interval(&self) -> IntervalKind {
        self.interval
    }

    pub fn session(&self) -> Option<&FocusSession> {
        self.session.as_ref()
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn work_elapsed_secs(&self) -> u64 {
        self.work_elapsed_secs
    }

    pub fn completed_intervals(&self) -> u32 {
        self.completed_intervals
    }

    pub fn is_violation(&self) -> bool {
        self.violation
    }

    pub fn active_alert(&self) -> Option<DistractionKind> {
        self.active_alert
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics
    }

    pub fn settings(&self) -> &SettingsSnapshot {
        &self.settings
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn audio(&self) -> &AudioAlerts<B> {
        &self.audio
    }

    pub fn api(&self) -> &A {
        &self.api
    }
}

fn audio_policy(settings: &SettingsSnapshot) -> AudioPolicy {
    AudioPolicy {
        sound_enabled: settings.sound_enabled,
        siren_enabled: settings.siren_enabled,
    }
}

fn session_elapsed_secs(session: &FocusSession) -> u64 {
    let elapsed = (Utc::now() - session.start_time).num_seconds();
    u64::try_from(elapsed).unwrap_or(0)
}

fn minutes_rounded(secs: u64) -> u32 {
    u32::try_from((secs + 30) / 60).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{DisplayError, Headless};
    use alerting::{AudioError, Tone};
    use attention::DistractionEvent;
    use session_api::InMemoryFocusApi;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    #[derive(Default)]
    struct Sounds {
        tones: AtomicUsize,
        sirens: AtomicUsize,
        stops: AtomicUsize,
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Sounds>);

    impl AudioBackend for Recorder {
        fn play_tone(&mut self, _tone: Tone) -> Result<(), AudioError> {
            self.0.tones.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn start_siren(&mut self) -> Result<(), AudioError> {
            self.0.sirens.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn stop_siren(&mut self) {
            self.0.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Screen(Arc<AtomicUsize>);

    impl DisplayControl for Screen {
        fn request_fullscreen(&mut self) -> Result<(), DisplayError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(DisplayError::Denied)
        }

        fn exit_fullscreen(&mut self) {}
    }

    type Controller = FocusSessionController<Arc<InMemoryFocusApi>, Recorder>;

    fn controller() -> (Controller, Arc<InMemoryFocusApi>, Arc<Sounds>) {
        let api = Arc::new(InMemoryFocusApi::new());
        let sounds = Recorder::default();
        let handle = Arc::clone(&sounds.0);
        let controller = FocusSessionController::new(
            Arc::clone(&api),
            sounds,
            Box::new(Headless),
            ControllerConfig::default(),
        );
        (controller, api, handle)
    }

    fn tick_n(controller: &mut Controller, n: u64) {
        for _ in 0..n {
            controller.tick();
        }
    }

    fn distraction(kind: DistractionKind) -> AttentionUpdate {
        AttentionUpdate::Distraction(DistractionEvent::new(kind, Instant::now()))
    }

    #[tokio::test]
    async fn test_start_session() {
        let api = Arc::new(InMemoryFocusApi::new());
        let requests = Arc::new(AtomicUsize::new(0));
        let mut controller = FocusSessionController::new(
            Arc::clone(&api),
            Recorder::default(),
            Box::new(Screen(Arc::clone(&requests))),
            ControllerConfig::default(),
        );

        let session = controller.start_session(StartRequest::new(25)).await.unwrap();
        assert_eq!(session.planned_duration, 25);
        assert_eq!(controller.phase(), Phase::Active);
        assert_eq!(controller.remaining_secs(), 1500);
        // Denied fullscreen is not fatal
        assert_eq!(requests.load(Ordering::SeqCst), 1);

        assert!(matches!(
            controller.start_session(StartRequest::new(25)).await,
            Err(SessionError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_start_failure_leaves_idle() {
        let (mut controller, api, _) = controller();
        api.set_unavailable(true);

        assert!(matches!(
            controller.start_session(StartRequest::new(25)).await,
            Err(SessionError::Api(_))
        ));
        assert_eq!(controller.phase(), Phase::Idle);
        assert!(!controller.has_session());
        assert_eq!(controller.remaining_secs(), 0);
    }

    #[tokio::test]
    async fn test_pause_freezes_and_resume_continues() {
        let (mut controller, api, _) = controller();
        controller.start_session(StartRequest::new(25)).await.unwrap();

        tick_n(&mut controller, 300);
        assert_eq!(controller.remaining_secs(), 1200);

        controller.pause().await.unwrap();
        assert_eq!(controller.phase(), Phase::Paused);
        assert_eq!(
            api.current_session().map(|s| s.status),
            Some(SessionStatus::Paused)
        );

        tick_n(&mut controller, 120);
        assert_eq!(controller.remaining_secs(), 1200);

        controller.resume().await.unwrap();
        assert_eq!(controller.phase(), Phase::Active);
        assert_eq!(controller.remaining_secs(), 1200);

        controller.tick();
        assert_eq!(controller.remaining_secs(), 1199);
    }

    #[tokio::test]
    async fn test_pause_failure_keeps_running() {
        let (mut controller, api, _) = controller();
        controller.start_session(StartRequest::new(25)).await.unwrap();

        api.set_unavailable(true);
        assert!(matches!(controller.pause().await, Err(SessionError::Api(_))));
        assert_eq!(controller.phase(), Phase::Active);

        controller.tick();
        assert_eq!(controller.remaining_secs(), 1499);
    }

    #[tokio::test]
    async fn test_manual_break_flow() {
        let (mut controller, _, sounds) = controller();
        controller.start_session(StartRequest::new(1)).await.unwrap();

        tick_n(&mut controller, 59);
        assert_eq!(controller.tick(), Some(IntervalKind::Work));
        assert_eq!(controller.phase(), Phase::OnBreak);
        assert_eq!(controller.remaining_secs(), 300);
        assert_eq!(sounds.tones.load(Ordering::SeqCst), 1);

        // Break waits for the user
        tick_n(&mut controller, 10);
        assert_eq!(controller.remaining_secs(), 300);

        controller.start_break().unwrap();
        tick_n(&mut controller, 300);
        assert_eq!(controller.phase(), Phase::Ready);

        controller.begin_next_interval().unwrap();
        assert_eq!(controller.phase(), Phase::Active);
        assert_eq!(controller.remaining_secs(), 60);
        assert_eq!(controller.work_elapsed_secs(), 60);
    }

    #[tokio::test]
    async fn test_pomodoro_cycle_with_long_break() {
        let (mut controller, _, _) = controller();
        controller
            .start_session(StartRequest {
                pomodoro: Some(true),
                ..StartRequest::new(1)
            })
            .await
            .unwrap();

        for interval in 1..=3 {
            tick_n(&mut controller, 60);
            assert_eq!(controller.phase(), Phase::OnBreak, "interval {}", interval);
            assert_eq!(controller.remaining_secs(), 300);
            tick_n(&mut controller, 300);
            assert_eq!(controller.phase(), Phase::Active);
        }

        tick_n(&mut controller, 60);
        assert_eq!(controller.completed_intervals(), 4);
        assert_eq!(controller.remaining_secs(), 15 * 60);
    }

    #[tokio::test]
    async fn test_skip_break() {
        let (mut controller, _, _) = controller();
        controller.start_session(StartRequest::new(1)).await.unwrap();
        tick_n(&mut controller, 60);

        controller.skip_break().unwrap();
        assert_eq!(controller.phase(), Phase::Ready);
        assert!(controller.skip_break().is_err());
    }

    #[tokio::test]
    async fn test_end_session() {
        let (mut controller, api, sounds) = controller();
        controller.start_session(StartRequest::new(25)).await.unwrap();
        tick_n(&mut controller, 600);

        for score in [80, 90] {
            controller
                .handle_attention(AttentionUpdate::Metrics(MetricsSnapshot {
                    gaze_score: score,
                    ..Default::default()
                }))
                .await;
        }
        controller.play_warning_sound();

        let summary = controller.end_session(false).await.unwrap();
        assert_eq!(summary.duration, 10);
        assert_eq!(summary.focus_score, 85);
        assert!(!summary.completed);

        assert_eq!(controller.phase(), Phase::Ended);
        assert!(!controller.has_session());
        assert_eq!(controller.remaining_secs(), 0);
        assert_eq!(sounds.stops.load(Ordering::SeqCst), 1);
        assert_eq!(api.history().len(), 1);

        // Stale ticks after the end do nothing
        assert_eq!(controller.tick(), None);

        // A new session can start after the end
        controller.start_session(StartRequest::new(25)).await.unwrap();
        assert_eq!(controller.phase(), Phase::Active);
    }

    #[tokio::test]
    async fn test_end_failure_keeps_session() {
        let (mut controller, api, _) = controller();
        controller.start_session(StartRequest::new(25)).await.unwrap();

        api.set_unavailable(true);
        assert!(controller.end_session(true).await.is_err());
        assert_eq!(controller.phase(), Phase::Active);
        assert!(controller.has_session());
    }

    #[tokio::test]
    async fn test_strict_mode_tab_switch() {
        let (mut controller, api, sounds) = controller();
        controller.start_session(StartRequest::new(25)).await.unwrap();

        controller.visibility_changed(true, "/focus").await;
        assert_eq!(controller.active_alert(), Some(DistractionKind::TabSwitch));
        assert!(controller.audio().is_siren_active());
        assert_eq!(api.distractions().len(), 1);
        assert_eq!(api.distractions()[0].1, DistractionKind::TabSwitch);

        controller.visibility_changed(false, "/focus").await;
        assert_eq!(controller.active_alert(), None);
        assert!(!controller.audio().is_siren_active());
        assert_eq!(sounds.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_strict_mode_fullscreen_violation() {
        let (mut controller, _, sounds) = controller();
        controller.start_session(StartRequest::new(25)).await.unwrap();

        controller.fullscreen_changed(false, "/focus");
        assert!(controller.is_violation());
        assert_eq!(sounds.sirens.load(Ordering::SeqCst), 1);

        // Tab switch while in violation: one siren at a time
        controller.visibility_changed(true, "/focus").await;
        assert_eq!(sounds.sirens.load(Ordering::SeqCst), 1);

        // Only one of the two resolved
        controller.fullscreen_changed(true, "/focus");
        assert!(controller.audio().is_siren_active());

        controller.visibility_changed(false, "/focus").await;
        assert!(!controller.is_violation());
        assert!(!controller.audio().is_siren_active());
    }

    #[tokio::test]
    async fn test_break_clears_strict_mode_violation() {
        let (mut controller, _, sounds) = controller();
        controller.start_session(StartRequest::new(1)).await.unwrap();

        controller.fullscreen_changed(false, "/focus");
        controller.visibility_changed(true, "/focus").await;
        assert!(controller.audio().is_siren_active());

        tick_n(&mut controller, 60);
        assert_eq!(controller.phase(), Phase::OnBreak);
        assert!(!controller.is_violation());
        assert_eq!(controller.active_alert(), None);
        assert!(!controller.audio().is_siren_active());
        assert_eq!(sounds.stops.load(Ordering::SeqCst), 1);

        // Returning to the page during the break stays quiet
        controller.visibility_changed(false, "/focus").await;
        controller.fullscreen_changed(true, "/focus");
        assert_eq!(sounds.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_strict_mode_not_enforced() {
        let (mut controller, api, sounds) = controller();
        controller.start_session(StartRequest::new(25)).await.unwrap();

        // Excluded public route
        controller.visibility_changed(true, "/pricing").await;
        controller.fullscreen_changed(false, "/public/catalog");
        assert!(!controller.is_violation());

        // Paused
        controller.pause().await.unwrap();
        controller.fullscreen_changed(false, "/focus");
        assert!(!controller.is_violation());
        controller.resume().await.unwrap();

        // Strict mode off
        controller
            .update_settings(&SettingsPatch {
                strict_mode: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();
        controller.visibility_changed(true, "/focus").await;

        assert_eq!(sounds.sirens.load(Ordering::SeqCst), 0);
        assert!(api.distractions().is_empty());
    }

    #[tokio::test]
    async fn test_siren_respects_setting() {
        let (mut controller, _, sounds) = controller();
        controller
            .update_settings(&SettingsPatch {
                siren_enabled: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();
        controller.start_session(StartRequest::new(25)).await.unwrap();

        controller.fullscreen_changed(false, "/focus");
        assert!(controller.is_violation());
        assert_eq!(sounds.sirens.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_distractions_forwarded_only_while_active() {
        let (mut controller, api, sounds) = controller();
        controller.start_session(StartRequest::new(25)).await.unwrap();

        controller.handle_attention(distraction(DistractionKind::GazeAway)).await;
        assert_eq!(api.distractions().len(), 1);
        assert_eq!(sounds.tones.load(Ordering::SeqCst), 1);

        controller.pause().await.unwrap();
        controller.handle_attention(distraction(DistractionKind::NoFace)).await;
        assert_eq!(api.distractions().len(), 1);
    }

    #[tokio::test]
    async fn test_distraction_log_failure_is_not_fatal() {
        let (mut controller, api, _) = controller();
        controller.start_session(StartRequest::new(25)).await.unwrap();

        api.set_unavailable(true);
        controller.handle_attention(distraction(DistractionKind::LowFocus)).await;
        assert_eq!(controller.phase(), Phase::Active);
    }

    #[tokio::test]
    async fn test_drowsiness_plays_gentle_tone() {
        let (mut controller, _, sounds) = controller();
        let snapshot = MetricsSnapshot {
            drowsiness_events: 1,
            ..Default::default()
        };
        controller.handle_attention(AttentionUpdate::Drowsiness(snapshot)).await;
        assert_eq!(sounds.tones.load(Ordering::SeqCst), 1);
        assert_eq!(controller.metrics().drowsiness_events, 1);
    }

    #[tokio::test]
    async fn test_recommendations_from_cached_metrics() {
        let (mut controller, _, _) = controller();
        controller.start_session(StartRequest::new(50)).await.unwrap();
        tick_n(&mut controller, 1300);

        controller
            .handle_attention(AttentionUpdate::Metrics(MetricsSnapshot {
                gaze_score: 30,
                ..Default::default()
            }))
            .await;

        let rec = controller.session_recommendation();
        assert_eq!(rec.action, recommendation::SessionAction::Break);
        assert!(controller.break_recommendation().is_some());
    }

    #[tokio::test]
    async fn test_blink_rate_counts_work_time_only() {
        let (mut controller, _, _) = controller();
        controller.start_session(StartRequest::new(60)).await.unwrap();
        let blinks = |count| {
            AttentionUpdate::Metrics(MetricsSnapshot {
                gaze_score: 80,
                blink_count: count,
                ..Default::default()
            })
        };

        tick_n(&mut controller, 15 * 60);
        controller.handle_attention(blinks(300)).await;

        // Blinks during the pause don't count toward the work rate
        controller.pause().await.unwrap();
        controller.handle_attention(blinks(1200)).await;
        controller.resume().await.unwrap();

        tick_n(&mut controller, 15 * 60);
        controller.handle_attention(blinks(1500)).await;

        // 600 work blinks over 30 work minutes: 20/min, below the strain rate
        assert_eq!(controller.work_elapsed_secs(), 30 * 60);
        assert_eq!(controller.break_recommendation(), None);

        // Another 300 in the next minute crosses 25/min
        tick_n(&mut controller, 60);
        controller.handle_attention(blinks(1800)).await;
        let rec = controller.break_recommendation().unwrap();
        assert_eq!(rec.break_type, recommendation::BreakType::EyeRest);
    }

    #[tokio::test]
    async fn test_adaptive_durations_from_backend() {
        let (controller, _, _) = controller();
        let rec = controller.adaptive_durations().await.unwrap();
        assert_eq!(rec.confidence, recommendation::Confidence::Low);
        assert_eq!(rec.work_duration, 25);
    }

    #[tokio::test]
    async fn test_restore_active_session() {
        let (mut controller, api, _) = controller();
        api.start_session(&StartSessionRequest {
            session_type: SessionType::DeepWork,
            topic: None,
            planned_duration: 45,
        })
        .await
        .unwrap();

        let restored = controller.restore_active().await.unwrap();
        assert_eq!(restored.map(|s| s.planned_duration), Some(45));
        assert_eq!(controller.phase(), Phase::Active);
        assert!(controller.remaining_secs() > 44 * 60);
    }
}
