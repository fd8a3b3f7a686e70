//! Drives a recorded trace through the attention processor and a session

use std::time::{Duration, Instant};

use alerting::LogAudio;
use attention::{AggregatedMetrics, AttentionConfig, AttentionProcessor};
use focus_session::{ControllerConfig, FocusSessionController, Headless, Phase, StartRequest};
use recommendation::{BreakRecommendation, SessionRecommendation};
use serde::Serialize;
use session_api::{FocusApi, SessionSummary, SettingsPatch};
use tracing::{debug, info, warn};

use crate::config::ReplayConfig;
use crate::trace::{TraceEvent, TraceSample};
use crate::ReplayError;

/// Outcome of one replay
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub samples: usize,
    /// Samples that carried landmarks
    pub faces: usize,
    /// Work seconds counted down
    pub work_elapsed_secs: u64,
    pub completed_intervals: u32,
    pub final_phase: Phase,
    pub aggregate: AggregatedMetrics,
    pub recommendation: SessionRecommendation,
    pub break_recommendation: Option<BreakRecommendation>,
    pub summary: SessionSummary,
}

/// Replay `trace` against `api`.
///
/// Samples are processed at their recorded offsets and the countdown ticks
/// once per elapsed trace second, so a replay finishes as fast as the
/// processor runs.
pub async fn run<A: FocusApi>(
    config: &ReplayConfig,
    api: A,
    trace: &[TraceSample],
) -> Result<ReplayReport, ReplayError> {
    let mut controller = FocusSessionController::new(api, LogAudio, Box::new(Headless), ControllerConfig::default());
    controller.load_settings().await?;
    if let Some(strict) = config.strict_mode {
        controller
            .update_settings(&SettingsPatch {
                strict_mode: Some(strict),
                ..Default::default()
            })
            .await?;
    }

    let sensitivity = config
        .sensitivity
        .unwrap_or(controller.settings().attention_sensitivity);
    let mut processor = AttentionProcessor::new(AttentionConfig::for_sensitivity(sensitivity));
    info!("Replaying {} samples at {:?} sensitivity", trace.len(), sensitivity);

    controller
        .start_session(StartRequest {
            session_type: config.session_type,
            topic: config.topic.clone(),
            duration: config.duration,
            pomodoro: config.pomodoro,
        })
        .await?;

    let origin = Instant::now();
    let mut ticked_secs = 0u64;
    let mut faces = 0usize;

    for sample in trace {
        while ticked_secs < sample.t_ms / 1000 {
            if let Some(finished) = controller.tick() {
                info!("{:?} interval finished at {}s", finished, ticked_secs + 1);
            }
            ticked_secs += 1;
        }

        if let Some(event) = sample.event {
            apply_event(&mut controller, event, &config.route).await;
        }

        let face = sample.face();
        if face.is_some() {
            faces += 1;
        }
        let now = origin + Duration::from_millis(sample.t_ms);
        let outcome = processor.process_frame(face.as_ref(), now);
        for event in &outcome.events {
            debug!("t={}ms {} distraction", sample.t_ms, event.kind);
        }
        for update in outcome.into_updates() {
            controller.handle_attention(update).await;
        }
    }

    let aggregate = processor.aggregated_metrics();
    let recommendation = controller.session_recommendation();
    let break_recommendation = controller.break_recommendation();
    let work_elapsed_secs = controller.work_elapsed_secs();
    let completed_intervals = controller.completed_intervals();
    let summary = controller.end_session(config.mark_completed).await?;

    Ok(ReplayReport {
        samples: trace.len(),
        faces,
        work_elapsed_secs,
        completed_intervals,
        final_phase: controller.phase(),
        aggregate,
        recommendation,
        break_recommendation,
        summary,
    })
}

/// Events that don't fit the controller's current phase are skipped
async fn apply_event<A: FocusApi>(
    controller: &mut FocusSessionController<A, LogAudio>,
    event: TraceEvent,
    route: &str,
) {
    let result = match event {
        TraceEvent::TabHidden => {
            controller.visibility_changed(true, route).await;
            Ok(())
        }
        TraceEvent::TabVisible => {
            controller.visibility_changed(false, route).await;
            Ok(())
        }
        TraceEvent::FullscreenExit => {
            controller.fullscreen_changed(false, route);
            Ok(())
        }
        TraceEvent::FullscreenEnter => {
            controller.fullscreen_changed(true, route);
            Ok(())
        }
        TraceEvent::Pause => controller.pause().await,
        TraceEvent::Resume => controller.resume().await,
    };
    if let Err(e) = result {
        warn!("Skipping {:?}: {}", event, e);
    }
}
