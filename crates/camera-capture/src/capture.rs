//! Fixed-delay attention sampling loop

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use attention::{AggregatedMetrics, AttentionProcessor, AttentionUpdate};
use fallback::PresenceHeuristic;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info, warn};

use crate::source::{CameraSource, LandmarkModel, ModelLoader, StreamGuard, VideoSink};
use crate::{CaptureConfig, ModelError};

/// Which scorer the running loop uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingMode {
    Off,
    /// Presence heuristic only
    Lightweight,
    /// Landmark model
    Full,
}

/// Per-run start options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StartOptions {
    /// Skip loading the landmark model for this run
    pub lightweight_mode: bool,
}

type PendingModel = JoinHandle<Result<Box<dyn LandmarkModel>, ModelError>>;

enum LoopState {
    Idle,
    Starting {
        generation: u64,
    },
    Running {
        stop: oneshot::Sender<()>,
        task: JoinHandle<AggregatedMetrics>,
        sink: Box<dyn VideoSink>,
    },
}

/// Camera sampling loop
pub struct CaptureLoop {
    config: CaptureConfig,
    camera: Arc<dyn CameraSource>,
    loader: Arc<dyn ModelLoader>,
    updates: mpsc::Sender<AttentionUpdate>,
    state: Mutex<LoopState>,
    generation: AtomicU64,
    mode: Arc<watch::Sender<TrackingMode>>,
}

impl CaptureLoop {
    /// Create the loop and the receiving end of its update channel
    pub fn new(
        config: CaptureConfig,
        camera: Arc<dyn CameraSource>,
        loader: Arc<dyn ModelLoader>,
    ) -> (Self, mpsc::Receiver<AttentionUpdate>) {
        let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
        let (mode, _) = watch::channel(TrackingMode::Off);

        let capture = Self {
            config,
            camera,
            loader,
            updates: tx,
            state: Mutex::new(LoopState::Idle),
            generation: AtomicU64::new(0),
            mode: Arc::new(mode),
        };
        (capture, rx)
    }

    fn lock_state(&self) -> MutexGuard<'_, LoopState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquire the camera and start sampling.
    ///
    /// Returns false when a run is already starting or running, when the
    /// camera could not be acquired, or when `stop` was called while the
    /// acquisition was pending.
    pub async fn start(&self, mut sink: Box<dyn VideoSink>, options: StartOptions) -> bool {
        let generation = {
            let mut state = self.lock_state();
            if !matches!(*state, LoopState::Idle) {
                debug!("Capture already starting or running");
                return false;
            }
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *state = LoopState::Starting { generation };
            generation
        };

        let constraints = self.config.constraints();
        info!("Acquiring camera at {}x{}", constraints.width, constraints.height);

        let stream = match self.camera.acquire(constraints).await {
            Ok(stream) => stream,
            Err(e) => {
                error!("Camera acquisition failed: {}", e);
                let mut state = self.lock_state();
                if matches!(*state, LoopState::Starting { generation: g } if g == generation) {
                    *state = LoopState::Idle;
                }
                return false;
            }
        };
        let guard = StreamGuard::new(stream);

        let mut state = self.lock_state();
        if !matches!(*state, LoopState::Starting { generation: g } if g == generation) {
            info!("Capture stopped during camera acquisition, releasing stream");
            drop(state);
            drop(guard);
            return false;
        }

        sink.attach(guard.stream());

        let pending = if options.lightweight_mode {
            info!("Lightweight mode requested, landmark model not loaded");
            None
        } else {
            let loader = Arc::clone(&self.loader);
            Some(tokio::spawn(async move { loader.load().await }))
        };

        let (stop_tx, stop_rx) = oneshot::channel();
        let run = SamplingRun {
            processor: AttentionProcessor::new(self.config.attention.clone()),
            heuristic: PresenceHeuristic::new(self.config.heuristic.clone()),
            guard,
            updates: self.updates.clone(),
            mode: Arc::clone(&self.mode),
            interval: Duration::from_millis(self.config.sample_interval_ms),
        };
        self.mode.send_replace(TrackingMode::Lightweight);
        let task = tokio::spawn(run.run(pending, stop_rx));

        *state = LoopState::Running {
            stop: stop_tx,
            task,
            sink,
        };
        info!("Attention capture started");
        true
    }

    /// Stop sampling, release the camera and return the run aggregate.
    /// Safe to call in any state.
    pub async fn stop(&self) -> AggregatedMetrics {
        let previous = std::mem::replace(&mut *self.lock_state(), LoopState::Idle);

        match previous {
            LoopState::Idle => AggregatedMetrics::default(),
            LoopState::Starting { .. } => {
                info!("Capture stop requested while camera acquisition pending");
                AggregatedMetrics::default()
            }
            LoopState::Running {
                stop,
                task,
                mut sink,
            } => {
                let _ = stop.send(());
                let aggregate = match task.await {
                    Ok(aggregate) => aggregate,
                    Err(e) => {
                        error!("Capture task failed: {}", e);
                        AggregatedMetrics::default()
                    }
                };
                sink.detach();
                self.mode.send_replace(TrackingMode::Off);
                info!(
                    "Attention capture stopped: avg score {}, {} samples",
                    aggregate.avg_gaze_score, aggregate.samples
                );
                aggregate
            }
        }
    }

    pub fn mode(&self) -> TrackingMode {
        *self.mode.borrow()
    }

    /// Watch mode transitions (Off, Lightweight, Full)
    pub fn subscribe_mode(&self) -> watch::Receiver<TrackingMode> {
        self.mode.subscribe()
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.lock_state(), LoopState::Running { .. })
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }
}

/// State owned by the spawned sampling task
struct SamplingRun {
    processor: AttentionProcessor,
    heuristic: PresenceHeuristic,
    guard: StreamGuard,
    updates: mpsc::Sender<AttentionUpdate>,
    mode: Arc<watch::Sender<TrackingMode>>,
    interval: Duration,
}

impl SamplingRun {
    async fn run(mut self, mut pending: Option<PendingModel>, mut stop: oneshot::Receiver<()>) -> AggregatedMetrics {
        let mut model: Option<Box<dyn LandmarkModel>> = None;

        'sampling: loop {
            let updates = self.sample(model.as_deref_mut());
            if !self.deliver(updates, &mut stop).await {
                break 'sampling;
            }

            // Next sample is scheduled only after this one completed
            let delay = tokio::time::sleep(self.interval);
            tokio::pin!(delay);
            loop {
                tokio::select! {
                    _ = &mut stop => break 'sampling,
                    loaded = model_ready(&mut pending), if pending.is_some() => {
                        pending = None;
                        model = self.adopt_model(loaded);
                    }
                    _ = &mut delay => break,
                }
            }
        }

        if let Some(handle) = pending {
            handle.abort();
        }
        self.processor.aggregated_metrics()
    }

    fn adopt_model(
        &self,
        loaded: Result<Result<Box<dyn LandmarkModel>, ModelError>, JoinError>,
    ) -> Option<Box<dyn LandmarkModel>> {
        match loaded {
            Ok(Ok(model)) => {
                info!("Landmark model loaded, switching to full tracking");
                self.mode.send_replace(TrackingMode::Full);
                Some(model)
            }
            Ok(Err(e)) => {
                warn!("Landmark model unavailable, staying in lightweight mode: {}", e);
                None
            }
            Err(e) => {
                warn!("Landmark model loader task failed, staying in lightweight mode: {}", e);
                None
            }
        }
    }

    fn sample(&mut self, model: Option<&mut (dyn LandmarkModel + 'static)>) -> Vec<AttentionUpdate> {
        let now = tokio::time::Instant::now().into_std();
        let frame = self.guard.latest_frame();

        match model {
            Some(model) => {
                let landmarks = frame.as_ref().and_then(|frame| match model.estimate(frame) {
                    Ok(landmarks) => landmarks,
                    Err(e) => {
                        debug!("Landmark estimation failed: {}", e);
                        None
                    }
                });
                self.processor.process_frame(landmarks.as_ref(), now).into_updates()
            }
            None => {
                let presence = self.heuristic.assess(frame.as_ref().and_then(|f| f.mean_luma()));
                let score = self.heuristic.next_score(self.processor.gaze_score(), presence);
                vec![AttentionUpdate::Metrics(
                    self.processor.record_heuristic_score(score, now),
                )]
            }
        }
    }

    /// Metrics are dropped when the channel is full; distraction and
    /// drowsiness events wait for room. Returns false if stopped meanwhile.
    async fn deliver(&mut self, updates: Vec<AttentionUpdate>, stop: &mut oneshot::Receiver<()>) -> bool {
        for update in updates {
            match update {
                AttentionUpdate::Metrics(_) => {
                    if let Err(mpsc::error::TrySendError::Full(update)) = self.updates.try_send(update) {
                        debug!("Update channel full, dropping {:?}", update);
                    }
                }
                event => {
                    tokio::select! {
                        _ = &mut *stop => return false,
                        sent = self.updates.send(event) => {
                            if let Err(e) = sent {
                                debug!("Update receiver gone, dropping {:?}", e.0);
                            }
                        }
                    }
                }
            }
        }
        true
    }
}

async fn model_ready(
    pending: &mut Option<PendingModel>,
) -> Result<Result<Box<dyn LandmarkModel>, ModelError>, JoinError> {
    match pending {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}
