//! One-second session countdown task

use std::sync::Weak;
use std::time::Duration;

use alerting::AudioBackend;
use session_api::FocusApi;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::controller::FocusSessionController;

/// Background countdown. Holds only a weak reference to the controller and
/// is aborted when dropped.
pub struct SessionTimer {
    handle: JoinHandle<()>,
}

impl SessionTimer {
    /// Spawn the tick task for an open session
    pub fn spawn<A, B>(controller: Weak<Mutex<FocusSessionController<A, B>>>, period: Duration) -> Self
    where
        A: FocusApi + 'static,
        B: AudioBackend + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let Some(shared) = controller.upgrade() else {
                    debug!("Controller dropped, session timer exiting");
                    break;
                };
                let mut guard = shared.lock().await;
                if !guard.has_session() {
                    info!("Session closed, session timer exiting");
                    break;
                }
                if let Some(finished) = guard.tick() {
                    debug!("Interval finished: {:?}", finished);
                }
            }
        });

        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
