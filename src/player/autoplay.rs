//! Timer-driven auto-play
//!
//! Advances a shared stage on a fixed interval until the script completes,
//! the scenario is switched, ownership is revoked, or the caller stops it.

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::driver::{DriverKind, DriverToken, SharedStage};
use crate::errors::DriverError;

/// Intervals below this are raised to it
pub const MIN_AUTOPLAY_INTERVAL: Duration = Duration::from_millis(200);

/// Floor-clamp an auto-play interval.
pub fn clamp_interval(interval: Duration) -> Duration {
    interval.max(MIN_AUTOPLAY_INTERVAL)
}

/// Why an auto-play run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoPlayExit {
    /// The last step was applied
    Completed,
    /// The scenario was switched underneath the timer
    Superseded,
    /// Another party took the stage away
    Revoked,
    /// Stopped by the caller or by process shutdown
    Stopped,
}

/// Handle to a running auto-play task
pub struct AutoPlay {
    stop_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<AutoPlayExit>>,
    interval: Duration,
}

impl AutoPlay {
    /// Claim `stage` for auto-play and start ticking every `interval` (clamped).
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(stage: SharedStage, interval: Duration) -> Result<Self, DriverError> {
        let interval = clamp_interval(interval);
        let (token, generation) = {
            let mut guard = stage.lock();
            let token = guard.claim(DriverKind::AutoPlay)?;
            (token, guard.player().generation())
        };
        info!(interval_ms = interval.as_millis() as u64, generation, "Auto-play started");

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let exit = loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Some(exit) = tick(&stage, &token, generation) {
                            break exit;
                        }
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break AutoPlayExit::Stopped;
                        }
                    }
                }
            };

            stage.lock().release(token);
            debug!(exit = ?exit, "Auto-play finished");
            exit
        });

        Ok(Self {
            stop_tx,
            handle: Some(handle),
            interval,
        })
    }

    /// Effective (clamped) interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /// Wait for the run to end on its own.
    pub async fn wait(mut self) -> AutoPlayExit {
        match self.handle.take() {
            Some(handle) => handle.await.unwrap_or(AutoPlayExit::Stopped),
            None => AutoPlayExit::Stopped,
        }
    }

    /// Stop ticking, release the stage, and report how the run ended.
    pub async fn stop(self) -> AutoPlayExit {
        let _ = self.stop_tx.send(true);
        self.wait().await
    }
}

impl Drop for AutoPlay {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// One timer tick. Holds the stage lock only for the synchronous advance.
fn tick(stage: &SharedStage, token: &DriverToken, generation: u64) -> Option<AutoPlayExit> {
    if crate::is_shutdown_requested() {
        return Some(AutoPlayExit::Stopped);
    }

    let mut stage = stage.lock();
    if stage.player().generation() != generation {
        debug!(generation, "Stale auto-play tick ignored");
        return Some(AutoPlayExit::Superseded);
    }
    match stage.advance(token) {
        Err(_) => Some(AutoPlayExit::Revoked),
        Ok(_) if stage.player().is_complete() => Some(AutoPlayExit::Completed),
        Ok(_) => None,
    }
}
