//! User-inactivity detection.
//!
//! The timer's own countdown pauses while the user is away, so idleness is
//! sampled from an independent source: an [`IdleProbe`] reporting seconds
//! since the last input event. [`IdleMonitor`] polls the probe once a second
//! and forwards *transitions* only -- the runtime must see exactly one
//! message per threshold crossing, not one per poll, or it would churn the
//! timer through redundant pause/resume calls.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Source of "seconds since last user input" samples.
pub trait IdleProbe: Send + Sync {
    fn idle_seconds(&self) -> u64;
}

/// An edge of the idle boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleTransition {
    BecameIdle,
    BecameActive,
}

/// Debounces raw idle samples into transitions.
///
/// Steady-state samples (still idle, still active) produce `None`.
#[derive(Debug)]
pub struct IdleWatcher {
    threshold_secs: u64,
    is_idle: bool,
}

impl IdleWatcher {
    pub fn new(threshold_secs: u64) -> Self {
        Self {
            threshold_secs,
            is_idle: false,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.is_idle
    }

    /// Feed one sample; returns a transition only when the boolean flips.
    pub fn observe(&mut self, idle_secs: u64) -> Option<IdleTransition> {
        let idle_now = idle_secs >= self.threshold_secs;
        if idle_now == self.is_idle {
            return None;
        }
        self.is_idle = idle_now;
        Some(if idle_now {
            IdleTransition::BecameIdle
        } else {
            IdleTransition::BecameActive
        })
    }
}

/// Polls an [`IdleProbe`] at 1-second granularity on a background task and
/// sends debounced transitions into the runtime.
///
/// The monitor has no knowledge of timer state; it owns only its watcher and
/// the polling task handle.
pub struct IdleMonitor {
    handle: Option<JoinHandle<()>>,
}

impl IdleMonitor {
    /// Begin polling. Transitions are sent on `tx`; if the receiver is gone
    /// the task exits.
    pub fn start(
        probe: Arc<dyn IdleProbe>,
        threshold_secs: u64,
        tx: mpsc::Sender<IdleTransition>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut watcher = IdleWatcher::new(threshold_secs);
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if let Some(transition) = watcher.observe(probe.idle_seconds()) {
                    debug!(?transition, "idle transition");
                    if tx.send(transition).await.is_err() {
                        return;
                    }
                }
            }
        });
        Self {
            handle: Some(handle),
        }
    }

    /// Halt the poll loop.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for IdleMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
