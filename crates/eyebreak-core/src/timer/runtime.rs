//! Async driver for the break timer.
//!
//! One tokio task owns the [`BreakTimer`], the statistics database and the
//! presentation collaborators. Ticks, user commands, idle transitions and
//! overlay outcomes all arrive through `select!` on this single task, so no
//! two of them ever mutate timer state concurrently and a command that lands
//! mid-tick is simply processed after it. There is exactly one countdown
//! driver - the loop's own interval - so starting a new countdown can never
//! leave a stale driver running.
//!
//! Elapsed time is re-derived from a monotonic instant on every interval
//! firing rather than trusted to the interval itself: display sleep and
//! timer coalescing stall callbacks, and the countdown must not silently
//! drift when they do. A gap above [`SUSPEND_GAP_SECS`] is treated as a
//! system suspend - the timer pauses and wakes over the gap instead of
//! replaying thousands of catch-up ticks.

use std::time::Duration;

use chrono::Local;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::engine::{BreakAttempt, BreakTimer, PauseCause};
use crate::error::CoreError;
use crate::events::Event;
use crate::idle::IdleTransition;
use crate::present::{BreakOutcome, Notifier, OverlayPresenter, SoundKind, SoundPlayer};
use crate::storage::{Config, Database};

/// A wall-clock gap big enough to be a suspend rather than jitter.
pub const SUSPEND_GAP_SECS: u64 = 300;

/// Commands accepted by the runtime. All timer mutation funnels through
/// these; see [`RuntimeHandle`] for the ergonomic wrappers.
#[derive(Debug)]
pub enum Command {
    Start,
    Stop,
    TakeBreak {
        reply: oneshot::Sender<BreakDecision>,
    },
    ForceBreak,
    SkipBreak,
    Pause,
    Resume,
    SetConfig(Config),
    SystemSleep,
    SystemWake,
    Snapshot {
        reply: oneshot::Sender<Event>,
    },
    Shutdown,
}

/// What happened to a manual break request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakDecision {
    Started,
    OutsideWorkHours,
    AlreadyBreaking,
}

/// Presentation collaborators handed to the runtime at construction.
pub struct Collaborators {
    pub overlay: Box<dyn OverlayPresenter>,
    pub notifier: Box<dyn Notifier>,
    pub sound: Box<dyn SoundPlayer>,
}

/// Cloneable handle for sending commands into a running [`TimerRuntime`].
#[derive(Clone)]
pub struct RuntimeHandle {
    tx: mpsc::Sender<Command>,
}

impl RuntimeHandle {
    async fn send(&self, command: Command) -> Result<(), CoreError> {
        self.tx
            .send(command)
            .await
            .map_err(|_| CoreError::Custom("timer runtime has stopped".into()))
    }

    pub async fn start(&self) -> Result<(), CoreError> {
        self.send(Command::Start).await
    }

    pub async fn stop(&self) -> Result<(), CoreError> {
        self.send(Command::Stop).await
    }

    /// Request an immediate break; resolves to the runtime's decision.
    pub async fn take_break(&self) -> Result<BreakDecision, CoreError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::TakeBreak { reply }).await?;
        rx.await
            .map_err(|_| CoreError::Custom("timer runtime dropped the request".into()))
    }

    pub async fn force_break(&self) -> Result<(), CoreError> {
        self.send(Command::ForceBreak).await
    }

    pub async fn skip_break(&self) -> Result<(), CoreError> {
        self.send(Command::SkipBreak).await
    }

    pub async fn pause(&self) -> Result<(), CoreError> {
        self.send(Command::Pause).await
    }

    pub async fn resume(&self) -> Result<(), CoreError> {
        self.send(Command::Resume).await
    }

    pub async fn set_config(&self, config: Config) -> Result<(), CoreError> {
        self.send(Command::SetConfig(config)).await
    }

    pub async fn system_sleep(&self) -> Result<(), CoreError> {
        self.send(Command::SystemSleep).await
    }

    pub async fn system_wake(&self) -> Result<(), CoreError> {
        self.send(Command::SystemWake).await
    }

    pub async fn snapshot(&self) -> Result<Event, CoreError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply }).await?;
        rx.await
            .map_err(|_| CoreError::Custom("timer runtime dropped the request".into()))
    }

    pub async fn shutdown(&self) -> Result<(), CoreError> {
        self.send(Command::Shutdown).await
    }
}

/// The event loop. Construct with [`TimerRuntime::new`], wire the idle and
/// outcome senders into their producers, then `await` [`TimerRuntime::run`].
pub struct TimerRuntime {
    engine: BreakTimer,
    db: Database,
    overlay: Box<dyn OverlayPresenter>,
    notifier: Box<dyn Notifier>,
    sound: Box<dyn SoundPlayer>,
    commands: mpsc::Receiver<Command>,
    idle_rx: mpsc::Receiver<IdleTransition>,
    idle_tx: mpsc::Sender<IdleTransition>,
    outcome_rx: mpsc::Receiver<BreakOutcome>,
    outcome_tx: mpsc::Sender<BreakOutcome>,
    events: broadcast::Sender<Event>,
}

impl TimerRuntime {
    pub fn new(config: Config, db: Database, collaborators: Collaborators) -> (Self, RuntimeHandle) {
        let (tx, commands) = mpsc::channel(32);
        let (idle_tx, idle_rx) = mpsc::channel(8);
        let (outcome_tx, outcome_rx) = mpsc::channel(8);
        let (events, _) = broadcast::channel(64);
        let runtime = Self {
            engine: BreakTimer::new(config),
            db,
            overlay: collaborators.overlay,
            notifier: collaborators.notifier,
            sound: collaborators.sound,
            commands,
            idle_rx,
            idle_tx,
            outcome_rx,
            outcome_tx,
            events,
        };
        (runtime, RuntimeHandle { tx })
    }

    /// Sender for the idle monitor's transitions.
    pub fn idle_sender(&self) -> mpsc::Sender<IdleTransition> {
        self.idle_tx.clone()
    }

    /// Sender overlay implementations report skip/complete outcomes on.
    pub fn outcome_sender(&self) -> mpsc::Sender<BreakOutcome> {
        self.outcome_tx.clone()
    }

    /// Subscribe to every timer event.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Drive the timer until [`Command::Shutdown`] or all handles are gone.
    pub async fn run(mut self) {
        let mut ticker = interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first interval tick fires immediately; consume it so the loop
        // below measures real elapsed time.
        ticker.tick().await;
        let mut last = Instant::now();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = Instant::now();
                    let elapsed = now.duration_since(last).as_secs();
                    if elapsed == 0 {
                        continue;
                    }
                    if elapsed > SUSPEND_GAP_SECS {
                        debug!(elapsed, "wall-clock gap, treating as suspend");
                        last = now;
                        let sleep_event = self.engine.on_sleep();
                        self.dispatch_opt(sleep_event);
                        let wake_event = self.engine.on_wake(Local::now().naive_local());
                        self.dispatch_opt(wake_event);
                        continue;
                    }
                    // Advance by whole seconds only, keeping the fractional
                    // remainder so jitter never accumulates into lost time.
                    last += Duration::from_secs(elapsed);
                    for _ in 0..elapsed {
                        let event = self.engine.tick(Local::now().naive_local());
                        self.dispatch_opt(event);
                    }
                }
                command = self.commands.recv() => {
                    match command {
                        Some(command) => {
                            if self.handle_command(command) {
                                return;
                            }
                        }
                        // Every handle dropped: nothing can reach us again.
                        None => return,
                    }
                }
                Some(transition) = self.idle_rx.recv() => {
                    let is_idle = transition == IdleTransition::BecameIdle;
                    let event = self.engine.on_idle_change(is_idle, Local::now().naive_local());
                    self.dispatch_opt(event);
                }
                Some(outcome) = self.outcome_rx.recv() => {
                    match outcome {
                        BreakOutcome::Skipped => {
                            let event = self.engine.skip_break();
                            self.dispatch_opt(event);
                        }
                        // The countdown, not the overlay, ends breaks; a
                        // completed overlay is merely confirmation.
                        BreakOutcome::Completed => {}
                    }
                }
            }
        }
    }

    /// Returns `true` when the loop should exit.
    fn handle_command(&mut self, command: Command) -> bool {
        let now = Local::now().naive_local();
        match command {
            Command::Start => {
                let event = self.engine.start();
                self.dispatch_opt(event);
            }
            Command::Stop => {
                let event = self.engine.stop();
                self.dispatch_opt(event);
            }
            Command::TakeBreak { reply } => {
                let decision = match self.engine.take_break_now(now) {
                    BreakAttempt::Started(event) => {
                        self.dispatch(event);
                        BreakDecision::Started
                    }
                    BreakAttempt::OutsideWorkHours => BreakDecision::OutsideWorkHours,
                    BreakAttempt::AlreadyBreaking => BreakDecision::AlreadyBreaking,
                };
                let _ = reply.send(decision);
            }
            Command::ForceBreak => {
                let event = self.engine.force_break_now();
                self.dispatch_opt(event);
            }
            Command::SkipBreak => {
                let event = self.engine.skip_break();
                self.dispatch_opt(event);
            }
            Command::Pause => {
                let event = self.engine.pause();
                self.dispatch_opt(event);
            }
            Command::Resume => {
                let event = self.engine.resume();
                self.dispatch_opt(event);
            }
            Command::SetConfig(config) => {
                self.engine.set_config(config);
            }
            Command::SystemSleep => {
                let event = self.engine.on_sleep();
                self.dispatch_opt(event);
            }
            Command::SystemWake => {
                let event = self.engine.on_wake(now);
                self.dispatch_opt(event);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.engine.snapshot());
            }
            Command::Shutdown => {
                self.overlay.dismiss();
                return true;
            }
        }
        false
    }

    fn dispatch_opt(&mut self, event: Option<Event>) {
        if let Some(event) = event {
            self.dispatch(event);
        }
    }

    /// Route one engine event to stats, overlay, notifier and sound, then
    /// publish it to subscribers. Collaborator failures are logged and
    /// swallowed - the timer itself never retries or stalls on them.
    fn dispatch(&mut self, event: Event) {
        let sound_enabled = self.engine.config().sound.enabled;
        match &event {
            Event::TimerStarted { .. } => {
                if sound_enabled {
                    self.sound.play(SoundKind::Start);
                }
            }
            Event::TimerStopped { .. } => {
                self.overlay.dismiss();
            }
            Event::BreakApproaching { remaining_secs, .. } => {
                self.notifier.notify_pre_break(*remaining_secs);
            }
            Event::BreakStarted {
                duration_secs,
                style,
                ..
            } => {
                let skippable = !self.engine.config().breaks.force_breaks;
                self.overlay.present(*duration_secs, *style, skippable);
                self.notifier.notify_break_start();
                if sound_enabled {
                    self.sound.play(SoundKind::BreakStart);
                }
            }
            Event::BreakCompleted { duration_secs, .. } => {
                if let Err(e) = self.db.record_completion(*duration_secs) {
                    warn!(error = %e, "failed to record completed break");
                }
                self.overlay.dismiss();
                self.notifier.notify_break_complete();
                if sound_enabled {
                    self.sound.play(SoundKind::BreakEnd);
                }
            }
            Event::BreakSkipped { .. } => {
                if let Err(e) = self.db.record_skip() {
                    warn!(error = %e, "failed to record skipped break");
                }
                self.overlay.dismiss();
                if sound_enabled {
                    self.sound.play(SoundKind::Skip);
                }
            }
            Event::TimerPaused { cause, .. } => {
                if *cause == PauseCause::Idle {
                    self.notifier.notify_idle_paused();
                }
            }
            Event::TimerResumed { .. }
            | Event::BreakWithheld { .. }
            | Event::StateSnapshot { .. } => {}
        }
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::present::{BreakStyle, NullNotifier, NullSound};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingOverlay {
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl OverlayPresenter for RecordingOverlay {
        fn present(&mut self, duration_secs: u64, _style: BreakStyle, skippable: bool) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("present {duration_secs} skippable={skippable}"));
        }
        fn dismiss(&mut self) {
            self.calls.lock().unwrap().push("dismiss".into());
        }
    }

    fn test_config(work: u64, brk: u64) -> Config {
        let mut cfg = Config::default();
        cfg.timer.work_interval_secs = work;
        cfg.timer.break_secs = brk;
        cfg.timer.warning_secs = 0;
        cfg.idle.enabled = false;
        cfg.work_hours.enabled = false;
        cfg
    }

    fn build(
        config: Config,
    ) -> (TimerRuntime, RuntimeHandle, RecordingOverlay) {
        let overlay = RecordingOverlay::default();
        let db = Database::open_memory().unwrap();
        let (runtime, handle) = TimerRuntime::new(
            config,
            db,
            Collaborators {
                overlay: Box::new(overlay.clone()),
                notifier: Box::new(NullNotifier),
                sound: Box::new(NullSound),
            },
        );
        (runtime, handle, overlay)
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn drives_a_full_cycle() {
        let (runtime, handle, overlay) = build(test_config(2, 1));
        let mut events = runtime.subscribe();
        tokio::spawn(runtime.run());

        handle.start().await.unwrap();
        settle().await;

        for _ in 0..3 {
            tokio::time::advance(Duration::from_secs(1)).await;
            settle().await;
        }

        let seen = drain(&mut events);
        assert!(seen
            .iter()
            .any(|e| matches!(e, Event::TimerStarted { work_secs: 2, .. })));
        assert!(seen
            .iter()
            .any(|e| matches!(e, Event::BreakStarted { duration_secs: 1, .. })));
        assert!(seen
            .iter()
            .any(|e| matches!(e, Event::BreakCompleted { .. })));

        let calls = overlay.calls.lock().unwrap().clone();
        assert!(calls.iter().any(|c| c.starts_with("present 1")));
        assert!(calls.iter().any(|c| c == "dismiss"));

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn take_break_resolves_decision() {
        let (runtime, handle, _overlay) = build(test_config(100, 10));
        tokio::spawn(runtime.run());

        assert_eq!(handle.take_break().await.unwrap(), BreakDecision::Started);
        assert_eq!(
            handle.take_break().await.unwrap(),
            BreakDecision::AlreadyBreaking
        );
        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn idle_transition_pauses_and_resumes() {
        let (runtime, handle, _overlay) = build(test_config(100, 10));
        let idle_tx = runtime.idle_sender();
        let mut events = runtime.subscribe();
        tokio::spawn(runtime.run());

        handle.start().await.unwrap();
        idle_tx.send(IdleTransition::BecameIdle).await.unwrap();
        settle().await;
        idle_tx.send(IdleTransition::BecameActive).await.unwrap();
        settle().await;

        let seen = drain(&mut events);
        assert!(seen.iter().any(|e| matches!(e, Event::TimerPaused { .. })));
        assert!(seen.iter().any(|e| matches!(e, Event::TimerResumed { .. })));
        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn overlay_skip_outcome_skips_the_break() {
        let (runtime, handle, _overlay) = build(test_config(100, 10));
        let outcome_tx = runtime.outcome_sender();
        let mut events = runtime.subscribe();
        tokio::spawn(runtime.run());

        handle.take_break().await.unwrap();
        outcome_tx.send(BreakOutcome::Skipped).await.unwrap();
        settle().await;

        let seen = drain(&mut events);
        assert!(seen.iter().any(|e| matches!(e, Event::BreakSkipped { .. })));

        let snapshot = handle.snapshot().await.unwrap();
        assert!(matches!(
            snapshot,
            Event::StateSnapshot {
                state: crate::timer::TimerState::Working { remaining_secs: 100 },
                ..
            }
        ));
        handle.shutdown().await.unwrap();
    }

    #[test]
    fn dispatch_records_stats() {
        let (mut runtime, _handle, _overlay) = build(test_config(100, 10));
        runtime.dispatch(Event::BreakCompleted {
            duration_secs: 10,
            at: chrono::Utc::now(),
        });
        runtime.dispatch(Event::BreakSkipped {
            at: chrono::Utc::now(),
        });

        let today = runtime.db.today().unwrap();
        assert_eq!(today.breaks_completed, 1);
        assert_eq!(today.breaks_skipped, 1);
        assert_eq!(today.total_break_secs, 10);
    }
}
