//! Break timer state machine.
//!
//! The engine is a second-granular state machine. It does not use internal
//! threads or clocks - the caller (normally [`crate::timer::TimerRuntime`])
//! calls `tick()` once per elapsed second and routes the returned events to
//! collaborators.
//!
//! ## State transitions
//!
//! ```text
//! Idle -> Working -> PreBreakWarning -> Breaking -> Working -> ...
//!            \______________|_____________/
//!                           v
//!                        Paused
//! ```
//!
//! Every operation is guarded by its precondition and declines to act (returns
//! `None`) instead of erroring. The one exception with a meaningful negative
//! result is [`BreakTimer::take_break_now`], which tells the caller when the
//! work-hours policy stands in the way so a UI can offer to force the break.
//!
//! ## Pause causes
//!
//! `Paused` freezes the countdown regardless of why. The *why* lives in a
//! cause set beside the state: manual, idle, schedule, system sleep. Each
//! signal clears only its own cause and the countdown resumes when the set
//! empties, so a machine that goes idle outside work hours stays paused until
//! input returns *and* the clock is back inside the window.

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::events::Event;
use crate::storage::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum TimerState {
    Idle,
    Working {
        remaining_secs: u64,
    },
    PreBreakWarning {
        remaining_secs: u64,
    },
    Breaking {
        remaining_secs: u64,
    },
    /// Countdown frozen; `was_breaking` records which branch to resume into.
    Paused {
        was_breaking: bool,
        remaining_secs: u64,
    },
}

impl TimerState {
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            TimerState::Working { .. }
                | TimerState::PreBreakWarning { .. }
                | TimerState::Breaking { .. }
        )
    }

    pub fn remaining_secs(&self) -> Option<u64> {
        match self {
            TimerState::Idle => None,
            TimerState::Working { remaining_secs }
            | TimerState::PreBreakWarning { remaining_secs }
            | TimerState::Breaking { remaining_secs }
            | TimerState::Paused { remaining_secs, .. } => Some(*remaining_secs),
        }
    }
}

/// Why the countdown is frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PauseCause {
    Manual,
    Idle,
    Schedule,
    System,
}

/// Independent pause conditions currently in force.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseCauses {
    pub manual: bool,
    pub idle: bool,
    pub schedule: bool,
    pub system: bool,
}

impl PauseCauses {
    fn set(&mut self, cause: PauseCause) {
        match cause {
            PauseCause::Manual => self.manual = true,
            PauseCause::Idle => self.idle = true,
            PauseCause::Schedule => self.schedule = true,
            PauseCause::System => self.system = true,
        }
    }

    fn clear(&mut self, cause: PauseCause) {
        match cause {
            PauseCause::Manual => self.manual = false,
            PauseCause::Idle => self.idle = false,
            PauseCause::Schedule => self.schedule = false,
            PauseCause::System => self.system = false,
        }
    }

    fn any(&self) -> bool {
        self.manual || self.idle || self.schedule || self.system
    }
}

/// Outcome of a manual break request.
#[derive(Debug)]
pub enum BreakAttempt {
    Started(Event),
    /// The work-hours policy denies breaks right now. Callers may prompt the
    /// user and follow up with [`BreakTimer::force_break_now`].
    OutsideWorkHours,
    AlreadyBreaking,
}

/// The break timer.
///
/// Owns [`TimerState`] exclusively; all mutation goes through the methods
/// below, which the runtime serializes onto one event loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakTimer {
    config: Config,
    state: TimerState,
    /// Suppresses the work-hours policy for the current break only.
    #[serde(default)]
    forced: bool,
    #[serde(default)]
    causes: PauseCauses,
}

impl BreakTimer {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: TimerState::Idle,
            forced: false,
            causes: PauseCauses::default(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn remaining_secs(&self) -> Option<u64> {
        self.state.remaining_secs()
    }

    pub fn pause_causes(&self) -> PauseCauses {
        self.causes
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Swap in fresh configuration. Takes effect from the next transition;
    /// a countdown already in flight keeps its remaining seconds.
    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state,
            forced: self.forced,
            at: Utc::now(),
        }
    }

    fn schedule_denies(&self, now: NaiveDateTime) -> bool {
        self.config.work_hours.enabled && !self.config.work_hours.schedule().allows(now)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a fresh work countdown. Valid only from `Idle`.
    pub fn start(&mut self) -> Option<Event> {
        if self.state != TimerState::Idle {
            return None;
        }
        let work_secs = self.config.timer.work_interval_secs;
        self.state = TimerState::Working {
            remaining_secs: work_secs,
        };
        debug!(work_secs, "timer started");
        Some(Event::TimerStarted {
            work_secs,
            at: Utc::now(),
        })
    }

    /// Cancel any running countdown and return to `Idle`. Always succeeds.
    pub fn stop(&mut self) -> Option<Event> {
        self.state = TimerState::Idle;
        self.forced = false;
        self.causes = PauseCauses::default();
        Some(Event::TimerStopped { at: Utc::now() })
    }

    /// Start a break immediately, subject to the work-hours policy.
    pub fn take_break_now(&mut self, now: NaiveDateTime) -> BreakAttempt {
        if matches!(self.state, TimerState::Breaking { .. }) {
            return BreakAttempt::AlreadyBreaking;
        }
        if self.schedule_denies(now) {
            return BreakAttempt::OutsideWorkHours;
        }
        self.causes = PauseCauses::default();
        let duration_secs = self.config.timer.break_secs;
        self.state = TimerState::Breaking {
            remaining_secs: duration_secs,
        };
        BreakAttempt::Started(Event::BreakStarted {
            duration_secs,
            style: self.config.breaks.style,
            forced: false,
            at: Utc::now(),
        })
    }

    /// Start a break immediately, bypassing the work-hours policy for this
    /// one break. The bypass ends with the break.
    pub fn force_break_now(&mut self) -> Option<Event> {
        if matches!(self.state, TimerState::Breaking { .. }) {
            return None;
        }
        self.causes = PauseCauses::default();
        self.forced = true;
        let duration_secs = self.config.timer.break_secs;
        self.state = TimerState::Breaking {
            remaining_secs: duration_secs,
        };
        Some(Event::BreakStarted {
            duration_secs,
            style: self.config.breaks.style,
            forced: true,
            at: Utc::now(),
        })
    }

    /// Abandon the current break. Valid only from `Breaking`. The break slot
    /// is not replayed - the next work cycle starts fresh.
    pub fn skip_break(&mut self) -> Option<Event> {
        if !matches!(self.state, TimerState::Breaking { .. }) {
            return None;
        }
        self.forced = false;
        self.state = TimerState::Working {
            remaining_secs: self.config.timer.work_interval_secs,
        };
        Some(Event::BreakSkipped { at: Utc::now() })
    }

    /// Freeze the countdown. Valid only from an active state.
    pub fn pause(&mut self) -> Option<Event> {
        if !self.state.is_active() {
            return None;
        }
        self.pause_with(PauseCause::Manual)
    }

    /// Thaw the countdown, clearing every pause cause. Valid only from
    /// `Paused`. A paused warning phase collapses back to `Working`.
    pub fn resume(&mut self) -> Option<Event> {
        let TimerState::Paused {
            was_breaking,
            remaining_secs,
        } = self.state
        else {
            return None;
        };
        self.causes = PauseCauses::default();
        self.restore(was_breaking, remaining_secs)
    }

    // ── External signals ─────────────────────────────────────────────

    /// Edge-triggered idle signal from the idle monitor.
    pub fn on_idle_change(&mut self, is_idle: bool, now: NaiveDateTime) -> Option<Event> {
        if is_idle {
            self.pause_with(PauseCause::Idle)
        } else {
            self.clear_cause(PauseCause::Idle, now)
        }
    }

    /// System is about to sleep: freeze whatever is running.
    pub fn on_sleep(&mut self) -> Option<Event> {
        self.pause_with(PauseCause::System)
    }

    /// System woke up: thaw unless something else still holds the pause.
    pub fn on_wake(&mut self, now: NaiveDateTime) -> Option<Event> {
        self.clear_cause(PauseCause::System, now)
    }

    // ── Tick ─────────────────────────────────────────────────────────

    /// Advance the countdown by one second.
    ///
    /// Runs the work-hours check first: an active countdown outside the
    /// permitted window pauses in place instead of losing its position. A
    /// schedule-caused pause re-opens here once the window allows again.
    pub fn tick(&mut self, now: NaiveDateTime) -> Option<Event> {
        match self.state {
            TimerState::Idle => None,
            TimerState::Paused { .. } => {
                if self.causes.schedule && !self.schedule_denies(now) {
                    self.clear_cause(PauseCause::Schedule, now)
                } else {
                    None
                }
            }
            _ => {
                if !self.forced && self.schedule_denies(now) {
                    return self.pause_with(PauseCause::Schedule);
                }
                self.tick_countdown(now)
            }
        }
    }

    fn tick_countdown(&mut self, now: NaiveDateTime) -> Option<Event> {
        let warning_secs = self.config.timer.warning_secs;
        match self.state {
            TimerState::Working { remaining_secs } => {
                let next = remaining_secs.saturating_sub(1);
                if next == 0 {
                    self.begin_break(now)
                } else if next <= warning_secs && remaining_secs > warning_secs {
                    self.state = TimerState::PreBreakWarning {
                        remaining_secs: next,
                    };
                    Some(Event::BreakApproaching {
                        remaining_secs: next,
                        at: Utc::now(),
                    })
                } else {
                    self.state = TimerState::Working {
                        remaining_secs: next,
                    };
                    None
                }
            }
            TimerState::PreBreakWarning { remaining_secs } => {
                let next = remaining_secs.saturating_sub(1);
                if next == 0 {
                    self.begin_break(now)
                } else {
                    self.state = TimerState::PreBreakWarning {
                        remaining_secs: next,
                    };
                    None
                }
            }
            TimerState::Breaking { remaining_secs } => {
                let next = remaining_secs.saturating_sub(1);
                if next == 0 {
                    self.end_break()
                } else {
                    self.state = TimerState::Breaking {
                        remaining_secs: next,
                    };
                    None
                }
            }
            // Guarded by tick(); the countdown must not run here.
            TimerState::Idle | TimerState::Paused { .. } => None,
        }
    }

    fn begin_break(&mut self, now: NaiveDateTime) -> Option<Event> {
        if !self.forced && self.schedule_denies(now) {
            // Outside work hours the slot is absorbed silently: straight
            // into a fresh work cycle, no interruption.
            self.state = TimerState::Working {
                remaining_secs: self.config.timer.work_interval_secs,
            };
            return Some(Event::BreakWithheld { at: Utc::now() });
        }
        let duration_secs = self.config.timer.break_secs;
        self.state = TimerState::Breaking {
            remaining_secs: duration_secs,
        };
        debug!(duration_secs, forced = self.forced, "break started");
        Some(Event::BreakStarted {
            duration_secs,
            style: self.config.breaks.style,
            forced: self.forced,
            at: Utc::now(),
        })
    }

    fn end_break(&mut self) -> Option<Event> {
        let duration_secs = self.config.timer.break_secs;
        self.forced = false;
        self.state = TimerState::Working {
            remaining_secs: self.config.timer.work_interval_secs,
        };
        debug!(duration_secs, "break completed");
        Some(Event::BreakCompleted {
            duration_secs,
            at: Utc::now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn pause_with(&mut self, cause: PauseCause) -> Option<Event> {
        match self.state {
            TimerState::Working { remaining_secs }
            | TimerState::PreBreakWarning { remaining_secs } => {
                self.causes.set(cause);
                self.state = TimerState::Paused {
                    was_breaking: false,
                    remaining_secs,
                };
                debug!(?cause, remaining_secs, "paused");
                Some(Event::TimerPaused {
                    cause,
                    was_breaking: false,
                    remaining_secs,
                    at: Utc::now(),
                })
            }
            TimerState::Breaking { remaining_secs } => {
                self.causes.set(cause);
                self.state = TimerState::Paused {
                    was_breaking: true,
                    remaining_secs,
                };
                debug!(?cause, remaining_secs, "paused during break");
                Some(Event::TimerPaused {
                    cause,
                    was_breaking: true,
                    remaining_secs,
                    at: Utc::now(),
                })
            }
            // Already frozen: the new cause stacks onto the existing pause.
            TimerState::Paused { .. } => {
                self.causes.set(cause);
                None
            }
            TimerState::Idle => None,
        }
    }

    fn clear_cause(&mut self, cause: PauseCause, now: NaiveDateTime) -> Option<Event> {
        self.causes.clear(cause);
        let TimerState::Paused {
            was_breaking,
            remaining_secs,
        } = self.state
        else {
            return None;
        };
        if self.causes.any() {
            return None;
        }
        // The pause only lifts once every condition has cleared; leaving the
        // work-hours window while idle must not resume on input alone.
        if !self.forced && self.schedule_denies(now) {
            self.causes.set(PauseCause::Schedule);
            return None;
        }
        self.restore(was_breaking, remaining_secs)
    }

    fn restore(&mut self, was_breaking: bool, remaining_secs: u64) -> Option<Event> {
        self.state = if was_breaking {
            TimerState::Breaking { remaining_secs }
        } else {
            TimerState::Working { remaining_secs }
        };
        debug!(was_breaking, remaining_secs, "resumed");
        Some(Event::TimerResumed {
            was_breaking,
            remaining_secs,
            at: Utc::now(),
        })
    }
}
