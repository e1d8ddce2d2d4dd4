//! # eyebreak Core Library
//!
//! This library provides the core logic for eyebreak, a 20-20-20 eye-care
//! break timer. It implements a CLI-first philosophy: all operations are
//! available through a standalone CLI binary, with any GUI shell expected to
//! be a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Break timer**: a second-granular state machine driven by an async
//!   runtime that re-derives elapsed time from wall-clock deltas
//! - **Idle detection**: a pluggable probe polled at 1 Hz with edge-triggered
//!   pause/resume of the timer
//! - **Schedule policy**: a pure work-hours predicate gating break
//!   presentation
//! - **Storage**: SQLite daily statistics and TOML-based configuration
//! - **Presentation**: overlay, notification and sound collaborators behind
//!   traits; the core never draws anything itself
//!
//! ## Key Components
//!
//! - [`BreakTimer`]: the timer state machine
//! - [`TimerRuntime`]: single-task event loop serializing ticks, commands
//!   and idle signals
//! - [`IdleMonitor`]: debounced inactivity detection
//! - [`WorkSchedule`]: permitted work-hours window
//! - [`Database`]: daily break statistics with 30-day retention

pub mod ambient;
pub mod error;
pub mod events;
pub mod idle;
pub mod present;
pub mod schedule;
pub mod storage;
pub mod timer;

pub use ambient::{AmbientKind, AmbientScheduler};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use idle::{IdleMonitor, IdleProbe, IdleTransition, IdleWatcher};
pub use present::{
    BreakOutcome, BreakStyle, Notifier, NullNotifier, NullOverlay, NullSound, OverlayPresenter,
    SoundKind, SoundPlayer,
};
pub use schedule::WorkSchedule;
pub use storage::{Config, DailyStats, Database};
pub use timer::{
    BreakAttempt, BreakDecision, BreakTimer, Collaborators, PauseCause, RuntimeHandle, TimerRuntime,
    TimerState,
};
