use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::present::BreakStyle;
use crate::timer::{PauseCause, TimerState};

/// Every state change in the break cycle produces an Event.
/// The runtime dispatches them to collaborators; UI layers subscribe via the
/// runtime's broadcast channel instead of polling timer state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        work_secs: u64,
        at: DateTime<Utc>,
    },
    TimerStopped {
        at: DateTime<Utc>,
    },
    TimerPaused {
        cause: PauseCause,
        was_breaking: bool,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        was_breaking: bool,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// The work countdown crossed the pre-break warning threshold.
    BreakApproaching {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    BreakStarted {
        duration_secs: u64,
        style: BreakStyle,
        forced: bool,
        at: DateTime<Utc>,
    },
    /// The break ran its full countdown.
    BreakCompleted {
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    BreakSkipped {
        at: DateTime<Utc>,
    },
    /// A due break fell outside permitted work hours and its slot was
    /// dropped in favour of a fresh work cycle.
    BreakWithheld {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        forced: bool,
        at: DateTime<Utc>,
    },
}
