mod engine;
mod runtime;

pub use engine::{BreakAttempt, BreakTimer, PauseCause, PauseCauses, TimerState};
pub use runtime::{
    BreakDecision, Collaborators, Command, RuntimeHandle, TimerRuntime, SUSPEND_GAP_SECS,
};
