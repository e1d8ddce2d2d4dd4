//! Presentation collaborator contracts.
//!
//! The timer core never draws anything. When a break starts it hands a
//! presentation command to an [`OverlayPresenter`]; notifications and sounds
//! go through [`Notifier`] and [`SoundPlayer`]. All three are fire-and-forget
//! from the core's perspective -- a presenter that fails to render does not
//! stop the break countdown, which is the source of truth for break timing.

use serde::{Deserialize, Serialize};

/// Visual style of the break interruption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BreakStyle {
    /// Full-screen blur of the desktop.
    #[default]
    Blur,
    /// Eye-exercise instructions.
    Exercise,
    /// Small floating reminder window.
    Floating,
}

/// What the user did with a presented overlay. Exactly one outcome is
/// reported per presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakOutcome {
    Skipped,
    Completed,
}

/// Displays the break interruption UI.
///
/// A `present` call while a previous overlay is still up replaces it.
/// Outcomes are delivered asynchronously on the runtime's outcome channel,
/// not through this trait.
pub trait OverlayPresenter: Send {
    fn present(&mut self, duration_secs: u64, style: BreakStyle, skippable: bool);
    fn dismiss(&mut self);
}

/// Fire-and-forget user notifications.
pub trait Notifier: Send {
    fn notify_pre_break(&self, seconds: u64);
    fn notify_break_start(&self);
    fn notify_break_complete(&self);
    fn notify_idle_paused(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundKind {
    Start,
    BreakStart,
    BreakEnd,
    Skip,
}

/// Fire-and-forget sound effects.
pub trait SoundPlayer: Send {
    fn play(&self, kind: SoundKind);
}

/// No-op presenter for headless use and tests.
#[derive(Debug, Default)]
pub struct NullOverlay;

impl OverlayPresenter for NullOverlay {
    fn present(&mut self, _duration_secs: u64, _style: BreakStyle, _skippable: bool) {}
    fn dismiss(&mut self) {}
}

/// No-op notifier.
#[derive(Debug, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify_pre_break(&self, _seconds: u64) {}
    fn notify_break_start(&self) {}
    fn notify_break_complete(&self) {}
    fn notify_idle_paused(&self) {}
}

/// No-op sound player.
#[derive(Debug, Default)]
pub struct NullSound;

impl SoundPlayer for NullSound {
    fn play(&self, _kind: SoundKind) {}
}
