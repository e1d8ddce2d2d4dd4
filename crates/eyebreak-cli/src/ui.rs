//! Terminal and desktop presentation collaborators for `eyebreak run`.

use std::io::Write;

use eyebreak_core::{AmbientKind, BreakStyle, Notifier, OverlayPresenter, SoundKind, SoundPlayer};
use notify_rust::Notification;

/// Prints break interruptions to the terminal in place of a screen overlay.
pub struct TerminalOverlay;

impl OverlayPresenter for TerminalOverlay {
    fn present(&mut self, duration_secs: u64, style: BreakStyle, skippable: bool) {
        let instructions = match style {
            BreakStyle::Blur => "Look away from the screen.",
            BreakStyle::Exercise => "Focus on something 20 feet (6 meters) away.",
            BreakStyle::Floating => "Give your eyes a short rest.",
        };
        let skip_hint = if skippable {
            " (run `eyebreak timer skip` to skip)"
        } else {
            ""
        };
        println!("*** Break time -- {instructions} {duration_secs}s{skip_hint} ***");
    }

    fn dismiss(&mut self) {
        println!("*** Break over -- back to work ***");
    }
}

/// Desktop notifications via the system notification daemon.
pub struct DesktopNotifier;

impl DesktopNotifier {
    fn show(summary: &str, body: &str) {
        if let Err(e) = Notification::new().summary(summary).body(body).show() {
            tracing::warn!(error = %e, "failed to show notification");
        }
    }
}

impl Notifier for DesktopNotifier {
    fn notify_pre_break(&self, seconds: u64) {
        Self::show("Break soon", &format!("Next eye break in {seconds} seconds"));
    }

    fn notify_break_start(&self) {
        Self::show("Break time", "Look at something 20 feet away");
    }

    fn notify_break_complete(&self) {
        Self::show("Break complete", "Back to work");
    }

    fn notify_idle_paused(&self) {
        Self::show("Timer paused", "Paused while you were away");
    }
}

/// Show an ambient reminder popup.
pub fn ambient_reminder(kind: AmbientKind) {
    match kind {
        AmbientKind::EyeExercise => DesktopNotifier::show(
            "Eye exercise",
            "Roll your eyes slowly, then blink a few times",
        ),
        AmbientKind::Hydration => DesktopNotifier::show("Hydration", "Time for a sip of water"),
    }
}

/// Terminal bell in place of a sound file player.
pub struct BellSound;

impl SoundPlayer for BellSound {
    fn play(&self, _kind: SoundKind) {
        print!("\x07");
        let _ = std::io::stdout().flush();
    }
}
