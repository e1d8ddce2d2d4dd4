//! Input-activity probe backed by rdev.
//!
//! A dedicated thread listens for keyboard, mouse and scroll events and
//! stamps the shared last-activity instant. The probe reports seconds since
//! that stamp. The listener restarts after a short delay if it fails, to
//! keep monitoring continuous.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use eyebreak_core::IdleProbe;
use rdev::{listen, Event, EventType};

pub struct InputProbe {
    last_activity: Arc<Mutex<Instant>>,
}

impl InputProbe {
    /// Spawn the listener thread and return the probe.
    pub fn spawn() -> Self {
        let last_activity = Arc::new(Mutex::new(Instant::now()));
        let shared = last_activity.clone();
        std::thread::spawn(move || loop {
            let for_listener = shared.clone();
            if let Err(e) = listen(move |event: Event| match event.event_type {
                EventType::KeyPress(_)
                | EventType::ButtonPress(_)
                | EventType::MouseMove { .. }
                | EventType::Wheel { .. } => {
                    *for_listener.lock().unwrap() = Instant::now();
                }
                _ => {}
            }) {
                tracing::warn!(?e, "input listener failed, retrying in 1 second");
                std::thread::sleep(Duration::from_secs(1));
            } else {
                // listen() is blocking; a clean return means we are done.
                break;
            }
        });
        Self { last_activity }
    }
}

impl IdleProbe for InputProbe {
    fn idle_seconds(&self) -> u64 {
        self.last_activity.lock().unwrap().elapsed().as_secs()
    }
}
