//! Ambient reminders.
//!
//! Low-intensity periodic popups independent of the main break cycle: a
//! gentle eye-exercise nudge and a hydration nudge, each on its own
//! schedule. They never interrupt like a break overlay does - they only
//! emit a reminder message the embedding layer turns into a notification.

use std::time::Duration;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::schedule::WorkSchedule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbientKind {
    EyeExercise,
    Hydration,
}

/// Configuration for the ambient reminder schedules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbientConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_eye_exercise_interval")]
    pub eye_exercise_interval_secs: u64,
    #[serde(default = "default_hydration_interval")]
    pub hydration_interval_secs: u64,
}

fn default_eye_exercise_interval() -> u64 {
    3600
}
fn default_hydration_interval() -> u64 {
    45 * 60
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            eye_exercise_interval_secs: default_eye_exercise_interval(),
            hydration_interval_secs: default_hydration_interval(),
        }
    }
}

/// Fires [`AmbientKind`] messages on independent periodic schedules.
///
/// When a work-hours schedule is supplied, reminders outside the permitted
/// window are dropped rather than deferred.
pub struct AmbientScheduler {
    handles: Vec<JoinHandle<()>>,
}

impl AmbientScheduler {
    pub fn start(
        config: AmbientConfig,
        work_hours: Option<WorkSchedule>,
        tx: mpsc::Sender<AmbientKind>,
    ) -> Self {
        let mut handles = Vec::new();
        if !config.enabled {
            return Self { handles };
        }
        let reminders = [
            (AmbientKind::EyeExercise, config.eye_exercise_interval_secs),
            (AmbientKind::Hydration, config.hydration_interval_secs),
        ];
        for (kind, interval_secs) in reminders {
            if interval_secs == 0 {
                continue;
            }
            let tx = tx.clone();
            let work_hours = work_hours.clone();
            handles.push(tokio::spawn(async move {
                let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
                interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
                // The first firing is immediate; a reminder at startup would
                // just be noise.
                interval.tick().await;
                loop {
                    interval.tick().await;
                    if let Some(schedule) = &work_hours {
                        if !schedule.allows(Local::now().naive_local()) {
                            debug!(?kind, "ambient reminder dropped outside work hours");
                            continue;
                        }
                    }
                    if tx.send(kind).await.is_err() {
                        return;
                    }
                }
            }));
        }
        Self { handles }
    }

    pub fn stop(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for AmbientScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(eye: u64, hydration: u64) -> AmbientConfig {
        AmbientConfig {
            enabled: true,
            eye_exercise_interval_secs: eye,
            hydration_interval_secs: hydration,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_each_kind_on_its_own_interval() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut scheduler = AmbientScheduler::start(config(2, 3), None, tx);

        tokio::time::advance(Duration::from_secs(6)).await;

        let mut eye = 0;
        let mut hydration = 0;
        while let Ok(kind) = rx.try_recv() {
            match kind {
                AmbientKind::EyeExercise => eye += 1,
                AmbientKind::Hydration => hydration += 1,
            }
        }
        assert_eq!(eye, 3);
        assert_eq!(hydration, 2);
        scheduler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_config_spawns_nothing() {
        let (tx, mut rx) = mpsc::channel(16);
        let _scheduler = AmbientScheduler::start(AmbientConfig::default(), None, tx);
        tokio::time::advance(Duration::from_secs(7200)).await;
        assert!(rx.try_recv().is_err());
    }
}
