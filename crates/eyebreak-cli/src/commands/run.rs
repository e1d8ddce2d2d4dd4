use std::sync::Arc;

use clap::Args;
use tokio::sync::{broadcast, mpsc};

use eyebreak_core::ambient::AmbientScheduler;
use eyebreak_core::idle::IdleMonitor;
use eyebreak_core::storage::{Config, Database};
use eyebreak_core::timer::{Collaborators, TimerRuntime};

use crate::probe::InputProbe;
use crate::ui::{ambient_reminder, BellSound, DesktopNotifier, TerminalOverlay};

#[derive(Args)]
pub struct RunArgs {
    /// Do not start the work countdown immediately
    #[arg(long)]
    pub no_autostart: bool,
    /// Print every timer event as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(run_async(args))
}

async fn run_async(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;

    let (runtime, handle) = TimerRuntime::new(
        config.clone(),
        db,
        Collaborators {
            overlay: Box::new(TerminalOverlay),
            notifier: Box::new(DesktopNotifier),
            sound: Box::new(BellSound),
        },
    );
    let mut events = runtime.subscribe();

    // Idle detection is optional; without it the timer just never
    // auto-pauses on inactivity.
    let _monitor = if config.idle.enabled {
        let probe = Arc::new(InputProbe::spawn());
        Some(IdleMonitor::start(
            probe,
            config.idle.threshold_secs,
            runtime.idle_sender(),
        ))
    } else {
        None
    };

    // Ambient reminders run on their own schedules, unrelated to the break
    // cycle; outside the work-hours window they are dropped.
    let (ambient_tx, mut ambient_rx) = mpsc::channel(8);
    let work_hours = config
        .work_hours
        .enabled
        .then(|| config.work_hours.schedule());
    let _ambient = AmbientScheduler::start(config.ambient.clone(), work_hours, ambient_tx);

    let loop_task = tokio::spawn(runtime.run());

    if !args.no_autostart {
        handle.start().await?;
    }
    tracing::info!(
        work_interval_secs = config.timer.work_interval_secs,
        break_secs = config.timer.break_secs,
        "eyebreak running, press ctrl-c to quit"
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(event) => {
                    if args.json {
                        println!("{}", serde_json::to_string(&event)?);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            Some(kind) = ambient_rx.recv() => ambient_reminder(kind),
        }
    }

    handle.shutdown().await.ok();
    loop_task.await.ok();
    Ok(())
}
