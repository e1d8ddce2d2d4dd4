use chrono::Local;
use clap::Subcommand;
use dialoguer::Confirm;
use eyebreak_core::storage::{Config, Database};
use eyebreak_core::timer::{BreakAttempt, BreakTimer, SUSPEND_GAP_SECS};
use eyebreak_core::Event;

const ENGINE_KEY: &str = "break_timer";
const LAST_SEEN_KEY: &str = "break_timer_seen";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Begin a fresh work countdown
    Start,
    /// Cancel the countdown and return to idle
    Stop,
    /// Start a break now (prompts when outside work hours)
    Break {
        /// Bypass the work-hours schedule without prompting
        #[arg(long)]
        force: bool,
    },
    /// Skip the current break
    Skip,
    /// Pause the countdown
    Pause,
    /// Resume a paused countdown
    Resume,
    /// Print current timer state as JSON
    Status,
}

fn load_engine(db: &Database, config: Config) -> BreakTimer {
    if let Ok(Some(json)) = db.kv_get(ENGINE_KEY) {
        if let Ok(mut engine) = serde_json::from_str::<BreakTimer>(&json) {
            engine.set_config(config);
            return engine;
        }
    }
    BreakTimer::new(config)
}

fn save_engine(db: &Database, engine: &BreakTimer) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string(engine)?;
    db.kv_set(ENGINE_KEY, &json)?;
    db.kv_set(LAST_SEEN_KEY, &Local::now().timestamp().to_string())?;
    Ok(())
}

/// Record the stats side effect of an event. One-shot invocations have no
/// runtime loop, so the dispatch happens here.
fn record(db: &Database, event: &Event) {
    let result = match event {
        Event::BreakCompleted { duration_secs, .. } => db.record_completion(*duration_secs),
        Event::BreakSkipped { .. } => db.record_skip(),
        _ => Ok(()),
    };
    if let Err(e) = result {
        tracing::warn!(error = %e, "failed to record break statistics");
    }
}

/// Replay the seconds that passed since the engine was last saved, so
/// one-shot invocations (menu-bar plugins polling `timer status`) see a live
/// countdown. A gap long enough to be a suspend is swallowed as sleep/wake
/// instead of replayed.
fn catch_up(engine: &mut BreakTimer, db: &Database) -> Vec<Event> {
    let Some(prev) = db
        .kv_get(LAST_SEEN_KEY)
        .ok()
        .flatten()
        .and_then(|s| s.parse::<i64>().ok())
    else {
        return Vec::new();
    };
    let now = Local::now();
    let elapsed = u64::try_from(now.timestamp() - prev).unwrap_or(0);

    let mut events = Vec::new();
    if elapsed > SUSPEND_GAP_SECS {
        events.extend(engine.on_sleep());
        events.extend(engine.on_wake(now.naive_local()));
    } else {
        for _ in 0..elapsed {
            events.extend(engine.tick(now.naive_local()));
        }
    }
    for event in &events {
        record(db, event);
    }
    events
}

fn print_event(event: &Event) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(event)?);
    Ok(())
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load()?;
    let mut engine = load_engine(&db, config);
    let replayed = catch_up(&mut engine, &db);

    match action {
        TimerAction::Start => {
            if let Some(event) = engine.start() {
                print_event(&event)?;
            } else {
                print_event(&engine.snapshot())?;
            }
        }
        TimerAction::Stop => {
            if let Some(event) = engine.stop() {
                print_event(&event)?;
            }
        }
        TimerAction::Break { force } => {
            let event = if force {
                engine.force_break_now()
            } else {
                match engine.take_break_now(Local::now().naive_local()) {
                    BreakAttempt::Started(event) => Some(event),
                    BreakAttempt::AlreadyBreaking => {
                        println!("A break is already running.");
                        None
                    }
                    BreakAttempt::OutsideWorkHours => {
                        let force_anyway = Confirm::new()
                            .with_prompt("Outside configured work hours -- force a break?")
                            .default(false)
                            .interact()?;
                        if force_anyway {
                            engine.force_break_now()
                        } else {
                            println!("Break not started (outside work hours).");
                            None
                        }
                    }
                }
            };
            if let Some(event) = event {
                print_event(&event)?;
            }
        }
        TimerAction::Skip => {
            if let Some(event) = engine.skip_break() {
                record(&db, &event);
                print_event(&event)?;
            } else {
                println!("No break to skip.");
            }
        }
        TimerAction::Pause => {
            if let Some(event) = engine.pause() {
                print_event(&event)?;
            } else {
                print_event(&engine.snapshot())?;
            }
        }
        TimerAction::Resume => {
            if let Some(event) = engine.resume() {
                print_event(&event)?;
            } else {
                print_event(&engine.snapshot())?;
            }
        }
        TimerAction::Status => {
            print_event(&engine.snapshot())?;
            for event in &replayed {
                print_event(event)?;
            }
        }
    }

    save_engine(&db, &engine)?;
    Ok(())
}
