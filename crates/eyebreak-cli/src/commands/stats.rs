use clap::Subcommand;
use dialoguer::Confirm;
use eyebreak_core::storage::Database;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's break statistics
    Today,
    /// Recent daily statistics, newest first
    Recent {
        /// Number of days to show
        #[arg(long, default_value_t = 30)]
        days: usize,
    },
    /// Clear all recorded statistics
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        StatsAction::Today => {
            let stats = db.today()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Recent { days } => {
            let stats = db.recent(days)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Reset { yes } => {
            let confirmed = yes
                || Confirm::new()
                    .with_prompt("Clear all break statistics?")
                    .default(false)
                    .interact()?;
            if confirmed {
                db.reset()?;
                println!("Statistics cleared.");
            }
        }
    }
    Ok(())
}
