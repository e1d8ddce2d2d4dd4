mod config;
pub mod database;

pub use config::{
    BreaksConfig, Config, IdleConfig, SoundConfig, TimerConfig, WorkHoursConfig,
};
pub use database::{DailyStats, Database};

use std::path::PathBuf;

/// Returns `~/.config/eyebreak[-dev]/` based on EYEBREAK_ENV.
///
/// Set EYEBREAK_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("EYEBREAK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("eyebreak-dev")
    } else {
        base_dir.join("eyebreak")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
