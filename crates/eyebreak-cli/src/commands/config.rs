use clap::Subcommand;
use eyebreak_core::storage::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the full configuration as TOML
    List,
    /// Get a value by dot-separated key (e.g. timer.break_secs)
    Get { key: String },
    /// Set a value by dot-separated key
    Set { key: String, value: String },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;

    match action {
        ConfigAction::List => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Get { key } => match config.get(&key) {
            Some(value) => println!("{value}"),
            None => return Err(format!("unknown config key: {key}").into()),
        },
        ConfigAction::Set { key, value } => {
            config.set(&key, &value)?;
            println!("{key} = {}", config.get(&key).unwrap_or_default());
        }
    }
    Ok(())
}
