//! TOML-based application configuration.
//!
//! Stores user preferences for the break cycle:
//! - Work interval, break duration and pre-break warning lead time
//! - Break presentation style and forced-break behaviour
//! - Sound preferences
//! - Idle detection threshold
//! - Smart-schedule work hours and weekdays
//!
//! Configuration is stored at `~/.config/eyebreak/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::ambient::AmbientConfig;
use crate::error::ConfigError;
use crate::present::BreakStyle;
use crate::schedule::WorkSchedule;

/// Countdown durations, in whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_work_interval")]
    pub work_interval_secs: u64,
    #[serde(default = "default_break_secs")]
    pub break_secs: u64,
    /// Lead time before a break at which the warning fires. Zero disables
    /// the warning phase.
    #[serde(default = "default_warning_secs")]
    pub warning_secs: u64,
}

/// Break presentation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BreaksConfig {
    #[serde(default)]
    pub style: BreakStyle,
    /// When set, the overlay offers no skip control.
    #[serde(default)]
    pub force_breaks: bool,
}

/// Sound configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Idle-detection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_idle_threshold")]
    pub threshold_secs: u64,
}

/// Smart-schedule configuration: the policy window plus its enable flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkHoursConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_start_hour")]
    pub start_hour: f64,
    #[serde(default = "default_end_hour")]
    pub end_hour: f64,
    #[serde(default = "default_weekdays")]
    pub weekdays: Vec<u32>,
}

impl WorkHoursConfig {
    pub fn schedule(&self) -> WorkSchedule {
        WorkSchedule {
            start_hour: self.start_hour,
            end_hour: self.end_hour,
            weekdays: self.weekdays.clone(),
        }
    }
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/eyebreak/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub breaks: BreaksConfig,
    #[serde(default)]
    pub sound: SoundConfig,
    #[serde(default)]
    pub idle: IdleConfig,
    #[serde(default)]
    pub work_hours: WorkHoursConfig,
    #[serde(default)]
    pub ambient: AmbientConfig,
}

// Default functions
fn default_work_interval() -> u64 {
    20 * 60
}
fn default_break_secs() -> u64 {
    20
}
fn default_warning_secs() -> u64 {
    30
}
fn default_idle_threshold() -> u64 {
    120
}
fn default_start_hour() -> f64 {
    9.0
}
fn default_end_hour() -> f64 {
    17.0
}
fn default_weekdays() -> Vec<u32> {
    vec![1, 2, 3, 4, 5]
}
fn default_true() -> bool {
    true
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_interval_secs: default_work_interval(),
            break_secs: default_break_secs(),
            warning_secs: default_warning_secs(),
        }
    }
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold_secs: default_idle_threshold(),
        }
    }
}

impl Default for WorkHoursConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            start_hour: default_start_hour(),
            end_hour: default_end_hour(),
            weekdays: default_weekdays(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let parse_err = |message: String| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message,
                };
                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| parse_err(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| {
                                    parse_err(format!("cannot parse '{value}' as number"))
                                })?
                        } else {
                            return Err(parse_err(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| parse_err(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    fn path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed or
    /// validated, or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(Self::path()?, content)?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key, validate, and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// the resulting config is invalid, or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json)?;
        updated.validate()?;
        *self = updated;
        self.save()?;
        Ok(())
    }

    /// Reject configurations the timer cannot run on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timer.work_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timer.work_interval_secs".into(),
                message: "must be positive".into(),
            });
        }
        if self.timer.break_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timer.break_secs".into(),
                message: "must be positive".into(),
            });
        }
        self.work_hours
            .schedule()
            .validate()
            .map_err(|e| ConfigError::InvalidValue {
                key: "work_hours".into(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.timer.work_interval_secs, 1200);
        assert_eq!(parsed.timer.break_secs, 20);
    }

    #[test]
    fn empty_toml_fills_all_defaults() {
        let parsed: Config = toml::from_str("").unwrap();
        assert_eq!(parsed, Config::default());
        assert!(parsed.idle.enabled);
        assert_eq!(parsed.idle.threshold_secs, 120);
        assert!(!parsed.work_hours.enabled);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("timer.break_secs").as_deref(), Some("20"));
        assert_eq!(cfg.get("breaks.style").as_deref(), Some("blur"));
        assert_eq!(cfg.get("work_hours.start_hour").as_deref(), Some("9.0"));
        assert!(cfg.get("timer.missing_key").is_none());
    }

    #[test]
    fn set_json_value_by_path_updates_nested_bool() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_value_by_path(&mut json, "idle.enabled", "false").unwrap();
        assert_eq!(
            Config::get_json_value_by_path(&json, "idle.enabled").unwrap(),
            &serde_json::Value::Bool(false)
        );
    }

    #[test]
    fn set_json_value_by_path_updates_nested_number() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_value_by_path(&mut json, "timer.break_secs", "30").unwrap();
        assert_eq!(
            Config::get_json_value_by_path(&json, "timer.break_secs").unwrap(),
            &serde_json::Value::Number(30.into())
        );
    }

    #[test]
    fn set_json_value_by_path_rejects_unknown_key() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result = Config::set_json_value_by_path(&mut json, "timer.nonexistent", "1");
        assert!(result.is_err());
    }

    #[test]
    fn set_json_value_by_path_rejects_invalid_type() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result = Config::set_json_value_by_path(&mut json, "idle.enabled", "not_a_bool");
        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_overnight_work_hours() {
        let mut cfg = Config::default();
        cfg.work_hours.start_hour = 18.0;
        cfg.work_hours.end_hour = 2.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_durations() {
        let mut cfg = Config::default();
        cfg.timer.break_secs = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn style_serializes_lowercase() {
        let mut cfg = Config::default();
        cfg.breaks.style = BreakStyle::Exercise;
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        assert!(toml_str.contains("style = \"exercise\""));
    }
}
