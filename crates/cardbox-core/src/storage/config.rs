//! TOML-based application configuration.
//!
//! Stores user preferences:
//! - the default user profile acting in CLI invocations
//! - scheduler defaults for freshly created cards
//!
//! Configuration is stored at `config.toml` in the data directory.

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{ConfigError, Result};
use std::path::PathBuf;

/// Scheduler-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Interval assigned to freshly created cards, in days.
    #[serde(default = "default_initial_interval_days")]
    pub initial_interval_days: f64,
    /// Optional cap on the number of cards returned by the due queue.
    #[serde(default)]
    pub due_limit: Option<u32>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `config.toml` in the data directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Profile name used when no `--user` flag is given.
    #[serde(default)]
    pub default_user: Option<String>,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

fn default_initial_interval_days() -> f64 {
    1.0
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            initial_interval_days: default_initial_interval_days(),
            due_limit: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_user: None,
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the defaults on first use.
    ///
    /// # Errors
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
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
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get a config value as a string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let mut current = &json;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(match current {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Set a config value by dot-separated key and persist.
    ///
    /// The value is parsed against the existing field's type; unknown keys
    /// are rejected.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;

        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err(ConfigError::MissingKey(key.to_string()).into());
        }

        let mut current = &mut json;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| invalid("not an object".to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| invalid("unknown key".to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<f64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Number::from_f64(n)
                            .map(serde_json::Value::Number)
                            .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                    }
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                    ),
                    // Optional fields show up as null; infer the type from the value.
                    _ => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else {
                            serde_json::Value::String(value.to_string())
                        }
                    }
                };
                obj.insert(part.to_string(), new_value);
                break;
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| invalid("unknown key".to_string()))?;
        }

        *self = serde_json::from_value(json)?;
        self.save()
    }
}
