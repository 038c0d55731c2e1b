//! TOML-based application configuration.
//!
//! Stores the local player identity, the preferred difficulty and the
//! per-difficulty countdown limits. Stored at `<data dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use super::data_dir;
use crate::error::ConfigError;
use crate::puzzle::Difficulty;

/// Countdown limits per difficulty, in seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeLimits {
    #[serde(default = "default_easy_limit")]
    pub easy: u64,
    #[serde(default = "default_medium_limit")]
    pub medium: u64,
    #[serde(default = "default_hard_limit")]
    pub hard: u64,
}

fn default_easy_limit() -> u64 {
    Difficulty::Easy.default_time_limit_secs()
}
fn default_medium_limit() -> u64 {
    Difficulty::Medium.default_time_limit_secs()
}
fn default_hard_limit() -> u64 {
    Difficulty::Hard.default_time_limit_secs()
}

impl Default for TimeLimits {
    fn default() -> Self {
        Self {
            easy: default_easy_limit(),
            medium: default_medium_limit(),
            hard: default_hard_limit(),
        }
    }
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data dir>/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Stable identity of the local player, generated on first run.
    #[serde(default = "Uuid::new_v4")]
    pub player_id: Uuid,
    #[serde(default = "default_player_name")]
    pub player_name: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub time_limits: TimeLimits,
}

fn default_player_name() -> String {
    "player".into()
}

fn default_difficulty() -> Difficulty {
    Difficulty::Medium
}

impl Default for Config {
    fn default() -> Self {
        Self {
            player_id: Uuid::new_v4(),
            player_name: default_player_name(),
            difficulty: default_difficulty(),
            time_limits: TimeLimits::default(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: "<data dir>".into(),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk, writing (and returning) the default on first run.
    ///
    /// # Errors
    /// Returns an error if the config file exists but cannot be parsed, or
    /// if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
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
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Countdown limit for a difficulty, in seconds.
    pub fn time_limit_secs(&self, difficulty: Difficulty) -> u64 {
        match difficulty {
            Difficulty::Easy => self.time_limits.easy,
            Difficulty::Medium => self.time_limits.medium,
            Difficulty::Hard => self.time_limits.hard,
        }
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let mut current = &json;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        match current {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key and persist. Unknown keys are rejected.
    ///
    /// # Errors
    /// Returns an error if the key is unknown, the value does not parse, or
    /// the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.to_string(),
        };
        match key {
            "player_name" => self.player_name = value.to_string(),
            "difficulty" => {
                self.difficulty = value.parse().map_err(|e: String| invalid(&e))?;
            }
            "time_limits.easy" | "time_limits.medium" | "time_limits.hard" => {
                let secs: u64 = value
                    .parse()
                    .map_err(|_| invalid("expected a number of seconds"))?;
                if secs == 0 {
                    return Err(invalid("time limit must be positive"));
                }
                match key {
                    "time_limits.easy" => self.time_limits.easy = secs,
                    "time_limits.medium" => self.time_limits.medium = secs,
                    _ => self.time_limits.hard = secs,
                }
            }
            _ => return Err(invalid("unknown config key")),
        }
        self.save()
    }
}
