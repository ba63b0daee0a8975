//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/starsailors/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/starsailors/` (~/.config/starsailors/)
//! - Data: `$XDG_DATA_HOME/starsailors/` (~/.local/share/starsailors/)
//! - State/Logs: `$XDG_STATE_HOME/starsailors/` (~/.local/state/starsailors/)

use crate::error::{Error, Result};
use chrono::Weekday;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Database location override
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Deployment rule constants
    #[serde(default)]
    pub deploy: DeployConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `127.0.0.1:8787`
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8787".to_string()
}

/// Database location
#[derive(Debug, Deserialize, Default, Clone)]
pub struct DatabaseConfig {
    /// Explicit database file; falls back to the XDG data dir
    pub path: Option<PathBuf>,
}

/// Constants for the deployment rules.
///
/// Defaults match the live game: Sunday-anchored weeks, 4 targets per batch
/// (6 with the probe receptor upgrade), active asteroids after 2 minor
/// planet classifications, one bonus deploy per 3 upvotes.
#[derive(Debug, Deserialize, Clone)]
pub struct DeployConfig {
    /// First day of the calendar week (any chrono weekday name)
    #[serde(default = "default_week_starts_on")]
    pub week_starts_on: String,

    /// Targets per batch without the upgrade
    #[serde(default = "default_base_quota")]
    pub base_quota: usize,

    /// Targets per batch with the upgrade
    #[serde(default = "default_upgraded_quota")]
    pub upgraded_quota: usize,

    /// Minor planet classifications needed to see active asteroids
    #[serde(default = "default_active_asteroid_threshold")]
    pub active_asteroid_threshold: i64,

    /// Qualifying upvotes per bonus deploy
    #[serde(default = "default_votes_per_bonus")]
    pub votes_per_bonus: i64,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            week_starts_on: default_week_starts_on(),
            base_quota: default_base_quota(),
            upgraded_quota: default_upgraded_quota(),
            active_asteroid_threshold: default_active_asteroid_threshold(),
            votes_per_bonus: default_votes_per_bonus(),
        }
    }
}

impl DeployConfig {
    /// Parsed week anchor
    pub fn week_start(&self) -> Result<Weekday> {
        self.week_starts_on.parse::<Weekday>().map_err(|_| {
            Error::Config(format!(
                "deploy.week_starts_on is not a weekday: {}",
                self.week_starts_on
            ))
        })
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        self.week_start()?;

        if self.base_quota == 0 {
            return Err(Error::Config(
                "deploy.base_quota must be at least 1".to_string(),
            ));
        }
        if self.upgraded_quota < self.base_quota {
            return Err(Error::Config(
                "deploy.upgraded_quota must not be below deploy.base_quota".to_string(),
            ));
        }
        if self.votes_per_bonus < 1 {
            return Err(Error::Config(
                "deploy.votes_per_bonus must be at least 1".to_string(),
            ));
        }
        if self.active_asteroid_threshold < 0 {
            return Err(Error::Config(
                "deploy.active_asteroid_threshold must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_week_starts_on() -> String {
    "sunday".to_string()
}

fn default_base_quota() -> usize {
    4
}

fn default_upgraded_quota() -> usize {
    6
}

fn default_active_asteroid_threshold() -> i64 {
    2
}

fn default_votes_per_bonus() -> i64 {
    3
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.deploy.validate()?;

        Ok(config)
    }

    /// Database file to open: the configured override or the XDG default
    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(Self::default_database_path)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/starsailors/config.toml` (~/.config/starsailors/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("starsailors").join("config.toml")
    }

    /// Returns the data directory path (for SQLite database)
    ///
    /// `$XDG_DATA_HOME/starsailors/` (~/.local/share/starsailors/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("starsailors")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/starsailors/` (~/.local/state/starsailors/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("starsailors")
    }

    /// `$XDG_DATA_HOME/starsailors/data.db` (~/.local/share/starsailors/data.db)
    pub fn default_database_path() -> PathBuf {
        Self::data_dir().join("data.db")
    }
}
