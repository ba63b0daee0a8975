//! # starsailors-core
//!
//! Core library for the Star Sailors deployment eligibility engine.
//!
//! This library provides:
//! - Domain types for anomalies, claims and automatons
//! - The deployment rules: weekly window, catalog, streak bonus, eligibility, claims
//! - Database storage layer with SQLite
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use starsailors_core::{Config, Database, DeployRules, DeploymentEngine};
//!
//! # async fn run() -> starsailors_core::Result<()> {
//! let config = Config::load()?;
//!
//! let db = Database::open(&config.database_path())?;
//! db.migrate()?;
//!
//! let engine = DeploymentEngine::new(Arc::new(db), DeployRules::from_config(&config.deploy)?);
//! let window = engine.window(chrono::Utc::now());
//! println!("week runs {} .. {}", window.start, window.end);
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use db::Database;
pub use deploy::{
    ClaimOutcome, DeployRules, DeployStore, DeploymentEngine, DeploymentStatus, Eligibility,
    StatusReport, WeeklyWindow,
};
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod config;
pub mod db;
pub mod deploy;
pub mod error;
pub mod logging;
pub mod types;
