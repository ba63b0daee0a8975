//! Database layer for starsailors
//!
//! This module provides the storage layer using SQLite with:
//! - Schema migrations
//! - Repository pattern for queries
//! - Seeding helpers for the tables other services own

pub mod repo;
pub mod schema;

pub use repo::Database;
