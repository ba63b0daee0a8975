//! Storage seam for the deployment engine
//!
//! The engine never talks to SQL directly. It reads and writes through
//! [`DeployStore`], which [`Database`] implements. Calls are synchronous;
//! the engine runs each one on the blocking pool so independent reads can
//! be in flight together.

use chrono::{DateTime, Utc};

use crate::db::Database;
use crate::error::Result;
use crate::types::{
    Anomaly, AutomatonKind, InteractionRow, LinkedAnomaly, NewClaim, Research, UserId,
};

/// Reads and the single write the engine needs.
pub trait DeployStore: Send + Sync + 'static {
    /// Anomalies in any of `sets`, ordered by id
    fn anomalies_in_sets(&self, sets: &[&str]) -> Result<Vec<Anomaly>>;

    /// All-time count of the user's classifications of the given types
    fn count_classifications(&self, user: UserId, types: &[&str]) -> Result<i64>;

    /// Whether the user has unlocked `research`
    fn has_research(&self, user: UserId, research: Research) -> Result<bool>;

    /// Claims for (user, automaton) dated in `[start, end)`
    fn count_claims(
        &self,
        user: UserId,
        automaton: AutomatonKind,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64>;

    /// Comments the user wrote in `[start, end)`
    fn comments(
        &self,
        user: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<InteractionRow>>;

    /// Upvotes the user cast in `[start, end)`
    fn upvotes(
        &self,
        user: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<InteractionRow>>;

    /// Insert every claim or none of them; returns rows written
    fn insert_claims(&self, claims: &[NewClaim]) -> Result<usize>;

    /// The user's claims, newest first
    fn list_claims(&self, user: UserId) -> Result<Vec<LinkedAnomaly>>;

    /// Applied schema version, used as a liveness check
    fn schema_version(&self) -> Result<i32>;
}

impl DeployStore for Database {
    fn anomalies_in_sets(&self, sets: &[&str]) -> Result<Vec<Anomaly>> {
        Database::anomalies_in_sets(self, sets)
    }

    fn count_classifications(&self, user: UserId, types: &[&str]) -> Result<i64> {
        Database::count_classifications(self, user, types)
    }

    fn has_research(&self, user: UserId, research: Research) -> Result<bool> {
        Database::has_research(self, user, research)
    }

    fn count_claims(
        &self,
        user: UserId,
        automaton: AutomatonKind,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64> {
        self.count_claims_between(user, automaton, start, end)
    }

    fn comments(
        &self,
        user: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<InteractionRow>> {
        self.comments_between(user, start, end)
    }

    fn upvotes(
        &self,
        user: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<InteractionRow>> {
        self.upvotes_between(user, start, end)
    }

    fn insert_claims(&self, claims: &[NewClaim]) -> Result<usize> {
        Database::insert_claims(self, claims)
    }

    fn list_claims(&self, user: UserId) -> Result<Vec<LinkedAnomaly>> {
        Database::list_claims(self, user)
    }

    fn schema_version(&self) -> Result<i32> {
        Database::schema_version(self)
    }
}
