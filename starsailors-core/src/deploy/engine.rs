//! Deployment engine
//!
//! Wires the window, catalog, streak, eligibility and claim rules to a
//! [`DeployStore`]. Every call takes the user explicitly; nothing is read
//! from ambient request state.
//!
//! Independent reads run concurrently on the blocking pool:
//! - catalog: minor planet count and NGTS research
//! - status: claims this week, comments, upvotes
//! - skill progress: telescope and weather counts
//!
//! The claim batch is the only write.

use chrono::{DateTime, Utc, Weekday};
use serde::Serialize;
use std::sync::Arc;

use super::catalog::{self, CatalogGates};
use super::claims;
use super::eligibility::{DeploymentStatus, Eligibility};
use super::store::DeployStore;
use super::streak::{self, StreakCredit};
use super::window::WeeklyWindow;
use crate::config::DeployConfig;
use crate::error::{Error, Result};
use crate::types::{
    Anomaly, AutomatonKind, ContentSet, DeploymentMode, LinkedAnomaly, Research, SkillProgress,
    UserId, TELESCOPE_SKILL_TYPES, WEATHER_SKILL_TYPES,
};

/// Rule constants, validated from [`DeployConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployRules {
    pub week_start: Weekday,
    pub base_quota: usize,
    pub upgraded_quota: usize,
    pub active_asteroid_threshold: i64,
    pub votes_per_bonus: i64,
}

impl Default for DeployRules {
    fn default() -> Self {
        Self {
            week_start: Weekday::Sun,
            base_quota: 4,
            upgraded_quota: 6,
            active_asteroid_threshold: 2,
            votes_per_bonus: 3,
        }
    }
}

impl DeployRules {
    pub fn from_config(config: &DeployConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            week_start: config.week_start()?,
            base_quota: config.base_quota,
            upgraded_quota: config.upgraded_quota,
            active_asteroid_threshold: config.active_asteroid_threshold,
            votes_per_bonus: config.votes_per_bonus,
        })
    }
}

/// Everything behind a status verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub window: WeeklyWindow,
    pub automaton: AutomatonKind,
    /// Claims already made this window
    pub baseline: i64,
    pub streak: StreakCredit,
    pub eligibility: Eligibility,
}

impl StatusReport {
    pub fn status(&self) -> DeploymentStatus {
        self.eligibility.to_status(self.automaton)
    }
}

/// Result of a claim batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimOutcome {
    /// Rows written; may be fewer than requested
    pub inserted: usize,
    pub max_allowed: usize,
    /// Anomaly ids that were claimed, in request order
    pub anomaly_ids: Vec<i64>,
}

/// Anything that is not already an upstream/task error becomes one, tagged
/// with the read that failed.
fn upstream(what: &'static str, err: Error) -> Error {
    match err {
        Error::UpstreamRead(_) | Error::Task(_) => err,
        other => Error::UpstreamRead(format!("{}: {}", what, other)),
    }
}

fn write_failure(err: Error) -> Error {
    match err {
        Error::Write(_) | Error::Task(_) => err,
        other => Error::Write(other.to_string()),
    }
}

/// The deployment eligibility engine.
pub struct DeploymentEngine<S> {
    store: Arc<S>,
    rules: DeployRules,
}

impl<S> Clone for DeploymentEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            rules: self.rules,
        }
    }
}

impl<S: DeployStore> DeploymentEngine<S> {
    pub fn new(store: Arc<S>, rules: DeployRules) -> Self {
        Self { store, rules }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The window containing `now` under the configured week anchor
    pub fn window(&self, now: DateTime<Utc>) -> WeeklyWindow {
        WeeklyWindow::containing(now, self.rules.week_start)
    }

    /// Run one store read on the blocking pool.
    async fn read<T, F>(&self, what: &'static str, f: F) -> Result<T>
    where
        F: FnOnce(&S) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(&*store))
            .await
            .map_err(|e| Error::Task(format!("{}: {}", what, e)))?
            .map_err(|e| upstream(what, e))
    }

    /// Content sets the user may pick from for `mode`.
    pub async fn visible_sets(
        &self,
        user: UserId,
        mode: DeploymentMode,
    ) -> Result<Vec<ContentSet>> {
        if mode == DeploymentMode::Stellar {
            return Ok(catalog::visible_sets(mode, CatalogGates::default()));
        }

        let threshold = self.rules.active_asteroid_threshold;
        let (minor_planets, ngts) = tokio::join!(
            self.read("classifications", move |store| {
                store.count_classifications(user, &[ContentSet::TelescopeMinorPlanet.as_str()])
            }),
            self.read("researched", move |store| {
                store.has_research(user, Research::NgtsAccess)
            }),
        );

        let gates = CatalogGates {
            active_asteroids: catalog::gate_or_closed(
                "active_asteroids",
                minor_planets.map(|count| catalog::graduated(count, threshold)),
            ),
            ngts: catalog::gate_or_closed("ngts", ngts),
        };

        tracing::debug!(
            user_id = %user,
            active_asteroids = gates.active_asteroids,
            ngts = gates.ngts,
            "Resolved catalog gates"
        );

        Ok(catalog::visible_sets(mode, gates))
    }

    /// Candidate anomalies visible to the user for `mode`.
    pub async fn anomalies(&self, user: UserId, mode: DeploymentMode) -> Result<Vec<Anomaly>> {
        let sets = self.visible_sets(user, mode).await?;
        let names: Vec<&'static str> = sets.iter().map(ContentSet::as_str).collect();
        self.read("anomalies", move |store| store.anomalies_in_sets(&names))
            .await
    }

    /// Eligibility of (user, automaton) for the window containing `now`.
    pub async fn status(
        &self,
        user: UserId,
        automaton: AutomatonKind,
        now: DateTime<Utc>,
    ) -> Result<StatusReport> {
        let window = self.window(now);
        let (start, end) = (window.start, window.end);

        let (baseline, comments, upvotes) = tokio::try_join!(
            self.read("linked_anomalies", move |store| {
                store.count_claims(user, automaton, start, end)
            }),
            self.read("comments", move |store| store.comments(user, start, end)),
            self.read("votes", move |store| store.upvotes(user, start, end)),
        )?;

        let streak = streak::streak_credit(user, &comments, &upvotes, self.rules.votes_per_bonus);
        let eligibility = Eligibility::decide(baseline, streak.bonus);

        tracing::debug!(
            user_id = %user,
            automaton = %automaton,
            baseline,
            bonus = streak.bonus,
            ?eligibility,
            "Computed deployment status"
        );

        Ok(StatusReport {
            window,
            automaton,
            baseline,
            streak,
            eligibility,
        })
    }

    /// Claim up to the user's quota of `requested` anomalies in one batch.
    ///
    /// An empty request fails before anything is read or written.
    pub async fn claim(
        &self,
        user: UserId,
        automaton: AutomatonKind,
        requested: &[i64],
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome> {
        if requested.is_empty() {
            return Err(Error::invalid("No anomalies selected"));
        }

        let upgraded = self
            .read("researched", move |store| {
                store.has_research(user, Research::ProbeReceptors)
            })
            .await?;
        let max_allowed = claims::quota(upgraded, self.rules.base_quota, self.rules.upgraded_quota);
        let selected = claims::select_targets(requested, max_allowed)?;
        let rows = claims::build_claims(user, automaton, &selected, now);

        let store = Arc::clone(&self.store);
        let inserted = tokio::task::spawn_blocking(move || store.insert_claims(&rows))
            .await
            .map_err(|e| Error::Task(format!("linked_anomalies: {}", e)))?
            .map_err(write_failure)?;

        tracing::info!(
            user_id = %user,
            automaton = %automaton,
            requested = requested.len(),
            inserted,
            max_allowed,
            "Claimed anomalies"
        );

        Ok(ClaimOutcome {
            inserted,
            max_allowed,
            anomaly_ids: selected,
        })
    }

    /// Classification counts for the skill tree (all time).
    pub async fn skill_progress(&self, user: UserId) -> Result<SkillProgress> {
        let (telescope, weather) = tokio::try_join!(
            self.read("classifications", move |store| {
                store.count_classifications(user, TELESCOPE_SKILL_TYPES)
            }),
            self.read("classifications", move |store| {
                store.count_classifications(user, WEATHER_SKILL_TYPES)
            }),
        )?;
        Ok(SkillProgress { telescope, weather })
    }

    /// The user's claims with their anomalies, newest first.
    pub async fn linked(&self, user: UserId) -> Result<Vec<LinkedAnomaly>> {
        self.read("linked_anomalies", move |store| store.list_claims(user))
            .await
    }

    pub async fn schema_version(&self) -> Result<i32> {
        self.read("schema", |store| store.schema_version()).await
    }
}
