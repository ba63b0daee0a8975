//! Core domain types for starsailors
//!
//! These types describe the rows the deployment engine reads and writes.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Automaton** | A deployable instrument (Telescope, WeatherSatellite, Rover, Probe) |
//! | **Anomaly** | A candidate target; belongs to exactly one content set |
//! | **Content Set** | A named citizen-science dataset grouping anomalies |
//! | **Claim** | A `linked_anomalies` row: a user claimed an anomaly for an automaton |
//! | **Research** | An unlocked tech flag (`researched.tech_type`) |
//!
//! Anomalies, classifications, comments, votes and research are owned by
//! other parts of the game. The engine only reads them; the only rows it
//! creates are claims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

// ============================================
// Identity
// ============================================

/// Opaque user identity supplied by the authentication boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Fresh random identity (seeding and tests)
    pub fn new_v4() -> Self {
        UserId(Uuid::new_v4())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(UserId)
            .map_err(|e| format!("invalid user id {:?}: {}", s, e))
    }
}

// ============================================
// Automaton
// ============================================

/// Deployable instrument a claim batch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AutomatonKind {
    Telescope,
    WeatherSatellite,
    Rover,
    Probe,
}

impl AutomatonKind {
    /// Returns the identifier used in database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            AutomatonKind::Telescope => "Telescope",
            AutomatonKind::WeatherSatellite => "WeatherSatellite",
            AutomatonKind::Rover => "Rover",
            AutomatonKind::Probe => "Probe",
        }
    }

    /// Message shown once the weekly deploy has been used up
    pub fn already_deployed_message(&self) -> String {
        let name = match self {
            AutomatonKind::Telescope => "Telescope",
            AutomatonKind::WeatherSatellite => "Weather satellite",
            AutomatonKind::Rover => "Rover",
            AutomatonKind::Probe => "Probe",
        };
        format!(
            "{} has already been deployed this week. Recalibrate & search again next week.",
            name
        )
    }
}

impl std::fmt::Display for AutomatonKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AutomatonKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Telescope" => Ok(AutomatonKind::Telescope),
            "WeatherSatellite" => Ok(AutomatonKind::WeatherSatellite),
            "Rover" => Ok(AutomatonKind::Rover),
            "Probe" => Ok(AutomatonKind::Probe),
            _ => Err(Error::invalid(format!("Invalid automaton: {}", s))),
        }
    }
}

// ============================================
// Deployment mode & content sets
// ============================================

/// Which family of datasets a telescope deployment targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
    Stellar,
    Planetary,
}

impl DeploymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentMode::Stellar => "stellar",
            DeploymentMode::Planetary => "planetary",
        }
    }
}

impl std::fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DeploymentMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stellar" => Ok(DeploymentMode::Stellar),
            "planetary" => Ok(DeploymentMode::Planetary),
            _ => Err(Error::invalid("Invalid deploymentType")),
        }
    }
}

/// Named dataset grouping candidate anomalies (`anomalies.anomaly_set`).
///
/// Declaration order is the order sets are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContentSet {
    DiskDetective,
    SuperwaspVariable,
    TelescopeSuperwaspVariable,
    TelescopeTess,
    TelescopeMinorPlanet,
    ActiveAsteroids,
    TelescopeNgts,
}

impl ContentSet {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentSet::DiskDetective => "diskDetective",
            ContentSet::SuperwaspVariable => "superwasp-variable",
            ContentSet::TelescopeSuperwaspVariable => "telescope-superwasp-variable",
            ContentSet::TelescopeTess => "telescope-tess",
            ContentSet::TelescopeMinorPlanet => "telescope-minorPlanet",
            ContentSet::ActiveAsteroids => "active-asteroids",
            ContentSet::TelescopeNgts => "telescope-ngts",
        }
    }
}

impl std::fmt::Display for ContentSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for ContentSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

// ============================================
// Research & classification tags
// ============================================

/// Unlocked-research flags the engine looks at (`researched.tech_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Research {
    /// Grants the NGTS survey content set
    NgtsAccess,
    /// Raises the per-batch claim quota
    ProbeReceptors,
}

impl Research {
    pub fn as_str(&self) -> &'static str {
        match self {
            Research::NgtsAccess => "ngtsAccess",
            Research::ProbeReceptors => "probereceptors",
        }
    }
}

/// Classification types counted as telescope skill
pub const TELESCOPE_SKILL_TYPES: &[&str] = &["planet", "telescope-minorPlanet"];

/// Classification types counted as weather skill
pub const WEATHER_SKILL_TYPES: &[&str] = &["cloud", "lidar-jovianVortexHunter"];

/// Vote direction stored in `votes.vote_type`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteType {
    Up,
    Down,
}

impl VoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteType::Up => "up",
            VoteType::Down => "down",
        }
    }
}

// ============================================
// Rows
// ============================================

/// A candidate target.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    pub id: i64,
    pub content: Option<String>,
    pub anomaly_type: Option<String>,
    pub anomaly_set: Option<String>,
    /// Dataset-specific payload, `{}` when absent
    pub configuration: serde_json::Value,
}

/// A persisted claim (`linked_anomalies` row).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentClaim {
    pub id: i64,
    pub author: UserId,
    pub anomaly_id: i64,
    /// Filled in later by the classification workflow
    pub classification_id: Option<i64>,
    pub automaton: AutomatonKind,
    pub date: DateTime<Utc>,
}

/// A claim about to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewClaim {
    pub author: UserId,
    pub anomaly_id: i64,
    pub automaton: AutomatonKind,
    pub date: DateTime<Utc>,
}

/// Anomaly fields joined onto a claim for listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalySummary {
    pub id: i64,
    pub content: Option<String>,
    pub anomaly_type: Option<String>,
    pub anomaly_set: Option<String>,
}

/// A claim with its anomaly, if the anomaly still exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedAnomaly {
    #[serde(flatten)]
    pub claim: DeploymentClaim,
    pub anomaly: Option<AnomalySummary>,
}

/// A comment or vote by the user, with the author of the classification it
/// points at. `target_author` is the stored author text, `None` when the
/// classification is gone or has no author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionRow {
    pub id: i64,
    pub target_author: Option<String>,
}

/// Classification counts backing the skill tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkillProgress {
    pub telescope: i64,
    pub weather: i64,
}
