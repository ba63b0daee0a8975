//! Deployment eligibility engine
//!
//! Decides, for a user and an automaton, which targets are on offer, whether
//! a new batch may be deployed this week, and writes claim batches.
//!
//! - [`window`]: the calendar week all counts are scoped to
//! - [`catalog`]: which content sets a user can see
//! - [`streak`]: extra deploys earned through community engagement
//! - [`eligibility`]: the three-way verdict
//! - [`claims`]: quota, dedup and row building for a batch
//! - [`store`]: the storage seam
//! - [`engine`]: [`DeploymentEngine`], which ties them together

pub mod catalog;
pub mod claims;
pub mod eligibility;
pub mod engine;
pub mod store;
pub mod streak;
pub mod window;

pub use eligibility::{DeploymentStatus, Eligibility, EARNED_ADDITIONAL_DEPLOYS};
pub use engine::{ClaimOutcome, DeployRules, DeploymentEngine, StatusReport};
pub use store::DeployStore;
pub use streak::StreakCredit;
pub use window::WeeklyWindow;
