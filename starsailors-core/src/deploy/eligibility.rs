//! Eligibility decision
//!
//! Combines the number of claims already made this week (`baseline`) with
//! the streak bonus into one of three verdicts. The table is exhaustive:
//!
//! | baseline | bonus | verdict |
//! |----------|-------|---------|
//! | 0        | any   | [`Eligibility::NeverDeployed`] |
//! | > 0      | 0     | [`Eligibility::DeployedNoBonus`] |
//! | > 0      | > 0   | [`Eligibility::DeployedWithBonus`] |

use serde::Serialize;

use crate::types::AutomatonKind;

/// Message shown when engagement has unlocked another deploy
pub const EARNED_ADDITIONAL_DEPLOYS: &str =
    "You have earned additional deploys by interacting with the community this week!";

/// Verdict for one (user, automaton) this week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Eligibility {
    NeverDeployed,
    DeployedNoBonus,
    DeployedWithBonus,
}

impl Eligibility {
    pub fn decide(baseline: i64, bonus: i64) -> Self {
        if baseline <= 0 {
            Eligibility::NeverDeployed
        } else if bonus <= 0 {
            Eligibility::DeployedNoBonus
        } else {
            Eligibility::DeployedWithBonus
        }
    }

    /// Whether a new batch may be created
    pub fn may_deploy(&self) -> bool {
        !matches!(self, Eligibility::DeployedNoBonus)
    }

    /// User-facing message, if the verdict carries one
    pub fn message(&self, automaton: AutomatonKind) -> Option<String> {
        match self {
            Eligibility::NeverDeployed => None,
            Eligibility::DeployedNoBonus => Some(automaton.already_deployed_message()),
            Eligibility::DeployedWithBonus => Some(EARNED_ADDITIONAL_DEPLOYS.to_string()),
        }
    }

    /// Response shape of `GET /deploy?action=status`
    pub fn to_status(&self, automaton: AutomatonKind) -> DeploymentStatus {
        DeploymentStatus {
            already_deployed: !self.may_deploy(),
            deployment_message: self.message(automaton),
        }
    }
}

/// Wire shape of the status answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStatus {
    pub already_deployed: bool,
    pub deployment_message: Option<String>,
}
