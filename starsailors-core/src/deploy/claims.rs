//! Claim writer helpers
//!
//! A batch keeps the first occurrence of each requested anomaly id, in
//! request order, and is cut to the user's quota. Duplicates across batches
//! are not prevented here.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::types::{AutomatonKind, NewClaim, UserId};

/// Per-batch quota
pub fn quota(upgraded: bool, base_quota: usize, upgraded_quota: usize) -> usize {
    if upgraded {
        upgraded_quota
    } else {
        base_quota
    }
}

/// Deduplicate (first occurrence wins) and truncate to `max_allowed`.
pub fn select_targets(requested: &[i64], max_allowed: usize) -> Result<Vec<i64>> {
    if requested.is_empty() {
        return Err(Error::invalid("No anomalies selected"));
    }

    let mut seen = HashSet::with_capacity(requested.len());
    let selected: Vec<i64> = requested
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .take(max_allowed)
        .collect();

    if selected.is_empty() {
        return Err(Error::invalid("No anomalies selected"));
    }
    Ok(selected)
}

/// Rows for one batch, all stamped with the same instant.
pub fn build_claims(
    user: UserId,
    automaton: AutomatonKind,
    anomaly_ids: &[i64],
    now: DateTime<Utc>,
) -> Vec<NewClaim> {
    anomaly_ids
        .iter()
        .map(|&anomaly_id| NewClaim {
            author: user,
            anomaly_id,
            automaton,
            date: now,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota() {
        assert_eq!(quota(false, 4, 6), 4);
        assert_eq!(quota(true, 4, 6), 6);
    }

    #[test]
    fn test_dedup_then_truncate() {
        let selected = select_targets(&[5, 5, 7, 7, 7, 9], 4).unwrap();
        assert_eq!(selected, vec![5, 7, 9]);

        let selected = select_targets(&[9, 1, 9, 2, 3, 4, 5], 4).unwrap();
        assert_eq!(selected, vec![9, 1, 2, 3]);
    }

    #[test]
    fn test_upgraded_quota_allows_six() {
        let requested: Vec<i64> = (1..=10).collect();
        assert_eq!(select_targets(&requested, 6).unwrap(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_empty_selection_rejected() {
        let err = select_targets(&[], 4).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "No anomalies selected");
    }

    #[test]
    fn test_build_claims_shares_timestamp() {
        let user = UserId::new_v4();
        let now = Utc::now();
        let claims = build_claims(user, AutomatonKind::Telescope, &[3, 1], now);
        assert_eq!(claims.len(), 2);
        assert!(claims.iter().all(|c| c.date == now && c.author == user));
        assert_eq!(claims[0].anomaly_id, 3);
        assert_eq!(claims[1].anomaly_id, 1);
    }
}
