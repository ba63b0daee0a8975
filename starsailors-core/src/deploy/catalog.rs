//! Target catalog lookup
//!
//! Decides which content sets a user may pick targets from. Stellar
//! deployments always see the same three sets. Planetary deployments see
//! the transit and minor planet surveys, plus two gated extras:
//!
//! - active asteroids, once the user has enough minor planet classifications
//! - the NGTS survey, once the user has researched NGTS access
//!
//! The gates are independent. A gate whose lookup fails is treated as not
//! granted (logged, never fatal), so one broken read cannot hide the base
//! sets.

use crate::error::Result;
use crate::types::{ContentSet, DeploymentMode};

/// Per-user unlocks that widen the planetary catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogGates {
    pub active_asteroids: bool,
    pub ngts: bool,
}

/// Content sets visible for `mode`, in declaration order.
pub fn visible_sets(mode: DeploymentMode, gates: CatalogGates) -> Vec<ContentSet> {
    match mode {
        DeploymentMode::Stellar => vec![
            ContentSet::DiskDetective,
            ContentSet::SuperwaspVariable,
            ContentSet::TelescopeSuperwaspVariable,
        ],
        DeploymentMode::Planetary => {
            let mut sets = vec![ContentSet::TelescopeTess, ContentSet::TelescopeMinorPlanet];
            if gates.active_asteroids {
                sets.push(ContentSet::ActiveAsteroids);
            }
            if gates.ngts {
                sets.push(ContentSet::TelescopeNgts);
            }
            sets
        }
    }
}

/// Whether `minor_planet_count` clears the active asteroid threshold
pub fn graduated(minor_planet_count: i64, threshold: i64) -> bool {
    minor_planet_count >= threshold
}

/// Resolve a gate lookup, defaulting to "not granted" on failure.
pub fn gate_or_closed(gate: &'static str, lookup: Result<bool>) -> bool {
    match lookup {
        Ok(granted) => granted,
        Err(e) => {
            tracing::warn!(gate, error = %e, "Catalog gate lookup failed, treating as locked");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_stellar_ignores_gates() {
        let all = CatalogGates {
            active_asteroids: true,
            ngts: true,
        };
        let expected = vec![
            ContentSet::DiskDetective,
            ContentSet::SuperwaspVariable,
            ContentSet::TelescopeSuperwaspVariable,
        ];
        assert_eq!(visible_sets(DeploymentMode::Stellar, all), expected);
        assert_eq!(
            visible_sets(DeploymentMode::Stellar, CatalogGates::default()),
            expected
        );
    }

    #[test]
    fn test_planetary_gates() {
        assert_eq!(
            visible_sets(DeploymentMode::Planetary, CatalogGates::default()),
            vec![ContentSet::TelescopeTess, ContentSet::TelescopeMinorPlanet]
        );
        assert_eq!(
            visible_sets(
                DeploymentMode::Planetary,
                CatalogGates {
                    active_asteroids: true,
                    ngts: false
                }
            ),
            vec![
                ContentSet::TelescopeTess,
                ContentSet::TelescopeMinorPlanet,
                ContentSet::ActiveAsteroids
            ]
        );
        assert_eq!(
            visible_sets(
                DeploymentMode::Planetary,
                CatalogGates {
                    active_asteroids: false,
                    ngts: true
                }
            ),
            vec![
                ContentSet::TelescopeTess,
                ContentSet::TelescopeMinorPlanet,
                ContentSet::TelescopeNgts
            ]
        );
    }

    #[test]
    fn test_graduation_threshold() {
        assert!(!graduated(0, 2));
        assert!(!graduated(1, 2));
        assert!(graduated(2, 2));
        assert!(graduated(7, 2));
    }

    #[test]
    fn test_failed_gate_is_closed() {
        assert!(gate_or_closed("ngts", Ok(true)));
        assert!(!gate_or_closed("ngts", Ok(false)));
        assert!(!gate_or_closed(
            "ngts",
            Err(Error::UpstreamRead("researched: disk I/O error".into()))
        ));
    }
}
