// ⚖️ Cap Engine - APP-151 10% exemption ceiling per cap group
// Every cap group on a floor is evaluated against the same fixed baseline
// (the floor's counted GFA before any reclassification), so no group's
// excess can change another group's cap and results never depend on
// processing order.

use crate::room::{ClassifiedRoom, Resolved};
use crate::rules::CapGroup;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// CAP GROUP RESULT
// ============================================================================

/// Outcome of the 10% ceiling for one cap group on one floor.
///
/// Invariants: `exempt_granted = min(exempt_requested, cap)` and
/// `exempt_granted + excess_reclassified = exempt_requested`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapGroupResult {
    pub group: CapGroup,

    /// Sum of member room areas claiming exemption (m²)
    pub exempt_requested: f64,

    /// The group's ceiling: cap rate × the floor's reference GFA (m²)
    pub cap: f64,

    /// Exempted area that survives the ceiling (m²)
    pub exempt_granted: f64,

    /// Requested minus granted, reclassified into the floor's GFA (m²)
    pub excess_reclassified: f64,
}

impl CapGroupResult {
    pub fn is_fully_granted(&self) -> bool {
        self.excess_reclassified == 0.0
    }

    /// Fraction of the ceiling consumed by the request (presentation aid;
    /// can exceed 1.0 when the request overshoots the cap)
    pub fn utilisation(&self) -> f64 {
        if self.cap > 0.0 {
            self.exempt_requested / self.cap
        } else {
            0.0
        }
    }
}

// ============================================================================
// CAP OUTCOME (per floor)
// ============================================================================

/// All cap results for one floor, plus the floor-level GFA adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapOutcome {
    pub floor_id: String,

    /// Baseline the caps were computed against: sum of counted room areas
    /// before any reclassification
    pub reference_gfa: f64,

    /// One entry per cap group with a non-zero request, in CapGroup order
    pub results: Vec<CapGroupResult>,

    /// Sum of all excess_reclassified - added to the floor's GFA as a
    /// floor-level adjustment, not re-attributed to any room
    pub gfa_adjustment: f64,

    /// Exempt area under statutorily uncapped concessions (carparks,
    /// mandatory plant rooms, ...) - granted in full, outside any group
    pub uncapped_exempt: f64,
}

impl CapOutcome {
    /// Total exempt area that survives, capped groups plus uncapped
    pub fn exempt_granted_total(&self) -> f64 {
        self.uncapped_exempt
            + self
                .results
                .iter()
                .map(|result| result.exempt_granted)
                .sum::<f64>()
    }
}

// ============================================================================
// CAP ENGINE
// ============================================================================

/// APP-151 overall cap: 10% of reference GFA per cap group
pub const DEFAULT_CAP_RATE: f64 = 0.10;

pub struct CapEngine {
    /// Ceiling as a fraction of the floor's reference GFA
    pub cap_rate: f64,
}

impl CapEngine {
    pub fn new() -> Self {
        CapEngine {
            cap_rate: DEFAULT_CAP_RATE,
        }
    }

    pub fn with_cap_rate(cap_rate: f64) -> Self {
        CapEngine { cap_rate }
    }

    /// Apply the per-group ceiling to a floor's classified rooms.
    ///
    /// A floor with zero reference GFA degenerates every cap to 0, forcing
    /// full reclassification - conservative (non-exempt) reporting.
    /// Pure function: same input always yields the same outcome.
    pub fn apply_caps(&self, floor_id: &str, rooms: &[ClassifiedRoom]) -> CapOutcome {
        let reference_gfa: f64 = rooms
            .iter()
            .filter(|room| room.is_counted())
            .map(|room| room.area_m2)
            .sum();

        // BTreeMap keys iterate in CapGroup order, detaching the output
        // order from room input order
        let mut requested: BTreeMap<CapGroup, f64> = BTreeMap::new();
        let mut uncapped_exempt = 0.0;

        for room in rooms {
            if let Resolved::Exempt { cap_group } = room.treatment {
                match cap_group {
                    Some(group) => *requested.entry(group).or_insert(0.0) += room.area_m2,
                    None => uncapped_exempt += room.area_m2,
                }
            }
        }

        let cap = self.cap_rate * reference_gfa;
        let mut results = Vec::with_capacity(requested.len());
        let mut gfa_adjustment = 0.0;

        for (group, exempt_requested) in requested {
            // A group whose members all have zero area gets no entry at all
            if exempt_requested == 0.0 {
                continue;
            }

            let exempt_granted = exempt_requested.min(cap);
            let excess_reclassified = exempt_requested - exempt_granted;
            gfa_adjustment += excess_reclassified;

            results.push(CapGroupResult {
                group,
                exempt_requested,
                cap,
                exempt_granted,
                excess_reclassified,
            });
        }

        CapOutcome {
            floor_id: floor_id.to_string(),
            reference_gfa,
            results,
            gfa_adjustment,
            uncapped_exempt,
        }
    }
}

impl Default for CapEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::Resolved;

    fn counted(id: &str, area: f64) -> ClassifiedRoom {
        ClassifiedRoom {
            room_id: id.to_string(),
            category: "flat".to_string(),
            area_m2: area,
            floor_id: "3/F".to_string(),
            treatment: Resolved::Counted,
            counts_toward_nofa: true,
            pnap_ref: "PNAP APP-2".to_string(),
        }
    }

    fn exempt(id: &str, area: f64, group: Option<CapGroup>) -> ClassifiedRoom {
        ClassifiedRoom {
            room_id: id.to_string(),
            category: "void".to_string(),
            area_m2: area,
            floor_id: "3/F".to_string(),
            treatment: Resolved::Exempt { cap_group: group },
            counts_toward_nofa: false,
            pnap_ref: "PNAP APP-2".to_string(),
        }
    }

    #[test]
    fn test_cap_scenario_reference_1000_void_150() {
        // Reference GFA 1000 m², one "void" group requesting 150 m²:
        // cap = 100, granted = 100, excess = 50
        let engine = CapEngine::new();

        let rooms = vec![
            counted("R-1", 600.0),
            counted("R-2", 400.0),
            exempt("V-1", 150.0, Some(CapGroup::Voids)),
        ];

        let outcome = engine.apply_caps("3/F", &rooms);

        assert_eq!(outcome.reference_gfa, 1000.0);
        assert_eq!(outcome.results.len(), 1);

        let result = &outcome.results[0];
        assert_eq!(result.group, CapGroup::Voids);
        assert_eq!(result.exempt_requested, 150.0);
        assert_eq!(result.cap, 100.0);
        assert_eq!(result.exempt_granted, 100.0);
        assert_eq!(result.excess_reclassified, 50.0);
        assert_eq!(outcome.gfa_adjustment, 50.0);
    }

    #[test]
    fn test_granted_plus_excess_equals_requested() {
        let engine = CapEngine::new();

        let rooms = vec![
            counted("R-1", 500.0),
            exempt("V-1", 37.5, Some(CapGroup::Voids)),
            exempt("B-1", 80.0, Some(CapGroup::GreenFeatures)),
        ];

        let outcome = engine.apply_caps("1/F", &rooms);

        for result in &outcome.results {
            assert_eq!(
                result.exempt_granted + result.excess_reclassified,
                result.exempt_requested
            );
            assert!(result.exempt_granted <= result.cap);
            assert!(result.exempt_granted <= result.exempt_requested);
        }
    }

    #[test]
    fn test_groups_share_fixed_baseline() {
        // Two groups both overshooting: each is capped against the same
        // reference GFA, neither sees the other's excess
        let engine = CapEngine::new();

        let rooms = vec![
            counted("R-1", 200.0),
            exempt("V-1", 50.0, Some(CapGroup::Voids)),
            exempt("B-1", 50.0, Some(CapGroup::GreenFeatures)),
        ];

        let outcome = engine.apply_caps("1/F", &rooms);

        assert_eq!(outcome.results.len(), 2);
        for result in &outcome.results {
            assert_eq!(result.cap, 20.0);
            assert_eq!(result.exempt_granted, 20.0);
            assert_eq!(result.excess_reclassified, 30.0);
        }
        assert_eq!(outcome.gfa_adjustment, 60.0);
    }

    #[test]
    fn test_zero_reference_gfa_grants_nothing() {
        // A floor with no counted rooms degenerates the cap to 0
        let engine = CapEngine::new();

        let rooms = vec![exempt("V-1", 20.0, Some(CapGroup::Voids))];
        let outcome = engine.apply_caps("B1", &rooms);

        assert_eq!(outcome.reference_gfa, 0.0);
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].exempt_granted, 0.0);
        assert_eq!(outcome.results[0].excess_reclassified, 20.0);
        assert_eq!(outcome.gfa_adjustment, 20.0);
    }

    #[test]
    fn test_uncapped_exempt_bypasses_ceiling() {
        let engine = CapEngine::new();

        let rooms = vec![
            counted("R-1", 100.0),
            exempt("C-1", 400.0, None), // carpark-style uncapped concession
        ];

        let outcome = engine.apply_caps("B1", &rooms);

        assert!(outcome.results.is_empty());
        assert_eq!(outcome.uncapped_exempt, 400.0);
        assert_eq!(outcome.gfa_adjustment, 0.0);
        assert_eq!(outcome.exempt_granted_total(), 400.0);
    }

    #[test]
    fn test_zero_requested_group_omitted() {
        let engine = CapEngine::new();

        let rooms = vec![
            counted("R-1", 100.0),
            exempt("V-1", 0.0, Some(CapGroup::Voids)),
        ];

        let outcome = engine.apply_caps("1/F", &rooms);

        // No entry, not a zero entry
        assert!(outcome.results.is_empty());
    }

    #[test]
    fn test_cap_idempotence() {
        let engine = CapEngine::new();

        let rooms = vec![
            counted("R-1", 800.0),
            exempt("V-1", 120.0, Some(CapGroup::Voids)),
            exempt("B-1", 30.0, Some(CapGroup::GreenFeatures)),
        ];

        let first = engine.apply_caps("2/F", &rooms);
        let second = engine.apply_caps("2/F", &rooms);

        assert_eq!(first, second);
    }

    #[test]
    fn test_results_in_group_order_regardless_of_input_order() {
        let engine = CapEngine::new();

        let forward = vec![
            counted("R-1", 500.0),
            exempt("B-1", 10.0, Some(CapGroup::GreenFeatures)),
            exempt("V-1", 20.0, Some(CapGroup::Voids)),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let outcome_forward = engine.apply_caps("1/F", &forward);
        let outcome_reversed = engine.apply_caps("1/F", &reversed);

        let groups: Vec<CapGroup> = outcome_forward.results.iter().map(|r| r.group).collect();
        assert_eq!(groups, vec![CapGroup::GreenFeatures, CapGroup::Voids]);
        assert_eq!(outcome_forward.results, outcome_reversed.results);
    }

    #[test]
    fn test_custom_cap_rate() {
        let engine = CapEngine::with_cap_rate(0.05);

        let rooms = vec![
            counted("R-1", 1000.0),
            exempt("V-1", 80.0, Some(CapGroup::Voids)),
        ];

        let outcome = engine.apply_caps("1/F", &rooms);

        assert_eq!(outcome.results[0].cap, 50.0);
        assert_eq!(outcome.results[0].exempt_granted, 50.0);
        assert_eq!(outcome.results[0].excess_reclassified, 30.0);
    }

    #[test]
    fn test_utilisation() {
        let result = CapGroupResult {
            group: CapGroup::Voids,
            exempt_requested: 150.0,
            cap: 100.0,
            exempt_granted: 100.0,
            excess_reclassified: 50.0,
        };

        assert_eq!(result.utilisation(), 1.5);
        assert!(!result.is_fully_granted());
    }
}
