// 📊 Area Aggregator - Per-floor GFA / NOFA / exemption schedule
// Every square metre on a floor is either counted, reclassified into counted,
// or exempt-granted; areas are carried at full input precision and only
// rounded when a summary is printed.

use crate::caps::{CapGroupResult, CapOutcome};
use crate::room::ClassifiedRoom;
use serde::{Deserialize, Serialize};

// ============================================================================
// FLOOR SCHEDULE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorSchedule {
    pub floor_id: String,

    /// Counted room areas plus all excess reclassified out of cap groups (m²)
    pub gfa: f64,

    /// Operational share of GFA: counted areas flagged counts_toward_nofa,
    /// plus their pro-rata share of reclassified excess (m²)
    pub nofa: f64,

    /// Exempt area actually granted, capped groups plus uncapped (m²)
    pub exempt_total: f64,

    /// Raw sum of all room areas on the floor (m²)
    pub total_room_area: f64,

    pub room_count: usize,

    /// Baseline the caps were evaluated against
    pub reference_gfa: f64,

    /// Per cap group outcomes, in CapGroup order
    pub cap_results: Vec<CapGroupResult>,
}

impl FloorSchedule {
    /// Conservation residual: zero (up to float noise) when every square
    /// metre is accounted for
    pub fn conservation_residual(&self) -> f64 {
        (self.gfa + self.exempt_total) - self.total_room_area
    }

    /// Formatted floor block for console reporting. Rounding happens here
    /// and nowhere else.
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("  Floor {:<8}  {} rooms", self.floor_id, self.room_count),
            format!("    GFA          : {:>10.2} m²", self.gfa),
            format!("    NOFA         : {:>10.2} m²", self.nofa),
            format!("    Exempt       : {:>10.2} m²", self.exempt_total),
        ];

        for result in &self.cap_results {
            let flag = if result.is_fully_granted() {
                String::new()
            } else {
                format!("  (excess {:.2} m² → GFA)", result.excess_reclassified)
            };
            lines.push(format!(
                "    {:<20} {:>8.2} / {:>8.2} m² cap{}",
                result.group.as_str(),
                result.exempt_requested,
                result.cap,
                flag
            ));
        }

        lines.join("\n")
    }
}

// ============================================================================
// AGGREGATION
// ============================================================================

/// Roll a floor's classified rooms and cap outcome into a FloorSchedule.
///
/// NOFA attribution of reclassified excess: excess is a floor-level
/// adjustment, so the share coming from NOFA-flagged member rooms is
/// apportioned pro-rata by requested area within each cap group.
pub fn aggregate_floor(
    floor_id: &str,
    rooms: &[ClassifiedRoom],
    outcome: &CapOutcome,
) -> FloorSchedule {
    let counted_area: f64 = rooms
        .iter()
        .filter(|room| room.is_counted())
        .map(|room| room.area_m2)
        .sum();

    let total_room_area: f64 = rooms.iter().map(|room| room.area_m2).sum();

    let gfa = counted_area + outcome.gfa_adjustment;
    let exempt_total = outcome.exempt_granted_total();

    let mut nofa: f64 = rooms
        .iter()
        .filter(|room| room.is_counted() && room.counts_toward_nofa)
        .map(|room| room.area_m2)
        .sum();

    for result in &outcome.results {
        if result.excess_reclassified == 0.0 {
            continue;
        }

        let mut group_area = 0.0;
        let mut nofa_area = 0.0;
        for room in rooms {
            if room.cap_group() == Some(result.group) {
                group_area += room.area_m2;
                if room.counts_toward_nofa {
                    nofa_area += room.area_m2;
                }
            }
        }

        if group_area > 0.0 {
            nofa += result.excess_reclassified * (nofa_area / group_area);
        }
    }

    FloorSchedule {
        floor_id: floor_id.to_string(),
        gfa,
        nofa,
        exempt_total,
        total_room_area,
        room_count: rooms.len(),
        reference_gfa: outcome.reference_gfa,
        cap_results: outcome.results.clone(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
