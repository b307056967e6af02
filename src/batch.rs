// 🏢 Batch Coordinator - Whole-building schedule in floor order
// Each floor runs the classify → cap → aggregate pipeline independently;
// building totals are summed in the exact input floor order so downstream
// export can rely on positional floor identity.

use crate::aggregate::{aggregate_floor, FloorSchedule};
use crate::caps::CapEngine;
use crate::classifier::RoomClassifier;
use crate::error::EngineError;
use crate::room::Room;
use crate::rules::RuleTable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// BUILDING SCHEDULE
// ============================================================================

/// The final area schedule for one building: ordered floor schedules plus
/// building-level totals. Immutable output value, consumed by export/UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingSchedule {
    /// Identifier for this analysis run
    pub run_id: String,

    /// Regulation revision of the rule table that produced this schedule
    pub rule_table_version: String,

    /// Content fingerprint of that table
    pub rule_table_fingerprint: String,

    /// Per-floor schedules, in input floor order
    pub floors: Vec<FloorSchedule>,

    pub total_gfa: f64,
    pub total_nofa: f64,
    pub total_exempt: f64,
    pub total_room_area: f64,

    pub generated_at: DateTime<Utc>,
}

impl BuildingSchedule {
    pub fn floor_count(&self) -> usize {
        self.floors.len()
    }

    pub fn nofa_gfa_ratio(&self) -> f64 {
        if self.total_gfa > 0.0 {
            self.total_nofa / self.total_gfa
        } else {
            0.0
        }
    }

    /// Formatted building report (console). Presentation-time rounding only.
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "═".repeat(60),
            "  BUILDING AREA SCHEDULE".to_string(),
            format!("  Rule table : {}", self.rule_table_version),
            format!("  Run        : {}", self.run_id),
            "═".repeat(60),
        ];

        for floor in &self.floors {
            lines.push(floor.summary());
            lines.push("─".repeat(60));
        }

        lines.push(format!("  Floors          : {:>10}", self.floor_count()));
        lines.push(format!("  Total GFA       : {:>10.2} m²", self.total_gfa));
        lines.push(format!("  Total NOFA      : {:>10.2} m²", self.total_nofa));
        lines.push(format!("  Total exempt    : {:>10.2} m²", self.total_exempt));
        lines.push(format!(
            "  NOFA / GFA      : {:>9.1}%",
            self.nofa_gfa_ratio() * 100.0
        ));
        lines.push("═".repeat(60));

        lines.join("\n")
    }
}

// ============================================================================
// BATCH COORDINATOR
// ============================================================================

pub struct BatchCoordinator {
    table: RuleTable,
    cap_engine: CapEngine,
}

impl BatchCoordinator {
    pub fn new(table: RuleTable) -> Self {
        BatchCoordinator {
            table,
            cap_engine: CapEngine::new(),
        }
    }

    pub fn with_cap_engine(table: RuleTable, cap_engine: CapEngine) -> Self {
        BatchCoordinator { table, cap_engine }
    }

    /// Run one floor through classify → cap → aggregate. A floor either
    /// fully succeeds or the first error surfaces; there is no partial
    /// floor schedule.
    pub fn process_floor(
        &self,
        floor_id: &str,
        rooms: &[Room],
    ) -> Result<FloorSchedule, EngineError> {
        let classifier = RoomClassifier::new(&self.table);
        let classified = classifier.classify_floor(rooms)?;
        let outcome = self.cap_engine.apply_caps(floor_id, &classified);

        Ok(aggregate_floor(floor_id, &classified, &outcome))
    }

    /// Produce the building schedule for an ordered sequence of floors.
    ///
    /// Fails with `EmptyBuilding` on zero floors; any floor error abandons
    /// the whole building for the caller to handle. Output floor order
    /// always matches input order (stable, no re-sorting).
    pub fn aggregate_building(
        &self,
        floors: &[(String, Vec<Room>)],
    ) -> Result<BuildingSchedule, EngineError> {
        if floors.is_empty() {
            return Err(EngineError::EmptyBuilding);
        }

        let mut schedules = Vec::with_capacity(floors.len());
        for (floor_id, rooms) in floors {
            schedules.push(self.process_floor(floor_id, rooms)?);
        }

        let total_gfa = schedules.iter().map(|floor| floor.gfa).sum();
        let total_nofa = schedules.iter().map(|floor| floor.nofa).sum();
        let total_exempt = schedules.iter().map(|floor| floor.exempt_total).sum();
        let total_room_area = schedules.iter().map(|floor| floor.total_room_area).sum();

        Ok(BuildingSchedule {
            run_id: Uuid::new_v4().to_string(),
            rule_table_version: self.table.version().to_string(),
            rule_table_fingerprint: self.table.fingerprint().to_string(),
            floors: schedules,
            total_gfa,
            total_nofa,
            total_exempt,
            total_room_area,
            generated_at: Utc::now(),
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinator() -> BatchCoordinator {
        BatchCoordinator::new(RuleTable::builtin())
    }

    fn simple_floor(floor_id: &str, flat_area: f64, void_area: f64) -> (String, Vec<Room>) {
        (
            floor_id.to_string(),
            vec![
                Room::new(format!("{}-R1", floor_id), "flat", flat_area, floor_id),
                Room::new(format!("{}-V1", floor_id), "void", void_area, floor_id),
            ],
        )
    }

    #[test]
    fn test_empty_building_is_an_error() {
        let result = coordinator().aggregate_building(&[]);
        assert_eq!(result.err(), Some(EngineError::EmptyBuilding));
    }

    #[test]
    fn test_three_floor_rollup_in_input_order() {
        let floors = vec![
            simple_floor("G/F", 500.0, 30.0),
            simple_floor("1/F", 400.0, 20.0),
            simple_floor("2/F", 300.0, 10.0),
        ];

        let schedule = coordinator().aggregate_building(&floors).unwrap();

        assert_eq!(schedule.floor_count(), 3);
        let order: Vec<&str> = schedule
            .floors
            .iter()
            .map(|floor| floor.floor_id.as_str())
            .collect();
        assert_eq!(order, vec!["G/F", "1/F", "2/F"]);

        // Rollup consistency: totals equal the per-floor sums
        let gfa_sum: f64 = schedule.floors.iter().map(|floor| floor.gfa).sum();
        let nofa_sum: f64 = schedule.floors.iter().map(|floor| floor.nofa).sum();
        let exempt_sum: f64 = schedule.floors.iter().map(|floor| floor.exempt_total).sum();

        assert_eq!(schedule.total_gfa, gfa_sum);
        assert_eq!(schedule.total_nofa, nofa_sum);
        assert_eq!(schedule.total_exempt, exempt_sum);
    }

    #[test]
    fn test_conservation_holds_per_floor_and_building() {
        let floors = vec![
            simple_floor("G/F", 640.0, 90.0),
            simple_floor("1/F", 480.0, 16.0),
            simple_floor("2/F", 480.0, 64.0),
        ];

        let schedule = coordinator().aggregate_building(&floors).unwrap();

        for floor in &schedule.floors {
            assert!(floor.conservation_residual().abs() < 1e-9);
        }

        let residual =
            (schedule.total_gfa + schedule.total_exempt) - schedule.total_room_area;
        assert!(residual.abs() < 1e-9);
    }

    #[test]
    fn test_floor_error_abandons_building() {
        let floors = vec![
            simple_floor("G/F", 500.0, 30.0),
            (
                "1/F".to_string(),
                vec![Room::new("1F-X1", "mezzanine-x", 10.0, "1/F")],
            ),
        ];

        let err = coordinator().aggregate_building(&floors).unwrap_err();
        assert_eq!(
            err,
            EngineError::UnknownCategory {
                room_id: "1F-X1".to_string(),
                category: "mezzanine-x".to_string(),
            }
        );
    }

    #[test]
    fn test_schedule_carries_rule_table_provenance() {
        let floors = vec![simple_floor("G/F", 100.0, 5.0)];
        let schedule = coordinator().aggregate_building(&floors).unwrap();

        assert_eq!(schedule.rule_table_version, "APP-2/APP-151 Rev. July 2025");
        assert!(!schedule.rule_table_fingerprint.is_empty());
        assert!(!schedule.run_id.is_empty());
    }

    #[test]
    fn test_floors_are_independent() {
        // The same floor processed alone or alongside others yields the
        // same schedule (no shared mutable state between floors)
        let floor = simple_floor("G/F", 500.0, 120.0);

        let alone = coordinator()
            .aggregate_building(std::slice::from_ref(&floor))
            .unwrap();
        let together = coordinator()
            .aggregate_building(&[floor.clone(), simple_floor("1/F", 300.0, 10.0)])
            .unwrap();

        assert_eq!(alone.floors[0], together.floors[0]);
    }

    #[test]
    fn test_building_summary_formats() {
        let floors = vec![simple_floor("G/F", 1000.0, 150.0)];
        let schedule = coordinator().aggregate_building(&floors).unwrap();

        let text = schedule.summary();
        assert!(text.contains("BUILDING AREA SCHEDULE"));
        assert!(text.contains("APP-2/APP-151"));
        assert!(text.contains("G/F"));
    }

    #[test]
    fn test_schedule_serializes_for_export() {
        let floors = vec![simple_floor("G/F", 100.0, 5.0)];
        let schedule = coordinator().aggregate_building(&floors).unwrap();

        let json = serde_json::to_string(&schedule).unwrap();
        let parsed: BuildingSchedule = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.total_gfa, schedule.total_gfa);
        assert_eq!(parsed.floor_count(), 1);
    }
}
