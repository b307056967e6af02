// 📋 Room Classifier - Resolves each room to Counted or Exempt
// Classification of one room never depends on any other room; a floor either
// fully classifies or the first error aborts it.

use crate::error::EngineError;
use crate::room::{ClassifiedRoom, Resolved, Room};
use crate::rules::{RuleTable, Treatment};

// ============================================================================
// ROOM CLASSIFIER
// ============================================================================

/// Applies one rule table to rooms. The table is passed in explicitly and
/// borrowed for the classifier's lifetime - never ambient state.
pub struct RoomClassifier<'a> {
    table: &'a RuleTable,
}

impl<'a> RoomClassifier<'a> {
    pub fn new(table: &'a RuleTable) -> Self {
        RoomClassifier { table }
    }

    /// Classify a single room.
    ///
    /// 1. Reject negative / non-finite areas before any lookup.
    /// 2. Resolve the rule entry for the room's category.
    /// 3. Counted / Exempt map directly; Conditional evaluates the entry's
    ///    condition against the room's attributes (true → exempt with the
    ///    entry's cap group, false → counted).
    pub fn classify(&self, room: &Room) -> Result<ClassifiedRoom, EngineError> {
        if !room.area_m2.is_finite() || room.area_m2 < 0.0 {
            return Err(EngineError::InvalidArea {
                room_id: room.id.clone(),
                area: room.area_m2,
            });
        }

        let entry = self.table.lookup(&room.category).ok_or_else(|| {
            EngineError::UnknownCategory {
                room_id: room.id.clone(),
                category: room.category.clone(),
            }
        })?;

        let treatment = match entry.treatment {
            Treatment::Counted => Resolved::Counted,
            Treatment::Exempt => Resolved::Exempt {
                cap_group: entry.cap_group,
            },
            Treatment::Conditional => {
                let exempt = match &entry.condition {
                    Some(condition) => condition.evaluate(room)?,
                    // Conditional entry without a predicate never exempts
                    None => false,
                };

                if exempt {
                    Resolved::Exempt {
                        cap_group: entry.cap_group,
                    }
                } else {
                    Resolved::Counted
                }
            }
        };

        Ok(ClassifiedRoom {
            room_id: room.id.clone(),
            category: room.category.clone(),
            area_m2: room.area_m2,
            floor_id: room.floor_id.clone(),
            treatment,
            counts_toward_nofa: entry.counts_toward_nofa,
            pnap_ref: entry.pnap_ref.clone(),
        })
    }

    /// Classify every room on a floor. The first failure aborts the whole
    /// floor - no partial output.
    pub fn classify_floor(&self, rooms: &[Room]) -> Result<Vec<ClassifiedRoom>, EngineError> {
        let mut classified = Vec::with_capacity(rooms.len());

        for room in rooms {
            classified.push(self.classify(room)?);
        }

        Ok(classified)
    }
}

// ============================================================================
// TESTS
// ============================================================================
