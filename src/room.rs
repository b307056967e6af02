// 🚪 Room Data Model - Input records and classified output
// Rooms arrive from the external parser already measured; classification
// produces a derived record, never an in-place edit.

use crate::rules::CapGroup;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// ROOM (input record)
// ============================================================================

/// One detected/declared space on a floor plan.
///
/// `category` must be pre-normalized to the rule table's vocabulary by the
/// upstream parser; unknown categories surface as `UnknownCategory` at
/// classification time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    /// Unique within a floor
    pub id: String,

    /// Normalized category key, e.g. "utility platform"
    pub category: String,

    /// Measured floor area in square metres
    pub area_m2: f64,

    /// Owning floor
    pub floor_id: String,

    /// Optional structured hints used to resolve conditional rules,
    /// e.g. {"prerequisites_met": true, "building_type": "non_domestic"}
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
}

impl Room {
    pub fn new(
        id: impl Into<String>,
        category: impl Into<String>,
        area_m2: f64,
        floor_id: impl Into<String>,
    ) -> Self {
        Room {
            id: id.into(),
            category: category.into(),
            area_m2,
            floor_id: floor_id.into(),
            attributes: HashMap::new(),
        }
    }

    /// Builder: attach an attribute hint
    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

// ============================================================================
// RESOLVED TREATMENT
// ============================================================================

/// Treatment after conditional resolution. CONDITIONAL never escapes the
/// classifier: every classified room is either counted or exempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Resolved {
    /// Counted toward GFA in full
    Counted,

    /// Exempt from GFA; a cap group membership means the exemption competes
    /// for that group's 10% allowance, `None` means statutorily uncapped
    Exempt { cap_group: Option<CapGroup> },
}

impl Resolved {
    pub fn is_counted(&self) -> bool {
        matches!(self, Resolved::Counted)
    }

    pub fn is_exempt(&self) -> bool {
        matches!(self, Resolved::Exempt { .. })
    }
}

// ============================================================================
// CLASSIFIED ROOM (derived record)
// ============================================================================

/// Room plus its resolved treatment and NOFA flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedRoom {
    pub room_id: String,
    pub category: String,
    pub area_m2: f64,
    pub floor_id: String,

    /// Resolved treatment (Counted or Exempt)
    pub treatment: Resolved,

    /// Whether this area contributes to NOFA when counted
    pub counts_toward_nofa: bool,

    /// Governing practice-note reference from the matched rule entry
    pub pnap_ref: String,
}

impl ClassifiedRoom {
    pub fn is_counted(&self) -> bool {
        self.treatment.is_counted()
    }

    pub fn is_exempt(&self) -> bool {
        self.treatment.is_exempt()
    }

    /// Cap group membership, if this room is exempt under a capped group
    pub fn cap_group(&self) -> Option<CapGroup> {
        match self.treatment {
            Resolved::Exempt { cap_group } => cap_group,
            Resolved::Counted => None,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
