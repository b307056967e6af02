// ⚠️ Engine Errors - Structured classification failures
// Every failure identifies the room / category / attribute involved so the
// caller can report it without re-running the floor.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Room category has no entry in the rule table.
    /// The engine never guesses a default treatment - a misclassified room
    /// mis-states statutory compliance.
    UnknownCategory { room_id: String, category: String },

    /// A conditional rule referenced an attribute the room does not supply
    MissingAttribute {
        room_id: String,
        category: String,
        attribute: String,
    },

    /// Negative or non-finite area - rejected before classification
    InvalidArea { room_id: String, area: f64 },

    /// A building schedule with no floors is not a valid output
    EmptyBuilding,

    /// Two rule entries share one category key (rule-table construction)
    DuplicateCategory { category: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::UnknownCategory { room_id, category } => {
                write!(
                    f,
                    "unknown category '{}' for room '{}': no rule table entry",
                    category, room_id
                )
            }
            EngineError::MissingAttribute {
                room_id,
                category,
                attribute,
            } => {
                write!(
                    f,
                    "conditional rule for '{}' needs attribute '{}' which room '{}' does not supply",
                    category, attribute, room_id
                )
            }
            EngineError::InvalidArea { room_id, area } => {
                write!(f, "invalid area {} m² for room '{}'", area, room_id)
            }
            EngineError::EmptyBuilding => {
                write!(f, "building has no floors")
            }
            EngineError::DuplicateCategory { category } => {
                write!(f, "duplicate rule entry for category '{}'", category)
            }
        }
    }
}

impl std::error::Error for EngineError {}

// ============================================================================
// TESTS
// ============================================================================
