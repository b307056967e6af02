// GFA Engine - Core Library
// Room classification and area aggregation for Hong Kong floor plans under
// PNAP APP-2 / APP-151. Exposes all modules for use in the CLI and tests.

pub mod aggregate;
pub mod batch;
pub mod caps;
pub mod classifier;
pub mod error;
pub mod input;
pub mod room;
pub mod rules;

// Re-export commonly used types
pub use aggregate::{aggregate_floor, FloorSchedule};
pub use batch::{BatchCoordinator, BuildingSchedule};
pub use caps::{CapEngine, CapGroupResult, CapOutcome, DEFAULT_CAP_RATE};
pub use classifier::RoomClassifier;
pub use error::EngineError;
pub use input::{load_building_json, load_rooms_csv, BuildingInput, FloorInput, RoomInput};
pub use room::{ClassifiedRoom, Resolved, Room};
pub use rules::{CapGroup, Condition, RuleEntry, RuleTable, Treatment};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
