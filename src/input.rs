// 📂 Input Loading - Parser-boundary room records
// The upstream geometry stage hands the engine already-measured rooms; these
// loaders only deserialize them. Floor order comes from the file, never from
// sorting or filename inference. All validation stays in the engine.

use crate::room::Room;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

// ============================================================================
// BUILDING INPUT (JSON)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingInput {
    /// Optional project label, e.g. "Tower A"
    #[serde(default)]
    pub project: String,

    /// Floors in schedule order
    pub floors: Vec<FloorInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorInput {
    /// Floor label, e.g. "3/F"
    pub floor: String,

    pub rooms: Vec<RoomInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomInput {
    pub id: String,
    pub category: String,
    pub area_m2: f64,
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
}

impl BuildingInput {
    /// Convert to the engine's batch input shape, preserving floor order
    pub fn into_floors(self) -> Vec<(String, Vec<Room>)> {
        self.floors
            .into_iter()
            .map(|floor| {
                let floor_id = floor.floor;
                let rooms = floor
                    .rooms
                    .into_iter()
                    .map(|room| Room {
                        id: room.id,
                        category: room.category,
                        area_m2: room.area_m2,
                        floor_id: floor_id.clone(),
                        attributes: room.attributes,
                    })
                    .collect();
                (floor_id, rooms)
            })
            .collect()
    }
}

/// Load a building input file (JSON)
pub fn load_building_json<P: AsRef<Path>>(path: P) -> Result<Vec<(String, Vec<Room>)>> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read building file: {:?}", path.as_ref()))?;

    let building: BuildingInput =
        serde_json::from_str(&content).context("Failed to parse building JSON")?;

    Ok(building.into_floors())
}

// ============================================================================
// ROOM LIST (CSV)
// ============================================================================

/// One CSV row: floor,id,category,area_m2
#[derive(Debug, Deserialize)]
struct CsvRoomRecord {
    floor: String,
    id: String,
    category: String,
    area_m2: f64,
}

/// Load a flat CSV room list, grouping rooms by floor in first-appearance
/// order. CSV carries no attribute hints; conditional rules that need them
/// will surface `MissingAttribute` at classification time.
pub fn load_rooms_csv<P: AsRef<Path>>(path: P) -> Result<Vec<(String, Vec<Room>)>> {
    let mut rdr = csv::Reader::from_path(path.as_ref())
        .with_context(|| format!("Failed to open room CSV: {:?}", path.as_ref()))?;

    let mut floor_order: Vec<String> = Vec::new();
    let mut rooms_by_floor: HashMap<String, Vec<Room>> = HashMap::new();

    for result in rdr.deserialize() {
        let record: CsvRoomRecord = result.context("Failed to deserialize room row")?;

        if !rooms_by_floor.contains_key(&record.floor) {
            floor_order.push(record.floor.clone());
        }

        rooms_by_floor
            .entry(record.floor.clone())
            .or_default()
            .push(Room::new(
                record.id,
                record.category,
                record.area_m2,
                record.floor,
            ));
    }

    Ok(floor_order
        .into_iter()
        .map(|floor_id| {
            let rooms = rooms_by_floor.remove(&floor_id).unwrap_or_default();
            (floor_id, rooms)
        })
        .collect())
}

// ============================================================================
// TESTS
// ============================================================================
