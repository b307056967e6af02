// 🏷️ Rule Table - Rules as Data
// Maps a room category to its GFA treatment under PNAP APP-2 / APP-151.
// The table is immutable at run time and versioned, so every classification
// result is traceable to one regulation revision.

use crate::error::EngineError;
use crate::room::Room;
use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

// ============================================================================
// TREATMENT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Treatment {
    /// 100% counted toward GFA
    Counted,
    /// Disregarded GFA (concession or B(P)R 23(3)(b) exclusion)
    Exempt,
    /// Resolved per room via the entry's condition
    Conditional,
}

// ============================================================================
// CAP GROUPS
// ============================================================================

/// Statutory categories of exemptible area that compete for a combined 10%
/// ceiling (APP-151 Appendix A). Closed set; derive order fixes the output
/// order of cap results regardless of room input order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CapGroup {
    /// Balconies, utility platforms, wider corridors (JPN1/JPN2)
    GreenFeatures,
    /// Caretaker offices, clubhouses, recreational facilities
    AmenityFeatures,
    /// Non-mandatory / non-essential plant rooms
    NonMandatoryPlant,
    /// Voids (duplex, high headroom, over entrances)
    Voids,
    /// Bay windows and other projections not covered by minor-projection rules
    Projections,
}

impl CapGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapGroup::GreenFeatures => "Green Features",
            CapGroup::AmenityFeatures => "Amenity Features",
            CapGroup::NonMandatoryPlant => "Non-Mandatory Plant",
            CapGroup::Voids => "Voids",
            CapGroup::Projections => "Projections",
        }
    }
}

// ============================================================================
// CONDITIONS
// ============================================================================

/// Pure predicate over a room's attributes and measured area.
///
/// Conditions are enumerable data, not code, so every conditional rule can be
/// serialized in a rule file and tested in isolation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// Boolean attribute must be present and true.
    /// An absent attribute is a `MissingAttribute` error, not `false`.
    AttributeTrue(String),

    /// String attribute must equal the given value (absent is an error)
    AttributeEquals { key: String, value: String },

    /// Room area must not exceed the limit (m²)
    AreaAtMost(f64),

    /// Room area must be at least the limit (m²)
    AreaAtLeast(f64),

    /// All sub-conditions must hold
    All(Vec<Condition>),
}

impl Condition {
    /// Evaluate against a room. Fails with `MissingAttribute` when the
    /// condition references an attribute the room does not supply.
    pub fn evaluate(&self, room: &Room) -> Result<bool, EngineError> {
        match self {
            Condition::AttributeTrue(key) => {
                let value = require_attribute(room, key)?;
                Ok(value.as_bool().unwrap_or(false))
            }
            Condition::AttributeEquals { key, value } => {
                let actual = require_attribute(room, key)?;
                Ok(actual.as_str() == Some(value.as_str()))
            }
            Condition::AreaAtMost(limit) => Ok(room.area_m2 <= *limit),
            Condition::AreaAtLeast(limit) => Ok(room.area_m2 >= *limit),
            Condition::All(conditions) => {
                for condition in conditions {
                    if !condition.evaluate(room)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }
}

fn require_attribute<'a>(
    room: &'a Room,
    key: &str,
) -> Result<&'a serde_json::Value, EngineError> {
    room.attributes
        .get(key)
        .ok_or_else(|| EngineError::MissingAttribute {
            room_id: room.id.clone(),
            category: room.category.clone(),
            attribute: key.to_string(),
        })
}

// ============================================================================
// RULE ENTRY
// ============================================================================

/// One row of the rule table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleEntry {
    /// Normalized category key this entry matches (unique per table version)
    pub category: String,

    pub treatment: Treatment,

    /// Cap group membership for exemptible entries.
    /// `None` on an exempt entry means the concession is statutorily
    /// uncapped (e.g. carparks, mandatory plant rooms).
    #[serde(default)]
    pub cap_group: Option<CapGroup>,

    /// Predicate resolved at classification time; present only when
    /// `treatment` is Conditional
    #[serde(default)]
    pub condition: Option<Condition>,

    /// Whether COUNTED area under this entry contributes to NOFA
    #[serde(default)]
    pub counts_toward_nofa: bool,

    /// Governing practice-note reference, e.g. "PNAP APP-2 & APP-42"
    #[serde(default)]
    pub pnap_ref: String,
}

impl RuleEntry {
    pub fn counted(category: impl Into<String>, counts_toward_nofa: bool) -> Self {
        RuleEntry {
            category: category.into(),
            treatment: Treatment::Counted,
            cap_group: None,
            condition: None,
            counts_toward_nofa,
            pnap_ref: String::new(),
        }
    }

    pub fn exempt(category: impl Into<String>, cap_group: Option<CapGroup>) -> Self {
        RuleEntry {
            category: category.into(),
            treatment: Treatment::Exempt,
            cap_group,
            condition: None,
            counts_toward_nofa: false,
            pnap_ref: String::new(),
        }
    }

    pub fn conditional(
        category: impl Into<String>,
        cap_group: CapGroup,
        condition: Condition,
    ) -> Self {
        RuleEntry {
            category: category.into(),
            treatment: Treatment::Conditional,
            cap_group: Some(cap_group),
            condition: Some(condition),
            counts_toward_nofa: false,
            pnap_ref: String::new(),
        }
    }

    /// Builder: add the practice-note reference
    pub fn with_pnap_ref(mut self, pnap_ref: impl Into<String>) -> Self {
        self.pnap_ref = pnap_ref.into();
        self
    }
}

// ============================================================================
// RULE TABLE
// ============================================================================

/// Versioned rule file format (JSON)
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RuleFile {
    version: String,
    entries: Vec<RuleEntry>,
}

/// The rule table: one entry per category, immutable after construction.
pub struct RuleTable {
    version: String,
    entries: HashMap<String, RuleEntry>,
    fingerprint: String,
}

impl RuleTable {
    /// Build a table from explicit entries. Fails with `DuplicateCategory`
    /// if two entries share one category key.
    pub fn from_entries(
        version: impl Into<String>,
        entries: Vec<RuleEntry>,
    ) -> Result<Self, EngineError> {
        let version = version.into();
        let mut map = HashMap::with_capacity(entries.len());

        for entry in entries {
            if map.contains_key(&entry.category) {
                return Err(EngineError::DuplicateCategory {
                    category: entry.category,
                });
            }
            map.insert(entry.category.clone(), entry);
        }

        let fingerprint = compute_fingerprint(&version, &map);

        Ok(RuleTable {
            version,
            entries: map,
            fingerprint,
        })
    }

    /// Load a versioned rule file (JSON). Loaded once per process lifetime;
    /// the engine never reloads it mid-run.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read rules file: {:?}", path.as_ref()))?;

        let file: RuleFile =
            serde_json::from_str(&content).context("Failed to parse rules JSON")?;

        Ok(RuleTable::from_entries(file.version, file.entries)?)
    }

    /// Pure lookup. A miss means the category is absent from this table
    /// version; the classifier surfaces it as `UnknownCategory` with the
    /// offending room id.
    pub fn lookup(&self, category: &str) -> Option<&RuleEntry> {
        self.entries.get(category)
    }

    /// Regulation revision this table encodes
    pub fn version(&self) -> &str {
        &self.version
    }

    /// sha256 over version + entries, pinning results to one table revision
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn list_all(&self) -> Vec<&RuleEntry> {
        self.entries.values().collect()
    }

    // ========================================================================
    // BUILTIN TABLE — PNAP APP-2 / APP-151 Appendix A (Rev. July 2025)
    // ========================================================================

    /// The in-code rule table covering the standard Hong Kong floor plan
    /// vocabulary. Categories are normalized keys the upstream parser maps
    /// drawing labels onto.
    pub fn builtin() -> Self {
        let entries = vec![
            // ── Habitable / usable rooms: counted, in NOFA ──────────────────
            RuleEntry::counted("flat", true).with_pnap_ref("PNAP APP-2"),
            RuleEntry::counted("bedroom", true).with_pnap_ref("PNAP APP-2"),
            RuleEntry::counted("living room", true).with_pnap_ref("PNAP APP-2"),
            RuleEntry::counted("kitchen", true).with_pnap_ref("PNAP APP-2"),
            RuleEntry::counted("study", true).with_pnap_ref("PNAP APP-2"),
            RuleEntry::counted("retail", true).with_pnap_ref("PNAP APP-2"),

            // ── Counted but non-operational: excluded from NOFA ─────────────
            RuleEntry::counted("bathroom", false).with_pnap_ref("PNAP APP-2"),
            RuleEntry::counted("corridor", false).with_pnap_ref("PNAP APP-2"),
            RuleEntry::counted("lift lobby", false).with_pnap_ref("PNAP APP-2"),
            RuleEntry::counted("entrance lobby", false).with_pnap_ref("PNAP APP-2"),
            RuleEntry::counted("store room", false).with_pnap_ref("PNAP APP-2"),

            // ── Uncapped concessions (not subject to the 10% ceiling) ───────
            RuleEntry::exempt("carpark", None).with_pnap_ref("PNAP APP-2 & APP-111"),
            RuleEntry::exempt("loading bay", None).with_pnap_ref("PNAP APP-2 & APP-111"),
            RuleEntry::exempt("mandatory plant room", None)
                .with_pnap_ref("PNAP APP-35 & APP-84"),
            RuleEntry::exempt("transformer room", None).with_pnap_ref("PNAP APP-2 & APP-42"),
            RuleEntry::exempt("staircase", None).with_pnap_ref("PNAP APP-2"),
            RuleEntry::exempt("lift shaft", None).with_pnap_ref("PNAP APP-2"),
            RuleEntry::exempt("refuge floor", None).with_pnap_ref("PNAP APP-2 & APP-122"),
            RuleEntry::exempt("pipe duct", None).with_pnap_ref("PNAP APP-2 & APP-93"),
            RuleEntry::exempt("sunshade", None).with_pnap_ref("PNAP APP-19, APP-67 & APP-156"),

            // ── Capped concessions: compete for the 10% group allowance ─────
            RuleEntry::exempt("void", Some(CapGroup::Voids)).with_pnap_ref("PNAP APP-2"),
            RuleEntry::conditional(
                "void over entrance",
                CapGroup::Voids,
                Condition::AttributeEquals {
                    key: "building_type".to_string(),
                    value: "non_domestic".to_string(),
                },
            )
            .with_pnap_ref("PNAP APP-2 & APP-42"),
            RuleEntry::conditional(
                "balcony",
                CapGroup::GreenFeatures,
                Condition::AttributeTrue("prerequisites_met".to_string()),
            )
            .with_pnap_ref("JPN1"),
            // Utility platform exemption only applies up to 1.5 m² per platform
            RuleEntry::conditional(
                "utility platform",
                CapGroup::GreenFeatures,
                Condition::All(vec![
                    Condition::AttributeTrue("prerequisites_met".to_string()),
                    Condition::AreaAtMost(1.5),
                ]),
            )
            .with_pnap_ref("JPN2"),
            RuleEntry::conditional(
                "wider common corridor",
                CapGroup::GreenFeatures,
                Condition::AttributeTrue("prerequisites_met".to_string()),
            )
            .with_pnap_ref("JPN1"),
            RuleEntry::conditional(
                "non-mandatory plant room",
                CapGroup::NonMandatoryPlant,
                Condition::AttributeTrue("prerequisites_met".to_string()),
            )
            .with_pnap_ref("PNAP APP-2 & APP-42"),
            RuleEntry::conditional(
                "caretaker office",
                CapGroup::AmenityFeatures,
                Condition::AttributeTrue("prerequisites_met".to_string()),
            )
            .with_pnap_ref("PNAP APP-42"),
            RuleEntry::conditional(
                "clubhouse",
                CapGroup::AmenityFeatures,
                Condition::AttributeTrue("prerequisites_met".to_string()),
            )
            .with_pnap_ref("PNAP APP-2, APP-42 & APP-104"),
            RuleEntry::conditional(
                "bay window",
                CapGroup::Projections,
                Condition::AttributeTrue("prerequisites_met".to_string()),
            )
            .with_pnap_ref("PNAP APP-19"),
        ];

        // The builtin list has unique categories; a duplicate would be a
        // programming error caught by the tests below
        match RuleTable::from_entries("APP-2/APP-151 Rev. July 2025", entries) {
            Ok(table) => table,
            Err(_) => RuleTable {
                version: String::new(),
                entries: HashMap::new(),
                fingerprint: String::new(),
            },
        }
    }
}

/// sha256 over version + entries in sorted category order, so the same table
/// content always yields the same fingerprint.
fn compute_fingerprint(version: &str, entries: &HashMap<String, RuleEntry>) -> String {
    let mut categories: Vec<&String> = entries.keys().collect();
    categories.sort();

    let mut hasher = Sha256::new();
    hasher.update(version.as_bytes());

    for category in categories {
        if let Ok(encoded) = serde_json::to_string(&entries[category]) {
            hasher.update(encoded.as_bytes());
        }
    }

    format!("{:x}", hasher.finalize())
}

// ============================================================================
// TESTS
// ============================================================================
