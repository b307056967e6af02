use anyhow::{bail, Result};
use std::env;
use std::path::Path;

// Use library instead of local modules
use gfa_engine::{load_building_json, load_rooms_csv, BatchCoordinator, RuleTable};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let json_output = args.iter().any(|arg| arg == "--json");
    let positional: Vec<&String> = args[1..]
        .iter()
        .filter(|arg| !arg.starts_with("--"))
        .collect();

    if positional.is_empty() {
        eprintln!("Usage: gfa-engine <building.json | rooms.csv> [rules.json] [--json]");
        eprintln!("  building.json  floors + rooms with attribute hints");
        eprintln!("  rooms.csv      flat room list (floor,id,category,area_m2)");
        eprintln!("  rules.json     optional rule table override (builtin otherwise)");
        std::process::exit(1);
    }

    // 1. Rule table: loaded once per run, builtin unless overridden
    let table = match positional.get(1) {
        Some(path) => RuleTable::from_file(path)?,
        None => RuleTable::builtin(),
    };

    if !json_output {
        println!(
            "📋 Rule table: {} ({} entries)",
            table.version(),
            table.entry_count()
        );
    }

    // 2. Load rooms at the parser boundary
    let input_path = Path::new(positional[0]);
    let floors = match input_path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => load_building_json(input_path)?,
        Some("csv") => load_rooms_csv(input_path)?,
        _ => bail!(
            "Unsupported input format (expected .json or .csv): {:?}",
            input_path
        ),
    };

    if !json_output {
        let room_count: usize = floors.iter().map(|(_, rooms)| rooms.len()).sum();
        println!("📂 Loaded {} floors, {} rooms", floors.len(), room_count);
    }

    // 3. Classify, cap, aggregate
    let coordinator = BatchCoordinator::new(table);
    let schedule = coordinator.aggregate_building(&floors)?;

    // 4. Report
    if json_output {
        println!("{}", serde_json::to_string_pretty(&schedule)?);
    } else {
        println!("{}", schedule.summary());
    }

    Ok(())
}
