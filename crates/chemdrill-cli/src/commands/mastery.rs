//! The `chemdrill mastery` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use chemdrill_core::config::load_config_from;
use chemdrill_core::get_level;
use chemdrill_core::traits::MasteryStore;

use super::open_store;

pub fn execute(store_path: Option<PathBuf>, reset: bool, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let mut store = open_store(store_path, &config);

    if reset {
        store.clear_state()?;
        println!("Mastery store cleared: {}", store.path().display());
        return Ok(());
    }

    let entries = store.entries()?;
    if entries.is_empty() {
        println!("No mastery recorded yet.");
        return Ok(());
    }

    let ontology = config.load_ontology()?;
    let mut table = Table::new();
    table.set_header(vec!["Competency", "Name", "P(L)", "Level", "Updated"]);

    for (id, entry) in &entries {
        let name = ontology.competency(id).map(|c| c.name.as_str()).unwrap_or("?");
        table.add_row(vec![
            Cell::new(id),
            Cell::new(name),
            Cell::new(format!("{:.3}", entry.p_l)),
            Cell::new(get_level(entry.p_l)),
            Cell::new(entry.updated_at.format("%Y-%m-%d %H:%M")),
        ]);
    }

    println!("{table}");
    Ok(())
}
