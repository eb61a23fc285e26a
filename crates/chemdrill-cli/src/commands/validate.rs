//! The `chemdrill validate` command.

use std::path::PathBuf;

use anyhow::Result;

use chemdrill_core::config::load_config_from;
use chemdrill_core::parser::{load_templates, validate_templates};

pub fn execute(templates_path: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let ontology = config.load_ontology()?;
    let templates = match &templates_path {
        Some(path) => load_templates(path)?,
        None => config.load_templates()?,
    };

    println!("Templates: {}", templates.len());

    let warnings = validate_templates(&templates, &ontology);
    for w in &warnings {
        let prefix = w
            .template_id
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("All templates valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
