//! The `chemdrill list` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use chemdrill_core::config::load_config_from;
use chemdrill_core::model::CompetencyWeight;
use chemdrill_core::TaskTemplate;

pub fn execute(
    exam_tag: Option<String>,
    competency: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let templates = config.load_templates()?;

    let selected: Vec<&TaskTemplate> = templates
        .iter()
        .filter(|t| exam_tag.as_ref().is_none_or(|tag| t.exam_tags.contains(tag)))
        .filter(|t| {
            competency
                .as_ref()
                .is_none_or(|id| t.competency_hint.contains_key(id))
        })
        .collect();

    if selected.is_empty() {
        println!("No templates match.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Interaction", "Competencies", "Exam tags", "Band"]);

    for t in &selected {
        let competencies: Vec<String> = t
            .competency_hint
            .iter()
            .map(|(id, weight)| match weight {
                CompetencyWeight::Primary => format!("{id} (P)"),
                CompetencyWeight::Secondary => format!("{id} (S)"),
            })
            .collect();
        let [lo, hi] = t.difficulty.target_band;
        table.add_row(vec![
            Cell::new(&t.id),
            Cell::new(t.meta.interaction),
            Cell::new(competencies.join(", ")),
            Cell::new(t.exam_tags.join(", ")),
            Cell::new(format!("{lo:.2}-{hi:.2}")),
        ]);
    }

    println!("{table}");
    println!("{} template(s)", selected.len());
    Ok(())
}
