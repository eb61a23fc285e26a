//! Template and ontology loading.
//!
//! Loads task templates from JSON files and directories, parses the ontology
//! snapshot, and validates templates against it.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::generators::{has_random_domain, GENERATOR_IDS};
use crate::model::{ParamValue, PipelineStep, TaskTemplate};
use crate::ontology::Ontology;
use crate::solvers::SOLVER_IDS;

/// A template file holds either a bare array or `{ "templates": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TemplateFile {
    List(Vec<TaskTemplate>),
    Wrapped { templates: Vec<TaskTemplate> },
}

impl TemplateFile {
    fn into_templates(self) -> Vec<TaskTemplate> {
        match self {
            TemplateFile::List(templates) | TemplateFile::Wrapped { templates } => templates,
        }
    }
}

/// Parse templates from a JSON string (useful for testing).
pub fn parse_templates_str(content: &str, source_path: &Path) -> Result<Vec<TaskTemplate>> {
    let file: TemplateFile = serde_json::from_str(content)
        .with_context(|| format!("failed to parse templates: {}", source_path.display()))?;
    Ok(file.into_templates())
}

/// Parse a single JSON template file.
pub fn parse_template_file(path: &Path) -> Result<Vec<TaskTemplate>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read template file: {}", path.display()))?;
    parse_templates_str(&content, path)
}

/// Recursively load all `.json` template files from a directory.
pub fn load_template_directory(dir: &Path) -> Result<Vec<TaskTemplate>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    let mut templates = Vec::new();
    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            templates.extend(load_template_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "json") {
            match parse_template_file(&path) {
                Ok(found) => templates.extend(found),
                Err(e) => tracing::warn!("skipping {}: {:#}", path.display(), e),
            }
        }
    }
    Ok(templates)
}

/// Load templates from a file or a directory.
pub fn load_templates(path: &Path) -> Result<Vec<TaskTemplate>> {
    if path.is_dir() {
        load_template_directory(path)
    } else {
        parse_template_file(path)
    }
}

/// Parse an ontology snapshot from a JSON string.
pub fn parse_ontology_str(content: &str, source_path: &Path) -> Result<Ontology> {
    serde_json::from_str(content)
        .with_context(|| format!("failed to parse ontology: {}", source_path.display()))
}

/// Load an ontology snapshot from a JSON file.
pub fn load_ontology(path: &Path) -> Result<Ontology> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read ontology file: {}", path.display()))?;
    parse_ontology_str(&content, path)
}

/// A warning from template validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationWarning {
    /// The template ID (if applicable).
    pub template_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn new(template: &TaskTemplate, message: impl Into<String>) -> Self {
        Self {
            template_id: Some(template.id.clone()),
            message: message.into(),
        }
    }
}

fn placeholders(step: &PipelineStep) -> impl Iterator<Item = &str> {
    step.params
        .iter()
        .filter(|(_, v)| matches!(v, ParamValue::Placeholder(_)))
        .map(|(k, _)| k.as_str())
}

/// Validate templates against the ontology they will run on.
pub fn validate_templates(templates: &[TaskTemplate], ontology: &Ontology) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let prompts = &ontology.i18n.prompts;

    let mut seen_ids = HashSet::new();
    for t in templates {
        if !seen_ids.insert(&t.id) {
            warnings.push(ValidationWarning::new(t, format!("duplicate template ID: {}", t.id)));
        }
    }

    for t in templates {
        let generator = &t.pipeline.generator;
        if !GENERATOR_IDS.contains(&generator.id.as_str()) {
            warnings.push(ValidationWarning::new(t, format!("unknown generator: {}", generator.id)));
        }
        for key in placeholders(generator) {
            if !has_random_domain(&generator.id, key) {
                warnings.push(ValidationWarning::new(
                    t,
                    format!("placeholder for '{key}' has no random domain in {}", generator.id),
                ));
            }
        }

        if t.pipeline.solvers.is_empty() {
            warnings.push(ValidationWarning::new(t, "pipeline has no solver steps"));
        }
        for solver in &t.pipeline.solvers {
            if !SOLVER_IDS.contains(&solver.id.as_str()) {
                warnings.push(ValidationWarning::new(t, format!("unknown solver: {}", solver.id)));
            }
            for key in placeholders(solver) {
                warnings.push(ValidationWarning::new(
                    t,
                    format!("solver {} does not resolve placeholder '{key}'", solver.id),
                ));
            }
        }

        if !prompts.contains_key(&t.prompt_template_id) {
            warnings.push(ValidationWarning::new(
                t,
                format!("missing prompt template: {}", t.prompt_template_id),
            ));
        }
        if let Some(id) = &t.explanation_template_id {
            if !prompts.contains_key(id) {
                warnings.push(ValidationWarning::new(t, format!("missing explanation template: {id}")));
            }
        }

        let [lo, hi] = t.difficulty.target_band;
        if lo > hi {
            warnings.push(ValidationWarning::new(t, format!("target_band is inverted: [{lo}, {hi}]")));
        }

        if t.competency_hint.is_empty() {
            warnings.push(ValidationWarning::new(t, "competency_hint is empty"));
        }
        for id in t.competency_hint.keys() {
            if ontology.competency(id).is_none() {
                warnings.push(ValidationWarning::new(t, format!("unknown competency: {id}")));
            }
        }
    }

    warnings
}
