//! Subcommand implementations.

pub mod answer;
pub mod generate;
pub mod init;
pub mod list;
pub mod mastery;
pub mod validate;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use chemdrill_core::config::ChemdrillConfig;
use chemdrill_core::store::JsonFileStore;
use chemdrill_core::{ExerciseEngine, TemplateRegistry};
use chemdrill_domain::StandardChemistry;

/// Build an engine over the configured ontology and templates.
pub(crate) fn build_engine(config: &ChemdrillConfig) -> Result<ExerciseEngine> {
    let ontology = config.load_ontology()?;
    let templates = config.load_templates()?;
    let registry = TemplateRegistry::new(templates).context("failed to build template registry")?;
    tracing::debug!(templates = registry.len(), "engine ready");
    Ok(ExerciseEngine::new(
        registry,
        Arc::new(ontology),
        Arc::new(StandardChemistry::new()),
        config.engine.clone(),
    ))
}

/// `--store` wins over the configured store path.
pub(crate) fn open_store(store: Option<PathBuf>, config: &ChemdrillConfig) -> JsonFileStore {
    JsonFileStore::new(store.unwrap_or_else(|| config.store_path()))
}
