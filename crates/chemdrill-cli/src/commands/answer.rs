//! The `chemdrill answer` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use chemdrill_core::config::load_config_from;
use chemdrill_core::get_level;
use chemdrill_core::traits::MasteryStore;

use super::open_store;

pub fn execute(
    competency: String,
    correct: bool,
    hint: bool,
    store_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let ontology = config.load_ontology()?;
    anyhow::ensure!(
        ontology.competency(&competency).is_some(),
        "unknown competency: {competency}"
    );

    let mut store = open_store(store_path, &config);
    let mut state = store.load_state()?;
    let params = config.bkt_params(&ontology, &competency);

    let before = state.p_l(&competency, &params);
    let after = state.record(&competency, &params, correct, hint);
    store
        .save_p_l(&competency, after)
        .with_context(|| format!("failed to record answer for {competency}"))?;

    println!(
        "{competency}: P(L) {before:.3} -> {after:.3} ({})",
        get_level(after)
    );
    Ok(())
}
