//! `chemdrill.toml` configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::engine::EngineConfig;
use crate::mastery::BktParams;
use crate::model::TaskTemplate;
use crate::ontology::Ontology;
use crate::parser::{load_ontology, load_templates};

/// Where the ontology and templates come from. Absent paths use the
/// bundled data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default)]
    pub ontology: Option<PathBuf>,
    #[serde(default)]
    pub templates: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasteryConfig {
    /// JSON file holding per-competency `P(L)`.
    #[serde(default = "default_store_path")]
    pub store_path: String,
    /// Used for competencies the ontology does not list.
    #[serde(default)]
    pub default_params: BktParams,
}

fn default_store_path() -> String {
    "${HOME}/.chemdrill/mastery.json".to_string()
}

impl Default for MasteryConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            default_params: BktParams::default(),
        }
    }
}

/// Top-level chemdrill configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChemdrillConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub mastery: MasteryConfig,
}

impl ChemdrillConfig {
    /// The ontology named by `data.ontology`, or the bundled one.
    pub fn load_ontology(&self) -> Result<Ontology> {
        match &self.data.ontology {
            Some(path) => load_ontology(path),
            None => crate::bundled::ontology(),
        }
    }

    /// The templates named by `data.templates`, or the bundled set.
    pub fn load_templates(&self) -> Result<Vec<TaskTemplate>> {
        match &self.data.templates {
            Some(path) => load_templates(path),
            None => crate::bundled::templates(),
        }
    }

    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(&self.mastery.store_path)
    }

    /// BKT parameters for a competency: the ontology's, else the configured
    /// defaults.
    pub fn bkt_params(&self, ontology: &Ontology, competency_id: &str) -> BktParams {
        ontology.bkt_params(competency_id, self.mastery.default_params)
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
    }
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load configuration from `./chemdrill.toml`, or defaults when absent.
///
/// Environment variable override: `CHEMDRILL_MASTERY_STORE`.
pub fn load_config() -> Result<ChemdrillConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default location.
pub fn load_config_from(path: Option<&Path>) -> Result<ChemdrillConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => Some(PathBuf::from("chemdrill.toml")).filter(|local| local.exists()),
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<ChemdrillConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ChemdrillConfig::default(),
    };

    if let Ok(store) = std::env::var("CHEMDRILL_MASTERY_STORE") {
        config.mastery.store_path = store;
    }

    config.mastery.store_path = resolve_env_vars(&config.mastery.store_path);
    config.data.ontology = config.data.ontology.as_deref().map(resolve_path);
    config.data.templates = config.data.templates.as_deref().map(resolve_path);

    Ok(config)
}
