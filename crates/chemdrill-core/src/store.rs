//! JSON-file mastery store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mastery::BktState;
use crate::traits::MasteryStore;

/// One stored competency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCompetency {
    pub p_l: f64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    competencies: BTreeMap<String, StoredCompetency>,
}

/// Keeps every competency in one pretty-printed JSON file.
///
/// A missing file reads as empty state. Each save rewrites the whole file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored entries with their timestamps.
    pub fn entries(&self) -> Result<BTreeMap<String, StoredCompetency>> {
        Ok(self.read()?.competencies)
    }

    fn read(&self) -> Result<StoreFile> {
        if !self.path.exists() {
            return Ok(StoreFile::default());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read mastery store {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse mastery store {}", self.path.display()))
    }

    fn write(&self, file: &StoreFile) -> Result<()> {
        let json = serde_json::to_string_pretty(file).context("failed to serialize mastery store")?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create directory {}", parent.display())
                })?;
            }
        }
        std::fs::write(&self.path, json)
            .with_context(|| format!("failed to write mastery store {}", self.path.display()))
    }
}

impl MasteryStore for JsonFileStore {
    fn load_state(&self) -> Result<BktState> {
        let mut state = BktState::new();
        for (id, entry) in self.read()?.competencies {
            state.set(id, entry.p_l);
        }
        Ok(state)
    }

    fn save_p_l(&mut self, competency_id: &str, p_l: f64) -> Result<()> {
        let mut file = self.read()?;
        file.competencies.insert(
            competency_id.to_string(),
            StoredCompetency {
                p_l,
                updated_at: Utc::now(),
            },
        );
        tracing::debug!(competency = competency_id, p_l, "saved mastery");
        self.write(&file)
    }

    fn clear_state(&mut self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .with_context(|| format!("failed to remove {}", self.path.display()))?;
        }
        Ok(())
    }
}
