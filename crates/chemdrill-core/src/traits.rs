//! Trait definitions for the engine's external collaborators.
//!
//! The chemistry toolkit is implemented by the `chemdrill-domain` crate; the
//! mastery store by [`crate::store::JsonFileStore`] or any caller-provided
//! backend. Both are synchronous: the pipeline never blocks on them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::mastery::BktState;
use crate::ontology::Element;

// ---------------------------------------------------------------------------
// Chemistry toolkit
// ---------------------------------------------------------------------------

/// Classification of the bond between two elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BondType {
    Ionic,
    CovalentPolar,
    CovalentNonpolar,
    Metallic,
}

impl BondType {
    pub const ALL: [BondType; 4] = [
        BondType::Ionic,
        BondType::CovalentPolar,
        BondType::CovalentNonpolar,
        BondType::Metallic,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BondType::Ionic => "ionic",
            BondType::CovalentPolar => "covalent polar",
            BondType::CovalentNonpolar => "covalent nonpolar",
            BondType::Metallic => "metallic",
        }
    }
}

impl fmt::Display for BondType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pure chemistry functions the solvers call but do not own.
pub trait ChemistryToolkit: Send + Sync {
    /// Classify the bond formed between `a` and `b`.
    fn bond_type(&self, a: &Element, b: &Element) -> BondType;

    /// Ground-state electron configuration for atomic number `z`.
    ///
    /// `exceptions` comes from the ontology snapshot and overrides the
    /// filling-order result for the listed Z values.
    fn electron_config(&self, z: u32, exceptions: &BTreeMap<u32, String>) -> String;

    /// Render a signed charge as a Unicode superscript, e.g. `-2` → `²⁻`.
    fn to_superscript(&self, charge: i32) -> String;
}

// ---------------------------------------------------------------------------
// Mastery persistence
// ---------------------------------------------------------------------------

/// Per-user, per-competency key-value store for BKT state.
///
/// Writes are last-write-wins per competency; there is no cross-key
/// transaction.
pub trait MasteryStore {
    /// Load every stored competency.
    fn load_state(&self) -> anyhow::Result<BktState>;

    /// Persist one competency's `P(L)`.
    fn save_p_l(&mut self, competency_id: &str, p_l: f64) -> anyhow::Result<()>;

    /// Drop all stored state.
    fn clear_state(&mut self) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bond_type_labels() {
        assert_eq!(BondType::CovalentPolar.to_string(), "covalent polar");
        let labels: Vec<_> = BondType::ALL.iter().map(|b| b.label()).collect();
        assert_eq!(labels.len(), 4);
        assert!(labels.contains(&"metallic"));
    }
}
