//! chemdrill-domain — the chemistry behind the solvers.
//!
//! [`StandardChemistry`] implements [`ChemistryToolkit`] with textbook
//! rules: electronegativity-difference bond classification, Madelung-order
//! electron configurations, and Unicode charge notation.

pub mod bonds;
pub mod electrons;
pub mod notation;

use std::collections::BTreeMap;

use chemdrill_core::ontology::Element;
use chemdrill_core::traits::{BondType, ChemistryToolkit};

pub use bonds::{classify_bond, IONIC_THRESHOLD, POLAR_THRESHOLD};
pub use electrons::{aufbau_config, Subshell, FILLING_ORDER};
pub use notation::{charge_superscript, superscript_number};

/// The default [`ChemistryToolkit`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardChemistry;

impl StandardChemistry {
    pub fn new() -> Self {
        Self
    }
}

impl ChemistryToolkit for StandardChemistry {
    fn bond_type(&self, a: &Element, b: &Element) -> BondType {
        classify_bond(a, b)
    }

    fn electron_config(&self, z: u32, exceptions: &BTreeMap<u32, String>) -> String {
        if let Some(config) = exceptions.get(&z) {
            tracing::trace!(z, "electron configuration from exception table");
            return config.clone();
        }
        aufbau_config(z)
    }

    fn to_superscript(&self, charge: i32) -> String {
        charge_superscript(charge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exceptions_override_filling_order() {
        let chem = StandardChemistry::new();
        let exceptions = BTreeMap::from([(24, "1s² 2s² 2p⁶ 3s² 3p⁶ 4s¹ 3d⁵".to_string())]);
        assert_eq!(chem.electron_config(24, &exceptions), "1s² 2s² 2p⁶ 3s² 3p⁶ 4s¹ 3d⁵");
        assert_eq!(
            chem.electron_config(24, &BTreeMap::new()),
            "1s² 2s² 2p⁶ 3s² 3p⁶ 4s² 3d⁴"
        );
        assert_eq!(chem.electron_config(11, &exceptions), "1s² 2s² 2p⁶ 3s¹");
    }

    #[test]
    fn usable_as_trait_object() {
        let toolkit: &dyn ChemistryToolkit = &StandardChemistry;
        assert_eq!(toolkit.to_superscript(-2), "²⁻");
    }
}
