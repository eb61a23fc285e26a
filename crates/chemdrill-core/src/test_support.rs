//! Shared fixtures for unit tests.

use std::collections::BTreeMap;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::ontology::{Element, MetalType, Ontology};
use crate::traits::{BondType, ChemistryToolkit};

pub(crate) fn fixture_ontology() -> Ontology {
    crate::bundled::ontology().expect("bundled ontology parses")
}

pub(crate) fn rng() -> SmallRng {
    SmallRng::seed_from_u64(42)
}

/// Minimal toolkit with just enough chemistry for the solvers under test.
pub(crate) struct FakeToolkit;

impl ChemistryToolkit for FakeToolkit {
    fn bond_type(&self, a: &Element, b: &Element) -> BondType {
        let delta = match (a.electronegativity, b.electronegativity) {
            (Some(x), Some(y)) => (x - y).abs(),
            _ => 0.0,
        };
        match (a.metal_type, b.metal_type) {
            (MetalType::Metal, MetalType::Metal) => BondType::Metallic,
            _ if delta >= 1.7 => BondType::Ionic,
            _ if delta > 0.4 => BondType::CovalentPolar,
            _ => BondType::CovalentNonpolar,
        }
    }

    fn electron_config(&self, z: u32, exceptions: &BTreeMap<u32, String>) -> String {
        exceptions
            .get(&z)
            .cloned()
            .unwrap_or_else(|| format!("config({z})"))
    }

    fn to_superscript(&self, charge: i32) -> String {
        format!("^{charge}")
    }
}
