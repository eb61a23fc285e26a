//! Bond classification by electronegativity difference.

use chemdrill_core::ontology::{Element, MetalType};
use chemdrill_core::traits::BondType;

/// Δχ at or above which a bond counts as ionic.
pub const IONIC_THRESHOLD: f64 = 1.7;

/// Δχ above which a covalent bond counts as polar.
pub const POLAR_THRESHOLD: f64 = 0.4;

/// Classify the bond between `a` and `b`.
///
/// Two metals bond metallically regardless of Δχ. Otherwise the
/// electronegativity difference decides. An element without an
/// electronegativity (the lighter noble gases) contributes Δχ = 0.
pub fn classify_bond(a: &Element, b: &Element) -> BondType {
    if a.metal_type == MetalType::Metal && b.metal_type == MetalType::Metal {
        return BondType::Metallic;
    }

    let delta = match (a.electronegativity, b.electronegativity) {
        (Some(x), Some(y)) => (x - y).abs(),
        _ => {
            tracing::warn!(a = %a.symbol, b = %b.symbol, "missing electronegativity, treating bond as nonpolar");
            0.0
        }
    };

    if delta >= IONIC_THRESHOLD {
        BondType::Ionic
    } else if delta > POLAR_THRESHOLD {
        BondType::CovalentPolar
    } else {
        BondType::CovalentNonpolar
    }
}
