//! The read-only domain snapshot every pipeline stage consumes.
//!
//! An [`Ontology`] bundles the periodic-table core (elements, ions, property
//! definitions, competencies), rule tables (solubility, oxidation examples),
//! domain data (substances, reactions, transformation chains) and i18n
//! resources (morphology, prompt templates). It is loaded once and shared.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::formula::strip_charge_suffix;
use crate::mastery::BktParams;
use crate::resolver::PromptTemplate;

/// Metallic character of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetalType {
    Metal,
    Nonmetal,
    Metalloid,
}

impl MetalType {
    pub fn as_str(self) -> &'static str {
        match self {
            MetalType::Metal => "metal",
            MetalType::Nonmetal => "nonmetal",
            MetalType::Metalloid => "metalloid",
        }
    }
}

/// A chemical element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub z: u32,
    pub symbol: String,
    pub name: String,
    pub period: u32,
    #[serde(default)]
    pub group: Option<u32>,
    pub metal_type: MetalType,
    #[serde(default)]
    pub electronegativity: Option<f64>,
    pub atomic_mass: f64,
    #[serde(default)]
    pub atomic_radius_pm: Option<f64>,
    #[serde(default)]
    pub ionization_energy_kj: Option<f64>,
    #[serde(default)]
    pub typical_oxidation_states: Vec<i32>,
}

impl Element {
    /// Read a numeric field by the name a [`PropertyDef`] refers to.
    pub fn value(&self, field: &str) -> Option<f64> {
        match field {
            "electronegativity" => self.electronegativity,
            "atomic_mass" => Some(self.atomic_mass),
            "atomic_radius_pm" => self.atomic_radius_pm,
            "ionization_energy_kj" => self.ionization_energy_kj,
            "z" => Some(f64::from(self.z)),
            _ => None,
        }
    }

    pub fn is_noble_gas(&self) -> bool {
        self.group == Some(18)
    }

    /// Z ≤ 86 and not a noble gas.
    pub fn is_main_group_candidate(&self) -> bool {
        self.z <= 86 && !self.is_noble_gas()
    }
}

/// Cation or anion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IonKind {
    Cation,
    Anion,
}

/// An ion with its display formula (Unicode charge suffix included).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ion {
    pub id: String,
    pub formula: String,
    pub charge: i32,
    #[serde(rename = "type")]
    pub kind: IonKind,
}

impl Ion {
    /// The formula without its trailing charge suffix, e.g. `SO₄²⁻` → `SO₄`.
    pub fn base_formula(&self) -> &str {
        strip_charge_suffix(&self.formula)
    }

    pub fn charge_magnitude(&self) -> u32 {
        self.charge.unsigned_abs()
    }
}

/// Restricts which elements a property applies to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyFilter {
    #[serde(default)]
    pub min_z: Option<u32>,
    #[serde(default)]
    pub max_z: Option<u32>,
    #[serde(default)]
    pub groups: Option<Vec<u32>>,
}

impl PropertyFilter {
    pub fn admits(&self, element: &Element) -> bool {
        if self.min_z.is_some_and(|min| element.z < min) {
            return false;
        }
        if self.max_z.is_some_and(|max| element.z > max) {
            return false;
        }
        match (&self.groups, element.group) {
            (Some(groups), Some(g)) => groups.contains(&g),
            (Some(_), None) => false,
            (None, _) => true,
        }
    }
}

/// A comparable periodic property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDef {
    pub id: String,
    /// The [`Element`] field holding the value.
    pub value_field: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub filter: PropertyFilter,
    #[serde(default)]
    pub i18n: BTreeMap<String, String>,
}

impl PropertyDef {
    /// The element's value for this property, if it passes the filter.
    pub fn value_for(&self, element: &Element) -> Option<f64> {
        if !self.filter.admits(element) {
            return None;
        }
        element.value(&self.value_field)
    }
}

/// A trackable competency with its BKT parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Competency {
    pub id: String,
    pub name: String,
    pub bkt: BktParams,
}

/// Solubility of a salt in water.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Solubility {
    Soluble,
    Insoluble,
    SlightlySoluble,
    Decomposes,
}

impl Solubility {
    /// The three labels offered as answer choices.
    pub const LABELS: [&'static str; 3] = ["soluble", "insoluble", "slightly_soluble"];

    pub fn as_str(self) -> &'static str {
        match self {
            Solubility::Soluble => "soluble",
            Solubility::Insoluble => "insoluble",
            Solubility::SlightlySoluble => "slightly_soluble",
            Solubility::Decomposes => "decomposes",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "soluble" => Some(Solubility::Soluble),
            "insoluble" => Some(Solubility::Insoluble),
            "slightly_soluble" => Some(Solubility::SlightlySoluble),
            "decomposes" => Some(Solubility::Decomposes),
            _ => None,
        }
    }

    /// Collapse to the soluble/insoluble dichotomy.
    pub fn binary(self) -> Self {
        match self {
            Solubility::SlightlySoluble | Solubility::Decomposes => Solubility::Insoluble,
            other => other,
        }
    }
}

impl fmt::Display for Solubility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolubilityFact {
    pub cation: String,
    pub anion: String,
    pub solubility: Solubility,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OxidationExample {
    pub formula: String,
    pub element: String,
    pub state: i32,
    pub difficulty: u32,
}

/// Crystal lattice type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrystalType {
    Molecular,
    Metallic,
    Ionic,
    Atomic,
}

impl CrystalType {
    pub fn as_str(self) -> &'static str {
        match self {
            CrystalType::Molecular => "molecular",
            CrystalType::Metallic => "metallic",
            CrystalType::Ionic => "ionic",
            CrystalType::Atomic => "atomic",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "molecular" => Some(CrystalType::Molecular),
            "metallic" => Some(CrystalType::Metallic),
            "ionic" => Some(CrystalType::Ionic),
            "atomic" => Some(CrystalType::Atomic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    pub element: String,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Substance {
    pub id: String,
    pub formula: String,
    pub name: String,
    pub class: String,
    #[serde(default)]
    pub crystal: Option<CrystalType>,
    pub composition: Vec<Component>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub substance: String,
    pub coefficient: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    pub id: String,
    pub equation: String,
    pub reactants: Vec<Participant>,
    pub products: Vec<Participant>,
}

impl Reaction {
    pub fn coefficient_of(&self, substance_id: &str) -> Option<u32> {
        self.reactants
            .iter()
            .chain(self.products.iter())
            .find(|p| p.substance == substance_id)
            .map(|p| p.coefficient)
    }
}

/// A transformation chain, e.g. `Ca → CaO → Ca(OH)₂ → CaCO₃`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chain {
    pub id: String,
    pub substances: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoreData {
    pub elements: Vec<Element>,
    #[serde(default)]
    pub ions: Vec<Ion>,
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
    #[serde(default)]
    pub competencies: Vec<Competency>,
    /// Z → configuration overrides for the electron-configuration builder.
    #[serde(default)]
    pub electron_config_exceptions: BTreeMap<u32, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleTables {
    #[serde(default)]
    pub solubility: Vec<SolubilityFact>,
    #[serde(default)]
    pub oxidation_examples: Vec<OxidationExample>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainData {
    #[serde(default)]
    pub substances: Vec<Substance>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    #[serde(default)]
    pub chains: Vec<Chain>,
}

/// domain → key → field → form.
pub type Morphology = BTreeMap<String, BTreeMap<String, BTreeMap<String, String>>>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct I18n {
    #[serde(default)]
    pub morphology: Morphology,
    #[serde(default)]
    pub prompts: BTreeMap<String, PromptTemplate>,
}

/// The full read-only snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ontology {
    pub core: CoreData,
    #[serde(default)]
    pub rules: RuleTables,
    #[serde(default)]
    pub data: DomainData,
    #[serde(default)]
    pub i18n: I18n,
}

impl Ontology {
    pub fn element(&self, symbol: &str) -> Result<&Element> {
        self.core
            .elements
            .iter()
            .find(|e| e.symbol == symbol)
            .ok_or_else(|| EngineError::unknown("element", symbol))
    }

    pub fn element_by_z(&self, z: u32) -> Option<&Element> {
        self.core.elements.iter().find(|e| e.z == z)
    }

    pub fn ion(&self, id: &str) -> Result<&Ion> {
        self.core
            .ions
            .iter()
            .find(|i| i.id == id)
            .ok_or_else(|| EngineError::unknown("ion", id))
    }

    pub fn ions_of(&self, kind: IonKind) -> impl Iterator<Item = &Ion> {
        self.core.ions.iter().filter(move |i| i.kind == kind)
    }

    pub fn property(&self, id: &str) -> Result<&PropertyDef> {
        self.core
            .properties
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| EngineError::unknown("property", id))
    }

    pub fn property_ids(&self) -> Vec<String> {
        self.core.properties.iter().map(|p| p.id.clone()).collect()
    }

    pub fn competency(&self, id: &str) -> Option<&Competency> {
        self.core.competencies.iter().find(|c| c.id == id)
    }

    /// The competency's BKT parameters, or `fallback` when it is not listed.
    pub fn bkt_params(&self, competency_id: &str, fallback: BktParams) -> BktParams {
        self.competency(competency_id)
            .map(|c| c.bkt)
            .unwrap_or(fallback)
    }

    pub fn substance(&self, id: &str) -> Result<&Substance> {
        self.data
            .substances
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| EngineError::unknown("substance", id))
    }

    pub fn reaction(&self, id: &str) -> Result<&Reaction> {
        self.data
            .reactions
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| EngineError::unknown("reaction", id))
    }

    /// Unrounded molar mass Σ(Ar·count) in g/mol.
    pub fn molar_mass(&self, substance: &Substance) -> Result<f64> {
        substance.composition.iter().try_fold(0.0, |acc, part| {
            let element = self.element(&part.element)?;
            Ok(acc + element.atomic_mass * f64::from(part.count))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixture_ontology;

    #[test]
    fn property_filter_bounds() {
        let filter = PropertyFilter {
            min_z: None,
            max_z: Some(20),
            groups: Some(vec![1, 2]),
        };
        let onto = fixture_ontology();
        assert!(filter.admits(onto.element("Na").unwrap()));
        assert!(!filter.admits(onto.element("Cl").unwrap()));
        assert!(filter.admits(onto.element("Mg").unwrap()));
        assert!(!filter.admits(onto.element("Ar").unwrap()));
    }

    #[test]
    fn ion_base_formula_strips_charge() {
        let onto = fixture_ontology();
        assert_eq!(onto.ion("po4").unwrap().base_formula(), "PO₄");
        assert_eq!(onto.ion("ca").unwrap().base_formula(), "Ca");
        assert_eq!(onto.ion("po4").unwrap().charge_magnitude(), 3);
    }

    #[test]
    fn molar_mass_sums_components() {
        let onto = fixture_ontology();
        let water = onto.substance("h2o").unwrap();
        assert!((onto.molar_mass(water).unwrap() - 18.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_lookups_are_identified() {
        let onto = fixture_ontology();
        assert!(matches!(
            onto.element("Xx"),
            Err(EngineError::UnknownIdentifier { kind: "element", .. })
        ));
        assert!(onto.property("density").is_err());
    }

    #[test]
    fn solubility_binary_collapse() {
        assert_eq!(Solubility::SlightlySoluble.binary(), Solubility::Insoluble);
        assert_eq!(Solubility::Decomposes.binary(), Solubility::Insoluble);
        assert_eq!(Solubility::Soluble.binary(), Solubility::Soluble);
        assert_eq!(Solubility::parse("slightly_soluble"), Some(Solubility::SlightlySoluble));
    }
}
