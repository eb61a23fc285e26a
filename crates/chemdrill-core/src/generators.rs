//! Generator stage: sample domain entities into a [`SlotValues`] bag.
//!
//! Every generator is a pure function of its step parameters, the ontology
//! and the injected RNG. A candidate pool too small for the requested
//! cardinality fails with [`EngineError::InsufficientData`].

use std::collections::{BTreeMap, BTreeSet};

use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;

use crate::error::{EngineError, Result};
use crate::formula::compose_salt;
use crate::model::{ParamValue, PipelineStep};
use crate::ontology::{Element, Ion, IonKind, MetalType, Ontology, PropertyDef, Substance};
use crate::slots::{format_number, round_to, SlotValues};

/// Every generator id [`run_generator`] understands.
pub const GENERATOR_IDS: &[&str] = &[
    "pick_element_pair",
    "pick_elements_same_period",
    "pick_oxidation_example",
    "pick_ion_pair",
    "pick_salt_pair",
    "pick_element",
    "pick_elements",
    "pick_mixed_elements",
    "pick_substance",
    "pick_substance_amount",
    "pick_solution",
    "pick_reaction",
    "pick_crystal_pair",
    "pick_chain_gap",
];

pub const ORDERS: [&str; 2] = ["ascending", "descending"];
pub const AMOUNT_MODES: [&str; 2] = ["mass_to_moles", "moles_to_mass"];
pub const SOLUTION_VARIANTS: [&str; 3] = ["direct", "inverse", "dilution"];
const METAL_TYPES: [&str; 2] = ["metal", "nonmetal"];

const MOLE_STEPS: [f64; 9] = [0.1, 0.2, 0.25, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0];
const SOLUTION_MASSES: [f64; 10] = [50.0, 80.0, 100.0, 120.0, 150.0, 200.0, 250.0, 300.0, 400.0, 500.0];
const MASS_FRACTIONS: [f64; 9] = [2.0, 4.0, 5.0, 8.0, 10.0, 12.0, 15.0, 20.0, 25.0];
const WATER_ADDITIONS: [f64; 5] = [20.0, 50.0, 100.0, 150.0, 200.0];
const YIELDS: [f64; 7] = [60.0, 70.0, 75.0, 80.0, 85.0, 90.0, 95.0];

/// Whether a `"{name}"` placeholder on this generator parameter has a
/// domain of random choices.
pub fn has_random_domain(generator_id: &str, param: &str) -> bool {
    matches!(
        (generator_id, param),
        ("pick_element_pair", "property")
            | ("pick_elements_same_period", "property" | "order")
            | ("pick_oxidation_example", "difficulty")
            | ("pick_element", "metal_type")
            | ("pick_substance", "class")
            | ("pick_substance_amount", "mode" | "class")
            | ("pick_solution", "variant")
    )
}

/// Run the generator named by `step.id`.
pub fn run_generator<R: Rng + ?Sized>(
    step: &PipelineStep,
    ontology: &Ontology,
    rng: &mut R,
) -> Result<SlotValues> {
    tracing::debug!(generator = %step.id, "running generator");
    match step.id.as_str() {
        "pick_element_pair" => pick_element_pair(step, ontology, rng),
        "pick_elements_same_period" => pick_elements_same_period(step, ontology, rng),
        "pick_oxidation_example" => pick_oxidation_example(step, ontology, rng),
        "pick_ion_pair" => pick_ion_pair(step, ontology, rng),
        "pick_salt_pair" => pick_salt_pair(ontology, rng),
        "pick_element" => pick_element(step, ontology, rng),
        "pick_elements" => pick_elements(step, ontology, rng),
        "pick_mixed_elements" => pick_mixed_elements(step, ontology, rng),
        "pick_substance" => pick_substance(step, ontology, rng),
        "pick_substance_amount" => pick_substance_amount(step, ontology, rng),
        "pick_solution" => pick_solution(step, rng),
        "pick_reaction" => pick_reaction(step, ontology, rng),
        "pick_crystal_pair" => pick_crystal_pair(ontology, rng),
        "pick_chain_gap" => pick_chain_gap(ontology, rng),
        other => Err(EngineError::unknown("generator", other)),
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Draw `k` distinct items in random order.
fn sample<T, R: Rng + ?Sized>(
    mut pool: Vec<T>,
    k: usize,
    rng: &mut R,
    stage: &str,
    what: &str,
) -> Result<Vec<T>> {
    if pool.len() < k {
        return Err(EngineError::insufficient(
            stage,
            format!("need {k} {what}, found {}", pool.len()),
        ));
    }
    pool.shuffle(rng);
    pool.truncate(k);
    Ok(pool)
}

fn pick_one<T: Clone, R: Rng + ?Sized>(pool: &[T], rng: &mut R, stage: &str, what: &str) -> Result<T> {
    pool.choose(rng)
        .cloned()
        .ok_or_else(|| EngineError::insufficient(stage, format!("no {what} available")))
}

fn pick_number<R: Rng + ?Sized>(choices: &[f64], rng: &mut R) -> f64 {
    choices.choose(rng).copied().unwrap_or_default()
}

/// Resolve a choice-valued parameter; absent parameters pick at random.
fn resolve_choice<R: Rng + ?Sized>(
    step: &PipelineStep,
    key: &str,
    choices: &[String],
    rng: &mut R,
) -> Result<String> {
    let value = match step.param(key) {
        Some(param) => param.resolve_choice(choices, rng),
        None => choices.choose(rng).cloned(),
    };
    let value = value.ok_or_else(|| {
        EngineError::insufficient(step.id.as_str(), format!("no valid choice for '{key}'"))
    })?;
    if !choices.contains(&value) {
        return Err(EngineError::unknown("parameter value", format!("{key}={value}")));
    }
    Ok(value)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn resolve_property<'a, R: Rng + ?Sized>(
    step: &PipelineStep,
    ontology: &'a Ontology,
    rng: &mut R,
) -> Result<&'a PropertyDef> {
    let id = resolve_choice(step, "property", &ontology.property_ids(), rng)?;
    ontology.property(&id)
}

fn u32_list_param(step: &PipelineStep, key: &str) -> Option<Vec<u32>> {
    match step.param(key)? {
        ParamValue::Literal(serde_json::Value::Array(items)) => Some(
            items
                .iter()
                .filter_map(|v| v.as_u64())
                .filter_map(|v| u32::try_from(v).ok())
                .collect(),
        ),
        _ => None,
    }
}

/// The element filters shared by the single- and multi-element pickers.
struct ElementFilter {
    max_z: Option<u32>,
    groups: Option<Vec<u32>>,
    main_group: bool,
}

impl ElementFilter {
    fn from_step(step: &PipelineStep) -> Self {
        Self {
            max_z: step.f64_param("max_z").map(|z| z as u32),
            groups: u32_list_param(step, "groups"),
            main_group: step.bool_param("main_group", false),
        }
    }

    fn admits(&self, element: &Element) -> bool {
        if self.max_z.is_some_and(|max| element.z > max) {
            return false;
        }
        if let Some(groups) = &self.groups {
            if !element.group.is_some_and(|g| groups.contains(&g)) {
                return false;
            }
        }
        !self.main_group || element.is_main_group_candidate()
    }

    fn candidates<'a>(&self, ontology: &'a Ontology) -> Vec<&'a Element> {
        ontology
            .core
            .elements
            .iter()
            .filter(|e| self.admits(e))
            .collect()
    }
}

fn symbols(elements: &[&Element]) -> Vec<String> {
    elements.iter().map(|e| e.symbol.clone()).collect()
}

fn insert_ion_slots(slots: &mut SlotValues, cation: &Ion, anion: &Ion) {
    slots.insert("cation_id", cation.id.as_str());
    slots.insert("anion_id", anion.id.as_str());
    slots.insert("cation_formula", cation.formula.as_str());
    slots.insert("anion_formula", anion.formula.as_str());
    slots.insert("cation_charge", cation.charge);
    slots.insert("anion_charge", anion.charge);
}

// ---------------------------------------------------------------------------
// Periodic table generators
// ---------------------------------------------------------------------------

fn pick_element_pair<R: Rng + ?Sized>(
    step: &PipelineStep,
    ontology: &Ontology,
    rng: &mut R,
) -> Result<SlotValues> {
    let property = resolve_property(step, ontology, rng)?;
    let main_group = step.bool_param("main_group", false);

    let pool: Vec<&Element> = ontology
        .core
        .elements
        .iter()
        .filter(|e| property.value_for(e).is_some())
        .filter(|e| !main_group || e.is_main_group_candidate())
        .collect();
    let pair = sample(pool, 2, rng, &step.id, "elements")?;

    Ok(SlotValues::new()
        .with("elementA", pair[0].symbol.as_str())
        .with("elementB", pair[1].symbol.as_str())
        .with("property", property.id.as_str()))
}

fn pick_elements_same_period<R: Rng + ?Sized>(
    step: &PipelineStep,
    ontology: &Ontology,
    rng: &mut R,
) -> Result<SlotValues> {
    // Fewer than two members leave nothing to order.
    let k = step.usize_param("k", 3).max(2);
    let property = resolve_property(step, ontology, rng)?;
    let order = resolve_choice(step, "order", &strings(&ORDERS), rng)?;
    let main_group = step.bool_param("main_group", false);

    // Members with equal values would make the ordering ambiguous; keep the
    // first element seen for each value.
    let mut by_period: BTreeMap<u32, Vec<&Element>> = BTreeMap::new();
    let mut seen_values: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for element in &ontology.core.elements {
        if main_group && !element.is_main_group_candidate() {
            continue;
        }
        let Some(value) = property.value_for(element) else {
            continue;
        };
        let values = seen_values.entry(element.period).or_default();
        if values.contains(&value) {
            continue;
        }
        values.push(value);
        by_period.entry(element.period).or_default().push(element);
    }

    let periods: Vec<u32> = by_period
        .iter()
        .filter(|(_, members)| members.len() >= k)
        .map(|(period, _)| *period)
        .collect();
    let period = pick_one(
        &periods,
        rng,
        &step.id,
        &format!("period with {k} elements having {}", property.id),
    )?;
    let members = by_period.remove(&period).unwrap_or_default();
    let chosen = sample(members, k, rng, &step.id, "elements")?;

    Ok(SlotValues::new()
        .with("elements", symbols(&chosen))
        .with("property", property.id.as_str())
        .with("order", order)
        .with("period", period))
}

fn pick_element<R: Rng + ?Sized>(
    step: &PipelineStep,
    ontology: &Ontology,
    rng: &mut R,
) -> Result<SlotValues> {
    let filter = ElementFilter::from_step(step);
    let metal_type = match step.param("metal_type") {
        Some(_) => Some(resolve_choice(step, "metal_type", &strings(&METAL_TYPES), rng)?),
        None => None,
    };

    let pool: Vec<&Element> = filter
        .candidates(ontology)
        .into_iter()
        .filter(|e| metal_type.as_deref().is_none_or(|t| e.metal_type.as_str() == t))
        .collect();
    let element = pick_one(&pool, rng, &step.id, "element")?;

    let mut slots = SlotValues::new()
        .with("element", element.symbol.as_str())
        .with("element_name", element.name.as_str())
        .with("Z", element.z)
        .with("period", element.period);
    if let Some(group) = element.group {
        slots.insert("group", group);
    }
    Ok(slots)
}

fn pick_elements<R: Rng + ?Sized>(
    step: &PipelineStep,
    ontology: &Ontology,
    rng: &mut R,
) -> Result<SlotValues> {
    let k = step.usize_param("k", 4).max(1);
    let filter = ElementFilter::from_step(step);
    let mut pool = filter.candidates(ontology);

    let chosen = if step.bool_param("distinct_groups", false) {
        pool.shuffle(rng);
        let mut groups = BTreeSet::new();
        let distinct: Vec<&Element> = pool
            .into_iter()
            .filter(|e| e.group.is_some_and(|g| groups.insert(g)))
            .take(k)
            .collect();
        if distinct.len() < k {
            return Err(EngineError::insufficient(
                step.id.as_str(),
                format!("need {k} elements from distinct groups, found {}", distinct.len()),
            ));
        }
        distinct
    } else {
        sample(pool, k, rng, &step.id, "elements")?
    };

    Ok(SlotValues::new().with("elements", symbols(&chosen)))
}

fn pick_mixed_elements<R: Rng + ?Sized>(
    step: &PipelineStep,
    ontology: &Ontology,
    rng: &mut R,
) -> Result<SlotValues> {
    let k = step.usize_param("k", 5).max(2);
    let pool = ElementFilter::from_step(step).candidates(ontology);

    let metals: Vec<&Element> = pool
        .iter()
        .copied()
        .filter(|e| e.metal_type == MetalType::Metal)
        .collect();
    let nonmetals: Vec<&Element> = pool
        .iter()
        .copied()
        .filter(|e| e.metal_type == MetalType::Nonmetal)
        .collect();
    let metal = pick_one(&metals, rng, &step.id, "metal")?;
    let nonmetal = pick_one(&nonmetals, rng, &step.id, "non-metal")?;

    let rest: Vec<&Element> = pool
        .into_iter()
        .filter(|e| e.z != metal.z && e.z != nonmetal.z)
        .collect();
    let mut chosen = sample(rest, k - 2, rng, &step.id, "elements")?;
    chosen.push(metal);
    chosen.push(nonmetal);
    chosen.shuffle(rng);

    Ok(SlotValues::new().with("elements", symbols(&chosen)))
}

// ---------------------------------------------------------------------------
// Rule-table generators
// ---------------------------------------------------------------------------

fn pick_oxidation_example<R: Rng + ?Sized>(
    step: &PipelineStep,
    ontology: &Ontology,
    rng: &mut R,
) -> Result<SlotValues> {
    // A placeholder difficulty means "any difficulty".
    let difficulty = step.f64_param("difficulty").map(|d| d as u32);
    let pool: Vec<_> = ontology
        .rules
        .oxidation_examples
        .iter()
        .filter(|ex| difficulty.is_none_or(|d| ex.difficulty == d))
        .collect();
    let example = pick_one(&pool, rng, &step.id, "oxidation example")?;

    Ok(SlotValues::new()
        .with("formula", example.formula.as_str())
        .with("element", example.element.as_str())
        .with("oxidation_state", example.state)
        .with("difficulty", example.difficulty))
}

fn pick_ion_pair<R: Rng + ?Sized>(
    step: &PipelineStep,
    ontology: &Ontology,
    rng: &mut R,
) -> Result<SlotValues> {
    let bounds = |prefix: &str| {
        let min = step.f64_param(&format!("{prefix}_charge_min")).unwrap_or(0.0);
        let max = step.f64_param(&format!("{prefix}_charge_max")).unwrap_or(f64::MAX);
        move |magnitude: u32| (min..=max).contains(&f64::from(magnitude))
    };
    let cation_ok = bounds("cation");
    let anion_ok = bounds("anion");

    let cations: Vec<_> = ontology
        .ions_of(IonKind::Cation)
        .filter(|i| cation_ok(i.charge_magnitude()))
        .collect();
    let anions: Vec<_> = ontology
        .ions_of(IonKind::Anion)
        .filter(|i| anion_ok(i.charge_magnitude()))
        .collect();
    let cation = pick_one(&cations, rng, &step.id, "cation")?;
    let anion = pick_one(&anions, rng, &step.id, "anion")?;

    let mut slots = SlotValues::new();
    insert_ion_slots(&mut slots, cation, anion);
    Ok(slots)
}

fn pick_salt_pair<R: Rng + ?Sized>(ontology: &Ontology, rng: &mut R) -> Result<SlotValues> {
    let fact = pick_one(
        &ontology.rules.solubility.iter().collect::<Vec<_>>(),
        rng,
        "pick_salt_pair",
        "solubility fact",
    )?;
    let cation = ontology.ion(&fact.cation)?;
    let anion = ontology.ion(&fact.anion)?;

    let mut slots = SlotValues::new();
    insert_ion_slots(&mut slots, cation, anion);
    slots.insert(
        "salt_formula",
        compose_salt(
            cation.base_formula(),
            cation.charge_magnitude(),
            anion.base_formula(),
            anion.charge_magnitude(),
        ),
    );
    slots.insert("expected_solubility", fact.solubility.as_str());
    Ok(slots)
}

// ---------------------------------------------------------------------------
// Substance and calculation generators
// ---------------------------------------------------------------------------

fn substance_pool<'a>(step: &PipelineStep, ontology: &'a Ontology, class: Option<&str>) -> Vec<&'a Substance> {
    let compound_only = step.bool_param("compound_only", false);
    ontology
        .data
        .substances
        .iter()
        .filter(|s| class.is_none_or(|c| s.class == c))
        .filter(|s| !compound_only || s.composition.len() >= 2)
        .collect()
}

fn resolve_class<R: Rng + ?Sized>(
    step: &PipelineStep,
    ontology: &Ontology,
    rng: &mut R,
) -> Result<Option<String>> {
    if step.param("class").is_none() {
        return Ok(None);
    }
    let classes: Vec<String> = ontology
        .data
        .substances
        .iter()
        .map(|s| s.class.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    resolve_choice(step, "class", &classes, rng).map(Some)
}

fn substance_slots(substance: &Substance) -> SlotValues {
    SlotValues::new()
        .with("substance_id", substance.id.as_str())
        .with("formula", substance.formula.as_str())
        .with("substance_name", substance.name.as_str())
}

fn pick_substance<R: Rng + ?Sized>(
    step: &PipelineStep,
    ontology: &Ontology,
    rng: &mut R,
) -> Result<SlotValues> {
    let class = resolve_class(step, ontology, rng)?;
    let pool = substance_pool(step, ontology, class.as_deref());
    let substance = pick_one(&pool, rng, &step.id, "substance")?;

    let mut slots = substance_slots(substance);
    slots.insert("class", substance.class.as_str());
    if step.bool_param("with_element", false) {
        let component = pick_one(&substance.composition, rng, &step.id, "component")?;
        slots.insert("element", component.element);
    }
    Ok(slots)
}

fn pick_substance_amount<R: Rng + ?Sized>(
    step: &PipelineStep,
    ontology: &Ontology,
    rng: &mut R,
) -> Result<SlotValues> {
    let mode = resolve_choice(step, "mode", &strings(&AMOUNT_MODES), rng)?;
    let class = resolve_class(step, ontology, rng)?;
    let pool = substance_pool(step, ontology, class.as_deref());
    let substance = pick_one(&pool, rng, &step.id, "substance")?;
    let molar_mass = ontology.molar_mass(substance)?;
    let moles = pick_number(&MOLE_STEPS, rng);

    let mut slots = substance_slots(substance);
    if mode == "mass_to_moles" {
        let mass = round_to(moles * molar_mass, 2);
        slots.insert("mass", mass);
        slots.insert("given_quantity", format!("m = {} g", format_number(mass)));
    } else {
        slots.insert("moles", moles);
        slots.insert("given_quantity", format!("n = {} mol", format_number(moles)));
    }
    slots.insert("mode", mode);
    Ok(slots)
}

fn pick_solution<R: Rng + ?Sized>(step: &PipelineStep, rng: &mut R) -> Result<SlotValues> {
    let variant = resolve_choice(step, "variant", &strings(&SOLUTION_VARIANTS), rng)?;
    let solution_mass = pick_number(&SOLUTION_MASSES, rng);
    let fraction = pick_number(&MASS_FRACTIONS, rng);

    let mut slots = SlotValues::new().with("solution_mass", solution_mass);
    match variant.as_str() {
        "direct" => {
            let solute = round_to(solution_mass * fraction / 100.0, 2);
            slots.insert("solute_mass", solute);
            slots.insert("water_mass", round_to(solution_mass - solute, 2));
        }
        "inverse" => {
            slots.insert("mass_fraction", fraction);
        }
        _ => {
            slots.insert("mass_fraction", fraction);
            slots.insert("water_mass", pick_number(&WATER_ADDITIONS, rng));
        }
    }
    slots.insert("variant", variant);
    Ok(slots)
}

fn pick_reaction<R: Rng + ?Sized>(
    step: &PipelineStep,
    ontology: &Ontology,
    rng: &mut R,
) -> Result<SlotValues> {
    let reaction = pick_one(
        &ontology.data.reactions.iter().collect::<Vec<_>>(),
        rng,
        &step.id,
        "reaction",
    )?;
    let given = pick_one(&reaction.reactants, rng, &step.id, "reactant")?;
    let target = pick_one(&reaction.products, rng, &step.id, "product")?;
    let given_substance = ontology.substance(&given.substance)?;
    let target_substance = ontology.substance(&target.substance)?;

    let moles = pick_number(&MOLE_STEPS, rng);
    let given_mass = round_to(moles * ontology.molar_mass(given_substance)?, 1);

    let mut slots = SlotValues::new()
        .with("reaction_id", reaction.id.as_str())
        .with("equation", reaction.equation.as_str())
        .with("given_id", given_substance.id.as_str())
        .with("given_formula", given_substance.formula.as_str())
        .with("given_mass", given_mass)
        .with("target_id", target_substance.id.as_str())
        .with("target_formula", target_substance.formula.as_str());
    if step.bool_param("with_yield", false) {
        slots.insert("yield_percent", pick_number(&YIELDS, rng));
    }
    Ok(slots)
}

fn pick_crystal_pair<R: Rng + ?Sized>(ontology: &Ontology, rng: &mut R) -> Result<SlotValues> {
    let stage = "pick_crystal_pair";
    let pool: Vec<&Substance> = ontology
        .data
        .substances
        .iter()
        .filter(|s| s.crystal.is_some())
        .collect();
    let first = pick_one(&pool, rng, stage, "substance with a crystal type")?;
    let others: Vec<&Substance> = pool
        .into_iter()
        .filter(|s| s.crystal != first.crystal)
        .collect();
    let second = pick_one(&others, rng, stage, "substance with a different crystal type")?;

    let crystal = |s: &Substance| s.crystal.map(|c| c.as_str()).unwrap_or_default();
    Ok(SlotValues::new()
        .with("substanceA", first.formula.as_str())
        .with("substanceB", second.formula.as_str())
        .with("crystalA", crystal(first))
        .with("crystalB", crystal(second)))
}

fn pick_chain_gap<R: Rng + ?Sized>(ontology: &Ontology, rng: &mut R) -> Result<SlotValues> {
    let stage = "pick_chain_gap";
    let chains: Vec<_> = ontology
        .data
        .chains
        .iter()
        .filter(|c| c.substances.len() >= 2)
        .collect();
    let chain = pick_one(&chains, rng, stage, "chain")?;
    let members = chain
        .substances
        .iter()
        .map(|id| ontology.substance(id))
        .collect::<Result<Vec<_>>>()?;
    let gap_index = rng.random_range(0..members.len());
    let answer = members[gap_index];

    let formulas: Vec<String> = members.iter().map(|s| s.formula.clone()).collect();
    let display: Vec<&str> = formulas
        .iter()
        .enumerate()
        .map(|(i, f)| if i == gap_index { "?" } else { f.as_str() })
        .collect();

    // Same-class substances make the most plausible wrong picks.
    let mut candidates: Vec<&Substance> = ontology
        .data
        .substances
        .iter()
        .filter(|s| s.formula != answer.formula)
        .collect();
    candidates.shuffle(rng);
    candidates.sort_by_key(|s| s.class != answer.class);
    let candidates: Vec<String> = candidates.iter().take(5).map(|s| s.formula.clone()).collect();

    Ok(SlotValues::new()
        .with("chain_id", chain.id.as_str())
        .with("chain_display", display.join(" → "))
        .with("chain_full", formulas.join(" → "))
        .with("chain_substances", formulas)
        .with("gap_index", gap_index)
        .with("chain_candidates", candidates))
}
