//! Solver stage: compute the canonical answer from generated slots.
//!
//! Solvers are pure and deterministic given their slots. Each returns the
//! answer plus any extra values the explanation template interpolates.

use crate::error::{EngineError, Result};
use crate::formula::{compose_salt, lcm};
use crate::model::PipelineStep;
use crate::ontology::{CrystalType, Element, Ontology, PropertyDef, Solubility, Substance};
use crate::slots::{format_number, round_to, Answer, SlotValues};
use crate::traits::ChemistryToolkit;

/// Every solver id [`run_solver`] understands.
pub const SOLVER_IDS: &[&str] = &[
    "compare_property",
    "periodic_trend_order",
    "compose_salt_formula",
    "solubility_check",
    "delta_chi",
    "compare_crystal_melting",
    "count_valence",
    "molar_mass",
    "mass_fraction",
    "amount_calc",
    "concentration",
    "stoichiometry",
    "reaction_yield",
    "oxidation_state",
    "electron_config",
    "chain_gap",
    "element_group_pairs",
    "select_by_metal_type",
];

/// Read-only collaborators a solver may consult.
#[derive(Clone, Copy)]
pub struct SolveContext<'a> {
    pub ontology: &'a Ontology,
    pub toolkit: &'a dyn ChemistryToolkit,
}

/// A solver's result.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutput {
    pub answer: Answer,
    pub explanation_slots: SlotValues,
}

impl SolverOutput {
    fn new(answer: impl Into<Answer>) -> Self {
        Self {
            answer: answer.into(),
            explanation_slots: SlotValues::new(),
        }
    }

    fn with(mut self, name: &str, value: impl Into<Answer>) -> Self {
        self.explanation_slots.insert(name, value);
        self
    }
}

/// Run the solver named by `step.id`.
pub fn run_solver(step: &PipelineStep, slots: &SlotValues, ctx: &SolveContext<'_>) -> Result<SolverOutput> {
    tracing::debug!(solver = %step.id, "running solver");
    let onto = ctx.ontology;
    match step.id.as_str() {
        "compare_property" => compare_property(step, slots, onto),
        "periodic_trend_order" => periodic_trend_order(step, slots, onto),
        "compose_salt_formula" => compose_salt_formula(slots, onto),
        "solubility_check" => solubility_check(step, slots),
        "delta_chi" => delta_chi(slots, ctx),
        "compare_crystal_melting" => compare_crystal_melting(slots),
        "count_valence" => count_valence(slots, onto),
        "molar_mass" => molar_mass(slots, onto),
        "mass_fraction" => mass_fraction(slots, onto),
        "amount_calc" => amount_calc(slots, onto),
        "concentration" => concentration(slots),
        "stoichiometry" => stoichiometry(slots, onto),
        "reaction_yield" => reaction_yield(slots, onto),
        "oxidation_state" => oxidation_state(slots, ctx),
        "electron_config" => electron_config(slots, ctx),
        "chain_gap" => chain_gap(slots),
        "element_group_pairs" => element_group_pairs(slots, onto),
        "select_by_metal_type" => select_by_metal_type(step, slots, onto),
        other => Err(EngineError::unknown("solver", other)),
    }
}

/// The property from the step params, else from the `property` slot.
fn property<'a>(stage: &str, step: &PipelineStep, slots: &SlotValues, onto: &'a Ontology) -> Result<&'a PropertyDef> {
    let id = match step.str_param("property") {
        Some(id) => id.to_string(),
        None => slots.text(stage, "property")?,
    };
    onto.property(&id)
}

fn property_value(stage: &str, property: &PropertyDef, element: &Element) -> Result<f64> {
    property.value_for(element).ok_or_else(|| {
        EngineError::insufficient(stage, format!("{} has no {}", element.symbol, property.id))
    })
}

fn substance<'a>(stage: &str, slots: &SlotValues, onto: &'a Ontology) -> Result<&'a Substance> {
    onto.substance(&slots.text(stage, "substance_id")?)
}

// ---------------------------------------------------------------------------
// Periodic table
// ---------------------------------------------------------------------------

fn compare_property(step: &PipelineStep, slots: &SlotValues, onto: &Ontology) -> Result<SolverOutput> {
    let stage = "compare_property";
    let prop = property(stage, step, slots, onto)?;
    let a = onto.element(&slots.text(stage, "elementA")?)?;
    let b = onto.element(&slots.text(stage, "elementB")?)?;
    let (va, vb) = (property_value(stage, prop, a)?, property_value(stage, prop, b)?);

    // Ties go to the second element.
    let winner = if step.str_param("direction") == Some("min") {
        if vb <= va { b } else { a }
    } else if vb >= va {
        b
    } else {
        a
    };

    let unit = prop.unit.as_deref().map(|u| format!(" {u}")).unwrap_or_default();
    Ok(SolverOutput::new(winner.symbol.as_str())
        .with("value_a", format_number(va))
        .with("value_b", format_number(vb))
        .with("unit", unit))
}

fn periodic_trend_order(step: &PipelineStep, slots: &SlotValues, onto: &Ontology) -> Result<SolverOutput> {
    let stage = "periodic_trend_order";
    let prop = property(stage, step, slots, onto)?;
    let order = match step.str_param("order") {
        Some(order) => order.to_string(),
        None => slots.text(stage, "order")?,
    };

    let mut ranked = slots
        .list(stage, "elements")?
        .iter()
        .map(|sym| {
            let element = onto.element(sym)?;
            Ok((element.symbol.clone(), property_value(stage, prop, element)?))
        })
        .collect::<Result<Vec<(String, f64)>>>()?;
    ranked.sort_by(|x, y| x.1.total_cmp(&y.1));
    if order == "descending" {
        ranked.reverse();
    }

    let values = ranked
        .iter()
        .map(|(sym, v)| format!("{sym} ({})", format_number(*v)))
        .collect::<Vec<_>>()
        .join(", ");
    let answer: Vec<String> = ranked.into_iter().map(|(sym, _)| sym).collect();
    Ok(SolverOutput::new(answer).with("values", values))
}

fn count_valence(slots: &SlotValues, onto: &Ontology) -> Result<SolverOutput> {
    let stage = "count_valence";
    let element = onto.element(&slots.text(stage, "element")?)?;
    let group = element.group.ok_or_else(|| {
        EngineError::insufficient(stage, format!("{} has no group", element.symbol))
    })?;
    let valence = match group {
        1 | 2 => group,
        13..=18 => group - 10,
        g => g,
    };
    Ok(SolverOutput::new(valence).with("group", group))
}

fn electron_config(slots: &SlotValues, ctx: &SolveContext<'_>) -> Result<SolverOutput> {
    let z = slots.number("electron_config", "Z")? as u32;
    let config = ctx
        .toolkit
        .electron_config(z, &ctx.ontology.core.electron_config_exceptions);
    Ok(SolverOutput::new(config))
}

fn element_group_pairs(slots: &SlotValues, onto: &Ontology) -> Result<SolverOutput> {
    let stage = "element_group_pairs";
    let pairs = slots
        .list(stage, "elements")?
        .iter()
        .map(|sym| {
            let element = onto.element(sym)?;
            let group = element.group.ok_or_else(|| {
                EngineError::insufficient(stage, format!("{sym} has no group"))
            })?;
            Ok(format!("{sym}:{group}"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(SolverOutput::new(pairs))
}

fn select_by_metal_type(step: &PipelineStep, slots: &SlotValues, onto: &Ontology) -> Result<SolverOutput> {
    let stage = "select_by_metal_type";
    let wanted = step.str_param("metal_type").unwrap_or("metal");
    let mut selected = Vec::new();
    for sym in slots.list(stage, "elements")? {
        if onto.element(sym)?.metal_type.as_str() == wanted {
            selected.push(sym.clone());
        }
    }
    if selected.is_empty() {
        return Err(EngineError::insufficient(stage, format!("no {wanted} among the elements")));
    }
    Ok(SolverOutput::new(selected))
}

// ---------------------------------------------------------------------------
// Bonding, salts and structure
// ---------------------------------------------------------------------------

fn compose_salt_formula(slots: &SlotValues, onto: &Ontology) -> Result<SolverOutput> {
    let stage = "compose_salt_formula";
    let cation = onto.ion(&slots.text(stage, "cation_id")?)?;
    let anion = onto.ion(&slots.text(stage, "anion_id")?)?;
    let (qc, qa) = (cation.charge_magnitude().max(1), anion.charge_magnitude().max(1));
    let total = lcm(qc, qa);

    let formula = compose_salt(cation.base_formula(), qc, anion.base_formula(), qa);
    Ok(SolverOutput::new(formula)
        .with("total_charge", total)
        .with("cation_count", total / qc)
        .with("anion_count", total / qa))
}

fn solubility_check(step: &PipelineStep, slots: &SlotValues) -> Result<SolverOutput> {
    let stage = "solubility_check";
    let label = slots.text(stage, "expected_solubility")?;
    let solubility =
        Solubility::parse(&label).ok_or_else(|| EngineError::unknown("solubility label", &label))?;
    let answer = if step.str_param("mode") == Some("full") {
        solubility
    } else {
        solubility.binary()
    };
    Ok(SolverOutput::new(answer.as_str()).with("solubility_word", solubility.as_str()))
}

fn oxidation_state(slots: &SlotValues, ctx: &SolveContext<'_>) -> Result<SolverOutput> {
    let state = slots.number("oxidation_state", "oxidation_state")?;
    Ok(SolverOutput::new(state).with("state_superscript", ctx.toolkit.to_superscript(state as i32)))
}

fn delta_chi(slots: &SlotValues, ctx: &SolveContext<'_>) -> Result<SolverOutput> {
    let stage = "delta_chi";
    let a = ctx.ontology.element(&slots.text(stage, "elementA")?)?;
    let b = ctx.ontology.element(&slots.text(stage, "elementB")?)?;
    let chi = |e: &Element| {
        e.electronegativity.ok_or_else(|| {
            EngineError::insufficient(stage, format!("{} has no electronegativity", e.symbol))
        })
    };
    let (chi_a, chi_b) = (chi(a)?, chi(b)?);
    let bond = ctx.toolkit.bond_type(a, b);

    Ok(SolverOutput::new(bond.label())
        .with("chi_a", format_number(chi_a))
        .with("chi_b", format_number(chi_b))
        .with("delta_chi", format_number(round_to((chi_a - chi_b).abs(), 2))))
}

/// Higher rank melts higher.
fn melting_rank(crystal: CrystalType) -> u8 {
    match crystal {
        CrystalType::Molecular => 1,
        CrystalType::Metallic => 2,
        CrystalType::Ionic => 3,
        CrystalType::Atomic => 4,
    }
}

fn compare_crystal_melting(slots: &SlotValues) -> Result<SolverOutput> {
    let stage = "compare_crystal_melting";
    let crystal = |slot: &str| -> Result<CrystalType> {
        let label = slots.text(stage, slot)?;
        CrystalType::parse(&label).ok_or_else(|| EngineError::unknown("crystal type", label))
    };
    let (ca, cb) = (crystal("crystalA")?, crystal("crystalB")?);
    let winner = if melting_rank(cb) >= melting_rank(ca) {
        slots.text(stage, "substanceB")?
    } else {
        slots.text(stage, "substanceA")?
    };
    Ok(SolverOutput::new(winner))
}

fn chain_gap(slots: &SlotValues) -> Result<SolverOutput> {
    let stage = "chain_gap";
    let chain = slots.list(stage, "chain_substances")?;
    let index = slots.number(stage, "gap_index")? as usize;
    let member = chain
        .get(index)
        .ok_or_else(|| EngineError::missing_slot(stage, format!("chain_substances[{index}]")))?;
    Ok(SolverOutput::new(member.as_str()))
}

// ---------------------------------------------------------------------------
// Calculations
// ---------------------------------------------------------------------------

fn molar_mass(slots: &SlotValues, onto: &Ontology) -> Result<SolverOutput> {
    let substance = substance("molar_mass", slots, onto)?;
    let mut terms = Vec::with_capacity(substance.composition.len());
    for part in &substance.composition {
        let ar = format_number(onto.element(&part.element)?.atomic_mass);
        terms.push(if part.count == 1 {
            ar
        } else {
            format!("{} × {ar}", part.count)
        });
    }
    let mass = round_to(onto.molar_mass(substance)?, 2);
    Ok(SolverOutput::new(mass).with("terms", terms.join(" + ")))
}

fn mass_fraction(slots: &SlotValues, onto: &Ontology) -> Result<SolverOutput> {
    let stage = "mass_fraction";
    let substance = substance(stage, slots, onto)?;
    let symbol = slots.text(stage, "element")?;
    let count = substance
        .composition
        .iter()
        .find(|c| c.element == symbol)
        .map(|c| c.count)
        .ok_or_else(|| {
            EngineError::insufficient(stage, format!("{symbol} is not part of {}", substance.formula))
        })?;
    let element_mass = onto.element(&symbol)?.atomic_mass * f64::from(count);
    let total = onto.molar_mass(substance)?;

    Ok(SolverOutput::new(round_to(element_mass / total * 100.0, 1))
        .with("element_mass", format_number(round_to(element_mass, 2)))
        .with("molar_mass", format_number(round_to(total, 2))))
}

fn amount_calc(slots: &SlotValues, onto: &Ontology) -> Result<SolverOutput> {
    let stage = "amount_calc";
    let molar = onto.molar_mass(substance(stage, slots, onto)?)?;
    let answer = match slots.text(stage, "mode")?.as_str() {
        "mass_to_moles" => round_to(slots.number(stage, "mass")? / molar, 3),
        "moles_to_mass" => round_to(slots.number(stage, "moles")? * molar, 2),
        other => return Err(EngineError::unknown("amount mode", other)),
    };
    Ok(SolverOutput::new(answer).with("molar_mass", format_number(round_to(molar, 2))))
}

fn concentration(slots: &SlotValues) -> Result<SolverOutput> {
    let stage = "concentration";
    let solution = slots.number(stage, "solution_mass")?;
    let (answer, solute, total) = match slots.text(stage, "variant")?.as_str() {
        "direct" => {
            let solute = slots.number(stage, "solute_mass")?;
            (solute / solution * 100.0, solute, solution)
        }
        "inverse" => {
            let solute = solution * slots.number(stage, "mass_fraction")? / 100.0;
            (solute, solute, solution)
        }
        "dilution" => {
            let solute = solution * slots.number(stage, "mass_fraction")? / 100.0;
            let total = solution + slots.number(stage, "water_mass")?;
            (solute / total * 100.0, solute, total)
        }
        other => return Err(EngineError::unknown("concentration variant", other)),
    };
    Ok(SolverOutput::new(round_to(answer, 1))
        .with("solute_total", format_number(round_to(solute, 2)))
        .with("solution_total", format_number(round_to(total, 2))))
}

struct Propagation {
    n_given: f64,
    n_target: f64,
    target_mass: f64,
}

/// Mass → moles → coefficient ratio → moles → mass.
fn propagate(stage: &str, slots: &SlotValues, onto: &Ontology) -> Result<Propagation> {
    let reaction = onto.reaction(&slots.text(stage, "reaction_id")?)?;
    let given = onto.substance(&slots.text(stage, "given_id")?)?;
    let target = onto.substance(&slots.text(stage, "target_id")?)?;
    let coefficient = |s: &Substance| {
        reaction.coefficient_of(&s.id).ok_or_else(|| {
            EngineError::insufficient(stage, format!("{} is not in {}", s.id, reaction.id))
        })
    };
    let (kg, kt) = (coefficient(given)?, coefficient(target)?);

    let n_given = slots.number(stage, "given_mass")? / onto.molar_mass(given)?;
    let n_target = n_given * f64::from(kt) / f64::from(kg);
    Ok(Propagation {
        n_given,
        n_target,
        target_mass: n_target * onto.molar_mass(target)?,
    })
}

fn stoichiometry(slots: &SlotValues, onto: &Ontology) -> Result<SolverOutput> {
    let p = propagate("stoichiometry", slots, onto)?;
    Ok(SolverOutput::new(round_to(p.target_mass, 2))
        .with("n_given", format_number(round_to(p.n_given, 3)))
        .with("n_target", format_number(round_to(p.n_target, 3))))
}

fn reaction_yield(slots: &SlotValues, onto: &Ontology) -> Result<SolverOutput> {
    let stage = "reaction_yield";
    let p = propagate(stage, slots, onto)?;
    let yield_percent = slots.number(stage, "yield_percent")?;
    Ok(
        SolverOutput::new(round_to(p.target_mass * yield_percent / 100.0, 2))
            .with("theoretical_mass", format_number(round_to(p.target_mass, 2))),
    )
}
