//! Wrong-answer generation.
//!
//! A template either names a [`DistractorStrategy`] or the strategy is
//! sniffed from the answer shape and slots. Whatever the strategy produces
//! is filtered the same way: never empty, never the correct answer (nor a
//! member of a list answer), no duplicates, at most `count` entries.

use std::collections::{BTreeMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::formula::strip_subscripts;
use crate::model::{DistractorStrategy, Interaction};
use crate::ontology::{IonKind, Ontology, Solubility};
use crate::resolver::interpolate;
use crate::slots::{format_number, round_to, Answer, SlotValue, SlotValues};

/// Offered when two compared values may be equal.
pub const TIE_LABEL: &str = "equal";
/// Offered when a comparison may not be decidable.
pub const INDETERMINATE_LABEL: &str = "cannot be determined";

/// Pick a strategy from context. Earlier rules win.
pub fn sniff_strategy(correct: &Answer, slots: &SlotValues, interaction: Interaction) -> DistractorStrategy {
    let is_text = matches!(correct, Answer::Text(_));

    if is_text && slots.contains("elementA") && slots.contains("elementB") {
        return DistractorStrategy::ElementComparison;
    }

    let known_label = |v: Option<&SlotValue>| {
        v.and_then(SlotValue::as_text)
            .is_some_and(|s| Solubility::parse(s).is_some())
    };
    if known_label(Some(correct)) || known_label(slots.get("expected_solubility")) {
        return DistractorStrategy::Solubility;
    }

    if interaction.is_numeric() || matches!(correct, Answer::Number(_)) {
        return DistractorStrategy::Numeric;
    }

    if is_text && slots.contains("cation_id") {
        return DistractorStrategy::IonFormula;
    }

    DistractorStrategy::Generic
}

/// Produce up to `count` wrong answers for `correct`.
pub fn generate_distractors<R: Rng + ?Sized>(
    correct: &Answer,
    slots: &SlotValues,
    interaction: Interaction,
    strategy: Option<&DistractorStrategy>,
    ontology: &Ontology,
    count: usize,
    rng: &mut R,
) -> Vec<String> {
    let sniffed;
    let strategy = match strategy {
        Some(s) => s,
        None => {
            sniffed = sniff_strategy(correct, slots, interaction);
            &sniffed
        }
    };
    tracing::trace!(?strategy, "generating distractors");

    let candidates = match strategy {
        DistractorStrategy::ElementComparison => element_comparison(correct, slots),
        DistractorStrategy::Solubility => solubility(),
        DistractorStrategy::Numeric => numeric(correct),
        DistractorStrategy::IonFormula => ion_formula(correct, slots, ontology, rng),
        DistractorStrategy::Generic => generic(ontology, rng),
        DistractorStrategy::Permutation => permutation(correct, count, rng),
        DistractorStrategy::Pool(pool) => from_pool(pool, slots, rng),
    };
    finalize(candidates, correct, count)
}

/// Drop empties, the answer and its members, and duplicates; cap at `count`.
fn finalize(candidates: Vec<String>, correct: &Answer, count: usize) -> Vec<String> {
    let mut excluded: HashSet<String> = HashSet::from([correct.to_string()]);
    if let Answer::List(members) = correct {
        excluded.extend(members.iter().cloned());
    }

    let mut out = Vec::with_capacity(count);
    for candidate in candidates {
        if out.len() == count {
            break;
        }
        if candidate.trim().is_empty() || !excluded.insert(candidate.clone()) {
            continue;
        }
        out.push(candidate);
    }
    out
}

fn element_comparison(correct: &Answer, slots: &SlotValues) -> Vec<String> {
    let answer = correct.to_string();
    let mut out: Vec<String> = ["elementA", "elementB"]
        .iter()
        .filter_map(|name| slots.get(name))
        .map(SlotValue::to_string)
        .filter(|symbol| *symbol != answer)
        .collect();
    out.push(TIE_LABEL.to_string());
    out.push(INDETERMINATE_LABEL.to_string());
    out
}

fn solubility() -> Vec<String> {
    Solubility::LABELS.iter().map(|s| s.to_string()).collect()
}

/// Near misses in a fixed order: nearest neighbours first.
fn numeric(correct: &Answer) -> Vec<String> {
    let value = correct.to_number();
    if !value.is_finite() {
        return Vec::new();
    }

    let values = if value.fract() == 0.0 {
        let mut v = vec![value + 1.0, value - 1.0, value + 2.0, value - 2.0];
        if value != 0.0 {
            v.push(-value);
        }
        v.push(0.0);
        v
    } else {
        let mut v = vec![value + 0.5, value - 0.5, value + 1.0, value - 1.0, value * 2.0];
        if value != 0.0 {
            v.push(value / 2.0);
        }
        v
    };
    values
        .into_iter()
        .map(|v| format_number(round_to(v, 6)))
        .collect()
}

fn ion_formula<R: Rng + ?Sized>(
    correct: &Answer,
    slots: &SlotValues,
    ontology: &Ontology,
    rng: &mut R,
) -> Vec<String> {
    let formula = correct.to_string();
    let mut out = vec![formula.replace('₂', "₃"), strip_subscripts(&formula)];

    // The salt's own anion is a component of the answer, not an alternative.
    let own = slots.get("anion_id").and_then(SlotValue::as_text);
    let mut anions: Vec<String> = ontology
        .ions_of(IonKind::Anion)
        .filter(|ion| Some(ion.id.as_str()) != own)
        .map(|ion| ion.base_formula().to_string())
        .collect();
    anions.shuffle(rng);
    out.extend(anions);
    out
}

fn generic<R: Rng + ?Sized>(ontology: &Ontology, rng: &mut R) -> Vec<String> {
    let mut symbols: Vec<String> = ontology
        .core
        .elements
        .iter()
        .map(|e| e.symbol.clone())
        .collect();
    symbols.shuffle(rng);
    symbols
}

/// Reorderings of a list answer, rendered the way the answer displays.
fn permutation<R: Rng + ?Sized>(correct: &Answer, count: usize, rng: &mut R) -> Vec<String> {
    let Answer::List(items) = correct else {
        return Vec::new();
    };
    let mut reversed = items.clone();
    reversed.reverse();
    let mut out = vec![reversed.join(", ")];

    let mut shuffled = items.clone();
    for _ in 0..count * 8 {
        shuffled.shuffle(rng);
        out.push(shuffled.join(", "));
    }
    out
}

/// Interpolate pool entries against the slots. A bare `{slot}` entry naming
/// a list slot expands to its members; entries left with an unresolved
/// token are skipped.
fn from_pool<R: Rng + ?Sized>(pool: &[String], slots: &SlotValues, rng: &mut R) -> Vec<String> {
    let rendered: BTreeMap<String, String> = slots
        .iter()
        .map(|(name, value)| (name.clone(), value.to_string()))
        .collect();

    let mut out = Vec::new();
    for entry in pool {
        let bare = entry
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'));
        if let Some(SlotValue::List(items)) = bare.and_then(|name| slots.get(name)) {
            out.extend(items.iter().cloned());
            continue;
        }
        let text = interpolate(entry, &rendered);
        if text.contains('{') {
            continue;
        }
        out.push(text);
    }
    out.shuffle(rng);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture_ontology, rng};
    use proptest::prelude::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn list(items: &[&str]) -> Answer {
        Answer::List(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn sniff_order() {
        let pair = SlotValues::new().with("elementA", "Na").with("elementB", "Cl");
        assert_eq!(
            sniff_strategy(&Answer::from("Cl"), &pair, Interaction::ChoiceSingle),
            DistractorStrategy::ElementComparison
        );
        // A solubility label wins over the ion slots.
        let salt = SlotValues::new()
            .with("cation_id", "na")
            .with("expected_solubility", "soluble");
        assert_eq!(
            sniff_strategy(&Answer::from("soluble"), &salt, Interaction::ChoiceSingle),
            DistractorStrategy::Solubility
        );
        assert_eq!(
            sniff_strategy(&Answer::Number(3.0), &SlotValues::new(), Interaction::ChoiceSingle),
            DistractorStrategy::Numeric
        );
        let ions = SlotValues::new().with("cation_id", "ca");
        assert_eq!(
            sniff_strategy(&Answer::from("CaCl₂"), &ions, Interaction::ChoiceSingle),
            DistractorStrategy::IonFormula
        );
        assert_eq!(
            sniff_strategy(&Answer::from("1s²"), &SlotValues::new(), Interaction::InteractiveOrbital),
            DistractorStrategy::Generic
        );
    }

    #[test]
    fn element_comparison_offers_other_element_and_labels() {
        let onto = fixture_ontology();
        let slots = SlotValues::new().with("elementA", "Na").with("elementB", "Cl");
        let out = generate_distractors(
            &Answer::from("Cl"),
            &slots,
            Interaction::ChoiceSingle,
            None,
            &onto,
            3,
            &mut rng(),
        );
        assert_eq!(out, ["Na", TIE_LABEL, INDETERMINATE_LABEL]);
    }

    #[test]
    fn solubility_offers_the_other_labels() {
        let onto = fixture_ontology();
        let out = generate_distractors(
            &Answer::from("insoluble"),
            &SlotValues::new(),
            Interaction::ChoiceSingle,
            None,
            &onto,
            3,
            &mut rng(),
        );
        assert_eq!(out, ["soluble", "slightly_soluble"]);
    }

    #[test]
    fn integer_answers_get_integer_neighbours() {
        let onto = fixture_ontology();
        let out = generate_distractors(
            &Answer::Number(-2.0),
            &SlotValues::new(),
            Interaction::ChoiceSingle,
            None,
            &onto,
            6,
            &mut rng(),
        );
        let mut sorted = out.clone();
        sorted.sort();
        assert_eq!(sorted, ["-1", "-3", "-4", "0", "2"]);
    }

    #[test]
    fn numeric_choices_are_the_nearest_neighbours_whatever_the_seed() {
        let onto = fixture_ontology();
        for seed in 0..50 {
            let out = generate_distractors(
                &Answer::Number(5.0),
                &SlotValues::new(),
                Interaction::ChoiceSingle,
                None,
                &onto,
                3,
                &mut SmallRng::seed_from_u64(seed),
            );
            assert_eq!(out, ["6", "4", "7"], "seed {seed}");
        }
    }

    #[test]
    fn zero_answer_skips_sign_flip_and_literal_zero() {
        let onto = fixture_ontology();
        let out = generate_distractors(
            &Answer::Number(0.0),
            &SlotValues::new(),
            Interaction::NumericInput,
            None,
            &onto,
            10,
            &mut rng(),
        );
        let mut sorted = out.clone();
        sorted.sort();
        assert_eq!(sorted, ["-1", "-2", "1", "2"]);
    }

    #[test]
    fn fractional_answers() {
        let onto = fixture_ontology();
        let out = generate_distractors(
            &Answer::Number(0.3),
            &SlotValues::new(),
            Interaction::NumericInput,
            None,
            &onto,
            10,
            &mut rng(),
        );
        let mut sorted = out.clone();
        sorted.sort();
        assert_eq!(sorted, ["-0.2", "-0.7", "0.15", "0.6", "0.8", "1.3"]);
    }

    #[test]
    fn ion_formula_mutations_come_first() {
        let onto = fixture_ontology();
        let slots = SlotValues::new().with("cation_id", "ca").with("anion_id", "cl");
        let out = generate_distractors(
            &Answer::from("CaCl₂"),
            &slots,
            Interaction::ChoiceSingle,
            None,
            &onto,
            3,
            &mut rng(),
        );
        assert_eq!(out[0], "CaCl₃");
        assert_eq!(out[1], "CaCl");
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn ion_formula_never_offers_the_salts_own_anion() {
        let onto = fixture_ontology();
        let slots = SlotValues::new().with("cation_id", "ca").with("anion_id", "cl");
        for seed in 0..200 {
            let out = generate_distractors(
                &Answer::from("CaCl₂"),
                &slots,
                Interaction::ChoiceSingle,
                None,
                &onto,
                3,
                &mut SmallRng::seed_from_u64(seed),
            );
            assert!(!out.contains(&"Cl".to_string()), "seed {seed}: {out:?}");
            assert_eq!(out.len(), 3);
        }
    }

    #[test]
    fn pool_expands_list_slots_and_excludes_members() {
        let onto = fixture_ontology();
        let slots = SlotValues::new().with(
            "elements",
            vec!["Na".to_string(), "Cl".to_string(), "Fe".to_string(), "S".to_string()],
        );
        let strategy = DistractorStrategy::Pool(vec!["{elements}".into()]);
        let out = generate_distractors(
            &list(&["Na", "Fe"]),
            &slots,
            Interaction::ChoiceMulti,
            Some(&strategy),
            &onto,
            3,
            &mut rng(),
        );
        let mut sorted = out.clone();
        sorted.sort();
        assert_eq!(sorted, ["Cl", "S"]);
    }

    #[test]
    fn pool_skips_unresolved_tokens() {
        let onto = fixture_ontology();
        let slots = SlotValues::new().with("substanceA", "NaCl");
        let strategy = DistractorStrategy::Pool(vec![
            "{substanceA}".into(),
            "{substanceB}".into(),
            "equal".into(),
        ]);
        let out = generate_distractors(
            &Answer::from("CO₂"),
            &slots,
            Interaction::ChoiceSingle,
            Some(&strategy),
            &onto,
            3,
            &mut rng(),
        );
        let mut sorted = out.clone();
        sorted.sort();
        assert_eq!(sorted, ["NaCl", "equal"]);
    }

    #[test]
    fn permutations_differ_from_the_order() {
        let onto = fixture_ontology();
        let correct = list(&["Na", "Si", "Cl"]);
        let out = generate_distractors(
            &correct,
            &SlotValues::new(),
            Interaction::OrderDragdrop,
            Some(&DistractorStrategy::Permutation),
            &onto,
            3,
            &mut rng(),
        );
        assert_eq!(out[0], "Cl, Si, Na");
        assert_eq!(out.len(), 3);
        assert!(!out.contains(&"Na, Si, Cl".to_string()));
    }

    #[test]
    fn generic_draws_element_symbols() {
        let onto = fixture_ontology();
        let out = generate_distractors(
            &Answer::from("Na"),
            &SlotValues::new(),
            Interaction::ChoiceSingle,
            Some(&DistractorStrategy::Generic),
            &onto,
            3,
            &mut rng(),
        );
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|s| onto.element(s).is_ok() && s != "Na"));
    }

    fn any_answer() -> impl Strategy<Value = Answer> {
        prop_oneof![
            (-50i32..50).prop_map(|n| Answer::Number(f64::from(n))),
            (-100.0f64..100.0).prop_map(|n| Answer::Number(round_to(n, 2))),
            prop::sample::select(vec!["Na", "Cl", "soluble", "CaCl₂", "", "equal"])
                .prop_map(Answer::from),
            prop::collection::vec(prop::sample::select(vec!["Na", "Mg", "Cl", "S"]), 0..4)
                .prop_map(|v| Answer::List(v.into_iter().map(String::from).collect())),
        ]
    }

    fn any_strategy() -> impl Strategy<Value = Option<DistractorStrategy>> {
        prop_oneof![
            Just(None),
            Just(Some(DistractorStrategy::ElementComparison)),
            Just(Some(DistractorStrategy::Solubility)),
            Just(Some(DistractorStrategy::Numeric)),
            Just(Some(DistractorStrategy::IonFormula)),
            Just(Some(DistractorStrategy::Generic)),
            Just(Some(DistractorStrategy::Permutation)),
            Just(Some(DistractorStrategy::Pool(vec![
                "{elementA}".into(),
                "{elementB}".into(),
                "equal".into(),
                "equal".into(),
            ]))),
        ]
    }

    proptest! {
        #[test]
        fn distractor_invariants(
            correct in any_answer(),
            strategy in any_strategy(),
            count in 0usize..6,
            seed: u64,
        ) {
            let onto = fixture_ontology();
            let slots = SlotValues::new()
                .with("elementA", "Na")
                .with("elementB", "Cl")
                .with("cation_id", "na");
            let mut rng = SmallRng::seed_from_u64(seed);
            let out = generate_distractors(
                &correct,
                &slots,
                Interaction::ChoiceSingle,
                strategy.as_ref(),
                &onto,
                count,
                &mut rng,
            );

            prop_assert!(out.len() <= count);
            prop_assert!(!out.contains(&correct.to_string()));
            if let Answer::List(members) = &correct {
                prop_assert!(out.iter().all(|d| !members.contains(d)));
            }
            prop_assert!(out.iter().all(|d| !d.trim().is_empty()));
            let unique: HashSet<&String> = out.iter().collect();
            prop_assert_eq!(unique.len(), out.len());
        }
    }
}
