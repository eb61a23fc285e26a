//! Answer checking.
//!
//! [`evaluate`] is total: it never fails, and malformed numeric input simply
//! compares false.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::{EvalMode, EvaluationSpec};
use crate::slots::Answer;

/// Result of checking one answer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalOutcome {
    pub correct: bool,
    /// Partial score in `0.0..=1.0`.
    pub score: f64,
}

impl EvalOutcome {
    fn binary(correct: bool) -> Self {
        Self {
            correct,
            score: if correct { 1.0 } else { 0.0 },
        }
    }
}

/// Check `user` against `correct` under the template's evaluation spec.
pub fn evaluate(user: &Answer, correct: &Answer, spec: &EvaluationSpec) -> EvalOutcome {
    match spec.mode {
        EvalMode::Exact => exact(user, correct),
        EvalMode::Tolerance => tolerance(user, correct, spec.tolerance.unwrap_or(0.0)),
        EvalMode::PartialCredit => partial_credit(user, correct),
        EvalMode::SetEquivalence => set_equivalence(user, correct),
    }
}

fn exact(user: &Answer, correct: &Answer) -> EvalOutcome {
    EvalOutcome::binary(user.canonical() == correct.canonical())
}

fn tolerance(user: &Answer, correct: &Answer, tolerance: f64) -> EvalOutcome {
    let expected = match correct {
        Answer::Number(n) => *n,
        Answer::Text(s) if !s.trim().is_empty() => correct.to_number(),
        _ => f64::NAN,
    };
    if expected.is_nan() {
        return exact(user, correct);
    }
    // NaN on the user side compares false.
    let delta = (user.to_number() - expected).abs();
    EvalOutcome::binary(delta <= tolerance)
}

fn partial_credit(user: &Answer, correct: &Answer) -> EvalOutcome {
    match (user, correct) {
        (Answer::List(given), Answer::List(expected)) => {
            if given.len() != expected.len() {
                return EvalOutcome::binary(false);
            }
            if expected.is_empty() {
                return EvalOutcome::binary(true);
            }
            let matching = given
                .iter()
                .zip(expected.iter())
                .filter(|(g, e)| g == e)
                .count();
            EvalOutcome {
                correct: matching == expected.len(),
                score: matching as f64 / expected.len() as f64,
            }
        }
        _ => exact(user, correct),
    }
}

fn as_set(answer: &Answer) -> BTreeSet<String> {
    match answer {
        Answer::List(items) => items.iter().cloned().collect(),
        scalar => BTreeSet::from([scalar.to_string()]),
    }
}

fn set_equivalence(user: &Answer, correct: &Answer) -> EvalOutcome {
    EvalOutcome::binary(as_set(user) == as_set(correct))
}
