//! Bayesian Knowledge Tracing.
//!
//! Each competency carries an independent scalar `P(L)`, the probability the
//! learner has mastered it. After every answer the estimate is updated with
//! the competency's guess/slip/transition parameters, adjusted for whether a
//! hint was used. There is no decay and no coupling between competencies.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::CompetencyWeight;

/// Lower clamp for `P(L)`.
pub const P_L_MIN: f64 = 0.001;
/// Upper clamp for `P(L)`.
pub const P_L_MAX: f64 = 0.999;

/// Static per-competency BKT parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BktParams {
    /// Prior probability of mastery.
    pub p_l0: f64,
    /// Learning transition probability.
    pub p_t: f64,
    /// Slip probability.
    pub p_s: f64,
    /// Guess probability.
    pub p_g: f64,
}

impl Default for BktParams {
    fn default() -> Self {
        Self {
            p_l0: 0.1,
            p_t: 0.1,
            p_s: 0.1,
            p_g: 0.2,
        }
    }
}

impl BktParams {
    /// Apply the hint modifiers: a hint makes a correct answer less
    /// informative and slows learning; no hint speeds learning up.
    fn adjusted(&self, hint_used: bool) -> (f64, f64, f64) {
        if hint_used {
            let g = (self.p_g + 0.25).min(0.60);
            let s = (self.p_s + 0.10).min(0.60);
            let t = (self.p_t - 0.03).max(0.01);
            (g, s, t)
        } else {
            (self.p_g, self.p_s, (self.p_t + 0.05).min(0.35))
        }
    }
}

/// One BKT step: Bayesian posterior on the observation, then the learning
/// transition, clamped to `[P_L_MIN, P_L_MAX]`.
///
/// `NaN` input propagates; callers own the domain `p_l ∈ [0, 1]`.
pub fn bkt_update(p_l: f64, params: &BktParams, correct: bool, hint_used: bool) -> f64 {
    let (g, s, t) = params.adjusted(hint_used);

    let (numerator, denominator) = if correct {
        let num = p_l * (1.0 - s);
        (num, num + (1.0 - p_l) * g)
    } else {
        let num = p_l * s;
        (num, num + (1.0 - p_l) * (1.0 - g))
    };
    let posterior = if denominator == 0.0 {
        p_l
    } else {
        numerator / denominator
    };

    let next = posterior + (1.0 - posterior) * t;
    next.clamp(P_L_MIN, P_L_MAX)
}

/// Coarse mastery band derived from `P(L)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasteryLevel {
    None,
    Basic,
    Confident,
    Automatic,
}

impl MasteryLevel {
    pub fn from_p_l(p_l: f64) -> Self {
        if p_l >= 0.93 {
            MasteryLevel::Automatic
        } else if p_l >= 0.8 {
            MasteryLevel::Confident
        } else if p_l >= 0.6 {
            MasteryLevel::Basic
        } else {
            MasteryLevel::None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MasteryLevel::None => "none",
            MasteryLevel::Basic => "basic",
            MasteryLevel::Confident => "confident",
            MasteryLevel::Automatic => "automatic",
        }
    }
}

impl fmt::Display for MasteryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shorthand for [`MasteryLevel::from_p_l`].
pub fn get_level(p_l: f64) -> MasteryLevel {
    MasteryLevel::from_p_l(p_l)
}

/// Per-competency `P(L)` values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BktState(BTreeMap<String, f64>);

impl BktState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored `P(L)`, or the prior when the competency has no history.
    pub fn p_l(&self, competency_id: &str, params: &BktParams) -> f64 {
        self.0.get(competency_id).copied().unwrap_or(params.p_l0)
    }

    pub fn get(&self, competency_id: &str) -> Option<f64> {
        self.0.get(competency_id).copied()
    }

    /// Overwrite a value as loaded from storage, clamped into range.
    pub fn set(&mut self, competency_id: impl Into<String>, p_l: f64) {
        self.0
            .insert(competency_id.into(), p_l.clamp(P_L_MIN, P_L_MAX));
    }

    /// Apply one answer to one competency and return the new `P(L)`.
    pub fn record(
        &mut self,
        competency_id: &str,
        params: &BktParams,
        correct: bool,
        hint_used: bool,
    ) -> f64 {
        let next = bkt_update(self.p_l(competency_id, params), params, correct, hint_used);
        self.0.insert(competency_id.to_string(), next);
        next
    }

    /// Apply one answer to every competency a task touches.
    ///
    /// Primary and secondary competencies are updated the same way and
    /// independently of each other.
    pub fn record_answer<F>(
        &mut self,
        competency_map: &BTreeMap<String, CompetencyWeight>,
        params_for: F,
        correct: bool,
        hint_used: bool,
    ) -> BTreeMap<String, f64>
    where
        F: Fn(&str) -> BktParams,
    {
        competency_map
            .keys()
            .map(|id| {
                let params = params_for(id);
                (id.clone(), self.record(id, &params, correct, hint_used))
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn params() -> BktParams {
        BktParams {
            p_l0: 0.2,
            p_t: 0.15,
            p_s: 0.1,
            p_g: 0.25,
        }
    }

    #[test]
    fn correct_answer_without_hint() {
        // G=0.25 S=0.1 T'=0.20; posterior = 0.5*0.9 / (0.45 + 0.5*0.25) = 0.45/0.575
        let posterior: f64 = 0.45 / 0.575;
        let expected = posterior + (1.0 - posterior) * 0.20;
        let got = bkt_update(0.5, &params(), true, false);
        assert!((got - expected).abs() < 1e-12, "got {got}, expected {expected}");
    }

    #[test]
    fn wrong_answer_with_hint() {
        // G'=0.50 S'=0.20 T'=0.12; posterior = 0.5*0.2 / (0.1 + 0.5*0.5)
        let posterior: f64 = 0.1 / 0.35;
        let expected = posterior + (1.0 - posterior) * 0.12;
        let got = bkt_update(0.5, &params(), false, true);
        assert!((got - expected).abs() < 1e-12, "got {got}, expected {expected}");
    }

    #[test]
    fn hint_modifiers_are_capped() {
        let p = BktParams {
            p_l0: 0.1,
            p_t: 0.02,
            p_s: 0.55,
            p_g: 0.5,
        };
        assert_eq!(p.adjusted(true), (0.60, 0.60, 0.01));
        let p = BktParams {
            p_t: 0.33,
            ..params()
        };
        assert_eq!(p.adjusted(false).2, 0.35);
    }

    #[test]
    fn zero_denominator_keeps_prior() {
        let p = BktParams {
            p_l0: 0.0,
            p_t: 0.0,
            p_s: 0.0,
            p_g: 0.0,
        };
        // p_l = 0 and G = 0: the correct branch denominator is zero.
        let got = bkt_update(0.0, &p, true, false);
        assert!((got - 0.05).abs() < 1e-12);
    }

    #[test]
    fn nan_propagates() {
        assert!(bkt_update(f64::NAN, &params(), true, false).is_nan());
    }

    #[test]
    fn level_thresholds() {
        assert_eq!(get_level(0.59), MasteryLevel::None);
        assert_eq!(get_level(0.6), MasteryLevel::Basic);
        assert_eq!(get_level(0.79), MasteryLevel::Basic);
        assert_eq!(get_level(0.8), MasteryLevel::Confident);
        assert_eq!(get_level(0.92), MasteryLevel::Confident);
        assert_eq!(get_level(0.93), MasteryLevel::Automatic);
    }

    #[test]
    fn state_defaults_to_prior_and_records() {
        let mut state = BktState::new();
        assert_eq!(state.p_l("stoichiometry", &params()), 0.2);
        let next = state.record("stoichiometry", &params(), true, false);
        assert_eq!(state.get("stoichiometry"), Some(next));
        assert!(next > 0.2);
    }

    #[test]
    fn answer_updates_each_competency_independently() {
        let mut state = BktState::new();
        state.set("solubility", 0.7);
        let map: BTreeMap<String, CompetencyWeight> = [
            ("solubility".to_string(), CompetencyWeight::Primary),
            ("salts".to_string(), CompetencyWeight::Secondary),
        ]
        .into_iter()
        .collect();

        let updated = state.record_answer(&map, |_| params(), false, false);
        assert_eq!(updated["solubility"], bkt_update(0.7, &params(), false, false));
        assert_eq!(updated["salts"], bkt_update(0.2, &params(), false, false));
    }

    proptest! {
        #[test]
        fn update_stays_in_range(
            p_l in 0.0f64..=1.0,
            p_t in 0.0f64..=1.0,
            p_s in 0.0f64..=1.0,
            p_g in 0.0f64..=1.0,
            correct: bool,
            hint: bool,
        ) {
            let params = BktParams { p_l0: 0.1, p_t, p_s, p_g };
            let next = bkt_update(p_l, &params, correct, hint);
            prop_assert!((P_L_MIN..=P_L_MAX).contains(&next));
        }

        #[test]
        fn correct_beats_wrong(
            p_l in 0.01f64..0.99,
            p_t in 0.0f64..0.3,
            p_s in 0.01f64..0.3,
            p_g in 0.01f64..0.3,
        ) {
            let params = BktParams { p_l0: 0.1, p_t, p_s, p_g };
            let right = bkt_update(p_l, &params, true, false);
            let wrong = bkt_update(p_l, &params, false, false);
            prop_assert!(right > wrong, "right={right} wrong={wrong}");
        }
    }
}
