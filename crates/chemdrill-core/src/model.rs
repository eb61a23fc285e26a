//! Core data model types for chemdrill.
//!
//! Task templates are the declarative "program" the engine interprets: which
//! generator samples the domain, which solvers compute the answer, which
//! prompt renders the question, and which competencies the task trains.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use rand::seq::IndexedRandom;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::slots::{Answer, SlotValues};

/// The interaction kind a task is presented as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interaction {
    ChoiceSingle,
    ChoiceMulti,
    NumericInput,
    OrderDragdrop,
    MatchPairs,
    InteractiveOrbital,
    GuidedSelection,
}

impl Interaction {
    pub const ALL: [Interaction; 7] = [
        Interaction::ChoiceSingle,
        Interaction::ChoiceMulti,
        Interaction::NumericInput,
        Interaction::OrderDragdrop,
        Interaction::MatchPairs,
        Interaction::InteractiveOrbital,
        Interaction::GuidedSelection,
    ];

    pub fn is_numeric(self) -> bool {
        self == Interaction::NumericInput
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Interaction::ChoiceSingle => "choice_single",
            Interaction::ChoiceMulti => "choice_multi",
            Interaction::NumericInput => "numeric_input",
            Interaction::OrderDragdrop => "order_dragdrop",
            Interaction::MatchPairs => "match_pairs",
            Interaction::InteractiveOrbital => "interactive_orbital",
            Interaction::GuidedSelection => "guided_selection",
        }
    }
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interaction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Interaction::ALL
            .into_iter()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| format!("unknown interaction: {s}"))
    }
}

/// Answer-checking semantics. Unknown names fall back to [`EvalMode::Exact`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EvalMode {
    #[default]
    Exact,
    Tolerance,
    PartialCredit,
    SetEquivalence,
}

impl From<String> for EvalMode {
    fn from(s: String) -> Self {
        match s.as_str() {
            "tolerance" => EvalMode::Tolerance,
            "partial_credit" => EvalMode::PartialCredit,
            "set_equivalence" => EvalMode::SetEquivalence,
            _ => EvalMode::Exact,
        }
    }
}

impl From<EvalMode> for String {
    fn from(mode: EvalMode) -> Self {
        match mode {
            EvalMode::Exact => "exact",
            EvalMode::Tolerance => "tolerance",
            EvalMode::PartialCredit => "partial_credit",
            EvalMode::SetEquivalence => "set_equivalence",
        }
        .to_string()
    }
}

/// How a user's answer is checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSpec {
    #[serde(default)]
    pub mode: EvalMode,
    /// Absolute tolerance for [`EvalMode::Tolerance`] (default 0).
    #[serde(default)]
    pub tolerance: Option<f64>,
}

/// Wrong-answer strategy a template can pin instead of relying on sniffing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistractorStrategy {
    ElementComparison,
    Solubility,
    Numeric,
    IonFormula,
    Generic,
    /// Reorderings of a list answer.
    Permutation,
    /// Fixed candidates; `{slot}` entries are interpolated, list slots expand.
    Pool(Vec<String>),
}

/// Presentation and evaluation metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateMeta {
    pub interaction: Interaction,
    #[serde(default)]
    pub object_types: Vec<String>,
    #[serde(default)]
    pub reasoning: Vec<String>,
    #[serde(default)]
    pub evaluation: EvaluationSpec,
    #[serde(default)]
    pub distractor_strategy: Option<DistractorStrategy>,
}

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{(\w+)\}$").expect("placeholder regex is valid"));

/// A step parameter: either a literal, or a `"{name}"` placeholder that is
/// resolved against the step's domain of valid choices at generation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum ParamValue {
    Literal(serde_json::Value),
    Placeholder(String),
}

impl From<serde_json::Value> for ParamValue {
    fn from(value: serde_json::Value) -> Self {
        if let serde_json::Value::String(s) = &value {
            if let Some(caps) = PLACEHOLDER.captures(s) {
                return ParamValue::Placeholder(caps[1].to_string());
            }
        }
        ParamValue::Literal(value)
    }
}

impl From<ParamValue> for serde_json::Value {
    fn from(param: ParamValue) -> Self {
        match param {
            ParamValue::Literal(v) => v,
            ParamValue::Placeholder(name) => serde_json::Value::String(format!("{{{name}}}")),
        }
    }
}

impl ParamValue {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, ParamValue::Placeholder(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Literal(v) => v.as_str(),
            ParamValue::Placeholder(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Literal(v) => v.as_f64(),
            ParamValue::Placeholder(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Literal(v) => v.as_bool(),
            ParamValue::Placeholder(_) => None,
        }
    }

    /// Resolve against a domain of valid choices.
    ///
    /// A literal string is returned as-is (the caller validates it). A
    /// placeholder naming a member of `choices` resolves to that member; any
    /// other placeholder resolves to a uniformly random member.
    pub fn resolve_choice<R: Rng + ?Sized>(&self, choices: &[String], rng: &mut R) -> Option<String> {
        match self {
            ParamValue::Literal(v) => v.as_str().map(str::to_string),
            ParamValue::Placeholder(name) => {
                if choices.iter().any(|c| c == name) {
                    Some(name.clone())
                } else {
                    choices.choose(rng).cloned()
                }
            }
        }
    }
}

/// One stage reference in a template pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStep {
    pub id: String,
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
}

impl PipelineStep {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: serde_json::Value) -> Self {
        self.params.insert(key.to_string(), ParamValue::from(value));
        self
    }

    pub fn param(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    pub fn str_param(&self, key: &str) -> Option<&str> {
        self.param(key).and_then(ParamValue::as_str)
    }

    pub fn bool_param(&self, key: &str, default: bool) -> bool {
        self.param(key).and_then(ParamValue::as_bool).unwrap_or(default)
    }

    pub fn f64_param(&self, key: &str) -> Option<f64> {
        self.param(key).and_then(ParamValue::as_f64)
    }

    pub fn usize_param(&self, key: &str, default: usize) -> usize {
        self.f64_param(key)
            .filter(|n| *n >= 0.0)
            .map(|n| n as usize)
            .unwrap_or(default)
    }
}

/// Generator, solver and renderer references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    pub generator: PipelineStep,
    #[serde(default)]
    pub solvers: Vec<PipelineStep>,
    #[serde(default)]
    pub renderers: Vec<PipelineStep>,
}

/// Difficulty features and the target band whose midpoint is reported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifficultyModel {
    #[serde(default)]
    pub features: BTreeMap<String, bool>,
    pub target_band: [f64; 2],
}

impl DifficultyModel {
    pub fn midpoint(&self) -> f64 {
        (self.target_band[0] + self.target_band[1]) / 2.0
    }
}

/// Whether a competency is the primary or a secondary target of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompetencyWeight {
    #[serde(rename = "P")]
    Primary,
    #[serde(rename = "S")]
    Secondary,
}

/// A declarative exercise shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTemplate {
    /// Unique identifier.
    pub id: String,
    pub meta: TemplateMeta,
    pub pipeline: Pipeline,
    /// Key into the ontology's prompt templates.
    pub prompt_template_id: String,
    #[serde(default)]
    pub explanation_template_id: Option<String>,
    pub difficulty: DifficultyModel,
    #[serde(default)]
    pub exam_tags: Vec<String>,
    #[serde(default)]
    pub competency_hint: BTreeMap<String, CompetencyWeight>,
}

/// One fully resolved task instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedTask {
    pub id: Uuid,
    pub template_id: String,
    pub interaction: Interaction,
    pub question: String,
    pub correct_answer: Answer,
    pub distractors: Vec<String>,
    pub explanation: String,
    pub competency_map: BTreeMap<String, CompetencyWeight>,
    pub difficulty: f64,
    pub exam_tags: Vec<String>,
    pub slots: SlotValues,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn interaction_display_and_parse() {
        assert_eq!(Interaction::ChoiceSingle.to_string(), "choice_single");
        assert_eq!(
            "guided_selection".parse::<Interaction>().unwrap(),
            Interaction::GuidedSelection
        );
        assert!("drag_and_drop".parse::<Interaction>().is_err());
        assert!(Interaction::NumericInput.is_numeric());
    }

    #[test]
    fn unknown_eval_mode_is_exact() {
        let spec: EvaluationSpec = serde_json::from_str(r#"{"mode": "fuzzy"}"#).unwrap();
        assert_eq!(spec.mode, EvalMode::Exact);
        let spec: EvaluationSpec =
            serde_json::from_str(r#"{"mode": "tolerance", "tolerance": 0.5}"#).unwrap();
        assert_eq!(spec.mode, EvalMode::Tolerance);
        assert_eq!(spec.tolerance, Some(0.5));
    }

    #[test]
    fn placeholders_are_parsed_once() {
        let step: PipelineStep = serde_json::from_str(
            r#"{"id": "pick_element_pair", "params": {"property": "{property}", "main_group": true, "label": "{not a placeholder}"}}"#,
        )
        .unwrap();
        assert_eq!(
            step.param("property"),
            Some(&ParamValue::Placeholder("property".into()))
        );
        assert!(step.bool_param("main_group", false));
        assert!(!step.param("label").unwrap().is_placeholder());

        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["params"]["property"], "{property}");
    }

    #[test]
    fn placeholder_resolution() {
        let mut rng = SmallRng::seed_from_u64(7);
        let choices = vec!["ascending".to_string(), "descending".to_string()];

        let named = ParamValue::Placeholder("descending".into());
        assert_eq!(named.resolve_choice(&choices, &mut rng).unwrap(), "descending");

        let random = ParamValue::Placeholder("order".into());
        for _ in 0..20 {
            let picked = random.resolve_choice(&choices, &mut rng).unwrap();
            assert!(choices.contains(&picked));
        }

        let literal = ParamValue::Literal(serde_json::json!("ascending"));
        assert_eq!(literal.resolve_choice(&choices, &mut rng).unwrap(), "ascending");
    }

    #[test]
    fn difficulty_midpoint() {
        let model = DifficultyModel {
            features: BTreeMap::new(),
            target_band: [0.2, 0.6],
        };
        assert!((model.midpoint() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn distractor_strategy_serde() {
        let s: DistractorStrategy = serde_json::from_str(r#""ion_formula""#).unwrap();
        assert_eq!(s, DistractorStrategy::IonFormula);
        let s: DistractorStrategy = serde_json::from_str(r#"{"pool": ["{elementA}", "equal"]}"#).unwrap();
        assert_eq!(
            s,
            DistractorStrategy::Pool(vec!["{elementA}".into(), "equal".into()])
        );
    }

    #[test]
    fn competency_weight_letters() {
        let map: BTreeMap<String, CompetencyWeight> =
            serde_json::from_str(r#"{"periodic_trends": "P", "atomic_structure": "S"}"#).unwrap();
        assert_eq!(map["periodic_trends"], CompetencyWeight::Primary);
        assert_eq!(map["atomic_structure"], CompetencyWeight::Secondary);
    }
}
