//! Shaping a [`GeneratedTask`] into a presentable [`Exercise`].

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::model::{CompetencyWeight, GeneratedTask, Interaction};
use crate::slots::Answer;

const STAGE: &str = "to_exercise";

/// How the learner enters an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseFormat {
    /// Pick one option.
    SingleChoice,
    /// Pick every correct option.
    MultiChoice,
    /// Type a number; the options double as a fallback picker.
    Numeric,
    /// Drag the options into order.
    Ordering,
    /// Connect left and right items.
    Pairs,
    /// Fill an orbital diagram.
    Orbital,
}

impl ExerciseFormat {
    pub fn for_interaction(interaction: Interaction) -> Self {
        match interaction {
            Interaction::ChoiceSingle | Interaction::GuidedSelection => ExerciseFormat::SingleChoice,
            Interaction::ChoiceMulti => ExerciseFormat::MultiChoice,
            Interaction::NumericInput => ExerciseFormat::Numeric,
            Interaction::OrderDragdrop => ExerciseFormat::Ordering,
            Interaction::MatchPairs => ExerciseFormat::Pairs,
            Interaction::InteractiveOrbital => ExerciseFormat::Orbital,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseOption {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPair {
    pub left: String,
    pub right: String,
}

/// Extra context for guided selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidedContext {
    pub chain: Vec<String>,
    pub gap_index: usize,
}

/// A task ready for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    #[serde(rename = "type")]
    pub kind: Interaction,
    pub question: String,
    pub format: ExerciseFormat,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ExerciseOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pairs: Option<Vec<MatchPair>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_z: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<GuidedContext>,
    pub explanation: String,
    pub competency_map: BTreeMap<String, CompetencyWeight>,
}

impl Exercise {
    fn base(task: &GeneratedTask) -> Self {
        Self {
            kind: task.interaction,
            question: task.question.clone(),
            format: ExerciseFormat::for_interaction(task.interaction),
            options: Vec::new(),
            correct_id: None,
            correct_ids: None,
            pairs: None,
            target_z: None,
            context: None,
            explanation: task.explanation.clone(),
            competency_map: task.competency_map.clone(),
        }
    }
}

fn wrong_options(distractors: &[String]) -> impl Iterator<Item = ExerciseOption> + '_ {
    distractors.iter().enumerate().map(|(i, text)| ExerciseOption {
        id: format!("wrong_{i}"),
        text: text.clone(),
    })
}

/// One `"correct"` option plus the distractors, shuffled.
fn single_choice<R: Rng + ?Sized>(task: &GeneratedTask, exercise: &mut Exercise, rng: &mut R) {
    let mut options = vec![ExerciseOption {
        id: "correct".to_string(),
        text: task.correct_answer.to_string(),
    }];
    options.extend(wrong_options(&task.distractors));
    options.shuffle(rng);
    exercise.options = options;
    exercise.correct_id = Some("correct".to_string());
}

fn multi_choice<R: Rng + ?Sized>(task: &GeneratedTask, exercise: &mut Exercise, rng: &mut R) {
    let members: Vec<String> = match &task.correct_answer {
        Answer::List(items) => items.clone(),
        scalar => vec![scalar.to_string()],
    };
    let correct: Vec<ExerciseOption> = members
        .into_iter()
        .enumerate()
        .map(|(i, text)| ExerciseOption {
            id: format!("correct_{i}"),
            text,
        })
        .collect();
    let correct_ids = correct.iter().map(|o| o.id.clone()).collect();

    let mut options = correct;
    options.extend(wrong_options(&task.distractors));
    options.shuffle(rng);
    exercise.options = options;
    exercise.correct_ids = Some(correct_ids);
}

fn match_pairs(task: &GeneratedTask) -> Result<Vec<MatchPair>> {
    let invalid = |message: String| EngineError::InvalidTemplate {
        template_id: task.template_id.clone(),
        message,
    };
    let Answer::List(entries) = &task.correct_answer else {
        return Err(invalid("match_pairs answer must be a list".into()));
    };
    entries
        .iter()
        .map(|entry| {
            let (left, right) = entry
                .split_once(':')
                .ok_or_else(|| invalid(format!("pair '{entry}' is not 'left:right'")))?;
            Ok(MatchPair {
                left: left.to_string(),
                right: right.to_string(),
            })
        })
        .collect()
}

/// Shape `task` for its interaction kind.
///
/// Fails rather than return a partially built exercise.
pub fn to_exercise<R: Rng + ?Sized>(task: &GeneratedTask, rng: &mut R) -> Result<Exercise> {
    let mut exercise = Exercise::base(task);
    match task.interaction {
        Interaction::ChoiceMulti => multi_choice(task, &mut exercise, rng),
        Interaction::MatchPairs => exercise.pairs = Some(match_pairs(task)?),
        Interaction::InteractiveOrbital => {
            let z = task.slots.number(STAGE, "Z")?;
            exercise.target_z = Some(z as u32);
        }
        Interaction::GuidedSelection => {
            let chain = task.slots.list(STAGE, "chain_substances")?.to_vec();
            let gap_index = task.slots.number(STAGE, "gap_index")? as usize;
            single_choice(task, &mut exercise, rng);
            exercise.context = Some(GuidedContext { chain, gap_index });
        }
        Interaction::ChoiceSingle | Interaction::NumericInput | Interaction::OrderDragdrop => {
            single_choice(task, &mut exercise, rng)
        }
    }
    Ok(exercise)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slots::SlotValues;
    use crate::test_support::rng;
    use uuid::Uuid;

    fn task(interaction: Interaction, answer: Answer, distractors: &[&str], slots: SlotValues) -> GeneratedTask {
        GeneratedTask {
            id: Uuid::new_v4(),
            template_id: "t".into(),
            interaction,
            question: "Q?".into(),
            correct_answer: answer,
            distractors: distractors.iter().map(|s| s.to_string()).collect(),
            explanation: "because".into(),
            competency_map: BTreeMap::from([("periodic_trends".to_string(), CompetencyWeight::Primary)]),
            difficulty: 0.3,
            exam_tags: vec![],
            slots,
        }
    }

    #[test]
    fn single_choice_has_one_correct_option() {
        let t = task(
            Interaction::ChoiceSingle,
            Answer::from("Cl"),
            &["Na", "equal", "cannot be determined"],
            SlotValues::new(),
        );
        let ex = to_exercise(&t, &mut rng()).unwrap();
        assert_eq!(ex.options.len(), 4);
        let correct: Vec<_> = ex.options.iter().filter(|o| o.id == "correct").collect();
        assert_eq!(correct.len(), 1);
        assert_eq!(correct[0].text, "Cl");
        assert_eq!(ex.correct_id.as_deref(), Some("correct"));
        assert_eq!(ex.format, ExerciseFormat::SingleChoice);
    }

    #[test]
    fn numeric_answers_are_stringified() {
        let t = task(Interaction::NumericInput, Answer::Number(58.5), &["59.5"], SlotValues::new());
        let ex = to_exercise(&t, &mut rng()).unwrap();
        assert!(ex.options.iter().any(|o| o.id == "correct" && o.text == "58.5"));
        assert_eq!(ex.format, ExerciseFormat::Numeric);
    }

    #[test]
    fn multi_choice_lists_every_correct_member() {
        let answer = Answer::List(vec!["Na".into(), "Fe".into()]);
        let t = task(Interaction::ChoiceMulti, answer, &["Cl", "S"], SlotValues::new());
        let ex = to_exercise(&t, &mut rng()).unwrap();
        assert_eq!(ex.options.len(), 4);
        let mut ids = ex.correct_ids.clone().unwrap();
        ids.sort();
        assert_eq!(ids, ["correct_0", "correct_1"]);
        assert!(ex.correct_id.is_none());
    }

    #[test]
    fn match_pairs_parse_entries() {
        let answer = Answer::List(vec!["Na:1".into(), "O:16".into()]);
        let t = task(Interaction::MatchPairs, answer, &[], SlotValues::new());
        let ex = to_exercise(&t, &mut rng()).unwrap();
        assert!(ex.options.is_empty());
        assert_eq!(
            ex.pairs.unwrap(),
            vec![
                MatchPair { left: "Na".into(), right: "1".into() },
                MatchPair { left: "O".into(), right: "16".into() },
            ]
        );
    }

    #[test]
    fn malformed_pair_is_an_invalid_template() {
        let answer = Answer::List(vec!["Na-1".into()]);
        let t = task(Interaction::MatchPairs, answer, &[], SlotValues::new());
        assert!(matches!(
            to_exercise(&t, &mut rng()),
            Err(EngineError::InvalidTemplate { .. })
        ));
    }

    #[test]
    fn orbital_carries_target_z() {
        let t = task(
            Interaction::InteractiveOrbital,
            Answer::from("1s² 2s¹"),
            &[],
            SlotValues::new().with("Z", 3u32),
        );
        let ex = to_exercise(&t, &mut rng()).unwrap();
        assert_eq!(ex.target_z, Some(3));
        assert!(ex.options.is_empty());

        let t = task(Interaction::InteractiveOrbital, Answer::from("1s²"), &[], SlotValues::new());
        assert_eq!(
            to_exercise(&t, &mut rng()).unwrap_err(),
            EngineError::missing_slot(STAGE, "Z")
        );
    }

    #[test]
    fn guided_selection_carries_chain_context() {
        let slots = SlotValues::new()
            .with("chain_substances", vec!["Ca".to_string(), "CaO".to_string()])
            .with("gap_index", 1usize);
        let t = task(Interaction::GuidedSelection, Answer::from("CaO"), &["MgO", "Na₂O"], slots);
        let ex = to_exercise(&t, &mut rng()).unwrap();
        assert_eq!(ex.options.len(), 3);
        assert_eq!(
            ex.context,
            Some(GuidedContext { chain: vec!["Ca".into(), "CaO".into()], gap_index: 1 })
        );
    }

    #[test]
    fn serializes_camel_case() {
        let slots = SlotValues::new()
            .with("chain_substances", vec!["Ca".to_string(), "CaO".to_string()])
            .with("gap_index", 0usize);
        let t = task(Interaction::GuidedSelection, Answer::from("Ca"), &["Mg"], slots);
        let json = serde_json::to_value(to_exercise(&t, &mut rng()).unwrap()).unwrap();
        assert_eq!(json["type"], "guided_selection");
        assert_eq!(json["correctId"], "correct");
        assert_eq!(json["context"]["gapIndex"], 0);
        assert_eq!(json["competencyMap"]["periodic_trends"], "P");
        assert!(json.get("targetZ").is_none());
    }
}
