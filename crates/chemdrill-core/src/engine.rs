//! Exercise engine orchestrator.
//!
//! Wires the registry, generators, solvers, renderer and distractor engine
//! into one call per task. Every method has an `_with` variant taking an
//! explicit RNG; the plain variants draw from the thread RNG.

use std::sync::Arc;

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::distractors::generate_distractors;
use crate::error::{EngineError, Result};
use crate::evaluator::{evaluate, EvalOutcome};
use crate::exercise::{to_exercise, Exercise};
use crate::generators::run_generator;
use crate::model::{GeneratedTask, TaskTemplate};
use crate::ontology::Ontology;
use crate::registry::TemplateRegistry;
use crate::resolver::render_prompt;
use crate::slots::{Answer, SlotValues};
use crate::solvers::{run_solver, SolveContext, SolverOutput};
use crate::traits::ChemistryToolkit;

/// Tunables for the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Distractors generated per task.
    #[serde(default = "default_distractor_count")]
    pub distractor_count: usize,
    /// Template draws before `generate_for_competency` gives up.
    #[serde(default = "default_max_competency_attempts")]
    pub max_competency_attempts: u32,
}

fn default_distractor_count() -> usize {
    3
}

fn default_max_competency_attempts() -> u32 {
    30
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            distractor_count: default_distractor_count(),
            max_competency_attempts: default_max_competency_attempts(),
        }
    }
}

/// The exercise engine.
pub struct ExerciseEngine {
    registry: TemplateRegistry,
    ontology: Arc<Ontology>,
    toolkit: Arc<dyn ChemistryToolkit>,
    config: EngineConfig,
}

impl ExerciseEngine {
    pub fn new(
        registry: TemplateRegistry,
        ontology: Arc<Ontology>,
        toolkit: Arc<dyn ChemistryToolkit>,
        config: EngineConfig,
    ) -> Self {
        Self {
            registry,
            ontology,
            toolkit,
            config,
        }
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn ontology(&self) -> &Ontology {
        &self.ontology
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Generate a task from the template with the given id.
    pub fn generate(&self, template_id: &str) -> Result<GeneratedTask> {
        self.generate_with(template_id, &mut rand::rng())
    }

    pub fn generate_with<R: Rng + ?Sized>(&self, template_id: &str, rng: &mut R) -> Result<GeneratedTask> {
        let template = self.registry.get(template_id)?;
        self.execute_template(template, rng)
    }

    /// Generate a task from a uniformly chosen template.
    pub fn generate_random(&self) -> Result<GeneratedTask> {
        self.generate_random_with(&mut rand::rng())
    }

    pub fn generate_random_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<GeneratedTask> {
        let template = self
            .registry
            .all()
            .choose(rng)
            .ok_or_else(|| EngineError::insufficient("generate_random", "registry is empty"))?;
        self.execute_template(template, rng)
    }

    /// Generate a task training `competency_id`, retrying with other
    /// matching templates until one succeeds or the attempt budget runs out.
    /// Only retryable errors are retried; anything else is returned at once.
    pub fn generate_for_competency(&self, competency_id: &str) -> Result<GeneratedTask> {
        self.generate_for_competency_with(competency_id, &mut rand::rng())
    }

    pub fn generate_for_competency_with<R: Rng + ?Sized>(
        &self,
        competency_id: &str,
        rng: &mut R,
    ) -> Result<GeneratedTask> {
        let candidates = self.registry.get_by_competency(competency_id);
        if candidates.is_empty() {
            return Err(EngineError::insufficient(
                "generate_for_competency",
                format!("no template trains '{competency_id}'"),
            ));
        }

        let attempts = self.config.max_competency_attempts.max(1);
        let mut last_error = None;
        for attempt in 1..=attempts {
            let Some(template) = candidates.choose(rng) else {
                break;
            };
            match self.execute_template(template, rng) {
                Ok(task) => return Ok(task),
                Err(e) if !e.is_retryable() => {
                    tracing::debug!(attempt, template = %template.id, "generation failed permanently: {e}");
                    return Err(e);
                }
                Err(e) => {
                    tracing::debug!(attempt, template = %template.id, "generation failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        tracing::warn!(
            "giving up on competency '{}' after {} attempts",
            competency_id,
            attempts
        );
        Err(last_error.unwrap_or_else(|| {
            EngineError::insufficient("generate_for_competency", "no attempt was made")
        }))
    }

    /// Run one template end to end.
    pub fn execute_template<R: Rng + ?Sized>(&self, template: &TaskTemplate, rng: &mut R) -> Result<GeneratedTask> {
        tracing::debug!(template = %template.id, "executing template");

        let slots = run_generator(&template.pipeline.generator, &self.ontology, rng)?;

        let ctx = SolveContext {
            ontology: &self.ontology,
            toolkit: self.toolkit.as_ref(),
        };
        // Solvers run in sequence; only the last result is kept.
        let mut output = None;
        for step in &template.pipeline.solvers {
            output = Some(run_solver(step, &slots, &ctx)?);
        }
        let SolverOutput {
            answer,
            explanation_slots,
        } = output.ok_or_else(|| EngineError::InvalidTemplate {
            template_id: template.id.clone(),
            message: "pipeline has no solver steps".into(),
        })?;

        let prompt = self
            .ontology
            .i18n
            .prompts
            .get(&template.prompt_template_id)
            .ok_or_else(|| EngineError::unknown("prompt template", &template.prompt_template_id))?;
        let question = render_prompt(&slots, prompt, &self.ontology);
        let explanation = self.render_explanation(template, &slots, &explanation_slots, &answer);

        let distractors = generate_distractors(
            &answer,
            &slots,
            template.meta.interaction,
            template.meta.distractor_strategy.as_ref(),
            &self.ontology,
            self.config.distractor_count,
            rng,
        );

        Ok(GeneratedTask {
            id: Uuid::new_v4(),
            template_id: template.id.clone(),
            interaction: template.meta.interaction,
            question,
            correct_answer: answer,
            distractors,
            explanation,
            competency_map: template.competency_hint.clone(),
            difficulty: template.difficulty.midpoint(),
            exam_tags: template.exam_tags.clone(),
            slots,
        })
    }

    /// Explanation text, or `""` when the template has none or it is missing.
    fn render_explanation(
        &self,
        template: &TaskTemplate,
        slots: &SlotValues,
        explanation_slots: &SlotValues,
        answer: &Answer,
    ) -> String {
        let Some(id) = &template.explanation_template_id else {
            return String::new();
        };
        let Some(prompt) = self.ontology.i18n.prompts.get(id) else {
            tracing::debug!(template = %template.id, "explanation template '{id}' not found");
            return String::new();
        };

        let mut merged = slots.clone();
        merged.extend(explanation_slots);
        merged.insert("correct_answer", answer.to_string());
        render_prompt(&merged, prompt, &self.ontology)
    }

    /// Shape a task for presentation.
    pub fn to_exercise(&self, task: &GeneratedTask) -> Result<Exercise> {
        self.to_exercise_with(task, &mut rand::rng())
    }

    pub fn to_exercise_with<R: Rng + ?Sized>(&self, task: &GeneratedTask, rng: &mut R) -> Result<Exercise> {
        to_exercise(task, rng)
    }

    /// Check a user's answer with the evaluation spec of the task's template.
    pub fn evaluate(&self, task: &GeneratedTask, user: &Answer) -> Result<EvalOutcome> {
        let template = self.registry.get(&task.template_id)?;
        Ok(evaluate(user, &task.correct_answer, &template.meta.evaluation))
    }
}
