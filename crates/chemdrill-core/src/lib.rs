//! chemdrill-core — adaptive chemistry exercise engine.
//!
//! Turns declarative task templates plus a read-only domain ontology into
//! randomized, explainable practice questions, and tracks learner mastery
//! per competency with Bayesian Knowledge Tracing.
//!
//! The pipeline is generate → solve → render → distract; answers are then
//! checked by the [`evaluator`] and fed to [`mastery`].

pub mod bundled;
pub mod config;
pub mod distractors;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod exercise;
pub mod formula;
pub mod generators;
pub mod mastery;
pub mod model;
pub mod ontology;
pub mod parser;
pub mod registry;
pub mod resolver;
pub mod slots;
pub mod solvers;
pub mod store;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_support;

pub use engine::{EngineConfig, ExerciseEngine};
pub use error::{EngineError, Result};
pub use exercise::Exercise;
pub use mastery::{bkt_update, get_level, BktParams, BktState, MasteryLevel};
pub use model::{GeneratedTask, Interaction, TaskTemplate};
pub use ontology::Ontology;
pub use registry::TemplateRegistry;
pub use slots::{Answer, SlotValue, SlotValues};
