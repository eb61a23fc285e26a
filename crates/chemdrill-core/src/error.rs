//! Engine error types.
//!
//! Every pipeline stage reports failures through [`EngineError`] so callers
//! can decide whether a different template or competency is worth a retry
//! without string matching.

use thiserror::Error;

/// Errors produced by the generation pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A generator, solver, template, property, ion or substance id is unknown.
    #[error("unknown {kind}: {id}")]
    UnknownIdentifier { kind: &'static str, id: String },

    /// The filtered candidate pool cannot satisfy the requested cardinality.
    #[error("insufficient data in {stage}: {reason}")]
    InsufficientData { stage: String, reason: String },

    /// A stage expects a slot the generator never produced.
    #[error("{stage} requires slot '{slot}'")]
    MissingSlotData { stage: String, slot: String },

    /// A template is structurally invalid.
    #[error("invalid template {template_id}: {message}")]
    InvalidTemplate {
        template_id: String,
        message: String,
    },
}

impl EngineError {
    pub(crate) fn unknown(kind: &'static str, id: impl Into<String>) -> Self {
        EngineError::UnknownIdentifier {
            kind,
            id: id.into(),
        }
    }

    pub(crate) fn insufficient(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::InsufficientData {
            stage: stage.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing_slot(stage: impl Into<String>, slot: impl Into<String>) -> Self {
        EngineError::MissingSlotData {
            stage: stage.into(),
            slot: slot.into(),
        }
    }

    /// Returns `true` if another random draw (or another template) may succeed.
    ///
    /// Only an undersized candidate pool is transient; unknown ids and missing
    /// slots are authoring bugs that repeat on every attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::InsufficientData { .. })
    }
}

/// Convenience alias used throughout the pipeline.
pub type Result<T> = std::result::Result<T, EngineError>;
