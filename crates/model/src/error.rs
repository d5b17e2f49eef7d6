//! Errors raised while building a model

use crate::selector::SelectorSyntaxError;
use smithy_semantic_common::{SemanticError, Severity, ValidationEvent};
use thiserror::Error;

/// Errors returned by the assembler and configuration loading
#[derive(Error, Debug)]
pub enum ModelError {
    /// The model could not be built; carries every event of the failed run
    #[error(
        "Model is invalid: {} error(s)\n{}",
        .events.iter().filter(|e| e.severity == Severity::Error).count(),
        render_errors(.events)
    )]
    Invalid { events: Vec<ValidationEvent> },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Selector(#[from] SelectorSyntaxError),

    #[error(transparent)]
    Semantic(#[from] SemanticError),
}

impl ModelError {
    /// Events of a failed run, empty for other errors
    pub fn events(&self) -> &[ValidationEvent] {
        match self {
            ModelError::Invalid { events } => events,
            _ => &[],
        }
    }
}

fn render_errors(events: &[ValidationEvent]) -> String {
    events
        .iter()
        .filter(|e| e.severity == Severity::Error)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_lists_errors_only() {
        let err = ModelError::Invalid {
            events: vec![
                ValidationEvent::error("Target", "missing target"),
                ValidationEvent::warning("Other", "just a warning"),
            ],
        };
        let message = err.to_string();
        assert!(message.starts_with("Model is invalid: 1 error(s)"));
        assert!(message.contains("missing target"));
        assert!(!message.contains("just a warning"));
        assert_eq!(err.events().len(), 2);
    }
}
