//! Constraint validation
//!
//! Validators are independent, pure checks over a resolved [`Model`]. Each
//! returns a list of [`ValidationEvent`]s; none of them mutates the model or
//! depends on the output of another. The runner executes them (optionally in
//! parallel), and suppressions are applied to the collected events afterwards.

mod definition;
mod runner;
mod suppression;
pub mod validators;

pub(crate) use definition::DEFINITION_EVENT;
pub use definition::{EmitEachSelector, ValidatorConfiguration, ValidatorDefinition};
pub use runner::ValidatorRunner;
pub use suppression::{apply_suppressions, Suppression};

use crate::shapes::Model;
use smithy_semantic_common::{Severity, ValidationEvent};

/// A check over a resolved model
#[cfg_attr(test, mockall::automock)]
pub trait Validator: Send + Sync {
    /// Event id prefix of the events this validator emits
    fn name(&self) -> &str;

    fn validate(&self, model: &Model) -> Vec<ValidationEvent>;
}

/// A model that passed validation, with every event of the run
///
/// Events are ordered by validator, then by emission order within each
/// validator. Suppressed events keep their place with severity
/// [`Severity::Suppressed`].
#[derive(Debug)]
pub struct ValidatedModel {
    model: Model,
    events: Vec<ValidationEvent>,
}

impl ValidatedModel {
    pub(crate) fn new(model: Model, events: Vec<ValidationEvent>) -> Self {
        Self { model, events }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn into_model(self) -> Model {
        self.model
    }

    pub fn events(&self) -> &[ValidationEvent] {
        &self.events
    }

    /// Events at or above a severity
    pub fn events_at_least(&self, severity: Severity) -> impl Iterator<Item = &ValidationEvent> {
        self.events.iter().filter(move |e| e.severity >= severity)
    }

    /// Events whose id is `id` or a child of it
    pub fn events_with_id<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a ValidationEvent> {
        self.events.iter().filter(move |e| e.matches_id(id))
    }
}
