//! Sequential or rayon-parallel execution of validators

use super::Validator;
use crate::shapes::Model;
use rayon::prelude::*;
use smithy_semantic_common::ValidationEvent;
use std::time::Instant;

/// Runs a set of validators over a model
///
/// Output is ordered by validator registration order whether or not the
/// validators run in parallel.
pub struct ValidatorRunner {
    validators: Vec<Box<dyn Validator>>,
    parallel: bool,
}

impl ValidatorRunner {
    pub fn new(validators: Vec<Box<dyn Validator>>) -> Self {
        Self {
            validators,
            parallel: true,
        }
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    pub fn run(&self, model: &Model) -> Vec<ValidationEvent> {
        let started = Instant::now();
        let batches: Vec<Vec<ValidationEvent>> = if self.parallel {
            self.validators
                .par_iter()
                .map(|v| run_one(v.as_ref(), model))
                .collect()
        } else {
            self.validators
                .iter()
                .map(|v| run_one(v.as_ref(), model))
                .collect()
        };
        let events: Vec<ValidationEvent> = batches.into_iter().flatten().collect();

        tracing::info!(
            validators = self.validators.len(),
            events = events.len(),
            parallel = self.parallel,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Validation complete"
        );
        events
    }
}

fn run_one(validator: &dyn Validator, model: &Model) -> Vec<ValidationEvent> {
    let started = Instant::now();
    let events = validator.validate(model);
    tracing::debug!(
        validator = validator.name(),
        events = events.len(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "Ran validator"
    );
    events
}
