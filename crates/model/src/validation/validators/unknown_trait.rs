//! Applied traits must have a definition

use crate::shapes::Model;
use crate::validation::Validator;
use smithy_semantic_common::{Severity, ValidationEvent};

/// Reports traits with no definition in the model
///
/// Unknown traits are kept on the shape as opaque values either way; the
/// severity only decides whether they fail the load.
pub struct UnknownTraitValidator {
    allow_unknown: bool,
}

impl UnknownTraitValidator {
    pub fn new(allow_unknown: bool) -> Self {
        Self { allow_unknown }
    }
}

impl Validator for UnknownTraitValidator {
    fn name(&self) -> &str {
        "UnknownTrait"
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let registry = model.trait_registry();
        let severity = if self.allow_unknown {
            Severity::Warning
        } else {
            Severity::Error
        };

        model
            .shapes()
            .flat_map(|shape| shape.traits.values().map(move |t| (shape, t)))
            .filter(|(_, applied)| !registry.contains(&applied.id.to_string()))
            .map(|(shape, applied)| {
                ValidationEvent::new(
                    self.name(),
                    severity,
                    format!(
                        "Unable to resolve trait `{}`. If this is a custom trait, then it must be \
                         defined before it can be used in a model.",
                        applied.id
                    ),
                )
                .with_shape(&shape.id)
                .with_trait(&applied.id)
                .with_source(&applied.source)
            })
            .collect()
    }
}
