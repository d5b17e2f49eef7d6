//! Applied trait values must conform to the trait's shape

use crate::shapes::Model;
use crate::traits::NodeValidator;
use crate::validation::Validator;
use smithy_semantic_common::ValidationEvent;

pub struct TraitValueValidator;

impl Validator for TraitValueValidator {
    fn name(&self) -> &str {
        "TraitValue"
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let registry = model.trait_registry();
        let mut events = Vec::new();

        for shape in model.shapes() {
            for applied in shape.traits.values() {
                if !registry.contains(&applied.id.to_string()) {
                    continue;
                }
                let Some(definition) = model.get_shape(&applied.id) else {
                    continue;
                };
                let validator = NodeValidator::new(model, self.name(), &shape.id)
                    .with_trait(&applied.id)
                    .with_source(&applied.source)
                    .with_context(format!("Error validating trait `{}`", applied.id));
                events.extend(validator.validate(definition, &applied.value));
            }
        }
        events
    }
}
