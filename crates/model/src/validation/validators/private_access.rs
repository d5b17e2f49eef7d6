//! References to `private` shapes from other namespaces

use crate::knowledge::RelationshipType;
use crate::shapes::Model;
use crate::traits::ids;
use crate::validation::Validator;
use smithy_semantic_common::ValidationEvent;

pub struct PrivateAccessValidator;

impl Validator for PrivateAccessValidator {
    fn name(&self) -> &str {
        "PrivateAccess"
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let neighbors = model.neighbor_index();
        let mut events = Vec::new();

        for private in model.shapes_with_trait(ids::PRIVATE) {
            let namespace = private.id.namespace();
            for rel in neighbors.reverse_neighbors(&private.id) {
                if rel.kind == RelationshipType::Bound || rel.shape.namespace() == namespace {
                    continue;
                }
                let Some(referrer) = model.get_shape(&rel.shape) else {
                    continue;
                };
                let message = if rel.kind == RelationshipType::Trait {
                    format!(
                        "This shape applies a trait that is private to the `{namespace}` \
                         namespace: `{}`",
                        private.id
                    )
                } else {
                    format!(
                        "This shape has an invalid {} relationship that targets a private shape, \
                         `{}`, in another namespace.",
                        rel.kind.selector_label().unwrap_or("member target"),
                        private.id
                    )
                };
                events.push(
                    ValidationEvent::error(self.name(), message)
                        .with_shape(&referrer.id)
                        .with_source(&referrer.source),
                );
            }
        }
        events
    }
}
