//! Traits may only be applied to shapes matched by their selector

use crate::shapes::Model;
use crate::validation::Validator;
use smithy_semantic_common::ValidationEvent;

pub struct TraitTargetValidator;

impl Validator for TraitTargetValidator {
    fn name(&self) -> &str {
        "TraitTarget"
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let registry = model.trait_registry();
        let mut events = Vec::new();

        for (trait_id, err) in registry.invalid_selectors() {
            let source = model
                .get_shape(trait_id)
                .map(|s| s.source.clone())
                .unwrap_or_default();
            events.push(
                ValidationEvent::error(
                    self.name(),
                    format!("Invalid selector in the definition of trait `{trait_id}`: {err}"),
                )
                .with_shape(trait_id)
                .with_source(&source),
            );
        }

        for descriptor in registry.descriptors() {
            if descriptor.selector.expression() == "*" {
                continue;
            }
            let trait_name = descriptor.id.to_string();
            let applied: Vec<_> = model.shapes_with_trait(&trait_name).collect();
            if applied.is_empty() {
                continue;
            }

            let matched = descriptor.selector.select_ids(model);
            for shape in applied {
                if matched.contains(&shape.id) {
                    continue;
                }
                let source = shape
                    .get_trait(&trait_name)
                    .map(|t| t.source.clone())
                    .unwrap_or_default();
                events.push(
                    ValidationEvent::error(
                        self.name(),
                        format!(
                            "Trait `{}` cannot be applied to `{}`. This trait may only be applied \
                             to shapes that match the following selector: {}",
                            descriptor.id, shape.id, descriptor.selector
                        ),
                    )
                    .with_shape(&shape.id)
                    .with_trait(&descriptor.id)
                    .with_source(&source),
                );
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Shape, Trait};
    use smithy_semantic_common::{Node, ShapeId, ShapeType};

    fn id(value: &str) -> ShapeId {
        ShapeId::parse(value).unwrap()
    }

    fn definition(name: &str, selector: &str) -> Shape {
        let mut shape = Shape::new(id(name), ShapeType::Structure);
        shape.add_trait(Trait::new(
            ShapeId::prelude("trait"),
            Node::object([("selector", Node::from(selector))]),
        ));
        shape
    }

    #[test]
    fn test_selector_mismatch() {
        let mut text = Shape::new(id("ns.foo#Text"), ShapeType::String);
        text.add_trait(Trait::new(id("ns.foo#onlyStructures"), Node::empty_object()));
        let mut record = Shape::new(id("ns.foo#Record"), ShapeType::Structure);
        record.add_trait(Trait::new(id("ns.foo#onlyStructures"), Node::empty_object()));
        let model = Model::new(
            vec![definition("ns.foo#onlyStructures", "structure"), text, record],
            Default::default(),
        );

        let events = TraitTargetValidator.validate(&model);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].shape_id, Some(id("ns.foo#Text")));
        assert!(events[0].message.contains("match the following selector: structure"));
    }

    #[test]
    fn test_invalid_selector_is_reported() {
        let model = Model::new(
            vec![definition("ns.foo#broken", "structure >")],
            Default::default(),
        );
        let events = TraitTargetValidator.validate(&model);
        assert_eq!(events.len(), 1);
        assert!(events[0]
            .message
            .starts_with("Invalid selector in the definition of trait `ns.foo#broken`"));
    }
}
