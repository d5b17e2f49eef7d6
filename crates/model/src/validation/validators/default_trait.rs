//! `default` and `addedDefault` rules

use crate::shapes::{Model, Shape};
use crate::traits::{ids, NodeValidator};
use crate::validation::Validator;
use smithy_semantic_common::{Node, ShapeId, ShapeType, ValidationEvent};

pub struct DefaultTraitValidator;

impl Validator for DefaultTraitValidator {
    fn name(&self) -> &str {
        "DefaultTrait"
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        let default_id = ShapeId::prelude("default");

        for shape in model.shapes() {
            if shape.has_trait(ids::ADDED_DEFAULT) && !shape.has_trait(ids::DEFAULT) {
                events.push(
                    self.error(
                        shape,
                        "The `addedDefault` trait can only be applied to shapes with the \
                         `default` trait",
                    )
                    .with_trait(&ShapeId::prelude("addedDefault")),
                );
            }

            let Some(applied) = shape.get_trait(ids::DEFAULT) else {
                continue;
            };
            let value = &applied.value;
            // `null` on a member removes the default of its target
            if value.is_null() && shape.is_member() {
                continue;
            }

            let value_shape = if shape.is_member() {
                model.target_of(shape)
            } else {
                Some(shape)
            };
            let Some(value_shape) = value_shape else {
                continue;
            };

            if let Some(message) = check_default_kind(value_shape.shape_type, value) {
                events.push(
                    self.error(shape, &message)
                        .with_trait(&default_id)
                        .with_source(&applied.source),
                );
                continue;
            }

            let validator = NodeValidator::new(model, self.name(), &shape.id)
                .with_trait(&default_id)
                .with_source(&applied.source)
                .with_context("Error validating default value");
            events.extend(validator.validate(shape, value));

            if shape.is_member() {
                if let Some(target_default) = value_shape.trait_value(ids::DEFAULT) {
                    if !target_default.is_null() && target_default != value {
                        events.push(
                            self.error(
                                shape,
                                &format!(
                                    "Member defines a default value that differs from the default \
                                     value of the target shape, `{}`. Member default: {value}; \
                                     target default: {target_default}",
                                    value_shape.id
                                ),
                            )
                            .with_trait(&default_id)
                            .with_source(&applied.source),
                        );
                    }
                }
            }
        }
        events
    }
}

impl DefaultTraitValidator {
    fn error(&self, shape: &Shape, message: &str) -> ValidationEvent {
        ValidationEvent::error(self.name(), message)
            .with_shape(&shape.id)
            .with_source(&shape.source)
    }
}

/// Collections and documents only allow empty defaults
fn check_default_kind(shape_type: ShapeType, value: &Node) -> Option<String> {
    match (shape_type, value) {
        (ShapeType::List, Node::Array(items)) if !items.is_empty() => {
            Some("The default value of a list must be an empty list".to_string())
        }
        (ShapeType::Map, Node::Object(entries)) if !entries.is_empty() => {
            Some("The default value of a map must be an empty map".to_string())
        }
        (ShapeType::Document, Node::Array(items)) if !items.is_empty() => {
            Some("The default value of a document cannot be a non-empty list".to_string())
        }
        (ShapeType::Document, Node::Object(entries)) if !entries.is_empty() => {
            Some("The default value of a document cannot be a non-empty map".to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Trait;

    fn id(value: &str) -> ShapeId {
        ShapeId::parse(value).unwrap()
    }

    fn model_with_member(target: Shape, member_default: Option<Node>, added: bool) -> Model {
        let mut container = Shape::new(id("ns.foo#Config"), ShapeType::Structure);
        let member_id = container.id.with_member("value");
        container.members.insert("value".to_string(), member_id.clone());
        let mut member = Shape::member(member_id, Some(target.id.clone()));
        if let Some(value) = member_default {
            member.add_trait(Trait::new(ShapeId::prelude("default"), value));
        }
        if added {
            member.add_trait(Trait::new(ShapeId::prelude("addedDefault"), Node::empty_object()));
        }
        Model::new(vec![container, member, target], Default::default())
    }

    #[test]
    fn test_default_must_match_target_type() {
        let target = Shape::new(id("ns.foo#Count"), ShapeType::Integer);
        let model = model_with_member(target, Some(Node::from("zero")), false);
        let events = DefaultTraitValidator.validate(&model);
        assert_eq!(events.len(), 1);
        assert!(events[0].message.starts_with("Error validating default value"));
    }

    #[test]
    fn test_member_default_must_agree_with_target() {
        let mut target = Shape::new(id("ns.foo#Count"), ShapeType::Integer);
        target.add_trait(Trait::new(ShapeId::prelude("default"), Node::from(0i64)));
        let model = model_with_member(target.clone(), Some(Node::from(1i64)), false);
        let events = DefaultTraitValidator.validate(&model);
        assert_eq!(events.len(), 1);
        assert!(events[0].message.contains("differs from the default value of the target shape"));

        let model = model_with_member(target, Some(Node::Null), false);
        assert!(DefaultTraitValidator.validate(&model).is_empty());
    }

    #[test]
    fn test_added_default_requires_default() {
        let target = Shape::new(id("ns.foo#Name"), ShapeType::String);
        let model = model_with_member(target, None, true);
        let events = DefaultTraitValidator.validate(&model);
        assert_eq!(events.len(), 1);
        assert!(events[0].message.contains("`addedDefault`"));
    }

    #[test]
    fn test_list_default_must_be_empty() {
        let target = Shape::new(id("ns.foo#Names"), ShapeType::List);
        let model = model_with_member(target, Some(Node::from(vec![Node::from("a")])), false);
        let events = DefaultTraitValidator.validate(&model);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].message, "The default value of a list must be an empty list");
    }
}
