//! `enum` and `intEnum` member values

use crate::shapes::{Model, Shape};
use crate::traits::ids;
use crate::validation::Validator;
use smithy_semantic_common::{Node, ShapeType, ValidationEvent};
use std::collections::BTreeMap;

pub struct EnumShapeValidator;

impl Validator for EnumShapeValidator {
    fn name(&self) -> &str {
        "EnumShape"
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for shape in model
            .shapes()
            .filter(|s| matches!(s.shape_type, ShapeType::Enum | ShapeType::IntEnum))
        {
            self.validate_enum(model, shape, &mut events);
        }
        events
    }
}

impl EnumShapeValidator {
    fn validate_enum(&self, model: &Model, shape: &Shape, events: &mut Vec<ValidationEvent>) {
        if shape.members.is_empty() {
            let message = format!("{} shapes must have at least one member", shape.shape_type);
            events.push(
                ValidationEvent::error(self.name(), message)
                    .with_shape(&shape.id)
                    .with_source(&shape.source),
            );
            return;
        }

        let is_int = shape.shape_type == ShapeType::IntEnum;
        let mut seen: BTreeMap<String, &str> = BTreeMap::new();

        for member in model.members(shape) {
            let name = member.member_name().unwrap_or_default();
            let error = |message: String| {
                ValidationEvent::error(self.name(), message)
                    .with_shape(&member.id)
                    .with_source(&member.source)
            };

            let key = match member.trait_value(ids::ENUM_VALUE) {
                None if is_int => {
                    events.push(error(format!(
                        "intEnum member `{name}` must have an `enumValue` integer value"
                    )));
                    continue;
                }
                None => name.to_string(),
                Some(Node::String(value)) if !is_int => {
                    if value.is_empty() {
                        events.push(error(format!(
                            "enum member `{name}` must not have an empty string value"
                        )));
                        continue;
                    }
                    value.clone()
                }
                Some(Node::Number(number)) if is_int && number.is_integer() => number.to_string(),
                Some(other) => {
                    let expected = if is_int { "an integer" } else { "a string" };
                    events.push(error(format!(
                        "{} member `{name}` must have {expected} `enumValue`, but found {}",
                        shape.shape_type,
                        other.type_name()
                    )));
                    continue;
                }
            };

            if let Some(previous) = seen.insert(key.clone(), name) {
                events.push(error(format!(
                    "Multiple {} members have the same value `{key}`: `{previous}` and `{name}`",
                    shape.shape_type
                )));
            }

            if !is_recommended_name(name) {
                events.push(
                    ValidationEvent::warning(
                        format!("{}.MemberNameCase", self.name()),
                        format!(
                            "The name `{name}` does not match the recommended enum name format of \
                             beginning with an uppercase letter, followed by any number of \
                             uppercase letters, numbers, or underscores."
                        ),
                    )
                    .with_shape(&member.id)
                    .with_source(&member.source),
                );
            }
        }
    }
}

fn is_recommended_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
