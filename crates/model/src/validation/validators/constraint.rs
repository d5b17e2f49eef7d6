//! Well-formedness of `length`, `range` and `pattern` trait values

use crate::shapes::{Model, Shape, Trait};
use crate::traits::ids;
use crate::validation::Validator;
use regex::Regex;
use smithy_semantic_common::{Node, ValidationEvent};

/// `min` of `length` must not exceed `max`, and neither may be negative
pub struct LengthTraitValidator;

impl Validator for LengthTraitValidator {
    fn name(&self) -> &str {
        "LengthTrait"
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for shape in model.shapes_with_trait(ids::LENGTH) {
            let Some(applied) = shape.get_trait(ids::LENGTH) else {
                continue;
            };
            let (min, max) = bounds(&applied.value);
            for (key, value) in [("min", min), ("max", max)] {
                if value.is_some_and(|v| v < 0.0) {
                    let message = format!("A length trait `{key}` cannot be negative");
                    events.push(error(self.name(), shape, applied, message));
                }
            }
            if let (Some(min), Some(max)) = (min, max) {
                if min > max {
                    events.push(error(
                        self.name(),
                        shape,
                        applied,
                        format!(
                            "A length trait is applied with a `min` value, `{min}`, that is \
                             greater than its `max` value, `{max}`"
                        ),
                    ));
                }
            }
        }
        events
    }
}

/// `min` of `range` must not exceed `max`
pub struct RangeTraitValidator;

impl Validator for RangeTraitValidator {
    fn name(&self) -> &str {
        "RangeTrait"
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        model
            .shapes_with_trait(ids::RANGE)
            .filter_map(|shape| {
                let applied = shape.get_trait(ids::RANGE)?;
                match bounds(&applied.value) {
                    (Some(min), Some(max)) if min > max => Some(error(
                        self.name(),
                        shape,
                        applied,
                        format!(
                            "A range trait is applied with a `min` value, `{min}`, that is \
                             greater than its `max` value, `{max}`"
                        ),
                    )),
                    _ => None,
                }
            })
            .collect()
    }
}

/// `pattern` values must compile as regular expressions
pub struct PatternTraitValidator;

impl Validator for PatternTraitValidator {
    fn name(&self) -> &str {
        "PatternTrait"
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for shape in model.shapes_with_trait(ids::PATTERN) {
            let Some(applied) = shape.get_trait(ids::PATTERN) else {
                continue;
            };
            let Some(pattern) = applied.value.as_str() else {
                continue;
            };
            if let Err(err) = Regex::new(pattern) {
                events.push(error(
                    self.name(),
                    shape,
                    applied,
                    format!("Invalid regular expression `{pattern}` in the pattern trait: {err}"),
                ));
            }
        }
        events
    }
}

fn bounds(value: &Node) -> (Option<f64>, Option<f64>) {
    let get = |key: &str| value.get(key).and_then(Node::as_number).map(|n| n.as_f64());
    (get("min"), get("max"))
}

fn error(id: &str, shape: &Shape, applied: &Trait, message: String) -> ValidationEvent {
    ValidationEvent::error(id, message)
        .with_shape(&shape.id)
        .with_trait(&applied.id)
        .with_source(&applied.source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use smithy_semantic_common::{ShapeId, ShapeType};

    fn model(trait_name: &str, value: Node) -> Model {
        let mut shape = Shape::new(ShapeId::parse("ns.foo#Value").unwrap(), ShapeType::String);
        shape.add_trait(Trait::new(ShapeId::prelude(trait_name), value));
        Model::new(vec![shape], Default::default())
    }

    #[test]
    fn test_length_min_greater_than_max() {
        let bounds = Node::object([("min", Node::from(5i64)), ("max", Node::from(2i64))]);
        let model = model("length", bounds);
        let events = LengthTraitValidator.validate(&model);
        assert_eq!(events.len(), 1);
        assert!(events[0]
            .message
            .contains("`min` value, `5`, that is greater than its `max` value, `2`"));
    }

    #[test]
    fn test_negative_length() {
        let model = model("length", Node::object([("min", Node::from(-1i64))]));
        assert_eq!(LengthTraitValidator.validate(&model).len(), 1);
    }

    #[test]
    fn test_range_bounds() {
        let valid = model(
            "range",
            Node::object([("min", Node::from(1i64)), ("max", Node::from(1.5f64))]),
        );
        assert!(RangeTraitValidator.validate(&valid).is_empty());
        let invalid = model(
            "range",
            Node::object([("min", Node::from(10i64)), ("max", Node::from(1i64))]),
        );
        assert_eq!(RangeTraitValidator.validate(&invalid).len(), 1);
    }

    #[test]
    fn test_pattern_must_compile() {
        let valid = model("pattern", Node::from("^[a-z]+$"));
        assert!(PatternTraitValidator.validate(&valid).is_empty());
        let events = PatternTraitValidator.validate(&model("pattern", Node::from("([a-z]")));
        assert_eq!(events.len(), 1);
        assert!(events[0].message.starts_with("Invalid regular expression `([a-z]`"));
    }
}
