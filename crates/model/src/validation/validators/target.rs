//! Every relationship must resolve to a shape of a compatible type

use crate::knowledge::RelationshipType;
use crate::shapes::{Model, Shape};
use crate::traits::{ids, is_trait_definition};
use crate::validation::Validator;
use smithy_semantic_common::{ShapeId, ShapeType, ValidationEvent};
use std::collections::BTreeSet;

const MAX_SUGGESTION_DISTANCE: usize = 2;

pub struct TargetValidator;

impl Validator for TargetValidator {
    fn name(&self) -> &str {
        "Target"
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let neighbors = model.neighbor_index();
        let mut events = Vec::new();

        for shape in model.shapes() {
            // Lifecycle operations have two edges to the same shape
            let mut reported = BTreeSet::new();
            for rel in neighbors.neighbors(&shape.id) {
                // Trait edges are checked by the unknown trait pass
                if matches!(rel.kind, RelationshipType::Trait | RelationshipType::Bound)
                    || reported.contains(&rel.neighbor)
                {
                    continue;
                }
                let event = match model.get_shape(&rel.neighbor) {
                    None => Some(unresolved(model, shape, rel.kind, &rel.neighbor)),
                    Some(target) => check_target(model, shape, rel.kind, target),
                };
                if let Some(event) = event {
                    reported.insert(rel.neighbor.clone());
                    events.push(event.with_source(&shape.source));
                }
            }
        }
        events
    }
}

fn check_target(
    model: &Model,
    shape: &Shape,
    kind: RelationshipType,
    target: &Shape,
) -> Option<ValidationEvent> {
    if kind.is_directed() && is_trait_definition(target) {
        return Some(error(
            shape,
            format!(
                "Found a {} reference to trait definition `{}`. Trait definitions cannot be \
                 targeted by members or referenced by shapes in any other context other than \
                 applying them as traits.",
                label(kind),
                target.id
            ),
        ));
    }

    match kind {
        RelationshipType::MemberTarget => {
            if matches!(
                target.shape_type,
                ShapeType::Service | ShapeType::Resource | ShapeType::Operation | ShapeType::Member
            ) {
                return Some(error(
                    shape,
                    format!(
                        "Members cannot target {} shapes, but found {} shape `{}`",
                        target.shape_type, target.shape_type, target.id
                    ),
                ));
            }
            let container = shape.container().and_then(|c| model.get_shape(&c))?;
            if container.shape_type == ShapeType::Map
                && shape.member_name() == Some("key")
                && !target.shape_type.is_string()
            {
                return Some(error(
                    shape,
                    format!(
                        "Map key member targets {} shape `{}`, but is expected to target a string",
                        target.shape_type, target.id
                    ),
                ));
            }
            if matches!(container.shape_type, ShapeType::Enum | ShapeType::IntEnum)
                && target.id != ShapeId::prelude("Unit")
            {
                return Some(error(
                    shape,
                    format!("{} members must target `smithy.api#Unit`", container.shape_type),
                ));
            }
            None
        }
        RelationshipType::Resource => expect_type(shape, kind, target, ShapeType::Resource),
        RelationshipType::Operation
        | RelationshipType::CollectionOperation
        | RelationshipType::InstanceOperation => {
            expect_type(shape, kind, target, ShapeType::Operation)
        }
        RelationshipType::Input | RelationshipType::Output => {
            if let Some(event) = expect_type(shape, kind, target, ShapeType::Structure) {
                return Some(event);
            }
            target.has_trait(ids::ERROR).then(|| {
                error(
                    shape,
                    format!(
                        "Operation {} targets an invalid structure `{}` that is marked with the \
                         `error` trait.",
                        label(kind),
                        target.id
                    ),
                )
            })
        }
        RelationshipType::Error => {
            if let Some(event) = expect_type(shape, kind, target, ShapeType::Structure) {
                return Some(event);
            }
            (!target.has_trait(ids::ERROR)).then(|| {
                error(
                    shape,
                    format!(
                        "`{}` cannot be bound as an error because it is not marked with the \
                         `error` trait.",
                        target.id
                    ),
                )
            })
        }
        RelationshipType::Identifier => expect_type(shape, kind, target, ShapeType::String),
        RelationshipType::Create
        | RelationshipType::Read
        | RelationshipType::Update
        | RelationshipType::Delete
        | RelationshipType::List
        | RelationshipType::Put => (target.shape_type != ShapeType::Operation).then(|| {
            error(
                shape,
                format!(
                    "Resource {} lifecycle operation must target an operation, but found {} shape \
                     `{}`",
                    label(kind),
                    target.shape_type,
                    target.id
                ),
            )
        }),
        _ => None,
    }
}

fn expect_type(
    shape: &Shape,
    kind: RelationshipType,
    target: &Shape,
    expected: ShapeType,
) -> Option<ValidationEvent> {
    let matches = target.shape_type == expected
        || (expected == ShapeType::String && target.shape_type == ShapeType::Enum);
    (!matches).then(|| {
        error(
            shape,
            format!(
                "{} shape `{}` relationships must target a {} shape, but found {} shape `{}`",
                shape.shape_type,
                label(kind),
                expected,
                target.shape_type,
                target.id
            ),
        )
    })
}

fn unresolved(
    model: &Model,
    shape: &Shape,
    kind: RelationshipType,
    target: &ShapeId,
) -> ValidationEvent {
    let suggestions = suggestions(model, target);
    let hint = if suggestions.is_empty() {
        String::new()
    } else {
        format!(". Did you mean {}?", suggestions.into_iter().collect::<Vec<_>>().join(", "))
    };

    if kind == RelationshipType::MemberTarget {
        return error(shape, format!("member shape targets an unresolved shape `{target}`{hint}"));
    }
    let name = label(kind);
    let article = if name.starts_with(['a', 'e', 'i', 'o', 'u']) {
        "an"
    } else {
        "a"
    };
    error(
        shape,
        format!(
            "{} shape has {article} `{name}` relationship to an unresolved shape `{target}`{hint}",
            shape.shape_type
        ),
    )
}

/// Shape IDs within a small edit distance of a missing target
fn suggestions(model: &Model, target: &ShapeId) -> BTreeSet<String> {
    let wanted = target.to_string();
    let mut best = usize::MAX;
    let mut candidates = BTreeSet::new();

    for id in model.shape_ids() {
        let candidate = id.to_string();
        let Some(distance) = edit_distance(&wanted, &candidate, MAX_SUGGESTION_DISTANCE) else {
            continue;
        };
        if distance < best {
            best = distance;
            candidates.clear();
        }
        if distance == best {
            candidates.insert(candidate);
        }
    }
    candidates
}

/// Levenshtein distance, or `None` once it exceeds `limit`
fn edit_distance(a: &str, b: &str, limit: usize) -> Option<usize> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len().abs_diff(b.len()) > limit {
        return None;
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut current = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        if current.iter().min().is_some_and(|m| *m > limit) {
            return None;
        }
        previous = current;
    }
    previous.last().copied().filter(|d| *d <= limit)
}

fn label(kind: RelationshipType) -> &'static str {
    kind.selector_label().unwrap_or("member target")
}

fn error(shape: &Shape, message: String) -> ValidationEvent {
    ValidationEvent::error("Target", message).with_shape(&shape.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Trait;
    use smithy_semantic_common::{Node, OperationProperties, ShapeProperties};

    fn id(value: &str) -> ShapeId {
        ShapeId::parse(value).unwrap()
    }

    fn structure(name: &str, members: &[(&str, &str)]) -> Vec<Shape> {
        let mut shape = Shape::new(id(name), ShapeType::Structure);
        let mut shapes = Vec::new();
        for (member, target) in members {
            let member_id = shape.id.with_member(member);
            shape.members.insert(member.to_string(), member_id.clone());
            shapes.push(Shape::member(member_id, Some(id(target))));
        }
        shapes.push(shape);
        shapes
    }

    #[test]
    fn test_unresolved_member_target_with_suggestion() {
        let mut shapes = structure("ns.foo#Person", &[("name", "ns.foo#Nam")]);
        shapes.push(Shape::new(id("ns.foo#Name"), ShapeType::String));
        let model = Model::new(shapes, Default::default());

        let events = TargetValidator.validate(&model);
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].message,
            "member shape targets an unresolved shape `ns.foo#Nam`. Did you mean ns.foo#Name?"
        );
        assert_eq!(events[0].shape_id, Some(id("ns.foo#Person$name")));
    }

    #[test]
    fn test_member_cannot_target_operation() {
        let mut shapes = structure("ns.foo#Person", &[("op", "ns.foo#Op")]);
        shapes.push(Shape::new(id("ns.foo#Op"), ShapeType::Operation));
        let model = Model::new(shapes, Default::default());
        let events = TargetValidator.validate(&model);
        assert_eq!(events.len(), 1);
        assert!(events[0].message.starts_with("Members cannot target operation shapes"));
    }

    #[test]
    fn test_operation_errors_need_error_trait() {
        let mut op = Shape::new(id("ns.foo#Op"), ShapeType::Operation);
        op.properties = ShapeProperties::Operation(OperationProperties {
            input: Some(id("ns.foo#Failure")),
            output: None,
            errors: vec![id("ns.foo#NotAnError")],
        });
        let mut failure = Shape::new(id("ns.foo#Failure"), ShapeType::Structure);
        failure.add_trait(Trait::new(id(ids::ERROR), Node::from("client")));
        let not_error = Shape::new(id("ns.foo#NotAnError"), ShapeType::Structure);
        let model = Model::new(vec![op, failure, not_error], Default::default());

        let messages: Vec<String> = TargetValidator
            .validate(&model)
            .into_iter()
            .map(|e| e.message)
            .collect();
        assert_eq!(messages.len(), 2);
        assert!(messages
            .iter()
            .any(|m| m.contains("Operation input targets an invalid structure")));
        assert!(messages
            .iter()
            .any(|m| m.contains("`ns.foo#NotAnError` cannot be bound as an error")));
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("kitten", "sitting", 3), Some(3));
        assert_eq!(edit_distance("kitten", "sitting", 2), None);
        assert_eq!(edit_distance("same", "same", 0), Some(0));
    }
}
