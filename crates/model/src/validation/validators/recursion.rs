//! Legality of recursive shape definitions
//!
//! Recursion is allowed as long as a value can be finite: a list or map
//! cycle must pass through a structure or union, a structure cycle must
//! include at least one optional member, and a union needs at least one
//! member that does not lead back to it.

use crate::shapes::{Model, Shape};
use crate::traits::ids;
use crate::validation::Validator;
use smithy_semantic_common::{ShapeId, ShapeType, ValidationEvent};
use std::collections::BTreeSet;

pub struct ShapeRecursionValidator;

impl Validator for ShapeRecursionValidator {
    fn name(&self) -> &str {
        "ShapeRecursion"
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let mut events = Vec::new();

        for shape in model.shapes() {
            match shape.shape_type {
                ShapeType::List | ShapeType::Map => {
                    if let Some(path) = find_cycle(model, shape, collection_edges) {
                        events.push(self.error(
                            shape,
                            format!(
                                "Found invalid shape recursion: {}. A recursive list or map shape \
                                 is only valid if an intermediate reference is through a union or \
                                 structure.",
                                render(&path)
                            ),
                        ));
                    }
                }
                ShapeType::Structure => {
                    if let Some(path) = find_cycle(model, shape, required_edges) {
                        events.push(self.error(
                            shape,
                            format!(
                                "Found invalid shape recursion: {}. A structure cannot be mutually \
                                 recursive through all required members.",
                                render(&path)
                            ),
                        ));
                    }
                }
                ShapeType::Union => {
                    if !shape.members.is_empty()
                        && model.members(shape).all(|m| is_recursive_member(model, shape, m))
                    {
                        events.push(self.error(
                            shape,
                            format!(
                                "Union shape `{}` has no non-recursive members. At least one \
                                 member must not refer back to the union so that a finite value \
                                 can be created.",
                                shape.id
                            ),
                        ));
                    }
                }
                _ => {}
            }
        }
        events
    }
}

impl ShapeRecursionValidator {
    fn error(&self, shape: &Shape, message: String) -> ValidationEvent {
        ValidationEvent::error(self.name(), message)
            .with_shape(&shape.id)
            .with_source(&shape.source)
    }
}

/// `(member, target)` pairs followed when looking for a cycle
type Edges<'m> = Vec<(&'m Shape, &'m Shape)>;

/// Collection members that target other collections
fn collection_edges<'m>(model: &'m Model, shape: &'m Shape) -> Edges<'m> {
    if !matches!(shape.shape_type, ShapeType::List | ShapeType::Map) {
        return Vec::new();
    }
    model
        .members(shape)
        .filter(|m| m.member_name() != Some("key"))
        .filter_map(|m| model.target_of(m).map(|t| (m, t)))
        .filter(|(_, t)| matches!(t.shape_type, ShapeType::List | ShapeType::Map))
        .collect()
}

/// Required members without a default that target structures
fn required_edges<'m>(model: &'m Model, shape: &'m Shape) -> Edges<'m> {
    if shape.shape_type != ShapeType::Structure {
        return Vec::new();
    }
    model
        .members(shape)
        .filter(|m| m.has_trait(ids::REQUIRED) && !m.has_trait(ids::DEFAULT))
        .filter_map(|m| model.target_of(m).map(|t| (m, t)))
        .filter(|(_, t)| t.shape_type == ShapeType::Structure)
        .collect()
}

/// Path of member IDs and shape IDs from `start` back to itself
fn find_cycle<'m>(
    model: &'m Model,
    start: &'m Shape,
    edges: fn(&'m Model, &'m Shape) -> Edges<'m>,
) -> Option<Vec<ShapeId>> {
    let mut visited = BTreeSet::new();
    let mut stack: Vec<(&'m Shape, Vec<ShapeId>)> = vec![(start, vec![start.id.clone()])];

    while let Some((shape, path)) = stack.pop() {
        for (member, target) in edges(model, shape) {
            let mut next = path.clone();
            next.push(member.id.clone());
            next.push(target.id.clone());
            if target.id == start.id {
                return Some(next);
            }
            if visited.insert(target.id.clone()) {
                stack.push((target, next));
            }
        }
    }
    None
}

/// Whether every value of `member` must contain `union` again
fn is_recursive_member(model: &Model, union: &Shape, member: &Shape) -> bool {
    model
        .target_of(member)
        .is_some_and(|target| must_contain(model, target, union, &mut BTreeSet::new()))
}

/// Whether every finite value of `shape` contains a value of `union`
///
/// Structures contain it when a required member without a default does,
/// unions when every member does. Shapes already on the walk are assumed
/// to contain it, since a finite value has to leave the cycle somewhere.
fn must_contain<'m>(
    model: &'m Model,
    shape: &'m Shape,
    union: &Shape,
    walking: &mut BTreeSet<&'m ShapeId>,
) -> bool {
    if shape.id == union.id || walking.contains(&shape.id) {
        return true;
    }
    let targets: Vec<&Shape> = match shape.shape_type {
        ShapeType::Structure => model
            .members(shape)
            .filter(|m| m.has_trait(ids::REQUIRED) && !m.has_trait(ids::DEFAULT))
            .filter_map(|m| model.target_of(m))
            .collect(),
        ShapeType::Union if !shape.members.is_empty() => {
            model.members(shape).filter_map(|m| model.target_of(m)).collect()
        }
        _ => return false,
    };

    walking.insert(&shape.id);
    let contains = if shape.shape_type == ShapeType::Union {
        targets.len() == shape.members.len()
            && targets.iter().all(|&t| must_contain(model, t, union, walking))
    } else {
        targets.iter().any(|&t| must_contain(model, t, union, walking))
    };
    walking.remove(&shape.id);
    contains
}

fn render(path: &[ShapeId]) -> String {
    path.iter().map(ToString::to_string).collect::<Vec<_>>().join(" > ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Trait;
    use smithy_semantic_common::Node;

    fn id(value: &str) -> ShapeId {
        ShapeId::parse(value).unwrap()
    }

    fn aggregate(name: &str, shape_type: ShapeType, members: &[(&str, &str, bool)]) -> Vec<Shape> {
        let mut shape = Shape::new(id(name), shape_type);
        let mut shapes = Vec::new();
        for (member, target, required) in members {
            let member_id = shape.id.with_member(member);
            shape.members.insert(member.to_string(), member_id.clone());
            let mut member = Shape::member(member_id, Some(id(target)));
            if *required {
                member.add_trait(Trait::new(ShapeId::prelude("required"), Node::empty_object()));
            }
            shapes.push(member);
        }
        shapes.push(shape);
        shapes
    }

    #[test]
    fn test_self_referencing_list_is_rejected() {
        let model = Model::new(
            aggregate("ns.foo#L", ShapeType::List, &[("member", "ns.foo#L", false)]),
            Default::default(),
        );
        let events = ShapeRecursionValidator.validate(&model);
        assert_eq!(events.len(), 1);
        assert!(events[0]
            .message
            .starts_with("Found invalid shape recursion: ns.foo#L > ns.foo#L$member > ns.foo#L."));
    }

    #[test]
    fn test_list_recursion_through_structure_is_allowed() {
        let mut shapes =
            aggregate("ns.foo#Nodes", ShapeType::List, &[("member", "ns.foo#Tree", false)]);
        shapes.extend(aggregate(
            "ns.foo#Tree",
            ShapeType::Structure,
            &[("children", "ns.foo#Nodes", true)],
        ));
        let model = Model::new(shapes, Default::default());
        assert!(ShapeRecursionValidator.validate(&model).is_empty());
    }

    #[test]
    fn test_required_structure_cycle() {
        let mut shapes = aggregate("ns.foo#A", ShapeType::Structure, &[("b", "ns.foo#B", true)]);
        shapes.extend(aggregate("ns.foo#B", ShapeType::Structure, &[("a", "ns.foo#A", true)]));
        let model = Model::new(shapes.clone(), Default::default());
        assert_eq!(ShapeRecursionValidator.validate(&model).len(), 2);

        shapes = aggregate("ns.foo#A", ShapeType::Structure, &[("b", "ns.foo#B", true)]);
        shapes.extend(aggregate("ns.foo#B", ShapeType::Structure, &[("a", "ns.foo#A", false)]));
        let model = Model::new(shapes, Default::default());
        assert!(ShapeRecursionValidator.validate(&model).is_empty());
    }

    #[test]
    fn test_union_needs_an_escape() {
        let mut shapes =
            aggregate("ns.foo#Expr", ShapeType::Union, &[("not", "ns.foo#Expr", false)]);
        let model = Model::new(shapes.clone(), Default::default());
        assert_eq!(ShapeRecursionValidator.validate(&model).len(), 1);

        shapes = aggregate(
            "ns.foo#Expr",
            ShapeType::Union,
            &[("not", "ns.foo#Expr", false), ("value", "ns.foo#Text", false)],
        );
        shapes.push(Shape::new(id("ns.foo#Text"), ShapeType::String));
        let model = Model::new(shapes, Default::default());
        assert!(ShapeRecursionValidator.validate(&model).is_empty());
    }

    #[test]
    fn test_mutually_recursive_unions() {
        let mut shapes = aggregate("ns#U", ShapeType::Union, &[("a", "ns#V", false)]);
        shapes.extend(aggregate("ns#V", ShapeType::Union, &[("b", "ns#U", false)]));
        let model = Model::new(shapes, Default::default());
        let events = ShapeRecursionValidator.validate(&model);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.message.contains("has no non-recursive members")));
    }

    #[test]
    fn test_union_cycle_through_required_structure() {
        let mut shapes = aggregate("ns#U", ShapeType::Union, &[("wrapped", "ns#Wrapper", false)]);
        shapes.extend(aggregate("ns#Wrapper", ShapeType::Structure, &[("inner", "ns#U", true)]));
        let model = Model::new(shapes, Default::default());
        let events = ShapeRecursionValidator.validate(&model);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].shape_id, Some(id("ns#U")));

        let mut shapes = aggregate(
            "ns#U",
            ShapeType::Union,
            &[("a", "ns#V", false), ("b", "ns#Wrapper", false)],
        );
        shapes.extend(aggregate(
            "ns#V",
            ShapeType::Union,
            &[("u", "ns#U", false), ("text", "ns#Text", false)],
        ));
        shapes.extend(aggregate("ns#Wrapper", ShapeType::Structure, &[("inner", "ns#U", false)]));
        shapes.push(Shape::new(id("ns#Text"), ShapeType::String));
        let model = Model::new(shapes, Default::default());
        assert!(ShapeRecursionValidator.validate(&model).is_empty());
    }
}
