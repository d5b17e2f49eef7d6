//! Push-based selector evaluation

use super::{Step, TypeCategory};
use crate::knowledge::{NeighborIndex, Relationship};
use crate::shapes::{Model, Shape};
use smithy_semantic_common::{ShapeId, ShapeType};
use std::collections::{BTreeSet, HashMap};

/// Receives each shape that reaches the end of a selector; `false` stops evaluation
pub(super) type Emit<'e, 'm> = dyn FnMut(&'m Shape) -> bool + 'e;

pub(super) struct Evaluator<'m> {
    model: &'m Model,
    neighbors: &'m NeighborIndex,
    /// Results of `:in` selectors keyed by the address of their steps
    in_cache: HashMap<usize, BTreeSet<ShapeId>>,
}

impl<'m> Evaluator<'m> {
    pub(super) fn new(model: &'m Model) -> Self {
        Self {
            model,
            neighbors: model.neighbor_index(),
            in_cache: HashMap::new(),
        }
    }

    /// Push `shape` through `steps`, returning `false` once evaluation should stop
    pub(super) fn push(
        &mut self,
        shape: &'m Shape,
        steps: &[Step],
        emit: &mut Emit<'_, 'm>,
    ) -> bool {
        let Some((step, rest)) = steps.split_first() else {
            return emit(shape);
        };
        let model = self.model;
        let neighbors = self.neighbors;

        match step {
            Step::Any => self.push(shape, rest, emit),
            Step::ShapeType(expected) => {
                if type_matches(shape.shape_type, *expected) {
                    self.push(shape, rest, emit)
                } else {
                    true
                }
            }
            Step::Category(category) => {
                if category_matches(shape.shape_type, *category) {
                    self.push(shape, rest, emit)
                } else {
                    true
                }
            }
            Step::Attribute(test) => {
                if test.matches(shape) {
                    self.push(shape, rest, emit)
                } else {
                    true
                }
            }
            Step::Forward(labels) => {
                for rel in neighbors.neighbors(&shape.id) {
                    if !relationship_matches(rel, labels) {
                        continue;
                    }
                    if let Some(next) = model.get_shape(&rel.neighbor) {
                        if !self.push(next, rest, emit) {
                            return false;
                        }
                    }
                }
                true
            }
            Step::Reverse(labels) => {
                for rel in neighbors.reverse_neighbors(&shape.id) {
                    if !relationship_matches(rel, labels) {
                        continue;
                    }
                    if let Some(next) = model.get_shape(&rel.shape) {
                        if !self.push(next, rest, emit) {
                            return false;
                        }
                    }
                }
                true
            }
            Step::RecursiveNeighbors => {
                for next in self.reachable(shape) {
                    if !self.push(next, rest, emit) {
                        return false;
                    }
                }
                true
            }
            Step::Not(inner) => {
                if self.yields(shape, inner) {
                    true
                } else {
                    self.push(shape, rest, emit)
                }
            }
            Step::Test(selectors) => {
                for selector in selectors {
                    if self.yields(shape, selector) {
                        return self.push(shape, rest, emit);
                    }
                }
                true
            }
            Step::Is(selectors) => {
                let mut seen = BTreeSet::new();
                for selector in selectors {
                    for next in self.collect(shape, selector) {
                        if seen.insert(&next.id) && !self.push(next, rest, emit) {
                            return false;
                        }
                    }
                }
                true
            }
            Step::In(inner) => {
                let key = inner.as_ptr() as usize;
                if !self.in_cache.contains_key(&key) {
                    let mut found = BTreeSet::new();
                    for start in model.shapes() {
                        for next in self.collect(start, inner) {
                            found.insert(next.id.clone());
                        }
                    }
                    self.in_cache.insert(key, found);
                }
                let contained = self
                    .in_cache
                    .get(&key)
                    .is_some_and(|found| found.contains(&shape.id));
                if contained {
                    self.push(shape, rest, emit)
                } else {
                    true
                }
            }
            Step::Recursive(inner) => {
                let mut visited: BTreeSet<&ShapeId> = BTreeSet::new();
                let mut queue = self.collect(shape, inner);
                while let Some(next) = queue.pop() {
                    if !visited.insert(&next.id) {
                        continue;
                    }
                    if !self.push(next, rest, emit) {
                        return false;
                    }
                    queue.extend(self.collect(next, inner));
                }
                true
            }
        }
    }

    /// Whether `steps` produce anything for `shape`; stops at the first result
    fn yields(&mut self, shape: &'m Shape, steps: &[Step]) -> bool {
        let mut found = false;
        self.push(shape, steps, &mut |_| {
            found = true;
            false
        });
        found
    }

    fn collect(&mut self, shape: &'m Shape, steps: &[Step]) -> Vec<&'m Shape> {
        let mut result = Vec::new();
        self.push(shape, steps, &mut |found| {
            result.push(found);
            true
        });
        result
    }

    /// Every shape reachable through directed relationships
    fn reachable(&self, start: &'m Shape) -> Vec<&'m Shape> {
        let mut visited: BTreeSet<&ShapeId> = BTreeSet::new();
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            for rel in self.neighbors.neighbors(&current.id) {
                if !rel.kind.is_directed() {
                    continue;
                }
                if let Some(next) = self.model.get_shape(&rel.neighbor) {
                    if visited.insert(&next.id) {
                        result.push(next);
                        stack.push(next);
                    }
                }
            }
        }
        result
    }
}

fn relationship_matches(rel: &Relationship, labels: &[String]) -> bool {
    if labels.is_empty() {
        rel.kind.is_directed()
    } else {
        rel.kind
            .selector_label()
            .is_some_and(|label| labels.iter().any(|l| l == label))
    }
}

fn type_matches(actual: ShapeType, expected: ShapeType) -> bool {
    actual == expected
        || (expected == ShapeType::String && actual == ShapeType::Enum)
        || (expected == ShapeType::Integer && actual == ShapeType::IntEnum)
}

fn category_matches(actual: ShapeType, category: TypeCategory) -> bool {
    match category {
        TypeCategory::Number => actual.is_number(),
        TypeCategory::SimpleType => actual.is_simple(),
        TypeCategory::Collection => actual.is_collection(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::Selector;
    use smithy_semantic_common::{OperationProperties, ServiceProperties, ShapeProperties};

    fn id(value: &str) -> ShapeId {
        ShapeId::parse(value).unwrap()
    }

    fn ids(values: &[&str]) -> BTreeSet<ShapeId> {
        values.iter().map(|v| id(v)).collect()
    }

    fn with_members(name: &str, shape_type: ShapeType, members: &[(&str, &str)]) -> Vec<Shape> {
        let mut shape = Shape::new(id(name), shape_type);
        let mut shapes = Vec::new();
        for (member, target) in members {
            let member_id = shape.id.with_member(member);
            shape.members.insert(member.to_string(), member_id.clone());
            shapes.push(Shape::member(member_id, Some(id(target))));
        }
        shapes.push(shape);
        shapes
    }

    /// Svc -> GetA -> GetAInput { name: Name, tags: Tags [Name] }, GetA errors Oops
    fn model() -> Model {
        let mut service = Shape::new(id("ns#Svc"), ShapeType::Service);
        service.properties = ShapeProperties::Service(ServiceProperties {
            operations: vec![id("ns#GetA")],
            ..Default::default()
        });
        let mut operation = Shape::new(id("ns#GetA"), ShapeType::Operation);
        operation.properties = ShapeProperties::Operation(OperationProperties {
            input: Some(id("ns#GetAInput")),
            errors: vec![id("ns#Oops")],
            ..Default::default()
        });

        let mut shapes = vec![
            service,
            operation,
            Shape::new(id("ns#Oops"), ShapeType::Structure),
            Shape::new(id("ns#Name"), ShapeType::String),
            Shape::new(id("ns#Loose"), ShapeType::String),
        ];
        shapes.extend(with_members(
            "ns#GetAInput",
            ShapeType::Structure,
            &[("name", "ns#Name"), ("tags", "ns#Tags")],
        ));
        shapes.extend(with_members("ns#Tags", ShapeType::List, &[("member", "ns#Name")]));
        Model::new(shapes, Default::default())
    }

    fn select(model: &Model, expression: &str) -> BTreeSet<ShapeId> {
        Selector::parse(expression).unwrap().select_ids(model)
    }

    /// Every emission when pushing a single shape, duplicates included
    fn emitted(model: &Model, start: &str, expression: &str) -> Vec<ShapeId> {
        let selector = Selector::parse(expression).unwrap();
        let shape = model.get_shape(&id(start)).unwrap();
        let mut result = Vec::new();
        Evaluator::new(model).push(shape, selector.steps(), &mut |found| {
            result.push(found.id.clone());
            true
        });
        result
    }

    #[test]
    fn test_reverse_traversal() {
        let model = model();
        assert_eq!(select(&model, "member <-[member]- list"), ids(&["ns#Tags"]));
        assert_eq!(
            select(&model, "string < member"),
            ids(&["ns#GetAInput$name", "ns#Tags$member"])
        );
        assert_eq!(select(&model, "structure <-[error]- operation"), ids(&["ns#GetA"]));
        assert!(emitted(&model, "ns#Loose", "string < *").is_empty());
    }

    #[test]
    fn test_in_filters_by_another_selector() {
        let model = model();
        assert_eq!(
            select(&model, "string :in(list > member > string)"),
            ids(&["ns#Name"])
        );
        assert!(select(&model, "string :in(map > member)").is_empty());
    }

    #[test]
    fn test_recursive_and_recursive_neighbors_agree() {
        let model = model();
        let closure = ids(&[
            "ns#GetA",
            "ns#GetAInput",
            "ns#GetAInput$name",
            "ns#GetAInput$tags",
            "ns#Name",
            "ns#Oops",
            "ns#Tags",
            "ns#Tags$member",
        ]);
        assert_eq!(select(&model, "service ~> *"), closure);
        assert_eq!(select(&model, "service :recursive(> *)"), closure);
        assert_eq!(
            select(&model, "operation :recursive(-[input]-> structure > member > *)"),
            ids(&["ns#Name", "ns#Tags"])
        );
    }

    #[test]
    fn test_is_emits_each_shape_once() {
        let model = model();
        assert_eq!(
            emitted(&model, "ns#Name", ":is(string, [id|name = 'Name'])"),
            vec![id("ns#Name")]
        );
        assert_eq!(
            emitted(&model, "ns#GetAInput", "structure :is(> member, > [id|member = 'name'])"),
            vec![id("ns#GetAInput$name"), id("ns#GetAInput$tags")]
        );
        assert_eq!(emitted(&model, "ns#Loose", ":is(list, map)"), Vec::<ShapeId>::new());
    }
}
