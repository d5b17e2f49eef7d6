//! Name uniqueness inside a service closure and the `rename` map

use crate::knowledge::RelationshipType;
use crate::shapes::{Model, Shape};
use crate::validation::Validator;
use smithy_semantic_common::{is_valid_identifier, ShapeId, ShapeType, ValidationEvent};
use std::collections::{BTreeMap, BTreeSet};

pub struct ServiceValidator;

impl Validator for ServiceValidator {
    fn name(&self) -> &str {
        "Service"
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for service in model.shapes_of_type(ShapeType::Service) {
            self.validate_service(model, service, &mut events);
        }
        events
    }
}

impl ServiceValidator {
    fn validate_service(&self, model: &Model, service: &Shape, events: &mut Vec<ValidationEvent>) {
        let Some(properties) = service.properties.as_service() else {
            return;
        };
        let closure = service_closure(model, &service.id);
        let error = |message: String| {
            ValidationEvent::error(self.name(), message)
                .with_shape(&service.id)
                .with_source(&service.source)
        };

        for (from, to) in &properties.rename {
            if !closure.contains(from) {
                events.push(error(format!(
                    "Service attempts to rename a shape that is not in its closure: `{from}`"
                )));
            } else if from.is_prelude() {
                events.push(error(format!("Service attempts to rename a prelude shape: `{from}`")));
            }
            if !is_valid_identifier(to) {
                events.push(error(format!(
                    "Service attempts to rename `{from}` to an invalid identifier, `{to}`"
                )));
            }
            if from.name() == to {
                events.push(error(format!(
                    "Service rename for `{from}` does not actually change the name of the shape"
                )));
            }
        }

        // Contextual name to every shape using it
        let mut names: BTreeMap<String, Vec<&Shape>> = BTreeMap::new();
        for id in closure.iter().filter(|id| !id.has_member()) {
            let Some(shape) = model.get_shape(id) else {
                continue;
            };
            let name = properties
                .rename
                .get(id)
                .cloned()
                .unwrap_or_else(|| id.name().to_string());
            names.entry(name.to_lowercase()).or_default().push(shape);
        }

        for shapes in names.values().filter(|shapes| shapes.len() > 1) {
            if shapes.windows(2).all(|pair| is_tolerated_conflict(model, pair[0], pair[1])) {
                continue;
            }
            let ids: Vec<String> = shapes.iter().map(|s| format!("`{}`", s.id)).collect();
            let renamed: Vec<&ShapeId> = shapes
                .iter()
                .map(|s| &s.id)
                .filter(|id| properties.rename.contains_key(*id))
                .collect();
            let message = match renamed.first() {
                Some(renamed) => format!(
                    "Service rename for `{renamed}` to `{}` conflicts with other shapes in the \
                     service closure: {}",
                    properties.rename.get(*renamed).map(String::as_str).unwrap_or_default(),
                    ids.join(", ")
                ),
                None => format!(
                    "Shape name `{}` conflicts with {} in the `{}` service closure. Shapes in the \
                     closure of a service must have case-insensitively unique names regardless of \
                     their namespaces. Use the `rename` property of the service to disambiguate \
                     shape names.",
                    shapes[0].id.name(),
                    ids.join(", "),
                    service.id
                ),
            };
            events.push(error(message));
        }
    }
}

/// Every shape reachable from a service, excluding mixins and traits
fn service_closure(model: &Model, service: &ShapeId) -> BTreeSet<ShapeId> {
    let neighbors = model.neighbor_index();
    let mut closure = BTreeSet::new();
    let mut stack = vec![service.clone()];

    while let Some(id) = stack.pop() {
        if !closure.insert(id.clone()) {
            continue;
        }
        for rel in neighbors.neighbors(&id) {
            if !rel.kind.is_directed() || rel.kind == RelationshipType::Mixin {
                continue;
            }
            if model.contains_shape(&rel.neighbor) && !closure.contains(&rel.neighbor) {
                stack.push(rel.neighbor.clone());
            }
        }
    }
    closure
}

/// Identical simple shapes, or lists and maps of them, may share a name
fn is_tolerated_conflict(model: &Model, a: &Shape, b: &Shape) -> bool {
    if a.shape_type != b.shape_type || a.traits != b.traits {
        return false;
    }
    match a.shape_type {
        ShapeType::Enum | ShapeType::IntEnum => false,
        ShapeType::List => same_member(model, a, b, "member"),
        ShapeType::Map => same_member(model, a, b, "key") && same_member(model, a, b, "value"),
        other => other.is_simple(),
    }
}

fn same_member(model: &Model, a: &Shape, b: &Shape, name: &str) -> bool {
    let (Some(left), Some(right)) = (model.get_member(a, name), model.get_member(b, name)) else {
        return false;
    };
    if left.traits != right.traits {
        return false;
    }
    match (model.target_of(left), model.target_of(right)) {
        (Some(lt), Some(rt)) => lt.id == rt.id || is_tolerated_conflict(model, lt, rt),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smithy_semantic_common::{OperationProperties, ServiceProperties, ShapeProperties};

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

    fn model(rename: &[(&str, &str)], first_widget: ShapeType) -> Model {
        let mut service = Shape::new(id("ns.svc#Shop"), ShapeType::Service);
        service.properties = ShapeProperties::Service(ServiceProperties {
            operations: vec![id("ns.svc#Buy")],
            rename: rename.iter().map(|(from, to)| (id(from), to.to_string())).collect(),
            ..Default::default()
        });
        let mut op = Shape::new(id("ns.svc#Buy"), ShapeType::Operation);
        op.properties = ShapeProperties::Operation(OperationProperties {
            input: Some(id("ns.svc#BuyInput")),
            ..Default::default()
        });
        let mut shapes = vec![
            service,
            op,
            Shape::new(id("ns.a#Widget"), first_widget),
            Shape::new(id("ns.b#Widget"), ShapeType::String),
        ];
        shapes.extend(structure("ns.svc#BuyInput", &[("a", "ns.a#Widget"), ("b", "ns.b#Widget")]));
        Model::new(shapes, Default::default())
    }

    #[test]
    fn test_closure_conflict() {
        let events = ServiceValidator.validate(&model(&[], ShapeType::Integer));
        assert_eq!(events.len(), 1);
        assert!(events[0]
            .message
            .starts_with("Shape name `Widget` conflicts with `ns.a#Widget`, `ns.b#Widget`"));
    }

    #[test]
    fn test_identical_simple_shapes_are_tolerated() {
        assert!(ServiceValidator.validate(&model(&[], ShapeType::String)).is_empty());
    }

    #[test]
    fn test_rename_resolves_conflict() {
        let model = model(&[("ns.a#Widget", "AWidget")], ShapeType::Integer);
        let events = ServiceValidator.validate(&model);
        assert!(events.is_empty());
    }

    #[test]
    fn test_rename_must_not_collide() {
        let model = model(&[("ns.a#Widget", "BuyInput")], ShapeType::Integer);
        let events = ServiceValidator.validate(&model);
        assert_eq!(events.len(), 1);
        assert!(events[0]
            .message
            .starts_with("Service rename for `ns.a#Widget` to `BuyInput` conflicts"));
    }

    #[test]
    fn test_rename_outside_closure() {
        let model = model(&[("ns.zzz#Missing", "Other")], ShapeType::String);
        let events = ServiceValidator.validate(&model);
        assert_eq!(events.len(), 1);
        assert!(events[0].message.contains("not in its closure"));
    }

    fn map_model(second_value: &str) -> Model {
        let mut service = Shape::new(id("ns.svc#Shop"), ShapeType::Service);
        service.properties = ShapeProperties::Service(ServiceProperties {
            operations: vec![id("ns.svc#Buy")],
            ..Default::default()
        });
        let mut op = Shape::new(id("ns.svc#Buy"), ShapeType::Operation);
        op.properties = ShapeProperties::Operation(OperationProperties {
            input: Some(id("ns.svc#BuyInput")),
            ..Default::default()
        });
        let mut shapes = vec![service, op];
        for (name, value) in [("ns.a#Attrs", "smithy.api#String"), ("ns.b#Attrs", second_value)] {
            let mut map = Shape::new(id(name), ShapeType::Map);
            for (member, target) in [("key", "smithy.api#String"), ("value", value)] {
                let member_id = map.id.with_member(member);
                map.members.insert(member.to_string(), member_id.clone());
                shapes.push(Shape::member(member_id, Some(id(target))));
            }
            shapes.push(map);
        }
        shapes.push(Shape::new(id("smithy.api#String"), ShapeType::String));
        shapes.push(Shape::new(id("smithy.api#Integer"), ShapeType::Integer));
        shapes.extend(structure("ns.svc#BuyInput", &[("a", "ns.a#Attrs"), ("b", "ns.b#Attrs")]));
        Model::new(shapes, Default::default())
    }

    #[test]
    fn test_identical_maps_are_tolerated() {
        assert!(ServiceValidator.validate(&map_model("smithy.api#String")).is_empty());

        let events = ServiceValidator.validate(&map_model("smithy.api#Integer"));
        assert_eq!(events.len(), 1);
        assert!(events[0]
            .message
            .starts_with("Shape name `Attrs` conflicts with `ns.a#Attrs`, `ns.b#Attrs`"));
    }
}
