//! Resource identifiers and how operations bind to them

use crate::knowledge::{BindingType, OperationBinding};
use crate::shapes::{Model, Shape};
use crate::traits::ids;
use crate::validation::Validator;
use indexmap::IndexMap;
use smithy_semantic_common::{ResourceProperties, ShapeId, ShapeType, ValidationEvent};
use std::collections::BTreeSet;

/// Checks that every bound operation forms the kind of binding its slot
/// requires and that child operations bind every parent identifier
pub struct ResourceIdentifierBindingValidator;

impl Validator for ResourceIdentifierBindingValidator {
    fn name(&self) -> &str {
        "ResourceIdentifierBinding"
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let index = model.identifier_binding_index();
        let top_down = model.top_down_index();
        let mut events = Vec::new();

        for resource in model.shapes_of_type(ShapeType::Resource) {
            let Some(props) = resource.properties.as_resource() else {
                continue;
            };
            let collection_ops = collection_operations(model, props);

            for (operation_id, binding) in index.operation_bindings(&resource.id) {
                let Some(operation) = model.get_shape(operation_id) else {
                    continue;
                };

                if let Some(parent) = top_down
                    .parent_resource(&resource.id)
                    .and_then(|p| model.get_shape(p))
                {
                    self.check_parent_bindings(resource, parent, operation, binding, &mut events);
                }

                let expects_collection = collection_ops.contains(operation_id);
                match (expects_collection, binding.binding_type) {
                    (true, BindingType::Instance) => events.push(
                        self.error(
                            operation,
                            format!(
                                "This operation is marked with the `collection` trait or bound as \
                                 a collection operation but is bound to the `{}` resource using an \
                                 instance binding, meaning that all of the identifiers of the \
                                 resource are bound to members of the operation input.",
                                resource.id
                            ),
                        ),
                    ),
                    (true, BindingType::None) => events.push(self.error(
                        operation,
                        format!(
                            "This operation does not form a valid collection operation when bound \
                             to resource `{}`. Collection operations must bind every identifier of \
                             the parent resource and must not contain members named after an \
                             identifier that are not valid bindings: [{}]",
                            resource.id,
                            ticked(&binding.invalid_members)
                        ),
                    )),
                    (false, BindingType::Collection | BindingType::None) => events.push(self.error(
                        operation,
                        format!(
                            "This operation does not form a valid instance operation when bound to \
                             resource `{}`. All of the identifiers of the resource were not \
                             implicitly or explicitly bound to the input of the operation. \
                             Expected the following identifier bindings: [{}]. Found the following \
                             identifier bindings: [{}]",
                            resource.id,
                            expected_bindings(&props.identifiers),
                            found_bindings(&binding.input)
                        ),
                    )),
                    _ => {}
                }
            }
        }
        events
    }
}

impl ResourceIdentifierBindingValidator {
    fn check_parent_bindings(
        &self,
        child: &Shape,
        parent: &Shape,
        operation: &Shape,
        binding: &OperationBinding,
        events: &mut Vec<ValidationEvent>,
    ) {
        if binding.binding_type == BindingType::None {
            return;
        }
        let Some(parent_props) = parent.properties.as_resource() else {
            return;
        };
        let missing: Vec<String> = parent_props
            .identifiers
            .keys()
            .filter(|name| !binding.input.contains_key(*name))
            .cloned()
            .collect();
        if missing.is_empty() {
            return;
        }
        events.push(self.error(
            operation,
            format!(
                "This operation is bound to the `{}` resource, which is a child of the `{}` \
                 resource, and it is missing the following resource identifier bindings of `{}`: \
                 [{}]",
                child.id,
                parent.id,
                parent.id,
                ticked(&missing)
            ),
        ));
    }

    fn error(&self, shape: &Shape, message: String) -> ValidationEvent {
        ValidationEvent::error(self.name(), message)
            .with_shape(&shape.id)
            .with_source(&shape.source)
    }
}

/// Checks that child resources repeat their parent's identifiers and that
/// resources do not contain themselves
pub struct ResourceIdentifierValidator;

impl Validator for ResourceIdentifierValidator {
    fn name(&self) -> &str {
        "ResourceIdentifier"
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let mut events = Vec::new();

        for resource in model.shapes_of_type(ShapeType::Resource) {
            let Some(props) = resource.properties.as_resource() else {
                continue;
            };

            for child_id in &props.resources {
                let Some(child) = model.get_shape(child_id) else {
                    continue;
                };
                let Some(child_props) = child.properties.as_resource() else {
                    continue;
                };
                for (name, target) in &props.identifiers {
                    match child_props.identifiers.get(name) {
                        None => events.push(self.error(
                            child,
                            format!(
                                "This resource is bound as a child of `{}`, but it does not define \
                                 the `{name}` identifier of its parent. Child resources must \
                                 define every identifier of their parent.",
                                resource.id
                            ),
                        )),
                        Some(child_target) if child_target != target => events.push(self.error(
                            child,
                            format!(
                                "The `{name}` identifier of this resource targets \
                                 `{child_target}`, but the same identifier of its parent `{}` \
                                 targets `{target}`",
                                resource.id
                            ),
                        )),
                        Some(_) => {}
                    }
                }
            }

            if let Some(path) = resource_cycle(model, &resource.id) {
                events.push(self.error(
                    resource,
                    format!(
                        "Found a resource cycle: {}. A resource cannot directly or transitively \
                         contain itself.",
                        path.iter().map(ToString::to_string).collect::<Vec<_>>().join(" > ")
                    ),
                ));
            }
        }
        events
    }
}

impl ResourceIdentifierValidator {
    fn error(&self, shape: &Shape, message: String) -> ValidationEvent {
        ValidationEvent::error(self.name(), message)
            .with_shape(&shape.id)
            .with_source(&shape.source)
    }
}

/// Operations that must not bind every identifier
fn collection_operations(model: &Model, props: &ResourceProperties) -> BTreeSet<ShapeId> {
    let mut result: BTreeSet<ShapeId> = props
        .create
        .iter()
        .chain(&props.list)
        .chain(&props.collection_operations)
        .cloned()
        .collect();
    result.extend(
        props
            .operations
            .iter()
            .filter(|id| model.get_trait(id, ids::COLLECTION).is_some())
            .cloned(),
    );
    result
}

/// Path from `start` through child resources back to itself
fn resource_cycle(model: &Model, start: &ShapeId) -> Option<Vec<ShapeId>> {
    let mut visited = BTreeSet::new();
    let mut stack = vec![vec![start.clone()]];

    while let Some(path) = stack.pop() {
        let Some(current) = path.last() else {
            continue;
        };
        let children = model
            .get_shape(current)
            .and_then(|s| s.properties.as_resource())
            .map(|r| r.resources.as_slice())
            .unwrap_or_default();
        for child in children {
            let mut next = path.clone();
            next.push(child.clone());
            if child == start {
                return Some(next);
            }
            if visited.insert(child.clone()) {
                stack.push(next);
            }
        }
    }
    None
}

fn ticked(values: &[String]) -> String {
    values.iter().map(|v| format!("`{v}`")).collect::<Vec<_>>().join(", ")
}

fn expected_bindings(identifiers: &IndexMap<String, ShapeId>) -> String {
    let mut parts: Vec<String> = identifiers
        .iter()
        .map(|(name, target)| format!("required member named `{name}` that targets `{target}`"))
        .collect();
    parts.sort();
    parts.join(", ")
}

fn found_bindings(bindings: &IndexMap<String, String>) -> String {
    let mut parts: Vec<String> = bindings
        .iter()
        .map(|(identifier, member)| format!("identifier `{identifier}` bound to member `{member}`"))
        .collect();
    parts.sort();
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Trait;
    use smithy_semantic_common::{Node, OperationProperties, ShapeProperties};

    fn id(value: &str) -> ShapeId {
        ShapeId::parse(value).unwrap()
    }

    fn resource(
        name: &str,
        identifiers: &[&str],
        configure: impl FnOnce(&mut ResourceProperties),
    ) -> Shape {
        let mut props = ResourceProperties {
            identifiers: identifiers
                .iter()
                .map(|name| (name.to_string(), ShapeId::prelude("String")))
                .collect(),
            ..Default::default()
        };
        configure(&mut props);
        let mut shape = Shape::new(id(name), ShapeType::Resource);
        shape.properties = ShapeProperties::Resource(props);
        shape
    }

    /// Operation whose input holds a required string member per name
    fn operation(name: &str, members: &[&str]) -> Vec<Shape> {
        let mut op = Shape::new(id(name), ShapeType::Operation);
        let input_id = id(&format!("{name}Input"));
        op.properties = ShapeProperties::Operation(OperationProperties {
            input: Some(input_id.clone()),
            ..Default::default()
        });
        let mut input = Shape::new(input_id, ShapeType::Structure);
        let mut shapes = vec![op];
        for member in members {
            let member_id = input.id.with_member(member);
            input.members.insert(member.to_string(), member_id.clone());
            let mut shape = Shape::member(member_id, Some(ShapeId::prelude("String")));
            shape.add_trait(Trait::new(ShapeId::prelude("required"), Node::empty_object()));
            shapes.push(shape);
        }
        shapes.push(input);
        shapes
    }

    fn model(shapes: Vec<Shape>) -> Model {
        let mut shapes = shapes;
        shapes.push(Shape::new(ShapeId::prelude("String"), ShapeType::String));
        Model::new(shapes, Default::default())
    }

    #[test]
    fn test_valid_lifecycle_bindings() {
        let mut shapes = vec![resource("ns#Thing", &["id"], |r| {
            r.read = Some(id("ns#GetThing"));
            r.list = Some(id("ns#ListThings"));
        })];
        shapes.extend(operation("ns#GetThing", &["id"]));
        shapes.extend(operation("ns#ListThings", &[]));
        assert!(ResourceIdentifierBindingValidator.validate(&model(shapes)).is_empty());
    }

    #[test]
    fn test_read_requires_instance_binding() {
        let mut shapes = vec![resource("ns#Thing", &["id"], |r| r.read = Some(id("ns#GetThing")))];
        shapes.extend(operation("ns#GetThing", &[]));
        let events = ResourceIdentifierBindingValidator.validate(&model(shapes));
        assert_eq!(events.len(), 1);
        assert!(events[0]
            .message
            .contains("Expected the following identifier bindings: [required member named `id` \
                       that targets `smithy.api#String`]"));
    }

    #[test]
    fn test_list_rejects_instance_binding() {
        let mut shapes = vec![resource("ns#Thing", &["id"], |r| {
            r.list = Some(id("ns#ListThings"))
        })];
        shapes.extend(operation("ns#ListThings", &["id"]));
        let events = ResourceIdentifierBindingValidator.validate(&model(shapes));
        assert_eq!(events.len(), 1);
        assert!(events[0].message.contains("using an instance binding"));
    }

    #[test]
    fn test_child_operation_must_bind_parent_identifiers() {
        let mut shapes = vec![
            resource("ns#Parent", &["parentId"], |r| r.resources = vec![id("ns#Child")]),
            resource("ns#Child", &["parentId", "childId"], |r| r.read = Some(id("ns#GetChild"))),
        ];
        shapes.extend(operation("ns#GetChild", &["childId"]));
        let events = ResourceIdentifierBindingValidator.validate(&model(shapes));
        // Not an instance binding, and a None binding skips the parent check
        assert_eq!(events.len(), 1);
        assert!(events[0].message.contains("valid instance operation"));
    }

    #[test]
    fn test_child_must_repeat_parent_identifiers() {
        let shapes = vec![
            resource("ns#Parent", &["parentId"], |r| r.resources = vec![id("ns#Child")]),
            resource("ns#Child", &["childId"], |_| {}),
        ];
        let events = ResourceIdentifierValidator.validate(&model(shapes));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].shape_id.as_ref(), Some(&id("ns#Child")));
        assert!(events[0].message.contains("does not define the `parentId` identifier"));
    }

    #[test]
    fn test_resource_cycle() {
        let shapes = vec![
            resource("ns#A", &[], |r| r.resources = vec![id("ns#B")]),
            resource("ns#B", &[], |r| r.resources = vec![id("ns#A")]),
        ];
        let events = ResourceIdentifierValidator.validate(&model(shapes));
        assert_eq!(events.len(), 2);
        assert!(events
            .iter()
            .any(|e| e.message.starts_with("Found a resource cycle: ns#A > ns#B > ns#A.")));
    }
}
