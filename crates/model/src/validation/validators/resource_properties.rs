//! Resource properties against the members of lifecycle operations

use crate::knowledge::{BindingType, PropertyBinding};
use crate::shapes::{Model, Shape};
use crate::validation::Validator;
use smithy_semantic_common::{ResourceProperties, ShapeId, ShapeType, ValidationEvent};
use std::collections::{BTreeMap, BTreeSet};

pub struct ResourceOperationInputOutputValidator;

impl Validator for ResourceOperationInputOutputValidator {
    fn name(&self) -> &str {
        "ResourceOperationInputOutput"
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for resource in model.shapes_of_type(ShapeType::Resource) {
            let Some(props) = resource.properties.as_resource() else {
                continue;
            };
            if props.properties.is_empty() {
                continue;
            }
            self.validate_resource(model, resource, props, &mut events);
        }
        events
    }
}

impl ResourceOperationInputOutputValidator {
    fn validate_resource(
        &self,
        model: &Model,
        resource: &Shape,
        props: &ResourceProperties,
        events: &mut Vec<ValidationEvent>,
    ) {
        let index = model.property_binding_index();
        let mut used = BTreeSet::new();

        for operation in property_operations(model, resource, props) {
            let Some(bindings) = index.operation(operation) else {
                continue;
            };
            let sides = [
                (&bindings.input_shape, &bindings.input),
                (&bindings.output_shape, &bindings.output),
            ];
            for (structure, members) in sides {
                for binding in members {
                    self.check_member(
                        model, resource, props, operation, binding, &mut used, events,
                    );
                }
                if let Some(structure) = structure {
                    self.check_duplicate_names(model, structure, members, events);
                }
            }
        }

        for name in props.properties.keys().filter(|name| !used.contains(name.as_str())) {
            events.push(
                ValidationEvent::error(
                    self.name(),
                    format!(
                        "Resource property `{name}` is not used in the input or output of create \
                         or an instance operation."
                    ),
                )
                .with_shape(&resource.id)
                .with_source(&resource.source),
            );
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn check_member<'p>(
        &self,
        model: &Model,
        resource: &Shape,
        props: &ResourceProperties,
        operation: &ShapeId,
        binding: &'p PropertyBinding,
        used: &mut BTreeSet<&'p str>,
        events: &mut Vec<ValidationEvent>,
    ) {
        let Some(member) = model.get_shape(&binding.member) else {
            return;
        };
        let error = |message: String| {
            ValidationEvent::error(self.name(), message)
                .with_shape(&member.id)
                .with_source(&member.source)
        };

        let Some(expected) = props.properties.get(&binding.property) else {
            events.push(error(format!(
                "Member `{}` does not target a property or identifier for resource `{}`",
                member.member_name().unwrap_or_default(),
                resource.id
            )));
            return;
        };
        used.insert(binding.property.as_str());

        if let Some(target) = &member.target {
            if target != expected {
                events.push(error(format!(
                    "The resource property `{}` has a conflicting target shape `{target}` on the \
                     `{operation}` operation which targets `{expected}`.",
                    binding.property
                )));
            }
        }
    }

    fn check_duplicate_names(
        &self,
        model: &Model,
        structure: &ShapeId,
        members: &[PropertyBinding],
        events: &mut Vec<ValidationEvent>,
    ) {
        let mut by_property: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for binding in members {
            by_property
                .entry(binding.property.as_str())
                .or_default()
                .push(binding.member.member().unwrap_or_default());
        }
        let Some(shape) = model.get_shape(structure) else {
            return;
        };
        for (property, names) in by_property.iter().filter(|(_, names)| names.len() > 1) {
            events.push(
                ValidationEvent::error(
                    self.name(),
                    format!(
                        "This shape contains members with conflicting property names that resolve \
                         to '{property}': {}",
                        names.join(", ")
                    ),
                )
                .with_shape(&shape.id)
                .with_source(&shape.source),
            );
        }
    }
}

/// Operations whose members carry properties: create, put, read, update and
/// instance operations
fn property_operations<'m>(
    model: &Model,
    resource: &Shape,
    props: &'m ResourceProperties,
) -> Vec<&'m ShapeId> {
    let bindings = model.identifier_binding_index();
    let mut result: Vec<&ShapeId> = Vec::new();
    let lifecycle = props
        .create
        .iter()
        .chain(&props.put)
        .chain(&props.read)
        .chain(&props.update);
    let instance = props
        .operations
        .iter()
        .filter(|op| bindings.binding_type(&resource.id, op) == BindingType::Instance);
    for operation in lifecycle.chain(instance) {
        if !result.contains(&operation) {
            result.push(operation);
        }
    }
    result
}
