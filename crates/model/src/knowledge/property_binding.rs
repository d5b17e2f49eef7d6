//! Bindings between resource properties and operation members

use crate::shapes::{Model, Shape};
use crate::traits::ids;
use smithy_semantic_common::{ShapeId, ShapeType};
use std::collections::{BTreeMap, BTreeSet};

/// A member mapped to a resource property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyBinding {
    pub member: ShapeId,
    pub property: String,
}

/// Property-carrying structures of one operation
///
/// These are the input and output structures unless a member carries
/// `nestedProperties`, in which case its target is used instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationPropertyBindings {
    pub input_shape: Option<ShapeId>,
    pub output_shape: Option<ShapeId>,
    pub input: Vec<PropertyBinding>,
    pub output: Vec<PropertyBinding>,
}

#[derive(Debug, Default)]
pub struct PropertyBindingIndex {
    properties: BTreeMap<ShapeId, String>,
    exempt: BTreeSet<ShapeId>,
    operations: BTreeMap<ShapeId, OperationPropertyBindings>,
}

impl PropertyBindingIndex {
    pub fn new(model: &Model) -> Self {
        let mut index = PropertyBindingIndex::default();
        let operations = model.operation_index();
        let identifiers = model.identifier_binding_index();

        // Trait definitions marked `notProperty` exempt the members they are
        // applied to
        let mut exempting: BTreeSet<String> = model
            .shapes_with_trait(ids::NOT_PROPERTY)
            .filter(|s| s.has_trait(ids::TRAIT))
            .map(|s| s.id.to_string())
            .collect();
        exempting.insert(ids::NOT_PROPERTY.to_string());

        for resource in model.shapes_of_type(ShapeType::Resource) {
            let Some(props) = resource.properties.as_resource() else {
                continue;
            };

            for operation in props.all_operations() {
                let binding = identifiers.binding(&resource.id, operation);
                let mut entry = OperationPropertyBindings::default();

                let sides = [
                    (operations.input(model, operation), binding.map(|b| &b.input), true),
                    (operations.output(model, operation), binding.map(|b| &b.output), false),
                ];
                for (structure, bound_ids, is_input) in sides {
                    let Some(structure) = structure else {
                        continue;
                    };
                    let properties_shape = properties_shape(model, structure);
                    let mut found = Vec::new();

                    for member in model.members(properties_shape) {
                        let name = member.member_name().unwrap_or_default();
                        let is_identifier =
                            bound_ids.is_some_and(|b| b.values().any(|m| m == name));
                        let exempt = is_identifier
                            || member.traits.keys().any(|t| exempting.contains(t));
                        if exempt {
                            index.exempt.insert(member.id.clone());
                        }
                        if !exempt || props.properties.contains_key(name) {
                            let property = member
                                .trait_value(ids::PROPERTY)
                                .and_then(|v| v.get("name"))
                                .and_then(|v| v.as_str())
                                .unwrap_or(name)
                                .to_string();
                            index.properties.insert(member.id.clone(), property.clone());
                            found.push(PropertyBinding {
                                member: member.id.clone(),
                                property,
                            });
                        }
                    }

                    // Top-level members of a nested operation carry no properties
                    if properties_shape.id != structure.id {
                        for member in model.members(structure) {
                            index.exempt.insert(member.id.clone());
                            index.properties.remove(&member.id);
                        }
                    }

                    if is_input {
                        entry.input_shape = Some(properties_shape.id.clone());
                        entry.input = found;
                    } else {
                        entry.output_shape = Some(properties_shape.id.clone());
                        entry.output = found;
                    }
                }

                index.operations.insert(operation.clone(), entry);
            }
        }

        index
    }

    /// Property a member maps to
    pub fn property_name(&self, member: &ShapeId) -> Option<&str> {
        self.properties.get(member).map(String::as_str)
    }

    pub fn is_member_property(&self, member: &ShapeId) -> bool {
        self.properties.contains_key(member)
    }

    /// Whether a lifecycle member must map to a property
    pub fn requires_property(&self, member: &ShapeId) -> bool {
        !self.exempt.contains(member)
    }

    pub fn operation(&self, operation: &ShapeId) -> Option<&OperationPropertyBindings> {
        self.operations.get(operation)
    }
}

/// Input or output structure, or the target of its `nestedProperties` member
fn properties_shape<'m>(model: &'m Model, structure: &'m Shape) -> &'m Shape {
    model
        .members(structure)
        .filter(|m| m.has_trait(ids::NESTED_PROPERTIES))
        .filter_map(|m| model.target_of(m))
        .find(|t| t.shape_type == ShapeType::Structure)
        .unwrap_or(structure)
}
