//! Bindings between resource identifiers and operation members

use crate::shapes::{Model, Shape};
use crate::traits::ids;
use indexmap::IndexMap;
use smithy_semantic_common::{ResourceProperties, ShapeId, ShapeType};
use std::collections::BTreeMap;

/// How an operation is bound to a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingType {
    /// Every identifier of the resource is bound
    Instance,
    /// A strict subset of the identifiers, including all parent identifiers,
    /// is bound
    Collection,
    /// Neither
    None,
}

/// Identifier bindings of one operation against one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationBinding {
    pub binding_type: BindingType,
    /// Identifier name to the input member that binds it
    pub input: IndexMap<String, String>,
    /// Identifier name to the output member that binds it
    pub output: IndexMap<String, String>,
    /// Input members named after an identifier that do not form a binding
    pub invalid_members: Vec<String>,
}

/// Identifier bindings of every operation bound to every resource
#[derive(Debug, Default)]
pub struct IdentifierBindingIndex {
    bindings: BTreeMap<ShapeId, BTreeMap<ShapeId, OperationBinding>>,
}

impl IdentifierBindingIndex {
    pub fn new(model: &Model) -> Self {
        let mut index = IdentifierBindingIndex::default();
        let operations = model.operation_index();
        let top_down = model.top_down_index();

        for resource in model.shapes_of_type(ShapeType::Resource) {
            let Some(props) = resource.properties.as_resource() else {
                continue;
            };
            let parent_identifiers: Vec<String> = top_down
                .parent_resource(&resource.id)
                .and_then(|p| model.get_shape(p))
                .and_then(|p| p.properties.as_resource())
                .map(|p| p.identifiers.keys().cloned().collect())
                .unwrap_or_default();

            let mut per_operation = BTreeMap::new();
            for operation in props.all_operations() {
                let input = operations.input(model, operation);
                let output = operations.output(model, operation);
                let (input_bindings, invalid_members) = match input {
                    Some(input) => compute_bindings(model, props, input),
                    None => (IndexMap::new(), Vec::new()),
                };
                let output_bindings = match output {
                    Some(output) => compute_bindings(model, props, output).0,
                    None => IndexMap::new(),
                };
                let binding_type =
                    classify(props, &parent_identifiers, &input_bindings, &invalid_members);
                per_operation.insert(
                    operation.clone(),
                    OperationBinding {
                        binding_type,
                        input: input_bindings,
                        output: output_bindings,
                        invalid_members,
                    },
                );
            }
            index.bindings.insert(resource.id.clone(), per_operation);
        }

        index
    }

    pub fn binding(&self, resource: &ShapeId, operation: &ShapeId) -> Option<&OperationBinding> {
        self.bindings.get(resource).and_then(|ops| ops.get(operation))
    }

    /// Binding type of an operation; [`BindingType::None`] when not bound
    pub fn binding_type(&self, resource: &ShapeId, operation: &ShapeId) -> BindingType {
        self.binding(resource, operation)
            .map(|b| b.binding_type)
            .unwrap_or(BindingType::None)
    }

    /// Identifier to input member bindings of an operation
    pub fn input_bindings(
        &self,
        resource: &ShapeId,
        operation: &ShapeId,
    ) -> Option<&IndexMap<String, String>> {
        self.binding(resource, operation).map(|b| &b.input)
    }

    pub fn output_bindings(
        &self,
        resource: &ShapeId,
        operation: &ShapeId,
    ) -> Option<&IndexMap<String, String>> {
        self.binding(resource, operation).map(|b| &b.output)
    }

    /// Every operation binding of a resource
    pub fn operation_bindings(
        &self,
        resource: &ShapeId,
    ) -> impl Iterator<Item = (&ShapeId, &OperationBinding)> {
        self.bindings.get(resource).into_iter().flatten()
    }
}

/// Explicit `resourceIdentifier` bindings first, then implicit bindings by a
/// required member with the identifier's name and target
fn compute_bindings(
    model: &Model,
    resource: &ResourceProperties,
    structure: &Shape,
) -> (IndexMap<String, String>, Vec<String>) {
    let mut bindings = IndexMap::new();
    let mut invalid = Vec::new();

    for member in model.members(structure) {
        let name = member.member_name().unwrap_or_default();
        if let Some(identifier) = member
            .trait_value(ids::RESOURCE_IDENTIFIER)
            .and_then(|v| v.as_str())
        {
            if resource.identifiers.contains_key(identifier) {
                bindings.insert(identifier.to_string(), name.to_string());
            }
        }
    }

    for member in model.members(structure) {
        let name = member.member_name().unwrap_or_default();
        let Some(expected) = resource.identifiers.get(name) else {
            continue;
        };
        if bindings.contains_key(name) || member.has_trait(ids::RESOURCE_IDENTIFIER) {
            continue;
        }
        if member.has_trait(ids::REQUIRED) && member.target.as_ref() == Some(expected) {
            bindings.insert(name.to_string(), name.to_string());
        } else {
            invalid.push(name.to_string());
        }
    }

    (bindings, invalid)
}

fn classify(
    resource: &ResourceProperties,
    parent_identifiers: &[String],
    bindings: &IndexMap<String, String>,
    invalid_members: &[String],
) -> BindingType {
    let all_bound = resource.identifiers.keys().all(|id| bindings.contains_key(id));
    if all_bound {
        return BindingType::Instance;
    }
    let parents_bound = parent_identifiers.iter().all(|id| bindings.contains_key(id));
    if parents_bound && invalid_members.is_empty() {
        BindingType::Collection
    } else {
        BindingType::None
    }
}
