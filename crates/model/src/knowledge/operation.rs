//! Input, output and error shapes of operations

use crate::shapes::{Model, Shape};
use crate::traits::ids;
use smithy_semantic_common::{ShapeId, ShapeProperties, ShapeType};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Default)]
struct OperationShapes {
    input: Option<ShapeId>,
    output: Option<ShapeId>,
    errors: Vec<ShapeId>,
}

/// Resolved input, output and error structures of every operation
///
/// A missing input or output, or one targeting `smithy.api#Unit`, has no
/// structure.
#[derive(Debug, Default)]
pub struct OperationIndex {
    operations: BTreeMap<ShapeId, OperationShapes>,
    inputs: BTreeSet<ShapeId>,
    outputs: BTreeSet<ShapeId>,
}

impl OperationIndex {
    pub fn new(model: &Model) -> Self {
        let mut index = OperationIndex::default();
        let structure = |id: &Option<ShapeId>| {
            id.as_ref()
                .and_then(|id| model.get_shape(id))
                .filter(|s| s.shape_type == ShapeType::Structure && !s.has_trait(ids::UNIT_TYPE))
                .map(|s| s.id.clone())
        };

        for shape in model.shapes_of_type(ShapeType::Operation) {
            let Some(props) = shape.properties.as_operation() else {
                continue;
            };
            let entry = OperationShapes {
                input: structure(&props.input),
                output: structure(&props.output),
                errors: props.errors.clone(),
            };
            index.inputs.extend(entry.input.clone());
            index.outputs.extend(entry.output.clone());
            index.operations.insert(shape.id.clone(), entry);
        }

        index
    }

    pub fn input<'m>(&self, model: &'m Model, operation: &ShapeId) -> Option<&'m Shape> {
        self.operations
            .get(operation)
            .and_then(|o| o.input.as_ref())
            .and_then(|id| model.get_shape(id))
    }

    pub fn output<'m>(&self, model: &'m Model, operation: &ShapeId) -> Option<&'m Shape> {
        self.operations
            .get(operation)
            .and_then(|o| o.output.as_ref())
            .and_then(|id| model.get_shape(id))
    }

    /// Input member shapes in declaration order
    pub fn input_members<'m>(&self, model: &'m Model, operation: &ShapeId) -> Vec<&'m Shape> {
        self.input(model, operation)
            .map(|s| model.members(s).collect())
            .unwrap_or_default()
    }

    pub fn output_members<'m>(&self, model: &'m Model, operation: &ShapeId) -> Vec<&'m Shape> {
        self.output(model, operation)
            .map(|s| model.members(s).collect())
            .unwrap_or_default()
    }

    /// Errors declared directly on the operation
    pub fn errors(&self, operation: &ShapeId) -> &[ShapeId] {
        self.operations
            .get(operation)
            .map(|o| o.errors.as_slice())
            .unwrap_or(&[])
    }

    /// Errors of the operation plus the common errors of `service`
    pub fn errors_in_service(
        &self,
        model: &Model,
        service: &ShapeId,
        operation: &ShapeId,
    ) -> Vec<ShapeId> {
        let mut result: Vec<ShapeId> = self.errors(operation).to_vec();
        if let Some(ShapeProperties::Service(s)) = model.get_shape(service).map(|s| &s.properties) {
            for error in &s.errors {
                if !result.contains(error) {
                    result.push(error.clone());
                }
            }
        }
        result
    }

    /// Whether a structure is used as the input of any operation
    pub fn is_input_structure(&self, id: &ShapeId) -> bool {
        self.inputs.contains(id)
    }

    pub fn is_output_structure(&self, id: &ShapeId) -> bool {
        self.outputs.contains(id)
    }
}
