//! `readonly` and `idempotent` requirements of lifecycle operations

use crate::shapes::{Model, Shape};
use crate::traits::ids;
use crate::validation::Validator;
use smithy_semantic_common::{ShapeType, ValidationEvent};

pub struct ResourceLifecycleValidator;

/// Whether a lifecycle slot requires `readonly`, and whether it requires
/// `idempotent`
fn requirements(slot: &str) -> (Option<bool>, Option<bool>) {
    match slot {
        "read" | "list" => (Some(true), None),
        "create" | "update" => (Some(false), None),
        "delete" | "put" => (Some(false), Some(true)),
        _ => (None, None),
    }
}

impl Validator for ResourceLifecycleValidator {
    fn name(&self) -> &str {
        "ResourceLifecycle"
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let mut events = Vec::new();

        for resource in model.shapes_of_type(ShapeType::Resource) {
            let Some(props) = resource.properties.as_resource() else {
                continue;
            };
            for (slot, operation_id) in props.lifecycle_operations() {
                let Some(operation) = model.get_shape(operation_id) else {
                    continue;
                };
                let (readonly, idempotent) = requirements(slot);

                if let Some(expected) = readonly {
                    if is_readonly(operation) != expected {
                        events.push(self.error(
                            resource,
                            slot,
                            operation,
                            format!(
                                "must{} be marked with the readonly trait",
                                if expected { "" } else { " not" }
                            ),
                        ));
                    }
                }
                if idempotent == Some(true) && !is_idempotent(operation) {
                    let requirement = "must be marked as idempotent".to_string();
                    events.push(self.error(resource, slot, operation, requirement));
                }
            }
        }
        events
    }
}

impl ResourceLifecycleValidator {
    fn error(
        &self,
        resource: &Shape,
        slot: &str,
        operation: &Shape,
        requirement: String,
    ) -> ValidationEvent {
        ValidationEvent::error(
            self.name(),
            format!(
                "The `{slot}` lifecycle operation of this resource targets an invalid operation, \
                 `{}`. The targeted operation {requirement}.",
                operation.id
            ),
        )
        .with_shape(&resource.id)
        .with_source(&resource.source)
    }
}

fn is_readonly(operation: &Shape) -> bool {
    operation.has_trait(ids::READONLY)
}

/// `readonly` operations are idempotent too
fn is_idempotent(operation: &Shape) -> bool {
    operation.has_trait(ids::IDEMPOTENT) || is_readonly(operation)
}
