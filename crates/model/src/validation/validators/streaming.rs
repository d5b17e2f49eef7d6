//! Placement of `@streaming` blobs and event stream unions
//!
//! A structure that contains a stream can only be the input or output of an
//! operation, or a mixin of such structures. Members of an event stream
//! union must target structures, and in HTTP operations a streaming member
//! has to be bound to the payload.

use crate::knowledge::RelationshipType;
use crate::shapes::{Model, Shape};
use crate::traits::ids;
use crate::validation::Validator;
use smithy_semantic_common::{ShapeId, ShapeType, ValidationEvent};
use std::collections::BTreeSet;

pub struct StreamingTraitValidator;

impl Validator for StreamingTraitValidator {
    fn name(&self) -> &str {
        "StreamingTrait"
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        if model.shapes_with_trait(ids::STREAMING).next().is_none() {
            return Vec::new();
        }

        let mut events = Vec::new();
        self.check_containers(model, &mut events);
        self.check_event_streams(model, &mut events);
        self.check_http_payloads(model, &mut events);
        events
    }
}

impl StreamingTraitValidator {
    fn error(&self, shape: &Shape, message: String) -> ValidationEvent {
        ValidationEvent::error(self.name(), message)
            .with_shape(&shape.id)
            .with_source(&shape.source)
    }

    fn check_containers(&self, model: &Model, events: &mut Vec<ValidationEvent>) {
        let neighbors = model.neighbor_index();
        let containers: BTreeSet<ShapeId> = model
            .shapes()
            .filter(|s| s.is_member() && targets_stream(model, s))
            .filter_map(Shape::container)
            .collect();

        for container in &containers {
            for rel in neighbors.reverse_neighbors(container) {
                if !rel.kind.is_directed()
                    || matches!(rel.kind, RelationshipType::Input | RelationshipType::Output)
                    || (rel.kind == RelationshipType::Mixin
                        && is_input_output_only(model, &rel.shape))
                {
                    continue;
                }
                let Some(referrer) = model.get_shape(&rel.shape) else {
                    continue;
                };
                events.push(self.error(
                    referrer,
                    format!(
                        "This shape has an invalid `{}` relationship to a structure, \
                         `{container}`, that contains a stream",
                        relationship_name(rel.kind)
                    ),
                ));
            }
        }
    }

    fn check_event_streams(&self, model: &Model, events: &mut Vec<ValidationEvent>) {
        for union in model
            .shapes_with_trait(ids::STREAMING)
            .filter(|s| s.shape_type == ShapeType::Union)
        {
            let invalid: Vec<&str> = model
                .members(union)
                .filter(|m| {
                    model
                        .target_of(m)
                        .is_some_and(|t| t.shape_type != ShapeType::Structure)
                })
                .filter_map(Shape::member_name)
                .collect();
            if !invalid.is_empty() {
                events.push(self.error(
                    union,
                    format!(
                        "Each member of an event stream union must target a structure shape, but \
                         the following union members do not: [{}]",
                        invalid.join(", ")
                    ),
                ));
            }
        }
    }

    /// HTTP operations carry a stream only as the payload
    fn check_http_payloads(&self, model: &Model, events: &mut Vec<ValidationEvent>) {
        let operations = model.operation_index();

        for operation in model
            .shapes_of_type(ShapeType::Operation)
            .filter(|s| s.has_trait(ids::HTTP))
        {
            let members = operations
                .input_members(model, &operation.id)
                .into_iter()
                .chain(operations.output_members(model, &operation.id));
            for member in members {
                if member.has_trait(ids::HTTP_PAYLOAD) || !targets_stream(model, member) {
                    continue;
                }
                events.push(self.error(
                    member,
                    format!(
                        "Member `{}` referencing @streaming shape `{}` must have the @httpPayload \
                         trait, as operation `{}` is bound to HTTP",
                        member.id,
                        member.target.as_ref().map(ToString::to_string).unwrap_or_default(),
                        operation.id
                    ),
                ));
            }
        }
    }
}

fn targets_stream(model: &Model, member: &Shape) -> bool {
    member.has_trait(ids::STREAMING)
        || model
            .target_of(member)
            .is_some_and(|t| t.has_trait(ids::STREAMING))
}

/// Whether a structure is used as operation input or output and nothing else
fn is_input_output_only(model: &Model, id: &ShapeId) -> bool {
    let mut found = false;
    for rel in model.neighbor_index().reverse_neighbors(id) {
        match rel.kind {
            RelationshipType::Input | RelationshipType::Output => found = true,
            kind if !kind.is_directed() => {}
            _ => return false,
        }
    }
    found
}

fn relationship_name(kind: RelationshipType) -> &'static str {
    kind.selector_label().unwrap_or("member_target")
}
