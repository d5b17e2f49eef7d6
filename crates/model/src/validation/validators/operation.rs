//! Use of `@input` and `@output` structures by operations

use crate::knowledge::RelationshipType;
use crate::shapes::{Model, Shape};
use crate::traits::ids;
use crate::validation::Validator;
use smithy_semantic_common::{ShapeId, ShapeType, ValidationEvent};
use std::collections::BTreeSet;

const MISUSE: &str = "OperationInputOutputMisuse";
const NAME: &str = "OperationInputOutputName";
const MISSING_INPUT_TRAIT: &str = "OperationMissingInputTrait";
const MISSING_OUTPUT_TRAIT: &str = "OperationMissingOutputTrait";
const AMBIGUITY: &str = "OperationNameAmbiguity";

const INPUT_SUFFIXES: [&str; 2] = ["Input", "Request"];
const OUTPUT_SUFFIXES: [&str; 2] = ["Output", "Response"];

pub struct OperationValidator;

impl Validator for OperationValidator {
    fn name(&self) -> &str {
        "Operation"
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        check_dedicated(model, Slot::Input, &mut events);
        check_dedicated(model, Slot::Output, &mut events);

        for operation in model.shapes_of_type(ShapeType::Operation) {
            let Some(props) = operation.properties.as_operation() else {
                continue;
            };
            check_marked(model, operation, props.input.as_ref(), Slot::Input, &mut events);
            check_marked(model, operation, props.output.as_ref(), Slot::Output, &mut events);
            check_ambiguity(model, operation, props.input.as_ref(), Slot::Input, &mut events);
            check_ambiguity(model, operation, props.output.as_ref(), Slot::Output, &mut events);
        }
        events
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Slot {
    Input,
    Output,
}

impl Slot {
    fn label(self) -> &'static str {
        match self {
            Slot::Input => "input",
            Slot::Output => "output",
        }
    }

    fn trait_id(self) -> &'static str {
        match self {
            Slot::Input => ids::INPUT,
            Slot::Output => ids::OUTPUT,
        }
    }

    fn relationship(self) -> RelationshipType {
        match self {
            Slot::Input => RelationshipType::Input,
            Slot::Output => RelationshipType::Output,
        }
    }

    fn opposite(self) -> Slot {
        match self {
            Slot::Input => Slot::Output,
            Slot::Output => Slot::Input,
        }
    }

    fn suffixes(self) -> [&'static str; 2] {
        match self {
            Slot::Input => INPUT_SUFFIXES,
            Slot::Output => OUTPUT_SUFFIXES,
        }
    }
}

/// Structures marked `@input` or `@output` belong to exactly one operation
fn check_dedicated(model: &Model, slot: Slot, events: &mut Vec<ValidationEvent>) {
    let neighbors = model.neighbor_index();
    let label = slot.label();

    for shape in model.shapes_with_trait(slot.trait_id()) {
        let mut operations = BTreeSet::new();

        for rel in neighbors.reverse_neighbors(&shape.id) {
            if rel.kind == slot.relationship() {
                operations.insert(&rel.shape);
                if !shape.id.name().starts_with(rel.shape.name()) {
                    events.push(
                        ValidationEvent::warning(
                            NAME,
                            format!(
                                "The {label} of this operation should target a shape that starts \
                                 with the operation's name, `{}`, but the targeted shape is `{}`",
                                rel.shape.name(),
                                shape.id
                            ),
                        )
                        .with_shape(&rel.shape),
                    );
                }
            } else if rel.kind == slot.opposite().relationship() {
                events.push(
                    ValidationEvent::error(
                        MISUSE,
                        format!(
                            "Operation {} cannot target structures marked with the @{label} trait: \
                             `{}`",
                            slot.opposite().label(),
                            shape.id
                        ),
                    )
                    .with_shape(&rel.shape),
                );
            } else if rel.kind == RelationshipType::MemberTarget {
                events.push(
                    ValidationEvent::error(
                        MISUSE,
                        format!(
                            "Members cannot target structures marked with the @{label} trait: `{}`",
                            shape.id
                        ),
                    )
                    .with_shape(&rel.shape),
                );
            }
        }

        if operations.len() > 1 {
            let used_by: Vec<String> = operations.iter().map(|id| format!("`{id}`")).collect();
            events.push(
                ValidationEvent::error(
                    MISUSE,
                    format!(
                        "Shapes marked with the @{label} trait cannot be used as {label} by \
                         multiple operations: {}",
                        used_by.join(", ")
                    ),
                )
                .with_shape(&shape.id)
                .with_source(&shape.source),
            );
        }
    }
}

/// Operation input and output structures should carry the matching trait
fn check_marked(
    model: &Model,
    operation: &Shape,
    target: Option<&ShapeId>,
    slot: Slot,
    events: &mut Vec<ValidationEvent>,
) {
    let Some(structure) = target.and_then(|id| model.get_shape(id)) else {
        return;
    };
    if structure.has_trait(ids::UNIT_TYPE) || structure.has_trait(slot.trait_id()) {
        return;
    }
    let (id, message) = match slot {
        Slot::Input => (
            MISSING_INPUT_TRAIT,
            format!(
                "This structure is the input of `{}`, but it is not marked with the @input trait. \
                 The @input trait gives operations more flexibility to evolve their top-level \
                 input members in ways that would otherwise be backward incompatible.",
                operation.id
            ),
        ),
        Slot::Output => (
            MISSING_OUTPUT_TRAIT,
            format!(
                "This structure is the output of `{}`, but it is not marked with the @output \
                 trait.",
                operation.id
            ),
        ),
    };
    events.push(
        ValidationEvent::warning(id, message)
            .with_shape(&structure.id)
            .with_source(&structure.source),
    );
}

/// Shapes named like an operation's input or output that it does not use
fn check_ambiguity(
    model: &Model,
    operation: &Shape,
    used: Option<&ShapeId>,
    slot: Slot,
    events: &mut Vec<ValidationEvent>,
) {
    let label = slot.label();
    let used = used.map(ToString::to_string).unwrap_or_else(|| "smithy.api#Unit".to_string());

    for suffix in slot.suffixes() {
        let Ok(candidate) = ShapeId::parse(&format!("{}{suffix}", operation.id)) else {
            continue;
        };
        if candidate.to_string() == used {
            continue;
        }
        let Some(ambiguous) = model.get_shape(&candidate) else {
            continue;
        };
        events.push(
            ValidationEvent::warning(
                AMBIGUITY,
                format!(
                    "The name of this shape implies that it is the {label} of `{}`, but that \
                     operation uses `{used}` for {label}. This kind of ambiguity can confuse \
                     developers calling this operation and can cause issues in code generators \
                     that use similar naming conventions to generate {label} types.",
                    operation.id
                ),
            )
            .with_shape(&ambiguous.id)
            .with_source(&ambiguous.source),
        );
    }
}
