//! Trait combinations forbidden by trait definitions

use crate::shapes::Model;
use crate::traits::StructurallyExclusive;
use crate::validation::Validator;
use smithy_semantic_common::ValidationEvent;

/// Traits listed in each other's `conflicts`
pub struct TraitConflictValidator;

impl Validator for TraitConflictValidator {
    fn name(&self) -> &str {
        "TraitConflict"
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let registry = model.trait_registry();
        let mut events = Vec::new();

        for shape in model.shapes() {
            for applied in shape.traits.values() {
                let Some(descriptor) = registry.get(&applied.id.to_string()) else {
                    continue;
                };
                let conflicting: Vec<String> = descriptor
                    .conflicts
                    .iter()
                    .filter(|c| shape.has_trait(&c.to_string()))
                    .map(|c| format!("`{c}`"))
                    .collect();
                if conflicting.is_empty() {
                    continue;
                }
                events.push(
                    ValidationEvent::error(
                        self.name(),
                        format!(
                            "Found the `{}` trait applied to this shape, but it conflicts with the \
                             following traits: {}",
                            applied.id,
                            conflicting.join(", ")
                        ),
                    )
                    .with_shape(&shape.id)
                    .with_trait(&applied.id)
                    .with_source(&applied.source),
                );
            }
        }
        events
    }
}

/// Traits that may appear on, or be targeted by, only one member of a shape
pub struct StructurallyExclusiveValidator;

impl Validator for StructurallyExclusiveValidator {
    fn name(&self) -> &str {
        "StructurallyExclusiveTrait"
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let exclusive: Vec<_> = model
            .trait_registry()
            .descriptors()
            .filter_map(|d| d.structurally_exclusive.map(|kind| (d.id.to_string(), kind)))
            .collect();
        if exclusive.is_empty() {
            return Vec::new();
        }

        let mut events = Vec::new();
        for shape in model.shapes().filter(|s| !s.members.is_empty() && !s.is_member()) {
            for (trait_id, kind) in &exclusive {
                let found: Vec<String> = model
                    .members(shape)
                    .filter(|member| match kind {
                        StructurallyExclusive::Member => member.has_trait(trait_id),
                        StructurallyExclusive::Target => model
                            .target_of(member)
                            .is_some_and(|target| target.has_trait(trait_id)),
                    })
                    .map(|member| format!("`{}`", member.member_name().unwrap_or_default()))
                    .collect();
                if found.len() < 2 {
                    continue;
                }
                let message = match kind {
                    StructurallyExclusive::Member => format!(
                        "The `{trait_id}` trait can be applied to only a single member of a shape, \
                         but it was found on the following members: {}",
                        found.join(", ")
                    ),
                    StructurallyExclusive::Target => format!(
                        "Only a single member of a shape can target a shape marked with the \
                         `{trait_id}` trait, but it was found on the following members: {}",
                        found.join(", ")
                    ),
                };
                events.push(
                    ValidationEvent::error(self.name(), message)
                        .with_shape(&shape.id)
                        .with_source(&shape.source),
                );
            }
        }
        events
    }
}
