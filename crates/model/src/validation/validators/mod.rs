//! Built-in validators
//!
//! Validators are split in two tiers. Critical validators check that the
//! shape graph is structurally sound: IDs are unique, targets resolve and
//! trait values fit their definitions. Any ERROR from them stops the load
//! before the semantic validators run, since the latter assume a sound graph.

mod arn;
mod constraint;
mod default_trait;
mod enum_shape;
mod http;
mod http_checksum;
mod operation;
mod private_access;
mod recursion;
mod resource_identifier;
mod resource_lifecycle;
mod resource_properties;
mod service;
mod shape_id_conflict;
mod streaming;
mod tagging;
mod target;
mod trait_conflict;
mod trait_target;
mod trait_value;
mod unknown_trait;

pub use arn::ArnTemplateValidator;
pub use constraint::{LengthTraitValidator, PatternTraitValidator, RangeTraitValidator};
pub use default_trait::DefaultTraitValidator;
pub use enum_shape::EnumShapeValidator;
pub use http::{HttpBindingsValidator, HttpLabelValidator, HttpUriConflictValidator};
pub use http_checksum::HttpChecksumTraitValidator;
pub use operation::OperationValidator;
pub use private_access::PrivateAccessValidator;
pub use recursion::ShapeRecursionValidator;
pub use resource_identifier::{ResourceIdentifierBindingValidator, ResourceIdentifierValidator};
pub use resource_lifecycle::ResourceLifecycleValidator;
pub use resource_properties::ResourceOperationInputOutputValidator;
pub use service::ServiceValidator;
pub use shape_id_conflict::ShapeIdConflictValidator;
pub use streaming::StreamingTraitValidator;
pub use tagging::{TagEnabledServiceValidator, TaggableResourceValidator};
pub use target::TargetValidator;
pub use trait_conflict::{StructurallyExclusiveValidator, TraitConflictValidator};
pub use trait_target::TraitTargetValidator;
pub use trait_value::TraitValueValidator;
pub use unknown_trait::UnknownTraitValidator;

use super::Validator;

/// Structural checks that gate semantic validation
pub fn critical_validators(allow_unknown_traits: bool) -> Vec<Box<dyn Validator>> {
    vec![
        Box::new(ShapeIdConflictValidator),
        Box::new(TargetValidator),
        Box::new(TraitTargetValidator),
        Box::new(TraitValueValidator),
        Box::new(UnknownTraitValidator::new(allow_unknown_traits)),
    ]
}

/// Every semantic validator, in the order their events are reported
pub fn semantic_validators() -> Vec<Box<dyn Validator>> {
    vec![
        Box::new(TraitConflictValidator),
        Box::new(StructurallyExclusiveValidator),
        Box::new(DefaultTraitValidator),
        Box::new(EnumShapeValidator),
        Box::new(LengthTraitValidator),
        Box::new(RangeTraitValidator),
        Box::new(PatternTraitValidator),
        Box::new(PrivateAccessValidator),
        Box::new(ShapeRecursionValidator),
        Box::new(ServiceValidator),
        Box::new(OperationValidator),
        Box::new(ResourceIdentifierValidator),
        Box::new(ResourceIdentifierBindingValidator),
        Box::new(ResourceLifecycleValidator),
        Box::new(ResourceOperationInputOutputValidator),
        Box::new(ArnTemplateValidator),
        Box::new(HttpBindingsValidator),
        Box::new(HttpLabelValidator),
        Box::new(HttpUriConflictValidator),
        Box::new(HttpChecksumTraitValidator),
        Box::new(StreamingTraitValidator),
        Box::new(TaggableResourceValidator),
        Box::new(TagEnabledServiceValidator),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_validator_names_are_unique() {
        let validators: Vec<_> = critical_validators(false)
            .into_iter()
            .chain(semantic_validators())
            .collect();
        let names: BTreeSet<&str> = validators.iter().map(|v| v.name()).collect();
        assert_eq!(names.len(), validators.len());
    }
}
