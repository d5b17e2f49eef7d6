//! Model assembly
//!
//! [`ModelAssembler`] combines independently loaded fragments into one
//! [`Model`] and validates it:
//!
//! 1. Built-in prelude fragments are added ahead of user fragments.
//! 2. Metadata, shape definitions and trait applications are merged
//!    (`merge`); conflicts are collected, never fail-fast.
//! 3. Mixins are applied and elided member targets resolved (`mixin`).
//! 4. Structural validators run; any ERROR stops the build.
//! 5. Semantic validators run, then suppressions are applied.
//!
//! Any ERROR remaining at the end fails the build with every event of the
//! run; otherwise the frozen model is returned with its events.

mod merge;
mod mixin;

use crate::config::AssemblerConfig;
use crate::error::{ModelError, Result};
use crate::shapes::{Model, Shape, Trait};
use crate::traits::{builtin_fragments, ids, MODEL_EVENT};
use crate::validation::validators::{critical_validators, semantic_validators};
use crate::validation::{
    apply_suppressions, ValidatedModel, Validator, ValidatorDefinition, ValidatorRunner,
    DEFINITION_EVENT,
};
use merge::Merger;
use smithy_semantic_common::{Fragment, Node, ShapeId, ShapeType, ValidationEvent};
use std::collections::BTreeMap;
use std::time::Instant;

/// Builds a validated [`Model`] from fragments
///
/// # Examples
/// ```
/// use smithy_semantic_model::ModelAssembler;
///
/// let mut assembler = ModelAssembler::new();
/// assembler
///     .add_json(
///         r#"{
///             "smithy": "2.0",
///             "shapes": {
///                 "example.weather#CityId": {
///                     "type": "string",
///                     "traits": { "smithy.api#pattern": "^[A-Za-z0-9 ]+$" }
///                 }
///             }
///         }"#,
///         "weather.json",
///     )
///     .unwrap();
/// let model = assembler.assemble().unwrap().into_model();
/// let patterned: Vec<_> = model
///     .shapes_with_trait("smithy.api#pattern")
///     .filter(|shape| !model.is_builtin(&shape.id))
///     .map(|shape| shape.id.to_string())
///     .collect();
/// assert_eq!(patterned, vec!["example.weather#CityId"]);
/// ```
#[derive(Default)]
pub struct ModelAssembler {
    config: AssemblerConfig,
    fragments: Vec<Fragment>,
    validators: Vec<Box<dyn Validator>>,
}

impl ModelAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AssemblerConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Add a fragment; fragments are merged in the order they are added
    pub fn add_fragment(&mut self, fragment: Fragment) -> &mut Self {
        self.fragments.push(fragment);
        self
    }

    /// Parse a JSON AST document and add it as a fragment
    pub fn add_json(&mut self, json: &str, name: &str) -> Result<&mut Self> {
        let fragment = smithy_semantic_parser::parse_fragment(json, name)?;
        Ok(self.add_fragment(fragment))
    }

    /// Run a custom validator after the built-in semantic validators
    pub fn add_validator(&mut self, validator: Box<dyn Validator>) -> &mut Self {
        self.validators.push(validator);
        self
    }

    /// Merge, resolve and validate every added fragment
    ///
    /// # Errors
    /// Returns [`ModelError::Invalid`] with every event of the run when any
    /// ERROR is found, and [`ModelError::Semantic`] if a built-in fragment
    /// cannot be loaded.
    pub fn assemble(self) -> Result<ValidatedModel> {
        let started = Instant::now();
        let ModelAssembler {
            config,
            fragments,
            validators,
        } = self;

        let mut merger = Merger::default();
        if !config.disable_prelude {
            for fragment in builtin_fragments()? {
                merger.add(fragment);
            }
        }
        let fragment_count = fragments.len();
        for fragment in fragments {
            merger.add(fragment);
        }

        let merge::Merged {
            stubs,
            mut traits,
            metadata,
            builtin,
            mut events,
        } = merger.finish();

        let mut shapes = mixin::resolve(&stubs, &mut traits, &mut events);
        report_unattached_traits(traits, &mut events);
        synthesize_enum_values(&mut shapes);

        let mut model = Model::new(shapes.into_values(), metadata);
        model.builtin = builtin;

        tracing::info!(
            fragments = fragment_count,
            shapes = model.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Assembled model"
        );

        if events.iter().any(ValidationEvent::is_error) {
            return Err(ModelError::Invalid { events });
        }

        events.extend(
            ValidatorRunner::new(critical_validators(config.allow_unknown_traits))
                .parallel(config.parallel_validation)
                .run(&model),
        );
        if events.iter().any(ValidationEvent::is_error) {
            return Err(ModelError::Invalid { events });
        }

        if !config.disable_validation {
            let mut semantic = semantic_validators();
            semantic.extend(defined_validators(&model, &config, &mut events));
            semantic.extend(validators);
            events.extend(
                ValidatorRunner::new(semantic)
                    .parallel(config.parallel_validation)
                    .run(&model),
            );
        }

        let events = apply_suppressions(&model, events, &config.suppressions);
        if events.iter().any(ValidationEvent::is_error) {
            return Err(ModelError::Invalid { events });
        }
        Ok(ValidatedModel::new(model, events))
    }
}

/// Validators declared in configuration, then in `validators` metadata
fn defined_validators(
    model: &Model,
    config: &AssemblerConfig,
    events: &mut Vec<ValidationEvent>,
) -> Vec<Box<dyn Validator>> {
    let mut definitions = config.validators.clone();
    match model.get_metadata("validators") {
        None => {}
        Some(Node::Array(entries)) => {
            for entry in entries {
                match ValidatorDefinition::from_node(entry) {
                    Ok(definition) => definitions.push(definition),
                    Err(message) => events.push(ValidationEvent::error(
                        DEFINITION_EVENT,
                        format!("Invalid validator definition in metadata: {message}"),
                    )),
                }
            }
        }
        Some(other) => events.push(ValidationEvent::error(
            DEFINITION_EVENT,
            format!(
                "Expected `validators` metadata to be an array, found {}",
                other.type_name()
            ),
        )),
    }

    definitions
        .iter()
        .filter_map(|definition| match definition.build() {
            Ok(validator) => Some(validator),
            Err(event) => {
                events.push(event);
                None
            }
        })
        .collect()
}

fn report_unattached_traits(traits: merge::LocalTraits, events: &mut Vec<ValidationEvent>) {
    for (target, applied) in traits {
        for value in applied.into_values() {
            events.push(
                ValidationEvent::error(
                    MODEL_EVENT,
                    format!(
                        "Trait `{}` applied to shape `{target}`, but that shape does not exist",
                        value.id
                    ),
                )
                .with_shape(&target)
                .with_trait(&value.id)
                .with_source(&value.source),
            );
        }
    }
}

/// String enum members without `enumValue` take their member name
fn synthesize_enum_values(shapes: &mut BTreeMap<ShapeId, Shape>) {
    let members: Vec<ShapeId> = shapes
        .values()
        .filter(|s| s.shape_type == ShapeType::Enum)
        .flat_map(|s| s.members.values().cloned())
        .collect();
    for id in members {
        let Some(member) = shapes.get_mut(&id) else {
            continue;
        };
        if member.has_trait(ids::ENUM_VALUE) {
            continue;
        }
        let value = Node::from(member.member_name().unwrap_or_default());
        member.add_trait(Trait::new(ShapeId::prelude("enumValue"), value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::MockValidator;
    use smithy_semantic_common::{Severity, ShapeStub, TraitApplication};

    fn id(value: &str) -> ShapeId {
        ShapeId::parse(value).unwrap()
    }

    fn structure_fragment(name: &str) -> Fragment {
        let mut fragment = Fragment::new(name);
        fragment.add_shape(
            ShapeStub::new(id("ns.foo#Thing"), ShapeType::Structure)
                .with_member("name", ShapeId::prelude("String")),
        );
        fragment
    }

    #[test]
    fn test_assemble_with_prelude() {
        let mut assembler = ModelAssembler::new();
        assembler.add_fragment(structure_fragment("a.json"));
        let validated = assembler.assemble().unwrap();
        let model = validated.model();

        assert!(model.contains_shape(&id("ns.foo#Thing$name")));
        assert!(model.is_builtin(&ShapeId::prelude("String")));
        assert!(!model.is_builtin(&id("ns.foo#Thing")));
    }

    #[test]
    fn test_builtin_shapes_are_distinguishable() {
        let mut fragment = Fragment::new("a.json");
        fragment.add_shape(ShapeStub::new(id("ns.foo#Id"), ShapeType::String));
        fragment.add_trait(TraitApplication::new(
            id("ns.foo#Id"),
            ShapeId::prelude("pattern"),
            Node::from("^[a-z]+$"),
        ));
        let mut assembler = ModelAssembler::new();
        assembler.add_fragment(fragment);
        let model = assembler.assemble().unwrap().into_model();

        let (builtin, user): (Vec<_>, Vec<_>) = model
            .shapes_with_trait("smithy.api#pattern")
            .map(|shape| shape.id.clone())
            .partition(|id| model.is_builtin(id));
        assert!(builtin.contains(&id("aws.api#ArnNamespace")));
        assert_eq!(user, vec![id("ns.foo#Id")]);
    }

    #[test]
    fn test_trait_on_missing_shape() {
        let mut fragment = structure_fragment("a.json");
        fragment.add_trait(TraitApplication::new(
            id("ns.foo#Thing$missing"),
            ShapeId::prelude("required"),
            Node::empty_object(),
        ));
        let mut assembler = ModelAssembler::new();
        assembler.add_fragment(fragment);

        let err = assembler.assemble().unwrap_err();
        let errors: Vec<_> = err.events().iter().filter(|e| e.is_error()).collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].shape_id, Some(id("ns.foo#Thing$missing")));
    }

    #[test]
    fn test_enum_values_are_synthesized() {
        let mut fragment = Fragment::new("enum.json");
        fragment.add_shape(
            ShapeStub::new(id("ns.foo#Color"), ShapeType::Enum)
                .with_member("RED", ShapeId::prelude("Unit"))
                .with_member("GREEN", ShapeId::prelude("Unit")),
        );
        fragment.add_trait(TraitApplication::new(
            id("ns.foo#Color$GREEN"),
            ShapeId::prelude("enumValue"),
            Node::from("green"),
        ));
        let mut assembler = ModelAssembler::new();
        assembler.add_fragment(fragment);
        let validated = assembler.assemble().unwrap();
        let model = validated.model();

        assert_eq!(
            model.get_trait(&id("ns.foo#Color$RED"), ids::ENUM_VALUE).map(|t| &t.value),
            Some(&Node::from("RED"))
        );
        assert_eq!(
            model.get_trait(&id("ns.foo#Color$GREEN"), ids::ENUM_VALUE).map(|t| &t.value),
            Some(&Node::from("green"))
        );
    }

    #[test]
    fn test_custom_validator_runs_once() {
        let mut validator = MockValidator::new();
        validator.expect_name().return_const("Custom".to_string());
        validator
            .expect_validate()
            .times(1)
            .returning(|_| vec![ValidationEvent::warning("Custom", "custom finding")]);

        let mut assembler = ModelAssembler::new();
        assembler.add_fragment(structure_fragment("a.json")).add_validator(Box::new(validator));
        let validated = assembler.assemble().unwrap();

        let custom: Vec<_> = validated.events_with_id("Custom").collect();
        assert_eq!(custom.len(), 1);
        assert_eq!(custom[0].severity, Severity::Warning);
    }

    #[test]
    fn test_disable_validation_skips_custom_validators() {
        let mut validator = MockValidator::new();
        validator.expect_name().return_const("Custom".to_string());
        validator.expect_validate().times(0);

        let mut assembler = ModelAssembler::with_config(AssemblerConfig {
            disable_validation: true,
            ..Default::default()
        });
        assembler.add_fragment(structure_fragment("a.json")).add_validator(Box::new(validator));
        assert!(assembler.assemble().is_ok());
    }

    #[test]
    fn test_invalid_metadata_validator() {
        let mut fragment = structure_fragment("a.json");
        fragment.add_metadata(
            "validators",
            Node::Array(vec![Node::object([("name", Node::from("NoSuchValidator"))])]),
        );
        let mut assembler = ModelAssembler::new();
        assembler.add_fragment(fragment);

        let err = assembler.assemble().unwrap_err();
        assert!(err
            .events()
            .iter()
            .any(|e| e.is_error() && e.message.contains("Unknown validator `NoSuchValidator`")));
    }
}
