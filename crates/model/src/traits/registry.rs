//! Trait definitions discovered in a model

use super::ids;
use crate::selector::{Selector, SelectorSyntaxError};
use crate::shapes::{Model, Shape};
use smithy_semantic_common::{Node, ShapeId, ShapeType, PRELUDE_NAMESPACE};
use std::collections::BTreeMap;

/// Which shapes a structurally exclusive trait is unique among
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructurallyExclusive {
    /// Only one member of a structure may carry the trait
    Member,
    /// Only one member of a structure may target a shape with the trait
    Target,
}

/// Everything the engine needs to know to apply and validate a trait
#[derive(Debug, Clone)]
pub struct TraitDescriptor {
    pub id: ShapeId,
    /// Type of the trait shape, which is the type of its values
    pub shape_type: ShapeType,
    pub selector: Selector,
    pub structurally_exclusive: Option<StructurallyExclusive>,
    pub conflicts: Vec<ShapeId>,
}

impl TraitDescriptor {
    /// List-shaped traits concatenate on conflict instead of failing
    pub fn is_list(&self) -> bool {
        self.shape_type == ShapeType::List
    }

    pub fn is_annotation(&self) -> bool {
        self.shape_type == ShapeType::Structure
    }
}

/// Map from trait shape ID to its descriptor
#[derive(Debug, Default)]
pub struct TraitRegistry {
    descriptors: BTreeMap<String, TraitDescriptor>,
    invalid_selectors: BTreeMap<ShapeId, SelectorSyntaxError>,
}

impl TraitRegistry {
    pub fn new(model: &Model) -> Self {
        let mut registry = TraitRegistry::default();

        for shape in model.shapes_with_trait(ids::TRAIT) {
            let Some(definition) = shape.trait_value(ids::TRAIT) else {
                continue;
            };
            let selector = match definition.get("selector").and_then(Node::as_str) {
                Some(text) => match Selector::parse(text) {
                    Ok(selector) => selector,
                    Err(err) => {
                        registry.invalid_selectors.insert(shape.id.clone(), err);
                        Selector::any()
                    }
                },
                None => Selector::any(),
            };
            let structurally_exclusive = match definition
                .get("structurallyExclusive")
                .and_then(Node::as_str)
            {
                Some("member") => Some(StructurallyExclusive::Member),
                Some("target") => Some(StructurallyExclusive::Target),
                _ => None,
            };
            let conflicts = definition
                .get("conflicts")
                .and_then(Node::as_array)
                .unwrap_or_default()
                .iter()
                .filter_map(Node::as_str)
                .filter_map(|s| ShapeId::from_relative(s, shape.id.namespace()).ok())
                .collect();

            registry.descriptors.insert(
                shape.id.to_string(),
                TraitDescriptor {
                    id: shape.id.clone(),
                    shape_type: shape.shape_type,
                    selector,
                    structurally_exclusive,
                    conflicts,
                },
            );
        }

        tracing::debug!(traits = registry.descriptors.len(), "Built trait registry");
        registry
    }

    pub fn get(&self, trait_id: &str) -> Option<&TraitDescriptor> {
        self.descriptors.get(trait_id)
    }

    pub fn contains(&self, trait_id: &str) -> bool {
        self.descriptors.contains_key(trait_id)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &TraitDescriptor> {
        self.descriptors.values()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Trait definitions whose selector failed to compile
    pub fn invalid_selectors(&self) -> impl Iterator<Item = (&ShapeId, &SelectorSyntaxError)> {
        self.invalid_selectors.iter()
    }
}

/// Whether a shape is a trait definition
pub fn is_trait_definition(shape: &Shape) -> bool {
    shape.has_trait(ids::TRAIT)
}

/// Resolve a trait name written relative to the prelude
pub fn trait_shape_id(name: &str) -> Option<ShapeId> {
    ShapeId::from_relative(name, PRELUDE_NAMESPACE).ok()
}
