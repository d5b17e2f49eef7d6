//! Knowledge indices
//!
//! Indices are derived, read-only views over a resolved [`Model`]. Each one
//! is a plain value built by a pure function of the model, computed at most
//! once on first access and cached on the model until it is dropped.

mod arn;
mod http_binding;
mod identifier_binding;
mod neighbor;
mod nullable;
mod operation;
mod property_binding;
pub(crate) mod tags;
mod top_down;

pub use arn::{ArnIndex, ArnTemplate, EffectiveArn};
pub use http_binding::{
    has_http_request_binding, HttpBinding, HttpBindingIndex, HttpLocation, HttpRoute, UriPattern,
    UriSegment,
};
pub use identifier_binding::{BindingType, IdentifierBindingIndex, OperationBinding};
pub use neighbor::{NeighborIndex, Relationship, RelationshipType};
pub use nullable::{resolve_optionality, CheckMode, MemberFacts, NullableIndex, Optionality};
pub use operation::OperationIndex;
pub use property_binding::{OperationPropertyBindings, PropertyBinding, PropertyBindingIndex};
pub use tags::{TagIndex, TaggableResourceInfo};
pub use top_down::TopDownIndex;

use crate::shapes::Model;
use crate::traits::TraitRegistry;
use std::sync::OnceLock;

/// Lazily computed indices owned by a model
#[derive(Debug, Default)]
pub(crate) struct KnowledgeCache {
    neighbors: OnceLock<NeighborIndex>,
    top_down: OnceLock<TopDownIndex>,
    operations: OnceLock<OperationIndex>,
    identifier_bindings: OnceLock<IdentifierBindingIndex>,
    property_bindings: OnceLock<PropertyBindingIndex>,
    http_bindings: OnceLock<HttpBindingIndex>,
    arns: OnceLock<ArnIndex>,
    tags: OnceLock<TagIndex>,
    traits: OnceLock<TraitRegistry>,
}

impl Model {
    pub fn neighbor_index(&self) -> &NeighborIndex {
        self.knowledge.neighbors.get_or_init(|| NeighborIndex::new(self))
    }

    pub fn top_down_index(&self) -> &TopDownIndex {
        self.knowledge.top_down.get_or_init(|| TopDownIndex::new(self))
    }

    pub fn operation_index(&self) -> &OperationIndex {
        self.knowledge.operations.get_or_init(|| OperationIndex::new(self))
    }

    pub fn identifier_binding_index(&self) -> &IdentifierBindingIndex {
        self.knowledge
            .identifier_bindings
            .get_or_init(|| IdentifierBindingIndex::new(self))
    }

    pub fn property_binding_index(&self) -> &PropertyBindingIndex {
        self.knowledge
            .property_bindings
            .get_or_init(|| PropertyBindingIndex::new(self))
    }

    pub fn http_binding_index(&self) -> &HttpBindingIndex {
        self.knowledge.http_bindings.get_or_init(|| HttpBindingIndex::new(self))
    }

    pub fn arn_index(&self) -> &ArnIndex {
        self.knowledge.arns.get_or_init(|| ArnIndex::new(self))
    }

    pub fn tag_index(&self) -> &TagIndex {
        self.knowledge.tags.get_or_init(|| TagIndex::new(self))
    }

    /// Trait definitions found in the model
    pub fn trait_registry(&self) -> &TraitRegistry {
        self.knowledge.traits.get_or_init(|| TraitRegistry::new(self))
    }

    /// Optionality view; holds no state of its own
    pub fn nullable_index(&self) -> NullableIndex<'_> {
        NullableIndex::new(self)
    }
}
