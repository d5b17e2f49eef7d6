//! Trait definitions, built-in shapes and trait value handling
//!
//! A trait is any shape carrying `smithy.api#trait`. Its definition says
//! which shapes it may be applied to (a selector), which other traits it
//! cannot be combined with, and whether it is structurally exclusive. The
//! shape itself describes the values the trait accepts, and
//! [`NodeValidator`] checks applied values against it.

pub mod ids;
mod merge;
mod node_validator;
mod prelude;
mod registry;

pub use merge::{merge_metadata, merge_trait, MODEL_EVENT};
pub use node_validator::NodeValidator;
pub use prelude::{aws_fragment, builtin_fragments, prelude_fragment};
pub use registry::{
    is_trait_definition, trait_shape_id, StructurallyExclusive, TraitDescriptor, TraitRegistry,
};
