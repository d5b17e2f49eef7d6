//! The shape graph
//!
//! Shapes are stored in an arena keyed by [`ShapeId`]; every relationship
//! (member targets, mixins, resource and service bindings) is an ID resolved
//! through the owning [`Model`].
//!
//! [`ShapeId`]: smithy_semantic_common::ShapeId

mod model;
mod shape;

pub use model::Model;
pub use shape::{Shape, Trait};
