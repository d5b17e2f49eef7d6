//! Common types and utilities for the Smithy semantic engine
//!
//! This crate contains the foundational data structures shared by the JSON AST
//! reader and the semantic model: shape IDs, node values, shape types, model
//! fragments and validation events.

mod event;
mod fragment;
mod node;
mod shape_id;
mod shape_type;
mod source;

pub use event::{Severity, ValidationEvent};
pub use fragment::{
    Fragment, MemberStub, OperationProperties, ResourceProperties, ServiceProperties,
    ShapeProperties, ShapeStub, TraitApplication,
};
pub use node::{Node, Number};
pub use shape_id::{is_valid_identifier, ShapeId, PRELUDE_NAMESPACE};
pub use shape_type::{ShapeCategory, ShapeType};
pub use source::SourceLocation;

use thiserror::Error;

/// Errors raised by the foundational types
#[derive(Error, Debug)]
pub enum SemanticError {
    #[error("Invalid shape ID `{0}`: {1}")]
    InvalidShapeId(String, String),

    #[error("Expected {expected} node, found {found}")]
    NodeType {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for foundational operations
pub type Result<T> = std::result::Result<T, SemanticError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SemanticError::InvalidShapeId("foo".to_string(), "missing `#`".to_string());
        assert_eq!(err.to_string(), "Invalid shape ID `foo`: missing `#`");

        let err = SemanticError::NodeType {
            expected: "string",
            found: "number",
        };
        assert_eq!(err.to_string(), "Expected string node, found number");
    }
}
