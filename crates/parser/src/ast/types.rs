//! Smithy JSON AST type definitions
//!
//! These types represent the structure of Smithy JSON AST documents. Every
//! shape is a single flat record keyed by its `type`; fields that do not apply
//! to a type are simply absent.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smithy_semantic_common::Node;

/// Root Smithy model document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AstModel {
    /// Smithy version (e.g., "2.0")
    pub smithy: String,

    /// Metadata key/value pairs
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub metadata: IndexMap<String, Node>,

    /// Shape definitions and `apply` entries, keyed by absolute shape ID
    #[serde(default)]
    pub shapes: IndexMap<String, AstShape>,
}

/// A shape definition or an `apply` entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AstShape {
    /// Shape type name, or `apply`
    #[serde(rename = "type")]
    pub shape_type: String,

    /// Structure, union, enum and intEnum members
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<IndexMap<String, AstMember>>,

    /// List member
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<AstMember>,

    /// Map key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<AstMember>,

    /// Map value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<AstMember>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mixins: Vec<ShapeReference>,

    /// Trait applications keyed by trait shape ID
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub traits: IndexMap<String, Node>,

    /// Resource a structure binds to for elided members
    #[serde(default, rename = "for", skip_serializing_if = "Option::is_none")]
    pub for_resource: Option<ShapeReference>,

    // Service properties
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<ShapeReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<ShapeReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ShapeReference>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub rename: IndexMap<String, String>,

    // Operation properties
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<ShapeReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<ShapeReference>,

    // Resource properties
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub identifiers: IndexMap<String, ShapeReference>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, ShapeReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create: Option<ShapeReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<ShapeReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<ShapeReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<ShapeReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<ShapeReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<ShapeReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collection_operations: Vec<ShapeReference>,
}

impl AstShape {
    pub fn new(shape_type: &str) -> Self {
        Self {
            shape_type: shape_type.to_string(),
            ..Default::default()
        }
    }

    pub fn is_apply(&self) -> bool {
        self.shape_type == APPLY
    }
}

/// Type name of `apply` entries
pub const APPLY: &str = "apply";

/// Reference to another shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeReference {
    /// Target shape ID (e.g., "example.weather#City")
    pub target: String,
}

impl ShapeReference {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

/// Member definition; a member without `target` is elided
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AstMember {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub traits: IndexMap<String, Node>,
}

impl AstModel {
    /// Get a shape by its ID
    pub fn get_shape(&self, shape_id: &str) -> Option<&AstShape> {
        self.shapes.get(shape_id)
    }
}
