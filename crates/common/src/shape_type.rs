//! Shape types and their categories

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every kind of shape that can appear in a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShapeType {
    Blob,
    Boolean,
    String,
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
    BigInteger,
    BigDecimal,
    Timestamp,
    Document,
    Enum,
    IntEnum,
    List,
    Map,
    Structure,
    Union,
    Service,
    Operation,
    Resource,
    Member,
}

/// Broad grouping of shape types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeCategory {
    Simple,
    Aggregate,
    Service,
    Member,
}

impl ShapeType {
    pub const ALL: [ShapeType; 23] = [
        ShapeType::Blob,
        ShapeType::Boolean,
        ShapeType::String,
        ShapeType::Byte,
        ShapeType::Short,
        ShapeType::Integer,
        ShapeType::Long,
        ShapeType::Float,
        ShapeType::Double,
        ShapeType::BigInteger,
        ShapeType::BigDecimal,
        ShapeType::Timestamp,
        ShapeType::Document,
        ShapeType::Enum,
        ShapeType::IntEnum,
        ShapeType::List,
        ShapeType::Map,
        ShapeType::Structure,
        ShapeType::Union,
        ShapeType::Service,
        ShapeType::Operation,
        ShapeType::Resource,
        ShapeType::Member,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ShapeType::Blob => "blob",
            ShapeType::Boolean => "boolean",
            ShapeType::String => "string",
            ShapeType::Byte => "byte",
            ShapeType::Short => "short",
            ShapeType::Integer => "integer",
            ShapeType::Long => "long",
            ShapeType::Float => "float",
            ShapeType::Double => "double",
            ShapeType::BigInteger => "bigInteger",
            ShapeType::BigDecimal => "bigDecimal",
            ShapeType::Timestamp => "timestamp",
            ShapeType::Document => "document",
            ShapeType::Enum => "enum",
            ShapeType::IntEnum => "intEnum",
            ShapeType::List => "list",
            ShapeType::Map => "map",
            ShapeType::Structure => "structure",
            ShapeType::Union => "union",
            ShapeType::Service => "service",
            ShapeType::Operation => "operation",
            ShapeType::Resource => "resource",
            ShapeType::Member => "member",
        }
    }

    pub fn category(self) -> ShapeCategory {
        match self {
            ShapeType::List | ShapeType::Map | ShapeType::Structure | ShapeType::Union => {
                ShapeCategory::Aggregate
            }
            ShapeType::Service | ShapeType::Operation | ShapeType::Resource => {
                ShapeCategory::Service
            }
            ShapeType::Member => ShapeCategory::Member,
            _ => ShapeCategory::Simple,
        }
    }

    pub fn is_simple(self) -> bool {
        self.category() == ShapeCategory::Simple
    }

    /// Numeric types, including `intEnum`
    pub fn is_number(self) -> bool {
        matches!(
            self,
            ShapeType::Byte
                | ShapeType::Short
                | ShapeType::Integer
                | ShapeType::IntEnum
                | ShapeType::Long
                | ShapeType::Float
                | ShapeType::Double
                | ShapeType::BigInteger
                | ShapeType::BigDecimal
        )
    }

    /// String-like types, including `enum`
    pub fn is_string(self) -> bool {
        matches!(self, ShapeType::String | ShapeType::Enum)
    }

    pub fn is_collection(self) -> bool {
        self == ShapeType::List
    }

    /// Shapes whose members are listed by name
    pub fn has_members(self) -> bool {
        matches!(
            self,
            ShapeType::List
                | ShapeType::Map
                | ShapeType::Structure
                | ShapeType::Union
                | ShapeType::Enum
                | ShapeType::IntEnum
        )
    }

    /// Inclusive bounds of integral types
    pub fn integer_bounds(self) -> Option<(i64, i64)> {
        match self {
            ShapeType::Byte => Some((i8::MIN as i64, i8::MAX as i64)),
            ShapeType::Short => Some((i16::MIN as i64, i16::MAX as i64)),
            ShapeType::Integer | ShapeType::IntEnum => Some((i32::MIN as i64, i32::MAX as i64)),
            ShapeType::Long => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShapeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShapeType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown shape type: {s}"))
    }
}
