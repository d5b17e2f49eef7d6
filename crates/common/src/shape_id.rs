//! Shape identifiers
//!
//! A shape ID has the form `namespace#Name` or `namespace#Name$member`.

use crate::{Result, SemanticError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Namespace of the built-in prelude shapes and traits
pub const PRELUDE_NAMESPACE: &str = "smithy.api";

/// Immutable, case-sensitive shape identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId {
    namespace: String,
    name: String,
    member: Option<String>,
}

impl ShapeId {
    /// Parse an absolute shape ID
    ///
    /// # Examples
    /// ```
    /// use smithy_semantic_common::ShapeId;
    ///
    /// let id = ShapeId::parse("example.weather#City$name").unwrap();
    /// assert_eq!(id.namespace(), "example.weather");
    /// assert_eq!(id.name(), "City");
    /// assert_eq!(id.member(), Some("name"));
    /// ```
    pub fn parse(value: &str) -> Result<Self> {
        let (namespace, rest) = value
            .split_once('#')
            .ok_or_else(|| invalid(value, "missing `#` between namespace and name"))?;

        if namespace.is_empty() || !namespace.split('.').all(is_valid_identifier) {
            return Err(invalid(value, "invalid namespace"));
        }

        let (name, member) = match rest.split_once('$') {
            Some((name, member)) => (name, Some(member)),
            None => (rest, None),
        };

        if !is_valid_identifier(name) {
            return Err(invalid(value, "invalid shape name"));
        }
        if let Some(member) = member {
            if !is_valid_identifier(member) {
                return Err(invalid(value, "invalid member name"));
            }
        }

        Ok(Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            member: member.map(str::to_string),
        })
    }

    /// Resolve a possibly relative shape ID against a default namespace
    ///
    /// Absolute IDs are parsed as-is; relative names are placed in `namespace`.
    pub fn from_relative(value: &str, namespace: &str) -> Result<Self> {
        if value.contains('#') {
            Self::parse(value)
        } else {
            Self::parse(&format!("{namespace}#{value}"))
        }
    }

    /// Build a shape ID from already validated parts
    pub fn from_parts(namespace: &str, name: &str) -> Result<Self> {
        Self::parse(&format!("{namespace}#{name}"))
    }

    /// Shape ID in the prelude namespace
    pub fn prelude(name: &str) -> Self {
        Self {
            namespace: PRELUDE_NAMESPACE.to_string(),
            name: name.to_string(),
            member: None,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn member(&self) -> Option<&str> {
        self.member.as_deref()
    }

    pub fn has_member(&self) -> bool {
        self.member.is_some()
    }

    /// Create a member ID of this shape
    pub fn with_member(&self, member: &str) -> Self {
        Self {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            member: Some(member.to_string()),
        }
    }

    /// Drop the member component
    pub fn without_member(&self) -> Self {
        Self {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            member: None,
        }
    }

    pub fn is_prelude(&self) -> bool {
        self.namespace == PRELUDE_NAMESPACE
    }

    /// Lowercased form used to detect case-insensitive collisions
    pub fn to_case_insensitive_key(&self) -> String {
        self.to_string().to_lowercase()
    }
}

/// Check the identifier grammar `(_+[A-Za-z0-9] | [A-Za-z])[A-Za-z0-9_]*`
pub fn is_valid_identifier(value: &str) -> bool {
    let trimmed = value.trim_start_matches('_');
    let underscored = trimmed.len() < value.len();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || (underscored && first.is_ascii_digit()) => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn invalid(value: &str, reason: &str) -> SemanticError {
    SemanticError::InvalidShapeId(value.to_string(), reason.to_string())
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.namespace, self.name)?;
        if let Some(member) = &self.member {
            write!(f, "${member}")?;
        }
        Ok(())
    }
}

impl FromStr for ShapeId {
    type Err = SemanticError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for ShapeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ShapeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let id = ShapeId::parse("com.example#Foo$bar").unwrap();
        assert_eq!(id.to_string(), "com.example#Foo$bar");
        assert_eq!(id.without_member().to_string(), "com.example#Foo");
        assert_eq!(id.without_member().with_member("baz").member(), Some("baz"));
    }

    #[test]
    fn test_rejects_malformed_ids() {
        assert!(ShapeId::parse("Foo").is_err());
        assert!(ShapeId::parse("#Foo").is_err());
        assert!(ShapeId::parse("com..example#Foo").is_err());
        assert!(ShapeId::parse("com.example#1Foo").is_err());
        assert!(ShapeId::parse("com.example#Foo$").is_err());
        assert!(ShapeId::parse("com.example#_").is_err());
        assert!(ShapeId::parse("com.example#_1Foo").is_ok());
    }

    #[test]
    fn test_relative_resolution() {
        let id = ShapeId::from_relative("Foo", "com.example").unwrap();
        assert_eq!(id.to_string(), "com.example#Foo");
        let id = ShapeId::from_relative("smithy.api#String", "com.example").unwrap();
        assert!(id.is_prelude());
    }

    #[test]
    fn test_identifier_grammar() {
        assert!(is_valid_identifier("_foo"));
        assert!(is_valid_identifier("Foo_1"));
        assert!(is_valid_identifier("_1foo"));
        assert!(is_valid_identifier("__9"));
        assert!(!is_valid_identifier("1foo"));
        assert!(!is_valid_identifier("__"));
        assert!(!is_valid_identifier("foo-bar"));
        assert!(!is_valid_identifier(""));
    }

    #[test]
    fn test_case_insensitive_key() {
        let a = ShapeId::parse("com.example#Foo").unwrap();
        let b = ShapeId::parse("com.example#FOO").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.to_case_insensitive_key(), b.to_case_insensitive_key());
    }
}
