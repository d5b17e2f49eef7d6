//! Attribute selectors: `[id|namespace = foo]`, `[trait|length|min > 1]`

use crate::shapes::Shape;
use smithy_semantic_common::{Node, ShapeId, PRELUDE_NAMESPACE};

/// One segment of an attribute path after the root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Keys,
    Values,
    Length,
}

/// Root of an attribute path and the segments that follow it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributePath {
    /// `id`, `id|namespace`, `id|name`, `id|member`
    Id(Option<String>),
    /// `service`, `service|version`
    Service(Option<String>),
    /// `trait|name|...`; a missing trait name projects the trait IDs
    Trait(Option<ShapeId>, Vec<PathSegment>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Equals,
    NotEquals,
    StartsWith,
    EndsWith,
    Contains,
    Exists,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl Comparator {
    pub fn parse(token: &str) -> Option<Self> {
        Some(match token {
            "=" => Comparator::Equals,
            "!=" => Comparator::NotEquals,
            "^=" => Comparator::StartsWith,
            "$=" => Comparator::EndsWith,
            "*=" => Comparator::Contains,
            "?=" => Comparator::Exists,
            ">" => Comparator::GreaterThan,
            ">=" => Comparator::GreaterThanOrEqual,
            "<" => Comparator::LessThan,
            "<=" => Comparator::LessThanOrEqual,
            _ => return None,
        })
    }
}

/// `[path]` or `[path OP value, ... i]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeTest {
    pub path: AttributePath,
    pub comparator: Option<Comparator>,
    pub values: Vec<String>,
    pub case_insensitive: bool,
}

/// Value found at the end of an attribute path
#[derive(Debug, Clone, PartialEq)]
enum AttributeValue {
    Missing,
    Text(String),
    Node(Node),
    Projection(Vec<AttributeValue>),
}

impl AttributeValue {
    fn exists(&self) -> bool {
        match self {
            AttributeValue::Missing => false,
            AttributeValue::Node(node) => !node.is_null(),
            AttributeValue::Projection(values) => !values.is_empty(),
            AttributeValue::Text(_) => true,
        }
    }

    /// Scalar form used by comparators
    fn as_text(&self) -> Option<String> {
        match self {
            AttributeValue::Text(value) => Some(value.clone()),
            AttributeValue::Node(Node::String(value)) => Some(value.clone()),
            AttributeValue::Node(Node::Bool(value)) => Some(value.to_string()),
            AttributeValue::Node(Node::Number(value)) => Some(value.to_string()),
            _ => None,
        }
    }

    fn navigate(self, segment: &PathSegment) -> AttributeValue {
        if let AttributeValue::Projection(values) = self {
            return AttributeValue::Projection(
                values
                    .into_iter()
                    .map(|v| v.navigate(segment))
                    .filter(AttributeValue::exists)
                    .collect(),
            );
        }
        let node = match self {
            AttributeValue::Node(node) => node,
            AttributeValue::Text(text) if *segment == PathSegment::Length => {
                return AttributeValue::Text(text.chars().count().to_string())
            }
            _ => return AttributeValue::Missing,
        };
        match (segment, node) {
            (PathSegment::Key(key), Node::Object(entries)) => entries
                .get(key)
                .cloned()
                .map(AttributeValue::Node)
                .unwrap_or(AttributeValue::Missing),
            (PathSegment::Key(key), Node::Array(values)) => key
                .parse::<usize>()
                .ok()
                .and_then(|i| values.get(i).cloned())
                .map(AttributeValue::Node)
                .unwrap_or(AttributeValue::Missing),
            (PathSegment::Keys, Node::Object(entries)) => AttributeValue::Projection(
                entries.keys().cloned().map(AttributeValue::Text).collect(),
            ),
            (PathSegment::Values, Node::Object(entries)) => AttributeValue::Projection(
                entries.values().cloned().map(AttributeValue::Node).collect(),
            ),
            (PathSegment::Values, Node::Array(values)) => {
                AttributeValue::Projection(values.into_iter().map(AttributeValue::Node).collect())
            }
            (PathSegment::Length, Node::Object(entries)) => {
                AttributeValue::Text(entries.len().to_string())
            }
            (PathSegment::Length, Node::Array(values)) => {
                AttributeValue::Text(values.len().to_string())
            }
            (PathSegment::Length, Node::String(value)) => {
                AttributeValue::Text(value.chars().count().to_string())
            }
            _ => AttributeValue::Missing,
        }
    }
}

/// Resolve a trait name used in a selector; relative names are prelude traits
pub(crate) fn resolve_trait_name(name: &str) -> Option<ShapeId> {
    ShapeId::from_relative(name, PRELUDE_NAMESPACE).ok()
}

impl AttributeTest {
    pub fn matches(&self, shape: &Shape) -> bool {
        let value = self.resolve(shape);
        match self.comparator {
            None => value.exists(),
            Some(Comparator::Exists) => {
                let expected = value.exists();
                self.values
                    .iter()
                    .any(|v| v.eq_ignore_ascii_case(&expected.to_string()))
            }
            Some(comparator) => match value {
                AttributeValue::Projection(values) => {
                    values.iter().any(|v| self.compare(comparator, v))
                }
                other => self.compare(comparator, &other),
            },
        }
    }

    fn compare(&self, comparator: Comparator, value: &AttributeValue) -> bool {
        let Some(actual) = value.as_text() else {
            return false;
        };
        self.values.iter().any(|expected| {
            let (actual, expected) = if self.case_insensitive {
                (actual.to_lowercase(), expected.to_lowercase())
            } else {
                (actual.clone(), expected.clone())
            };
            match comparator {
                Comparator::Equals => actual == expected,
                Comparator::NotEquals => actual != expected,
                Comparator::StartsWith => actual.starts_with(&expected),
                Comparator::EndsWith => actual.ends_with(&expected),
                Comparator::Contains => actual.contains(&expected),
                Comparator::Exists => false,
                numeric => match (actual.parse::<f64>(), expected.parse::<f64>()) {
                    (Ok(a), Ok(e)) => match numeric {
                        Comparator::GreaterThan => a > e,
                        Comparator::GreaterThanOrEqual => a >= e,
                        Comparator::LessThan => a < e,
                        _ => a <= e,
                    },
                    _ => false,
                },
            }
        })
    }

    fn resolve(&self, shape: &Shape) -> AttributeValue {
        match &self.path {
            AttributePath::Id(part) => match part.as_deref() {
                None => AttributeValue::Text(shape.id.to_string()),
                Some("namespace") => AttributeValue::Text(shape.id.namespace().to_string()),
                Some("name") => AttributeValue::Text(shape.id.name().to_string()),
                Some("member") => shape
                    .id
                    .member()
                    .map(|m| AttributeValue::Text(m.to_string()))
                    .unwrap_or(AttributeValue::Missing),
                Some(_) => AttributeValue::Missing,
            },
            AttributePath::Service(part) => match shape.properties.as_service() {
                None => AttributeValue::Missing,
                Some(service) => match part.as_deref() {
                    None => AttributeValue::Text(shape.id.to_string()),
                    Some("version") => service
                        .version
                        .clone()
                        .map(AttributeValue::Text)
                        .unwrap_or(AttributeValue::Missing),
                    Some(_) => AttributeValue::Missing,
                },
            },
            AttributePath::Trait(None, segments) => {
                let ids = AttributeValue::Projection(
                    shape.traits.keys().cloned().map(AttributeValue::Text).collect(),
                );
                // `trait|(keys)` is the same projection as `trait`
                segments
                    .iter()
                    .filter(|s| **s != PathSegment::Keys)
                    .fold(ids, |value, segment| value.navigate(segment))
            }
            AttributePath::Trait(Some(trait_id), segments) => {
                let Some(value) = shape.trait_value(&trait_id.to_string()) else {
                    return AttributeValue::Missing;
                };
                segments
                    .iter()
                    .fold(AttributeValue::Node(value.clone()), |value, segment| {
                        value.navigate(segment)
                    })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Trait;
    use smithy_semantic_common::ShapeType;

    fn shape_with_length() -> Shape {
        let mut shape = Shape::new(ShapeId::parse("ns.foo#Name").unwrap(), ShapeType::String);
        shape.add_trait(Trait::new(
            ShapeId::prelude("length"),
            Node::object([("min", Node::from(1_i64)), ("max", Node::from(10_i64))]),
        ));
        shape
    }

    fn attr(path: AttributePath, comparator: Option<Comparator>, values: &[&str]) -> AttributeTest {
        AttributeTest {
            path,
            comparator,
            values: values.iter().map(|v| v.to_string()).collect(),
            case_insensitive: false,
        }
    }

    #[test]
    fn test_trait_paths() {
        let shape = shape_with_length();
        let length = || resolve_trait_name("length");

        assert!(attr(AttributePath::Trait(length(), vec![]), None, &[]).matches(&shape));
        assert!(attr(
            AttributePath::Trait(length(), vec![PathSegment::Key("min".into())]),
            Some(Comparator::GreaterThanOrEqual),
            &["1"]
        )
        .matches(&shape));
        assert!(attr(
            AttributePath::Trait(length(), vec![PathSegment::Keys]),
            Some(Comparator::Equals),
            &["max"]
        )
        .matches(&shape));
        assert!(!attr(
            AttributePath::Trait(resolve_trait_name("pattern"), vec![]),
            None,
            &[]
        )
        .matches(&shape));
    }

    #[test]
    fn test_id_paths_and_case_flag() {
        let shape = shape_with_length();
        let mut namespace = attr(
            AttributePath::Id(Some("namespace".into())),
            Some(Comparator::Equals),
            &["NS.FOO"],
        );
        assert!(!namespace.matches(&shape));
        namespace.case_insensitive = true;
        assert!(namespace.matches(&shape));
        assert!(!attr(AttributePath::Id(Some("member".into())), None, &[]).matches(&shape));
    }

    #[test]
    fn test_exists_comparator() {
        let shape = shape_with_length();
        let path = || AttributePath::Trait(resolve_trait_name("sensitive"), vec![]);
        assert!(attr(path(), Some(Comparator::Exists), &["false"]).matches(&shape));
        assert!(!attr(path(), Some(Comparator::Exists), &["true"]).matches(&shape));
    }
}
