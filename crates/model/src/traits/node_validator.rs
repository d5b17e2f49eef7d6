//! Validation of node values against the shapes that describe them
//!
//! Trait values, `default` values and `enumValue`s are all checked by
//! walking the node and the shape graph side by side. Constraint traits on
//! the shapes along the way (`length`, `range`, `pattern`, `uniqueItems`,
//! `sparse`, `required`) are enforced as the walk reaches them.

use super::ids;
use crate::shapes::{Model, Shape};
use smithy_semantic_common::{
    Node, Number, Severity, ShapeId, ShapeType, SourceLocation, ValidationEvent,
};

/// Walks a node value against a shape and reports mismatches
pub struct NodeValidator<'m> {
    model: &'m Model,
    event_id: String,
    event_shape: ShapeId,
    trait_id: Option<ShapeId>,
    source: SourceLocation,
    context: String,
}

impl<'m> NodeValidator<'m> {
    /// Create a validator whose events carry `event_id` and point at
    /// `event_shape`
    pub fn new(model: &'m Model, event_id: impl Into<String>, event_shape: &ShapeId) -> Self {
        Self {
            model,
            event_id: event_id.into(),
            event_shape: event_shape.clone(),
            trait_id: None,
            source: SourceLocation::none(),
            context: String::new(),
        }
    }

    /// Prefix for every message, e.g. "Error validating trait `length`"
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_trait(mut self, trait_id: &ShapeId) -> Self {
        self.trait_id = Some(trait_id.clone());
        self
    }

    pub fn with_source(mut self, source: &SourceLocation) -> Self {
        self.source = source.clone();
        self
    }

    /// Validate `value` against `shape`
    pub fn validate(&self, shape: &Shape, value: &Node) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        self.visit(shape, value, "", &mut events);
        events
    }

    fn emit(
        &self,
        events: &mut Vec<ValidationEvent>,
        severity: Severity,
        path: &str,
        message: String,
    ) {
        let message = match (self.context.is_empty(), path.is_empty()) {
            (true, true) => message,
            (true, false) => format!("{}: {message}", &path[1..]),
            (false, true) => format!("{}: {message}", self.context),
            (false, false) => format!("{}; {}: {message}", self.context, &path[1..]),
        };
        let mut event = ValidationEvent::new(self.event_id.clone(), severity, message)
            .with_shape(&self.event_shape)
            .with_source(&self.source);
        if let Some(trait_id) = &self.trait_id {
            event = event.with_trait(trait_id);
        }
        events.push(event);
    }

    fn type_mismatch(
        &self,
        events: &mut Vec<ValidationEvent>,
        shape: &Shape,
        expected: &str,
        value: &Node,
        path: &str,
    ) {
        self.emit(
            events,
            Severity::Error,
            path,
            format!(
                "Expected {expected} value for {} shape, `{}`; found {} value",
                shape.shape_type,
                shape.id,
                value.type_name()
            ),
        );
    }

    fn visit(&self, shape: &Shape, value: &Node, path: &str, events: &mut Vec<ValidationEvent>) {
        // Members carry their own constraints, then defer to their target
        if shape.is_member() {
            let Some(target) = self.model.target_of(shape) else {
                return;
            };
            self.check_constraints(shape, value, path, events);
            self.visit(target, value, path, events);
            return;
        }

        if shape.shape_type == ShapeType::Document {
            return;
        }
        if value.is_null() {
            self.type_mismatch(events, shape, expected_kind(shape.shape_type), value, path);
            return;
        }

        match shape.shape_type {
            ShapeType::Blob | ShapeType::String | ShapeType::Timestamp
                if value.as_str().is_some() => {}
            ShapeType::Timestamp if value.as_number().is_some() => {}
            ShapeType::Boolean if value.as_bool().is_some() => {}
            ShapeType::Enum => match value.as_str() {
                Some(text) => self.check_enum(shape, &Node::from(text), path, events),
                None => self.type_mismatch(events, shape, "string", value, path),
            },
            ShapeType::IntEnum => match value.as_number() {
                Some(number) if number.is_integer() => {
                    self.check_enum(shape, value, path, events);
                    self.check_bounds(shape, number, path, events);
                }
                _ => self.type_mismatch(events, shape, "integer", value, path),
            },
            t if t.is_number() => match value.as_number() {
                Some(number) => {
                    if t.integer_bounds().is_some() || t == ShapeType::BigInteger {
                        if !number.is_integer() {
                            self.emit(
                                events,
                                Severity::Error,
                                path,
                                format!(
                                    "{t} shapes must not have floating point values, but found \
                                     `{number}` provided for `{}`",
                                    shape.id
                                ),
                            );
                            return;
                        }
                        self.check_bounds(shape, number, path, events);
                    }
                }
                None => self.type_mismatch(events, shape, "number", value, path),
            },
            ShapeType::List => match value.as_array() {
                Some(items) => self.visit_list(shape, items, path, events),
                None => self.type_mismatch(events, shape, "array", value, path),
            },
            ShapeType::Map => match value.as_object() {
                Some(entries) => self.visit_map(shape, entries, path, events),
                None => self.type_mismatch(events, shape, "object", value, path),
            },
            ShapeType::Structure => match value.as_object() {
                Some(entries) => self.visit_structure(shape, entries, path, events),
                None => self.type_mismatch(events, shape, "object", value, path),
            },
            ShapeType::Union => match value.as_object() {
                Some(entries) => self.visit_union(shape, entries, path, events),
                None => self.type_mismatch(events, shape, "object", value, path),
            },
            ShapeType::Service | ShapeType::Operation | ShapeType::Resource | ShapeType::Member => {
                self.emit(
                    events,
                    Severity::Error,
                    path,
                    format!("Encountered invalid shape type: {}", shape.shape_type),
                );
                return;
            }
            t => {
                self.type_mismatch(events, shape, expected_kind(t), value, path);
                return;
            }
        }

        self.check_constraints(shape, value, path, events);
    }

    fn visit_list(
        &self,
        shape: &Shape,
        items: &[Node],
        path: &str,
        events: &mut Vec<ValidationEvent>,
    ) {
        let Some(member) = self.model.get_member(shape, "member") else {
            return;
        };
        let sparse = shape.has_trait(ids::SPARSE);
        for (i, item) in items.iter().enumerate() {
            let item_path = format!("{path}.{i}");
            if item.is_null() {
                if !sparse {
                    self.emit(
                        events,
                        Severity::Error,
                        &item_path,
                        format!("Non-sparse list shape `{}` cannot contain null values", shape.id),
                    );
                }
                continue;
            }
            self.visit(member, item, &item_path, events);
        }

        if shape.has_trait(ids::UNIQUE_ITEMS) {
            let mut duplicates = Vec::new();
            for (i, item) in items.iter().enumerate() {
                if items[..i].contains(item) && !duplicates.contains(&item) {
                    duplicates.push(item);
                }
            }
            if !duplicates.is_empty() {
                let listed: Vec<String> = duplicates.iter().map(|d| d.to_string()).collect();
                self.emit(
                    events,
                    Severity::Error,
                    path,
                    format!(
                        "Value provided for `{}` must have unique items, but the following items \
                         had multiple entries: [{}]",
                        shape.id,
                        listed.join(", ")
                    ),
                );
            }
        }
    }

    fn visit_map(
        &self,
        shape: &Shape,
        entries: &indexmap::IndexMap<String, Node>,
        path: &str,
        events: &mut Vec<ValidationEvent>,
    ) {
        let key = self.model.get_member(shape, "key");
        let value_member = self.model.get_member(shape, "value");
        let sparse = shape.has_trait(ids::SPARSE);

        for (name, value) in entries {
            let entry_path = format!("{path}.{name}");
            if let Some(key) = key {
                self.visit(key, &Node::from(name.as_str()), &entry_path, events);
            }
            if value.is_null() {
                if !sparse {
                    self.emit(
                        events,
                        Severity::Error,
                        &entry_path,
                        format!("Non-sparse map shape `{}` cannot contain null values", shape.id),
                    );
                }
                continue;
            }
            if let Some(member) = value_member {
                self.visit(member, value, &entry_path, events);
            }
        }
    }

    fn visit_structure(
        &self,
        shape: &Shape,
        entries: &indexmap::IndexMap<String, Node>,
        path: &str,
        events: &mut Vec<ValidationEvent>,
    ) {
        for (name, value) in entries {
            let member_path = format!("{path}.{name}");
            match self.model.get_member(shape, name) {
                Some(_) if value.is_null() => {}
                Some(member) => self.visit(member, value, &member_path, events),
                None => self.emit(
                    events,
                    Severity::Warning,
                    path,
                    format!("Invalid structure member `{name}` found for `{}`", shape.id),
                ),
            }
        }

        for member in self.model.members(shape) {
            let name = member.member_name().unwrap_or_default();
            if member.has_trait(ids::REQUIRED)
                && !member.has_trait(ids::DEFAULT)
                && entries.get(name).map_or(true, Node::is_null)
            {
                self.emit(
                    events,
                    Severity::Error,
                    path,
                    format!("Missing required structure member `{name}` for `{}`", shape.id),
                );
            }
        }
    }

    fn visit_union(
        &self,
        shape: &Shape,
        entries: &indexmap::IndexMap<String, Node>,
        path: &str,
        events: &mut Vec<ValidationEvent>,
    ) {
        if entries.len() != 1 {
            self.emit(
                events,
                Severity::Error,
                path,
                format!(
                    "union values can contain a value for only a single member; `{}` found {}",
                    shape.id,
                    entries.len()
                ),
            );
            return;
        }
        for (name, value) in entries {
            match self.model.get_member(shape, name) {
                Some(member) => self.visit(member, value, &format!("{path}.{name}"), events),
                None => self.emit(
                    events,
                    Severity::Error,
                    path,
                    format!("Invalid union member `{name}` found for `{}`", shape.id),
                ),
            }
        }
    }

    fn check_enum(
        &self,
        shape: &Shape,
        value: &Node,
        path: &str,
        events: &mut Vec<ValidationEvent>,
    ) {
        let allowed: Vec<&Node> = self
            .model
            .members(shape)
            .filter_map(|m| m.trait_value(ids::ENUM_VALUE))
            .collect();
        if !allowed.iter().any(|v| *v == value) {
            let listed: Vec<String> = allowed.iter().map(|v| format!("`{v}`")).collect();
            let kind = if shape.shape_type == ShapeType::Enum { "String" } else { "Integer" };
            self.emit(
                events,
                Severity::Error,
                path,
                format!(
                    "{kind} value provided for `{}` must be one of the following values: {}",
                    shape.id,
                    listed.join(", ")
                ),
            );
        }
    }

    fn check_bounds(
        &self,
        shape: &Shape,
        number: Number,
        path: &str,
        events: &mut Vec<ValidationEvent>,
    ) {
        let Some((min, max)) = shape.shape_type.integer_bounds() else {
            return;
        };
        if let Some(value) = number.as_i64() {
            if value < min || value > max {
                self.emit(
                    events,
                    Severity::Error,
                    path,
                    format!(
                        "{} value must be >= {min} and <= {max}, but found {value}",
                        shape.shape_type
                    ),
                );
            }
        }
    }

    /// `length`, `range` and `pattern` of a shape or member
    fn check_constraints(
        &self,
        shape: &Shape,
        value: &Node,
        path: &str,
        events: &mut Vec<ValidationEvent>,
    ) {
        if let Some(length) = shape.trait_value(ids::LENGTH) {
            let size = match value {
                Node::String(text) if self.is_blob(shape) => Some(text.len()),
                Node::String(text) => Some(text.chars().count()),
                Node::Array(items) => Some(items.len()),
                Node::Object(entries) => Some(entries.len()),
                _ => None,
            };
            if let Some(size) = size {
                let bound = |key: &str| {
                    length
                        .get(key)
                        .and_then(Node::as_number)
                        .and_then(Number::as_i64)
                };
                let unit = if self.is_blob(shape) {
                    "bytes"
                } else if value.as_str().is_some() {
                    "characters"
                } else {
                    "elements"
                };
                if let Some(min) = bound("min") {
                    if (size as i64) < min {
                        self.emit(
                            events,
                            Severity::Error,
                            path,
                            format!(
                                "Value provided for `{}` must have at least {min} {unit}, but the \
                                 provided value only has {size} {unit}",
                                shape.id
                            ),
                        );
                    }
                }
                if let Some(max) = bound("max") {
                    if (size as i64) > max {
                        self.emit(
                            events,
                            Severity::Error,
                            path,
                            format!(
                                "Value provided for `{}` must have no more than {max} {unit}, but \
                                 the provided value has {size} {unit}",
                                shape.id
                            ),
                        );
                    }
                }
            }
        }

        if let (Some(range), Some(number)) = (shape.trait_value(ids::RANGE), value.as_number()) {
            let actual = number.as_f64();
            let bound = |key: &str| range.get(key).and_then(Node::as_number);
            if let Some(min) = bound("min") {
                if actual < min.as_f64() {
                    self.emit(
                        events,
                        Severity::Error,
                        path,
                        format!(
                            "Value provided for `{}` must be greater than or equal to {min}, but \
                             found {number}",
                            shape.id
                        ),
                    );
                }
            }
            if let Some(max) = bound("max") {
                if actual > max.as_f64() {
                    self.emit(
                        events,
                        Severity::Error,
                        path,
                        format!(
                            "Value provided for `{}` must be less than or equal to {max}, but \
                             found {number}",
                            shape.id
                        ),
                    );
                }
            }
        }

        if let (Some(pattern), Some(text)) = (
            shape.trait_value(ids::PATTERN).and_then(Node::as_str),
            value.as_str(),
        ) {
            // Invalid expressions are reported by the pattern trait validator
            if let Ok(regex) = regex::Regex::new(pattern) {
                if !regex.is_match(text) {
                    self.emit(
                        events,
                        Severity::Error,
                        path,
                        format!(
                            "String value provided for `{}` must match regular expression: \
                             {pattern}",
                            shape.id
                        ),
                    );
                }
            }
        }
    }

    fn is_blob(&self, shape: &Shape) -> bool {
        let shape = if shape.is_member() {
            self.model.target_of(shape)
        } else {
            Some(shape)
        };
        shape.is_some_and(|s| s.shape_type == ShapeType::Blob)
    }
}

fn expected_kind(shape_type: ShapeType) -> &'static str {
    match shape_type {
        ShapeType::Blob | ShapeType::String | ShapeType::Enum => "string",
        ShapeType::Boolean => "boolean",
        ShapeType::Timestamp => "string or number",
        ShapeType::List => "array",
        ShapeType::Map | ShapeType::Structure | ShapeType::Union => "object",
        t if t.is_number() => "number",
        _ => "value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Trait;

    fn id(value: &str) -> ShapeId {
        ShapeId::parse(value).unwrap()
    }

    fn model() -> Model {
        let mut structure = Shape::new(id("ns#S"), ShapeType::Structure);
        structure.members.insert("name".to_string(), id("ns#S$name"));
        structure.members.insert("count".to_string(), id("ns#S$count"));
        let mut name = Shape::member(id("ns#S$name"), Some(ShapeId::prelude("String")));
        name.add_trait(Trait::new(ShapeId::prelude("required"), Node::empty_object()));
        name.add_trait(Trait::new(
            ShapeId::prelude("length"),
            Node::object([("min", Node::from(2i64))]),
        ));
        let count = Shape::member(id("ns#S$count"), Some(id("ns#Small")));
        let mut small = Shape::new(id("ns#Small"), ShapeType::Byte);
        small.add_trait(Trait::new(
            ShapeId::prelude("range"),
            Node::object([("max", Node::from(10i64))]),
        ));

        let mut list = Shape::new(id("ns#L"), ShapeType::List);
        list.members.insert("member".to_string(), id("ns#L$member"));
        list.add_trait(Trait::new(ShapeId::prelude("uniqueItems"), Node::empty_object()));
        let list_member = Shape::member(id("ns#L$member"), Some(ShapeId::prelude("String")));

        let mut union = Shape::new(id("ns#U"), ShapeType::Union);
        union.members.insert("a".to_string(), id("ns#U$a"));
        union.members.insert("b".to_string(), id("ns#U$b"));

        Model::new(
            [
                structure,
                name,
                count,
                small,
                list,
                list_member,
                union,
                Shape::member(id("ns#U$a"), Some(ShapeId::prelude("String"))),
                Shape::member(id("ns#U$b"), Some(ShapeId::prelude("String"))),
                Shape::new(ShapeId::prelude("String"), ShapeType::String),
            ],
            Default::default(),
        )
    }

    fn messages(shape: &str, value: serde_json::Value) -> Vec<String> {
        let model = model();
        let shape = model.get_shape(&id(shape)).unwrap();
        NodeValidator::new(&model, "Test", &shape.id)
            .validate(shape, &Node::from(value))
            .into_iter()
            .map(|e| e.message)
            .collect()
    }

    #[test]
    fn test_valid_structure() {
        assert!(messages("ns#S", serde_json::json!({"name": "abc", "count": 3})).is_empty());
    }

    #[test]
    fn test_missing_required_member() {
        let found = messages("ns#S", serde_json::json!({}));
        assert_eq!(found, vec!["Missing required structure member `name` for `ns#S`"]);
    }

    #[test]
    fn test_unknown_member_and_type_mismatch() {
        let found = messages("ns#S", serde_json::json!({"name": 1, "other": true}));
        assert_eq!(found.len(), 2);
        assert!(found[0]
            .contains("Expected string value for string shape, `smithy.api#String`; found number"));
        assert_eq!(found[1], "Invalid structure member `other` found for `ns#S`");
    }

    #[test]
    fn test_constraints() {
        let found = messages("ns#S", serde_json::json!({"name": "a", "count": 300}));
        assert_eq!(found.len(), 3, "{found:?}");
        assert!(found[0].contains("must have at least 2 characters"));
        assert!(found.iter().any(|m| m.contains("byte value must be >= -128 and <= 127")));
        assert!(found.iter().any(|m| m.contains("must be less than or equal to 10")));
    }

    #[test]
    fn test_list_rules() {
        let found = messages("ns#L", serde_json::json!(["a", null, "a"]));
        assert_eq!(found.len(), 2);
        assert!(found[0].contains("Non-sparse list shape `ns#L` cannot contain null values"));
        assert!(found[1].contains("must have unique items"));
    }

    #[test]
    fn test_union_single_member() {
        assert!(messages("ns#U", serde_json::json!({"a": "x"})).is_empty());
        let found = messages("ns#U", serde_json::json!({"a": "x", "b": "y"}));
        assert!(found[0].starts_with("union values can contain a value for only a single member"));
    }
}
