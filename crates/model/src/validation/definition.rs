//! Validators declared in configuration or in the `validators` metadata key

use super::Validator;
use crate::selector::Selector;
use crate::shapes::{Model, Shape};
use serde::{Deserialize, Serialize};
use smithy_semantic_common::{Node, Severity, ShapeId, ValidationEvent};

/// Event id used for problems with validator definitions themselves
pub(crate) const DEFINITION_EVENT: &str = "ValidatorDefinition";

/// A declared validator
///
/// `name` picks the implementation; `id`, `severity`, `message` and
/// `namespaces` rewrite or filter the events it emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    /// Replaces event messages; `{super}` is replaced by the original message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Only report shapes in these namespaces; empty means all
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub namespaces: Vec<String>,
    #[serde(default)]
    pub configuration: ValidatorConfiguration,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_to_trait: Option<ShapeId>,
}

impl ValidatorDefinition {
    /// Read a definition from a metadata node
    pub fn from_node(node: &Node) -> Result<Self, String> {
        serde_json::from_value(node.to_json()).map_err(|e| e.to_string())
    }

    /// Event id of the events this definition emits
    pub fn event_id(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.name)
    }

    /// Build the validator; an unknown name or bad configuration is an
    /// ERROR event
    pub fn build(&self) -> Result<Box<dyn Validator>, ValidationEvent> {
        let inner = match self.name.as_str() {
            "EmitEachSelector" => EmitEachSelector::from_configuration(&self.configuration)
                .map_err(|message| self.invalid(message))?,
            other => return Err(self.invalid(format!("Unknown validator `{other}`"))),
        };
        Ok(Box::new(DefinedValidator {
            definition: self.clone(),
            inner: Box::new(inner),
        }))
    }

    fn invalid(&self, message: impl Into<String>) -> ValidationEvent {
        ValidationEvent::error(
            DEFINITION_EVENT,
            format!("Invalid `{}` validator definition: {}", self.event_id(), message.into()),
        )
    }

    fn decorate(&self, mut event: ValidationEvent) -> ValidationEvent {
        event.id = self.event_id().to_string();
        if let Some(severity) = self.severity {
            event.severity = severity;
        }
        if let Some(message) = &self.message {
            event.message = message.replace("{super}", &event.message);
        }
        event
    }

    fn in_scope(&self, event: &ValidationEvent) -> bool {
        if self.namespaces.is_empty() {
            return true;
        }
        event
            .shape_id
            .as_ref()
            .is_some_and(|id| self.namespaces.iter().any(|ns| ns == id.namespace()))
    }
}

struct DefinedValidator {
    definition: ValidatorDefinition,
    inner: Box<dyn Validator>,
}

impl Validator for DefinedValidator {
    fn name(&self) -> &str {
        self.definition.event_id()
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        self.inner
            .validate(model)
            .into_iter()
            .filter(|e| self.definition.in_scope(e))
            .map(|e| self.definition.decorate(e))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TemplatePart {
    Literal(String),
    /// `@{id|name}`, `@{trait|documentation}`
    Attribute(Vec<String>),
}

/// Emits a DANGER event for every shape matched by a selector
pub struct EmitEachSelector {
    selector: Selector,
    bind_to_trait: Option<ShapeId>,
    template: Option<Vec<TemplatePart>>,
}

impl EmitEachSelector {
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            bind_to_trait: None,
            template: None,
        }
    }

    fn from_configuration(configuration: &ValidatorConfiguration) -> Result<Self, String> {
        let expression = configuration
            .selector
            .as_deref()
            .ok_or_else(|| "`selector` is required".to_string())?;
        let selector = Selector::parse(expression).map_err(|e| e.to_string())?;
        let template = configuration
            .message_template
            .as_deref()
            .map(parse_template)
            .transpose()?;
        Ok(Self {
            selector,
            bind_to_trait: configuration.bind_to_trait.clone(),
            template,
        })
    }

    fn message(&self, shape: &Shape) -> String {
        match &self.template {
            None => format!("Selector capture matched selector: {}", self.selector),
            Some(parts) => parts
                .iter()
                .map(|part| match part {
                    TemplatePart::Literal(text) => text.clone(),
                    TemplatePart::Attribute(path) => expand_attribute(shape, path),
                })
                .collect(),
        }
    }
}

impl Validator for EmitEachSelector {
    fn name(&self) -> &str {
        "EmitEachSelector"
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        if let Some(bound) = &self.bind_to_trait {
            let bound = bound.to_string();
            if model.shapes_with_trait(&bound).next().is_none() {
                return Vec::new();
            }
        }

        self.selector
            .select(model)
            .into_iter()
            .filter_map(|shape| {
                let source = match &self.bind_to_trait {
                    None => shape.source.clone(),
                    Some(bound) => shape.get_trait(&bound.to_string())?.source.clone(),
                };
                let mut event = ValidationEvent::danger(self.name(), self.message(shape))
                    .with_shape(&shape.id)
                    .with_source(&source);
                if let Some(bound) = &self.bind_to_trait {
                    event = event.with_trait(bound);
                }
                Some(event)
            })
            .collect()
    }
}

fn parse_template(template: &str) -> Result<Vec<TemplatePart>, String> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut chars = template.char_indices().peekable();

    while let Some((position, c)) = chars.next() {
        if c != '@' {
            literal.push(c);
            continue;
        }
        match chars.peek().map(|(_, c)| *c) {
            Some('@') => {
                chars.next();
                literal.push('@');
            }
            Some('{') => {
                chars.next();
                let mut path = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    path.push(c);
                }
                if !closed || path.trim().is_empty() {
                    return Err(format!(
                        "Invalid message template `{template}`: unterminated attribute at position \
                         {position}"
                    ));
                }
                if !literal.is_empty() {
                    parts.push(TemplatePart::Literal(std::mem::take(&mut literal)));
                }
                parts.push(TemplatePart::Attribute(
                    path.split('|').map(|s| s.trim().to_string()).collect(),
                ));
            }
            _ => {
                return Err(format!(
                    "Invalid message template `{template}`: `@` must be followed by `{{` or `@` at \
                     position {position}"
                ))
            }
        }
    }

    if !literal.is_empty() {
        parts.push(TemplatePart::Literal(literal));
    }
    Ok(parts)
}

fn expand_attribute(shape: &Shape, path: &[String]) -> String {
    let segments: Vec<&str> = path.iter().map(String::as_str).collect();
    match segments.as_slice() {
        ["id"] => shape.id.to_string(),
        ["id", "name"] => shape.id.name().to_string(),
        ["id", "namespace"] => shape.id.namespace().to_string(),
        ["id", "member"] => shape.id.member().unwrap_or_default().to_string(),
        ["trait", name, rest @ ..] => {
            let Some(trait_id) = crate::selector::resolve_trait_name(name) else {
                return String::new();
            };
            let mut value = shape.trait_value(&trait_id.to_string());
            for key in rest {
                value = value.and_then(|v| v.get(key));
            }
            match value {
                Some(Node::String(text)) => text.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            }
        }
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Trait;
    use smithy_semantic_common::ShapeType;

    fn model() -> Model {
        let mut documented =
            Shape::new(ShapeId::parse("ns.foo#Documented").unwrap(), ShapeType::String);
        documented.add_trait(Trait::new(ShapeId::prelude("documentation"), Node::from("hello")));
        let plain = Shape::new(ShapeId::parse("ns.foo#Plain").unwrap(), ShapeType::String);
        let other = Shape::new(ShapeId::parse("ns.bar#Other").unwrap(), ShapeType::String);
        Model::new(vec![documented, plain, other], Default::default())
    }

    fn definition(yaml: &str) -> ValidatorDefinition {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_emit_each_selector_defaults() {
        let validator = definition(
            r#"
name: EmitEachSelector
configuration:
  selector: "string:not([trait|documentation])"
"#,
        )
        .build()
        .unwrap();
        let events = validator.validate(&model());
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.severity == Severity::Danger));
        assert!(events.iter().all(|e| e.id == "EmitEachSelector"));
        assert_eq!(
            events[0].message,
            "Selector capture matched selector: string:not([trait|documentation])"
        );
    }

    #[test]
    fn test_definition_rewrites_events() {
        let validator = definition(
            r#"
name: EmitEachSelector
id: NoDocs
severity: WARNING
message: "Add docs. {super}"
namespaces: [ns.foo]
configuration:
  selector: "string:not([trait|documentation])"
  messageTemplate: "@{id|name} has no docs"
"#,
        )
        .build()
        .unwrap();
        assert_eq!(validator.name(), "NoDocs");

        let events = validator.validate(&model());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "NoDocs");
        assert_eq!(events[0].severity, Severity::Warning);
        assert_eq!(events[0].message, "Add docs. Plain has no docs");
    }

    #[test]
    fn test_bind_to_trait() {
        let validator = definition(
            r#"
name: EmitEachSelector
configuration:
  selector: string
  bindToTrait: smithy.api#documentation
  messageTemplate: "docs: @{trait|documentation} @@ 100%"
"#,
        )
        .build()
        .unwrap();
        let events = validator.validate(&model());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].message, "docs: hello @ 100%");
        assert_eq!(
            events[0].trait_id.as_ref().map(ToString::to_string).as_deref(),
            Some("smithy.api#documentation")
        );
    }

    #[test]
    fn test_invalid_definitions() {
        let err = definition("name: Nope").build().err().unwrap();
        assert!(err.is_error());
        assert!(err.message.contains("Unknown validator `Nope`"));

        let err = definition("name: EmitEachSelector").build().err().unwrap();
        assert!(err.message.contains("`selector` is required"));

        let err = definition(
            r#"
name: EmitEachSelector
configuration:
  selector: string
  messageTemplate: "@{id"
"#,
        )
        .build()
        .err()
        .unwrap();
        assert!(err.message.contains("unterminated attribute"));
    }
}
