//! `aws.api#arn` templates against resource identifiers

use crate::knowledge::ArnTemplate;
use crate::shapes::{Model, Shape};
use crate::traits::ids;
use crate::validation::Validator;
use smithy_semantic_common::{is_valid_identifier, ShapeType, ValidationEvent};

pub struct ArnTemplateValidator;

impl Validator for ArnTemplateValidator {
    fn name(&self) -> &str {
        "ArnTemplate"
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let mut events = Vec::new();

        for resource in model
            .shapes_with_trait(ids::AWS_ARN)
            .filter(|s| s.shape_type == ShapeType::Resource)
        {
            let Some(applied) = resource.get_trait(ids::AWS_ARN) else {
                continue;
            };
            let Some(template) = ArnTemplate::from_node(&applied.value) else {
                continue;
            };
            let error = |message: String| {
                ValidationEvent::error(self.name(), message)
                    .with_shape(&resource.id)
                    .with_trait(&applied.id)
                    .with_source(&applied.source)
            };

            if template.absolute && !template.template.starts_with("arn:") {
                events.push(error(format!(
                    "Absolute ARN template `{}` must start with `arn:`",
                    template.template
                )));
            }
            if has_unbalanced_braces(&template.template) {
                events.push(error(format!(
                    "ARN template `{}` contains an unterminated or nested label",
                    template.template
                )));
                continue;
            }

            events.extend(check_labels(resource, &template).into_iter().map(error));
        }
        events
    }
}

/// Label problems of a template, one message per label
fn check_labels(resource: &Shape, template: &ArnTemplate) -> Vec<String> {
    let identifiers: Vec<&str> = resource
        .properties
        .as_resource()
        .map(|r| r.identifiers.keys().map(String::as_str).collect())
        .unwrap_or_default();
    let labels = template.labels();
    let mut messages = Vec::new();

    for label in &labels {
        if !is_valid_identifier(label) {
            messages.push(format!(
                "ARN template `{}` contains an invalid label: {label}",
                template.template
            ));
        } else if !identifiers.contains(label) {
            messages.push(format!(
                "ARN template `{}` contains an extraneous label: {label}",
                template.template
            ));
        }
    }
    for identifier in &identifiers {
        if !labels.contains(identifier) {
            messages.push(format!(
                "ARN template `{}` is missing identifier: {identifier}",
                template.template
            ));
        }
    }
    messages
}

fn has_unbalanced_braces(template: &str) -> bool {
    let mut open = false;
    for c in template.chars() {
        match c {
            '{' if open => return true,
            '{' => open = true,
            '}' if !open => return true,
            '}' => open = false,
            _ => {}
        }
    }
    open
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Trait;
    use smithy_semantic_common::{Node, ResourceProperties, ShapeId, ShapeProperties};

    fn model(template: &str) -> Model {
        let mut resource = Shape::new(ShapeId::parse("ns#Thing").unwrap(), ShapeType::Resource);
        resource.properties = ShapeProperties::Resource(ResourceProperties {
            identifiers: ["a", "b"]
                .into_iter()
                .map(|name| (name.to_string(), ShapeId::prelude("String")))
                .collect(),
            ..Default::default()
        });
        resource.add_trait(Trait::new(
            ShapeId::parse("aws.api#arn").unwrap(),
            Node::object([("template", Node::from(template))]),
        ));
        Model::new(vec![resource], Default::default())
    }

    #[test]
    fn test_labels_match_identifiers() {
        assert!(ArnTemplateValidator.validate(&model("things/{a}/{b}")).is_empty());
    }

    #[test]
    fn test_missing_identifier() {
        let events = ArnTemplateValidator.validate(&model("things/{a}"));
        assert_eq!(events.len(), 1);
        assert!(events[0].message.ends_with("missing identifier: b"));
    }

    #[test]
    fn test_extraneous_label() {
        let events = ArnTemplateValidator.validate(&model("things/{a}/{b}/{c}"));
        assert_eq!(events.len(), 1);
        assert!(events[0].message.ends_with("extraneous label: c"));
        assert_eq!(events[0].trait_id, Some(ShapeId::parse("aws.api#arn").unwrap()));
    }

    #[test]
    fn test_label_grammar() {
        let events = ArnTemplateValidator.validate(&model("things/{a}/{b}/{not-valid}"));
        assert_eq!(events.len(), 1);
        assert!(events[0].message.ends_with("invalid label: not-valid"));
    }

    #[test]
    fn test_unterminated_label() {
        let events = ArnTemplateValidator.validate(&model("things/{a}/{b"));
        assert_eq!(events.len(), 1);
        assert!(events[0].message.contains("unterminated"));
    }
}
