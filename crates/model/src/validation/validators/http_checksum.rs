//! `aws.protocols#httpChecksum` configuration of operations

use crate::shapes::{Model, Shape, Trait};
use crate::traits::ids;
use crate::validation::Validator;
use smithy_semantic_common::{Node, ShapeType, ValidationEvent};

const CHECKSUM_HEADER_PREFIX: &str = "x-amz-checksum-";
const RESPONSE_ALGORITHMS: [&str; 4] = ["CRC32C", "CRC32", "SHA1", "SHA256"];

pub struct HttpChecksumTraitValidator;

impl Validator for HttpChecksumTraitValidator {
    fn name(&self) -> &str {
        "HttpChecksumTrait"
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for operation in model
            .shapes_with_trait(ids::HTTP_CHECKSUM)
            .filter(|s| s.shape_type == ShapeType::Operation)
        {
            if let Some(applied) = operation.get_trait(ids::HTTP_CHECKSUM) {
                self.validate_operation(model, operation, applied, &mut events);
            }
        }
        events
    }
}

impl HttpChecksumTraitValidator {
    fn validate_operation(
        &self,
        model: &Model,
        operation: &Shape,
        applied: &Trait,
        events: &mut Vec<ValidationEvent>,
    ) {
        let value = &applied.value;
        let string = |key: &str| value.get(key).and_then(Node::as_str);
        let algorithms: Vec<&str> = value
            .get("responseAlgorithms")
            .and_then(Node::as_array)
            .map(|items| items.iter().filter_map(Node::as_str).collect())
            .unwrap_or_default();
        let name = operation.id.name();
        let error = |message: String| {
            ValidationEvent::error(self.name(), message)
                .with_shape(&operation.id)
                .with_trait(&applied.id)
                .with_source(&applied.source)
        };

        let request_required = value
            .get("requestChecksumRequired")
            .and_then(Node::as_bool)
            .unwrap_or(false);
        let is_request = request_required || string("requestAlgorithmMember").is_some();
        let is_response = !algorithms.is_empty() || string("requestValidationModeMember").is_some();
        if !is_request && !is_response {
            events.push(error(
                "The `httpChecksum` trait must define at least one of the `request` or `response` \
                 checksum behavior"
                    .to_string(),
            ));
            return;
        }

        let operations = model.operation_index();
        let Some(input) = operations.input(model, &operation.id) else {
            events.push(error(format!(
                "Operations modeled with `httpChecksum` trait MUST have a modeled input, `{name}` \
                 does not."
            )));
            return;
        };

        for property in ["requestAlgorithmMember", "requestValidationModeMember"] {
            let Some(member_name) = string(property) else {
                continue;
            };
            match model.get_member(input, member_name) {
                None => events.push(error(format!(
                    "For operation `{name}`, expected name modeled with `{property}` property must \
                     correspond to an input member."
                ))),
                Some(member)
                    if !model
                        .target_of(member)
                        .is_some_and(|t| t.shape_type == ShapeType::Enum) =>
                {
                    events.push(error(format!(
                        "For operation `{name}`, input member name `{member_name}` modeled with \
                         `{property}` property of httpChecksum trait must be an enum shape."
                    )))
                }
                Some(_) => {}
            }
        }

        if is_request {
            self.check_headers(model, operation, input, events);
        }
        if !is_response {
            return;
        }

        if string("requestValidationModeMember").is_none() {
            events.push(error(format!(
                "For operation `{name}`, the `httpChecksum` trait must model \
                 `requestValidationModeMember` property to support response checksum behavior."
            )));
        } else if algorithms.is_empty() {
            events.push(error(format!(
                "For operation `{name}`, the `httpChecksum` trait must model `responseAlgorithms` \
                 property with at least one algorithm to support response checksum behavior."
            )));
        } else {
            for algorithm in &algorithms {
                if !RESPONSE_ALGORITHMS.contains(&algorithm.to_uppercase().as_str()) {
                    events.push(error(format!(
                        "For operation `{name}`, httpChecksum trait models an unsupported response \
                         algorithm `{algorithm}`. Supported algorithms are `{}`.",
                        RESPONSE_ALGORITHMS.join(", ")
                    )));
                }
            }
        }

        for error_id in operations.errors(&operation.id) {
            if let Some(error_shape) = model.get_shape(error_id) {
                self.check_headers(model, operation, error_shape, events);
            }
        }
        match operations.output(model, &operation.id) {
            Some(output) => self.check_headers(model, operation, output, events),
            None => events.push(error(format!(
                "Operations modeled with `httpChecksum` trait MUST have a modeled output, `{name}` \
                 does not."
            ))),
        }
    }

    /// Header bindings that overlap the checksum header prefix
    fn check_headers(
        &self,
        model: &Model,
        operation: &Shape,
        structure: &Shape,
        events: &mut Vec<ValidationEvent>,
    ) {
        for member in model.members(structure) {
            let member_name = member.member_name().unwrap_or_default();
            let prefix = member
                .trait_value(ids::HTTP_PREFIX_HEADERS)
                .and_then(Node::as_str);
            if let Some(prefix) = prefix {
                if CHECKSUM_HEADER_PREFIX.starts_with(prefix) {
                    events.push(
                        ValidationEvent::danger(
                            self.name(),
                            format!(
                                "The `httpPrefixHeaders` binding of `{member_name}` uses prefix \
                                 `{prefix}` that conflicts prefix `{CHECKSUM_HEADER_PREFIX}` used \
                                 by the `httpChecksum` trait."
                            ),
                        )
                        .with_shape(&operation.id),
                    );
                }
            }
            if let Some(header) = member.trait_value(ids::HTTP_HEADER).and_then(Node::as_str) {
                if header.to_lowercase().starts_with(CHECKSUM_HEADER_PREFIX) {
                    events.push(
                        ValidationEvent::warning(
                            self.name(),
                            format!(
                                "The `httpHeader` binding of `{header}` on `{member_name}` starts \
                                 with the prefix `{CHECKSUM_HEADER_PREFIX}` used by the \
                                 `httpChecksum` trait."
                            ),
                        )
                        .with_shape(&operation.id),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smithy_semantic_common::{OperationProperties, Severity, ShapeId, ShapeProperties};

    fn id(value: &str) -> ShapeId {
        ShapeId::parse(value).unwrap()
    }

    fn model(checksum: Node, header: Option<&str>) -> Model {
        let mut operation = Shape::new(id("ns#PutObject"), ShapeType::Operation);
        operation.properties = ShapeProperties::Operation(OperationProperties {
            input: Some(id("ns#PutObjectInput")),
            output: Some(id("ns#PutObjectOutput")),
            ..Default::default()
        });
        operation.add_trait(Trait::new(id("aws.protocols#httpChecksum"), checksum));

        let mut input = Shape::new(id("ns#PutObjectInput"), ShapeType::Structure);
        let mut shapes = Vec::new();
        let members = [
            ("algorithm", "ns#Algorithm"),
            ("mode", "ns#Mode"),
            ("checksum", "smithy.api#String"),
        ];
        for (name, target) in members {
            let member_id = input.id.with_member(name);
            input.members.insert(name.to_string(), member_id.clone());
            let mut member = Shape::member(member_id, Some(id(target)));
            if let (Some(header), "checksum") = (header, name) {
                member.add_trait(Trait::new(ShapeId::prelude("httpHeader"), Node::from(header)));
            }
            shapes.push(member);
        }
        shapes.extend([
            operation,
            input,
            Shape::new(id("ns#PutObjectOutput"), ShapeType::Structure),
            Shape::new(id("ns#Algorithm"), ShapeType::Enum),
            Shape::new(id("ns#Mode"), ShapeType::Enum),
            Shape::new(ShapeId::prelude("String"), ShapeType::String),
        ]);
        Model::new(shapes, Default::default())
    }

    fn config(algorithms: &[&str]) -> Node {
        Node::object([
            ("requestAlgorithmMember", Node::from("algorithm")),
            ("requestValidationModeMember", Node::from("mode")),
            (
                "responseAlgorithms",
                Node::from(algorithms.iter().map(|a| Node::from(*a)).collect::<Vec<_>>()),
            ),
        ])
    }

    #[test]
    fn test_valid_configuration() {
        let model = model(config(&["CRC32", "sha256"]), None);
        let events = HttpChecksumTraitValidator.validate(&model);
        assert!(events.is_empty(), "{events:?}");
    }

    #[test]
    fn test_empty_configuration() {
        let events = HttpChecksumTraitValidator.validate(&model(Node::empty_object(), None));
        assert_eq!(events.len(), 1);
        assert!(events[0].message.starts_with("The `httpChecksum` trait must define at least one"));
    }

    #[test]
    fn test_unsupported_algorithm() {
        let events = HttpChecksumTraitValidator.validate(&model(config(&["MD5"]), None));
        assert_eq!(events.len(), 1);
        assert!(events[0].message.contains("unsupported response algorithm `MD5`"));
    }

    #[test]
    fn test_member_must_target_enum() {
        let checksum = Node::object([("requestAlgorithmMember", Node::from("checksum"))]);
        let events = HttpChecksumTraitValidator.validate(&model(checksum, None));
        assert_eq!(events.len(), 1);
        assert!(events[0].message.ends_with("must be an enum shape."));
    }

    #[test]
    fn test_checksum_header_is_a_warning() {
        let model = model(config(&["CRC32"]), Some("x-amz-checksum-crc32"));
        let events = HttpChecksumTraitValidator.validate(&model);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, Severity::Warning);
        assert!(events[0]
            .message
            .starts_with("The `httpHeader` binding of `x-amz-checksum-crc32` on `checksum`"));
    }
}
