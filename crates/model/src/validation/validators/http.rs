//! HTTP binding traits of operations, their members and their routes

use crate::knowledge::{HttpBinding, HttpLocation, HttpRoute, UriSegment};
use crate::shapes::{Model, Shape};
use crate::traits::ids;
use crate::validation::Validator;
use regex::Regex;
use smithy_semantic_common::{ShapeId, ShapeType, ValidationEvent};
use std::collections::BTreeMap;

const BINDING_TRAITS: [&str; 6] = [
    ids::HTTP_LABEL,
    ids::HTTP_HEADER,
    ids::HTTP_QUERY,
    ids::HTTP_QUERY_PARAMS,
    ids::HTTP_PREFIX_HEADERS,
    ids::HTTP_PAYLOAD,
];

/// Exclusive binding traits, payload placement and duplicate locations
pub struct HttpBindingsValidator;

impl Validator for HttpBindingsValidator {
    fn name(&self) -> &str {
        "HttpBinding"
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let mut events = Vec::new();

        for structure in model.shapes_of_type(ShapeType::Structure) {
            let mut payloads = Vec::new();
            for member in model.members(structure) {
                let applied: Vec<&str> = BINDING_TRAITS
                    .iter()
                    .copied()
                    .filter(|t| member.has_trait(t))
                    .collect();
                if applied.len() > 1 {
                    let names: Vec<String> =
                        applied.iter().map(|t| format!("`{}`", short(t))).collect();
                    events.push(self.error(
                        member,
                        format!(
                            "Member has conflicting HTTP binding traits applied: {}. Only one HTTP \
                             binding trait can be applied to a member.",
                            names.join(", ")
                        ),
                    ));
                }
                if member.has_trait(ids::HTTP_PAYLOAD) {
                    payloads.push(member.member_name().unwrap_or_default());
                }
            }
            if payloads.len() > 1 {
                events.push(self.error(
                    structure,
                    format!(
                        "Only a single member of a structure can be bound to the HTTP payload, but \
                         found: {}",
                        ticked(payloads.iter().copied())
                    ),
                ));
            }
        }

        let index = model.http_binding_index();
        let operations = model.operation_index();
        for operation in model.shapes_of_type(ShapeType::Operation) {
            if !operation.has_trait(ids::HTTP) {
                continue;
            }
            if let Some(input) = operations.input(model, &operation.id) {
                let bindings = index.request_bindings(&operation.id);
                self.check_structure(input, bindings, true, &mut events);
            }
            if let Some(output) = operations.output(model, &operation.id) {
                let bindings = index.response_bindings(&operation.id);
                self.check_structure(output, bindings, false, &mut events);
            }
        }
        for error in model.shapes_with_trait(ids::ERROR) {
            self.check_structure(error, index.response_bindings(&error.id), false, &mut events);
        }
        events
    }
}

impl HttpBindingsValidator {
    fn check_structure(
        &self,
        structure: &Shape,
        bindings: &[HttpBinding],
        is_request: bool,
        events: &mut Vec<ValidationEvent>,
    ) {
        let has_payload = bindings.iter().any(|b| b.location == HttpLocation::Payload);
        let unbound: Vec<&str> = bindings
            .iter()
            .filter(|b| b.location == HttpLocation::Unbound)
            .map(|b| b.member_name.as_str())
            .collect();
        if has_payload && !unbound.is_empty() {
            events.push(self.error(
                structure,
                format!(
                    "A member of this structure is bound to the HTTP payload, so every other \
                     member must be bound to an HTTP location, but the following members are not: \
                     {}",
                    ticked(unbound.into_iter())
                ),
            ));
        }

        let mut headers: BTreeMap<String, Vec<&str>> = BTreeMap::new();
        let mut queries: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for binding in bindings {
            match binding.location {
                HttpLocation::Header => headers
                    .entry(binding.location_name.to_lowercase())
                    .or_default()
                    .push(&binding.member_name),
                HttpLocation::Query if is_request => queries
                    .entry(binding.location_name.as_str())
                    .or_default()
                    .push(&binding.member_name),
                _ => {}
            }
        }
        for (header, members) in headers.iter().filter(|(_, m)| m.len() > 1) {
            events.push(self.error(
                structure,
                format!(
                    "`{header}` is bound to multiple members as an HTTP header: {}",
                    ticked(members.iter().copied())
                ),
            ));
        }
        for (key, members) in queries.iter().filter(|(_, m)| m.len() > 1) {
            events.push(self.error(
                structure,
                format!(
                    "`{key}` is bound to multiple members as an HTTP query string parameter: {}",
                    ticked(members.iter().copied())
                ),
            ));
        }
    }

    fn error(&self, shape: &Shape, message: String) -> ValidationEvent {
        ValidationEvent::error(self.name(), message)
            .with_shape(&shape.id)
            .with_source(&shape.source)
    }
}

/// URI labels against `httpLabel` input members
pub struct HttpLabelValidator;

impl Validator for HttpLabelValidator {
    fn name(&self) -> &str {
        "HttpLabelTrait"
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let index = model.http_binding_index();
        let operations = model.operation_index();
        let mut events = Vec::new();

        for operation in model.shapes_with_trait(ids::HTTP) {
            if let Some(message) = index.route_error(&operation.id) {
                let message = format!("Invalid `http` trait `uri`: {message}");
                events.push(self.error(operation, message));
                continue;
            }
            let Some(route) = index.route(&operation.id) else {
                continue;
            };
            let input = operations.input(model, &operation.id);
            self.check_route(model, operation, route, input, &mut events);
        }
        events
    }
}

impl HttpLabelValidator {
    fn check_route(
        &self,
        model: &Model,
        operation: &Shape,
        route: &HttpRoute,
        input: Option<&Shape>,
        events: &mut Vec<ValidationEvent>,
    ) {
        let labels: Vec<(&str, bool)> = route.uri.labels().collect();

        if let Some(position) = labels.iter().position(|(_, greedy)| *greedy) {
            if position + 1 != labels.len() {
                events.push(self.error(
                    operation,
                    format!(
                        "Greedy label `{{{}+}}` must be the last label in the `http` trait URI \
                         `{}`",
                        labels[position].0, route.uri
                    ),
                ));
            }
        }

        for (label, _) in &labels {
            let member = input.and_then(|s| model.get_member(s, label));
            match member {
                Some(member) if member.has_trait(ids::HTTP_LABEL) => {
                    if !member.has_trait(ids::REQUIRED) {
                        events.push(self.error(
                            member,
                            format!(
                                "This member is bound to the `{{{label}}}` URI label with \
                                 `httpLabel` and must be marked as required"
                            ),
                        ));
                    }
                }
                _ => events.push(self.error(
                    operation,
                    format!(
                        "This `uri` pattern label `{{{label}}}` does not correspond to an input \
                         member marked with the `httpLabel` trait"
                    ),
                )),
            }
        }

        let Some(input) = input else {
            return;
        };
        for member in model.members(input).filter(|m| m.has_trait(ids::HTTP_LABEL)) {
            let name = member.member_name().unwrap_or_default();
            if route.uri.label(name).is_none() {
                events.push(self.error(
                    member,
                    format!(
                        "This `{name}` structure member is marked with the `httpLabel` trait, but \
                         no corresponding `http` URI label could be found when used as the input \
                         of the `{}` operation.",
                        operation.id
                    ),
                ));
            }
        }
    }

    fn error(&self, shape: &Shape, message: String) -> ValidationEvent {
        ValidationEvent::error(self.name(), message)
            .with_shape(&shape.id)
            .with_source(&shape.source)
    }
}

/// Operations in one service that route the same method to overlapping URIs
pub struct HttpUriConflictValidator;

impl Validator for HttpUriConflictValidator {
    fn name(&self) -> &str {
        "HttpUriConflict"
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let index = model.http_binding_index();
        let top_down = model.top_down_index();
        let mut events = Vec::new();

        for service in model.shapes_of_type(ShapeType::Service) {
            let routes: Vec<(&ShapeId, &HttpRoute)> = top_down
                .contained_operations(&service.id)
                .filter_map(|op| index.route(op).map(|route| (op, route)))
                .collect();

            for (operation_id, route) in &routes {
                let Some(operation) = model.get_shape(operation_id) else {
                    continue;
                };
                let mut conflicts = Vec::new();
                let mut allowable = Vec::new();
                for (other_id, other) in &routes {
                    if other_id == operation_id
                        || other.method != route.method
                        || !other.uri.conflicts_with(&route.uri)
                    {
                        continue;
                    }
                    let entry = format!("`{other_id}` ({})", other.uri);
                    if is_allowable_conflict(model, operation_id, route, other_id, other) {
                        allowable.push(entry);
                    } else {
                        conflicts.push(entry);
                    }
                }

                if !conflicts.is_empty() {
                    events.push(
                        ValidationEvent::error(self.name(), format_conflicts(route, conflicts))
                            .with_shape(&operation.id)
                            .with_source(&operation.source),
                    );
                }
                if !allowable.is_empty() {
                    events.push(
                        ValidationEvent::danger(
                            self.name(),
                            format!(
                                "{}. Pattern traits applied to the label members prevent the label \
                                 value from evaluating to a conflict, but this is still a poor \
                                 design. If this is acceptable, this can be suppressed.",
                                format_conflicts(route, allowable)
                            ),
                        )
                        .with_shape(&operation.id)
                        .with_source(&operation.source),
                    );
                }
            }
        }
        events
    }
}

/// Every label that overlaps a literal has a `pattern` that rejects it
fn is_allowable_conflict(
    model: &Model,
    operation: &ShapeId,
    route: &HttpRoute,
    other_operation: &ShapeId,
    other: &HttpRoute,
) -> bool {
    let segments = route.uri.conflicting_label_segments(&other.uri);
    if segments.is_empty() {
        return false;
    }
    let patterns = label_patterns(model, operation);
    let other_patterns = label_patterns(model, other_operation);

    segments.into_iter().all(|pair| {
        let (pattern, literal) = match pair {
            (UriSegment::Label { name, .. }, UriSegment::Literal(literal)) => {
                (patterns.get(name.as_str()), literal)
            }
            (UriSegment::Literal(literal), UriSegment::Label { name, .. }) => {
                (other_patterns.get(name.as_str()), literal)
            }
            _ => return false,
        };
        pattern.is_some_and(|pattern| !pattern.is_match(literal))
    })
}

/// Compiled `pattern` of each label member, from the member or its target
fn label_patterns(model: &Model, operation: &ShapeId) -> BTreeMap<String, Regex> {
    let index = model.http_binding_index();
    index
        .request_bindings_at(operation, HttpLocation::Label)
        .filter_map(|binding| {
            let member = model.get_shape(&binding.member)?;
            let pattern = member
                .trait_value(ids::PATTERN)
                .or_else(|| model.target_of(member).and_then(|t| t.trait_value(ids::PATTERN)))?
                .as_str()?;
            let regex = Regex::new(pattern).ok()?;
            Some((binding.member_name.clone(), regex))
        })
        .collect()
}

fn format_conflicts(route: &HttpRoute, mut conflicts: Vec<String>) -> String {
    conflicts.sort();
    format!(
        "Operation URI, `{}`, conflicts with other operation URIs in the same service: [{}]",
        route.uri,
        conflicts.join(", ")
    )
}

fn short(trait_id: &str) -> &str {
    trait_id.rsplit('#').next().unwrap_or(trait_id)
}

fn ticked<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.map(|n| format!("`{n}`")).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Trait;
    use smithy_semantic_common::{
        Node, OperationProperties, ServiceProperties, ShapeProperties, Severity,
    };

    fn id(value: &str) -> ShapeId {
        ShapeId::parse(value).unwrap()
    }

    fn http(method: &str, uri: &str) -> Trait {
        Trait::new(
            ShapeId::prelude("http"),
            Node::object([("method", Node::from(method)), ("uri", Node::from(uri))]),
        )
    }

    fn trait_of(name: &str, value: Node) -> Trait {
        Trait::new(ShapeId::prelude(name), value)
    }

    /// Operation with an input structure whose members carry the given traits
    fn operation(name: &str, route: Trait, members: Vec<(&str, Vec<Trait>)>) -> Vec<Shape> {
        let mut op = Shape::new(id(name), ShapeType::Operation);
        let input_id = id(&format!("{name}Input"));
        op.properties = ShapeProperties::Operation(OperationProperties {
            input: Some(input_id.clone()),
            ..Default::default()
        });
        op.add_trait(route);
        let mut input = Shape::new(input_id, ShapeType::Structure);
        let mut shapes = vec![op];
        for (member, traits) in members {
            let member_id = input.id.with_member(member);
            input.members.insert(member.to_string(), member_id.clone());
            let mut shape = Shape::member(member_id, Some(ShapeId::prelude("String")));
            for applied in traits {
                shape.add_trait(applied);
            }
            shapes.push(shape);
        }
        shapes.push(input);
        shapes
    }

    fn model(mut shapes: Vec<Shape>, operations: &[&str]) -> Model {
        let mut service = Shape::new(id("ns#Svc"), ShapeType::Service);
        service.properties = ShapeProperties::Service(ServiceProperties {
            operations: operations.iter().map(|o| id(o)).collect(),
            ..Default::default()
        });
        shapes.push(service);
        shapes.push(Shape::new(ShapeId::prelude("String"), ShapeType::String));
        Model::new(shapes, Default::default())
    }

    fn label() -> Vec<Trait> {
        vec![
            trait_of("httpLabel", Node::empty_object()),
            trait_of("required", Node::empty_object()),
        ]
    }

    #[test]
    fn test_conflicting_binding_traits() {
        let shapes = operation(
            "ns#Put",
            http("PUT", "/things"),
            vec![(
                "a",
                vec![
                    trait_of("httpHeader", Node::from("X-A")),
                    trait_of("httpQuery", Node::from("a")),
                ],
            )],
        );
        let events = HttpBindingsValidator.validate(&model(shapes, &["ns#Put"]));
        assert_eq!(events.len(), 1);
        assert!(events[0].message.contains("`httpHeader`, `httpQuery`"));
    }

    #[test]
    fn test_payload_excludes_document_members() {
        let shapes = operation(
            "ns#Put",
            http("PUT", "/things"),
            vec![
                ("body", vec![trait_of("httpPayload", Node::empty_object())]),
                ("extra", vec![]),
            ],
        );
        let events = HttpBindingsValidator.validate(&model(shapes, &["ns#Put"]));
        assert_eq!(events.len(), 1);
        assert!(events[0].message.ends_with("the following members are not: `extra`"));
    }

    #[test]
    fn test_duplicate_headers_ignore_case() {
        let shapes = operation(
            "ns#Put",
            http("PUT", "/things"),
            vec![
                ("a", vec![trait_of("httpHeader", Node::from("X-Thing"))]),
                ("b", vec![trait_of("httpHeader", Node::from("x-thing"))]),
            ],
        );
        let events = HttpBindingsValidator.validate(&model(shapes, &["ns#Put"]));
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].message,
            "`x-thing` is bound to multiple members as an HTTP header: `a`, `b`"
        );
    }

    #[test]
    fn test_labels_and_members_correspond() {
        let shapes = operation(
            "ns#Get",
            http("GET", "/things/{id}/{version}"),
            vec![("id", label()), ("other", label())],
        );
        let events = HttpLabelValidator.validate(&model(shapes, &["ns#Get"]));
        assert_eq!(events.len(), 2);
        assert!(events[0].message.contains("label `{version}` does not correspond"));
        assert!(events[1]
            .message
            .starts_with("This `other` structure member is marked with the `httpLabel` trait"));
    }

    #[test]
    fn test_label_member_must_be_required() {
        let shapes = operation(
            "ns#Get",
            http("GET", "/things/{id}"),
            vec![("id", vec![trait_of("httpLabel", Node::empty_object())])],
        );
        let events = HttpLabelValidator.validate(&model(shapes, &["ns#Get"]));
        assert_eq!(events.len(), 1);
        assert!(events[0].message.ends_with("must be marked as required"));
    }

    #[test]
    fn test_greedy_label_must_be_last() {
        let shapes = operation(
            "ns#Get",
            http("GET", "/things/{path+}/{id}"),
            vec![("path", label()), ("id", label())],
        );
        let events = HttpLabelValidator.validate(&model(shapes, &["ns#Get"]));
        assert_eq!(events.len(), 1);
        assert!(events[0].message.starts_with("Greedy label `{path+}` must be the last label"));
    }

    #[test]
    fn test_uri_conflict_is_an_error() {
        let mut shapes = operation("ns#GetA", http("GET", "/things/{id}"), vec![("id", label())]);
        shapes.extend(operation("ns#GetB", http("GET", "/things/{name}"), vec![("name", label())]));
        shapes.extend(operation("ns#PutB", http("PUT", "/things/{name}"), vec![("name", label())]));
        let model = model(shapes, &["ns#GetA", "ns#GetB", "ns#PutB"]);
        let events = HttpUriConflictValidator.validate(&model);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.severity == Severity::Error));
        assert!(events[0]
            .message
            .starts_with("Operation URI, `/things/{id}`, conflicts with other operation URIs in \
                          the same service"));
    }

    #[test]
    fn test_pattern_makes_conflict_a_danger() {
        let mut id_label = label();
        id_label.push(trait_of("pattern", Node::from("^[0-9]+$")));
        let mut shapes =
            operation("ns#GetThing", http("GET", "/things/{id}"), vec![("id", id_label)]);
        shapes.extend(operation("ns#GetLatest", http("GET", "/things/latest"), vec![]));
        let model = model(shapes, &["ns#GetThing", "ns#GetLatest"]);
        let events = HttpUriConflictValidator.validate(&model);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.severity == Severity::Danger));
    }
}
