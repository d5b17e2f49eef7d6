//! HTTP message locations of operation and error members

use crate::shapes::{Model, Shape};
use crate::traits::ids;
use smithy_semantic_common::{ShapeId, ShapeType};
use std::collections::BTreeMap;
use std::fmt;

/// Where a member is placed in an HTTP message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpLocation {
    Label,
    Header,
    PrefixHeaders,
    Query,
    QueryParams,
    Payload,
    ResponseCode,
    /// Serialized in the protocol's document body
    Document,
    /// Not serialized because another member is the payload
    Unbound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpBinding {
    pub member: ShapeId,
    pub member_name: String,
    pub location: HttpLocation,
    /// Header name, query key, or member name
    pub location_name: String,
}

/// One segment of a URI path template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UriSegment {
    Literal(String),
    Label { name: String, greedy: bool },
}

impl fmt::Display for UriSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UriSegment::Literal(value) => f.write_str(value),
            UriSegment::Label { name, greedy: true } => write!(f, "{{{name}+}}"),
            UriSegment::Label { name, .. } => write!(f, "{{{name}}}"),
        }
    }
}

/// Parsed `uri` of the `http` trait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriPattern {
    pub segments: Vec<UriSegment>,
    /// Literal query string parameters, e.g. `?type=foo`
    pub query: Vec<(String, Option<String>)>,
}

impl UriPattern {
    pub fn parse(uri: &str) -> Result<Self, String> {
        let path = uri
            .strip_prefix('/')
            .ok_or_else(|| format!("URI pattern must start with `/`: `{uri}`"))?;
        let (path, query) = match path.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (path, None),
        };
        if path.contains("//") {
            return Err(format!("URI pattern contains an empty segment: `{uri}`"));
        }

        let mut segments = Vec::new();
        for raw in path.split('/').filter(|s| !s.is_empty()) {
            if let Some(inner) = raw.strip_prefix('{') {
                let inner = inner
                    .strip_suffix('}')
                    .ok_or_else(|| format!("Label segment must be enclosed in braces: `{raw}`"))?;
                let (name, greedy) = match inner.strip_suffix('+') {
                    Some(name) => (name, true),
                    None => (inner, false),
                };
                if name.is_empty() || name.contains(['{', '}']) {
                    return Err(format!("Invalid label segment: `{raw}`"));
                }
                segments.push(UriSegment::Label {
                    name: name.to_string(),
                    greedy,
                });
            } else if raw.contains(['{', '}']) {
                return Err(format!("Literal segment contains a label character: `{raw}`"));
            } else {
                segments.push(UriSegment::Literal(raw.to_string()));
            }
        }

        let mut literals = Vec::new();
        for pair in query.into_iter().flat_map(|q| q.split('&')).filter(|p| !p.is_empty()) {
            if pair.contains(['{', '}']) {
                return Err(format!("Query string literals cannot contain labels: `{pair}`"));
            }
            match pair.split_once('=') {
                Some((key, value)) => literals.push((key.to_string(), Some(value.to_string()))),
                None => literals.push((pair.to_string(), None)),
            }
        }

        Ok(Self {
            segments,
            query: literals,
        })
    }

    pub fn labels(&self) -> impl Iterator<Item = (&str, bool)> {
        self.segments.iter().filter_map(|s| match s {
            UriSegment::Label { name, greedy } => Some((name.as_str(), *greedy)),
            UriSegment::Literal(_) => None,
        })
    }

    pub fn label(&self, name: &str) -> Option<&UriSegment> {
        self.segments
            .iter()
            .find(|s| matches!(s, UriSegment::Label { name: n, .. } if n == name))
    }

    /// Whether both patterns can match the same request path
    ///
    /// A label conflicts with a literal at the same position because the
    /// label value may equal the literal. A greedy label stands in for one or
    /// more segments. Query literals are compared without regard to order.
    pub fn conflicts_with(&self, other: &UriPattern) -> bool {
        self.sorted_query() == other.sorted_query()
            && segments_overlap(&self.segments, &other.segments)
    }

    fn sorted_query(&self) -> Vec<&(String, Option<String>)> {
        let mut query: Vec<_> = self.query.iter().collect();
        query.sort();
        query
    }

    /// Segment pairs at the same position where one side is a label
    pub fn conflicting_label_segments<'a>(
        &'a self,
        other: &'a UriPattern,
    ) -> Vec<(&'a UriSegment, &'a UriSegment)> {
        self.segments
            .iter()
            .zip(&other.segments)
            .filter(|(a, b)| {
                matches!(a, UriSegment::Label { .. }) || matches!(b, UriSegment::Label { .. })
            })
            .collect()
    }
}

fn is_greedy(segment: &UriSegment) -> bool {
    matches!(segment, UriSegment::Label { greedy: true, .. })
}

fn segments_overlap(a: &[UriSegment], b: &[UriSegment]) -> bool {
    match (a.split_first(), b.split_first()) {
        (None, None) => true,
        (None, _) | (_, None) => false,
        (Some((x, a_rest)), Some((y, b_rest))) if is_greedy(x) && is_greedy(y) => {
            segments_overlap(a_rest, b_rest)
        }
        (Some((x, a_rest)), _) if is_greedy(x) => greedy_overlap(a_rest, b),
        (_, Some((y, b_rest))) if is_greedy(y) => greedy_overlap(b_rest, a),
        (Some((UriSegment::Literal(x), a_rest)), Some((UriSegment::Literal(y), b_rest))) => {
            x == y && segments_overlap(a_rest, b_rest)
        }
        (Some((_, a_rest)), Some((_, b_rest))) => segments_overlap(a_rest, b_rest),
    }
}

/// A greedy label followed by `rest` against `path`; the label takes at least one segment
fn greedy_overlap(rest: &[UriSegment], path: &[UriSegment]) -> bool {
    (1..=path.len())
        .take_while(|&taken| !is_greedy(&path[taken - 1]))
        .any(|taken| segments_overlap(rest, &path[taken..]))
}

impl fmt::Display for UriPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        if self.segments.is_empty() {
            f.write_str("/")?;
        }
        for (i, (key, value)) in self.query.iter().enumerate() {
            f.write_str(if i == 0 { "?" } else { "&" })?;
            f.write_str(key)?;
            if let Some(value) = value {
                write!(f, "={value}")?;
            }
        }
        Ok(())
    }
}

/// Parsed `http` trait of an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRoute {
    pub method: String,
    pub uri: UriPattern,
    pub code: i64,
}

/// Request and response bindings of operations and error structures
#[derive(Debug, Default)]
pub struct HttpBindingIndex {
    routes: BTreeMap<ShapeId, HttpRoute>,
    route_errors: BTreeMap<ShapeId, String>,
    requests: BTreeMap<ShapeId, Vec<HttpBinding>>,
    responses: BTreeMap<ShapeId, Vec<HttpBinding>>,
}

impl HttpBindingIndex {
    pub fn new(model: &Model) -> Self {
        let mut index = HttpBindingIndex::default();
        let operations = model.operation_index();

        for operation in model.shapes_of_type(ShapeType::Operation) {
            let Some(http) = operation.trait_value(ids::HTTP) else {
                continue;
            };
            let method = http.get("method").and_then(|v| v.as_str()).unwrap_or_default();
            let code = http
                .get("code")
                .and_then(|v| v.as_number())
                .and_then(|n| n.as_i64())
                .unwrap_or(200);
            match http.get("uri").and_then(|v| v.as_str()).map(UriPattern::parse) {
                Some(Ok(uri)) => {
                    index.routes.insert(
                        operation.id.clone(),
                        HttpRoute {
                            method: method.to_string(),
                            uri,
                            code,
                        },
                    );
                }
                Some(Err(message)) => {
                    index.route_errors.insert(operation.id.clone(), message);
                }
                None => {}
            }

            let request = operations
                .input(model, &operation.id)
                .map(|s| structure_bindings(model, s, true))
                .unwrap_or_default();
            let response = operations
                .output(model, &operation.id)
                .map(|s| structure_bindings(model, s, false))
                .unwrap_or_default();
            index.requests.insert(operation.id.clone(), request);
            index.responses.insert(operation.id.clone(), response);
        }

        for error in model.shapes_with_trait(ids::ERROR) {
            if error.shape_type == ShapeType::Structure {
                index
                    .responses
                    .insert(error.id.clone(), structure_bindings(model, error, false));
            }
        }

        index
    }

    /// Parsed `http` trait of an operation with a valid URI
    pub fn route(&self, operation: &ShapeId) -> Option<&HttpRoute> {
        self.routes.get(operation)
    }

    /// Why an operation's `http` URI could not be parsed
    pub fn route_error(&self, operation: &ShapeId) -> Option<&str> {
        self.route_errors.get(operation).map(String::as_str)
    }

    pub fn request_bindings(&self, operation: &ShapeId) -> &[HttpBinding] {
        self.requests.get(operation).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Response bindings of an operation or an error structure
    pub fn response_bindings(&self, shape: &ShapeId) -> &[HttpBinding] {
        self.responses.get(shape).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn request_bindings_at(
        &self,
        operation: &ShapeId,
        location: HttpLocation,
    ) -> impl Iterator<Item = &HttpBinding> {
        self.request_bindings(operation)
            .iter()
            .filter(move |b| b.location == location)
    }

    /// HTTP status code of an operation or error structure
    pub fn response_code(&self, model: &Model, shape: &ShapeId) -> Option<i64> {
        if let Some(route) = self.routes.get(shape) {
            return Some(route.code);
        }
        let shape = model.get_shape(shape)?;
        if let Some(code) = shape
            .trait_value(ids::HTTP_ERROR)
            .and_then(|v| v.as_number())
            .and_then(|n| n.as_i64())
        {
            return Some(code);
        }
        match shape.trait_value(ids::ERROR).and_then(|v| v.as_str()) {
            Some("client") => Some(400),
            Some("server") => Some(500),
            _ => None,
        }
    }
}

/// Whether a member is bound to a request location by a trait
pub fn has_http_request_binding(shape: &Shape) -> bool {
    [
        ids::HTTP_HEADER,
        ids::HTTP_PREFIX_HEADERS,
        ids::HTTP_PAYLOAD,
        ids::HTTP_QUERY,
        ids::HTTP_QUERY_PARAMS,
        ids::HTTP_LABEL,
    ]
    .iter()
    .any(|t| shape.has_trait(t))
}

fn structure_bindings(model: &Model, structure: &Shape, is_request: bool) -> Vec<HttpBinding> {
    let mut bindings = Vec::new();
    let mut unbound = Vec::new();
    let mut found_payload = false;

    for member in model.members(structure) {
        let name = member.member_name().unwrap_or_default().to_string();
        let string_value = |trait_id: &str| {
            member
                .trait_value(trait_id)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        let (location, location_name) = if member.has_trait(ids::HTTP_HEADER) {
            (HttpLocation::Header, string_value(ids::HTTP_HEADER))
        } else if member.has_trait(ids::HTTP_PREFIX_HEADERS) {
            (HttpLocation::PrefixHeaders, string_value(ids::HTTP_PREFIX_HEADERS))
        } else if is_request && member.has_trait(ids::HTTP_QUERY) {
            (HttpLocation::Query, string_value(ids::HTTP_QUERY))
        } else if is_request && member.has_trait(ids::HTTP_QUERY_PARAMS) {
            (HttpLocation::QueryParams, name.clone())
        } else if member.has_trait(ids::HTTP_PAYLOAD) {
            found_payload = true;
            (HttpLocation::Payload, name.clone())
        } else if is_request && member.has_trait(ids::HTTP_LABEL) {
            (HttpLocation::Label, name.clone())
        } else if !is_request && member.has_trait(ids::HTTP_RESPONSE_CODE) {
            (HttpLocation::ResponseCode, name.clone())
        } else {
            unbound.push((member.id.clone(), name));
            continue;
        };
        bindings.push(HttpBinding {
            member: member.id.clone(),
            member_name: name,
            location,
            location_name,
        });
    }

    let location = if found_payload {
        HttpLocation::Unbound
    } else {
        HttpLocation::Document
    };
    for (member, name) in unbound {
        bindings.push(HttpBinding {
            member,
            member_name: name.clone(),
            location,
            location_name: name,
        });
    }

    bindings
}
