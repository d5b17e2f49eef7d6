//! Post-hoc event suppression
//!
//! Suppressions never re-run validators; they rewrite the severity of
//! already collected events to [`Severity::Suppressed`]. ERROR events cannot
//! be suppressed.

use crate::shapes::Model;
use crate::traits::ids;
use serde::{Deserialize, Serialize};
use smithy_semantic_common::{Node, Severity, ShapeId, ValidationEvent};

/// Event id for malformed `suppressions` metadata
const SUPPRESSION_EVENT: &str = "Suppression";

/// Suppresses events by id, optionally scoped to a namespace or shapes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suppression {
    /// Event id; `Foo` also suppresses `Foo.Bar`, `*` suppresses everything
    pub id: String,
    /// Namespace of suppressed shapes; `*` matches any shape or none
    #[serde(default = "any_namespace")]
    pub namespace: String,
    /// Explicit shapes to suppress; when set, events must target one of them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shapes: Vec<ShapeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

fn any_namespace() -> String {
    "*".to_string()
}

impl Suppression {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            namespace: any_namespace(),
            shapes: Vec::new(),
            reason: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Read a suppression from a metadata node
    pub fn from_node(node: &Node) -> Result<Self, String> {
        let suppression: Self = serde_json::from_value(node.to_json()).map_err(|e| e.to_string())?;
        if suppression.id.is_empty() {
            return Err("suppression `id` must not be empty".to_string());
        }
        Ok(suppression)
    }

    pub fn matches(&self, event: &ValidationEvent) -> bool {
        if !event.severity.can_suppress() || !event.matches_id(&self.id) {
            return false;
        }

        if self.namespace != "*" {
            let in_namespace = event
                .shape_id
                .as_ref()
                .is_some_and(|id| id.namespace() == self.namespace);
            if !in_namespace {
                return false;
            }
        }

        self.shapes.is_empty()
            || event.shape_id.as_ref().is_some_and(|id| {
                self.shapes.contains(id) || self.shapes.contains(&id.without_member())
            })
    }

    /// Suppress the event if this suppression applies to it
    pub fn suppress(&self, event: &mut ValidationEvent) -> bool {
        if !self.matches(event) {
            return false;
        }
        event.severity = Severity::Suppressed;
        event.suppression_reason = self.reason.clone();
        true
    }
}

/// Apply every kind of suppression to a list of events
///
/// Shape-level `suppress` traits are consulted first, then the
/// `suppressions` metadata, then `configured` suppressions. Malformed
/// metadata entries are reported as additional ERROR events.
pub fn apply_suppressions(
    model: &Model,
    mut events: Vec<ValidationEvent>,
    configured: &[Suppression],
) -> Vec<ValidationEvent> {
    let mut suppressions = Vec::new();
    let mut problems = Vec::new();

    if let Some(node) = model.get_metadata("suppressions") {
        match node.as_array() {
            Some(entries) => {
                for entry in entries {
                    match Suppression::from_node(entry) {
                        Ok(suppression) => suppressions.push(suppression),
                        Err(message) => problems.push(ValidationEvent::error(
                            SUPPRESSION_EVENT,
                            format!("Invalid suppression in metadata: {message}"),
                        )),
                    }
                }
            }
            None => problems.push(ValidationEvent::error(
                SUPPRESSION_EVENT,
                format!(
                    "Expected `suppressions` metadata to be an array, found {}",
                    node.type_name()
                ),
            )),
        }
    }
    suppressions.extend(configured.iter().cloned());

    let mut suppressed = 0usize;
    for event in &mut events {
        if !event.severity.can_suppress() || event.severity == Severity::Suppressed {
            continue;
        }
        if suppress_by_trait(model, event) || suppressions.iter().any(|s| s.suppress(event)) {
            suppressed += 1;
        }
    }
    if suppressed > 0 {
        tracing::debug!(suppressed, "Suppressed validation events");
    }

    events.extend(problems);
    events
}

/// `suppress` on the event's shape, or on the container of a member
fn suppress_by_trait(model: &Model, event: &mut ValidationEvent) -> bool {
    let Some(shape_id) = event.shape_id.clone() else {
        return false;
    };
    let mut candidates = vec![shape_id.clone()];
    if shape_id.has_member() {
        candidates.push(shape_id.without_member());
    }

    for candidate in candidates {
        let ids = model
            .get_trait(&candidate, ids::SUPPRESS)
            .and_then(|t| t.value.as_array())
            .unwrap_or_default();
        if ids.iter().filter_map(Node::as_str).any(|id| event.matches_id(id)) {
            event.severity = Severity::Suppressed;
            return true;
        }
    }
    false
}
