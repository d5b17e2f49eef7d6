//! Validation events

use crate::{ShapeId, SourceLocation};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a validation event, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Suppressed,
    Note,
    Warning,
    Danger,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Suppressed => "SUPPRESSED",
            Severity::Note => "NOTE",
            Severity::Warning => "WARNING",
            Severity::Danger => "DANGER",
            Severity::Error => "ERROR",
        }
    }

    /// Whether a suppression may downgrade events of this severity
    pub fn can_suppress(self) -> bool {
        self != Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured finding emitted during assembly or validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationEvent {
    /// Id of the validator that produced the event, e.g. `HttpBinding`
    pub id: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape_id: Option<ShapeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trait_id: Option<ShapeId>,
    pub message: String,
    #[serde(default)]
    pub source: SourceLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppression_reason: Option<String>,
}

impl ValidationEvent {
    pub fn new(id: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            severity,
            shape_id: None,
            trait_id: None,
            message: message.into(),
            source: SourceLocation::none(),
            suppression_reason: None,
        }
    }

    pub fn error(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(id, Severity::Error, message)
    }

    pub fn danger(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(id, Severity::Danger, message)
    }

    pub fn warning(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(id, Severity::Warning, message)
    }

    pub fn note(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(id, Severity::Note, message)
    }

    pub fn with_shape(mut self, shape_id: &ShapeId) -> Self {
        self.shape_id = Some(shape_id.clone());
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

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Event id with the validator-specific suffix removed
    ///
    /// Ids are hierarchical: `Foo.Bar` belongs to `Foo`.
    pub fn root_id(&self) -> &str {
        self.id.split('.').next().unwrap_or(&self.id)
    }

    /// Whether `id` names this event or one of its ancestors
    pub fn matches_id(&self, id: &str) -> bool {
        id == "*"
            || self.id == id
            || (self.id.starts_with(id) && self.id[id.len()..].starts_with('.'))
    }
}

impl fmt::Display for ValidationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.severity)?;
        match &self.shape_id {
            Some(shape_id) => write!(f, "{shape_id}: ")?,
            None => write!(f, "-: ")?,
        }
        write!(f, "{} | {}", self.message, self.id)?;
        if !self.source.is_none() {
            write!(f, " ({})", self.source)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hierarchical_ids() {
        let event = ValidationEvent::warning("HttpBinding.Payload", "too many payloads");
        assert!(event.matches_id("HttpBinding"));
        assert!(event.matches_id("HttpBinding.Payload"));
        assert!(event.matches_id("*"));
        assert!(!event.matches_id("Http"));
        assert_eq!(event.root_id(), "HttpBinding");
    }

    #[test]
    fn test_display() {
        let shape = ShapeId::parse("ns.foo#Bar").unwrap();
        let event = ValidationEvent::error("Target", "bad target").with_shape(&shape);
        assert_eq!(event.to_string(), "[ERROR] ns.foo#Bar: bad target | Target");
    }

    #[test]
    fn test_severity_order() {
        assert!(Severity::Error > Severity::Danger);
        assert!(Severity::Warning > Severity::Note);
        assert!(!Severity::Error.can_suppress());
    }
}
