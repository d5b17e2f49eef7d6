//! Conflict resolution for values applied more than once

use crate::shapes::Trait;
use smithy_semantic_common::{Node, ShapeId, ValidationEvent};

/// Event id of problems found while combining fragments
pub const MODEL_EVENT: &str = "Model";

/// Combine two applications of the same trait to the same shape
///
/// `is_list` says whether the trait shape is a list; `None` means the trait
/// is not defined anywhere, in which case two arrays are still concatenated.
/// Returns the merged trait, or an error naming both source locations.
pub fn merge_trait(
    shape: &ShapeId,
    existing: &Trait,
    incoming: &Trait,
    is_list: Option<bool>,
) -> Result<Trait, ValidationEvent> {
    let concatenate = match is_list {
        Some(is_list) => is_list,
        None => existing.value.as_array().is_some() && incoming.value.as_array().is_some(),
    };

    if concatenate {
        if let (Some(left), Some(right)) = (existing.value.as_array(), incoming.value.as_array()) {
            let mut values = left.to_vec();
            values.extend_from_slice(right);
            return Ok(Trait {
                id: existing.id.clone(),
                value: Node::Array(values),
                source: existing.source.clone(),
            });
        }
    }

    if existing.value == incoming.value {
        tracing::debug!(
            shape = %shape,
            trait_id = %existing.id,
            "Ignoring duplicate but equal trait value"
        );
        return Ok(existing.clone());
    }

    Err(ValidationEvent::error(
        MODEL_EVENT,
        format!(
            "Conflicting `{}` trait found on shape `{shape}`. The previous trait was defined at \
             `{}`, and a conflicting trait was defined at `{}`.",
            existing.id, existing.source, incoming.source
        ),
    )
    .with_shape(shape)
    .with_trait(&existing.id)
    .with_source(&incoming.source))
}

/// Combine two values of one metadata key
///
/// Arrays concatenate in load order; equal values are kept; anything else
/// is a conflict naming both fragments.
pub fn merge_metadata(
    key: &str,
    existing: &Node,
    existing_fragment: &str,
    incoming: &Node,
    incoming_fragment: &str,
) -> Result<Node, ValidationEvent> {
    match (existing, incoming) {
        (Node::Array(left), Node::Array(right)) => {
            let mut values = left.clone();
            values.extend(right.iter().cloned());
            Ok(Node::Array(values))
        }
        _ if existing == incoming => Ok(existing.clone()),
        _ => Err(ValidationEvent::error(
            MODEL_EVENT,
            format!(
                "Metadata conflict for key `{key}`. Defined in both `{existing_fragment}` and \
                 `{incoming_fragment}`"
            ),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smithy_semantic_common::SourceLocation;

    fn tags(values: &[&str], file: &str) -> Trait {
        let mut value = Trait::new(
            ShapeId::prelude("tags"),
            Node::Array(values.iter().map(|v| Node::from(*v)).collect()),
        );
        value.source = SourceLocation::new(file, 1, 1);
        value
    }

    fn shape() -> ShapeId {
        ShapeId::parse("ns.foo#Bar").unwrap()
    }

    #[test]
    fn test_list_traits_concatenate_in_order() {
        let merged =
            merge_trait(&shape(), &tags(&["x"], "a"), &tags(&["y"], "b"), Some(true)).unwrap();
        assert_eq!(merged.value, Node::from(vec![Node::from("x"), Node::from("y")]));
    }

    #[test]
    fn test_unknown_array_traits_concatenate() {
        let merged = merge_trait(&shape(), &tags(&["x"], "a"), &tags(&["x"], "b"), None).unwrap();
        assert_eq!(merged.value.as_array().map(<[Node]>::len), Some(2));
    }

    #[test]
    fn test_equal_values_kept() {
        let doc = Trait::new(ShapeId::prelude("documentation"), Node::from("docs"));
        let merged = merge_trait(&shape(), &doc, &doc.clone(), Some(false)).unwrap();
        assert_eq!(merged.value, Node::from("docs"));
    }

    #[test]
    fn test_unequal_values_conflict() {
        let mut a = Trait::new(ShapeId::prelude("documentation"), Node::from("a"));
        a.source = SourceLocation::new("a.json", 2, 4);
        let b = Trait::new(ShapeId::prelude("documentation"), Node::from("b"));
        let event = merge_trait(&shape(), &a, &b, Some(false)).unwrap_err();
        assert!(event.is_error());
        assert!(event.message.contains("Conflicting `smithy.api#documentation` trait"));
        assert!(event.message.contains("a.json [2, 4]"));
    }

    #[test]
    fn test_metadata_merge() {
        let merged = merge_metadata(
            "k",
            &Node::from(vec![Node::from(1i64)]),
            "a",
            &Node::from(vec![Node::from(2i64)]),
            "b",
        )
        .unwrap();
        assert_eq!(merged.as_array().map(<[Node]>::len), Some(2));
        assert!(merge_metadata("k", &Node::from("x"), "a", &Node::from("x"), "b").is_ok());
        let err = merge_metadata("k", &Node::from("x"), "a", &Node::from("y"), "b").unwrap_err();
        assert!(err.message.contains("`a`") && err.message.contains("`b`"));
    }
}
