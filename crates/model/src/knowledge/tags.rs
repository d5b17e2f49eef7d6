//! Tagging support of services and resources

use crate::shapes::{Model, Shape};
use crate::traits::ids;
use smithy_semantic_common::{Node, ShapeId, ShapeType};
use std::collections::{BTreeMap, BTreeSet};

pub(crate) const TAG_RESOURCE: &str = "TagResource";
pub(crate) const UNTAG_RESOURCE: &str = "UntagResource";
pub(crate) const LIST_TAGS_FOR_RESOURCE: &str = "ListTagsForResource";

/// Parsed `aws.api#taggable` trait of a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggableResourceInfo {
    /// Resource property holding the tags
    pub property: Option<String>,
    /// Explicit `apiConfig` operations, resolved against the resource namespace
    pub tag_api: Option<ShapeId>,
    pub untag_api: Option<ShapeId>,
    pub list_tags_api: Option<ShapeId>,
    pub tag_on_create: bool,
    pub tag_on_update: bool,
}

/// Tag operations of services that enable tagging
#[derive(Debug, Default)]
pub struct TagIndex {
    resources: BTreeMap<ShapeId, TaggableResourceInfo>,
    tag_operations: BTreeMap<ShapeId, ShapeId>,
    untag_operations: BTreeMap<ShapeId, ShapeId>,
    list_tags_operations: BTreeMap<ShapeId, ShapeId>,
    valid_tag: BTreeSet<ShapeId>,
    valid_untag: BTreeSet<ShapeId>,
    valid_list_tags: BTreeSet<ShapeId>,
}

impl TagIndex {
    pub fn new(model: &Model) -> Self {
        let mut index = TagIndex::default();
        let properties = model.property_binding_index();
        let top_down = model.top_down_index();

        for resource in model.shapes_with_trait(ids::AWS_TAGGABLE) {
            let Some(props) = resource.properties.as_resource() else {
                continue;
            };
            let Some(value) = resource.trait_value(ids::AWS_TAGGABLE) else {
                continue;
            };
            let property = value.get("property").and_then(Node::as_str).map(str::to_string);
            let api = |key: &str| {
                value
                    .get("apiConfig")
                    .and_then(|c| c.get(key))
                    .and_then(Node::as_str)
                    .and_then(|s| ShapeId::from_relative(s, resource.id.namespace()).ok())
            };
            let in_input = |operation: &Option<ShapeId>| match (&property, operation) {
                (Some(property), Some(operation)) => {
                    tag_property_in_input(model, operation, property, |m| {
                        properties.property_name(m).map(str::to_string)
                    })
                }
                _ => false,
            };
            let info = TaggableResourceInfo {
                tag_api: api("tagApi"),
                untag_api: api("untagApi"),
                list_tags_api: api("listTagsApi"),
                tag_on_create: in_input(&props.create),
                tag_on_update: in_input(&props.update),
                property,
            };
            index.resources.insert(resource.id.clone(), info);
        }

        for service in model.shapes_with_trait(ids::AWS_TAG_ENABLED) {
            let Some(props) = service.properties.as_service() else {
                continue;
            };
            let resources: Vec<&ShapeId> = top_down.contained_resources(&service.id).collect();
            let by_name: BTreeMap<&str, &ShapeId> =
                props.operations.iter().map(|id| (id.name(), id)).collect();

            let slots = [
                (TAG_RESOURCE, &mut index.tag_operations, &mut index.valid_tag),
                (UNTAG_RESOURCE, &mut index.untag_operations, &mut index.valid_untag),
                (
                    LIST_TAGS_FOR_RESOURCE,
                    &mut index.list_tags_operations,
                    &mut index.valid_list_tags,
                ),
            ];
            for (name, operations, valid) in slots {
                let Some(operation) = by_name.get(name) else {
                    continue;
                };
                operations.insert(service.id.clone(), (*operation).clone());
                for resource in &resources {
                    operations.insert((*resource).clone(), (*operation).clone());
                }
                let verified = match name {
                    TAG_RESOURCE => verify_tag_resource(model, operation),
                    UNTAG_RESOURCE => verify_untag_resource(model, operation),
                    _ => verify_list_tags(model, operation),
                };
                if verified {
                    valid.insert(service.id.clone());
                }
            }
        }

        index
    }

    pub fn taggable_resource(&self, resource: &ShapeId) -> Option<&TaggableResourceInfo> {
        self.resources.get(resource)
    }

    pub fn is_resource_tag_on_create(&self, resource: &ShapeId) -> bool {
        self.resources.get(resource).is_some_and(|r| r.tag_on_create)
    }

    pub fn is_resource_tag_on_update(&self, resource: &ShapeId) -> bool {
        self.resources.get(resource).is_some_and(|r| r.tag_on_update)
    }

    /// Whether a service has valid `TagResource`, `UntagResource` and
    /// `ListTagsForResource` operations
    pub fn service_has_tag_apis(&self, service: &ShapeId) -> bool {
        self.valid_tag.contains(service)
            && self.valid_untag.contains(service)
            && self.valid_list_tags.contains(service)
    }

    /// Service-wide `TagResource` of a service or a resource it contains
    pub fn tag_resource_operation(&self, shape: &ShapeId) -> Option<&ShapeId> {
        self.tag_operations.get(shape)
    }

    pub fn untag_resource_operation(&self, shape: &ShapeId) -> Option<&ShapeId> {
        self.untag_operations.get(shape)
    }

    pub fn list_tags_operation(&self, shape: &ShapeId) -> Option<&ShapeId> {
        self.list_tags_operations.get(shape)
    }
}

/// `Tags`, `tags`, `TagList` and their case variants
pub(crate) fn is_tags_name(name: &str) -> bool {
    let Some(rest) = name.strip_prefix('T').or_else(|| name.strip_prefix('t')) else {
        return false;
    };
    matches!(rest, "ags" | "agList" | "aglist")
}

pub(crate) fn is_tag_keys_name(name: &str) -> bool {
    matches!(name, "TagKeys" | "tagKeys" | "Tagkeys" | "tagkeys")
}

pub(crate) fn is_resource_arn_name(name: &str) -> bool {
    let rest = name
        .strip_prefix("Resource")
        .or_else(|| name.strip_prefix("resource"))
        .unwrap_or(name);
    matches!(rest, "Arn" | "arn" | "ARN")
}

fn target<'m>(model: &'m Model, member: &Shape) -> Option<&'m Shape> {
    model.target_of(member)
}

fn is_string(shape: Option<&Shape>) -> bool {
    shape.is_some_and(|s| s.shape_type == ShapeType::String)
}

/// A map of strings, or a list of two-string structures
pub(crate) fn verify_tags_shape(model: &Model, shape: &Shape) -> bool {
    match shape.shape_type {
        ShapeType::Map => is_string(
            model
                .get_member(shape, "value")
                .and_then(|m| target(model, m)),
        ),
        ShapeType::List => model
            .get_member(shape, "member")
            .and_then(|m| target(model, m))
            .filter(|s| s.shape_type == ShapeType::Structure && s.members.len() == 2)
            .is_some_and(|s| model.members(s).all(|m| is_string(target(model, m)))),
        _ => false,
    }
}

pub(crate) fn verify_tag_keys_shape(model: &Model, shape: &Shape) -> bool {
    shape.shape_type == ShapeType::List
        && is_string(model.get_member(shape, "member").and_then(|m| target(model, m)))
}

/// Count of members whose name and target satisfy both predicates
pub(crate) fn count_members(
    model: &Model,
    structure: Option<&Shape>,
    name: fn(&str) -> bool,
    shape: fn(&Model, &Shape) -> bool,
) -> usize {
    structure
        .map(|s| {
            model
                .members(s)
                .filter(|m| name(m.member_name().unwrap_or_default()))
                .filter(|m| target(model, m).is_some_and(|t| shape(model, t)))
                .count()
        })
        .unwrap_or(0)
}

fn has_resource_arn_input(model: &Model, input: Option<&Shape>) -> bool {
    input.is_some_and(|s| {
        model.members(s).any(|m| {
            is_resource_arn_name(m.member_name().unwrap_or_default()) && is_string(target(model, m))
        })
    })
}

fn verify_tag_resource(model: &Model, operation: &ShapeId) -> bool {
    let input = model.operation_index().input(model, operation);
    count_members(model, input, is_tags_name, verify_tags_shape) == 1
        && has_resource_arn_input(model, input)
}

fn verify_untag_resource(model: &Model, operation: &ShapeId) -> bool {
    let input = model.operation_index().input(model, operation);
    count_members(model, input, is_tag_keys_name, verify_tag_keys_shape) == 1
        && has_resource_arn_input(model, input)
}

fn verify_list_tags(model: &Model, operation: &ShapeId) -> bool {
    let index = model.operation_index();
    let output = index.output(model, operation);
    count_members(model, output, is_tags_name, verify_tags_shape) == 1
        && has_resource_arn_input(model, index.input(model, operation))
}

/// Whether any input member of `operation` maps to the tag property
pub(crate) fn tag_property_in_input(
    model: &Model,
    operation: &ShapeId,
    property: &str,
    property_name: impl Fn(&ShapeId) -> Option<String>,
) -> bool {
    model
        .operation_index()
        .input(model, operation)
        .is_some_and(|input| {
            model
                .members(input)
                .any(|m| property_name(&m.id).as_deref() == Some(property))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_names() {
        assert!(is_tags_name("Tags"));
        assert!(is_tags_name("tagList"));
        assert!(!is_tags_name("Tag"));
        assert!(is_tag_keys_name("TagKeys"));
        assert!(is_resource_arn_name("ResourceArn"));
        assert!(is_resource_arn_name("arn"));
        assert!(is_resource_arn_name("ARN"));
        assert!(!is_resource_arn_name("ResourceName"));
    }
}
