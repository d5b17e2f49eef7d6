//! Tagging support of `aws.api#tagEnabled` services and their resources

use crate::knowledge::tags::{
    count_members, is_tag_keys_name, is_tags_name, tag_property_in_input, verify_tag_keys_shape,
    verify_tags_shape, LIST_TAGS_FOR_RESOURCE, TAG_RESOURCE, UNTAG_RESOURCE,
};
use crate::knowledge::{BindingType, TaggableResourceInfo};
use crate::shapes::{Model, Shape};
use crate::traits::ids;
use crate::validation::Validator;
use smithy_semantic_common::{ShapeId, ShapeType, ValidationEvent};

/// Resources of tag-enabled services must be taggable one way or another
pub struct TaggableResourceValidator;

impl Validator for TaggableResourceValidator {
    fn name(&self) -> &str {
        "TaggableResource"
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let top_down = model.top_down_index();
        let tags = model.tag_index();
        let mut events = Vec::new();

        for service in model.shapes_with_trait(ids::AWS_TAG_ENABLED) {
            let service_wide = tags.service_has_tag_apis(&service.id);
            for resource_id in top_down.contained_resources(&service.id) {
                let Some(resource) = model.get_shape(resource_id) else {
                    continue;
                };
                match tags.taggable_resource(resource_id) {
                    Some(info) => {
                        self.validate_resource(model, resource, info, service_wide, &mut events)
                    }
                    None if service_wide && resource.has_trait(ids::AWS_ARN) => events.push(
                        ValidationEvent::warning(
                            self.name(),
                            "Resource is likely missing `aws.api#taggable` trait.",
                        )
                        .with_shape(&resource.id)
                        .with_source(&resource.source),
                    ),
                    None => {}
                }
            }
        }
        events
    }
}

impl TaggableResourceValidator {
    fn validate_resource(
        &self,
        model: &Model,
        resource: &Shape,
        info: &TaggableResourceInfo,
        service_wide: bool,
        events: &mut Vec<ValidationEvent>,
    ) {
        if info.tag_on_update {
            let update = resource
                .properties
                .as_resource()
                .and_then(|r| r.update.as_ref());
            if let Some(update) = update {
                events.push(
                    ValidationEvent::danger(
                        self.name(),
                        "Update resource lifecycle operation should not support updating tags \
                         because it is a privileged operation that modifies access.",
                    )
                    .with_shape(update),
                );
            }
        }

        let instance_taggable = is_taggable_via_instance_operations(model, resource, info);
        if service_wide && !instance_taggable && !resource.has_trait(ids::AWS_ARN) {
            events.push(self.error(
                resource,
                "Resource is taggable only via service-wide tag operations. It must use the \
                 `aws.api#arn` trait.",
            ));
        }
        if !service_wide && !instance_taggable {
            events.push(self.error(
                resource,
                "Resource does not have tagging CRUD operations and is not compatible with \
                 service-wide tagging operations.",
            ));
        }
    }

    fn error(&self, resource: &Shape, message: &str) -> ValidationEvent {
        ValidationEvent::error(self.name(), message)
            .with_shape(&resource.id)
            .with_source(&resource.source)
    }
}

/// Operations named in `apiConfig` that are instance operations of the
/// resource with the expected tag members
fn is_taggable_via_instance_operations(
    model: &Model,
    resource: &Shape,
    info: &TaggableResourceInfo,
) -> bool {
    let (Some(tag), Some(untag), Some(list)) =
        (&info.tag_api, &info.untag_api, &info.list_tags_api)
    else {
        return false;
    };
    let operations = model.operation_index();
    let bindings = model.identifier_binding_index();
    let properties = model.property_binding_index();
    let is_instance =
        |op: &ShapeId| bindings.binding_type(&resource.id, op) == BindingType::Instance;
    let property_name = |m: &ShapeId| properties.property_name(m).map(str::to_string);

    let tag_input = operations.input(model, tag);
    let untag_input = operations.input(model, untag);
    let list_output = operations.output(model, list);
    let tag_ok = is_instance(tag)
        && info
            .property
            .as_deref()
            .is_some_and(|property| tag_property_in_input(model, tag, property, property_name))
        && count_members(model, tag_input, is_tags_name, verify_tags_shape) == 1;
    let untag_ok = is_instance(untag)
        && count_members(model, untag_input, is_tag_keys_name, verify_tag_keys_shape) == 1;
    let list_ok = is_instance(list)
        && count_members(model, list_output, is_tags_name, verify_tags_shape) == 1;

    tag_ok && untag_ok && list_ok
}

/// Services marked `tagEnabled` should expose the service-wide tag operations
pub struct TagEnabledServiceValidator;

impl Validator for TagEnabledServiceValidator {
    fn name(&self) -> &str {
        "TagEnabledService"
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let mut events = Vec::new();
        for service in model
            .shapes_with_trait(ids::AWS_TAG_ENABLED)
            .filter(|s| s.shape_type == ShapeType::Service)
        {
            let disabled = service
                .trait_value(ids::AWS_TAG_ENABLED)
                .and_then(|v| v.get("disableDefaultOperations"))
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            if disabled {
                continue;
            }
            let Some(props) = service.properties.as_service() else {
                continue;
            };
            for name in [TAG_RESOURCE, UNTAG_RESOURCE, LIST_TAGS_FOR_RESOURCE] {
                if !props.operations.iter().any(|op| op.name() == name) {
                    events.push(
                        ValidationEvent::warning(
                            self.name(),
                            format!(
                                "Service marked `aws.api#tagEnabled` is missing an operation \
                                 named `{name}`."
                            ),
                        )
                        .with_shape(&service.id)
                        .with_source(&service.source),
                    );
                }
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Trait;
    use smithy_semantic_common::{
        Node, ResourceProperties, ServiceProperties, ShapeProperties, Severity,
    };

    fn id(value: &str) -> ShapeId {
        ShapeId::parse(value).unwrap()
    }

    fn model(resource_traits: &[(&str, Node)]) -> Model {
        let mut service = Shape::new(id("ns#Svc"), ShapeType::Service);
        service.properties = ShapeProperties::Service(ServiceProperties {
            resources: vec![id("ns#Thing")],
            ..Default::default()
        });
        service.add_trait(Trait::new(id("aws.api#tagEnabled"), Node::empty_object()));
        let mut resource = Shape::new(id("ns#Thing"), ShapeType::Resource);
        resource.properties = ShapeProperties::Resource(ResourceProperties::default());
        for (trait_id, value) in resource_traits {
            resource.add_trait(Trait::new(id(trait_id), value.clone()));
        }
        Model::new(vec![service, resource], Default::default())
    }

    #[test]
    fn test_taggable_resource_without_operations() {
        let model = model(&[("aws.api#taggable", Node::empty_object())]);
        let events = TaggableResourceValidator.validate(&model);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, Severity::Error);
        assert!(events[0].message.starts_with("Resource does not have tagging CRUD operations"));
    }

    #[test]
    fn test_untaggable_resource_without_service_apis() {
        let arn = Node::object([("template", Node::from("thing/{id}"))]);
        let model = model(&[("aws.api#arn", arn)]);
        assert!(TaggableResourceValidator.validate(&model).is_empty());
    }

    #[test]
    fn test_tag_enabled_service_missing_operations() {
        let events = TagEnabledServiceValidator.validate(&model(&[]));
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.severity == Severity::Warning));
        assert!(events[0].message.ends_with("named `TagResource`."));
    }
}
