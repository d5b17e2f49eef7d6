//! ARN templates of resources and effective ARNs of operations

use super::BindingType;
use crate::shapes::Model;
use crate::traits::ids;
use smithy_semantic_common::{Node, ShapeId, ShapeType};
use std::collections::BTreeMap;

/// Parsed value of the `aws.api#arn` trait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArnTemplate {
    pub template: String,
    pub absolute: bool,
    pub no_region: bool,
    pub no_account: bool,
}

impl ArnTemplate {
    pub fn from_node(value: &Node) -> Option<Self> {
        let flag = |key: &str| value.get(key).and_then(Node::as_bool).unwrap_or(false);
        Some(Self {
            template: value.get("template")?.as_str()?.to_string(),
            absolute: flag("absolute"),
            no_region: flag("noRegion"),
            no_account: flag("noAccount"),
        })
    }

    /// `{label}` placeholders in template order
    ///
    /// # Examples
    /// ```
    /// use smithy_semantic_model::knowledge::ArnTemplate;
    ///
    /// let arn = ArnTemplate {
    ///     template: "things/{a}/{b}".to_string(),
    ///     absolute: false,
    ///     no_region: false,
    ///     no_account: false,
    /// };
    /// assert_eq!(arn.labels(), vec!["a", "b"]);
    /// ```
    pub fn labels(&self) -> Vec<&str> {
        let mut labels = Vec::new();
        let mut rest = self.template.as_str();
        while let Some(start) = rest.find('{') {
            let after = &rest[start + 1..];
            match after.find('}') {
                Some(end) => {
                    labels.push(&after[..end]);
                    rest = &after[end + 1..];
                }
                None => break,
            }
        }
        labels
    }
}

/// ARN template that applies to an operation within a service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveArn {
    pub resource: ShapeId,
    pub template: ArnTemplate,
}

#[derive(Debug, Default)]
pub struct ArnIndex {
    namespaces: BTreeMap<ShapeId, String>,
    templates: BTreeMap<ShapeId, BTreeMap<ShapeId, ArnTemplate>>,
    effective: BTreeMap<ShapeId, BTreeMap<ShapeId, EffectiveArn>>,
}

impl ArnIndex {
    pub fn new(model: &Model) -> Self {
        let mut index = ArnIndex::default();
        let top_down = model.top_down_index();
        let bindings = model.identifier_binding_index();

        let services: Vec<_> = model
            .shapes_of_type(ShapeType::Service)
            .filter(|s| s.has_trait(ids::AWS_SERVICE))
            .collect();

        for service in &services {
            if let Some(namespace) = service
                .trait_value(ids::AWS_SERVICE)
                .and_then(|v| v.get("arnNamespace"))
                .and_then(Node::as_str)
            {
                index.namespaces.insert(service.id.clone(), namespace.to_string());
            }

            let mut templates = BTreeMap::new();
            for resource_id in top_down.contained_resources(&service.id) {
                if let Some(template) = model
                    .get_trait(resource_id, ids::AWS_ARN)
                    .and_then(|t| ArnTemplate::from_node(&t.value))
                {
                    templates.insert(resource_id.clone(), template);
                }
            }

            // Instance operations use their resource's ARN; collection
            // operations use the parent resource's ARN
            let mut effective = BTreeMap::new();
            for (resource_id, template) in &templates {
                for operation in top_down.contained_operations(resource_id) {
                    match bindings.binding_type(resource_id, operation) {
                        BindingType::Instance => {
                            effective.insert(
                                operation.clone(),
                                EffectiveArn {
                                    resource: resource_id.clone(),
                                    template: template.clone(),
                                },
                            );
                        }
                        BindingType::Collection => {
                            let parent = top_down
                                .parent_resource(resource_id)
                                .and_then(|p| templates.get(p).map(|t| (p, t)));
                            if let Some((parent, template)) = parent {
                                effective.insert(
                                    operation.clone(),
                                    EffectiveArn {
                                        resource: parent.clone(),
                                        template: template.clone(),
                                    },
                                );
                            }
                        }
                        BindingType::None => {}
                    }
                }
            }

            index.templates.insert(service.id.clone(), templates);
            index.effective.insert(service.id.clone(), effective);
        }

        index
    }

    /// `arnNamespace` of the service, or its lowercased name
    pub fn service_arn_namespace(&self, service: &ShapeId) -> String {
        self.namespaces
            .get(service)
            .cloned()
            .unwrap_or_else(|| service.name().to_lowercase())
    }

    /// ARN templates of every resource in a service
    pub fn service_resource_arns(
        &self,
        service: &ShapeId,
    ) -> Option<&BTreeMap<ShapeId, ArnTemplate>> {
        self.templates.get(service)
    }

    pub fn effective_operation_arn(
        &self,
        service: &ShapeId,
        operation: &ShapeId,
    ) -> Option<&EffectiveArn> {
        self.effective.get(service).and_then(|ops| ops.get(operation))
    }

    /// Resource template expanded with the partition, region and account
    /// prefix unless it is absolute
    pub fn full_resource_arn_template(
        &self,
        service: &ShapeId,
        resource: &ShapeId,
    ) -> Option<String> {
        let arn = self.templates.get(service)?.get(resource)?;
        let mut result = String::new();
        if !arn.absolute {
            result.push_str("arn:{AWS::Partition}:");
            result.push_str(&self.service_arn_namespace(service));
            result.push(':');
            if !arn.no_region {
                result.push_str("{AWS::Region}");
            }
            result.push(':');
            if !arn.no_account {
                result.push_str("{AWS::AccountId}");
            }
            result.push(':');
        }
        result.push_str(&arn.template);
        Some(result)
    }
}
