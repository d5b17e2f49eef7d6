//! Unresolved model fragments
//!
//! A fragment is what a loader hands to the assembler: shape stubs, trait
//! applications and metadata from one model file. Nothing in a fragment is
//! resolved; targets may point at shapes defined in other fragments, member
//! targets may be elided, and mixins have not been applied.

use crate::{Node, ShapeId, ShapeType, SourceLocation};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One independently loaded unit of a model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Human readable origin, usually a file name
    pub name: String,
    /// Prelude fragments may apply traits to `smithy.api` shapes
    #[serde(default)]
    pub is_prelude: bool,
    #[serde(default)]
    pub shapes: Vec<ShapeStub>,
    #[serde(default)]
    pub traits: Vec<TraitApplication>,
    #[serde(default)]
    pub metadata: IndexMap<String, Node>,
}

impl Fragment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn add_shape(&mut self, stub: ShapeStub) -> &mut Self {
        self.shapes.push(stub);
        self
    }

    pub fn add_trait(&mut self, application: TraitApplication) -> &mut Self {
        self.traits.push(application);
        self
    }

    pub fn add_metadata(&mut self, key: impl Into<String>, value: Node) -> &mut Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty() && self.traits.is_empty() && self.metadata.is_empty()
    }
}

/// Unresolved shape definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeStub {
    pub id: ShapeId,
    pub shape_type: ShapeType,
    #[serde(default)]
    pub members: Vec<MemberStub>,
    #[serde(default)]
    pub mixins: Vec<ShapeId>,
    #[serde(default)]
    pub properties: ShapeProperties,
    /// Resource a structure is bound to for member target elision
    #[serde(default)]
    pub for_resource: Option<ShapeId>,
    #[serde(default)]
    pub source: SourceLocation,
}

impl ShapeStub {
    pub fn new(id: ShapeId, shape_type: ShapeType) -> Self {
        let properties = ShapeProperties::default_for(shape_type);
        Self {
            id,
            shape_type,
            members: Vec::new(),
            mixins: Vec::new(),
            properties,
            for_resource: None,
            source: SourceLocation::none(),
        }
    }

    pub fn with_member(mut self, name: &str, target: ShapeId) -> Self {
        self.members.push(MemberStub::new(name, Some(target)));
        self
    }

    pub fn with_elided_member(mut self, name: &str) -> Self {
        self.members.push(MemberStub::new(name, None));
        self
    }

    pub fn with_mixin(mut self, mixin: ShapeId) -> Self {
        self.mixins.push(mixin);
        self
    }

    pub fn with_properties(mut self, properties: ShapeProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_source(mut self, source: SourceLocation) -> Self {
        self.source = source;
        self
    }

    pub fn member(&self, name: &str) -> Option<&MemberStub> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Whether two stubs define the same shape, ignoring source locations
    ///
    /// Member order is not significant.
    pub fn same_definition(&self, other: &ShapeStub) -> bool {
        if self.id != other.id
            || self.shape_type != other.shape_type
            || self.mixins != other.mixins
            || self.properties != other.properties
            || self.for_resource != other.for_resource
            || self.members.len() != other.members.len()
        {
            return false;
        }
        self.members.iter().all(|member| {
            other
                .member(&member.name)
                .is_some_and(|o| o.target == member.target)
        })
    }
}

/// Unresolved member; a `None` target is elided
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberStub {
    pub name: String,
    pub target: Option<ShapeId>,
    #[serde(default)]
    pub source: SourceLocation,
}

impl MemberStub {
    pub fn new(name: &str, target: Option<ShapeId>) -> Self {
        Self {
            name: name.to_string(),
            target,
            source: SourceLocation::none(),
        }
    }

    pub fn is_elided(&self) -> bool {
        self.target.is_none()
    }
}

/// Service-type specific properties
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ShapeProperties {
    #[default]
    None,
    Service(ServiceProperties),
    Operation(OperationProperties),
    Resource(ResourceProperties),
}

impl ShapeProperties {
    pub fn default_for(shape_type: ShapeType) -> Self {
        match shape_type {
            ShapeType::Service => ShapeProperties::Service(ServiceProperties::default()),
            ShapeType::Operation => ShapeProperties::Operation(OperationProperties::default()),
            ShapeType::Resource => ShapeProperties::Resource(ResourceProperties::default()),
            _ => ShapeProperties::None,
        }
    }

    pub fn as_service(&self) -> Option<&ServiceProperties> {
        match self {
            ShapeProperties::Service(props) => Some(props),
            _ => None,
        }
    }

    pub fn as_operation(&self) -> Option<&OperationProperties> {
        match self {
            ShapeProperties::Operation(props) => Some(props),
            _ => None,
        }
    }

    pub fn as_resource(&self) -> Option<&ResourceProperties> {
        match self {
            ShapeProperties::Resource(props) => Some(props),
            _ => None,
        }
    }

    /// Every shape ID referenced by these properties
    pub fn references(&self) -> Vec<&ShapeId> {
        match self {
            ShapeProperties::None => Vec::new(),
            ShapeProperties::Service(s) => s
                .operations
                .iter()
                .chain(&s.resources)
                .chain(&s.errors)
                .chain(s.rename.keys())
                .collect(),
            ShapeProperties::Operation(o) => {
                o.input.iter().chain(&o.output).chain(&o.errors).collect()
            }
            ShapeProperties::Resource(r) => r
                .identifiers
                .values()
                .chain(r.properties.values())
                .chain(r.lifecycle_operations().map(|(_, id)| id))
                .chain(&r.operations)
                .chain(&r.collection_operations)
                .chain(&r.resources)
                .collect(),
        }
    }

    /// Merge properties inherited from a mixin; local values win
    pub fn inherit_from(&mut self, mixin: &ShapeProperties) {
        match (self, mixin) {
            (ShapeProperties::Service(local), ShapeProperties::Service(inherited)) => {
                if local.version.is_none() {
                    local.version = inherited.version.clone();
                }
                prepend_missing(&mut local.operations, &inherited.operations);
                prepend_missing(&mut local.resources, &inherited.resources);
                prepend_missing(&mut local.errors, &inherited.errors);
                for (id, name) in &inherited.rename {
                    local.rename.entry(id.clone()).or_insert_with(|| name.clone());
                }
            }
            (ShapeProperties::Operation(local), ShapeProperties::Operation(inherited)) => {
                if local.input.is_none() {
                    local.input = inherited.input.clone();
                }
                if local.output.is_none() {
                    local.output = inherited.output.clone();
                }
                prepend_missing(&mut local.errors, &inherited.errors);
            }
            (ShapeProperties::Resource(local), ShapeProperties::Resource(inherited)) => {
                for (name, target) in &inherited.identifiers {
                    if !local.identifiers.contains_key(name) {
                        local.identifiers.insert(name.clone(), target.clone());
                    }
                }
                for (name, target) in &inherited.properties {
                    if !local.properties.contains_key(name) {
                        local.properties.insert(name.clone(), target.clone());
                    }
                }
                for (slot, value) in [
                    (&mut local.create, &inherited.create),
                    (&mut local.put, &inherited.put),
                    (&mut local.read, &inherited.read),
                    (&mut local.update, &inherited.update),
                    (&mut local.delete, &inherited.delete),
                    (&mut local.list, &inherited.list),
                ] {
                    if slot.is_none() {
                        *slot = value.clone();
                    }
                }
                prepend_missing(&mut local.operations, &inherited.operations);
                prepend_missing(
                    &mut local.collection_operations,
                    &inherited.collection_operations,
                );
                prepend_missing(&mut local.resources, &inherited.resources);
            }
            _ => {}
        }
    }
}

fn prepend_missing(local: &mut Vec<ShapeId>, inherited: &[ShapeId]) {
    let mut merged: Vec<ShapeId> = inherited
        .iter()
        .filter(|id| !local.contains(id))
        .cloned()
        .collect();
    merged.append(local);
    *local = merged;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceProperties {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub operations: Vec<ShapeId>,
    #[serde(default)]
    pub resources: Vec<ShapeId>,
    #[serde(default)]
    pub errors: Vec<ShapeId>,
    /// Shape ID to the name it takes inside the service closure
    #[serde(default)]
    pub rename: BTreeMap<ShapeId, String>,
}

/// Operation input, output and errors; a missing input or output is `Unit`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationProperties {
    #[serde(default)]
    pub input: Option<ShapeId>,
    #[serde(default)]
    pub output: Option<ShapeId>,
    #[serde(default)]
    pub errors: Vec<ShapeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceProperties {
    #[serde(default)]
    pub identifiers: IndexMap<String, ShapeId>,
    #[serde(default)]
    pub properties: IndexMap<String, ShapeId>,
    #[serde(default)]
    pub create: Option<ShapeId>,
    #[serde(default)]
    pub put: Option<ShapeId>,
    #[serde(default)]
    pub read: Option<ShapeId>,
    #[serde(default)]
    pub update: Option<ShapeId>,
    #[serde(default)]
    pub delete: Option<ShapeId>,
    #[serde(default)]
    pub list: Option<ShapeId>,
    #[serde(default)]
    pub operations: Vec<ShapeId>,
    #[serde(default)]
    pub collection_operations: Vec<ShapeId>,
    #[serde(default)]
    pub resources: Vec<ShapeId>,
}

impl ResourceProperties {
    /// Lifecycle slots that are set, by name
    pub fn lifecycle_operations(&self) -> impl Iterator<Item = (&'static str, &ShapeId)> {
        [
            ("create", &self.create),
            ("put", &self.put),
            ("read", &self.read),
            ("update", &self.update),
            ("delete", &self.delete),
            ("list", &self.list),
        ]
        .into_iter()
        .filter_map(|(name, id)| id.as_ref().map(|id| (name, id)))
    }

    /// Every operation bound to the resource, lifecycle operations first
    pub fn all_operations(&self) -> Vec<&ShapeId> {
        let mut result: Vec<&ShapeId> = Vec::new();
        for id in self
            .lifecycle_operations()
            .map(|(_, id)| id)
            .chain(&self.operations)
            .chain(&self.collection_operations)
        {
            if !result.contains(&id) {
                result.push(id);
            }
        }
        result
    }
}

/// A trait applied to a shape, either inline or through `apply`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitApplication {
    pub target: ShapeId,
    pub trait_id: ShapeId,
    pub value: Node,
    #[serde(default)]
    pub source: SourceLocation,
}

impl TraitApplication {
    pub fn new(target: ShapeId, trait_id: ShapeId, value: Node) -> Self {
        Self {
            target,
            trait_id,
            value,
            source: SourceLocation::none(),
        }
    }

    pub fn with_source(mut self, source: SourceLocation) -> Self {
        self.source = source;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: &str) -> ShapeId {
        ShapeId::parse(value).unwrap()
    }

    #[test]
    fn test_same_definition_ignores_member_order_and_source() {
        let a = ShapeStub::new(id("ns#S"), ShapeType::Structure)
            .with_member("a", id("smithy.api#String"))
            .with_member("b", id("smithy.api#Integer"))
            .with_source(SourceLocation::new("a.json", 1, 1));
        let b = ShapeStub::new(id("ns#S"), ShapeType::Structure)
            .with_member("b", id("smithy.api#Integer"))
            .with_member("a", id("smithy.api#String"));
        assert!(a.same_definition(&b));

        let c = ShapeStub::new(id("ns#S"), ShapeType::Structure)
            .with_member("a", id("smithy.api#String"))
            .with_member("b", id("smithy.api#Long"));
        assert!(!a.same_definition(&c));
    }

    #[test]
    fn test_operation_inherits_errors_from_mixin() {
        let mut local = ShapeProperties::Operation(OperationProperties {
            input: Some(id("ns#In")),
            output: None,
            errors: vec![id("ns#Local")],
        });
        let mixin = ShapeProperties::Operation(OperationProperties {
            input: Some(id("ns#Other")),
            output: Some(id("ns#Out")),
            errors: vec![id("ns#Shared")],
        });
        local.inherit_from(&mixin);
        let props = local.as_operation().unwrap();
        assert_eq!(props.input, Some(id("ns#In")));
        assert_eq!(props.output, Some(id("ns#Out")));
        assert_eq!(props.errors, vec![id("ns#Shared"), id("ns#Local")]);
    }

    #[test]
    fn test_resource_operations_deduplicated() {
        let props = ResourceProperties {
            read: Some(id("ns#Get")),
            operations: vec![id("ns#Get"), id("ns#Other")],
            ..Default::default()
        };
        assert_eq!(props.all_operations(), vec![&id("ns#Get"), &id("ns#Other")]);
    }

    #[test]
    fn test_fragment_equality() {
        let mut a = Fragment::new("a.json");
        let stub = ShapeStub::new(id("ns#S"), ShapeType::Structure)
            .with_member("a", id("smithy.api#String"));
        a.add_shape(stub);
        a.add_metadata("owner", Node::from("team"));
        let b = a.clone();
        assert_eq!(a, b);

        let mut c = a.clone();
        c.shapes[0] = c.shapes[0].clone().with_source(SourceLocation::new("a.json", 3, 5));
        assert_ne!(a, c);
        assert!(a.shapes[0].same_definition(&c.shapes[0]));
    }
}
