//! Resolved shapes and trait instances

use indexmap::IndexMap;
use smithy_semantic_common::{Node, ShapeId, ShapeProperties, ShapeType, SourceLocation};
use std::collections::BTreeMap;

/// A trait attached to a shape after conflict resolution
#[derive(Debug, Clone)]
pub struct Trait {
    pub id: ShapeId,
    pub value: Node,
    pub source: SourceLocation,
}

impl Trait {
    pub fn new(id: ShapeId, value: Node) -> Self {
        Self {
            id,
            value,
            source: SourceLocation::none(),
        }
    }
}

impl PartialEq for Trait {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.value == other.value
    }
}

/// A node in the shape graph
///
/// Aggregate shapes list their members by name; each member is itself a
/// shape of type [`ShapeType::Member`] stored in the model under
/// `namespace#Name$member` and carrying its `target`.
#[derive(Debug, Clone)]
pub struct Shape {
    pub id: ShapeId,
    pub shape_type: ShapeType,
    /// Traits keyed by absolute trait shape ID
    pub traits: BTreeMap<String, Trait>,
    pub mixins: Vec<ShapeId>,
    /// Member name to member shape ID, in declaration order
    pub members: IndexMap<String, ShapeId>,
    /// Target of a member shape
    pub target: Option<ShapeId>,
    pub properties: ShapeProperties,
    /// Resource used to resolve elided members
    pub for_resource: Option<ShapeId>,
    pub source: SourceLocation,
}

impl Shape {
    pub fn new(id: ShapeId, shape_type: ShapeType) -> Self {
        Self {
            id,
            shape_type,
            traits: BTreeMap::new(),
            mixins: Vec::new(),
            members: IndexMap::new(),
            target: None,
            properties: ShapeProperties::default_for(shape_type),
            for_resource: None,
            source: SourceLocation::none(),
        }
    }

    /// Create a member shape targeting `target`
    pub fn member(id: ShapeId, target: Option<ShapeId>) -> Self {
        let mut shape = Self::new(id, ShapeType::Member);
        shape.target = target;
        shape
    }

    pub fn is_member(&self) -> bool {
        self.shape_type == ShapeType::Member
    }

    /// Member name of a member shape
    pub fn member_name(&self) -> Option<&str> {
        self.id.member()
    }

    /// Container of a member shape
    pub fn container(&self) -> Option<ShapeId> {
        self.is_member().then(|| self.id.without_member())
    }

    pub fn get_trait(&self, trait_id: &str) -> Option<&Trait> {
        self.traits.get(trait_id)
    }

    pub fn has_trait(&self, trait_id: &str) -> bool {
        self.traits.contains_key(trait_id)
    }

    /// Value of a trait, if present
    pub fn trait_value(&self, trait_id: &str) -> Option<&Node> {
        self.get_trait(trait_id).map(|t| &t.value)
    }

    pub fn add_trait(&mut self, value: Trait) {
        self.traits.insert(value.id.to_string(), value);
    }

    pub fn remove_trait(&mut self, trait_id: &str) -> Option<Trait> {
        self.traits.remove(trait_id)
    }

    pub fn member_id(&self, name: &str) -> Option<&ShapeId> {
        self.members.get(name)
    }

    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }
}

impl PartialEq for Shape {
    /// Structural equality ignoring source locations
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.shape_type == other.shape_type
            && self.traits == other.traits
            && self.mixins == other.mixins
            && self.members == other.members
            && self.target == other.target
            && self.properties == other.properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_source() {
        let id = ShapeId::parse("ns.foo#Bar").unwrap();
        let mut a = Shape::new(id.clone(), ShapeType::String);
        let mut b = Shape::new(id.clone(), ShapeType::String);
        a.source = SourceLocation::new("a.json", 1, 1);
        let mut doc = Trait::new(ShapeId::prelude("documentation"), Node::from("x"));
        a.add_trait(doc.clone());
        doc.source = SourceLocation::new("b.json", 3, 3);
        b.add_trait(doc);
        assert_eq!(a, b);
        assert!(a.has_trait("smithy.api#documentation"));
    }

    #[test]
    fn test_member_container() {
        let member = Shape::member(
            ShapeId::parse("ns.foo#Bar$baz").unwrap(),
            Some(ShapeId::prelude("String")),
        );
        assert_eq!(member.member_name(), Some("baz"));
        assert_eq!(member.container().unwrap().to_string(), "ns.foo#Bar");
    }
}
