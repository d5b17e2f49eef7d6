//! The frozen semantic model

use super::shape::Shape;
use crate::knowledge::KnowledgeCache;
use indexmap::IndexMap;
use smithy_semantic_common::{
    Fragment, MemberStub, Node, ShapeId, ShapeStub, ShapeType, TraitApplication,
};
use std::collections::{BTreeMap, BTreeSet};

/// Resolved shape graph plus metadata
///
/// Shapes, including member shapes, live in one arena keyed by shape ID and
/// refer to each other by ID only. Knowledge indices are computed on first
/// use and cached for the lifetime of the model.
#[derive(Debug, Default)]
pub struct Model {
    pub(crate) shapes: BTreeMap<ShapeId, Shape>,
    pub(crate) metadata: IndexMap<String, Node>,
    /// Shapes that came from built-in prelude fragments
    pub(crate) builtin: BTreeSet<ShapeId>,
    pub(crate) knowledge: KnowledgeCache,
}

impl Model {
    pub fn new(shapes: impl IntoIterator<Item = Shape>, metadata: IndexMap<String, Node>) -> Self {
        Self {
            shapes: shapes.into_iter().map(|s| (s.id.clone(), s)).collect(),
            metadata,
            builtin: BTreeSet::new(),
            knowledge: KnowledgeCache::default(),
        }
    }

    pub fn get_shape(&self, id: &ShapeId) -> Option<&Shape> {
        self.shapes.get(id)
    }

    pub fn contains_shape(&self, id: &ShapeId) -> bool {
        self.shapes.contains_key(id)
    }

    /// All shapes in shape ID order
    pub fn shapes(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.values()
    }

    pub fn shape_ids(&self) -> impl Iterator<Item = &ShapeId> {
        self.shapes.keys()
    }

    pub fn shapes_of_type(&self, shape_type: ShapeType) -> impl Iterator<Item = &Shape> {
        self.shapes.values().filter(move |s| s.shape_type == shape_type)
    }

    pub fn shapes_with_trait<'a>(&'a self, trait_id: &'a str) -> impl Iterator<Item = &'a Shape> {
        self.shapes.values().filter(move |s| s.has_trait(trait_id))
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn metadata(&self) -> &IndexMap<String, Node> {
        &self.metadata
    }

    pub fn get_metadata(&self, key: &str) -> Option<&Node> {
        self.metadata.get(key)
    }

    /// Trait lookup by (shape, trait)
    pub fn get_trait(&self, shape: &ShapeId, trait_id: &str) -> Option<&super::Trait> {
        self.get_shape(shape).and_then(|s| s.get_trait(trait_id))
    }

    /// Member shapes of an aggregate in declaration order
    pub fn members<'a>(&'a self, shape: &'a Shape) -> impl Iterator<Item = &'a Shape> {
        shape.members.values().filter_map(|id| self.shapes.get(id))
    }

    pub fn get_member(&self, shape: &Shape, name: &str) -> Option<&Shape> {
        shape.members.get(name).and_then(|id| self.shapes.get(id))
    }

    /// Target shape of a member
    pub fn target_of(&self, member: &Shape) -> Option<&Shape> {
        member.target.as_ref().and_then(|t| self.shapes.get(t))
    }

    /// Whether a shape is part of the built-in prelude
    pub fn is_builtin(&self, id: &ShapeId) -> bool {
        self.builtin.contains(&id.without_member())
    }

    /// Write the model back out as a single fragment
    ///
    /// Built-in shapes are left out. Members and traits are written in their
    /// resolved form, so assembling the fragment again gives an equal model.
    pub fn to_fragment(&self, name: &str) -> Fragment {
        let mut fragment = Fragment::new(name);
        fragment.metadata = self.metadata.clone();

        for shape in self.shapes().filter(|s| !s.is_member() && !self.is_builtin(&s.id)) {
            let mut stub = ShapeStub::new(shape.id.clone(), shape.shape_type)
                .with_properties(shape.properties.clone())
                .with_source(shape.source.clone());
            stub.mixins = shape.mixins.clone();

            for member in self.members(shape) {
                let name = member.member_name().unwrap_or_default();
                stub.members.push(MemberStub {
                    name: name.to_string(),
                    target: member.target.clone(),
                    source: member.source.clone(),
                });
                push_traits(&mut fragment, member);
            }

            push_traits(&mut fragment, shape);
            fragment.add_shape(stub);
        }

        fragment
    }
}

fn push_traits(fragment: &mut Fragment, shape: &Shape) {
    for value in shape.traits.values() {
        fragment.add_trait(
            TraitApplication::new(shape.id.clone(), value.id.clone(), value.value.clone())
                .with_source(value.source.clone()),
        );
    }
}

impl Clone for Model {
    fn clone(&self) -> Self {
        Self {
            shapes: self.shapes.clone(),
            metadata: self.metadata.clone(),
            builtin: self.builtin.clone(),
            knowledge: KnowledgeCache::default(),
        }
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.shapes == other.shapes && self.metadata == other.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Trait;

    fn id(value: &str) -> ShapeId {
        ShapeId::parse(value).unwrap()
    }

    fn sample() -> Model {
        let mut structure = Shape::new(id("ns.foo#S"), ShapeType::Structure);
        structure.members.insert("a".to_string(), id("ns.foo#S$a"));
        let mut member = Shape::member(id("ns.foo#S$a"), Some(ShapeId::prelude("String")));
        member.add_trait(Trait::new(ShapeId::prelude("required"), Node::empty_object()));
        Model::new(
            [structure, member, Shape::new(ShapeId::prelude("String"), ShapeType::String)],
            IndexMap::new(),
        )
    }

    #[test]
    fn test_member_lookup() {
        let model = sample();
        let structure = model.get_shape(&id("ns.foo#S")).unwrap();
        let member = model.get_member(structure, "a").unwrap();
        assert_eq!(model.target_of(member).unwrap().shape_type, ShapeType::String);
        assert!(model.get_trait(&member.id, "smithy.api#required").is_some());
    }

    #[test]
    fn test_to_fragment_inlines_member_traits() {
        let fragment = sample().to_fragment("out");
        let stub = fragment.shapes.iter().find(|s| s.id == id("ns.foo#S")).unwrap();
        assert_eq!(stub.members.len(), 1);
        assert_eq!(fragment.traits.len(), 1);
        assert_eq!(fragment.traits[0].target, id("ns.foo#S$a"));
    }
}
