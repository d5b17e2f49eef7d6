//! Serializes fragments back into JSON AST documents

use super::types::{AstMember, AstModel, AstShape, ShapeReference, APPLY};
use indexmap::IndexMap;
use smithy_semantic_common::{
    Fragment, Node, Result, SemanticError, ShapeId, ShapeProperties, ShapeStub, ShapeType,
};

/// Smithy version written into every document
pub const SMITHY_VERSION: &str = "2.0";

/// Writes a [`Fragment`] as a Smithy JSON AST document
///
/// Traits are written inline on the shape or member they target when that
/// shape is defined in the fragment, and as `apply` entries otherwise.
pub struct FragmentWriter<'a> {
    fragment: &'a Fragment,
}

impl<'a> FragmentWriter<'a> {
    pub fn new(fragment: &'a Fragment) -> Self {
        Self { fragment }
    }

    /// Build the document tree
    pub fn to_ast(&self) -> Result<AstModel> {
        let mut shapes: IndexMap<String, AstShape> = IndexMap::new();

        for stub in &self.fragment.shapes {
            shapes.insert(stub.id.to_string(), convert_stub(stub));
        }

        for application in &self.fragment.traits {
            let trait_key = application.trait_id.to_string();
            let traits = self.traits_slot(&mut shapes, &application.target)?;
            if traits.contains_key(&trait_key) {
                return Err(SemanticError::Parse(format!(
                    "Cannot write trait `{trait_key}` twice for `{}` in one document",
                    application.target
                )));
            }
            traits.insert(trait_key, application.value.clone());
        }

        Ok(AstModel {
            smithy: SMITHY_VERSION.to_string(),
            metadata: self.fragment.metadata.clone(),
            shapes,
        })
    }

    /// Serialize to a pretty-printed JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_ast()?)?)
    }

    fn traits_slot<'m>(
        &self,
        shapes: &'m mut IndexMap<String, AstShape>,
        target: &ShapeId,
    ) -> Result<&'m mut IndexMap<String, Node>> {
        let container = target.without_member().to_string();
        let inline = shapes
            .get(&container)
            .is_some_and(|shape| !shape.is_apply() && has_slot(shape, target.member()));

        if !inline {
            let entry = shapes
                .entry(target.to_string())
                .or_insert_with(|| AstShape::new(APPLY));
            return Ok(&mut entry.traits);
        }

        let shape = shapes
            .get_mut(&container)
            .ok_or_else(|| SemanticError::Parse(format!("Missing shape `{container}`")))?;
        match target.member() {
            None => Ok(&mut shape.traits),
            Some(member) => member_slot_mut(shape, member)
                .map(|m| &mut m.traits)
                .ok_or_else(|| SemanticError::Parse(format!("Missing member `{target}`"))),
        }
    }
}

fn has_slot(shape: &AstShape, member: Option<&str>) -> bool {
    match member {
        None => true,
        Some(name) => {
            let fixed = match name {
                "member" => shape.member.is_some(),
                "key" => shape.key.is_some(),
                "value" => shape.value.is_some(),
                _ => false,
            };
            fixed || shape.members.as_ref().is_some_and(|m| m.contains_key(name))
        }
    }
}

fn member_slot_mut<'s>(shape: &'s mut AstShape, name: &str) -> Option<&'s mut AstMember> {
    if let Some(members) = shape.members.as_mut() {
        if members.contains_key(name) {
            return members.get_mut(name);
        }
    }
    match name {
        "member" => shape.member.as_mut(),
        "key" => shape.key.as_mut(),
        "value" => shape.value.as_mut(),
        _ => None,
    }
}

fn reference(id: &ShapeId) -> ShapeReference {
    ShapeReference::new(id.to_string())
}

fn references(ids: &[ShapeId]) -> Vec<ShapeReference> {
    ids.iter().map(reference).collect()
}

fn convert_stub(stub: &ShapeStub) -> AstShape {
    let mut shape = AstShape::new(stub.shape_type.as_str());
    shape.mixins = references(&stub.mixins);
    shape.for_resource = stub.for_resource.as_ref().map(reference);

    for member in &stub.members {
        let ast_member = AstMember {
            target: member.target.as_ref().map(ToString::to_string),
            traits: IndexMap::new(),
        };
        match (stub.shape_type, member.name.as_str()) {
            (ShapeType::List, "member") => shape.member = Some(ast_member),
            (ShapeType::Map, "key") => shape.key = Some(ast_member),
            (ShapeType::Map, "value") => shape.value = Some(ast_member),
            _ => {
                shape
                    .members
                    .get_or_insert_with(IndexMap::new)
                    .insert(member.name.clone(), ast_member);
            }
        }
    }

    match &stub.properties {
        ShapeProperties::None => {}
        ShapeProperties::Service(props) => {
            shape.version = props.version.clone();
            shape.operations = references(&props.operations);
            shape.resources = references(&props.resources);
            shape.errors = references(&props.errors);
            shape.rename = props
                .rename
                .iter()
                .map(|(id, name)| (id.to_string(), name.clone()))
                .collect();
        }
        ShapeProperties::Operation(props) => {
            shape.input = props.input.as_ref().map(reference);
            shape.output = props.output.as_ref().map(reference);
            shape.errors = references(&props.errors);
        }
        ShapeProperties::Resource(props) => {
            shape.identifiers = props
                .identifiers
                .iter()
                .map(|(name, id)| (name.clone(), reference(id)))
                .collect();
            shape.properties = props
                .properties
                .iter()
                .map(|(name, id)| (name.clone(), reference(id)))
                .collect();
            shape.create = props.create.as_ref().map(reference);
            shape.put = props.put.as_ref().map(reference);
            shape.read = props.read.as_ref().map(reference);
            shape.update = props.update.as_ref().map(reference);
            shape.delete = props.delete.as_ref().map(reference);
            shape.list = props.list.as_ref().map(reference);
            shape.operations = references(&props.operations);
            shape.collection_operations = references(&props.collection_operations);
            shape.resources = references(&props.resources);
        }
    }

    shape
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AstParser;
    use smithy_semantic_common::TraitApplication;

    fn id(value: &str) -> ShapeId {
        ShapeId::parse(value).unwrap()
    }

    #[test]
    fn test_inline_and_apply_traits() {
        let mut fragment = Fragment::new("out.json");
        fragment.add_shape(
            ShapeStub::new(id("ns.foo#Struct"), ShapeType::Structure)
                .with_member("a", id("smithy.api#String")),
        );
        fragment.add_trait(TraitApplication::new(
            id("ns.foo#Struct$a"),
            id("smithy.api#required"),
            Node::empty_object(),
        ));
        fragment.add_trait(TraitApplication::new(
            id("ns.other#Elsewhere"),
            id("smithy.api#documentation"),
            Node::from("Hi"),
        ));

        let ast = FragmentWriter::new(&fragment).to_ast().unwrap();
        let member = &ast.shapes["ns.foo#Struct"].members.as_ref().unwrap()["a"];
        assert!(member.traits.contains_key("smithy.api#required"));
        assert!(ast.shapes["ns.other#Elsewhere"].is_apply());
    }

    #[test]
    fn test_written_document_parses_back() {
        let json = r#"{
            "smithy": "2.0",
            "metadata": { "tags": ["a"] },
            "shapes": {
                "ns.foo#Names": {
                    "type": "list",
                    "member": {
                        "target": "smithy.api#String",
                        "traits": { "smithy.api#length": { "min": 1 } }
                    }
                },
                "ns.foo#Thing": {
                    "type": "resource",
                    "identifiers": { "thingId": { "target": "smithy.api#String" } },
                    "read": { "target": "ns.foo#GetThing" }
                }
            }
        }"#;
        let fragment = AstParser::from_json(json, "a.json").unwrap().parse().unwrap();
        let written = FragmentWriter::new(&fragment).to_json().unwrap();
        let reparsed = AstParser::from_json(&written, "a.json").unwrap().parse().unwrap();

        assert_eq!(reparsed.traits, fragment.traits);
        assert_eq!(reparsed.metadata, fragment.metadata);
        assert!(reparsed
            .shapes
            .iter()
            .zip(&fragment.shapes)
            .all(|(a, b)| a.same_definition(b)));
    }

    #[test]
    fn test_duplicate_trait_in_one_document_is_rejected() {
        let mut fragment = Fragment::new("dup.json");
        for value in ["a", "b"] {
            fragment.add_trait(TraitApplication::new(
                id("ns.foo#X"),
                id("smithy.api#documentation"),
                Node::from(value),
            ));
        }
        assert!(FragmentWriter::new(&fragment).to_ast().is_err());
    }
}
