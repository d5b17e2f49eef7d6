//! Converts a JSON AST document into an unresolved fragment

use super::types::{AstMember, AstModel, AstShape, ShapeReference};
use indexmap::IndexMap;
use smithy_semantic_common::{
    Fragment, MemberStub, Node, OperationProperties, ResourceProperties, Result, SemanticError,
    ServiceProperties, ShapeId, ShapeProperties, ShapeStub, ShapeType, SourceLocation,
    TraitApplication, PRELUDE_NAMESPACE,
};

/// Convert a parsed document into a fragment named `name`
pub fn convert_ast_to_fragment(model: &AstModel, name: &str) -> Result<Fragment> {
    let mut fragment = Fragment::new(name);
    let source = SourceLocation::new(name, 0, 0);

    for (key, value) in &model.metadata {
        fragment.add_metadata(key.clone(), value.clone());
    }

    for (raw_id, shape) in &model.shapes {
        let id = ShapeId::parse(raw_id)?;

        if shape.is_apply() {
            push_traits(&mut fragment, &id, &shape.traits, &source)?;
            continue;
        }

        if id.has_member() {
            return Err(SemanticError::Parse(format!(
                "Shape `{raw_id}` cannot be defined with a member ID"
            )));
        }

        let shape_type: ShapeType = shape.shape_type.parse().map_err(|e: String| {
            SemanticError::Parse(format!("{e} for shape `{raw_id}`"))
        })?;
        if shape_type == ShapeType::Member {
            return Err(SemanticError::Parse(format!(
                "Shape `{raw_id}` cannot have type `member`"
            )));
        }

        let mut stub = ShapeStub::new(id.clone(), shape_type).with_source(source.clone());
        stub.mixins = resolve_refs(&shape.mixins)?;
        stub.for_resource = resolve_opt(&shape.for_resource)?;
        stub.properties = convert_properties(shape_type, shape)?;

        for (member_name, member) in collect_members(shape_type, shape) {
            let target = match &member.target {
                Some(target) => Some(ShapeId::parse(target)?),
                None if matches!(shape_type, ShapeType::Enum | ShapeType::IntEnum) => {
                    Some(ShapeId::prelude("Unit"))
                }
                None => None,
            };
            stub.members.push(MemberStub {
                name: member_name.to_string(),
                target,
                source: source.clone(),
            });
            push_traits(
                &mut fragment,
                &id.with_member(member_name),
                &member.traits,
                &source,
            )?;
        }

        push_traits(&mut fragment, &id, &shape.traits, &source)?;
        fragment.add_shape(stub);
    }

    tracing::debug!(
        fragment = name,
        shapes = fragment.shapes.len(),
        traits = fragment.traits.len(),
        "Converted JSON AST document"
    );

    Ok(fragment)
}

/// Members in declaration order, with list and map members given their fixed names
fn collect_members(shape_type: ShapeType, shape: &AstShape) -> Vec<(&str, &AstMember)> {
    match shape_type {
        ShapeType::List => shape.member.iter().map(|m| ("member", m)).collect(),
        ShapeType::Map => shape
            .key
            .iter()
            .map(|m| ("key", m))
            .chain(shape.value.iter().map(|m| ("value", m)))
            .collect(),
        _ => shape
            .members
            .iter()
            .flatten()
            .map(|(name, member)| (name.as_str(), member))
            .collect(),
    }
}

fn convert_properties(shape_type: ShapeType, shape: &AstShape) -> Result<ShapeProperties> {
    Ok(match shape_type {
        ShapeType::Service => {
            let mut rename = std::collections::BTreeMap::new();
            for (from, to) in &shape.rename {
                rename.insert(ShapeId::parse(from)?, to.clone());
            }
            ShapeProperties::Service(ServiceProperties {
                version: shape.version.clone(),
                operations: resolve_refs(&shape.operations)?,
                resources: resolve_refs(&shape.resources)?,
                errors: resolve_refs(&shape.errors)?,
                rename,
            })
        }
        ShapeType::Operation => ShapeProperties::Operation(OperationProperties {
            input: resolve_opt(&shape.input)?,
            output: resolve_opt(&shape.output)?,
            errors: resolve_refs(&shape.errors)?,
        }),
        ShapeType::Resource => ShapeProperties::Resource(ResourceProperties {
            identifiers: resolve_named(&shape.identifiers)?,
            properties: resolve_named(&shape.properties)?,
            create: resolve_opt(&shape.create)?,
            put: resolve_opt(&shape.put)?,
            read: resolve_opt(&shape.read)?,
            update: resolve_opt(&shape.update)?,
            delete: resolve_opt(&shape.delete)?,
            list: resolve_opt(&shape.list)?,
            operations: resolve_refs(&shape.operations)?,
            collection_operations: resolve_refs(&shape.collection_operations)?,
            resources: resolve_refs(&shape.resources)?,
        }),
        _ => ShapeProperties::None,
    })
}

fn push_traits(
    fragment: &mut Fragment,
    target: &ShapeId,
    traits: &IndexMap<String, Node>,
    source: &SourceLocation,
) -> Result<()> {
    for (trait_name, value) in traits {
        let trait_id = ShapeId::from_relative(trait_name, PRELUDE_NAMESPACE)?;
        fragment.add_trait(
            TraitApplication::new(target.clone(), trait_id, value.clone())
                .with_source(source.clone()),
        );
    }
    Ok(())
}

fn resolve_refs(refs: &[ShapeReference]) -> Result<Vec<ShapeId>> {
    refs.iter().map(|r| ShapeId::parse(&r.target)).collect()
}

fn resolve_opt(reference: &Option<ShapeReference>) -> Result<Option<ShapeId>> {
    reference
        .as_ref()
        .map(|r| ShapeId::parse(&r.target))
        .transpose()
}

fn resolve_named(refs: &IndexMap<String, ShapeReference>) -> Result<IndexMap<String, ShapeId>> {
    refs.iter()
        .map(|(name, r)| Ok((name.clone(), ShapeId::parse(&r.target)?)))
        .collect()
}
