//! Forward and reverse relationships between shapes

use crate::shapes::Model;
use smithy_semantic_common::{ShapeId, ShapeProperties, ShapeType};
use std::collections::BTreeMap;

/// Kind of edge between two shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelationshipType {
    /// Aggregate or enum to one of its member shapes
    Member,
    /// Member to the shape it targets
    MemberTarget,
    Input,
    Output,
    Error,
    Identifier,
    Property,
    Create,
    Read,
    Update,
    Delete,
    List,
    Put,
    Operation,
    CollectionOperation,
    InstanceOperation,
    Resource,
    /// Operation or resource to the service or resource it is bound to
    Bound,
    Mixin,
    /// Shape to the definition of a trait applied to it
    Trait,
}

impl RelationshipType {
    /// Name used in `-[name]->`; member targets have none
    pub fn selector_label(self) -> Option<&'static str> {
        Some(match self {
            RelationshipType::Member => "member",
            RelationshipType::MemberTarget => return None,
            RelationshipType::Input => "input",
            RelationshipType::Output => "output",
            RelationshipType::Error => "error",
            RelationshipType::Identifier => "identifier",
            RelationshipType::Property => "property",
            RelationshipType::Create => "create",
            RelationshipType::Read => "read",
            RelationshipType::Update => "update",
            RelationshipType::Delete => "delete",
            RelationshipType::List => "list",
            RelationshipType::Put => "put",
            RelationshipType::Operation => "operation",
            RelationshipType::CollectionOperation => "collectionOperation",
            RelationshipType::InstanceOperation => "instanceOperation",
            RelationshipType::Resource => "resource",
            RelationshipType::Bound => "bound",
            RelationshipType::Mixin => "mixin",
            RelationshipType::Trait => "trait",
        })
    }

    /// Whether `>` traverses this relationship
    pub fn is_directed(self) -> bool {
        !matches!(self, RelationshipType::Bound | RelationshipType::Trait)
    }
}

/// Edge from `shape` to `neighbor`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub shape: ShapeId,
    pub kind: RelationshipType,
    pub neighbor: ShapeId,
}

/// Every relationship in a model, indexed in both directions
///
/// Edges to shapes missing from the model are kept so that target
/// validation can report them.
#[derive(Debug, Default)]
pub struct NeighborIndex {
    forward: BTreeMap<ShapeId, Vec<Relationship>>,
    reverse: BTreeMap<ShapeId, Vec<Relationship>>,
}

impl NeighborIndex {
    pub fn new(model: &Model) -> Self {
        let mut index = NeighborIndex::default();

        for shape in model.shapes() {
            let mut push = |kind: RelationshipType, neighbor: &ShapeId| {
                index.add(Relationship {
                    shape: shape.id.clone(),
                    kind,
                    neighbor: neighbor.clone(),
                });
            };

            if let Some(target) = &shape.target {
                push(RelationshipType::MemberTarget, target);
            }
            for member in shape.members.values() {
                push(RelationshipType::Member, member);
            }
            for mixin in &shape.mixins {
                push(RelationshipType::Mixin, mixin);
            }

            match &shape.properties {
                ShapeProperties::None => {}
                ShapeProperties::Service(service) => {
                    for id in &service.operations {
                        push(RelationshipType::Operation, id);
                    }
                    for id in &service.resources {
                        push(RelationshipType::Resource, id);
                    }
                    for id in &service.errors {
                        push(RelationshipType::Error, id);
                    }
                }
                ShapeProperties::Operation(operation) => {
                    if let Some(input) = &operation.input {
                        push(RelationshipType::Input, input);
                    }
                    if let Some(output) = &operation.output {
                        push(RelationshipType::Output, output);
                    }
                    for id in &operation.errors {
                        push(RelationshipType::Error, id);
                    }
                }
                ShapeProperties::Resource(resource) => {
                    for id in resource.identifiers.values() {
                        push(RelationshipType::Identifier, id);
                    }
                    for id in resource.properties.values() {
                        push(RelationshipType::Property, id);
                    }
                    let lifecycle = [
                        (RelationshipType::Create, &resource.create, false),
                        (RelationshipType::Put, &resource.put, true),
                        (RelationshipType::Read, &resource.read, true),
                        (RelationshipType::Update, &resource.update, true),
                        (RelationshipType::Delete, &resource.delete, true),
                        (RelationshipType::List, &resource.list, false),
                    ];
                    for (kind, id, instance) in lifecycle {
                        if let Some(id) = id {
                            push(kind, id);
                            if instance {
                                push(RelationshipType::InstanceOperation, id);
                            } else {
                                push(RelationshipType::CollectionOperation, id);
                            }
                        }
                    }
                    for id in &resource.operations {
                        push(RelationshipType::Operation, id);
                        push(RelationshipType::InstanceOperation, id);
                    }
                    for id in &resource.collection_operations {
                        push(RelationshipType::CollectionOperation, id);
                    }
                    for id in &resource.resources {
                        push(RelationshipType::Resource, id);
                    }
                }
            }

            for value in shape.traits.values() {
                push(RelationshipType::Trait, &value.id);
            }
        }

        // Bound edges point from children back up to their container
        let mut bound = Vec::new();
        for shape in model.shapes() {
            if !matches!(shape.shape_type, ShapeType::Service | ShapeType::Resource) {
                continue;
            }
            let children: Vec<&ShapeId> = match &shape.properties {
                ShapeProperties::Service(s) => s.operations.iter().chain(&s.resources).collect(),
                ShapeProperties::Resource(r) => r
                    .all_operations()
                    .into_iter()
                    .chain(&r.resources)
                    .collect(),
                _ => Vec::new(),
            };
            for child in children {
                bound.push(Relationship {
                    shape: child.clone(),
                    kind: RelationshipType::Bound,
                    neighbor: shape.id.clone(),
                });
            }
        }
        for rel in bound {
            index.add(rel);
        }

        tracing::debug!(shapes = index.forward.len(), "Built neighbor index");
        index
    }

    fn add(&mut self, rel: Relationship) {
        self.reverse
            .entry(rel.neighbor.clone())
            .or_default()
            .push(rel.clone());
        self.forward.entry(rel.shape.clone()).or_default().push(rel);
    }

    /// Outgoing relationships of a shape
    pub fn neighbors(&self, id: &ShapeId) -> &[Relationship] {
        self.forward.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Relationships pointing at a shape
    pub fn reverse_neighbors(&self, id: &ShapeId) -> &[Relationship] {
        self.reverse.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn neighbors_of_kind(
        &self,
        id: &ShapeId,
        kind: RelationshipType,
    ) -> impl Iterator<Item = &Relationship> {
        self.neighbors(id).iter().filter(move |r| r.kind == kind)
    }

    pub fn reverse_neighbors_of_kind(
        &self,
        id: &ShapeId,
        kind: RelationshipType,
    ) -> impl Iterator<Item = &Relationship> {
        self.reverse_neighbors(id).iter().filter(move |r| r.kind == kind)
    }
}
