//! Operations and resources contained in services and resources

use crate::shapes::Model;
use smithy_semantic_common::{ShapeId, ShapeProperties};
use std::collections::{BTreeMap, BTreeSet};

/// Transitive containment of resources and operations
#[derive(Debug, Default)]
pub struct TopDownIndex {
    resources: BTreeMap<ShapeId, BTreeSet<ShapeId>>,
    operations: BTreeMap<ShapeId, BTreeSet<ShapeId>>,
    parents: BTreeMap<ShapeId, ShapeId>,
}

impl TopDownIndex {
    pub fn new(model: &Model) -> Self {
        let mut index = TopDownIndex::default();

        for shape in model.shapes() {
            if let ShapeProperties::Resource(resource) = &shape.properties {
                for child in &resource.resources {
                    index.parents.insert(child.clone(), shape.id.clone());
                }
            }
        }

        for shape in model.shapes() {
            let (roots_ops, roots_resources): (Vec<&ShapeId>, Vec<&ShapeId>) =
                match &shape.properties {
                    ShapeProperties::Service(s) => {
                        (s.operations.iter().collect(), s.resources.iter().collect())
                    }
                    ShapeProperties::Resource(r) => {
                        (r.all_operations(), r.resources.iter().collect())
                    }
                    _ => continue,
                };

            let mut operations: BTreeSet<ShapeId> = roots_ops.into_iter().cloned().collect();
            let mut resources = BTreeSet::new();
            let mut stack: Vec<&ShapeId> = roots_resources;
            while let Some(id) = stack.pop() {
                if !resources.insert(id.clone()) {
                    continue;
                }
                if let Some(ShapeProperties::Resource(r)) =
                    model.get_shape(id).map(|s| &s.properties)
                {
                    operations.extend(r.all_operations().into_iter().cloned());
                    stack.extend(r.resources.iter());
                }
            }

            index.operations.insert(shape.id.clone(), operations);
            index.resources.insert(shape.id.clone(), resources);
        }

        index
    }

    /// Every operation reachable from a service or resource
    pub fn contained_operations(&self, container: &ShapeId) -> impl Iterator<Item = &ShapeId> {
        self.operations.get(container).into_iter().flatten()
    }

    /// Every resource reachable from a service or resource
    pub fn contained_resources(&self, container: &ShapeId) -> impl Iterator<Item = &ShapeId> {
        self.resources.get(container).into_iter().flatten()
    }

    pub fn contains_operation(&self, container: &ShapeId, operation: &ShapeId) -> bool {
        self.operations
            .get(container)
            .is_some_and(|ops| ops.contains(operation))
    }

    /// Resource that lists `resource` among its children
    pub fn parent_resource(&self, resource: &ShapeId) -> Option<&ShapeId> {
        self.parents.get(resource)
    }

    /// Ancestors of a resource, nearest first
    pub fn ancestors(&self, resource: &ShapeId) -> Vec<&ShapeId> {
        let mut result: Vec<&ShapeId> = Vec::new();
        let mut current = resource;
        while let Some(parent) = self.parents.get(current) {
            if parent == resource || result.contains(&parent) {
                break;
            }
            result.push(parent);
            current = parent;
        }
        result
    }
}
