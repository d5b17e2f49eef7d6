//! Combining fragments into one set of shape definitions

use crate::shapes::Trait;
use crate::traits::{merge_metadata, merge_trait, MODEL_EVENT};
use indexmap::IndexMap;
use smithy_semantic_common::{
    Fragment, Node, ShapeId, ShapeStub, ShapeType, TraitApplication, ValidationEvent,
};
use std::collections::{BTreeMap, BTreeSet};

/// A shape definition and the fragment it came from
#[derive(Debug)]
pub(super) struct DefinedStub {
    pub stub: ShapeStub,
    pub fragment: String,
    pub is_prelude: bool,
}

/// Traits applied to one shape, already merged across fragments
pub(super) type LocalTraits = BTreeMap<ShapeId, BTreeMap<String, Trait>>;

/// Everything collected from the fragments, before mixins are resolved
#[derive(Debug, Default)]
pub(super) struct Merged {
    pub stubs: BTreeMap<ShapeId, DefinedStub>,
    pub traits: LocalTraits,
    pub metadata: IndexMap<String, Node>,
    /// Shapes defined by prelude fragments
    pub builtin: BTreeSet<ShapeId>,
    pub events: Vec<ValidationEvent>,
}

/// Collects fragments in load order
///
/// Conflicts are recorded as events and never stop the merge, so a single
/// run reports every independent problem.
#[derive(Debug, Default)]
pub(super) struct Merger {
    stubs: BTreeMap<ShapeId, DefinedStub>,
    applications: Vec<(TraitApplication, String, bool)>,
    /// Metadata value and the fragment that first defined the key
    metadata: IndexMap<String, (Node, String)>,
    events: Vec<ValidationEvent>,
}

impl Merger {
    pub fn add(&mut self, fragment: Fragment) {
        tracing::debug!(
            fragment = %fragment.name,
            shapes = fragment.shapes.len(),
            traits = fragment.traits.len(),
            "Merging fragment"
        );

        for (key, value) in fragment.metadata {
            self.add_metadata(key, value, &fragment.name);
        }
        for stub in fragment.shapes {
            self.add_shape(stub, &fragment.name, fragment.is_prelude);
        }
        for application in fragment.traits {
            self.applications
                .push((application, fragment.name.clone(), fragment.is_prelude));
        }
    }

    fn add_metadata(&mut self, key: String, value: Node, fragment: &str) {
        let Some((existing, first)) = self.metadata.get_mut(&key) else {
            self.metadata.insert(key, (value, fragment.to_string()));
            return;
        };
        match merge_metadata(&key, existing, first, &value, fragment) {
            Ok(merged) => *existing = merged,
            Err(event) => self.events.push(event),
        }
    }

    fn add_shape(&mut self, stub: ShapeStub, fragment: &str, is_prelude: bool) {
        let Some(existing) = self.stubs.get(&stub.id) else {
            self.stubs.insert(
                stub.id.clone(),
                DefinedStub {
                    stub,
                    fragment: fragment.to_string(),
                    is_prelude,
                },
            );
            return;
        };

        if existing.is_prelude && !is_prelude {
            self.events.push(
                ValidationEvent::error(
                    MODEL_EVENT,
                    format!(
                        "Cannot redefine prelude shape `{}` in `{fragment}`",
                        stub.id
                    ),
                )
                .with_shape(&stub.id)
                .with_source(&stub.source),
            );
        } else if existing.stub.same_definition(&stub) {
            tracing::debug!(
                shape = %stub.id,
                first = %existing.fragment,
                second = fragment,
                "Ignoring duplicate but equal shape definition"
            );
            self.events.push(
                ValidationEvent::note(
                    MODEL_EVENT,
                    format!(
                        "Shape `{}` is defined in both `{}` and `{fragment}` with the same \
                         definition",
                        stub.id, existing.fragment
                    ),
                )
                .with_shape(&stub.id)
                .with_source(&stub.source),
            );
        } else {
            self.events.push(
                ValidationEvent::error(
                    MODEL_EVENT,
                    format!(
                        "Conflicting shape definition for `{}` found in `{}` and `{fragment}`. The \
                         previous shape was defined at `{}`, and a conflicting shape was defined \
                         at `{}`.",
                        stub.id, existing.fragment, existing.stub.source, stub.source
                    ),
                )
                .with_shape(&stub.id)
                .with_source(&stub.source),
            );
        }
    }

    /// Resolve trait conflicts and hand over the collected definitions
    pub fn finish(mut self) -> Merged {
        let builtin: BTreeSet<ShapeId> = self
            .stubs
            .values()
            .filter(|d| d.is_prelude)
            .map(|d| d.stub.id.clone())
            .collect();

        let mut traits: LocalTraits = BTreeMap::new();
        for (application, fragment, is_prelude) in std::mem::take(&mut self.applications) {
            if !is_prelude && builtin.contains(&application.target.without_member()) {
                self.events.push(
                    ValidationEvent::error(
                        MODEL_EVENT,
                        format!(
                            "Cannot apply `{}` to the immutable prelude shape `{}` from \
                             `{fragment}`",
                            application.trait_id, application.target
                        ),
                    )
                    .with_shape(&application.target)
                    .with_trait(&application.trait_id)
                    .with_source(&application.source),
                );
                continue;
            }

            let is_list = self
                .stubs
                .get(&application.trait_id)
                .map(|d| d.stub.shape_type == ShapeType::List);
            let incoming = Trait {
                id: application.trait_id.clone(),
                value: application.value,
                source: application.source,
            };
            let applied = traits.entry(application.target.clone()).or_default();
            let key = application.trait_id.to_string();
            match applied.get(&key) {
                None => {
                    applied.insert(key, incoming);
                }
                Some(existing) => {
                    match merge_trait(&application.target, existing, &incoming, is_list) {
                        Ok(merged) => {
                            applied.insert(key, merged);
                        }
                        Err(event) => self.events.push(event),
                    }
                }
            }
        }

        Merged {
            stubs: self.stubs,
            traits,
            metadata: self
                .metadata
                .into_iter()
                .map(|(key, (value, _))| (key, value))
                .collect(),
            builtin,
            events: self.events,
        }
    }
}
