//! Shape IDs must be unique when compared case-insensitively

use crate::shapes::Model;
use crate::validation::Validator;
use smithy_semantic_common::{ShapeId, ValidationEvent};
use std::collections::BTreeMap;

pub struct ShapeIdConflictValidator;

impl Validator for ShapeIdConflictValidator {
    fn name(&self) -> &str {
        "ShapeIdConflict"
    }

    fn validate(&self, model: &Model) -> Vec<ValidationEvent> {
        let mut groups: BTreeMap<String, Vec<&ShapeId>> = BTreeMap::new();
        for id in model.shape_ids() {
            groups.entry(id.to_case_insensitive_key()).or_default().push(id);
        }

        let mut events = Vec::new();
        for ids in groups.values().filter(|ids| ids.len() > 1) {
            for id in ids {
                let others: Vec<String> = ids
                    .iter()
                    .filter(|other| *other != id)
                    .map(|other| format!("`{other}`"))
                    .collect();
                let source = model.get_shape(id).map(|s| s.source.clone()).unwrap_or_default();
                events.push(
                    ValidationEvent::error(
                        self.name(),
                        format!(
                            "Shape ID `{id}` conflicts with other shape IDs in the model when \
                             compared case-insensitively: {}",
                            others.join(", ")
                        ),
                    )
                    .with_shape(id)
                    .with_source(&source),
                );
            }
        }
        events
    }
}
