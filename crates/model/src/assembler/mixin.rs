//! Mixin inheritance and elided member targets
//!
//! Shapes are built from their stubs in dependency order: a shape is built
//! after every mixin it uses and after the resource it is bound to with
//! `for`. Building a shape copies in the members and traits of its already
//! built mixins, then layers the shape's own traits on top.

use super::merge::{DefinedStub, LocalTraits};
use crate::shapes::{Shape, Trait};
use crate::traits::{ids, MODEL_EVENT};
use indexmap::IndexMap;
use smithy_semantic_common::{Node, ShapeId, ShapeStub, SourceLocation, ValidationEvent};
use std::collections::{BTreeMap, BTreeSet};

/// A member copied from a mixin, before it is re-homed onto the shape
struct InheritedMember {
    mixin: ShapeId,
    target: Option<ShapeId>,
    traits: BTreeMap<String, Trait>,
    source: SourceLocation,
}

/// Build resolved shapes from merged stubs
///
/// Local traits are consumed as shapes are built; entries left in `traits`
/// afterwards target shapes that never materialized.
pub(super) fn resolve(
    stubs: &BTreeMap<ShapeId, DefinedStub>,
    traits: &mut LocalTraits,
    events: &mut Vec<ValidationEvent>,
) -> BTreeMap<ShapeId, Shape> {
    let order = resolution_order(stubs, events);
    let mut shapes = BTreeMap::new();

    for id in order {
        let Some(defined) = stubs.get(&id) else {
            continue;
        };
        let resolved = Resolver {
            stub: &defined.stub,
            shapes: &shapes,
            events: &mut *events,
        }
        .build(traits);
        shapes.extend(resolved.into_iter().map(|s| (s.id.clone(), s)));
    }
    shapes
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Shape IDs ordered so that mixins and bound resources come first
fn resolution_order(
    stubs: &BTreeMap<ShapeId, DefinedStub>,
    events: &mut Vec<ValidationEvent>,
) -> Vec<ShapeId> {
    let mut marks = BTreeMap::new();
    let mut path = Vec::new();
    let mut order = Vec::with_capacity(stubs.len());
    for id in stubs.keys() {
        visit(id, stubs, &mut marks, &mut path, &mut order, events);
    }
    order
}

fn visit<'a>(
    id: &'a ShapeId,
    stubs: &'a BTreeMap<ShapeId, DefinedStub>,
    marks: &mut BTreeMap<&'a ShapeId, Mark>,
    path: &mut Vec<&'a ShapeId>,
    order: &mut Vec<ShapeId>,
    events: &mut Vec<ValidationEvent>,
) {
    match marks.get(id) {
        Some(Mark::Done) => return,
        Some(Mark::Visiting) => {
            let start = path.iter().position(|p| *p == id).unwrap_or(0);
            let cycle: Vec<String> = path[start..]
                .iter()
                .chain(std::iter::once(&id))
                .map(|p| p.to_string())
                .collect();
            let message = format!("Mixin cycle detected: {}", cycle.join(" > "));
            events.push(ValidationEvent::error(MODEL_EVENT, message).with_shape(id));
            return;
        }
        None => {}
    }
    let Some(defined) = stubs.get(id) else {
        return;
    };

    marks.insert(id, Mark::Visiting);
    path.push(id);
    for mixin in &defined.stub.mixins {
        if stubs.contains_key(mixin) {
            visit(mixin, stubs, marks, path, order, events);
        } else {
            events.push(
                ValidationEvent::error(
                    MODEL_EVENT,
                    format!("Shape `{id}` uses mixin `{mixin}`, which cannot be found"),
                )
                .with_shape(id)
                .with_source(&defined.stub.source),
            );
        }
    }
    if let Some(resource) = &defined.stub.for_resource {
        if stubs.contains_key(resource) {
            visit(resource, stubs, marks, path, order, events);
        }
    }
    path.pop();
    marks.insert(id, Mark::Done);
    order.push(id.clone());
}

struct Resolver<'a> {
    stub: &'a ShapeStub,
    /// Shapes built so far, including every dependency of `stub`
    shapes: &'a BTreeMap<ShapeId, Shape>,
    events: &'a mut Vec<ValidationEvent>,
}

impl<'a> Resolver<'a> {
    /// The shape and its member shapes
    fn build(mut self, traits: &mut LocalTraits) -> Vec<Shape> {
        let stub = self.stub;
        let mut shape = Shape::new(stub.id.clone(), stub.shape_type);
        shape.mixins = stub.mixins.clone();
        shape.properties = stub.properties.clone();
        shape.for_resource = stub.for_resource.clone();
        shape.source = stub.source.clone();

        let local_traits = traits.remove(&stub.id).unwrap_or_default();
        let mut inherited_traits: BTreeMap<String, (Trait, ShapeId)> = BTreeMap::new();
        let mut inherited_members: IndexMap<String, InheritedMember> = IndexMap::new();

        for mixin_id in &stub.mixins {
            let Some(mixin) = self.usable_mixin(mixin_id) else {
                continue;
            };
            self.inherit_traits(mixin, &local_traits, &mut inherited_traits);
            self.inherit_members(mixin, &mut inherited_members);
            shape.properties.inherit_from(&mixin.properties);
        }

        shape.traits = inherited_traits
            .into_values()
            .map(|(t, _)| (t.id.to_string(), t))
            .collect();
        shape.traits.extend(local_traits);

        let mut members = Vec::new();
        for (name, inherited) in inherited_members.iter() {
            let local = stub.member(name);
            let target = match local {
                Some(member) => {
                    let target = self
                        .local_target(name, member.target.as_ref())
                        .or_else(|| inherited.target.clone());
                    if target != inherited.target {
                        self.member_target_conflict(name, target.as_ref(), inherited);
                    }
                    target
                }
                None => inherited.target.clone(),
            };
            let mut member = Shape::member(stub.id.with_member(name), target);
            member.traits = inherited.traits.clone();
            member.source = local.map_or_else(|| inherited.source.clone(), |m| m.source.clone());
            members.push(member);
        }
        for local in stub.members.iter().filter(|m| !inherited_members.contains_key(&m.name)) {
            let target = self.local_target(&local.name, local.target.as_ref());
            if target.is_none() {
                self.unresolved_elided_member(&local.name);
            }
            let mut member = Shape::member(stub.id.with_member(&local.name), target);
            member.source = local.source.clone();
            members.push(member);
        }

        for member in &mut members {
            if let Some(applied) = traits.remove(&member.id) {
                member.traits.extend(applied);
            }
            if let Some(name) = member.member_name() {
                shape.members.insert(name.to_string(), member.id.clone());
            }
        }

        let mut result = vec![shape];
        result.extend(members);
        result
    }

    /// A resolved mixin, or `None` after reporting why it cannot be used
    fn usable_mixin(&mut self, mixin_id: &ShapeId) -> Option<&'a Shape> {
        let stub = self.stub;
        let shapes = self.shapes;
        let mixin = shapes.get(mixin_id)?;
        if !mixin.has_trait(ids::MIXIN) {
            self.error(format!(
                "Shape `{}` uses `{mixin_id}` as a mixin, but it is not marked with the `mixin` \
                 trait",
                stub.id
            ));
            return None;
        }
        if mixin.shape_type != stub.shape_type {
            self.error(format!(
                "Shape `{}` of type {} cannot use mixin `{mixin_id}` of type {}",
                stub.id, stub.shape_type, mixin.shape_type
            ));
            return None;
        }
        Some(mixin)
    }

    fn inherit_traits(
        &mut self,
        mixin: &Shape,
        local: &BTreeMap<String, Trait>,
        inherited: &mut BTreeMap<String, (Trait, ShapeId)>,
    ) {
        let local_only = local_mixin_traits(mixin);
        for (key, value) in &mixin.traits {
            if key == ids::MIXIN || local_only.contains(key.as_str()) {
                continue;
            }
            match inherited.get(key) {
                Some((existing, from))
                    if existing.value != value.value && !local.contains_key(key) =>
                {
                    let message = format!(
                        "Shape `{}` inherits conflicting `{key}` traits from mixins `{from}` and \
                         `{}`",
                        self.stub.id, mixin.id
                    );
                    self.error(message);
                }
                Some(_) => {}
                None => {
                    inherited.insert(key.clone(), (value.clone(), mixin.id.clone()));
                }
            }
        }
    }

    fn inherit_members(
        &mut self,
        mixin: &Shape,
        inherited: &mut IndexMap<String, InheritedMember>,
    ) {
        for (name, member_id) in &mixin.members {
            let Some(member) = self.shapes.get(member_id) else {
                continue;
            };
            match inherited.get_mut(name) {
                Some(existing) if existing.target != member.target => {
                    let message = format!(
                        "Member `{name}` of `{}` is inherited from both `{}` and `{}` with \
                         different targets",
                        self.stub.id, existing.mixin, mixin.id
                    );
                    self.error(message);
                }
                Some(existing) => {
                    for (key, value) in &member.traits {
                        existing.traits.entry(key.clone()).or_insert_with(|| value.clone());
                    }
                }
                None => {
                    inherited.insert(
                        name.clone(),
                        InheritedMember {
                            mixin: mixin.id.clone(),
                            target: member.target.clone(),
                            traits: member.traits.clone(),
                            source: member.source.clone(),
                        },
                    );
                }
            }
        }
    }

    /// Explicit target of a local member, or the identifier or property of
    /// the bound resource with the same name
    fn local_target(&self, name: &str, explicit: Option<&ShapeId>) -> Option<ShapeId> {
        if let Some(target) = explicit {
            return Some(target.clone());
        }
        let resource = self
            .stub
            .for_resource
            .as_ref()
            .and_then(|id| self.shapes.get(id))
            .and_then(|r| r.properties.as_resource())?;
        resource
            .identifiers
            .get(name)
            .or_else(|| resource.properties.get(name))
            .cloned()
    }

    fn member_target_conflict(
        &mut self,
        name: &str,
        target: Option<&ShapeId>,
        inherited: &InheritedMember,
    ) {
        let target = target.map(ToString::to_string).unwrap_or_default();
        let expected = inherited.target.as_ref().map(ToString::to_string).unwrap_or_default();
        let message = format!(
            "Member `{name}` of `{}` targets `{target}`, but the member inherited from mixin \
             `{}` targets `{expected}`",
            self.stub.id, inherited.mixin
        );
        self.error(message);
    }

    fn unresolved_elided_member(&mut self, name: &str) {
        let context = match &self.stub.for_resource {
            Some(resource) => {
                format!("no identifier or property of `{resource}` and no mixin member")
            }
            None => "the shape is not bound to a resource and no mixin member".to_string(),
        };
        let message = format!(
            "Unable to resolve the elided target of member `{name}` of `{}`: {context} has \
             that name",
            self.stub.id
        );
        self.error(message);
    }

    fn error(&mut self, message: String) {
        self.events.push(
            ValidationEvent::error(MODEL_EVENT, message)
                .with_shape(&self.stub.id)
                .with_source(&self.stub.source),
        );
    }
}

/// Traits listed in a mixin's `localTraits` that are not inherited
fn local_mixin_traits(mixin: &Shape) -> BTreeSet<String> {
    mixin
        .trait_value(ids::MIXIN)
        .and_then(|v| v.get("localTraits"))
        .and_then(Node::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Node::as_str)
                .filter_map(|name| ShapeId::from_relative(name, mixin.id.namespace()).ok())
                .map(|id| id.to_string())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use smithy_semantic_common::{ResourceProperties, ShapeProperties, ShapeType};

    fn id(value: &str) -> ShapeId {
        ShapeId::parse(value).unwrap()
    }

    fn stubs(values: Vec<ShapeStub>) -> BTreeMap<ShapeId, DefinedStub> {
        values
            .into_iter()
            .map(|stub| {
                (
                    stub.id.clone(),
                    DefinedStub {
                        stub,
                        fragment: "test.json".to_string(),
                        is_prelude: false,
                    },
                )
            })
            .collect()
    }

    fn apply(traits: &mut LocalTraits, target: &str, trait_id: &str, value: Node) {
        let trait_id = id(trait_id);
        traits
            .entry(id(target))
            .or_default()
            .insert(trait_id.to_string(), Trait::new(trait_id, value));
    }

    #[test]
    fn test_members_and_traits_are_inherited() {
        let stubs = stubs(vec![
            ShapeStub::new(id("ns#Base"), ShapeType::Structure)
                .with_member("a", ShapeId::prelude("String")),
            ShapeStub::new(id("ns#S"), ShapeType::Structure)
                .with_mixin(id("ns#Base"))
                .with_member("b", ShapeId::prelude("Integer")),
        ]);
        let mut traits = LocalTraits::new();
        apply(&mut traits, "ns#Base", ids::MIXIN, Node::empty_object());
        apply(&mut traits, "ns#Base", ids::DOCUMENTATION, Node::from("base"));
        apply(&mut traits, "ns#Base$a", ids::REQUIRED, Node::empty_object());
        apply(&mut traits, "ns#S$a", ids::DOCUMENTATION, Node::from("local"));
        let mut events = Vec::new();

        let shapes = resolve(&stubs, &mut traits, &mut events);

        assert!(events.is_empty());
        assert!(traits.is_empty());
        let shape = &shapes[&id("ns#S")];
        assert_eq!(shape.member_names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(!shape.has_trait(ids::MIXIN));
        assert_eq!(shape.trait_value(ids::DOCUMENTATION), Some(&Node::from("base")));
        let member = &shapes[&id("ns#S$a")];
        assert_eq!(member.target, Some(ShapeId::prelude("String")));
        assert!(member.has_trait(ids::REQUIRED));
        assert_eq!(member.trait_value(ids::DOCUMENTATION), Some(&Node::from("local")));
    }

    #[test]
    fn test_local_traits_are_not_inherited() {
        let stubs = stubs(vec![
            ShapeStub::new(id("ns#Base"), ShapeType::Structure),
            ShapeStub::new(id("ns#S"), ShapeType::Structure).with_mixin(id("ns#Base")),
        ]);
        let mut traits = LocalTraits::new();
        apply(
            &mut traits,
            "ns#Base",
            ids::MIXIN,
            Node::object([("localTraits", Node::Array(vec![Node::from("smithy.api#private")]))]),
        );
        apply(&mut traits, "ns#Base", ids::PRIVATE, Node::empty_object());
        let mut events = Vec::new();

        let shapes = resolve(&stubs, &mut traits, &mut events);

        assert!(events.is_empty());
        assert!(shapes[&id("ns#Base")].has_trait(ids::PRIVATE));
        assert!(!shapes[&id("ns#S")].has_trait(ids::PRIVATE));
    }

    #[test]
    fn test_mixin_cycle() {
        let stubs = stubs(vec![
            ShapeStub::new(id("ns#A"), ShapeType::Structure).with_mixin(id("ns#B")),
            ShapeStub::new(id("ns#B"), ShapeType::Structure).with_mixin(id("ns#A")),
        ]);
        let mut events = Vec::new();
        resolve(&stubs, &mut LocalTraits::new(), &mut events);

        let cycles: Vec<_> = events
            .iter()
            .filter(|e| e.message.starts_with("Mixin cycle"))
            .collect();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].message, "Mixin cycle detected: ns#A > ns#B > ns#A");
    }

    #[test]
    fn test_missing_and_unmarked_mixins() {
        let stubs = stubs(vec![
            ShapeStub::new(id("ns#Plain"), ShapeType::Structure),
            ShapeStub::new(id("ns#S"), ShapeType::Structure)
                .with_mixin(id("ns#Plain"))
                .with_mixin(id("ns#Missing")),
        ]);
        let mut events = Vec::new();
        resolve(&stubs, &mut LocalTraits::new(), &mut events);

        assert_eq!(events.len(), 2);
        assert!(events.iter().any(|e| e.message.contains("which cannot be found")));
        assert!(events.iter().any(|e| e.message.contains("not marked with the `mixin` trait")));
    }

    #[test]
    fn test_elided_members_resolve_from_resource() {
        let mut resource = ShapeStub::new(id("ns#City"), ShapeType::Resource);
        resource.properties = ShapeProperties::Resource(ResourceProperties {
            identifiers: [("cityId".to_string(), id("ns#CityId"))].into_iter().collect(),
            properties: [("name".to_string(), ShapeId::prelude("String"))].into_iter().collect(),
            ..Default::default()
        });
        let mut input = ShapeStub::new(id("ns#GetCityInput"), ShapeType::Structure)
            .with_elided_member("cityId")
            .with_elided_member("name")
            .with_elided_member("other");
        input.for_resource = Some(id("ns#City"));
        let stubs = stubs(vec![resource, input]);
        let mut events = Vec::new();

        let shapes = resolve(&stubs, &mut LocalTraits::new(), &mut events);

        assert_eq!(shapes[&id("ns#GetCityInput$cityId")].target, Some(id("ns#CityId")));
        assert_eq!(shapes[&id("ns#GetCityInput$name")].target, Some(ShapeId::prelude("String")));
        assert_eq!(events.len(), 1);
        assert!(events[0]
            .message
            .starts_with("Unable to resolve the elided target of member `other`"));
    }

    #[test]
    fn test_conflicting_member_target() {
        let stubs = stubs(vec![
            ShapeStub::new(id("ns#Base"), ShapeType::Structure)
                .with_member("a", ShapeId::prelude("String")),
            ShapeStub::new(id("ns#S"), ShapeType::Structure)
                .with_mixin(id("ns#Base"))
                .with_member("a", ShapeId::prelude("Integer")),
        ]);
        let mut traits = LocalTraits::new();
        apply(&mut traits, "ns#Base", ids::MIXIN, Node::empty_object());
        let mut events = Vec::new();
        resolve(&stubs, &mut traits, &mut events);

        assert_eq!(events.len(), 1);
        assert!(events[0].message.starts_with("Member `a` of `ns#S` targets `smithy.api#Integer`"));
    }
}
