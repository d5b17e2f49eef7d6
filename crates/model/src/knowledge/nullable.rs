//! Optionality of members
//!
//! Whether a member is always present is a pure function of a handful of
//! traits on the member, its container and its target. Nothing is cached.

use crate::shapes::{Model, Shape};
use crate::traits::ids;
use smithy_semantic_common::ShapeType;

/// Kind of consumer asking whether a member may be absent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckMode {
    /// Authoritative consumers such as servers
    Server,
    /// Non-authoritative consumers; honors `clientOptional` and `input`
    Client,
    /// Like [`CheckMode::Client`], and also treats `addedDefault` members as
    /// optional
    ClientCareful,
}

/// Whether a value is guaranteed to be present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Optionality {
    Present,
    Optional,
}

/// Trait facts that decide the optionality of a structure member
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MemberFacts {
    pub required: bool,
    /// Member has a non-null `default`, or has no `default` and its target
    /// has a non-null one
    pub has_default: bool,
    pub client_optional: bool,
    /// Container carries `input`
    pub input: bool,
    pub added_default: bool,
}

/// Resolve structure member optionality for a consumer
///
/// # Examples
/// ```
/// use smithy_semantic_model::knowledge::{
///     resolve_optionality, CheckMode, MemberFacts, Optionality,
/// };
///
/// let facts = MemberFacts { required: true, client_optional: true, ..Default::default() };
/// assert_eq!(resolve_optionality(facts, CheckMode::Server), Optionality::Present);
/// assert_eq!(resolve_optionality(facts, CheckMode::Client), Optionality::Optional);
/// ```
pub fn resolve_optionality(facts: MemberFacts, mode: CheckMode) -> Optionality {
    if mode != CheckMode::Server && (facts.client_optional || facts.input) {
        return Optionality::Optional;
    }
    if mode == CheckMode::ClientCareful && facts.added_default {
        return Optionality::Optional;
    }
    if facts.required || facts.has_default {
        Optionality::Present
    } else {
        Optionality::Optional
    }
}

/// Optionality view over a model
#[derive(Debug, Clone, Copy)]
pub struct NullableIndex<'a> {
    model: &'a Model,
}

impl<'a> NullableIndex<'a> {
    pub fn new(model: &'a Model) -> Self {
        Self { model }
    }

    /// Collect the facts of a structure member
    pub fn member_facts(&self, member: &Shape) -> MemberFacts {
        let container = member.container().and_then(|c| self.model.get_shape(&c));
        let has_default = match member.trait_value(ids::DEFAULT) {
            Some(value) => !value.is_null(),
            None => self
                .model
                .target_of(member)
                .and_then(|t| t.trait_value(ids::DEFAULT))
                .is_some_and(|v| !v.is_null()),
        };
        MemberFacts {
            required: member.has_trait(ids::REQUIRED),
            has_default,
            client_optional: member.has_trait(ids::CLIENT_OPTIONAL),
            input: container.is_some_and(|c| c.has_trait(ids::INPUT)),
            added_default: member.has_trait(ids::ADDED_DEFAULT),
        }
    }

    /// Optionality of any member shape
    ///
    /// Union members are always optional. List and map members are present
    /// unless their container is `sparse`.
    pub fn member_optionality(&self, member: &Shape, mode: CheckMode) -> Optionality {
        let container = member.container().and_then(|c| self.model.get_shape(&c));
        match container.map(|c| (c.shape_type, c.has_trait(ids::SPARSE))) {
            Some((ShapeType::Union, _)) => Optionality::Optional,
            Some((ShapeType::List | ShapeType::Map, sparse)) => {
                if sparse {
                    Optionality::Optional
                } else {
                    Optionality::Present
                }
            }
            Some((ShapeType::Structure, _)) => resolve_optionality(self.member_facts(member), mode),
            _ => Optionality::Present,
        }
    }

    pub fn is_member_nullable(&self, member: &Shape, mode: CheckMode) -> bool {
        self.member_optionality(member, mode) == Optionality::Optional
    }
}
