//! Selector expressions
//!
//! Selectors are a small query language over the shape graph. They are used
//! by trait definitions to restrict where a trait may be applied, and by
//! metadata validators to find shapes to report on.
//!
//! A selector compiles into a list of [`Step`]s. Evaluation is push based:
//! each shape is pushed through the steps in order, filters drop shapes,
//! traversals fan out to neighbors, and whatever reaches the end of the list
//! is emitted. Emitting returns `false` to stop evaluation early, which is how
//! `:test` and `:not` short-circuit.
//!
//! ```
//! use smithy_semantic_model::Selector;
//!
//! let selector = Selector::parse("structure > member :test(> string)").unwrap();
//! assert_eq!(selector.expression(), "structure > member :test(> string)");
//! assert!(Selector::parse("structure >").is_err());
//! ```

mod attribute;
mod eval;
mod parser;

pub use attribute::{AttributePath, AttributeTest, Comparator, PathSegment};
pub(crate) use attribute::resolve_trait_name;

use crate::shapes::{Model, Shape};
use smithy_semantic_common::{ShapeId, ShapeType};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// A selector that failed to parse
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Syntax error at position {position} of selector `{expression}`: {message}")]
pub struct SelectorSyntaxError {
    pub message: String,
    pub expression: String,
    pub position: usize,
}

/// Groups of shape types that can be matched by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Number,
    SimpleType,
    Collection,
}

/// One compiled step of a selector
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// `*`
    Any,
    /// Shape type test; `string` also matches enums, `integer` intEnums
    ShapeType(ShapeType),
    Category(TypeCategory),
    Attribute(AttributeTest),
    /// `>` or `-[rel, ...]->`; an empty list means every directed relationship
    Forward(Vec<String>),
    /// `<` or `<-[rel, ...]-`
    Reverse(Vec<String>),
    /// `~>`
    RecursiveNeighbors,
    /// `:not(s)` passes shapes for which `s` yields nothing
    Not(Vec<Step>),
    /// `:is(a, b)` yields the output of each selector
    Is(Vec<Vec<Step>>),
    /// `:test(a, b)` passes shapes for which any selector yields something
    Test(Vec<Vec<Step>>),
    /// `:in(s)` passes shapes found anywhere in the output of `s`
    In(Vec<Step>),
    /// `:recursive(s)` applies `s` repeatedly and yields every result
    Recursive(Vec<Step>),
}

/// A compiled selector
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    expression: String,
    steps: Vec<Step>,
}

impl Selector {
    /// Compile a selector expression
    pub fn parse(expression: &str) -> Result<Self, SelectorSyntaxError> {
        let steps = parser::SelectorParser::new(expression).parse()?;
        Ok(Self {
            expression: expression.to_string(),
            steps,
        })
    }

    /// Selector that matches every shape
    pub fn any() -> Self {
        Self {
            expression: "*".to_string(),
            steps: vec![Step::Any],
        }
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Every shape produced by the selector, in shape ID order
    pub fn select<'m>(&self, model: &'m Model) -> Vec<&'m Shape> {
        let ids = self.select_ids(model);
        ids.iter().filter_map(|id| model.get_shape(id)).collect()
    }

    /// IDs of every shape produced by the selector
    pub fn select_ids(&self, model: &Model) -> BTreeSet<ShapeId> {
        let mut evaluator = eval::Evaluator::new(model);
        let mut result = BTreeSet::new();
        for shape in model.shapes() {
            evaluator.push(shape, &self.steps, &mut |found| {
                result.insert(found.id.clone());
                true
            });
        }
        result
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

impl std::str::FromStr for Selector {
    type Err = SelectorSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
