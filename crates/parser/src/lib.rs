//! Smithy JSON AST loading for the semantic engine
//!
//! This crate turns JSON AST documents into unresolved [`Fragment`]s that the
//! model assembler consumes, and writes fragments back out. It does no
//! resolution or validation of its own: targets may dangle, traits may be
//! unknown and members may be elided until the fragments are assembled.
//!
//! [`Fragment`]: smithy_semantic_common::Fragment

pub mod ast;

pub use ast::{AstModel, AstParser, FragmentWriter};

use smithy_semantic_common::{Fragment, Result};

/// Parse a JSON AST document into a fragment
///
/// # Arguments
/// * `json` - Document contents
/// * `name` - Name recorded in source locations, usually the file name
pub fn parse_fragment(json: &str, name: &str) -> Result<Fragment> {
    AstParser::from_json(json, name)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fragment() {
        let fragment = parse_fragment(r#"{"smithy": "2.0"}"#, "empty.json").unwrap();
        assert!(fragment.is_empty());
        assert_eq!(fragment.name, "empty.json");
    }
}
