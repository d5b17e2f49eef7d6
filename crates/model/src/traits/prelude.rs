//! Built-in shapes and trait definitions

use smithy_semantic_common::{Fragment, Result};
use smithy_semantic_parser::parse_fragment;

const PRELUDE: &str = include_str!("prelude.json");
const AWS_TRAITS: &str = include_str!("aws.json");

/// `smithy.api` simple types, `Unit` and core trait definitions
pub fn prelude_fragment() -> Result<Fragment> {
    builtin("prelude.json", PRELUDE)
}

/// Trait definitions from `aws.api` and `aws.protocols`
pub fn aws_fragment() -> Result<Fragment> {
    builtin("aws.json", AWS_TRAITS)
}

/// Every fragment loaded ahead of user fragments
pub fn builtin_fragments() -> Result<Vec<Fragment>> {
    Ok(vec![prelude_fragment()?, aws_fragment()?])
}

fn builtin(name: &str, json: &str) -> Result<Fragment> {
    let mut fragment = parse_fragment(json, name)?;
    fragment.is_prelude = true;
    Ok(fragment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use smithy_semantic_common::{ShapeId, ShapeType};

    #[test]
    fn test_prelude_parses() {
        let fragment = prelude_fragment().unwrap();
        assert!(fragment.is_prelude);
        let string = fragment
            .shapes
            .iter()
            .find(|s| s.id == ShapeId::prelude("String"))
            .unwrap();
        assert_eq!(string.shape_type, ShapeType::String);
        assert!(fragment
            .traits
            .iter()
            .any(|t| t.target == ShapeId::prelude("required")
                && t.trait_id == ShapeId::prelude("trait")));
    }

    #[test]
    fn test_aws_traits_parse() {
        let fragment = aws_fragment().unwrap();
        assert!(fragment
            .shapes
            .iter()
            .any(|s| s.id.to_string() == "aws.api#arn"));
    }
}
