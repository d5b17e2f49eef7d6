//! JSON AST document parser

use super::types::AstModel;
use smithy_semantic_common::{Fragment, Result, SemanticError};

/// Smithy JSON AST parser
///
/// Holds one parsed document and converts it into a [`Fragment`] for the
/// assembler. Reading files is left to the caller.
pub struct AstParser {
    /// Parsed document
    model: AstModel,

    /// Name used for source locations, usually the file name
    name: String,
}

impl AstParser {
    /// Parse a JSON AST document
    ///
    /// # Examples
    /// ```
    /// use smithy_semantic_parser::AstParser;
    ///
    /// let json = r#"{
    ///     "smithy": "2.0",
    ///     "shapes": { "example.weather#CityId": { "type": "string" } }
    /// }"#;
    /// let fragment = AstParser::from_json(json, "weather.json").unwrap().parse().unwrap();
    /// assert_eq!(fragment.shapes.len(), 1);
    /// ```
    pub fn from_json(json: &str, name: &str) -> Result<Self> {
        let model: AstModel = serde_json::from_str(json).map_err(|e| {
            SemanticError::Parse(format!("Failed to parse Smithy JSON AST {name}: {e}"))
        })?;

        if !model.smithy.starts_with('1') && !model.smithy.starts_with('2') {
            return Err(SemanticError::Parse(format!(
                "Unsupported Smithy version `{}` in {name}",
                model.smithy
            )));
        }

        Ok(Self {
            model,
            name: name.to_string(),
        })
    }

    /// Convert the document into an unresolved fragment
    pub fn parse(&self) -> Result<Fragment> {
        super::converter::convert_ast_to_fragment(&self.model, &self.name)
    }

    /// Get reference to the underlying document
    pub fn model(&self) -> &AstModel {
        &self.model
    }
}
