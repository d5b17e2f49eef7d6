//! Smithy JSON AST reading and writing
//!
//! ## Format
//! A JSON AST document contains:
//! - `smithy`: the IDL version
//! - `metadata`: free-form key/value pairs
//! - `shapes`: shape definitions and `apply` entries keyed by absolute shape ID
//!
//! Two extensions let a document carry everything a fragment can hold: a
//! member without `target` is elided, and `for` on a structure names the
//! resource that elided members resolve against.
//!
//! ## Usage
//! ```rust,ignore
//! use smithy_semantic_parser::{AstParser, FragmentWriter};
//!
//! let fragment = AstParser::from_json(&json, "weather.json")?.parse()?;
//! let json = FragmentWriter::new(&fragment).to_json()?;
//! ```

mod converter;
mod parser;
mod types;
mod writer;

pub use converter::convert_ast_to_fragment;
pub use parser::AstParser;
pub use types::*;
pub use writer::{FragmentWriter, SMITHY_VERSION};
