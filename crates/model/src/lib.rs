//! Semantic model assembly and validation for Smithy
//!
//! This crate combines independently loaded model fragments into one frozen
//! [`Model`]: shapes are merged, trait conflicts resolved, mixins applied and
//! elided members given their targets. The result is checked by structural
//! validators (unresolved targets, trait selectors and values) and by
//! semantic validators (resource bindings, HTTP bindings, ARN templates and
//! more). Derived views of the model live in [`knowledge`] and are computed
//! on first use.
//!
//! ```
//! use smithy_semantic_model::ModelAssembler;
//!
//! let mut assembler = ModelAssembler::new();
//! assembler
//!     .add_json(
//!         r#"{
//!             "smithy": "2.0",
//!             "shapes": {
//!                 "example.weather#GetCityInput": {
//!                     "type": "structure",
//!                     "members": { "cityId": { "target": "smithy.api#String" } }
//!                 }
//!             }
//!         }"#,
//!         "weather.json",
//!     )
//!     .unwrap();
//!
//! let validated = assembler.assemble().unwrap();
//! let city_id = "example.weather#GetCityInput$cityId".parse().unwrap();
//! assert!(validated.model().contains_shape(&city_id));
//! ```

mod assembler;
mod config;
mod error;
pub mod knowledge;
pub mod selector;
pub mod shapes;
pub mod traits;
pub mod validation;

pub use assembler::ModelAssembler;
pub use config::AssemblerConfig;
pub use error::{ModelError, Result};
pub use selector::{Selector, SelectorSyntaxError};
pub use shapes::{Model, Shape, Trait};
pub use validation::{Suppression, ValidatedModel, Validator, ValidatorDefinition};

pub use smithy_semantic_common::{
    Fragment, Node, Severity, ShapeId, ShapeType, SourceLocation, ValidationEvent,
};
