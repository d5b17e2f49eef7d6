//! Assembler configuration
//!
//! Configuration can be built in code or loaded from YAML or JSON:
//!
//! ```yaml
//! allow_unknown_traits: true
//! suppressions:
//!   - id: HttpBinding
//!     namespace: example.weather
//!     reason: Legacy operations
//! validators:
//!   - name: EmitEachSelector
//!     id: NoDocs
//!     severity: WARNING
//!     configuration:
//!       selector: ":not([trait|documentation])"
//! ```

use crate::error::{ModelError, Result};
use crate::validation::{Suppression, ValidatorDefinition};
use serde::{Deserialize, Serialize};

/// Options controlling how fragments are assembled and validated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblerConfig {
    /// Report traits without a definition as warnings instead of errors
    pub allow_unknown_traits: bool,

    /// Do not add the built-in prelude fragments
    pub disable_prelude: bool,

    /// Skip semantic validators; structural checks always run
    pub disable_validation: bool,

    /// Run independent validators on the rayon thread pool
    pub parallel_validation: bool,

    /// Suppressions applied in addition to those in model metadata
    pub suppressions: Vec<Suppression>,

    /// Selector-based validators applied in addition to those in model metadata
    pub validators: Vec<ValidatorDefinition>,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            allow_unknown_traits: false,
            disable_prelude: false,
            disable_validation: false,
            parallel_validation: true,
            suppressions: Vec::new(),
            validators: Vec::new(),
        }
    }
}

impl AssemblerConfig {
    /// Load configuration from a YAML document
    ///
    /// # Examples
    /// ```
    /// use smithy_semantic_model::AssemblerConfig;
    ///
    /// let config = AssemblerConfig::from_yaml("allow_unknown_traits: true").unwrap();
    /// assert!(config.allow_unknown_traits);
    /// assert!(config.parallel_validation);
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| ModelError::Config(format!("Failed to parse YAML configuration: {e}")))
    }

    /// Load configuration from a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ModelError::Config(format!("Failed to parse JSON configuration: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AssemblerConfig::default();
        assert!(!config.allow_unknown_traits);
        assert!(config.parallel_validation);
        assert!(config.suppressions.is_empty());
    }

    #[test]
    fn test_yaml_with_suppressions_and_validators() {
        let config = AssemblerConfig::from_yaml(
            r#"
disable_validation: true
suppressions:
  - id: HttpBinding
    namespace: example.weather
    reason: Legacy operations
validators:
  - name: EmitEachSelector
    id: NoDocs
    severity: NOTE
    configuration:
      selector: "string"
"#,
        )
        .unwrap();

        assert!(config.disable_validation);
        assert_eq!(config.suppressions.len(), 1);
        assert_eq!(config.suppressions[0].id, "HttpBinding");
        assert_eq!(config.validators[0].name, "EmitEachSelector");
    }

    #[test]
    fn test_json_errors_are_config_errors() {
        let err = AssemblerConfig::from_json("{\"allow_unknown_traits\": 3}").unwrap_err();
        assert!(matches!(err, ModelError::Config(_)));
    }
}
