//! Engine options.
//!
//! Every field has a default, so an empty document (`{}`) or no
//! configuration at all yields the standard behavior.

use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_MAX_ALIAS_DEPTH: usize = 32;

#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("invalid JSON configuration: {0}")]
    #[diagnostic(code(config::json))]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML configuration: {0}")]
    #[diagnostic(code(config::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("maxAliasDepth must be at least 1")]
    #[diagnostic(code(config::max_alias_depth))]
    ZeroAliasDepth,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct EngineConfig {
    /// Longest alias chain followed before giving up with `DepthExceeded`.
    pub max_alias_depth: usize,
    /// When false, unknown object keys are schema errors instead of warnings.
    pub allow_unknown_fields: bool,
    /// Makes `figmaFileKey` mandatory on platform extensions too.
    pub require_platform_figma_file_key: bool,
    /// Rejects literals that do not look like their standard category,
    /// such as a COLOR given as a bare number.
    pub strict_literal_categories: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_alias_depth: DEFAULT_MAX_ALIAS_DEPTH,
            allow_unknown_fields: true,
            require_platform_figma_file_key: false,
            strict_literal_categories: false,
        }
    }
}

impl EngineConfig {
    /// # Errors
    /// Returns a `ConfigError` if the text is not valid JSON for this shape.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(text)?;
        config.checked()
    }

    /// # Errors
    /// Returns a `ConfigError` if the text is not valid YAML for this shape.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_yaml::from_str(text)?;
        config.checked()
    }

    fn checked(self) -> Result<Self, ConfigError> {
        if self.max_alias_depth == 0 {
            return Err(ConfigError::ZeroAliasDepth);
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(EngineConfig::from_json_str("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_yaml_overrides() {
        let config = EngineConfig::from_yaml_str("maxAliasDepth: 4\nallowUnknownFields: false\n").unwrap();
        assert_eq!(config.max_alias_depth, 4);
        assert!(!config.allow_unknown_fields);
        assert!(!config.require_platform_figma_file_key);
        assert!(!config.strict_literal_categories);
    }

    #[test]
    fn test_rejects_zero_depth_and_unknown_keys() {
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"maxAliasDepth": 0}"#),
            Err(ConfigError::ZeroAliasDepth)
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"maxDepth": 3}"#),
            Err(ConfigError::Json(_))
        ));
    }
}
