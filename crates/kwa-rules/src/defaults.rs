use crate::config::{ConfigError, DocumentFormat};
use crate::rules::Rules;

/// Built-in rule document for the Squiz Matrix server-side JS boilerplate.
pub const DEFAULT_RULES_YAML: &str = include_str!("../../../config/rules.yaml");

pub fn default_rules() -> Result<Rules, ConfigError> {
    Rules::from_text(DEFAULT_RULES_YAML, DocumentFormat::Yaml)
}
