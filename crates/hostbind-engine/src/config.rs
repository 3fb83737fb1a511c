//! Runtime configuration

use std::path::Path;

use serde::Deserialize;

use crate::error::{BindError, BindResult};

/// What a binder does when one member cannot be bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Report the member and skip it
    #[default]
    BestEffort,
    /// Abort the whole class bind
    Strict,
}

/// Engine configuration, usually read from `hostbind.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BindingConfig {
    /// Default policy for every bind
    pub failure_policy: FailurePolicy,
    /// Enum whose values the host treats as error codes
    pub failure_enum: String,
    /// Instances are created as placeholders unless the script is a tool
    pub editor_hint: bool,
    /// Words appended to the reserved-word list for argument names
    pub extra_reserved_words: Vec<String>,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::BestEffort,
            failure_enum: "Error".to_string(),
            editor_hint: false,
            extra_reserved_words: Vec::new(),
        }
    }
}

impl BindingConfig {
    /// Parse TOML text.
    pub fn from_toml(text: &str) -> BindResult<Self> {
        toml::from_str(text).map_err(|e| BindError::Config(e.to_string()))
    }

    /// Read a TOML file.
    pub fn load(path: impl AsRef<Path>) -> BindResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| BindError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&text)
    }

    /// Builder-style policy override.
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_editor_hint(mut self, editor_hint: bool) -> Self {
        self.editor_hint = editor_hint;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BindingConfig::from_toml("").unwrap();
        assert_eq!(config, BindingConfig::default());
        assert_eq!(config.failure_enum, "Error");
    }

    #[test]
    fn test_parse_policy() {
        let config = BindingConfig::from_toml(
            "failure_policy = \"strict\"\nextra_reserved_words = [\"match\"]\n",
        )
        .unwrap();
        assert_eq!(config.failure_policy, FailurePolicy::Strict);
        assert_eq!(config.extra_reserved_words, vec!["match"]);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(BindingConfig::from_toml("nope = 1").is_err());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hostbind.toml");
        std::fs::write(&path, "editor_hint = true\n").unwrap();
        assert!(BindingConfig::load(&path).unwrap().editor_hint);
        assert!(BindingConfig::load(dir.path().join("missing.toml")).is_err());
    }
}
