//! Composition options, optionally loaded from a TOML file
//!
//! ```toml
//! field_policy = "keep-first"
//! trace_origins = false
//! ```

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// What to do when a part contributes a field whose name the target already has
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldPolicy {
    /// Copy every field, even if that leaves two fields with one name
    #[default]
    KeepAll,
    /// Keep the field merged first and skip later ones
    KeepFirst,
    /// Fail the composition with `CoreError::DuplicateField`
    Reject,
}

impl FromStr for FieldPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keep-all" => Ok(FieldPolicy::KeepAll),
            "keep-first" => Ok(FieldPolicy::KeepFirst),
            "reject" => Ok(FieldPolicy::Reject),
            other => Err(CoreError::Config(format!(
                "unknown field policy {:?} (expected keep-all, keep-first or reject)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeOptions {
    pub field_policy: FieldPolicy,
    /// Record an `Origin` on every copied member and the part names on the target
    pub trace_origins: bool,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            field_policy: FieldPolicy::KeepAll,
            trace_origins: true,
        }
    }
}

impl ComposeOptions {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| CoreError::Config(format!("Failed to read options: {}", e)))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, CoreError> {
        toml::from_str(content)
            .map_err(|e| CoreError::Config(format!("Failed to parse options: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ComposeOptions::default();
        assert_eq!(options.field_policy, FieldPolicy::KeepAll);
        assert!(options.trace_origins);
        assert_eq!(ComposeOptions::parse("").unwrap(), options);
    }

    #[test]
    fn test_parse_toml() {
        let options = ComposeOptions::parse(
            r#"
            field_policy = "reject"
            trace_origins = false
            "#,
        )
        .unwrap();
        assert_eq!(options.field_policy, FieldPolicy::Reject);
        assert!(!options.trace_origins);
    }

    #[test]
    fn test_parse_rejects_unknown_policy() {
        let err = ComposeOptions::parse(r#"field_policy = "merge""#).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("keep-first".parse::<FieldPolicy>().unwrap(), FieldPolicy::KeepFirst);
        assert!("shadow".parse::<FieldPolicy>().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixer.toml");
        std::fs::write(&path, "field_policy = \"keep-first\"\n").unwrap();

        let options = ComposeOptions::from_file(&path).unwrap();
        assert_eq!(options.field_policy, FieldPolicy::KeepFirst);
        assert!(options.trace_origins);

        assert!(ComposeOptions::from_file(dir.path().join("missing.toml")).is_err());
    }
}
