//! Compilation options and the `typeforge.yaml` project file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use typeforge_spec_parser::Extension;

use crate::error::CompileError;

/// Which schemas become top-level definitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlattenPolicy {
    /// Named, multiply referenced, external and cyclic schemas only.
    #[default]
    Minimal,
    /// Additionally every anonymous object- or enum-shaped schema.
    Full,
}

impl FlattenPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "minimal" => Some(Self::Minimal),
            "full" => Some(Self::Full),
            _ => None,
        }
    }
}

/// What a field with no hint, no `required` and no default becomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NullablePolicy {
    /// Optional scalars and indirections; composite values are defaulted.
    #[default]
    OptionalScalars,
    /// Every such field is optional.
    NullableByDefault,
}

impl NullablePolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "optional-scalars" => Some(Self::OptionalScalars),
            "nullable-by-default" => Some(Self::NullableByDefault),
            _ => None,
        }
    }
}

/// Which extension wins when `x-nullable` and `x-isnullable` disagree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NullablePrecedence {
    #[default]
    #[serde(rename = "x-nullable")]
    XNullable,
    #[serde(rename = "x-isnullable")]
    XIsNullable,
}

impl NullablePrecedence {
    /// Extensions in the order they are consulted.
    pub fn order(self) -> [Extension; 2] {
        match self {
            NullablePrecedence::XNullable => [Extension::Nullable, Extension::IsNullable],
            NullablePrecedence::XIsNullable => [Extension::IsNullable, Extension::Nullable],
        }
    }
}

/// Options for compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct CompileOptions {
    pub flatten: FlattenPolicy,
    pub nullable_policy: NullablePolicy,
    pub nullable_precedence: NullablePrecedence,
    /// Build definitions and operations on the rayon pool.
    pub parallel: bool,
    /// Highest numeric suffix tried before giving up on a name.
    pub max_name_suffix: u32,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            flatten: FlattenPolicy::Minimal,
            nullable_policy: NullablePolicy::OptionalScalars,
            nullable_precedence: NullablePrecedence::XNullable,
            parallel: true,
            max_name_suffix: 1000,
        }
    }
}

impl CompileOptions {
    /// Load options from a `typeforge.yaml` file.
    pub fn load(path: &Path) -> Result<Self, CompileError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CompileError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content, path)
    }

    /// Parse options from YAML content.
    pub fn parse(content: &str, path: &Path) -> Result<Self, CompileError> {
        // An empty file is a valid, all-defaults project file.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| {
            CompileError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    pub fn with_flatten(mut self, flatten: FlattenPolicy) -> Self {
        self.flatten = flatten;
        self
    }

    pub fn with_nullable_policy(mut self, policy: NullablePolicy) -> Self {
        self.nullable_policy = policy;
        self
    }

    pub fn with_nullable_precedence(mut self, precedence: NullablePrecedence) -> Self {
        self.nullable_precedence = precedence;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_full_options_file() {
        let yaml = r#"
flatten: full
nullable-policy: nullable-by-default
nullable-precedence: x-isnullable
parallel: false
max-name-suffix: 5
"#;
        let options = CompileOptions::parse(yaml, Path::new("typeforge.yaml")).unwrap();
        assert_eq!(options.flatten, FlattenPolicy::Full);
        assert_eq!(options.nullable_policy, NullablePolicy::NullableByDefault);
        assert_eq!(options.nullable_precedence, NullablePrecedence::XIsNullable);
        assert!(!options.parallel);
        assert_eq!(options.max_name_suffix, 5);
    }

    #[test]
    fn missing_keys_take_defaults() {
        let options = CompileOptions::parse("flatten: full\n", Path::new("t.yaml")).unwrap();
        assert_eq!(
            options,
            CompileOptions::default().with_flatten(FlattenPolicy::Full)
        );

        let empty = CompileOptions::parse("", Path::new("t.yaml")).unwrap();
        assert_eq!(empty, CompileOptions::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = CompileOptions::parse("flaten: full\n", Path::new("t.yaml")).unwrap_err();
        assert!(matches!(err, CompileError::Config(_)));
        assert_eq!(err.code(), "E2010");
    }

    #[test]
    fn unknown_policy_value_is_rejected() {
        let err = CompileOptions::parse("flatten: maximal\n", Path::new("t.yaml")).unwrap_err();
        assert!(err.to_string().contains("t.yaml"));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "nullable-policy: optional-scalars").unwrap();
        let options = CompileOptions::load(file.path()).unwrap();
        assert_eq!(options.nullable_policy, NullablePolicy::OptionalScalars);

        let err = CompileOptions::load(Path::new("/nonexistent/typeforge.yaml")).unwrap_err();
        assert!(matches!(err, CompileError::Config(_)));
    }

    #[test]
    fn precedence_order() {
        assert_eq!(
            NullablePrecedence::default().order(),
            [Extension::Nullable, Extension::IsNullable]
        );
        assert_eq!(
            NullablePrecedence::XIsNullable.order()[0],
            Extension::IsNullable
        );
    }

    #[test]
    fn policy_parse_is_case_insensitive() {
        assert_eq!(FlattenPolicy::parse("FULL"), Some(FlattenPolicy::Full));
        assert_eq!(
            NullablePolicy::parse("Nullable-By-Default"),
            Some(NullablePolicy::NullableByDefault)
        );
        assert_eq!(NullablePolicy::parse("sometimes"), None);
    }
}
