//! External type catalog.
//!
//! Schemas tagged with `x-external-type` (or `x-go-type`) are not modeled;
//! the catalog says what kind of value the identifier names, if it knows.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use typeforge_spec_parser::{Extension, Extensions};

/// What the catalog knows about an external type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalShape {
    /// Nothing; treated as a scalar value.
    #[default]
    Opaque,
    Scalar,
    Object,
    Collection,
}

/// Lookup failure reported by a catalog.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct CatalogError(pub String);

/// Collaborator-supplied source of external type shapes.
pub trait TypeCatalog: Send + Sync {
    fn lookup(&self, identifier: &str) -> Result<ExternalShape, CatalogError>;
}

/// Accepts every identifier as opaque.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpaqueCatalog;

impl TypeCatalog for OpaqueCatalog {
    fn lookup(&self, _identifier: &str) -> Result<ExternalShape, CatalogError> {
        Ok(ExternalShape::Opaque)
    }
}

/// A fixed map of identifiers. Unknown identifiers are errors.
#[derive(Debug, Default, Clone)]
pub struct StaticCatalog {
    entries: HashMap<String, ExternalShape>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, identifier: impl Into<String>, shape: ExternalShape) -> Self {
        self.entries.insert(identifier.into(), shape);
        self
    }
}

impl TypeCatalog for StaticCatalog {
    fn lookup(&self, identifier: &str) -> Result<ExternalShape, CatalogError> {
        self.entries
            .get(identifier)
            .copied()
            .ok_or_else(|| CatalogError(format!("'{}' is not in the type catalog", identifier)))
    }
}

/// The external identifier a schema is tagged with, if any.
///
/// `x-external-type` wins over `x-go-type`. Both accept a bare string or
/// `{ type, import: { package } }`, which becomes `package.type`.
pub fn external_hint(extensions: &Extensions) -> Option<String> {
    [Extension::ExternalType, Extension::GoType]
        .into_iter()
        .find_map(|ext| extensions.get(ext).and_then(hint_identifier))
}

fn hint_identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(obj) => {
            let ty = obj.get("type")?.as_str()?;
            let package = obj
                .get("import")
                .and_then(|i| i.get("package"))
                .and_then(Value::as_str);
            Some(match package {
                Some(package) if !package.is_empty() => format!("{}.{}", package, ty),
                _ => ty.to_string(),
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extensions(value: Value) -> Extensions {
        Extensions::from_object(value.as_object().unwrap())
    }

    #[test]
    fn hint_string_and_object_forms() {
        assert_eq!(
            external_hint(&extensions(json!({ "x-external-type": "money.Amount" }))),
            Some("money.Amount".to_string())
        );
        assert_eq!(
            external_hint(&extensions(json!({
                "x-go-type": { "type": "Time", "import": { "package": "time" } }
            }))),
            Some("time.Time".to_string())
        );
        assert_eq!(external_hint(&extensions(json!({ "x-nullable": true }))), None);
    }

    #[test]
    fn external_type_wins_over_go_type() {
        let ext = extensions(json!({ "x-go-type": "a.A", "x-external-type": "b.B" }));
        assert_eq!(external_hint(&ext), Some("b.B".to_string()));
    }

    #[test]
    fn static_catalog_rejects_unknown() {
        let catalog = StaticCatalog::new().with("time.Time", ExternalShape::Scalar);
        assert_eq!(catalog.lookup("time.Time").unwrap(), ExternalShape::Scalar);
        assert!(catalog.lookup("big.Int").is_err());
        assert_eq!(OpaqueCatalog.lookup("big.Int").unwrap(), ExternalShape::Opaque);
    }
}
