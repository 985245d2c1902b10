use thiserror::Error;
use typeforge_spec_parser::{DocumentLoadError, ParseError, SourcePointer};

/// Errors produced during compilation.
///
/// Every schema-level error carries the pointer of the fragment that caused
/// it. All of them are fatal to the compilation pass.
#[derive(Debug, Error)]
pub enum CompileError {
    /// E2001: `$ref` target does not exist or cannot be addressed.
    #[error("E2001: unresolvable reference '{reference}' at {location}")]
    UnresolvableReference {
        reference: String,
        location: SourcePointer,
    },

    /// E2002: `allOf` branches cannot be merged.
    #[error("E2002: composition conflict on '{field}' at {location}: {reason}")]
    CompositionConflict {
        field: String,
        location: SourcePointer,
        reason: String,
    },

    /// E2003: Name disambiguation exhausted.
    #[error("E2003: naming collision: no free identifier for '{name}' at {location}")]
    NamingCollision {
        name: String,
        location: SourcePointer,
    },

    /// E2004: A path template placeholder has no path parameter.
    #[error(
        "E2004: operation '{operation}' has no path parameter for placeholder '{{{placeholder}}}' at {location}"
    )]
    UnboundPathParameter {
        operation: String,
        placeholder: String,
        location: SourcePointer,
    },

    /// E2005: A schema shape this compiler does not model.
    #[error("E2005: unsupported construct at {location}: {reason}")]
    UnsupportedConstruct {
        location: SourcePointer,
        reason: String,
    },

    /// E2006: The external type catalog rejected an identifier.
    #[error("E2006: external type '{identifier}' at {location}: {reason}")]
    ExternalType {
        identifier: String,
        location: SourcePointer,
        reason: String,
    },

    /// A document could not be loaded.
    #[error(transparent)]
    DocumentLoad(#[from] DocumentLoadError),

    /// Spec parsing failed.
    #[error(transparent)]
    Parse(ParseError),

    /// E2010: Options file could not be read or parsed.
    #[error("E2010: config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ParseError> for CompileError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Load(load) => CompileError::DocumentLoad(load),
            other => CompileError::Parse(other),
        }
    }
}

impl CompileError {
    /// Stable error code for diagnostics.
    pub fn code(&self) -> &'static str {
        match self {
            CompileError::UnresolvableReference { .. } => "E2001",
            CompileError::CompositionConflict { .. } => "E2002",
            CompileError::NamingCollision { .. } => "E2003",
            CompileError::UnboundPathParameter { .. } => "E2004",
            CompileError::UnsupportedConstruct { .. } => "E2005",
            CompileError::ExternalType { .. } => "E2006",
            CompileError::DocumentLoad(_) => "E1005",
            CompileError::Parse(err) => match err {
                ParseError::UnknownFormat => "E1001",
                ParseError::ParseError(_) => "E1002",
                ParseError::UnresolvedRef(_) => "E1003",
                ParseError::SchemaError(_) => "E1004",
                ParseError::Load(_) => "E1005",
                ParseError::Io(_) => "E1006",
            },
            CompileError::Config(_) => "E2010",
            CompileError::Io(_) => "E2011",
            CompileError::Json(_) => "E2012",
        }
    }

    /// Pointer of the offending schema fragment, if the error has one.
    pub fn location(&self) -> Option<&SourcePointer> {
        match self {
            CompileError::UnresolvableReference { location, .. }
            | CompileError::CompositionConflict { location, .. }
            | CompileError::NamingCollision { location, .. }
            | CompileError::UnboundPathParameter { location, .. }
            | CompileError::UnsupportedConstruct { location, .. }
            | CompileError::ExternalType { location, .. } => Some(location),
            _ => None,
        }
    }

    pub(crate) fn unsupported(location: &SourcePointer, reason: impl Into<String>) -> Self {
        CompileError::UnsupportedConstruct {
            location: location.clone(),
            reason: reason.into(),
        }
    }

    pub(crate) fn conflict(
        field: impl Into<String>,
        location: &SourcePointer,
        reason: impl Into<String>,
    ) -> Self {
        CompileError::CompositionConflict {
            field: field.into(),
            location: location.clone(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_errors_are_lifted_out_of_parse_errors() {
        let err: CompileError =
            ParseError::Load(DocumentLoadError::new("common.yaml", "not found")).into();
        assert!(matches!(err, CompileError::DocumentLoad(_)));
        assert_eq!(err.code(), "E1005");
        assert!(err.to_string().contains("common.yaml"));
    }

    #[test]
    fn unbound_path_parameter_message_shows_braces() {
        let err = CompileError::UnboundPathParameter {
            operation: "getPet".into(),
            placeholder: "petId".into(),
            location: SourcePointer::new("api.yaml", "/paths/~1pets~1{petId}/get"),
        };
        assert_eq!(err.code(), "E2004");
        assert!(err.to_string().contains("'{petId}'"));
        assert_eq!(
            err.location().map(|l| l.to_string()),
            Some("api.yaml#/paths/~1pets~1{petId}/get".to_string())
        );
    }
}
