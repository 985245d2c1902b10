use thiserror::Error;

/// Errors produced while decoding and parsing schema documents (E1001–E1005).
#[derive(Debug, Error)]
pub enum ParseError {
    /// E1001: Document is neither Swagger 2.0 nor OpenAPI 3.x.
    #[error("E1001: not a Swagger 2.0 or OpenAPI 3.x document")]
    UnknownFormat,

    /// E1002: YAML/JSON decoding error.
    #[error("E1002: parse error: {0}")]
    ParseError(String),

    /// E1003: Unresolved local `$ref` to a parameter, response or request body.
    #[error("E1003: unresolved $ref: {0}")]
    UnresolvedRef(String),

    /// E1004: Structurally malformed document part.
    #[error("E1004: schema error: {0}")]
    SchemaError(String),

    /// E1005: A document could not be loaded.
    #[error(transparent)]
    Load(#[from] DocumentLoadError),

    /// I/O error reading a document.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// E1005: A schema document could not be fetched from its URI.
#[derive(Debug, Error)]
#[error("E1005: failed to load document '{uri}': {reason}")]
pub struct DocumentLoadError {
    /// The URI that failed to load.
    pub uri: String,
    /// Human-readable cause (I/O error, HTTP status, ...).
    pub reason: String,
}

impl DocumentLoadError {
    pub fn new(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            reason: reason.into(),
        }
    }
}
