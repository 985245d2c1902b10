//! Swagger 2.0 and OpenAPI 3.x schema document layer.
//!
//! Loads documents (local files, HTTP, memory), decodes YAML/JSON, parses
//! schema fragments into [`SchemaNode`] trees and extracts the operations of
//! `paths`. Reference resolution itself happens in the compiler; this crate
//! only knows how to address fragments through JSON pointers.

pub mod error;
pub mod loader;
pub mod model;
pub mod parser;
pub mod pointer;
pub mod schema;

pub use error::{DocumentLoadError, ParseError};
pub use loader::{
    DefaultLoader, DocumentLoader, DocumentSet, FsLoader, HttpLoader, MemoryLoader,
    SchemaDocument,
};
pub use model::{
    ApiSpec, DefinitionSource, ParamLocation, RawHeader, RawOperation, RawParameter,
    RawRequestBody, RawResponse, SpecFormat,
};
pub use parser::{parse_document, parse_spec, parse_spec_file};
pub use pointer::{parse_reference, SourcePointer};
pub use schema::{
    AdditionalProperties, ArrayItems, Composition, Constraints, Discriminator, Extension,
    Extensions, ObjectSchema, PrimitiveType, SchemaKind, SchemaMeta, SchemaNode,
};
