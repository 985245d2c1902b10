//! Compiles Swagger 2.0 / OpenAPI 3.x documents into a typed model.
//!
//! Resolves `$ref` graphs across documents, flattens schemas into named
//! definitions, builds the type IR with nullability decisions, and binds
//! every operation's inputs and outputs. The result is an immutable
//! [`CompiledModel`] for code emitters.

pub mod binder;
pub mod builder;
pub mod catalog;
mod compose;
pub mod error;
pub mod flatten;
pub mod formats;
pub mod model;
pub mod naming;
pub mod nullability;
pub mod options;
mod pipeline;
pub mod resolver;

pub(crate) use pipeline::map_ordered;

pub use catalog::{ExternalShape, OpaqueCatalog, StaticCatalog, TypeCatalog};
pub use error::CompileError;
pub use formats::PrimitiveKind;
pub use model::{
    CompiledModel, Definition, DefinitionId, Field, Nullability, Operation, ParamSource,
    Parameter, Response, ResponseHeader, StatusCode, TypeModel,
};
pub use nullability::ValueShape;
pub use options::{CompileOptions, FlattenPolicy, NullablePolicy, NullablePrecedence};
pub use pipeline::{compile, compile_file, compile_str};
// Re-export document types callers need to build a `DocumentSet`.
pub use typeforge_spec_parser::{
    DefaultLoader, DocumentLoader, DocumentSet, MemoryLoader, SpecFormat,
};
