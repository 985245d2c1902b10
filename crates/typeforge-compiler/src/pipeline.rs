//! Compilation entry points.
//!
//! One pass: parse, resolve, flatten, build types, bind operations. The
//! first error aborts the pass.

use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use typeforge_spec_parser::{parse_document, DefaultLoader, DocumentSet, SchemaDocument};
use typeforge_telemetry::{log_compile_failed, log_compile_finished, log_compile_started, log_stage};

use crate::binder::Binder;
use crate::builder::TypeBuilder;
use crate::catalog::{OpaqueCatalog, TypeCatalog};
use crate::error::CompileError;
use crate::flatten::Flattener;
use crate::model::CompiledModel;
use crate::options::CompileOptions;
use crate::resolver::Resolver;

/// Compile an already loaded document set.
pub fn compile(
    documents: &DocumentSet,
    options: &CompileOptions,
    catalog: &dyn TypeCatalog,
) -> Result<CompiledModel, CompileError> {
    log_compile_started!(
        document = %documents.root_uri(),
        flatten = ?options.flatten,
        "compiling"
    );
    let started = Instant::now();

    let result = compile_inner(documents, options, catalog);
    match &result {
        Ok(model) => log_compile_finished!(
            definitions = model.definitions().len(),
            operations = model.operations().len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "compilation finished"
        ),
        Err(err) => log_compile_failed!(
            code = err.code(),
            error = %err,
            "compilation failed"
        ),
    }
    result
}

/// Compile a document given as text. External references are fetched
/// relative to `uri`.
pub fn compile_str(
    uri: &str,
    text: &str,
    options: &CompileOptions,
) -> Result<CompiledModel, CompileError> {
    let root = SchemaDocument::decode(uri, text)?;
    let documents = DocumentSet::load_with_root(root, &DefaultLoader::default())?;
    compile(&documents, options, &OpaqueCatalog)
}

/// Compile a document on disk, with every external type opaque.
pub fn compile_file(path: &Path, options: &CompileOptions) -> Result<CompiledModel, CompileError> {
    let documents = DocumentSet::load(&path.to_string_lossy(), &DefaultLoader::default())?;
    compile(&documents, options, &OpaqueCatalog)
}

fn compile_inner(
    documents: &DocumentSet,
    options: &CompileOptions,
    catalog: &dyn TypeCatalog,
) -> Result<CompiledModel, CompileError> {
    log_stage!(DOCUMENTS_LOADED, documents = documents.len(), "documents loaded");
    let spec = parse_document(documents.root())?;

    let resolved = Resolver::new(documents).resolve(&spec)?;
    log_stage!(
        REFERENCES_RESOLVED,
        identities = resolved.identities.len(),
        cycles = resolved.cycle_targets.len(),
        "references resolved"
    );

    let flat = Flattener::new(&spec, &resolved, options).flatten()?;
    log_stage!(
        SCHEMAS_FLATTENED,
        definitions = flat.definitions.len(),
        aliases = flat.alias_count(),
        "schemas flattened"
    );

    let builder = TypeBuilder::new(&flat, options, catalog);
    let (definitions, types) = builder.build_definitions()?;
    log_stage!(TYPES_BUILT, types = types.len(), "types built");

    let binder = Binder::new(&spec, &builder);
    let operations = map_ordered(options.parallel, &flat.operations, |op| binder.bind(op))?;
    log_stage!(OPERATIONS_BOUND, operations = operations.len(), "operations bound");

    Ok(CompiledModel::new(
        spec.title.clone(),
        spec.api_version.clone(),
        spec.format,
        definitions,
        types,
        operations,
    ))
}

/// Map `f` over `items`, on the rayon pool when `parallel` is set.
///
/// Results keep input order and the first failing item in input order
/// decides the error, whatever the scheduling.
pub(crate) fn map_ordered<T, U, F>(parallel: bool, items: &[T], f: F) -> Result<Vec<U>, CompileError>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> Result<U, CompileError> + Sync + Send,
{
    if parallel && items.len() > 1 {
        let results: Vec<Result<U, CompileError>> = items.par_iter().map(&f).collect();
        results.into_iter().collect()
    } else {
        items.iter().map(f).collect()
    }
}
