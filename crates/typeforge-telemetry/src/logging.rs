//! Structured logging to stderr.
//!
//! stdout is reserved for compiler output (the model JSON), so every layer
//! writes to stderr.

use crate::{LogFormat, TelemetryConfig, TelemetryError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the logging subsystem.
///
/// Sets up tracing-subscriber with either JSON or pretty format,
/// respecting the configured log level.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    // Build the env filter from config or RUST_LOG
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => init_json_logging(filter),
        LogFormat::Pretty => init_pretty_logging(filter, config.ansi),
    }
}

fn init_json_logging(filter: EnvFilter) -> Result<(), TelemetryError> {
    let json_layer = fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_current_span(false)
        .with_span_list(false)
        .with_file(false)
        .with_line_number(false)
        .flatten_event(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(json_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

fn init_pretty_logging(filter: EnvFilter, ansi: bool) -> Result<(), TelemetryError> {
    let pretty_layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .with_target(false)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(pretty_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

/// Standard log event names emitted by the compiler pipeline.
pub mod events {
    /// A compilation pass has started.
    pub const COMPILE_STARTED: &str = "compile_started";

    /// All documents reachable from the root have been loaded.
    pub const DOCUMENTS_LOADED: &str = "documents_loaded";

    /// Reference resolution finished.
    pub const REFERENCES_RESOLVED: &str = "references_resolved";

    /// The definition set has been flattened and named.
    pub const SCHEMAS_FLATTENED: &str = "schemas_flattened";

    /// Type models have been built for every definition.
    pub const TYPES_BUILT: &str = "types_built";

    /// Operations have been bound.
    pub const OPERATIONS_BOUND: &str = "operations_bound";

    /// A compilation pass finished successfully.
    pub const COMPILE_FINISHED: &str = "compile_finished";

    /// A compilation pass failed.
    pub const COMPILE_FAILED: &str = "compile_failed";

    /// A schema was promoted to a definition.
    pub const DEFINITION_PROMOTED: &str = "definition_promoted";

    /// An alias chain was collapsed to its final target.
    pub const ALIAS_COLLAPSED: &str = "alias_collapsed";

    /// A polymorphic family was registered.
    pub const POLYMORPHIC_FAMILY: &str = "polymorphic_family";

    /// A discriminator mapping points at something that is not a definition.
    pub const DISCRIMINATOR_TARGET_SKIPPED: &str = "discriminator_target_skipped";

    /// A declared path parameter does not appear in the path template.
    pub const PATH_PARAMETER_UNUSED: &str = "path_parameter_unused";
}

/// Helper macros for structured logging with standard fields.
///
/// These wrap the tracing macros to ensure consistent field naming.
#[macro_export]
macro_rules! log_compile_started {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::COMPILE_STARTED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_compile_finished {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::COMPILE_FINISHED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_compile_failed {
    ($($field:tt)*) => {
        tracing::error!(
            event = $crate::logging::events::COMPILE_FAILED,
            $($field)*
        )
    };
}

/// Stage completion: `log_stage!(TYPES_BUILT, definitions = n, "...")`.
#[macro_export]
macro_rules! log_stage {
    ($event:ident, $($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::$event,
            $($field)*
        )
    };
}

/// Per-definition decision at debug level.
#[macro_export]
macro_rules! log_decision {
    ($event:ident, $($field:tt)*) => {
        tracing::debug!(
            event = $crate::logging::events::$event,
            $($field)*
        )
    };
}

/// Tolerated oddity in the input.
#[macro_export]
macro_rules! log_tolerated {
    ($event:ident, $($field:tt)*) => {
        tracing::warn!(
            event = $crate::logging::events::$event,
            $($field)*
        )
    };
}
