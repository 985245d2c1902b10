//! typeforge command line.
//!
//! Compiles Swagger/OpenAPI documents into the typed model and validates
//! them without writing anything.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use typeforge_compiler::{
    compile_file, CompileError, CompileOptions, FlattenPolicy, NullablePolicy,
};
use typeforge_telemetry::{LogFormat, TelemetryConfig};

#[derive(Parser, Debug)]
#[command(name = "typeforge", about = "Schema-driven API model compiler", version)]
struct Cli {
    /// Log level (RUST_LOG takes precedence).
    #[arg(long, global = true, default_value = "info", env = "TYPEFORGE_LOG_LEVEL")]
    log_level: String,

    /// Log format (pretty or json).
    #[arg(long, global = true, default_value = "pretty", value_parser = parse_log_format)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a spec into the model JSON.
    Compile {
        /// Input spec file (YAML or JSON).
        #[arg(short, long)]
        spec: PathBuf,

        /// Project options file (typeforge.yaml).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Flattening policy (minimal or full). Overrides the options file.
        #[arg(long, value_parser = parse_flatten)]
        flatten: Option<FlattenPolicy>,

        /// Nullability policy (optional-scalars or nullable-by-default).
        #[arg(long, value_parser = parse_nullable_policy)]
        nullable_policy: Option<NullablePolicy>,

        /// Output path; stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compile spec(s) and report errors without writing output.
    Validate {
        /// Input spec file(s) (YAML or JSON).
        #[arg(short, long, required = true, num_args = 1..)]
        spec: Vec<PathBuf>,

        /// Project options file (typeforge.yaml).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format (text or json).
        #[arg(long, default_value = "text")]
        format: String,
    },
}

fn parse_log_format(s: &str) -> Result<LogFormat, String> {
    LogFormat::parse(s).ok_or_else(|| format!("unknown log format '{}' (pretty, json)", s))
}

fn parse_flatten(s: &str) -> Result<FlattenPolicy, String> {
    FlattenPolicy::parse(s).ok_or_else(|| format!("unknown flatten policy '{}' (minimal, full)", s))
}

fn parse_nullable_policy(s: &str) -> Result<NullablePolicy, String> {
    NullablePolicy::parse(s).ok_or_else(|| {
        format!(
            "unknown nullable policy '{}' (optional-scalars, nullable-by-default)",
            s
        )
    })
}

/// `<code>: <message>`, without repeating a code the message already leads with.
fn describe(err: &CompileError) -> String {
    let message = err.to_string();
    if message.starts_with(err.code()) {
        message
    } else {
        format!("{}: {}", err.code(), message)
    }
}

fn load_options(config: Option<&Path>) -> Result<CompileOptions, CompileError> {
    match config {
        Some(path) => CompileOptions::load(path),
        None => Ok(CompileOptions::default()),
    }
}

/// Run the compile command.
fn run_compile(
    spec: &Path,
    config: Option<&Path>,
    flatten: Option<FlattenPolicy>,
    nullable_policy: Option<NullablePolicy>,
    output: Option<&Path>,
) -> ExitCode {
    let result = load_options(config).and_then(|mut options| {
        if let Some(flatten) = flatten {
            options = options.with_flatten(flatten);
        }
        if let Some(policy) = nullable_policy {
            options = options.with_nullable_policy(policy);
        }
        tracing::debug!(options = ?options, spec = %spec.display(), "effective compile options");
        let model = compile_file(spec, &options)?;
        let json = serde_json::to_string_pretty(&model)?;
        match output {
            Some(path) => std::fs::write(path, json + "\n")?,
            None => println!("{}", json),
        }
        Ok(model)
    });

    match result {
        Ok(model) => {
            if let Some(path) = output {
                eprintln!(
                    "compiled {} to {} ({} definitions, {} operations)",
                    spec.display(),
                    path.display(),
                    model.definitions().len(),
                    model.operations().len()
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", describe(&e));
            ExitCode::from(1)
        }
    }
}

/// Validation result for a single spec file.
#[derive(Serialize)]
struct ValidationResult {
    file: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ValidationIssue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    definitions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    operations: Option<usize>,
}

#[derive(Serialize)]
struct ValidationIssue {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
}

/// Run the validate command.
fn run_validate(specs: &[PathBuf], config: Option<&Path>, output_format: &str) -> ExitCode {
    let options = match load_options(config) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("error: {}", describe(&e));
            return ExitCode::from(1);
        }
    };

    let results: Vec<ValidationResult> = specs
        .iter()
        .map(|spec| {
            let file = spec.display().to_string();
            match compile_file(spec, &options) {
                Ok(model) => ValidationResult {
                    file,
                    valid: true,
                    error: None,
                    definitions: Some(model.definitions().len()),
                    operations: Some(model.operations().len()),
                },
                Err(e) => ValidationResult {
                    file,
                    valid: false,
                    error: Some(ValidationIssue {
                        code: e.code().to_string(),
                        message: e.to_string(),
                        location: e.location().map(|l| l.to_string()),
                    }),
                    definitions: None,
                    operations: None,
                },
            }
        })
        .collect();
    let invalid = results.iter().filter(|r| !r.valid).count();

    if output_format == "json" {
        let output = serde_json::json!({
            "results": results,
            "summary": {
                "total": results.len(),
                "valid": results.len() - invalid,
                "invalid": invalid,
            }
        });
        match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::from(1);
            }
        }
    } else {
        for result in &results {
            match &result.error {
                None => eprintln!(
                    "✓ {} is valid ({} definitions, {} operations)",
                    result.file,
                    result.definitions.unwrap_or_default(),
                    result.operations.unwrap_or_default()
                ),
                Some(err) => {
                    eprintln!("✗ {}", result.file);
                    if err.message.starts_with(&err.code) {
                        eprintln!("  {}", err.message);
                    } else {
                        eprintln!("  {}: {}", err.code, err.message);
                    }
                }
            }
        }
        eprintln!();
        eprintln!(
            "validated {} spec(s): {} valid, {} invalid",
            results.len(),
            results.len() - invalid,
            invalid
        );
    }

    if invalid > 0 {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let telemetry = TelemetryConfig::new()
        .with_log_level(cli.log_level.as_str())
        .with_log_format(cli.log_format)
        .with_ansi(std::io::stderr().is_terminal());
    if let Err(e) = typeforge_telemetry::init(&telemetry) {
        eprintln!("warning: {}", e);
    }

    match cli.command {
        Commands::Compile {
            spec,
            config,
            flatten,
            nullable_policy,
            output,
        } => run_compile(
            &spec,
            config.as_deref(),
            flatten,
            nullable_policy,
            output.as_deref(),
        ),
        Commands::Validate {
            spec,
            config,
            format,
        } => run_validate(&spec, config.as_deref(), &format),
    }
}
