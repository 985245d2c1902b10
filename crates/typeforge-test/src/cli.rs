//! CLI regression tests for the `typeforge` binary.
//!
//! These tests invoke the binary as a subprocess to catch regressions in flag
//! names, exit codes, and output formats — things the Rust API tests can't catch.
//!
//! Run with: `cargo test -p typeforge-test`
//! Requires the `typeforge` binary to be built first (`cargo build -p typeforge`).

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

use crate::fixtures_dir as fixtures;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Returns an assert_cmd Command wrapping the `typeforge` binary.
fn typeforge() -> Command {
    // cargo_bin is deprecated for custom build-dir setups; fine for standard workspace use.
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("typeforge")
        .expect("typeforge binary not found — run `cargo build -p typeforge` first");
    cmd.env_remove("RUST_LOG").args(["--log-level", "warn"]);
    cmd
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    let s = String::from_utf8(output.stdout.clone()).expect("stdout should be valid UTF-8");
    serde_json::from_str(&s).expect("stdout should be valid JSON")
}

// ---------------------------------------------------------------------------
// typeforge validate
// ---------------------------------------------------------------------------

#[test]
fn validate_valid_spec_exits_zero() {
    typeforge()
        .args(["validate", "--spec"])
        .arg(fixtures().join("petstore.yaml"))
        .assert()
        .success()
        .stderr(contains("is valid"));
}

#[test]
fn validate_invalid_spec_exits_one() {
    typeforge()
        .args(["validate", "--spec"])
        .arg(fixtures().join("invalid-parse-error.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E1002"));
}

#[test]
fn validate_missing_file_exits_one() {
    typeforge()
        .args(["validate", "--spec", "this-file-does-not-exist.yaml"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E1005"));
}

#[test]
fn validate_reports_every_file() {
    typeforge()
        .args(["validate", "--spec"])
        .arg(fixtures().join("petstore.yaml"))
        .arg("--spec")
        .arg(fixtures().join("invalid-conflict.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E2002"))
        .stderr(contains("1 valid, 1 invalid"));
}

#[test]
fn validate_json_format_outputs_valid_json() {
    let assert = typeforge()
        .args(["validate", "--spec"])
        .arg(fixtures().join("polymorphic.yaml"))
        .args(["--format", "json"])
        .assert()
        .success();

    let v = stdout_json(assert.get_output());
    assert!(
        v.get("results").is_some(),
        "JSON output missing 'results' key"
    );
    assert_eq!(v["summary"]["valid"], 1);
}

#[test]
fn validate_json_format_invalid_spec_exits_one_with_json() {
    let assert = typeforge()
        .args(["validate", "--spec"])
        .arg(fixtures().join("invalid-unbound-path.yaml"))
        .args(["--format", "json"])
        .assert()
        .failure()
        .code(1);

    let v = stdout_json(assert.get_output());
    let results = v["results"].as_array().expect("results should be an array");
    assert_eq!(results[0]["valid"], false);
    assert_eq!(results[0]["error"]["code"], "E2004");
    assert!(results[0]["error"]["location"]
        .as_str()
        .is_some_and(|l| l.ends_with("#/paths/~1pets~1{petId}/get")));
}

// ---------------------------------------------------------------------------
// typeforge compile
// ---------------------------------------------------------------------------

#[test]
fn compile_writes_model_to_stdout() {
    let assert = typeforge()
        .args(["compile", "--spec"])
        .arg(fixtures().join("petstore.yaml"))
        .assert()
        .success();

    let v = stdout_json(assert.get_output());
    assert_eq!(v["title"], "Swagger Petstore");
    assert_eq!(v["format"], "swagger2");
    assert_eq!(v["types"]["Pet"]["kind"], "object");
    let ops = v["operations"].as_array().expect("operations array");
    assert_eq!(ops.len(), 4);
}

#[test]
fn compile_writes_output_file() {
    let tmp = TempDir::new().expect("temp dir");
    let out = tmp.path().join("model.json");

    typeforge()
        .args(["compile", "--spec"])
        .arg(fixtures().join("cycles.yaml"))
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stderr(contains("3 definitions"));

    let written = std::fs::read_to_string(&out).expect("read model");
    let v: serde_json::Value = serde_json::from_str(&written).expect("model JSON");
    assert_eq!(
        v["types"]["TreeNode"]["fields"][1]["type"]["element"]["kind"],
        "cycle_ref"
    );
}

#[test]
fn compile_flags_override_config_file() {
    let assert = typeforge()
        .args(["compile", "--spec"])
        .arg(fixtures().join("petstore.yaml"))
        .arg("--config")
        .arg(fixtures().join("typeforge.yaml"))
        .args(["--flatten", "minimal"])
        .assert()
        .success();
    let v = stdout_json(assert.get_output());
    assert!(v["types"].get("NewPetStatus").is_none());

    let assert = typeforge()
        .args(["compile", "--spec"])
        .arg(fixtures().join("petstore.yaml"))
        .arg("--config")
        .arg(fixtures().join("typeforge.yaml"))
        .assert()
        .success();
    let v = stdout_json(assert.get_output());
    assert_eq!(v["types"]["NewPetStatus"]["kind"], "enum");
}

#[test]
fn compile_unbound_path_reports_code_and_pointer() {
    typeforge()
        .args(["compile", "--spec"])
        .arg(fixtures().join("invalid-unbound-path.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("error: E2004"))
        .stderr(contains("#/paths/~1pets~1{petId}/get"));
}

#[test]
fn compile_nonexistent_spec_exits_one() {
    typeforge()
        .args(["compile", "--spec", "nonexistent.yaml"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E1005"));
}

#[test]
fn compile_bad_config_exits_one() {
    let tmp = TempDir::new().expect("temp dir");
    let config = tmp.path().join("typeforge.yaml");
    std::fs::write(&config, "flatten: sideways\n").expect("write config");

    typeforge()
        .args(["compile", "--spec"])
        .arg(fixtures().join("petstore.yaml"))
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E2010"));
}

#[test]
fn compile_unknown_policy_exits_two() {
    // clap rejects the value before anything runs
    typeforge()
        .args(["compile", "--spec"])
        .arg(fixtures().join("petstore.yaml"))
        .args(["--nullable-policy", "sometimes"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn compile_missing_spec_flag_exits_two() {
    typeforge().args(["compile"]).assert().failure().code(2);
}
