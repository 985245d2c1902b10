//! Fixture and CLI regression tests for typeforge.
//!
//! `fixtures` compiles the shared documents under `tests/fixtures` through
//! the library API; `cli` runs the `typeforge` binary against the same files.

use std::path::PathBuf;

#[cfg(test)]
pub mod cli;
#[cfg(test)]
pub mod fixtures;

/// Absolute path to the shared test fixtures directory.
pub fn fixtures_dir() -> PathBuf {
    // CARGO_MANIFEST_DIR = .../crates/typeforge-test
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("crates/")
        .parent()
        .expect("workspace root")
        .join("tests/fixtures")
}
