//! Shared test utilities for integration tests
//!
//! Provides the binary command builder and JSON helpers used by
//! every integration test file.

#![allow(dead_code)]

use assert_cmd::prelude::*;
use assert_fs::TempDir;
use serde_json::Value;
use std::process::Command;

/// Binary under test, run from `dir` with no JDLINT_* overrides.
pub fn jdlint(dir: &TempDir) -> Command
{
    let mut cmd = Command::cargo_bin("jdlint").expect("jdlint binary");

    // Keep the caller's environment from leaking into the run
    cmd.current_dir(dir.path())
        .env_remove("JDLINT_IGNORE_PATTERNS")
        .env_remove("JDLINT_DISABLE")
        .env_remove("JDLINT_ALTZEROS")
        .env_remove("JDLINT_JDEX")
        .env_remove("RUST_LOG");
    cmd
}

/// Rule ids of a `--json` report, in output order.
pub fn json_rules(stdout: &[u8]) -> Vec<String>
{
    let value: Value = serde_json::from_slice(stdout).expect("valid json");
    value
        .as_array()
        .expect("array")
        .iter()
        .map(|d| {
            d["rule"]
                .as_str()
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}
