// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

//! Integration tests for the sql-guardrails binary.

use std::io::Write;

use assert_cmd::{Command, cargo::cargo_bin_cmd};
use predicates::prelude::*;
use tempfile::{Builder, NamedTempFile};

const CATALOG: &str = "0b6f7a52-3c1e-4d3a-9a40-5e2f1c8d9b71";

fn cmd() -> Command {
    let mut cmd = cargo_bin_cmd!("sql-guardrails");
    cmd.env_remove("SQL_GUARDRAILS_POLICY")
        .env_remove("SQL_GUARDRAILS_DIALECT")
        .env_remove("SQL_GUARDRAILS_LOG");
    cmd
}

fn policy_file() -> NamedTempFile {
    let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"catalog_id = "{CATALOG}"
default_limit = 100
banned_tables = ["payroll"]
pii_tags = ["email"]
pii_masking_enabled = true"#
    )
    .unwrap();
    file
}

#[test]
fn test_evaluate_accepted() {
    let policy = policy_file();
    cmd()
        .args([
            "evaluate",
            "-p",
            policy.path().to_str().unwrap(),
            "--sql",
            "SELECT id FROM orders",
            "--no-color"
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("ACCEPTED"))
        .stdout(predicate::str::contains("SELECT id FROM orders LIMIT 100"));
}

#[test]
fn test_evaluate_rejected_exit_code() {
    let policy = policy_file();
    cmd()
        .args([
            "evaluate",
            "-p",
            policy.path().to_str().unwrap(),
            "--sql",
            "SELECT * FROM payroll",
            "--no-color"
        ])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("REJECTED"))
        .stdout(predicate::str::contains("ACCESS001"));
}

#[test]
fn test_evaluate_json_output() {
    let policy = policy_file();
    cmd()
        .args([
            "evaluate",
            "-p",
            policy.path().to_str().unwrap(),
            "--sql",
            "SELECT email FROM users",
            "-f",
            "json"
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"pii_masking_applied\": true"));
}

#[test]
fn test_evaluate_from_stdin() {
    let policy = policy_file();
    cmd()
        .args([
            "evaluate",
            "-p",
            policy.path().to_str().unwrap(),
            "--file",
            "-",
            "--no-color"
        ])
        .write_stdin("DROP TABLE users")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("WRITE001"));
}

#[test]
fn test_evaluate_foreign_catalog_rejected() {
    let policy = policy_file();
    cmd()
        .args([
            "evaluate",
            "-p",
            policy.path().to_str().unwrap(),
            "--sql",
            "SELECT 1",
            "--catalog",
            "00000000-0000-0000-0000-000000000001"
        ])
        .assert()
        .code(2);
}

#[test]
fn test_evaluate_missing_policy() {
    cmd()
        .args([
            "evaluate",
            "-p",
            "/nonexistent/policy.toml",
            "--sql",
            "SELECT 1"
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_evaluate_policy_from_env() {
    let policy = policy_file();
    cmd()
        .env("SQL_GUARDRAILS_POLICY", policy.path())
        .args(["evaluate", "--sql", "SELECT 1", "--no-color"])
        .assert()
        .success();
}

#[test]
fn test_validate_valid() {
    cmd()
        .args(["validate", "--sql", "SELECT a FROM t", "--no-color"])
        .assert()
        .success()
        .stdout(predicate::str::contains("VALID"));
}

#[test]
fn test_validate_invalid() {
    cmd()
        .args(["validate", "--sql", "SELEC a FROM t", "--no-color"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("INVALID"));
}

#[test]
fn test_validate_yaml() {
    cmd()
        .args(["validate", "--sql", "SELECT a FROM t", "-f", "yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("syntax_valid: true"));
}

#[test]
fn test_batch() {
    let policy = policy_file();
    let mut input = NamedTempFile::new().unwrap();
    writeln!(input, r#"{{"sql": "SELECT id FROM orders"}}"#).unwrap();
    writeln!(input, r#"{{"sql": "SELECT * FROM payroll", "dialect": "postgres"}}"#).unwrap();

    cmd()
        .args([
            "batch",
            "-p",
            policy.path().to_str().unwrap(),
            "-i",
            input.path().to_str().unwrap(),
            "--quiet"
        ])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("\"accepted\": 1"))
        .stdout(predicate::str::contains("\"rejected\": 1"));
}

#[test]
fn test_batch_bad_line() {
    let policy = policy_file();
    let mut input = NamedTempFile::new().unwrap();
    writeln!(input, "not json").unwrap();

    cmd()
        .args([
            "batch",
            "-p",
            policy.path().to_str().unwrap(),
            "-i",
            input.path().to_str().unwrap(),
            "--quiet"
        ])
        .assert()
        .code(1);
}

#[test]
fn test_help() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("evaluate"));
}
