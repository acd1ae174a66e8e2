// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use std::io;

use sql_guardrails::error::{
    batch_entry_error, config_error, file_read_error, masking_error, policy_parse_error,
    query_parse_error, rewrite_error
};

#[test]
fn test_file_read_error() {
    let error = file_read_error("policy.toml", io::Error::new(io::ErrorKind::NotFound, "missing"));
    assert!(!error.to_string().is_empty());
}

#[test]
fn test_query_parse_error() {
    let error = query_parse_error("Expected end of statement at Line: 1, Column: 8");
    assert!(!error.to_string().is_empty());
}

#[test]
fn test_policy_parse_error() {
    let error = policy_parse_error("policy.yaml", "missing field `catalog_id`");
    assert!(!error.to_string().is_empty());
}

#[test]
fn test_masking_error() {
    let error = masking_error("cannot build expression");
    assert!(!error.to_string().is_empty());
}

#[test]
fn test_rewrite_error() {
    let error = rewrite_error("cannot wrap `LIMIT BY` query");
    assert!(!error.to_string().is_empty());
}

#[test]
fn test_config_error() {
    let error = config_error("Unknown SQL dialect 'oracle'");
    assert!(!error.to_string().is_empty());
}

#[test]
fn test_batch_entry_error() {
    let error = batch_entry_error(3, "expected value");
    assert!(!error.to_string().is_empty());
}
