// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use std::io::Write;

use chrono::{TimeZone, Utc};
use sql_guardrails::policy::{
    DEFAULT_ROW_LIMIT, IdentifierSet, PolicyHistory, PolicyUpdate, SecurityPolicy, load_policy
};
use tempfile::Builder;
use uuid::Uuid;

const CATALOG: &str = "6f1c2a3e-0d4b-4c55-9a51-6f3c1f7e2b10";

fn write_policy(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

#[test]
fn test_load_toml_policy() {
    let file = write_policy(
        ".toml",
        &format!(
            r#"
catalog_id = "{CATALOG}"
default_limit = 100
banned_tables = ["Payroll", "hr.salaries"]
pii_tags = ["email", "*_phone"]
pii_masking_enabled = true

[settings]
owner = "analytics"
"#
        )
    );
    let policy = load_policy(file.path()).unwrap();
    assert_eq!(policy.catalog_id, Uuid::parse_str(CATALOG).unwrap());
    assert_eq!(policy.default_limit, Some(100));
    assert!(policy.banned_tables.contains("payroll"));
    assert!(policy.banned_tables.contains("hr.salaries"));
    assert!(policy.pii_masking_enabled);
    assert_eq!(policy.settings["owner"], "analytics");
    assert!(!policy.allow_write);
    assert!(policy.is_active());
}

#[test]
fn test_load_json_policy() {
    let file = write_policy(
        ".json",
        &format!(
            r#"{{"catalog_id": "{CATALOG}", "allow_write": true, "max_rows_returned": 500,
                "allowed_functions": ["count", "sum"]}}"#
        )
    );
    let policy = load_policy(file.path()).unwrap();
    assert!(policy.allow_write);
    assert_eq!(policy.effective_max_rows(), Some(500));
    assert_eq!(policy.function_whitelist().map(IdentifierSet::len), Some(2));
}

#[test]
fn test_load_yaml_policy() {
    let file = write_policy(
        ".yaml",
        &format!("catalog_id: {CATALOG}\nbanned_columns:\n  - password\n  - users.ssn\n")
    );
    let policy = load_policy(file.path()).unwrap();
    assert_eq!(policy.banned_columns.len(), 2);
    assert_eq!(policy.default_limit, None);
}

#[test]
fn test_policy_requires_catalog_id() {
    let file = write_policy(".toml", "default_limit = 10\n");
    assert!(load_policy(file.path()).is_err());
}

#[test]
fn test_policy_missing_file() {
    assert!(load_policy(std::path::Path::new("/nonexistent/policy.toml")).is_err());
}

#[test]
fn test_new_policy_defaults() {
    let policy = SecurityPolicy::new(Uuid::nil());
    assert!(!policy.allow_write);
    assert_eq!(policy.default_limit, Some(DEFAULT_ROW_LIMIT));
    assert!(!policy.pii_masking_enabled);
    assert!(policy.allowed_functions.is_none());
}

#[test]
fn test_identifier_set_serializes_as_list() {
    let set: IdentifierSet = ["Users", "orders"].into_iter().collect();
    assert_eq!(
        serde_json::to_string(&set).unwrap(),
        r#"["users","orders"]"#
    );
}

#[test]
fn test_history_keeps_one_active_version() {
    let catalog = Uuid::new_v4();
    let actor = Uuid::new_v4();
    let mut history = PolicyHistory::new(catalog);
    assert!(history.active().is_none());

    let t1 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let t2 = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
    history.apply_update(
        PolicyUpdate {
            banned_tables: Some(["payroll"].into_iter().collect()),
            ..Default::default()
        },
        actor,
        t1
    );
    let active = history.apply_update(
        PolicyUpdate {
            default_limit: Some(25),
            ..Default::default()
        },
        actor,
        t2
    );
    assert_eq!(active.default_limit, Some(25));
    assert!(active.banned_tables.contains("payroll"));
    assert_eq!(active.created_at, Some(t2));

    assert_eq!(history.versions().len(), 2);
    assert_eq!(history.versions().iter().filter(|v| v.is_active()).count(), 1);
    let first = &history.versions()[0];
    assert_eq!(first.deleted_at, Some(t2));
    assert_eq!(first.deleted_by, Some(actor));
    assert_eq!(history.snapshot().unwrap().default_limit, Some(25));
}

#[test]
fn test_history_rejects_two_active_versions() {
    let catalog = Uuid::new_v4();
    let versions = vec![SecurityPolicy::new(catalog), SecurityPolicy::new(catalog)];
    assert!(PolicyHistory::from_versions(catalog, versions).is_err());
}

#[test]
fn test_history_rejects_foreign_version() {
    let catalog = Uuid::new_v4();
    let versions = vec![SecurityPolicy::new(Uuid::new_v4())];
    assert!(PolicyHistory::from_versions(catalog, versions).is_err());
}

#[test]
fn test_policy_update_from_json() {
    let update: PolicyUpdate = serde_json::from_str(r#"{"allow_write": true}"#).unwrap();
    assert_eq!(update.allow_write, Some(true));
    assert!(update.banned_tables.is_none());
}
