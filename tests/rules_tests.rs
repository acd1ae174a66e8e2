// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use sql_guardrails::{
    policy::{PolicyMatcher, SecurityPolicy},
    query::{ParsedCandidate, SqlDialect, StatementKind, lower_statement, parse_candidate},
    resolve::{Resolution, TableRef, resolve},
    rules::{RuleContext, RuleRunner, Violation, ViolationKind}
};
use uuid::Uuid;

fn resolution(sql: &str, dialect: SqlDialect) -> Resolution {
    match parse_candidate(sql, dialect).unwrap() {
        ParsedCandidate::Single(statement) => resolve(&lower_statement(&statement), dialect),
        other => panic!("expected one statement, got {:?}", other)
    }
}

fn check(policy: &SecurityPolicy, resolution: &Resolution, dialect: SqlDialect) -> Vec<Violation> {
    let matcher = PolicyMatcher::new(policy, dialect.case_folding()).unwrap();
    RuleRunner::new().evaluate(&RuleContext {
        resolution,
        policy: &matcher
    })
}

fn run(policy: &SecurityPolicy, sql: &str) -> Vec<Violation> {
    check(policy, &resolution(sql, SqlDialect::Generic), SqlDialect::Generic)
}

fn policy() -> SecurityPolicy {
    SecurityPolicy::new(Uuid::nil())
}

#[test]
fn test_rule_order() {
    let ids: Vec<_> = RuleRunner::new().rules().iter().map(|r| r.id).collect();
    assert_eq!(
        ids,
        vec!["WRITE001", "ACCESS001", "ACCESS002", "FUNC001", "PARSE001"]
    );
}

#[test]
fn test_clean_select_has_no_violations() {
    assert!(run(&policy(), "SELECT id FROM orders WHERE total > 10").is_empty());
}

#[test]
fn test_write_gate_short_circuits() {
    let mut p = policy();
    p.banned_tables = ["users"].into_iter().collect();
    let violations = run(&p, "DELETE FROM users");
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].rule_id, "WRITE001");
    assert_eq!(violations[0].target.as_deref(), Some("DELETE"));
}

#[test]
fn test_write_allowed_runs_other_rules() {
    let mut p = policy();
    p.allow_write = true;
    p.banned_tables = ["users"].into_iter().collect();
    let violations = run(&p, "DELETE FROM users");
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, ViolationKind::BannedTable);
}

#[test]
fn test_bare_banned_table_matches_any_schema() {
    let mut p = policy();
    p.banned_tables = ["api_keys"].into_iter().collect();
    let violations = run(&p, "SELECT * FROM secrets.api_keys");
    assert_eq!(violations[0].target.as_deref(), Some("secrets.api_keys"));
}

#[test]
fn test_qualified_banned_table_schema_must_agree() {
    let mut p = policy();
    p.banned_tables = ["secrets.api_keys"].into_iter().collect();
    assert!(run(&p, "SELECT id FROM public.api_keys").is_empty());
    assert_eq!(run(&p, "SELECT id FROM api_keys").len(), 1);
    assert_eq!(run(&p, "SELECT id FROM secrets.api_keys").len(), 1);
}

#[test]
fn test_banned_schema() {
    let mut p = policy();
    p.banned_schemas = ["internal"].into_iter().collect();
    let violations = run(&p, "SELECT * FROM internal.flags");
    assert_eq!(violations[0].kind, ViolationKind::BannedSchema);
    assert_eq!(violations[0].target.as_deref(), Some("internal"));
}

#[test]
fn test_banned_column_bound_and_bare() {
    let mut p = policy();
    p.banned_columns = ["users.ssn", "password"].into_iter().collect();
    let violations = run(
        &p,
        "SELECT u.ssn, a.password FROM users u JOIN accounts a ON u.id = a.uid"
    );
    let targets: Vec<_> = violations.iter().filter_map(|v| v.target.clone()).collect();
    assert_eq!(targets, vec!["users.ssn", "password"]);
}

#[test]
fn test_unbound_column_matches_qualified_entry() {
    let mut p = policy();
    p.banned_columns = ["users.ssn"].into_iter().collect();
    let violations = run(&p, "SELECT ssn FROM users JOIN orders ON TRUE");
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, ViolationKind::BannedColumn);
}

#[test]
fn test_function_blacklist_matches_last_segment() {
    let mut p = policy();
    p.blocked_functions = ["pg_sleep"].into_iter().collect();
    let violations = run(&p, "SELECT pg_catalog.pg_sleep(5)");
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].target.as_deref(), Some("PG_CATALOG.PG_SLEEP"));
}

#[test]
fn test_function_whitelist() {
    let mut p = policy();
    p.allowed_functions = Some(["count", "lower"].into_iter().collect());
    assert!(run(&p, "SELECT COUNT(*), lower(name) FROM users").is_empty());
    let violations = run(&p, "SELECT upper(name) FROM users");
    assert_eq!(violations[0].rule_id, "FUNC001");
}

#[test]
fn test_unanalyzable_construct() {
    let violations = run(&policy(), "SHOW TABLES");
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, ViolationKind::UnanalyzableConstruct);
}

#[test]
fn test_duplicate_references_reported_once() {
    let mut p = policy();
    p.banned_tables = ["payroll"].into_iter().collect();
    let violations = run(
        &p,
        "SELECT * FROM payroll WHERE id IN (SELECT id FROM payroll)"
    );
    assert_eq!(violations.len(), 1);
}

#[test]
fn test_hand_built_resolution() {
    let mut p = policy();
    p.banned_tables = ["audit"].into_iter().collect();
    let mut r = Resolution {
        statement_kind: StatementKind::Select,
        tables:         Default::default(),
        columns:        Default::default(),
        functions:      Default::default(),
        nested_writes:  vec![],
        unanalyzable:   vec![],
        has_wildcard:   false
    };
    r.tables.insert(TableRef::from_parts(["ops", "audit"]));
    let violations = check(&p, &r, SqlDialect::Generic);
    assert_eq!(violations[0].target.as_deref(), Some("ops.audit"));
}

#[test]
fn test_snowflake_policy_folds_upper() {
    let mut p = policy();
    p.banned_tables = ["payroll"].into_iter().collect();
    let r = resolution("SELECT * FROM Payroll", SqlDialect::Snowflake);
    assert_eq!(check(&p, &r, SqlDialect::Snowflake).len(), 1);
}
