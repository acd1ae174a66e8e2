//! Query safety enforcement.
//!
//! [`evaluate`] is a pure function of one candidate query and one policy
//! snapshot. It never executes SQL and keeps no state between calls, so
//! identical inputs always produce identical decisions.
//!
//! # Pipeline
//!
//! ```text
//! SQL ──▶ split/parse ──▶ lower ──▶ resolve ──▶ rules ──▶ rewrite ──▶ decision
//!              │                                  │
//!              └── syntax / multi-statement ──────┴── rejected (final_sql = None)
//! ```
//!
//! # Example
//!
//! ```
//! use sql_guardrails::{
//!     engine::evaluate,
//!     policy::SecurityPolicy,
//!     query::{CandidateQuery, SqlDialect}
//! };
//! use uuid::Uuid;
//!
//! let catalog = Uuid::new_v4();
//! let policy = SecurityPolicy::new(catalog);
//! let candidate = CandidateQuery::new("SELECT * FROM users", SqlDialect::Generic, catalog);
//! let decision = evaluate(&candidate, &policy);
//! assert_eq!(decision.final_sql.as_deref(), Some("SELECT * FROM users LIMIT 1000"));
//! ```

mod types;

use sqlparser::ast::Statement;
pub use types::{AppliedActions, PolicyDecision, SyntaxReport};

use crate::{
    error::AppResult,
    policy::{PolicyMatcher, SecurityPolicy},
    query::{CandidateQuery, ParsedCandidate, SqlDialect, lower_statement, parse_candidate},
    resolve::{Resolution, resolve},
    rewrite::{LimitAction, rewrite},
    rules::{RuleContext, RuleRunner, Violation}
};

/// Decide whether `candidate` may run under `policy`, and in what form
pub fn evaluate(candidate: &CandidateQuery, policy: &SecurityPolicy) -> PolicyDecision {
    let span = tracing::info_span!(
        "evaluate",
        catalog_id = %candidate.catalog_id,
        dialect = %candidate.dialect
    );
    let _guard = span.enter();
    tracing::info!(sql_length = candidate.sql.len(), "Applying guardrails");

    let mut decision = PolicyDecision::default();
    if let Some(error) = snapshot_error(candidate, policy) {
        decision.errors.push(error);
        return finish(decision);
    }

    let statement = match parse_candidate(&candidate.sql, candidate.dialect) {
        Ok(ParsedCandidate::Single(statement)) => statement,
        Ok(ParsedCandidate::Multiple {
            count,
            syntax_error
        }) => {
            decision.syntax_valid = syntax_error.is_none();
            decision.errors.extend(syntax_error);
            decision.violations.push(Violation::multi_statement(count));
            return finish(decision);
        }
        Err(e) => {
            decision.errors.push(e.to_string());
            return finish(decision);
        }
    };
    decision.syntax_valid = true;

    let resolution = resolve(&lower_statement(&statement), candidate.dialect);
    record_resolution(&mut decision, &resolution);

    if let Err(e) = apply_policy(&mut decision, *statement, &resolution, policy, candidate.dialect)
    {
        decision.errors.push(e.to_string());
        decision.final_sql = None;
    }
    finish(decision)
}

/// Parse and resolve without applying any policy
pub fn validate_syntax(candidate: &CandidateQuery) -> SyntaxReport {
    let mut report = SyntaxReport::default();
    match parse_candidate(&candidate.sql, candidate.dialect) {
        Ok(ParsedCandidate::Single(statement)) => {
            let resolution = resolve(&lower_statement(&statement), candidate.dialect);
            report.syntax_valid = true;
            report.statement_kind = Some(resolution.statement_kind);
            report.parsed_tables = resolution.table_names();
            report.parsed_columns = resolution.column_names();
            report.warnings.extend(
                resolution
                    .unanalyzable
                    .iter()
                    .map(|c| format!("Unanalyzable construct: {}", c))
            );
        }
        Ok(ParsedCandidate::Multiple {
            count,
            syntax_error
        }) => {
            report.syntax_valid = syntax_error.is_none();
            report.errors.extend(syntax_error);
            report
                .errors
                .push(format!("{} statements found, exactly one is allowed", count));
        }
        Err(e) => report.errors.push(e.to_string())
    }
    report
}

/// Reject snapshots that belong to another catalog or were superseded
fn snapshot_error(candidate: &CandidateQuery, policy: &SecurityPolicy) -> Option<String> {
    if policy.catalog_id != candidate.catalog_id {
        return Some(format!(
            "Policy snapshot belongs to catalog {}, not {}",
            policy.catalog_id, candidate.catalog_id
        ));
    }
    policy
        .deleted_at
        .map(|at| format!("Policy snapshot was superseded at {}", at.to_rfc3339()))
}

fn record_resolution(decision: &mut PolicyDecision, resolution: &Resolution) {
    decision.statement_kind = Some(resolution.statement_kind);
    decision.parsed_tables = resolution.table_names();
    decision.parsed_columns = resolution.column_names();
    decision.parsed_functions = resolution.function_names();
}

fn apply_policy(
    decision: &mut PolicyDecision,
    mut statement: Statement,
    resolution: &Resolution,
    policy: &SecurityPolicy,
    dialect: SqlDialect
) -> AppResult<()> {
    let matcher = PolicyMatcher::new(policy, dialect.case_folding())?;
    let violations = RuleRunner::new().evaluate(&RuleContext {
        resolution,
        policy: &matcher
    });
    if !violations.is_empty() {
        decision.violations = violations;
        return Ok(());
    }

    let report = rewrite(&mut statement, &matcher, dialect)?;
    let actions = &mut decision.applied_actions;
    actions.default_limit_applied = report.limit.action == LimitAction::DefaultApplied;
    actions.limit_action = report.limit.action;
    actions.effective_limit = report.limit.effective_limit;
    actions.pii_masking_applied = !report.masked_columns.is_empty();
    actions.masked_columns = report.masked_columns;
    decision.warnings.extend(report.warnings);
    decision.modifications = report.modifications;
    decision.final_sql = Some(statement.to_string());
    Ok(())
}

fn finish(decision: PolicyDecision) -> PolicyDecision {
    match &decision.final_sql {
        Some(_) => tracing::info!(
            statement_kind = ?decision.statement_kind,
            modifications = decision.modifications.len(),
            warnings = decision.warnings.len(),
            "Query accepted"
        ),
        None => tracing::info!(
            violations = ?decision.violation_codes(),
            errors = decision.errors.len(),
            "Query rejected"
        )
    }
    decision
}
