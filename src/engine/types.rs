use serde::Serialize;

use crate::{
    query::StatementKind,
    rewrite::LimitAction,
    rules::Violation
};

/// Rewrites applied to an accepted statement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppliedActions {
    pub default_limit_applied: bool,
    pub limit_action:          LimitAction,
    pub effective_limit:       Option<u64>,
    pub pii_masking_applied:   bool,
    pub masked_columns:        Vec<String>
}

/// The engine's verdict on one candidate query.
///
/// `final_sql` is `None` exactly when the candidate is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PolicyDecision {
    pub final_sql:        Option<String>,
    pub syntax_valid:     bool,
    pub statement_kind:   Option<StatementKind>,
    pub errors:           Vec<String>,
    pub warnings:         Vec<String>,
    pub violations:       Vec<Violation>,
    pub parsed_tables:    Vec<String>,
    pub parsed_columns:   Vec<String>,
    pub parsed_functions: Vec<String>,
    pub applied_actions:  AppliedActions,
    pub modifications:    Vec<String>
}

impl PolicyDecision {
    pub fn is_accepted(&self) -> bool {
        self.final_sql.is_some()
    }

    /// Violations as `kind:target` codes
    pub fn violation_codes(&self) -> Vec<String> {
        self.violations.iter().map(Violation::code).collect()
    }
}

/// Syntax-only validation result, no policy applied
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyntaxReport {
    pub syntax_valid:   bool,
    pub statement_kind: Option<StatementKind>,
    pub errors:         Vec<String>,
    pub warnings:       Vec<String>,
    pub parsed_tables:  Vec<String>,
    pub parsed_columns: Vec<String>
}
