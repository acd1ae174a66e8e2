//! Type definitions for the policy rule system.
//!
//! - [`ViolationKind`] - tagged reason a statement was rejected
//! - [`Violation`] - one rejection reason with its offending identifier
//! - [`RuleInfo`] - rule metadata

use std::fmt;

use serde::Serialize;

/// Why a statement was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    WriteBlocked,
    BannedTable,
    BannedColumn,
    BannedSchema,
    DisallowedFunction,
    MultiStatementRejected,
    UnanalyzableConstruct
}

impl ViolationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WriteBlocked => "write_blocked",
            Self::BannedTable => "banned_table",
            Self::BannedColumn => "banned_column",
            Self::BannedSchema => "banned_schema",
            Self::DisallowedFunction => "disallowed_function",
            Self::MultiStatementRejected => "multi_statement_rejected",
            Self::UnanalyzableConstruct => "unanalyzable_construct"
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single reason for rejecting a statement.
///
/// Displays as `kind:target`, or just `kind` when there is no target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Violation {
    /// Rule identifier (e.g., "ACCESS001")
    pub rule_id: &'static str,
    pub kind:    ViolationKind,
    /// Offending identifier as referenced by the statement
    pub target:  Option<String>,
    pub message: String
}

impl Violation {
    /// Stacked statements in one candidate
    pub fn multi_statement(count: usize) -> Self {
        Self {
            rule_id: "PARSE002",
            kind:    ViolationKind::MultiStatementRejected,
            target:  None,
            message: format!("{} statements submitted, exactly one is allowed", count)
        }
    }

    /// Short `kind:target` code
    pub fn code(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some(target) => write!(f, "{}:{}", self.kind, target),
            None => write!(f, "{}", self.kind)
        }
    }
}

/// Metadata about a rule.
#[derive(Debug, Clone)]
pub struct RuleInfo {
    /// Unique rule identifier (e.g., "WRITE001")
    pub id:   &'static str,
    /// Human-readable rule name
    pub name: &'static str
}

impl RuleInfo {
    /// Build a violation attributed to this rule
    pub fn violation(
        &self,
        kind: ViolationKind,
        target: impl Into<String>,
        message: String
    ) -> Violation {
        Violation {
            rule_id: self.id,
            kind,
            target: Some(target.into()),
            message
        }
    }
}
