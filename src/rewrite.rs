//! Rewrites applied to an allowed read query: PII masking, then LIMIT.

mod limit;
mod mask;

use indexmap::IndexSet;
pub use limit::{LimitAction, LimitOutcome, enforce_limit};
pub use mask::{MaskOutcome, mask_projections};
use sqlparser::ast::Statement;

use crate::{error::AppResult, policy::PolicyMatcher, query::SqlDialect};

/// What the rewriter changed
#[derive(Debug, Clone, Default)]
pub struct RewriteReport {
    pub limit:          LimitOutcome,
    pub masked_columns: Vec<String>,
    pub warnings:       Vec<String>,
    /// Human-readable list of rewrites
    pub modifications:  Vec<String>
}

/// Rewrite `statement` in place; non-query statements pass through untouched
pub fn rewrite(
    statement: &mut Statement,
    policy: &PolicyMatcher,
    dialect: SqlDialect
) -> AppResult<RewriteReport> {
    let mut report = RewriteReport::default();
    let Statement::Query(query) = statement else {
        return Ok(report);
    };

    if let Some(pii) = &policy.pii {
        let masked = mask_projections(query, pii, dialect)?;
        let columns: IndexSet<String> = masked.masked_columns.into_iter().collect();
        for column in &columns {
            report
                .modifications
                .push(format!("Masked PII column: {}", column));
        }
        report.masked_columns = columns.into_iter().collect();
        report.warnings.extend(masked.warnings);
    }

    let limit = enforce_limit(query, policy.default_limit, policy.max_rows, dialect)?;
    match (limit.action, limit.effective_limit) {
        (LimitAction::DefaultApplied, Some(n)) => {
            report.modifications.push(format!("Added LIMIT {}", n));
        }
        (LimitAction::MaxRowsApplied, Some(n)) => report
            .modifications
            .push(format!("Added LIMIT {} (max_rows_returned)", n)),
        (LimitAction::Clamped, Some(n)) => {
            report.modifications.push(format!("Reduced LIMIT to {}", n));
        }
        _ => {}
    }
    report.warnings.extend(limit.warning.clone());
    report.limit = limit;

    Ok(report)
}
