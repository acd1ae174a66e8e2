use serde::Serialize;
use sqlparser::{
    ast::{Expr, LimitClause, Query, Value},
    parser::Parser
};

use crate::{
    error::{AppResult, rewrite_error},
    query::SqlDialect
};

/// Which LIMIT branch fired
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitAction {
    #[default]
    Unchanged,
    /// Existing limit lowered to `max_rows_returned`
    Clamped,
    /// `default_limit` appended
    DefaultApplied,
    /// `max_rows_returned` appended because no default is set
    MaxRowsApplied
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LimitOutcome {
    pub action:          LimitAction,
    pub effective_limit: Option<u64>,
    pub warning:         Option<String>
}

enum ExistingLimit {
    None,
    Literal(u64),
    Dynamic
}

/// Apply LIMIT precedence: clamp, then default, then max, else unchanged
///
/// A ClickHouse `LIMIT n BY expr` caps rows per group, not in total, so it
/// counts as no limit; the total cap goes on a wrapping query.
pub fn enforce_limit(
    query: &mut Query,
    default_limit: Option<u64>,
    max_rows: Option<u64>,
    dialect: SqlDialect
) -> AppResult<LimitOutcome> {
    let outcome = match (existing_limit(query), max_rows) {
        (ExistingLimit::Literal(current), Some(max)) if current > max => {
            set_limit(query, max, dialect)?;
            LimitOutcome {
                action:          LimitAction::Clamped,
                effective_limit: Some(max),
                warning:         None
            }
        }
        (ExistingLimit::Literal(current), _) => LimitOutcome {
            action:          LimitAction::Unchanged,
            effective_limit: Some(current),
            warning:         None
        },
        (ExistingLimit::Dynamic, Some(max)) => {
            set_limit(query, max, dialect)?;
            LimitOutcome {
                action:          LimitAction::Clamped,
                effective_limit: Some(max),
                warning:         Some(format!(
                    "Non-literal row limit replaced with max_rows_returned ({})",
                    max
                ))
            }
        }
        (ExistingLimit::Dynamic, None) => LimitOutcome {
            action:          LimitAction::Unchanged,
            effective_limit: None,
            warning:         Some("Row limit is not a literal; effective limit unknown".into())
        },
        (ExistingLimit::None, max) => match (default_limit, max) {
            (Some(default), _) => {
                set_limit(query, default, dialect)?;
                LimitOutcome {
                    action:          LimitAction::DefaultApplied,
                    effective_limit: Some(default),
                    warning:         None
                }
            }
            (None, Some(max)) => {
                set_limit(query, max, dialect)?;
                LimitOutcome {
                    action:          LimitAction::MaxRowsApplied,
                    effective_limit: Some(max),
                    warning:         None
                }
            }
            (None, None) => LimitOutcome::default()
        }
    };
    Ok(outcome)
}

fn existing_limit(query: &Query) -> ExistingLimit {
    if let Some(fetch) = &query.fetch {
        return match &fetch.quantity {
            Some(quantity) if !fetch.percent => literal(quantity),
            Some(_) => ExistingLimit::Dynamic,
            // FETCH FIRST ROW ONLY
            None => ExistingLimit::Literal(1)
        };
    }
    if has_limit_by(query) {
        return ExistingLimit::None;
    }
    match &query.limit_clause {
        Some(LimitClause::LimitOffset {
            limit: Some(limit),
            ..
        })
        | Some(LimitClause::OffsetCommaLimit {
            limit,
            ..
        }) => literal(limit),
        Some(LimitClause::LimitOffset {
            limit: None,
            ..
        })
        | None => ExistingLimit::None
    }
}

fn has_limit_by(query: &Query) -> bool {
    matches!(
        &query.limit_clause,
        Some(LimitClause::LimitOffset {
            limit_by, ..
        }) if !limit_by.is_empty()
    )
}

fn literal(expr: &Expr) -> ExistingLimit {
    if let Expr::Value(value) = expr
        && let Value::Number(n, _) = &value.value
        && let Ok(n) = n.parse::<u64>()
    {
        ExistingLimit::Literal(n)
    } else {
        ExistingLimit::Dynamic
    }
}

fn number(n: u64) -> Expr {
    Expr::value(Value::Number(n.to_string(), false))
}

fn set_limit(query: &mut Query, n: u64, dialect: SqlDialect) -> AppResult<()> {
    if let Some(fetch) = &mut query.fetch {
        fetch.quantity = Some(number(n));
        fetch.percent = false;
        return Ok(());
    }
    if has_limit_by(query) {
        return wrap_with_limit(query, n, dialect);
    }
    match &mut query.limit_clause {
        Some(LimitClause::LimitOffset {
            limit, ..
        }) => *limit = Some(number(n)),
        Some(LimitClause::OffsetCommaLimit {
            limit, ..
        }) => *limit = number(n),
        slot @ None => {
            *slot = Some(LimitClause::LimitOffset {
                limit:    Some(number(n)),
                offset:   None,
                limit_by: Vec::new()
            });
        }
    }
    Ok(())
}

/// Replace `query` with `SELECT * FROM (query) AS limited_rows LIMIT n`
fn wrap_with_limit(query: &mut Query, n: u64, dialect: SqlDialect) -> AppResult<()> {
    let sql = format!("SELECT * FROM ({}) AS limited_rows LIMIT {}", query, n);
    let parser_dialect = dialect.into_parser_dialect();
    let wrapped = Parser::new(parser_dialect.as_ref())
        .try_with_sql(&sql)
        .and_then(|mut parser| parser.parse_query())
        .map_err(|e| rewrite_error(format!("cannot wrap `LIMIT BY` query: {}", e)))?;
    *query = *wrapped;
    Ok(())
}

#[cfg(test)]
mod tests {
    use sqlparser::{
        ast::Statement,
        dialect::{ClickHouseDialect, Dialect, GenericDialect, MySqlDialect}
    };

    use super::*;

    fn query(sql: &str) -> Query {
        query_in(&GenericDialect {}, sql)
    }

    fn query_in(dialect: &dyn Dialect, sql: &str) -> Query {
        match Parser::parse_sql(dialect, sql).unwrap().remove(0) {
            Statement::Query(q) => *q,
            other => panic!("not a query: {}", other)
        }
    }

    #[test]
    fn test_offset_comma_limit_clamped() {
        let mut q = query_in(&MySqlDialect {}, "SELECT a FROM t LIMIT 10, 500");
        let outcome = enforce_limit(&mut q, None, Some(100), SqlDialect::MySQL).unwrap();
        assert_eq!(outcome.action, LimitAction::Clamped);
        assert!(q.to_string().contains("100"));
        assert!(!q.to_string().contains("500"));
    }

    #[test]
    fn test_limit_without_value_gets_default() {
        let mut q = query("SELECT a FROM t OFFSET 5");
        let outcome = enforce_limit(&mut q, Some(50), None, SqlDialect::Generic).unwrap();
        assert_eq!(outcome.action, LimitAction::DefaultApplied);
        assert!(q.to_string().contains("LIMIT 50"));
    }

    #[test]
    fn test_fetch_first_clamped() {
        let mut q = query("SELECT a FROM t FETCH FIRST 500 ROWS ONLY");
        let outcome = enforce_limit(&mut q, None, Some(100), SqlDialect::Generic).unwrap();
        assert_eq!(outcome.effective_limit, Some(100));
        assert!(q.to_string().contains("FETCH FIRST 100 ROWS ONLY"));
    }

    #[test]
    fn test_dynamic_limit_without_max_is_unchanged() {
        let mut q = query("SELECT a FROM t LIMIT (SELECT 5)");
        let outcome = enforce_limit(&mut q, Some(10), None, SqlDialect::Generic).unwrap();
        assert_eq!(outcome.action, LimitAction::Unchanged);
        assert!(outcome.warning.is_some());
    }

    #[test]
    fn test_limit_by_is_not_a_row_cap() {
        let mut q = query_in(&ClickHouseDialect {}, "SELECT a, b FROM t LIMIT 1 BY a");
        let outcome = enforce_limit(&mut q, None, Some(100), SqlDialect::ClickHouse).unwrap();
        assert_eq!(outcome.action, LimitAction::MaxRowsApplied);
        assert_eq!(outcome.effective_limit, Some(100));
        let sql = q.to_string();
        assert!(sql.starts_with("SELECT * FROM (SELECT a, b FROM t LIMIT 1 BY a)"));
        assert!(sql.ends_with("LIMIT 100"));
    }
}
