use std::ops::ControlFlow;

use sqlparser::{
    ast::{
        Expr, Ident, Query, Select, SelectItem, SetExpr, TableFactor, TableWithJoins,
        visit_expressions
    },
    parser::Parser
};

use crate::{
    error::{AppResult, masking_error},
    policy::PiiMatcher,
    query::SqlDialect
};

#[derive(Debug, Default)]
pub struct MaskOutcome {
    pub masked_columns: Vec<String>,
    pub warnings:       Vec<String>
}

/// Hash every projection that reads a PII-tagged column.
///
/// Covers each branch of a set operation and the SELECT lists of CTE and
/// derived-table bodies, whose columns an outer query can re-expose under
/// another name. WHERE, JOIN and GROUP BY are left alone.
pub fn mask_projections(
    query: &mut Query,
    pii: &PiiMatcher,
    dialect: SqlDialect
) -> AppResult<MaskOutcome> {
    let mut outcome = MaskOutcome::default();
    mask_query(query, pii, dialect, &mut outcome)?;
    Ok(outcome)
}

fn mask_query(
    query: &mut Query,
    pii: &PiiMatcher,
    dialect: SqlDialect,
    outcome: &mut MaskOutcome
) -> AppResult<()> {
    if let Some(with) = &mut query.with {
        for cte in with.cte_tables.iter_mut() {
            mask_query(&mut cte.query, pii, dialect, outcome)?;
        }
    }
    mask_set_expr(&mut query.body, pii, dialect, outcome)
}

fn mask_set_expr(
    body: &mut SetExpr,
    pii: &PiiMatcher,
    dialect: SqlDialect,
    outcome: &mut MaskOutcome
) -> AppResult<()> {
    match body {
        SetExpr::Select(select) => mask_select(select, pii, dialect, outcome),
        SetExpr::Query(query) => mask_query(query, pii, dialect, outcome),
        SetExpr::SetOperation {
            left,
            right,
            ..
        } => {
            mask_set_expr(left, pii, dialect, outcome)?;
            mask_set_expr(right, pii, dialect, outcome)
        }
        SetExpr::Table(table) => {
            outcome.warnings.push(format!(
                "{} projects every column; PII columns cannot be masked without a schema",
                table
            ));
            Ok(())
        }
        _ => Ok(())
    }
}

fn mask_select(
    select: &mut Select,
    pii: &PiiMatcher,
    dialect: SqlDialect,
    outcome: &mut MaskOutcome
) -> AppResult<()> {
    for table in select.from.iter_mut() {
        mask_from(table, pii, dialect, outcome)?;
    }
    for item in select.projection.iter_mut() {
        let (expr, alias) = match &*item {
            SelectItem::UnnamedExpr(expr) => (expr, None),
            SelectItem::ExprWithAlias {
                expr,
                alias
            } => (expr, Some(alias)),
            SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(..) => {
                outcome.warnings.push(format!(
                    "Wildcard projection `{}` cannot be masked without a schema; PII columns may be exposed",
                    item
                ));
                continue;
            }
        };
        let Some(column) = pii_reference(expr, pii) else {
            continue;
        };
        let alias = alias
            .cloned()
            .or_else(|| output_name(expr))
            .unwrap_or_else(|| Ident::new(column.as_str()));
        let masked = hashed(expr, dialect)?;
        tracing::debug!(column = %column, alias = %alias, "Masking PII projection");
        *item = SelectItem::ExprWithAlias {
            expr: masked,
            alias
        };
        outcome.masked_columns.push(column);
    }
    Ok(())
}

fn mask_from(
    table: &mut TableWithJoins,
    pii: &PiiMatcher,
    dialect: SqlDialect,
    outcome: &mut MaskOutcome
) -> AppResult<()> {
    mask_relation(&mut table.relation, pii, dialect, outcome)?;
    for join in table.joins.iter_mut() {
        mask_relation(&mut join.relation, pii, dialect, outcome)?;
    }
    Ok(())
}

fn mask_relation(
    relation: &mut TableFactor,
    pii: &PiiMatcher,
    dialect: SqlDialect,
    outcome: &mut MaskOutcome
) -> AppResult<()> {
    match relation {
        TableFactor::Derived {
            subquery, ..
        } => mask_query(subquery, pii, dialect, outcome),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => mask_from(table_with_joins, pii, dialect, outcome),
        _ => Ok(())
    }
}

/// First column inside `expr` whose name matches a PII tag
fn pii_reference(expr: &Expr, pii: &PiiMatcher) -> Option<String> {
    let found = visit_expressions(expr, |e| {
        let ident = match e {
            Expr::Identifier(ident) => Some(ident),
            Expr::CompoundIdentifier(idents) => idents.last(),
            _ => None
        };
        match ident {
            Some(ident) if pii.is_match(&ident.value) => ControlFlow::Break(ident.value.clone()),
            _ => ControlFlow::Continue(())
        }
    });
    match found {
        ControlFlow::Break(column) => Some(column),
        ControlFlow::Continue(()) => None
    }
}

/// Output column name of a plain column projection
fn output_name(expr: &Expr) -> Option<Ident> {
    match expr {
        Expr::Identifier(ident) => Some(ident.clone()),
        Expr::CompoundIdentifier(idents) => idents.last().cloned(),
        _ => None
    }
}

fn hashed(expr: &Expr, dialect: SqlDialect) -> AppResult<Expr> {
    let sql = dialect.hash_expression(&expr.to_string());
    let parser_dialect = dialect.into_parser_dialect();
    Parser::new(parser_dialect.as_ref())
        .try_with_sql(&sql)
        .and_then(|mut parser| parser.parse_expr())
        .map_err(|e| masking_error(format!("cannot build `{}`: {}", sql, e)))
}
