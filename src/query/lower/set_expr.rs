use sqlparser::ast::{
    Distinct, GroupByExpr, LimitClause, OrderByKind, Query, Select, SelectItem, SetExpr
};

use super::{
    describe,
    expr::lower_expr,
    lower_ident,
    statement::lower_statement,
    table::lower_table_with_joins
};
use crate::query::tree::{CteNode, Name, NameParts, Projection, QueryNode, SelectNode, SetNode};

pub fn lower_query(query: &Query) -> QueryNode {
    let mut node = QueryNode {
        ctes:        Vec::new(),
        recursive:   false,
        body:        lower_set_expr(&query.body),
        order_by:    Vec::new(),
        limits:      Vec::new(),
        unsupported: Vec::new()
    };

    if let Some(with) = &query.with {
        node.recursive = with.recursive;
        for cte in &with.cte_tables {
            node.ctes.push(CteNode {
                name:  lower_ident(&cte.alias.name),
                query: lower_query(&cte.query)
            });
        }
    }

    if let Some(order_by) = &query.order_by {
        match &order_by.kind {
            OrderByKind::Expressions(exprs) => {
                node.order_by
                    .extend(exprs.iter().map(|o| lower_expr(&o.expr)));
            }
            OrderByKind::All(_) => {}
        }
    }

    match &query.limit_clause {
        Some(LimitClause::LimitOffset {
            limit,
            offset,
            limit_by
        }) => {
            node.limits.extend(limit.iter().map(lower_expr));
            node.limits
                .extend(offset.iter().map(|o| lower_expr(&o.value)));
            node.limits.extend(limit_by.iter().map(lower_expr));
        }
        Some(LimitClause::OffsetCommaLimit {
            offset,
            limit
        }) => {
            node.limits.push(lower_expr(offset));
            node.limits.push(lower_expr(limit));
        }
        None => {}
    }
    if let Some(fetch) = &query.fetch {
        node.limits.extend(fetch.quantity.iter().map(lower_expr));
    }

    if !query.locks.is_empty() {
        node.unsupported.push("row locking clause".to_string());
    }
    if query.for_clause.is_some() {
        node.unsupported.push("FOR XML/JSON clause".to_string());
    }
    if !query.pipe_operators.is_empty() {
        node.unsupported.push("pipe operator".to_string());
    }

    node
}

pub fn lower_set_expr(set_expr: &SetExpr) -> SetNode {
    match set_expr {
        SetExpr::Select(select) => SetNode::Select(Box::new(lower_select(select))),
        SetExpr::Query(query) => SetNode::Nested(Box::new(lower_query(query))),
        SetExpr::SetOperation {
            left,
            right,
            ..
        } => SetNode::Compound {
            left:  Box::new(lower_set_expr(left)),
            right: Box::new(lower_set_expr(right))
        },
        SetExpr::Values(values) => SetNode::Values(
            values
                .rows
                .iter()
                .map(|row| row.iter().map(lower_expr).collect())
                .collect()
        ),
        SetExpr::Insert(stmt)
        | SetExpr::Update(stmt)
        | SetExpr::Delete(stmt)
        | SetExpr::Merge(stmt) => SetNode::Write(Box::new(lower_statement(stmt))),
        SetExpr::Table(table) => match &table.table_name {
            Some(table_name) => {
                let mut name = NameParts::new();
                if let Some(schema) = &table.schema_name {
                    name.push(Name::unquoted(schema.as_str()));
                }
                name.push(Name::unquoted(table_name.as_str()));
                SetNode::Table(name)
            }
            None => SetNode::Unsupported(describe("TABLE expression", table))
        }
    }
}

fn lower_select(select: &Select) -> SelectNode {
    let mut node = SelectNode {
        projection: select.projection.iter().map(lower_select_item).collect(),
        from: select.from.iter().map(lower_table_with_joins).collect(),
        selection: select.selection.as_ref().map(lower_expr),
        having: select.having.as_ref().map(lower_expr),
        qualify: select.qualify.as_ref().map(lower_expr),
        ..SelectNode::default()
    };

    match &select.group_by {
        GroupByExpr::Expressions(exprs, _) => {
            node.group_by = exprs.iter().map(lower_expr).collect();
        }
        GroupByExpr::All(_) => {}
    }

    if let Some(prewhere) = &select.prewhere {
        node.extra.push(lower_expr(prewhere));
    }
    if let Some(Distinct::On(exprs)) = &select.distinct {
        node.extra.extend(exprs.iter().map(lower_expr));
    }
    node.extra
        .extend(select.cluster_by.iter().map(lower_expr));
    node.extra
        .extend(select.distribute_by.iter().map(lower_expr));
    node.extra
        .extend(select.sort_by.iter().map(|o| lower_expr(&o.expr)));

    if select.top.is_some() {
        node.unsupported.push("TOP clause".to_string());
    }
    if select.into.is_some() {
        node.unsupported.push("SELECT INTO".to_string());
    }
    if !select.lateral_views.is_empty() {
        node.unsupported.push("LATERAL VIEW".to_string());
    }
    if select.connect_by.is_some() {
        node.unsupported.push("CONNECT BY".to_string());
    }
    if !select.named_window.is_empty() {
        node.unsupported.push("WINDOW clause".to_string());
    }

    node
}

fn lower_select_item(item: &SelectItem) -> Projection {
    match item {
        SelectItem::UnnamedExpr(expr) => Projection::Expr {
            expr:  lower_expr(expr),
            alias: None
        },
        SelectItem::ExprWithAlias {
            expr,
            alias
        } => Projection::Expr {
            expr:  lower_expr(expr),
            alias: Some(lower_ident(alias))
        },
        SelectItem::Wildcard(options) => {
            if options.opt_replace.is_some() {
                Projection::Unsupported(describe("wildcard REPLACE", item))
            } else {
                Projection::Wildcard
            }
        }
        SelectItem::QualifiedWildcard(kind, _) => Projection::QualifiedWildcard(kind.to_string())
    }
}
