use sqlparser::ast::{
    AssignmentTarget, Delete, FromTable, Insert, ObjectName, SelectItem, Statement, TableObject,
    Truncate, Update
};

use super::{
    describe,
    expr::lower_expr,
    lower_ident, lower_object_name,
    set_expr::lower_query,
    table::lower_table_with_joins
};
use crate::query::{
    StatementKind,
    tree::{Assignment, Projection, StatementNode}
};

/// Lower a parsed statement into the closed statement tree
pub fn lower_statement(stmt: &Statement) -> StatementNode {
    match stmt {
        Statement::Query(query) => StatementNode::Query(lower_query(query)),
        Statement::Insert(insert) => lower_insert(insert),
        Statement::Update(Update {
            table,
            assignments,
            from,
            selection,
            returning,
            ..
        }) => {
            let mut lowered = Vec::with_capacity(assignments.len());
            for assignment in assignments {
                let targets: Vec<&ObjectName> = match &assignment.target {
                    AssignmentTarget::ColumnName(name) => vec![name],
                    AssignmentTarget::Tuple(names) => names.iter().collect()
                };
                for target in targets {
                    match lower_object_name(target) {
                        Ok(target) => lowered.push(Assignment {
                            target,
                            value: lower_expr(&assignment.value)
                        }),
                        Err(construct) => return unsupported(StatementKind::Update, construct)
                    }
                }
            }
            let node = StatementNode::Update {
                target:      lower_table_with_joins(table),
                assignments: lowered,
                selection:   selection.as_ref().map(lower_expr),
                returning:   lower_returning(returning)
            };
            if from.is_some() {
                partial(node, "UPDATE ... FROM")
            } else {
                node
            }
        }
        Statement::Delete(delete) => lower_delete(delete),
        Statement::Truncate(Truncate {
            table_names, ..
        }) => {
            let mut tables = Vec::with_capacity(table_names.len());
            for target in table_names {
                match lower_object_name(&target.name) {
                    Ok(name) => tables.push(name),
                    Err(construct) => return unsupported(StatementKind::Truncate, construct)
                }
            }
            StatementNode::Truncate {
                tables
            }
        }
        Statement::Drop {
            names, ..
        } => {
            let mut lowered = Vec::with_capacity(names.len());
            for name in names {
                match lower_object_name(name) {
                    Ok(name) => lowered.push(name),
                    Err(construct) => return unsupported(StatementKind::Drop, construct)
                }
            }
            StatementNode::Drop {
                names: lowered
            }
        }
        Statement::CreateTable(create) => match lower_object_name(&create.name) {
            Ok(name) => StatementNode::CreateTable {
                name,
                columns: create
                    .columns
                    .iter()
                    .map(|c| lower_ident(&c.name))
                    .collect(),
                source: create
                    .query
                    .as_ref()
                    .map(|q| Box::new(lower_query(q)))
            },
            Err(construct) => unsupported(StatementKind::Create, construct)
        },
        other => {
            let kind = classify_statement(other);
            unsupported(kind, describe("statement", leading_keywords(other)))
        }
    }
}

fn lower_insert(insert: &Insert) -> StatementNode {
    let table = match &insert.table {
        TableObject::TableName(name) => match lower_object_name(name) {
            Ok(name) => name,
            Err(construct) => return unsupported(StatementKind::Insert, construct)
        },
        #[allow(unreachable_patterns)]
        other => {
            return unsupported(StatementKind::Insert, describe("insert target", other));
        }
    };
    let node = StatementNode::Insert {
        table,
        columns: insert.columns.iter().map(lower_ident).collect(),
        source: insert.source.as_ref().map(|q| Box::new(lower_query(q))),
        returning: lower_returning(&insert.returning)
    };
    if insert.on.is_some() {
        partial(node, "ON CONFLICT / ON DUPLICATE KEY clause")
    } else {
        node
    }
}

fn lower_delete(delete: &Delete) -> StatementNode {
    let mut targets = Vec::with_capacity(delete.tables.len());
    for name in &delete.tables {
        match lower_object_name(name) {
            Ok(name) => targets.push(name),
            Err(construct) => return unsupported(StatementKind::Delete, construct)
        }
    }
    let from = match &delete.from {
        FromTable::WithFromKeyword(items) | FromTable::WithoutKeyword(items) => items
    };
    StatementNode::Delete {
        targets,
        from: from.iter().map(lower_table_with_joins).collect(),
        using: delete
            .using
            .iter()
            .flatten()
            .map(lower_table_with_joins)
            .collect(),
        selection: delete.selection.as_ref().map(lower_expr),
        returning: lower_returning(&delete.returning)
    }
}

fn lower_returning(returning: &Option<Vec<SelectItem>>) -> Vec<Projection> {
    returning
        .iter()
        .flatten()
        .map(|item| match item {
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
            SelectItem::Wildcard(_) => Projection::Wildcard,
            SelectItem::QualifiedWildcard(kind, _) => {
                Projection::QualifiedWildcard(kind.to_string())
            }
        })
        .collect()
}

fn unsupported(kind: StatementKind, construct: String) -> StatementNode {
    StatementNode::Unsupported {
        kind,
        construct
    }
}

fn partial(inner: StatementNode, construct: &str) -> StatementNode {
    StatementNode::Partial {
        inner:     Box::new(inner),
        construct: construct.to_string()
    }
}

/// First keyword(s) of a statement, used to describe it without echoing data
fn leading_keywords(stmt: &Statement) -> String {
    stmt.to_string()
        .split_whitespace()
        .take(2)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Classify a statement the tree has no structured form for
pub fn classify_statement(stmt: &Statement) -> StatementKind {
    match stmt {
        Statement::Query(_) => StatementKind::Select,
        Statement::Insert {
            ..
        } => StatementKind::Insert,
        Statement::Update {
            ..
        } => StatementKind::Update,
        Statement::Delete {
            ..
        } => StatementKind::Delete,
        Statement::Merge {
            ..
        } => StatementKind::Merge,
        Statement::Truncate {
            ..
        } => StatementKind::Truncate,
        Statement::Drop {
            ..
        }
        | Statement::DropFunction {
            ..
        }
        | Statement::DropProcedure {
            ..
        }
        | Statement::DropTrigger {
            ..
        }
        | Statement::DropPolicy {
            ..
        } => StatementKind::Drop,
        Statement::AlterTable {
            ..
        }
        | Statement::AlterView {
            ..
        }
        | Statement::AlterIndex {
            ..
        }
        | Statement::AlterRole {
            ..
        }
        | Statement::AlterPolicy {
            ..
        } => StatementKind::Alter,
        Statement::CreateTable {
            ..
        }
        | Statement::CreateView {
            ..
        }
        | Statement::CreateIndex {
            ..
        }
        | Statement::CreateSchema {
            ..
        }
        | Statement::CreateDatabase {
            ..
        }
        | Statement::CreateFunction {
            ..
        }
        | Statement::CreateProcedure {
            ..
        }
        | Statement::CreateRole {
            ..
        }
        | Statement::CreateTrigger {
            ..
        }
        | Statement::CreateSequence {
            ..
        } => StatementKind::Create,
        _ => StatementKind::Other
    }
}
