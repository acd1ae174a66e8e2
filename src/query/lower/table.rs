use sqlparser::ast::{Join, JoinConstraint, JoinOperator, TableAlias, TableFactor, TableWithJoins};

use super::{
    describe,
    expr::{lower_expr, lower_function_arg},
    lower_ident, lower_object_name,
    set_expr::lower_query
};
use crate::query::tree::{
    FromItem, FunctionCall, JoinConstraintNode, JoinNode, Name, Relation, ScalarExpr
};

pub fn lower_table_with_joins(table: &TableWithJoins) -> FromItem {
    FromItem {
        relation: lower_table_factor(&table.relation),
        joins:    table.joins.iter().map(lower_join).collect()
    }
}

fn lower_alias(alias: &Option<TableAlias>) -> Option<Name> {
    alias.as_ref().map(|a| lower_ident(&a.name))
}

pub fn lower_table_factor(factor: &TableFactor) -> Relation {
    match factor {
        TableFactor::Table {
            name,
            alias,
            args,
            ..
        } => {
            let name = match lower_object_name(name) {
                Ok(name) => name,
                Err(construct) => return Relation::Unsupported(construct)
            };
            let alias = lower_alias(alias);
            match args {
                Some(table_args) => {
                    let mut call_args = Vec::new();
                    for arg in &table_args.args {
                        lower_function_arg(arg, &mut call_args);
                    }
                    Relation::Function {
                        call: FunctionCall {
                            name,
                            args: call_args
                        },
                        alias
                    }
                }
                None => Relation::Table {
                    name,
                    alias
                }
            }
        }
        TableFactor::Derived {
            subquery,
            alias,
            ..
        } => Relation::Derived {
            query: Box::new(lower_query(subquery)),
            alias: lower_alias(alias)
        },
        TableFactor::Function {
            name,
            args,
            alias,
            ..
        } => {
            let name = match lower_object_name(name) {
                Ok(name) => name,
                Err(construct) => return Relation::Unsupported(construct)
            };
            let mut call_args = Vec::new();
            for arg in args {
                lower_function_arg(arg, &mut call_args);
            }
            Relation::Function {
                call:  FunctionCall {
                    name,
                    args: call_args
                },
                alias: lower_alias(alias)
            }
        }
        TableFactor::UNNEST {
            array_exprs,
            alias,
            ..
        } => Relation::Unnest {
            exprs: array_exprs.iter().map(lower_expr).collect(),
            alias: lower_alias(alias)
        },
        TableFactor::NestedJoin {
            table_with_joins,
            alias,
            ..
        } => Relation::Nested {
            item:  Box::new(lower_table_with_joins(table_with_joins)),
            alias: lower_alias(alias)
        },
        other => Relation::Unsupported(describe("table factor", other))
    }
}

fn lower_join(join: &Join) -> JoinNode {
    let constraint = match &join.join_operator {
        JoinOperator::Join(constraint)
        | JoinOperator::Inner(constraint)
        | JoinOperator::Left(constraint)
        | JoinOperator::LeftOuter(constraint)
        | JoinOperator::Right(constraint)
        | JoinOperator::RightOuter(constraint)
        | JoinOperator::FullOuter(constraint)
        | JoinOperator::Semi(constraint)
        | JoinOperator::LeftSemi(constraint)
        | JoinOperator::RightSemi(constraint)
        | JoinOperator::Anti(constraint)
        | JoinOperator::LeftAnti(constraint)
        | JoinOperator::RightAnti(constraint) => lower_join_constraint(constraint),
        JoinOperator::AsOf {
            match_condition,
            constraint
        } => match lower_join_constraint(constraint) {
            JoinConstraintNode::On(on) => {
                JoinConstraintNode::On(ScalarExpr::Operation(vec![lower_expr(match_condition), on]))
            }
            JoinConstraintNode::None => JoinConstraintNode::On(lower_expr(match_condition)),
            other => other
        },
        JoinOperator::CrossJoin {
            ..
        }
        | JoinOperator::CrossApply {
            ..
        }
        | JoinOperator::OuterApply {
            ..
        } => JoinConstraintNode::None,
        other => JoinConstraintNode::Unsupported(format!("join operator {:?}", other))
    };
    JoinNode {
        relation: lower_table_factor(&join.relation),
        constraint
    }
}

fn lower_join_constraint(constraint: &JoinConstraint) -> JoinConstraintNode {
    match constraint {
        JoinConstraint::On(expr) => JoinConstraintNode::On(lower_expr(expr)),
        JoinConstraint::Using(names) => {
            let mut columns = Vec::new();
            for name in names {
                match lower_object_name(name) {
                    Ok(parts) => columns.extend(parts.last().cloned()),
                    Err(construct) => return JoinConstraintNode::Unsupported(construct)
                }
            }
            JoinConstraintNode::Using(columns)
        }
        JoinConstraint::Natural => JoinConstraintNode::Natural,
        JoinConstraint::None => JoinConstraintNode::None
    }
}
