use sqlparser::ast::{
    Expr, Function, FunctionArg, FunctionArgExpr, FunctionArgumentClause, FunctionArguments,
    WindowType
};

use super::{describe, lower_ident, lower_object_name, set_expr::lower_query};
use crate::query::tree::{FunctionCall, Name, NameParts, ScalarExpr};

pub fn lower_expr(expr: &Expr) -> ScalarExpr {
    match expr {
        Expr::Identifier(ident) => ScalarExpr::Column(NameParts::from_iter([lower_ident(ident)])),
        Expr::CompoundIdentifier(idents) => {
            ScalarExpr::Column(idents.iter().map(lower_ident).collect())
        }
        Expr::Value(_)
        | Expr::TypedString {
            ..
        } => ScalarExpr::Literal,
        Expr::BinaryOp {
            left,
            right,
            ..
        }
        | Expr::IsDistinctFrom(left, right)
        | Expr::IsNotDistinctFrom(left, right)
        | Expr::AtTimeZone {
            timestamp: left,
            time_zone: right
        }
        | Expr::AnyOp {
            left,
            right,
            ..
        }
        | Expr::AllOp {
            left,
            right,
            ..
        } => operation([left.as_ref(), right.as_ref()]),
        Expr::UnaryOp {
            expr, ..
        }
        | Expr::Nested(expr)
        | Expr::IsNull(expr)
        | Expr::IsNotNull(expr)
        | Expr::IsTrue(expr)
        | Expr::IsNotTrue(expr)
        | Expr::IsFalse(expr)
        | Expr::IsNotFalse(expr)
        | Expr::IsUnknown(expr)
        | Expr::IsNotUnknown(expr)
        | Expr::Cast {
            expr, ..
        }
        | Expr::Collate {
            expr, ..
        } => operation([expr.as_ref()]),
        Expr::Like {
            expr,
            pattern,
            ..
        }
        | Expr::ILike {
            expr,
            pattern,
            ..
        }
        | Expr::SimilarTo {
            expr,
            pattern,
            ..
        }
        | Expr::RLike {
            expr,
            pattern,
            ..
        } => operation([expr.as_ref(), pattern.as_ref()]),
        Expr::InList {
            expr,
            list,
            ..
        } => operation(std::iter::once(expr.as_ref()).chain(list)),
        Expr::InSubquery {
            expr,
            subquery,
            ..
        } => ScalarExpr::InSubquery {
            expr:  Box::new(lower_expr(expr)),
            query: Box::new(lower_query(subquery))
        },
        Expr::InUnnest {
            expr,
            array_expr,
            ..
        } => operation([expr.as_ref(), array_expr.as_ref()]),
        Expr::Between {
            expr,
            low,
            high,
            ..
        } => operation([expr.as_ref(), low.as_ref(), high.as_ref()]),
        Expr::Case {
            operand,
            conditions,
            else_result,
            ..
        } => {
            let mut children = Vec::new();
            if let Some(operand) = operand {
                children.push(lower_expr(operand));
            }
            for when in conditions {
                children.push(lower_expr(&when.condition));
                children.push(lower_expr(&when.result));
            }
            if let Some(else_result) = else_result {
                children.push(lower_expr(else_result));
            }
            ScalarExpr::Operation(children)
        }
        Expr::Tuple(exprs) => operation(exprs),
        Expr::Array(array) => operation(&array.elem),
        Expr::Interval(interval) => operation([interval.value.as_ref()]),
        Expr::Function(func) => lower_function(func),
        Expr::Subquery(query) => ScalarExpr::Subquery(Box::new(lower_query(query))),
        Expr::Exists {
            subquery, ..
        } => ScalarExpr::Exists(Box::new(lower_query(subquery))),
        Expr::Extract {
            expr, ..
        } => special_form("EXTRACT", [expr.as_ref()]),
        Expr::Ceil {
            expr, ..
        } => special_form("CEIL", [expr.as_ref()]),
        Expr::Floor {
            expr, ..
        } => special_form("FLOOR", [expr.as_ref()]),
        Expr::Position {
            expr,
            r#in
        } => special_form("POSITION", [expr.as_ref(), r#in.as_ref()]),
        Expr::Substring {
            expr,
            substring_from,
            substring_for,
            ..
        } => special_form(
            "SUBSTRING",
            std::iter::once(expr.as_ref())
                .chain(substring_from.as_deref())
                .chain(substring_for.as_deref())
        ),
        Expr::Trim {
            expr,
            trim_what,
            trim_characters,
            ..
        } => special_form(
            "TRIM",
            std::iter::once(expr.as_ref())
                .chain(trim_what.as_deref())
                .chain(trim_characters.iter().flatten())
        ),
        other => ScalarExpr::Unsupported(describe("expression", other))
    }
}

fn operation<'a>(children: impl IntoIterator<Item = &'a Expr>) -> ScalarExpr {
    ScalarExpr::Operation(children.into_iter().map(lower_expr).collect())
}

/// Keyword syntax that behaves like a function call
fn special_form<'a>(name: &str, args: impl IntoIterator<Item = &'a Expr>) -> ScalarExpr {
    ScalarExpr::Function(FunctionCall {
        name: NameParts::from_iter([Name::unquoted(name)]),
        args: args.into_iter().map(lower_expr).collect()
    })
}

pub fn lower_function(func: &Function) -> ScalarExpr {
    let name = match lower_object_name(&func.name) {
        Ok(name) => name,
        Err(construct) => return ScalarExpr::Unsupported(construct)
    };
    let mut args = Vec::new();
    lower_function_arguments(&func.parameters, &mut args);
    lower_function_arguments(&func.args, &mut args);
    if let Some(filter) = &func.filter {
        args.push(lower_expr(filter));
    }
    for order in &func.within_group {
        args.push(lower_expr(&order.expr));
    }
    match &func.over {
        Some(WindowType::WindowSpec(spec)) => {
            args.extend(spec.partition_by.iter().map(lower_expr));
            args.extend(spec.order_by.iter().map(|o| lower_expr(&o.expr)));
        }
        Some(WindowType::NamedWindow(window)) => {
            args.push(ScalarExpr::Unsupported(format!(
                "named window `{}`",
                window.value
            )));
        }
        None => {}
    }
    ScalarExpr::Function(FunctionCall {
        name,
        args
    })
}

fn lower_function_arguments(arguments: &FunctionArguments, out: &mut Vec<ScalarExpr>) {
    match arguments {
        FunctionArguments::None => {}
        FunctionArguments::Subquery(query) => {
            out.push(ScalarExpr::Subquery(Box::new(lower_query(query))));
        }
        FunctionArguments::List(list) => {
            for arg in &list.args {
                lower_function_arg(arg, out);
            }
            for clause in &list.clauses {
                match clause {
                    FunctionArgumentClause::OrderBy(order) => {
                        out.extend(order.iter().map(|o| lower_expr(&o.expr)));
                    }
                    FunctionArgumentClause::Limit(limit) => out.push(lower_expr(limit)),
                    FunctionArgumentClause::IgnoreOrRespectNulls {
                        ..
                    }
                    | FunctionArgumentClause::Separator {
                        ..
                    }
                    | FunctionArgumentClause::OnOverflow {
                        ..
                    } => {}
                    other => out.push(ScalarExpr::Unsupported(describe(
                        "function argument clause",
                        other
                    )))
                }
            }
        }
    }
}

pub fn lower_function_arg(arg: &FunctionArg, out: &mut Vec<ScalarExpr>) {
    let value = match arg {
        FunctionArg::Unnamed(value)
        | FunctionArg::Named {
            arg: value, ..
        }
        | FunctionArg::ExprNamed {
            arg: value, ..
        } => value
    };
    match value {
        FunctionArgExpr::Expr(expr) => out.push(lower_expr(expr)),
        FunctionArgExpr::QualifiedWildcard(_) | FunctionArgExpr::Wildcard => {}
    }
}
