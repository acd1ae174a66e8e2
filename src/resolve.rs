//! Name resolution over the normalized statement tree.
//!
//! Produces the catalog tables, columns and functions a statement touches.
//! CTE names, derived-table aliases and table-function aliases are local
//! relations and never reach the table list. Unqualified columns bind to
//! the only relation in scope, otherwise they stay bare so that a bare
//! banned-column entry still catches them.

mod scope;

use std::fmt;

use compact_str::CompactString;
use indexmap::IndexSet;
use scope::{Binding, BindingSource, ScopeStack};
use smallvec::SmallVec;

use crate::query::{
    CaseFolding, FromItem, FunctionCall, JoinConstraintNode, Name, NameParts, Projection,
    QueryNode, Relation, ScalarExpr, SelectNode, SetNode, SqlDialect, StatementKind,
    StatementNode
};

/// Catalog table reference with case-folded parts
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub parts: SmallVec<[CompactString; 3]>
}

impl TableRef {
    pub fn from_parts<S: Into<CompactString>>(parts: impl IntoIterator<Item = S>) -> Self {
        Self {
            parts: parts.into_iter().map(Into::into).collect()
        }
    }

    /// Bare table name
    pub fn name(&self) -> &str {
        self.parts.last().map(CompactString::as_str).unwrap_or_default()
    }

    /// Schema part, when the reference is qualified
    pub fn schema(&self) -> Option<&str> {
        let n = self.parts.len();
        (n >= 2).then(|| self.parts[n - 2].as_str())
    }

    /// Everything before the table name (`catalog.schema`)
    pub fn namespace(&self) -> Option<String> {
        let n = self.parts.len();
        (n >= 2).then(|| self.parts[..n - 1].join("."))
    }

    pub fn qualified(&self) -> String {
        self.parts.join(".")
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified())
    }
}

/// Column reference, bound to a catalog table when that is provable
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub table: Option<TableRef>,
    pub name:  CompactString
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{}.{}", table, self.name),
            None => f.write_str(&self.name)
        }
    }
}

/// Everything a statement references, in first-seen order
#[derive(Debug, Clone)]
pub struct Resolution {
    pub statement_kind: StatementKind,
    pub tables:         IndexSet<TableRef>,
    pub columns:        IndexSet<ColumnRef>,
    /// Uppercased, dotted function names
    pub functions:      IndexSet<CompactString>,
    /// Data-modifying statements found below the top level
    pub nested_writes:  Vec<StatementKind>,
    /// Constructs the resolver could not see through
    pub unanalyzable:   Vec<String>,
    /// A `*`, `t.*` or `TABLE t` projection expands a catalog table
    pub has_wildcard:   bool
}

impl Resolution {
    fn new(statement_kind: StatementKind) -> Self {
        Self {
            statement_kind,
            tables: IndexSet::new(),
            columns: IndexSet::new(),
            functions: IndexSet::new(),
            nested_writes: Vec::new(),
            unanalyzable: Vec::new(),
            has_wildcard: false
        }
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(TableRef::qualified).collect()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(ToString::to_string).collect()
    }

    pub fn function_names(&self) -> Vec<String> {
        self.functions.iter().map(ToString::to_string).collect()
    }
}

/// Resolve every reference in `statement` under `dialect` folding rules
pub fn resolve(statement: &StatementNode, dialect: SqlDialect) -> Resolution {
    let mut resolver = Resolver {
        folding: dialect.case_folding(),
        scopes:  ScopeStack::default(),
        out:     Resolution::new(statement.kind())
    };
    resolver.scopes.push();
    resolver.statement(statement);
    resolver.scopes.pop();
    resolver.out
}

struct Resolver {
    folding: CaseFolding,
    scopes:  ScopeStack,
    out:     Resolution
}

impl Resolver {
    fn canonical(&self, name: &Name) -> CompactString {
        if name.quoted {
            name.value.clone()
        } else {
            self.folding.fold(&name.value)
        }
    }

    fn canonical_parts(&self, parts: &NameParts) -> SmallVec<[CompactString; 3]> {
        parts.iter().map(|p| self.canonical(p)).collect()
    }

    fn statement(&mut self, stmt: &StatementNode) {
        match stmt {
            StatementNode::Query(query) => self.query(query),
            StatementNode::Insert {
                table,
                columns,
                source,
                returning
            } => {
                let table = TableRef {
                    parts: self.canonical_parts(table)
                };
                self.out.tables.insert(table.clone());
                for column in columns {
                    let name = self.canonical(column);
                    self.out.columns.insert(ColumnRef {
                        table: Some(table.clone()),
                        name
                    });
                }
                if let Some(source) = source {
                    self.query(source);
                }
                self.scopes.push();
                self.scopes
                    .bind(table.name().into(), BindingSource::Table(table.clone()));
                self.projections(returning);
                self.scopes.pop();
            }
            StatementNode::Update {
                target,
                assignments,
                selection,
                returning
            } => {
                self.scopes.push();
                self.from_item(target);
                for assignment in assignments {
                    self.column(&assignment.target, false);
                    self.expr(&assignment.value);
                }
                if let Some(selection) = selection {
                    self.expr(selection);
                }
                self.projections(returning);
                self.scopes.pop();
            }
            StatementNode::Delete {
                targets,
                from,
                using,
                selection,
                returning
            } => {
                self.scopes.push();
                for item in from.iter().chain(using) {
                    self.from_item(item);
                }
                for target in targets {
                    let parts = self.canonical_parts(target);
                    if parts.len() == 1 && self.scopes.lookup(&parts[0]).is_some() {
                        continue;
                    }
                    self.out.tables.insert(TableRef {
                        parts
                    });
                }
                if let Some(selection) = selection {
                    self.expr(selection);
                }
                self.projections(returning);
                self.scopes.pop();
            }
            StatementNode::Truncate {
                tables
            }
            | StatementNode::Drop {
                names: tables
            } => {
                for table in tables {
                    let parts = self.canonical_parts(table);
                    self.out.tables.insert(TableRef {
                        parts
                    });
                }
            }
            StatementNode::CreateTable {
                name,
                columns,
                source
            } => {
                let table = TableRef {
                    parts: self.canonical_parts(name)
                };
                self.out.tables.insert(table.clone());
                for column in columns {
                    let name = self.canonical(column);
                    self.out.columns.insert(ColumnRef {
                        table: Some(table.clone()),
                        name
                    });
                }
                if let Some(source) = source {
                    self.query(source);
                }
            }
            StatementNode::Unsupported {
                construct, ..
            } => self.out.unanalyzable.push(construct.clone()),
            StatementNode::Partial {
                inner,
                construct
            } => {
                self.statement(inner);
                self.out.unanalyzable.push(construct.clone());
            }
        }
    }

    fn query(&mut self, query: &QueryNode) {
        self.scopes.push();
        for cte in &query.ctes {
            let name = self.canonical(&cte.name);
            if query.recursive {
                self.scopes.register_cte(name);
                self.query(&cte.query);
            } else {
                // Registered after its body: a non-recursive CTE that reuses a table name
                // reads the catalog table, so `users` inside `WITH users AS (...)` stays
                // visible to the table rules instead of resolving to itself.
                self.query(&cte.query);
                self.scopes.register_cte(name);
            }
        }
        match &query.body {
            SetNode::Select(select) => self.select(select),
            other => self.set_node(other)
        }
        for expr in &query.order_by {
            self.expr_in(expr, true);
        }
        for expr in &query.limits {
            self.expr(expr);
        }
        self.out
            .unanalyzable
            .extend(query.unsupported.iter().cloned());
        self.scopes.pop();
    }

    fn set_node(&mut self, node: &SetNode) {
        match node {
            SetNode::Select(select) => {
                self.scopes.push();
                self.select(select);
                self.scopes.pop();
            }
            SetNode::Nested(query) => self.query(query),
            SetNode::Compound {
                left,
                right
            } => {
                self.set_node(left);
                self.set_node(right);
            }
            SetNode::Values(rows) => {
                for expr in rows.iter().flatten() {
                    self.expr(expr);
                }
            }
            SetNode::Table(name) => {
                if self.table_reference(name, None) {
                    self.out.has_wildcard = true;
                }
            }
            SetNode::Write(stmt) => {
                self.out.nested_writes.push(stmt.kind());
                self.scopes.push();
                self.statement(stmt);
                self.scopes.pop();
            }
            SetNode::Unsupported(construct) => self.out.unanalyzable.push(construct.clone())
        }
    }

    fn select(&mut self, select: &SelectNode) {
        for item in &select.from {
            self.from_item(item);
        }
        self.projections(&select.projection);
        for projection in &select.projection {
            if let Projection::Expr {
                alias: Some(alias),
                ..
            } = projection
            {
                let alias = self.canonical(alias);
                self.scopes.add_alias(alias);
            }
        }
        let clauses = select
            .selection
            .iter()
            .chain(&select.group_by)
            .chain(&select.having)
            .chain(&select.qualify)
            .chain(&select.extra);
        for expr in clauses {
            self.expr(expr);
        }
        self.out
            .unanalyzable
            .extend(select.unsupported.iter().cloned());
    }

    fn projections(&mut self, projections: &[Projection]) {
        for projection in projections {
            match projection {
                Projection::Expr {
                    expr, ..
                } => self.expr(expr),
                Projection::Wildcard => {
                    if self.scopes.has_table() {
                        self.out.has_wildcard = true;
                    }
                }
                Projection::QualifiedWildcard(relation) => {
                    if !self.is_local_relation(relation) {
                        self.out.has_wildcard = true;
                    }
                }
                Projection::Unsupported(construct) => {
                    self.out.unanalyzable.push(construct.clone());
                }
            }
        }
    }

    fn from_item(&mut self, item: &FromItem) {
        self.relation(&item.relation);
        for join in &item.joins {
            self.relation(&join.relation);
            match &join.constraint {
                JoinConstraintNode::On(expr) => self.expr(expr),
                JoinConstraintNode::Using(columns) => {
                    for column in columns {
                        self.column(&NameParts::from_iter([column.clone()]), false);
                    }
                }
                JoinConstraintNode::Natural | JoinConstraintNode::None => {}
                JoinConstraintNode::Unsupported(construct) => {
                    self.out.unanalyzable.push(construct.clone());
                }
            }
        }
    }

    fn relation(&mut self, relation: &Relation) {
        match relation {
            Relation::Table {
                name,
                alias
            } => {
                self.table_reference(name, alias.as_ref());
            }
            Relation::Function {
                call,
                alias
            } => {
                self.function(call);
                self.bind_local(alias.as_ref());
            }
            Relation::Derived {
                query,
                alias
            } => {
                self.query(query);
                self.bind_local(alias.as_ref());
            }
            Relation::Nested {
                item,
                alias
            } => {
                self.from_item(item);
                self.bind_local(alias.as_ref());
            }
            Relation::Unnest {
                exprs,
                alias
            } => {
                for expr in exprs {
                    self.expr(expr);
                }
                self.bind_local(alias.as_ref());
            }
            Relation::Unsupported(construct) => self.out.unanalyzable.push(construct.clone())
        }
    }

    fn bind_local(&mut self, alias: Option<&Name>) {
        if let Some(alias) = alias {
            let name = self.canonical(alias);
            self.scopes.bind(name, BindingSource::Local);
        }
    }

    /// Whether `relation` of a `relation.*` projection is a CTE or derived table
    fn is_local_relation(&self, relation: &str) -> bool {
        if relation.contains(['.', '"', '`', '[']) {
            return false;
        }
        let name = self.folding.fold(relation);
        matches!(
            self.scopes.lookup(&name).map(|b| &b.source),
            Some(BindingSource::Local)
        )
    }

    /// Bind a table reference; returns whether it names a catalog table
    fn table_reference(&mut self, name: &NameParts, alias: Option<&Name>) -> bool {
        let parts = self.canonical_parts(name);
        let visible = match alias {
            Some(alias) => Some(self.canonical(alias)),
            None => parts.last().cloned()
        };
        let local = parts.len() == 1 && self.scopes.is_cte(&parts[0]);
        let source = if local {
            BindingSource::Local
        } else {
            let table = TableRef {
                parts
            };
            self.out.tables.insert(table.clone());
            BindingSource::Table(table)
        };
        if let Some(visible) = visible {
            self.scopes.bind(visible, source);
        }
        !local
    }

    fn function(&mut self, call: &FunctionCall) {
        let name = call
            .name
            .iter()
            .map(|part| part.value.to_uppercase())
            .collect::<Vec<_>>()
            .join(".");
        self.out.functions.insert(name.into());
        for arg in &call.args {
            self.expr(arg);
        }
    }

    fn expr(&mut self, expr: &ScalarExpr) {
        self.expr_in(expr, false);
    }

    /// `order_by` lets a bare name resolve to a projection alias
    fn expr_in(&mut self, expr: &ScalarExpr, order_by: bool) {
        match expr {
            ScalarExpr::Column(parts) => self.column(parts, order_by),
            ScalarExpr::Literal => {}
            ScalarExpr::Function(call) => self.function(call),
            ScalarExpr::Subquery(query) | ScalarExpr::Exists(query) => self.query(query),
            ScalarExpr::InSubquery {
                expr,
                query
            } => {
                self.expr(expr);
                self.query(query);
            }
            ScalarExpr::Operation(children) => {
                for child in children {
                    self.expr(child);
                }
            }
            ScalarExpr::Unsupported(construct) => self.out.unanalyzable.push(construct.clone())
        }
    }

    fn column(&mut self, parts: &NameParts, order_by: bool) {
        let parts = self.canonical_parts(parts);
        let Some((name, qualifier)) = parts.split_last() else {
            return;
        };
        let table = match qualifier {
            [] => {
                if order_by && self.scopes.is_alias(name) {
                    return;
                }
                match self.scopes.sole_binding() {
                    Some(Binding {
                        source: BindingSource::Table(table),
                        ..
                    }) => Some(table.clone()),
                    _ => None
                }
            }
            [relation] => match self.scopes.lookup(relation) {
                Some(binding) => match &binding.source {
                    BindingSource::Table(table) => Some(table.clone()),
                    BindingSource::Local => None
                },
                None => Some(TableRef::from_parts([relation.clone()]))
            },
            qualified => Some(TableRef::from_parts(qualified.iter().cloned()))
        };
        self.out.columns.insert(ColumnRef {
            table,
            name: name.clone()
        });
    }
}

#[cfg(test)]
mod tests {
    use sqlparser::{dialect::GenericDialect, parser::Parser};

    use super::*;
    use crate::query::lower_statement;

    fn resolve_sql(sql: &str) -> Resolution {
        let stmts = Parser::parse_sql(&GenericDialect {}, sql).unwrap();
        resolve(&lower_statement(&stmts[0]), SqlDialect::Generic)
    }

    #[test]
    fn test_alias_binds_qualified_column() {
        let r = resolve_sql("SELECT u.email FROM users u");
        assert_eq!(r.table_names(), vec!["users"]);
        assert_eq!(r.column_names(), vec!["users.email"]);
    }

    #[test]
    fn test_ambiguous_column_stays_bare() {
        let r = resolve_sql("SELECT id FROM users JOIN orders ON users.id = orders.user_id");
        assert!(r.column_names().contains(&"id".to_string()));
    }

    #[test]
    fn test_order_by_alias_is_local() {
        let r = resolve_sql("SELECT name AS secret FROM users ORDER BY secret");
        assert!(!r.column_names().iter().any(|c| c.ends_with("secret")));
    }

    #[test]
    fn test_where_does_not_see_projection_alias() {
        let r = resolve_sql("SELECT name AS password FROM users WHERE password = 'x'");
        assert!(r.column_names().contains(&"users.password".to_string()));
    }

    #[test]
    fn test_cte_body_sees_catalog_table_of_same_name() {
        let r = resolve_sql("WITH users AS (SELECT * FROM users) SELECT * FROM users");
        assert_eq!(r.table_names(), vec!["users"]);
    }

    #[test]
    fn test_cte_is_not_a_table() {
        let r = resolve_sql("WITH recent AS (SELECT id FROM orders) SELECT id FROM recent");
        assert_eq!(r.table_names(), vec!["orders"]);
    }

    #[test]
    fn test_wildcard_over_catalog_table() {
        assert!(resolve_sql("SELECT * FROM users").has_wildcard);
        assert!(resolve_sql("SELECT u.* FROM users u").has_wildcard);
        assert!(resolve_sql("TABLE users").has_wildcard);
    }

    #[test]
    fn test_wildcard_over_local_relation() {
        let r = resolve_sql("WITH x AS (SELECT id FROM users) SELECT * FROM x");
        assert!(!r.has_wildcard);
        let r = resolve_sql("SELECT d.* FROM (SELECT id FROM users) AS d");
        assert!(!r.has_wildcard);
        let r = resolve_sql("WITH x AS (SELECT * FROM users) SELECT id FROM x");
        assert!(r.has_wildcard);
    }

    #[test]
    fn test_nested_write_recorded() {
        let r = resolve_sql(
            "WITH gone AS (DELETE FROM users RETURNING id) SELECT id FROM gone"
        );
        assert!(r.nested_writes.contains(&StatementKind::Delete));
        assert!(r.table_names().contains(&"users".to_string()));
    }
}
