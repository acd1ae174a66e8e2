use compact_str::CompactString;

use super::TableRef;

/// What a visible relation name refers to
#[derive(Debug, Clone)]
pub(crate) enum BindingSource {
    /// A catalog table
    Table(TableRef),
    /// A CTE, derived table, table function or UNNEST
    Local
}

#[derive(Debug, Clone)]
pub(crate) struct Binding {
    pub name:   CompactString,
    pub source: BindingSource
}

#[derive(Debug, Default)]
struct Scope {
    ctes:     Vec<CompactString>,
    bindings: Vec<Binding>,
    aliases:  Vec<CompactString>
}

/// Lexical scopes of a statement, innermost last
#[derive(Debug, Default)]
pub(crate) struct ScopeStack {
    scopes: Vec<Scope>
}

impl ScopeStack {
    pub fn push(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    fn current_mut(&mut self) -> Option<&mut Scope> {
        self.scopes.last_mut()
    }

    pub fn register_cte(&mut self, name: CompactString) {
        if let Some(scope) = self.current_mut() {
            scope.ctes.push(name);
        }
    }

    /// Whether `name` is a CTE visible from the current scope
    pub fn is_cte(&self, name: &str) -> bool {
        self.scopes
            .iter()
            .rev()
            .any(|scope| scope.ctes.iter().any(|c| c == name))
    }

    pub fn bind(&mut self, name: CompactString, source: BindingSource) {
        if let Some(scope) = self.current_mut() {
            scope.bindings.push(Binding {
                name,
                source
            });
        }
    }

    pub fn add_alias(&mut self, alias: CompactString) {
        if let Some(scope) = self.current_mut() {
            scope.aliases.push(alias);
        }
    }

    /// Find a relation by visible name, innermost scope first
    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.bindings.iter().rev().find(|b| b.name == name))
    }

    /// The only relation of the current scope, if there is exactly one
    pub fn sole_binding(&self) -> Option<&Binding> {
        match self.scopes.last() {
            Some(scope) if scope.bindings.len() == 1 => scope.bindings.first(),
            _ => None
        }
    }

    /// Whether the current scope reads at least one catalog table
    pub fn has_table(&self) -> bool {
        self.scopes.last().is_some_and(|scope| {
            scope
                .bindings
                .iter()
                .any(|b| matches!(b.source, BindingSource::Table(_)))
        })
    }

    /// Whether `name` is a projection alias of the current scope
    pub fn is_alias(&self, name: &str) -> bool {
        self.scopes
            .last()
            .is_some_and(|scope| scope.aliases.iter().any(|a| a == name))
    }
}
