//! Closed, normalized statement tree.
//!
//! Every construct the resolver understands has its own variant. Anything
//! else is carried as an explicit `Unsupported` node with a short
//! description, so consumers match exhaustively and never fall through a
//! catch-all.

use compact_str::CompactString;
use smallvec::SmallVec;

use super::StatementKind;

/// Identifier as written, with its quoting preserved
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name {
    pub value:  CompactString,
    pub quoted: bool
}

impl Name {
    pub fn unquoted(value: impl Into<CompactString>) -> Self {
        Self {
            value:  value.into(),
            quoted: false
        }
    }
}

/// Dotted object name (`catalog.schema.table`, `alias.column`, ...)
pub type NameParts = SmallVec<[Name; 3]>;

#[derive(Debug, Clone)]
pub enum StatementNode {
    Query(QueryNode),
    Insert {
        table:     NameParts,
        columns:   Vec<Name>,
        source:    Option<Box<QueryNode>>,
        returning: Vec<Projection>
    },
    Update {
        target:      FromItem,
        assignments: Vec<Assignment>,
        selection:   Option<ScalarExpr>,
        returning:   Vec<Projection>
    },
    Delete {
        targets:   Vec<NameParts>,
        from:      Vec<FromItem>,
        using:     Vec<FromItem>,
        selection: Option<ScalarExpr>,
        returning: Vec<Projection>
    },
    Truncate {
        tables: Vec<NameParts>
    },
    Drop {
        names: Vec<NameParts>
    },
    CreateTable {
        name:    NameParts,
        columns: Vec<Name>,
        source:  Option<Box<QueryNode>>
    },
    /// Statement shape with no structured representation
    Unsupported {
        kind:      StatementKind,
        construct: String
    },
    /// Known statement carrying a clause the resolver cannot see through
    Partial {
        inner:     Box<StatementNode>,
        construct: String
    }
}

impl StatementNode {
    pub fn kind(&self) -> StatementKind {
        match self {
            Self::Query(_) => StatementKind::Select,
            Self::Insert {
                ..
            } => StatementKind::Insert,
            Self::Update {
                ..
            } => StatementKind::Update,
            Self::Delete {
                ..
            } => StatementKind::Delete,
            Self::Truncate {
                ..
            } => StatementKind::Truncate,
            Self::Drop {
                ..
            } => StatementKind::Drop,
            Self::CreateTable {
                ..
            } => StatementKind::Create,
            Self::Unsupported {
                kind, ..
            } => *kind,
            Self::Partial {
                inner, ..
            } => inner.kind()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Assignment {
    pub target: NameParts,
    pub value:  ScalarExpr
}

#[derive(Debug, Clone)]
pub struct CteNode {
    pub name:  Name,
    pub query: QueryNode
}

#[derive(Debug, Clone)]
pub struct QueryNode {
    pub ctes:        Vec<CteNode>,
    /// `WITH RECURSIVE`: each CTE is visible inside its own body
    pub recursive:   bool,
    pub body:        SetNode,
    pub order_by:    Vec<ScalarExpr>,
    /// LIMIT, OFFSET, FETCH and LIMIT BY expressions
    pub limits:      Vec<ScalarExpr>,
    pub unsupported: Vec<String>
}

#[derive(Debug, Clone)]
pub enum SetNode {
    Select(Box<SelectNode>),
    Nested(Box<QueryNode>),
    Compound {
        left:  Box<SetNode>,
        right: Box<SetNode>
    },
    Values(Vec<Vec<ScalarExpr>>),
    Table(NameParts),
    /// Data-modifying statement embedded in a query body
    Write(Box<StatementNode>),
    Unsupported(String)
}

#[derive(Debug, Clone, Default)]
pub struct SelectNode {
    pub projection:  Vec<Projection>,
    pub from:        Vec<FromItem>,
    pub selection:   Option<ScalarExpr>,
    pub group_by:    Vec<ScalarExpr>,
    pub having:      Option<ScalarExpr>,
    pub qualify:     Option<ScalarExpr>,
    /// PREWHERE, DISTINCT ON, CLUSTER/DISTRIBUTE/SORT BY
    pub extra:       Vec<ScalarExpr>,
    pub unsupported: Vec<String>
}

#[derive(Debug, Clone)]
pub enum Projection {
    Expr {
        expr:  ScalarExpr,
        alias: Option<Name>
    },
    Wildcard,
    QualifiedWildcard(String),
    Unsupported(String)
}

#[derive(Debug, Clone)]
pub struct FromItem {
    pub relation: Relation,
    pub joins:    Vec<JoinNode>
}

#[derive(Debug, Clone)]
pub struct JoinNode {
    pub relation:   Relation,
    pub constraint: JoinConstraintNode
}

#[derive(Debug, Clone)]
pub enum JoinConstraintNode {
    On(ScalarExpr),
    Using(Vec<Name>),
    Natural,
    None,
    Unsupported(String)
}

#[derive(Debug, Clone)]
pub enum Relation {
    Table {
        name:  NameParts,
        alias: Option<Name>
    },
    Function {
        call:  FunctionCall,
        alias: Option<Name>
    },
    Derived {
        query: Box<QueryNode>,
        alias: Option<Name>
    },
    Nested {
        item:  Box<FromItem>,
        alias: Option<Name>
    },
    Unnest {
        exprs: Vec<ScalarExpr>,
        alias: Option<Name>
    },
    Unsupported(String)
}

#[derive(Debug, Clone)]
pub struct FunctionCall {
    pub name: NameParts,
    pub args: Vec<ScalarExpr>
}

#[derive(Debug, Clone)]
pub enum ScalarExpr {
    Column(NameParts),
    Literal,
    Function(FunctionCall),
    Subquery(Box<QueryNode>),
    Exists(Box<QueryNode>),
    InSubquery {
        expr:  Box<ScalarExpr>,
        query: Box<QueryNode>
    },
    /// Operator or syntactic form whose operands are all plain expressions
    Operation(Vec<ScalarExpr>),
    Unsupported(String)
}
