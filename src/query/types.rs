use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::SqlDialect;

/// A single untrusted SQL string submitted for evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateQuery {
    pub sql:        String,
    #[serde(default)]
    pub dialect:    SqlDialect,
    pub catalog_id: Uuid
}

impl CandidateQuery {
    pub fn new(sql: impl Into<String>, dialect: SqlDialect, catalog_id: Uuid) -> Self {
        Self {
            sql: sql.into(),
            dialect,
            catalog_id
        }
    }
}

/// Top-level statement classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[non_exhaustive]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Merge,
    Drop,
    Alter,
    Truncate,
    Create,
    Other
}

impl StatementKind {
    /// Whether the statement modifies data or schema
    pub fn is_write(self) -> bool {
        !matches!(self, Self::Select | Self::Other)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Merge => "MERGE",
            Self::Drop => "DROP",
            Self::Alter => "ALTER",
            Self::Truncate => "TRUNCATE",
            Self::Create => "CREATE",
            Self::Other => "OTHER"
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
