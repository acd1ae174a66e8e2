mod lower;
mod tree;
mod types;

use std::{fmt, str::FromStr};

pub use lower::lower_statement;
use serde::{Deserialize, Serialize};
use sqlparser::{
    ast::Statement,
    dialect::{
        BigQueryDialect, ClickHouseDialect, Dialect, DuckDbDialect, GenericDialect, MySqlDialect,
        PostgreSqlDialect, SQLiteDialect, SnowflakeDialect
    },
    parser::Parser,
    tokenizer::{Token, Tokenizer}
};
pub use tree::{
    Assignment, CteNode, FromItem, FunctionCall, JoinConstraintNode, JoinNode, Name, NameParts,
    Projection, QueryNode, Relation, ScalarExpr, SelectNode, SetNode, StatementNode
};
pub use types::{CandidateQuery, StatementKind};

use crate::error::{AppError, AppResult, config_error, format_sql_error, query_parse_error};

/// SQL dialect for parsing, identifier folding and PII hashing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SqlDialect {
    #[default]
    #[serde(rename = "generic")]
    Generic,
    #[serde(rename = "postgres", alias = "postgresql", alias = "pg")]
    PostgreSQL,
    #[serde(rename = "mysql")]
    MySQL,
    #[serde(rename = "sqlite")]
    SQLite,
    #[serde(rename = "clickhouse")]
    ClickHouse,
    #[serde(rename = "snowflake")]
    Snowflake,
    #[serde(rename = "bigquery")]
    BigQuery,
    #[serde(rename = "duckdb")]
    DuckDB
}

/// How a dialect normalizes unquoted identifiers before comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseFolding {
    Lower,
    Upper
}

impl CaseFolding {
    /// Fold an unquoted identifier
    pub fn fold(self, value: &str) -> compact_str::CompactString {
        match self {
            Self::Lower => value.to_lowercase().into(),
            Self::Upper => value.to_uppercase().into()
        }
    }
}

impl SqlDialect {
    /// All supported dialects
    pub const ALL: [SqlDialect; 8] = [
        Self::Generic,
        Self::PostgreSQL,
        Self::MySQL,
        Self::SQLite,
        Self::ClickHouse,
        Self::Snowflake,
        Self::BigQuery,
        Self::DuckDB
    ];

    /// Convert to sqlparser dialect for parsing
    pub fn into_parser_dialect(self) -> Box<dyn Dialect> {
        match self {
            Self::Generic => Box::new(GenericDialect {}),
            Self::PostgreSQL => Box::new(PostgreSqlDialect {}),
            Self::MySQL => Box::new(MySqlDialect {}),
            Self::SQLite => Box::new(SQLiteDialect {}),
            Self::ClickHouse => Box::new(ClickHouseDialect {}),
            Self::Snowflake => Box::new(SnowflakeDialect),
            Self::BigQuery => Box::new(BigQueryDialect),
            Self::DuckDB => Box::new(DuckDbDialect {})
        }
    }

    /// Canonical lowercase name
    pub fn name(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::PostgreSQL => "postgres",
            Self::MySQL => "mysql",
            Self::SQLite => "sqlite",
            Self::ClickHouse => "clickhouse",
            Self::Snowflake => "snowflake",
            Self::BigQuery => "bigquery",
            Self::DuckDB => "duckdb"
        }
    }

    /// Unquoted identifier folding.
    ///
    /// Snowflake stores unquoted identifiers uppercase. ClickHouse is case
    /// sensitive but is folded to lowercase here, which can only widen a
    /// banned-name match.
    pub fn case_folding(self) -> CaseFolding {
        match self {
            Self::Snowflake => CaseFolding::Upper,
            _ => CaseFolding::Lower
        }
    }

    /// Dialect-native SHA-256 hex expression wrapping `inner`
    pub fn hash_expression(self, inner: &str) -> String {
        match self {
            Self::Generic | Self::SQLite => format!("SHA256({inner})"),
            Self::PostgreSQL => {
                format!("ENCODE(SHA256(CONVERT_TO(CAST({inner} AS TEXT), 'UTF8')), 'hex')")
            }
            Self::MySQL => format!("SHA2(CAST({inner} AS CHAR), 256)"),
            Self::ClickHouse => format!("hex(SHA256(toString({inner})))"),
            Self::Snowflake => format!("SHA2(TO_VARCHAR({inner}), 256)"),
            Self::BigQuery => format!("TO_HEX(SHA256(CAST({inner} AS STRING)))"),
            Self::DuckDB => format!("SHA256(CAST({inner} AS VARCHAR))")
        }
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SqlDialect {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "generic" | "ansi" => Ok(Self::Generic),
            "postgres" | "postgresql" | "pg" => Ok(Self::PostgreSQL),
            "mysql" => Ok(Self::MySQL),
            "sqlite" => Ok(Self::SQLite),
            "clickhouse" => Ok(Self::ClickHouse),
            "snowflake" => Ok(Self::Snowflake),
            "bigquery" => Ok(Self::BigQuery),
            "duckdb" => Ok(Self::DuckDB),
            other => Err(config_error(format!(
                "Unknown SQL dialect '{}' (expected one of: {})",
                other,
                Self::ALL.map(Self::name).join(", ")
            )))
        }
    }
}

/// Outcome of parsing a candidate SQL string
#[derive(Debug, Clone)]
pub enum ParsedCandidate {
    /// Exactly one statement
    Single(Box<Statement>),
    /// More than one non-empty statement was submitted
    Multiple {
        count:        usize,
        syntax_error: Option<String>
    }
}

/// Count non-empty statements separated by top-level semicolons.
///
/// Semicolons inside string literals, quoted identifiers and comments are
/// not separators because the tokenizer consumes them as part of those
/// tokens.
pub fn count_statements(sql: &str, dialect: SqlDialect) -> AppResult<usize> {
    let parser_dialect = dialect.into_parser_dialect();
    let tokens = Tokenizer::new(parser_dialect.as_ref(), sql)
        .tokenize()
        .map_err(|e| query_parse_error(e.to_string()))?;
    let mut count = 0;
    let mut has_content = false;
    for token in &tokens {
        match token {
            Token::SemiColon => {
                if has_content {
                    count += 1;
                }
                has_content = false;
            }
            Token::Whitespace(_) | Token::EOF => {}
            _ => has_content = true
        }
    }
    if has_content {
        count += 1;
    }
    Ok(count)
}

/// Parse a candidate into exactly one statement
pub fn parse_candidate(sql: &str, dialect: SqlDialect) -> AppResult<ParsedCandidate> {
    let count = count_statements(sql, dialect)?;
    let parser_dialect = dialect.into_parser_dialect();
    let parsed = Parser::parse_sql(parser_dialect.as_ref(), sql);
    if count > 1 {
        return Ok(ParsedCandidate::Multiple {
            count,
            syntax_error: parsed
                .err()
                .map(|e| format_sql_error("Query parse error", &e.to_string()))
        });
    }
    let mut statements = parsed.map_err(|e| query_parse_error(e.to_string()))?;
    match statements.len() {
        0 => Err(query_parse_error("no SQL statement found")),
        1 => match statements.pop() {
            Some(statement) => Ok(ParsedCandidate::Single(Box::new(statement))),
            None => Err(query_parse_error("no SQL statement found"))
        },
        n => Ok(ParsedCandidate::Multiple {
            count:        n,
            syntax_error: None
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_ignores_semicolons_in_literals() {
        let n = count_statements("SELECT ';' FROM t", SqlDialect::Generic).unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn test_count_ignores_empty_segments() {
        let n = count_statements("SELECT 1;;  ;", SqlDialect::Generic).unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn test_count_two_statements() {
        let n = count_statements("SELECT 1; DROP TABLE users;", SqlDialect::Generic).unwrap();
        assert_eq!(n, 2);
    }

    #[test]
    fn test_dialect_from_str_aliases() {
        assert_eq!("PostgreSQL".parse::<SqlDialect>().unwrap(), SqlDialect::PostgreSQL);
        assert_eq!("pg".parse::<SqlDialect>().unwrap(), SqlDialect::PostgreSQL);
        assert!("oracle".parse::<SqlDialect>().is_err());
    }

    #[test]
    fn test_snowflake_folds_upper() {
        assert_eq!(SqlDialect::Snowflake.case_folding().fold("users"), "USERS");
        assert_eq!(SqlDialect::MySQL.case_folding().fold("Users"), "users");
    }

    #[test]
    fn test_parse_empty_is_error() {
        assert!(parse_candidate("   ", SqlDialect::Generic).is_err());
    }
}
