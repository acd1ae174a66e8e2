//! Parameters and outputs of the CLI commands.

use std::path::PathBuf;

use serde::Deserialize;
use uuid::Uuid;

use crate::{
    cli::{Dialect, Format, SqlInput},
    query::SqlDialect
};

/// Parameters for the evaluate command.
///
/// # Example
///
/// ```
/// use sql_guardrails::{
///     app::EvaluateParams,
///     cli::{Format, SqlInput}
/// };
///
/// let params = EvaluateParams {
///     policy_path:   Some("policy.toml".into()),
///     input:         SqlInput {
///         sql:  Some("SELECT 1".to_string()),
///         file: None
///     },
///     dialect:       None,
///     catalog:       None,
///     output_format: Format::Json,
///     no_color:      true
/// };
/// assert!(params.policy_path.is_some());
/// ```
#[derive(Debug, Clone)]
pub struct EvaluateParams {
    /// Policy file; falls back to the configured path
    pub policy_path:   Option<PathBuf>,
    pub input:         SqlInput,
    pub dialect:       Option<Dialect>,
    /// Catalog the query targets; the policy's own catalog when absent
    pub catalog:       Option<Uuid>,
    pub output_format: Format,
    pub no_color:      bool
}

/// Parameters for the validate command
#[derive(Debug, Clone)]
pub struct ValidateParams {
    pub input:         SqlInput,
    pub dialect:       Option<Dialect>,
    pub output_format: Format,
    pub no_color:      bool
}

/// Parameters for the batch command
#[derive(Debug, Clone)]
pub struct BatchParams {
    pub policy_path:   Option<PathBuf>,
    /// JSONL path or "-" for stdin
    pub input_path:    PathBuf,
    pub dialect:       Option<Dialect>,
    pub output_format: Format,
    pub quiet:         bool,
    pub no_color:      bool
}

/// One line of a batch input file
#[derive(Debug, Clone, Deserialize)]
pub struct BatchLine {
    pub sql:     String,
    #[serde(default)]
    pub dialect: Option<SqlDialect>
}

/// Output from CLI command execution.
///
/// Exit codes: `0` accepted or valid, `1` operational error, `2` rejected
/// or invalid.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    /// Text to print to stdout
    pub stdout:    String
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_line_without_dialect() {
        let line: BatchLine = serde_json::from_str(r#"{"sql": "SELECT 1"}"#).unwrap();
        assert_eq!(line.sql, "SELECT 1");
        assert!(line.dialect.is_none());
    }

    #[test]
    fn test_batch_line_with_dialect_alias() {
        let line: BatchLine =
            serde_json::from_str(r#"{"sql": "SELECT 1", "dialect": "postgresql"}"#).unwrap();
        assert_eq!(line.dialect, Some(SqlDialect::PostgreSQL));
    }

    #[test]
    fn test_command_output_clone() {
        let output = CommandOutput {
            exit_code: 2,
            stdout:    "REJECTED".to_string()
        };
        let cloned = output.clone();
        assert_eq!(cloned.exit_code, 2);
        assert_eq!(cloned.stdout, "REJECTED");
    }
}
