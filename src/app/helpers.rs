//! Input reading, exit codes and defaults shared by the commands.

use std::{
    fs::read_to_string,
    io::{self, Read},
    path::{Path, PathBuf}
};

use uuid::Uuid;

use super::{
    convert::{convert_dialect, convert_format},
    types::BatchLine
};
use crate::{
    cli::{Dialect, Format, SqlInput},
    config::Config,
    engine::{PolicyDecision, SyntaxReport},
    error::{AppResult, batch_entry_error, config_error, file_read_error},
    output::OutputOptions,
    policy::{SecurityPolicy, load_policy},
    query::{CandidateQuery, SqlDialect}
};

/// Exit code for a decision: `0` accepted, `2` rejected.
///
/// # Example
///
/// ```
/// use sql_guardrails::{app::calculate_exit_code, engine::PolicyDecision};
///
/// let rejected = PolicyDecision::default();
/// assert_eq!(calculate_exit_code(&rejected), 2);
/// ```
pub fn calculate_exit_code(decision: &PolicyDecision) -> i32 {
    if decision.is_accepted() { 0 } else { 2 }
}

/// Exit code for a syntax report: `0` valid, `2` invalid
pub fn syntax_exit_code(report: &SyntaxReport) -> i32 {
    if report.syntax_valid { 0 } else { 2 }
}

/// Reads a file, or stdin when the path is "-"
pub fn read_path_or_stdin(path: &Path) -> AppResult<String> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| file_read_error("stdin", e))?;
        Ok(buffer)
    } else {
        read_to_string(path).map_err(|e| file_read_error(&path.display().to_string(), e))
    }
}

/// SQL text from `--sql` or `--file`
pub fn read_sql_input(input: &SqlInput) -> AppResult<String> {
    match (&input.sql, &input.file) {
        (Some(sql), _) => Ok(sql.clone()),
        (None, Some(path)) => read_path_or_stdin(path),
        (None, None) => Err(config_error("Either --sql or --file is required"))
    }
}

/// Command-line dialect, else the configured one, else generic
pub fn resolve_dialect(cli: Option<Dialect>, config: &Config) -> AppResult<SqlDialect> {
    match cli {
        Some(dialect) => Ok(convert_dialect(dialect)),
        None => Ok(config.dialect()?.unwrap_or_default())
    }
}

/// Loads the policy named on the command line or in the configuration
pub fn resolve_policy(cli: Option<PathBuf>, config: &Config) -> AppResult<SecurityPolicy> {
    let path = cli.or_else(|| config.policy.path.clone()).ok_or_else(|| {
        config_error("A policy file is required (use --policy or SQL_GUARDRAILS_POLICY)")
    })?;
    load_policy(&path)
}

pub fn create_output_options(format: Format, no_color: bool) -> OutputOptions {
    OutputOptions {
        format:  convert_format(format),
        colored: !no_color
    }
}

/// Parse JSONL batch input into candidates, keeping 1-based line numbers.
///
/// Blank lines are skipped. Lines without a dialect use `dialect`.
pub fn parse_batch_lines(
    content: &str,
    dialect: SqlDialect,
    catalog_id: Uuid
) -> AppResult<Vec<(usize, CandidateQuery)>> {
    let mut candidates = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }
        let entry: BatchLine =
            serde_json::from_str(line).map_err(|e| batch_entry_error(line_no, e.to_string()))?;
        candidates.push((
            line_no,
            CandidateQuery::new(entry.sql, entry.dialect.unwrap_or(dialect), catalog_id)
        ));
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_exit_code_accepted() {
        let decision = PolicyDecision {
            final_sql: Some("SELECT 1".to_string()),
            ..Default::default()
        };
        assert_eq!(calculate_exit_code(&decision), 0);
    }

    #[test]
    fn test_syntax_exit_code() {
        let mut report = SyntaxReport::default();
        assert_eq!(syntax_exit_code(&report), 2);
        report.syntax_valid = true;
        assert_eq!(syntax_exit_code(&report), 0);
    }

    #[test]
    fn test_read_sql_input_prefers_inline() {
        let input = SqlInput {
            sql:  Some("SELECT 1".to_string()),
            file: None
        };
        assert_eq!(read_sql_input(&input).unwrap(), "SELECT 1");
    }

    #[test]
    fn test_read_sql_input_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "SELECT a FROM t").unwrap();
        let input = SqlInput {
            sql:  None,
            file: Some(file.path().to_path_buf())
        };
        assert_eq!(read_sql_input(&input).unwrap(), "SELECT a FROM t");
    }

    #[test]
    fn test_read_missing_file() {
        let result = read_path_or_stdin(Path::new("/nonexistent/query.sql"));
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_dialect_falls_back_to_config() {
        let config = Config::from_toml_str("[engine]\ndialect = \"snowflake\"").unwrap();
        assert_eq!(resolve_dialect(None, &config).unwrap(), SqlDialect::Snowflake);
        assert_eq!(
            resolve_dialect(Some(Dialect::Mysql), &config).unwrap(),
            SqlDialect::MySQL
        );
    }

    #[test]
    fn test_resolve_dialect_rejects_unknown_config() {
        let config = Config::from_toml_str("[engine]\ndialect = \"oracle\"").unwrap();
        assert!(resolve_dialect(None, &config).is_err());
    }

    #[test]
    fn test_resolve_policy_requires_path() {
        assert!(resolve_policy(None, &Config::default()).is_err());
    }

    #[test]
    fn test_parse_batch_lines() {
        let catalog = Uuid::new_v4();
        let content = "{\"sql\": \"SELECT 1\"}\n\n{\"sql\": \"SELECT 2\", \"dialect\": \"mysql\"}\n";
        let candidates = parse_batch_lines(content, SqlDialect::Generic, catalog).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].0, 1);
        assert_eq!(candidates[0].1.dialect, SqlDialect::Generic);
        assert_eq!(candidates[1].0, 3);
        assert_eq!(candidates[1].1.dialect, SqlDialect::MySQL);
        assert_eq!(candidates[1].1.catalog_id, catalog);
    }

    #[test]
    fn test_parse_batch_lines_rejects_bad_json() {
        let content = "{\"sql\": \"SELECT 1\"}\nnot json";
        assert!(parse_batch_lines(content, SqlDialect::Generic, Uuid::nil()).is_err());
    }
}
