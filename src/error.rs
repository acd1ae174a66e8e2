pub use masterror::{AppError, AppResult};

/// Create file read error
pub fn file_read_error(path: &str, source: std::io::Error) -> AppError {
    AppError::internal(format!("Failed to read file '{}': {}", path, source))
}

/// Create query parse error with optional position info
pub fn query_parse_error(message: impl Into<String>) -> AppError {
    let msg = message.into();
    AppError::bad_request(format_sql_error("Query parse error", &msg))
}

/// Create policy parse error for a policy document at `path`
pub fn policy_parse_error(path: &str, message: impl Into<String>) -> AppError {
    AppError::bad_request(format!("Invalid policy '{}': {}", path, message.into()))
}

/// Create PII masking error
pub fn masking_error(message: impl Into<String>) -> AppError {
    AppError::internal(format!("PII masking failed: {}", message.into()))
}

/// Create error for a rewrite that could not be rebuilt
pub fn rewrite_error(message: impl Into<String>) -> AppError {
    AppError::internal(format!("Query rewrite failed: {}", message.into()))
}

/// Create config error
pub fn config_error(message: impl Into<String>) -> AppError {
    AppError::bad_request(message.into())
}

/// Create error for a malformed batch input line
pub fn batch_entry_error(line: usize, message: impl Into<String>) -> AppError {
    AppError::bad_request(format!("Invalid batch entry on line {}: {}", line, message.into()))
}

/// Format SQL error with position highlighting
pub(crate) fn format_sql_error(prefix: &str, message: &str) -> String {
    // sqlparser format: "... at Line: X, Column: Y"
    if let Some(pos) = extract_position(message) {
        format!(
            "{} at line {}, column {}:\n  {}",
            prefix, pos.line, pos.column, message
        )
    } else {
        format!("{}:\n  {}", prefix, message)
    }
}

struct SqlPosition {
    line:   usize,
    column: usize
}

fn extract_position(message: &str) -> Option<SqlPosition> {
    let line_marker = "Line: ";
    let line_start = message.find(line_marker)? + line_marker.len();
    let rest = &message[line_start..];
    let line_end = rest.find(|c: char| !c.is_ascii_digit())?;
    let line = rest[..line_end].parse().ok()?;

    // Both "Column Y" and "Column: Y" appear depending on sqlparser version
    let col_marker = "Column";
    let col_start = rest.find(col_marker)? + col_marker.len();
    let col_rest = rest[col_start..].trim_start_matches([':', ' ']);
    let col_end = col_rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(col_rest.len());
    let column = col_rest[..col_end].parse().ok()?;

    Some(SqlPosition {
        line,
        column
    })
}
