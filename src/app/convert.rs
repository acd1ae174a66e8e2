//! CLI enums to domain types.

use crate::{
    cli::{Dialect, Format},
    output::OutputFormat,
    query::SqlDialect
};

/// Converts a CLI dialect to the engine dialect.
///
/// # Example
///
/// ```
/// use sql_guardrails::{app::convert_dialect, cli::Dialect, query::SqlDialect};
///
/// assert_eq!(convert_dialect(Dialect::Snowflake), SqlDialect::Snowflake);
/// ```
pub fn convert_dialect(dialect: Dialect) -> SqlDialect {
    match dialect {
        Dialect::Generic => SqlDialect::Generic,
        Dialect::Postgres => SqlDialect::PostgreSQL,
        Dialect::Mysql => SqlDialect::MySQL,
        Dialect::Sqlite => SqlDialect::SQLite,
        Dialect::Clickhouse => SqlDialect::ClickHouse,
        Dialect::Snowflake => SqlDialect::Snowflake,
        Dialect::Bigquery => SqlDialect::BigQuery,
        Dialect::Duckdb => SqlDialect::DuckDB
    }
}

pub fn convert_format(format: Format) -> OutputFormat {
    match format {
        Format::Text => OutputFormat::Text,
        Format::Json => OutputFormat::Json,
        Format::Yaml => OutputFormat::Yaml
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_dialect_postgres() {
        assert_eq!(convert_dialect(Dialect::Postgres), SqlDialect::PostgreSQL);
    }

    #[test]
    fn test_convert_dialect_names_round_trip() {
        for (cli, name) in [
            (Dialect::Generic, "generic"),
            (Dialect::Mysql, "mysql"),
            (Dialect::Sqlite, "sqlite"),
            (Dialect::Clickhouse, "clickhouse"),
            (Dialect::Bigquery, "bigquery"),
            (Dialect::Duckdb, "duckdb")
        ] {
            assert_eq!(convert_dialect(cli).name(), name);
        }
    }

    #[test]
    fn test_convert_format() {
        assert_eq!(convert_format(Format::Text), OutputFormat::Text);
        assert_eq!(convert_format(Format::Json), OutputFormat::Json);
        assert_eq!(convert_format(Format::Yaml), OutputFormat::Yaml);
    }
}
