use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use uuid::Uuid;

/// SQL Guardrails - Enforce safety policies on untrusted SQL before it runs
#[derive(Parser, Debug)]
#[command(name = "sql-guardrails")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate one query against a policy
    Evaluate {
        /// Path to policy file (TOML, JSON or YAML)
        #[arg(short, long, env = "SQL_GUARDRAILS_POLICY")]
        policy: Option<PathBuf>,

        #[command(flatten)]
        input: SqlInput,

        /// SQL dialect for parsing
        #[arg(short, long, value_enum)]
        dialect: Option<Dialect>,

        /// Catalog the query targets (defaults to the policy's catalog)
        #[arg(long)]
        catalog: Option<Uuid>,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        output_format: Format,

        /// Disable colored output
        #[arg(long)]
        no_color: bool
    },

    /// Check syntax only, without a policy
    Validate {
        #[command(flatten)]
        input: SqlInput,

        /// SQL dialect for parsing
        #[arg(short, long, value_enum)]
        dialect: Option<Dialect>,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        output_format: Format,

        /// Disable colored output
        #[arg(long)]
        no_color: bool
    },

    /// Evaluate a JSONL file of queries in parallel
    Batch {
        /// Path to policy file (TOML, JSON or YAML)
        #[arg(short, long, env = "SQL_GUARDRAILS_POLICY")]
        policy: Option<PathBuf>,

        /// JSONL file, one `{"sql": ..., "dialect": ...}` object per line (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Dialect for lines that do not name one
        #[arg(short, long, value_enum)]
        dialect: Option<Dialect>,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "json")]
        output_format: Format,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool
    }
}

/// Where the SQL text comes from
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct SqlInput {
    /// SQL text
    #[arg(short, long)]
    pub sql: Option<String>,

    /// Path to SQL file (use - for stdin)
    #[arg(long)]
    pub file: Option<PathBuf>
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Dialect {
    Generic,
    #[value(alias = "postgresql", alias = "pg")]
    Postgres,
    Mysql,
    Sqlite,
    Clickhouse,
    Snowflake,
    Bigquery,
    Duckdb
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Format {
    Text,
    Json,
    Yaml
}
