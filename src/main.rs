//! # SQL Guardrails
//!
//! Fail-closed policy enforcement for untrusted, LLM-generated SQL.
//!
//! Every candidate query is parsed with the target dialect, resolved to the
//! catalog objects it reads or writes, checked against a per-catalog
//! security policy and, when allowed, rewritten with PII masking and row
//! limits. Anything the engine cannot fully analyze is rejected.
//!
//! # Quick Start
//!
//! ```bash
//! # Evaluate one query
//! sql-guardrails evaluate -p policy.toml --sql "SELECT email FROM users"
//!
//! # Read the query from stdin, JSON output
//! echo "SELECT * FROM orders" | sql-guardrails evaluate -p policy.toml --file - -f json
//!
//! # Syntax only
//! sql-guardrails validate --sql "SELECT 1" -d snowflake
//!
//! # Evaluate a JSONL file in parallel
//! sql-guardrails batch -p policy.toml -i queries.jsonl
//! ```
//!
//! # Policy File
//!
//! ```toml
//! catalog_id = "6f1c2d9e-8f0a-4f55-9a7e-0d3c1b2a4e5f"
//! allow_write = false
//! default_limit = 100
//! max_rows_returned = 1000
//! banned_tables = ["payroll"]
//! banned_columns = ["users.ssn"]
//! pii_tags = ["email", "*_phone"]
//! pii_masking_enabled = true
//! ```
//!
//! # Exit Codes
//!
//! - `0` - Query accepted (or syntax valid)
//! - `1` - Operational error (unreadable file, bad policy, unknown dialect)
//! - `2` - Query rejected (or syntax invalid)
//!
//! # Logging
//!
//! Diagnostics go to stderr through `tracing`. The filter comes from
//! `SQL_GUARDRAILS_LOG` or `[logging] filter` in the configuration file.

use std::process;

use clap::Parser;
use sql_guardrails::{app, cli::Cli, config::Config, error::AppResult};
use tracing_subscriber::EnvFilter;

fn main() {
    match run() {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run() -> AppResult<i32> {
    let cli = Cli::parse();
    let config = Config::load()?;
    init_tracing(&config.logging.filter);

    let output = app::run(cli, &config)?;
    println!("{}", output.stdout);
    Ok(output.exit_code)
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
