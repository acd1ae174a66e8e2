// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use clap::Parser;
use sql_guardrails::cli::{Cli, Commands, Dialect, Format};

#[test]
fn test_evaluate_with_inline_sql() {
    let cli = Cli::try_parse_from([
        "sql-guardrails",
        "evaluate",
        "-p",
        "policy.toml",
        "--sql",
        "SELECT 1",
        "-d",
        "snowflake",
        "-f",
        "json"
    ])
    .unwrap();
    match cli.command {
        Commands::Evaluate {
            policy,
            input,
            dialect,
            output_format,
            ..
        } => {
            assert_eq!(policy.unwrap().to_str(), Some("policy.toml"));
            assert_eq!(input.sql.as_deref(), Some("SELECT 1"));
            assert!(matches!(dialect, Some(Dialect::Snowflake)));
            assert!(matches!(output_format, Format::Json));
        }
        other => panic!("unexpected command: {:?}", other)
    }
}

#[test]
fn test_dialect_alias() {
    let cli = Cli::try_parse_from([
        "sql-guardrails",
        "validate",
        "--sql",
        "SELECT 1",
        "--dialect",
        "postgresql"
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Commands::Validate {
            dialect: Some(Dialect::Postgres),
            ..
        }
    ));
}

#[test]
fn test_sql_and_file_conflict() {
    let result = Cli::try_parse_from([
        "sql-guardrails",
        "validate",
        "--sql",
        "SELECT 1",
        "--file",
        "q.sql"
    ]);
    assert!(result.is_err());
}

#[test]
fn test_sql_input_required() {
    assert!(Cli::try_parse_from(["sql-guardrails", "validate"]).is_err());
}

#[test]
fn test_catalog_must_be_uuid() {
    let result = Cli::try_parse_from([
        "sql-guardrails",
        "evaluate",
        "--sql",
        "SELECT 1",
        "--catalog",
        "not-a-uuid"
    ]);
    assert!(result.is_err());
}

#[test]
fn test_batch_defaults_to_json() {
    let cli = Cli::try_parse_from(["sql-guardrails", "batch", "-i", "queries.jsonl"]).unwrap();
    match cli.command {
        Commands::Batch {
            output_format,
            quiet,
            ..
        } => {
            assert!(matches!(output_format, Format::Json));
            assert!(!quiet);
        }
        other => panic!("unexpected command: {:?}", other)
    }
}

#[test]
fn test_unknown_dialect_rejected() {
    let result = Cli::try_parse_from([
        "sql-guardrails",
        "validate",
        "--sql",
        "SELECT 1",
        "-d",
        "oracle"
    ]);
    assert!(result.is_err());
}
