//! Application logic for the SQL Guardrails CLI.
//!
//! Kept apart from `main` so every command can be driven from tests. Each
//! `run_*` function returns the text to print and the process exit code.

mod batch;
mod convert;
mod evaluate;
mod helpers;
mod types;

pub use batch::run_batch;
pub use convert::{convert_dialect, convert_format};
pub use evaluate::{run_evaluate, run_validate};
pub use helpers::{
    calculate_exit_code, create_output_options, parse_batch_lines, read_path_or_stdin,
    read_sql_input, resolve_dialect, resolve_policy, syntax_exit_code
};
pub use types::{BatchLine, BatchParams, CommandOutput, EvaluateParams, ValidateParams};

use crate::{
    cli::{Cli, Commands},
    config::Config,
    error::AppResult
};

/// Dispatch a parsed command line
pub fn run(cli: Cli, config: &Config) -> AppResult<CommandOutput> {
    match cli.command {
        Commands::Evaluate {
            policy,
            input,
            dialect,
            catalog,
            output_format,
            no_color
        } => run_evaluate(
            EvaluateParams {
                policy_path: policy,
                input,
                dialect,
                catalog,
                output_format,
                no_color
            },
            config
        ),
        Commands::Validate {
            input,
            dialect,
            output_format,
            no_color
        } => run_validate(
            ValidateParams {
                input,
                dialect,
                output_format,
                no_color
            },
            config
        ),
        Commands::Batch {
            policy,
            input,
            dialect,
            output_format,
            quiet,
            no_color
        } => run_batch(
            BatchParams {
                policy_path: policy,
                input_path: input,
                dialect,
                output_format,
                quiet,
                no_color
            },
            config
        )
    }
}
