//! Single-query commands: `evaluate` and `validate`.

use uuid::Uuid;

use super::{
    helpers::{
        calculate_exit_code, create_output_options, read_sql_input, resolve_dialect,
        resolve_policy, syntax_exit_code
    },
    types::{CommandOutput, EvaluateParams, ValidateParams}
};
use crate::{
    config::Config,
    engine::{evaluate, validate_syntax},
    error::AppResult,
    output::{format_decision, format_syntax_report},
    query::CandidateQuery
};

/// Evaluates one query against the policy.
///
/// The candidate targets the policy's own catalog unless `--catalog` names
/// another one, in which case the engine rejects it.
///
/// # Errors
///
/// Returns an error if the policy or SQL cannot be read, or the dialect is
/// unknown. Rejections are not errors.
///
/// # Example
///
/// ```no_run
/// use sql_guardrails::{
///     app::{EvaluateParams, run_evaluate},
///     cli::{Format, SqlInput},
///     config::Config
/// };
///
/// let params = EvaluateParams {
///     policy_path:   Some("policy.toml".into()),
///     input:         SqlInput {
///         sql:  Some("SELECT * FROM orders".to_string()),
///         file: None
///     },
///     dialect:       None,
///     catalog:       None,
///     output_format: Format::Text,
///     no_color:      false
/// };
/// let output = run_evaluate(params, &Config::default())?;
/// println!("{}", output.stdout);
/// # Ok::<(), sql_guardrails::error::AppError>(())
/// ```
pub fn run_evaluate(params: EvaluateParams, config: &Config) -> AppResult<CommandOutput> {
    let policy = resolve_policy(params.policy_path, config)?;
    let dialect = resolve_dialect(params.dialect, config)?;
    let sql = read_sql_input(&params.input)?;
    let catalog_id = params.catalog.unwrap_or(policy.catalog_id);

    let decision = evaluate(&CandidateQuery::new(sql, dialect, catalog_id), &policy);
    let opts = create_output_options(params.output_format, params.no_color);

    Ok(CommandOutput {
        exit_code: calculate_exit_code(&decision),
        stdout:    format_decision(&decision, &opts)
    })
}

/// Checks syntax without a policy
pub fn run_validate(params: ValidateParams, config: &Config) -> AppResult<CommandOutput> {
    let dialect = resolve_dialect(params.dialect, config)?;
    let sql = read_sql_input(&params.input)?;

    let report = validate_syntax(&CandidateQuery::new(sql, dialect, Uuid::nil()));
    let opts = create_output_options(params.output_format, params.no_color);

    Ok(CommandOutput {
        exit_code: syntax_exit_code(&report),
        stdout:    format_syntax_report(&report, &opts)
    })
}
