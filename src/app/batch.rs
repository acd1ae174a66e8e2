//! JSONL batch evaluation.

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use super::{
    helpers::{
        create_output_options, parse_batch_lines, read_path_or_stdin, resolve_dialect,
        resolve_policy
    },
    types::{BatchParams, CommandOutput}
};
use crate::{
    config::Config,
    engine::evaluate,
    error::AppResult,
    output::{BatchEntry, BatchSummary, format_batch}
};

/// Evaluates every line of a JSONL file in parallel.
///
/// Results keep input order. Exit code is `2` when any query is rejected.
pub fn run_batch(params: BatchParams, config: &Config) -> AppResult<CommandOutput> {
    let policy = resolve_policy(params.policy_path, config)?;
    let dialect = resolve_dialect(params.dialect, config)?;
    let content = read_path_or_stdin(&params.input_path)?;
    let candidates = parse_batch_lines(&content, dialect, policy.catalog_id)?;
    tracing::info!(queries = candidates.len(), "Starting batch evaluation");

    let pb = if params.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(candidates.len() as u64)
    };
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message("Evaluating queries...");

    let entries: Vec<BatchEntry> = candidates
        .into_par_iter()
        .map(|(line, candidate)| {
            let decision = evaluate(&candidate, &policy);
            pb.inc(1);
            BatchEntry {
                line,
                sql: candidate.sql,
                decision
            }
        })
        .collect();
    pb.finish_and_clear();

    let summary = BatchSummary::from_entries(&entries);
    tracing::info!(
        accepted = summary.accepted,
        rejected = summary.rejected,
        "Batch evaluation finished"
    );
    let opts = create_output_options(params.output_format, params.no_color);

    Ok(CommandOutput {
        exit_code: if summary.rejected > 0 { 2 } else { 0 },
        stdout:    format_batch(&entries, &opts)
    })
}
