use colored::Colorize;
use serde::Serialize;

use crate::{
    engine::{PolicyDecision, SyntaxReport},
    rewrite::LimitAction
};

/// Output format for results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml
}

/// Output options
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format:  OutputFormat,
    pub colored: bool
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format:  OutputFormat::Text,
            colored: true
        }
    }
}

/// One line of a batch run
#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    pub line:     usize,
    pub sql:      String,
    pub decision: PolicyDecision
}

/// Batch totals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total:    usize,
    pub accepted: usize,
    pub rejected: usize
}

impl BatchSummary {
    pub fn from_entries(entries: &[BatchEntry]) -> Self {
        let accepted = entries.iter().filter(|e| e.decision.is_accepted()).count();
        Self {
            total: entries.len(),
            accepted,
            rejected: entries.len() - accepted
        }
    }
}

#[derive(Debug, Serialize)]
struct BatchReport<'a> {
    summary: BatchSummary,
    results: &'a [BatchEntry]
}

fn serialize<T: Serialize>(value: &T, format: OutputFormat) -> Option<String> {
    match format {
        OutputFormat::Json => Some(serde_json::to_string_pretty(value).unwrap_or_default()),
        OutputFormat::Yaml => Some(serde_yaml::to_string(value).unwrap_or_default()),
        OutputFormat::Text => None
    }
}

fn paint(text: &str, colored: bool, style: fn(&str) -> colored::ColoredString) -> String {
    if colored {
        style(text).to_string()
    } else {
        text.to_string()
    }
}

fn push_list(out: &mut String, label: &str, items: &[String]) {
    if !items.is_empty() {
        out.push_str(&format!("{}: {}\n", label, items.join(", ")));
    }
}

/// Format one policy decision
pub fn format_decision(decision: &PolicyDecision, opts: &OutputOptions) -> String {
    if let Some(out) = serialize(decision, opts.format) {
        return out;
    }

    let mut out = String::new();
    match &decision.final_sql {
        Some(sql) => {
            out.push_str(&paint("ACCEPTED", opts.colored, |s| s.green().bold()));
            out.push('\n');
            out.push_str(sql);
            out.push('\n');
        }
        None => {
            out.push_str(&paint("REJECTED", opts.colored, |s| s.red().bold()));
            out.push('\n');
        }
    }

    if let Some(kind) = decision.statement_kind {
        out.push_str(&format!("Statement: {}\n", kind));
    }
    push_list(&mut out, "Tables", &decision.parsed_tables);
    push_list(&mut out, "Columns", &decision.parsed_columns);
    push_list(&mut out, "Functions", &decision.parsed_functions);

    let actions = &decision.applied_actions;
    if actions.limit_action != LimitAction::Unchanged
        && let Some(limit) = actions.effective_limit
    {
        out.push_str(&format!("Effective limit: {}\n", limit));
    }

    for violation in &decision.violations {
        let line = format!("  [{}] {}", violation.rule_id, violation.message);
        out.push_str(&paint(&line, opts.colored, |s| s.red()));
        out.push('\n');
    }
    for error in &decision.errors {
        out.push_str(&paint(&format!("  error: {}", error), opts.colored, |s| s.red()));
        out.push('\n');
    }
    for warning in &decision.warnings {
        let line = format!("  warning: {}", warning);
        out.push_str(&paint(&line, opts.colored, |s| s.yellow()));
        out.push('\n');
    }
    for modification in &decision.modifications {
        out.push_str(&format!("  ~ {}\n", modification));
    }
    out
}

/// Format a syntax-only report
pub fn format_syntax_report(report: &SyntaxReport, opts: &OutputOptions) -> String {
    if let Some(out) = serialize(report, opts.format) {
        return out;
    }

    let mut out = if report.syntax_valid {
        paint("VALID", opts.colored, |s| s.green().bold())
    } else {
        paint("INVALID", opts.colored, |s| s.red().bold())
    };
    out.push('\n');
    if let Some(kind) = report.statement_kind {
        out.push_str(&format!("Statement: {}\n", kind));
    }
    push_list(&mut out, "Tables", &report.parsed_tables);
    push_list(&mut out, "Columns", &report.parsed_columns);
    for error in &report.errors {
        out.push_str(&paint(&format!("  error: {}", error), opts.colored, |s| s.red()));
        out.push('\n');
    }
    for warning in &report.warnings {
        let line = format!("  warning: {}", warning);
        out.push_str(&paint(&line, opts.colored, |s| s.yellow()));
        out.push('\n');
    }
    out
}

/// Format batch results with totals
pub fn format_batch(entries: &[BatchEntry], opts: &OutputOptions) -> String {
    let summary = BatchSummary::from_entries(entries);
    let report = BatchReport {
        summary,
        results: entries
    };
    if let Some(out) = serialize(&report, opts.format) {
        return out;
    }

    let mut out = String::new();
    for entry in entries {
        let header = format!("Line {}:", entry.line);
        out.push_str(&paint(&header, opts.colored, |s| s.cyan().bold()));
        out.push('\n');
        out.push_str(&format_decision(&entry.decision, opts));
        out.push('\n');
    }
    let summary = &report.summary;
    out.push_str(&format!(
        "{} queries: {} accepted, {} rejected\n",
        summary.total, summary.accepted, summary.rejected
    ));
    out
}
