//! Policy rule engine.
//!
//! Rules are pure checks of a statement's [`Resolution`] against a compiled
//! [`PolicyMatcher`]. The write gate runs first and, when it fires, is the
//! only rule reported; the remaining rules run in a fixed order and their
//! violations are de-duplicated in first-seen order.
//!
//! # Rules
//!
//! - `WRITE001` - write statement blocked by a read-only policy
//! - `ACCESS001` - banned table or schema
//! - `ACCESS002` - banned column
//! - `FUNC001` - function outside the whitelist or on the blacklist
//! - `PARSE001` - construct the resolver cannot see through

mod access;
mod construct;
mod functions;
mod types;
mod write;

use indexmap::IndexSet;
pub use types::{RuleInfo, Violation, ViolationKind};

use crate::{policy::PolicyMatcher, resolve::Resolution};

/// Input shared by every rule
pub struct RuleContext<'a> {
    pub resolution: &'a Resolution,
    pub policy:     &'a PolicyMatcher
}

/// Trait for implementing policy rules.
///
/// Rules are stateless and must be `Send + Sync` so one runner can serve
/// parallel evaluations.
pub trait Rule: Send + Sync {
    /// Returns metadata about this rule.
    fn info(&self) -> RuleInfo;

    /// Returns every violation of this rule, empty when the statement passes.
    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Violation>;
}

/// Ordered rule execution.
pub struct RuleRunner {
    gate:  Box<dyn Rule>,
    rules: Vec<Box<dyn Rule>>
}

impl Default for RuleRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleRunner {
    /// Create a runner with every built-in rule
    pub fn new() -> Self {
        Self {
            gate:  Box::new(write::WriteBlocked),
            rules: vec![
                Box::new(access::BannedTableOrSchema),
                Box::new(access::BannedColumn),
                Box::new(functions::FunctionRestriction),
                Box::new(construct::UnanalyzableConstruct)
            ]
        }
    }

    /// Metadata of every rule in execution order
    pub fn rules(&self) -> Vec<RuleInfo> {
        std::iter::once(&self.gate)
            .chain(&self.rules)
            .map(|rule| rule.info())
            .collect()
    }

    /// Run all rules; empty result means the statement is allowed
    pub fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Violation> {
        let blocked = self.gate.check(ctx);
        if !blocked.is_empty() {
            tracing::debug!(rule = self.gate.info().id, "Write gate rejected statement");
            return dedup(blocked);
        }
        let violations = self
            .rules
            .iter()
            .flat_map(|rule| {
                let found = rule.check(ctx);
                if !found.is_empty() {
                    tracing::debug!(rule = rule.info().id, count = found.len(), "Rule fired");
                }
                found
            })
            .collect();
        dedup(violations)
    }
}

fn dedup(violations: Vec<Violation>) -> Vec<Violation> {
    violations
        .into_iter()
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}
