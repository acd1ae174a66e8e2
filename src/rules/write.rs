use super::{Rule, RuleContext, RuleInfo, Violation, ViolationKind};

/// Blocks data and schema modification under a read-only policy
///
/// Covers the top-level statement and any write nested inside a query,
/// such as a data-modifying CTE.
pub struct WriteBlocked;

impl Rule for WriteBlocked {
    fn info(&self) -> RuleInfo {
        RuleInfo {
            id:   "WRITE001",
            name: "Write statement blocked"
        }
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Violation> {
        if ctx.policy.allow_write {
            return vec![];
        }
        let info = self.info();
        let resolution = ctx.resolution;
        let top_level = Some(resolution.statement_kind).filter(|kind| kind.is_write());
        top_level
            .into_iter()
            .chain(resolution.nested_writes.iter().copied())
            .map(|kind| {
                info.violation(
                    ViolationKind::WriteBlocked,
                    kind.as_str(),
                    format!("{} statements are not allowed by a read-only policy", kind)
                )
            })
            .collect()
    }
}
