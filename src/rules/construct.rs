use super::{Rule, RuleContext, RuleInfo, Violation, ViolationKind};

/// Rejects statements containing constructs the resolver cannot analyze
///
/// A wildcard over a catalog table counts as one while banned columns are
/// configured, since its columns are unknown without a schema.
pub struct UnanalyzableConstruct;

impl Rule for UnanalyzableConstruct {
    fn info(&self) -> RuleInfo {
        RuleInfo {
            id:   "PARSE001",
            name: "Unanalyzable construct"
        }
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Violation> {
        let info = self.info();
        let mut violations: Vec<Violation> = ctx
            .resolution
            .unanalyzable
            .iter()
            .map(|construct| {
                info.violation(
                    ViolationKind::UnanalyzableConstruct,
                    construct.as_str(),
                    format!("Cannot verify {} against the policy", construct)
                )
            })
            .collect();
        if ctx.resolution.has_wildcard && !ctx.policy.banned_columns.is_empty() {
            violations.push(info.violation(
                ViolationKind::UnanalyzableConstruct,
                "wildcard projection",
                "Cannot verify wildcard projection against banned columns without a schema"
                    .to_string()
            ));
        }
        violations
    }
}
