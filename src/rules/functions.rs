use super::{Rule, RuleContext, RuleInfo, Violation, ViolationKind};

/// Enforces the function whitelist, or the blacklist when no whitelist is set
///
/// Whitelist entries must match the full qualified name. A blacklist entry
/// matches the qualified name or its last segment, so `PG_SLEEP` also
/// blocks `PG_CATALOG.PG_SLEEP`.
pub struct FunctionRestriction;

impl Rule for FunctionRestriction {
    fn info(&self) -> RuleInfo {
        RuleInfo {
            id:   "FUNC001",
            name: "Function restriction"
        }
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Violation> {
        let info = self.info();
        let policy = ctx.policy;
        ctx.resolution
            .functions
            .iter()
            .filter(|name| match &policy.allowed_functions {
                Some(allowed) => !allowed.contains(name.as_str()),
                None => {
                    let last = name.rsplit('.').next().unwrap_or(name.as_str());
                    policy.blocked_functions.contains(name.as_str())
                        || policy.blocked_functions.contains(last)
                }
            })
            .map(|name| {
                let reason = if policy.allowed_functions.is_some() {
                    "is not in the allowed function list"
                } else {
                    "is blocked by policy"
                };
                info.violation(
                    ViolationKind::DisallowedFunction,
                    name.as_str(),
                    format!("Function '{}' {}", name, reason)
                )
            })
            .collect()
    }
}
