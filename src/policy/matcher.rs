use compact_str::CompactString;
use indexmap::IndexSet;
use regex::{Regex, RegexBuilder};

use super::{IdentifierSet, SecurityPolicy};
use crate::{
    error::{AppResult, config_error},
    query::CaseFolding
};

/// Policy compiled for one dialect's identifier folding
#[derive(Debug, Clone)]
pub struct PolicyMatcher {
    pub allow_write:       bool,
    pub default_limit:     Option<u64>,
    pub max_rows:          Option<u64>,
    pub banned_tables:     IndexSet<CompactString>,
    pub banned_columns:    IndexSet<CompactString>,
    pub banned_schemas:    IndexSet<CompactString>,
    /// Uppercased; `None` means blacklist mode
    pub allowed_functions: Option<IndexSet<CompactString>>,
    pub blocked_functions: IndexSet<CompactString>,
    /// Present only when masking is enabled and tags exist
    pub pii:               Option<PiiMatcher>
}

impl PolicyMatcher {
    pub fn new(policy: &SecurityPolicy, folding: CaseFolding) -> AppResult<Self> {
        let pii = if policy.pii_masking_enabled && !policy.pii_tags.is_empty() {
            Some(PiiMatcher::new(&policy.pii_tags)?)
        } else {
            None
        };
        Ok(Self {
            allow_write: policy.allow_write,
            default_limit: policy.effective_default_limit(),
            max_rows: policy.effective_max_rows(),
            banned_tables: fold_set(&policy.banned_tables, folding),
            banned_columns: fold_set(&policy.banned_columns, folding),
            banned_schemas: fold_set(&policy.banned_schemas, folding),
            allowed_functions: policy
                .function_whitelist()
                .map(|set| fold_set(set, CaseFolding::Upper)),
            blocked_functions: fold_set(&policy.blocked_functions, CaseFolding::Upper),
            pii
        })
    }

    /// Banned table entry covering a reference
    ///
    /// Entry and reference match when one is a dotted suffix of the other:
    /// `payroll` covers `hr.payroll`, and `hr.payroll` covers a bare
    /// `payroll` that may resolve to it through the search path.
    pub fn banned_table(&self, parts: &[CompactString]) -> Option<&str> {
        self.banned_tables
            .iter()
            .map(CompactString::as_str)
            .find(|entry| covers(entry, parts))
    }

    /// Banned entry matching a column; the bare name wins over `table.column`
    pub fn banned_column(&self, name: &str, table: Option<&[CompactString]>) -> Option<String> {
        if self.banned_columns.contains(name) {
            return Some(name.to_string());
        }
        self.banned_columns
            .iter()
            .find(|entry| match entry.rsplit_once('.') {
                Some((entry_table, column)) if column == name => match table {
                    Some(parts) => covers(entry_table, parts),
                    // Unbound: any qualified entry for this column name applies
                    None => true
                },
                _ => false
            })
            .map(ToString::to_string)
    }
}

/// Whether the shorter of `entry` and `parts` is a dotted suffix of the other
fn covers(entry: &str, parts: &[CompactString]) -> bool {
    entry
        .rsplit('.')
        .zip(parts.iter().rev())
        .all(|(expected, part)| expected == part.as_str())
}

/// Re-fold policy entries per dotted segment
fn fold_set(set: &IdentifierSet, folding: CaseFolding) -> IndexSet<CompactString> {
    set.iter()
        .map(|entry| {
            entry
                .split('.')
                .map(|part| folding.fold(part))
                .collect::<Vec<_>>()
                .join(".")
                .into()
        })
        .collect()
}

/// Case-insensitive PII column-name patterns; `*` matches any run of characters
#[derive(Debug, Clone)]
pub struct PiiMatcher {
    patterns: Vec<Regex>
}

impl PiiMatcher {
    pub fn new(tags: &IdentifierSet) -> AppResult<Self> {
        let patterns = tags
            .iter()
            .map(|tag| {
                let escaped = tag
                    .split('*')
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join(".*");
                RegexBuilder::new(&format!("^{}$", escaped))
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| config_error(format!("Invalid PII tag '{}': {}", tag, e)))
            })
            .collect::<AppResult<Vec<_>>>()?;
        Ok(Self {
            patterns
        })
    }

    pub fn is_match(&self, column: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(column))
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn policy() -> SecurityPolicy {
        let mut policy = SecurityPolicy::new(Uuid::nil());
        policy.banned_columns = ["password", "users.ssn"].into_iter().collect();
        policy.pii_tags = ["email", "*_phone"].into_iter().collect();
        policy.pii_masking_enabled = true;
        policy
    }

    #[test]
    fn test_pii_wildcard_pattern() {
        let matcher = PolicyMatcher::new(&policy(), CaseFolding::Lower).unwrap();
        let pii = matcher.pii.unwrap();
        assert!(pii.is_match("EMAIL"));
        assert!(pii.is_match("home_phone"));
        assert!(!pii.is_match("phone_book"));
    }

    #[test]
    fn test_banned_column_qualified_entry() {
        let matcher = PolicyMatcher::new(&policy(), CaseFolding::Lower).unwrap();
        let users = [CompactString::from("public"), CompactString::from("users")];
        assert_eq!(matcher.banned_column("ssn", Some(&users)), Some("users.ssn".to_string()));
        let orders = [CompactString::from("orders")];
        assert_eq!(matcher.banned_column("ssn", Some(&orders)), None);
        assert_eq!(matcher.banned_column("ssn", None), Some("users.ssn".to_string()));
    }

    #[test]
    fn test_qualified_entry_covers_less_qualified_reference() {
        let mut policy = policy();
        policy.banned_tables = ["public.users", "payroll"].into_iter().collect();
        policy.banned_columns = ["hr.staff.salary"].into_iter().collect();
        let matcher = PolicyMatcher::new(&policy, CaseFolding::Lower).unwrap();

        let users = [CompactString::from("users")];
        assert_eq!(matcher.banned_table(&users), Some("public.users"));
        let other = [CompactString::from("audit"), CompactString::from("users")];
        assert_eq!(matcher.banned_table(&other), None);
        let payroll = [
            CompactString::from("db"),
            CompactString::from("hr"),
            CompactString::from("payroll")
        ];
        assert_eq!(matcher.banned_table(&payroll), Some("payroll"));

        let staff = [CompactString::from("staff")];
        assert_eq!(
            matcher.banned_column("salary", Some(&staff)),
            Some("hr.staff.salary".to_string())
        );
        let sales = [CompactString::from("sales"), CompactString::from("staff")];
        assert_eq!(matcher.banned_column("salary", Some(&sales)), None);
    }

    #[test]
    fn test_upper_folding_for_snowflake() {
        let matcher = PolicyMatcher::new(&policy(), CaseFolding::Upper).unwrap();
        assert!(matcher.banned_columns.contains("PASSWORD"));
    }
}
