use super::{Rule, RuleContext, RuleInfo, Violation, ViolationKind};

/// Rejects references to banned tables and schemas
///
/// A bare policy entry matches the table name in any schema. A qualified
/// entry (`schema.table`) matches the same qualified reference and any less
/// qualified one, since the search path is unknown.
pub struct BannedTableOrSchema;

impl Rule for BannedTableOrSchema {
    fn info(&self) -> RuleInfo {
        RuleInfo {
            id:   "ACCESS001",
            name: "Banned table or schema"
        }
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Violation> {
        let info = self.info();
        let policy = ctx.policy;
        let mut violations = Vec::new();
        for table in &ctx.resolution.tables {
            let qualified = table.qualified();
            if policy.banned_table(&table.parts).is_some() {
                violations.push(info.violation(
                    ViolationKind::BannedTable,
                    qualified.clone(),
                    format!("Table '{}' is banned by policy", qualified)
                ));
            }
            if let Some(schema) = table.schema() {
                let namespace = table.namespace().unwrap_or_default();
                if policy.banned_schemas.contains(schema)
                    || policy.banned_schemas.contains(namespace.as_str())
                {
                    violations.push(info.violation(
                        ViolationKind::BannedSchema,
                        schema,
                        format!("Schema '{}' is banned by policy", schema)
                    ));
                }
            }
        }
        violations
    }
}

/// Rejects references to banned columns
///
/// Banned columns are a hard block and are never masked instead.
pub struct BannedColumn;

impl Rule for BannedColumn {
    fn info(&self) -> RuleInfo {
        RuleInfo {
            id:   "ACCESS002",
            name: "Banned column"
        }
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Violation> {
        let info = self.info();
        ctx.resolution
            .columns
            .iter()
            .filter_map(|column| {
                let table = column.table.as_ref().map(|t| t.parts.as_slice());
                ctx.policy
                    .banned_column(&column.name, table)
                    .map(|entry| {
                        info.violation(
                            ViolationKind::BannedColumn,
                            entry,
                            format!("Column '{}' is banned by policy", column)
                        )
                    })
            })
            .collect()
    }
}
