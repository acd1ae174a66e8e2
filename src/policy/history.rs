use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{IdentifierSet, SecurityPolicy};
use crate::error::{AppResult, policy_parse_error};

/// Partial policy change; absent fields keep the previous version's value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyUpdate {
    pub allow_write:         Option<bool>,
    pub default_limit:       Option<u64>,
    pub max_rows_returned:   Option<u64>,
    pub banned_tables:       Option<IdentifierSet>,
    pub banned_columns:      Option<IdentifierSet>,
    pub banned_schemas:      Option<IdentifierSet>,
    pub pii_tags:            Option<IdentifierSet>,
    pub pii_masking_enabled: Option<bool>,
    pub allowed_functions:   Option<IdentifierSet>,
    pub blocked_functions:   Option<IdentifierSet>,
    pub settings:            Option<BTreeMap<String, serde_json::Value>>
}

impl PolicyUpdate {
    fn apply_to(self, base: &SecurityPolicy) -> SecurityPolicy {
        SecurityPolicy {
            catalog_id:          base.catalog_id,
            allow_write:         self.allow_write.unwrap_or(base.allow_write),
            default_limit:       self.default_limit.or(base.default_limit),
            max_rows_returned:   self.max_rows_returned.or(base.max_rows_returned),
            banned_tables:       self
                .banned_tables
                .unwrap_or_else(|| base.banned_tables.clone()),
            banned_columns:      self
                .banned_columns
                .unwrap_or_else(|| base.banned_columns.clone()),
            banned_schemas:      self
                .banned_schemas
                .unwrap_or_else(|| base.banned_schemas.clone()),
            pii_tags:            self.pii_tags.unwrap_or_else(|| base.pii_tags.clone()),
            pii_masking_enabled: self
                .pii_masking_enabled
                .unwrap_or(base.pii_masking_enabled),
            allowed_functions:   self
                .allowed_functions
                .or_else(|| base.allowed_functions.clone()),
            blocked_functions:   self
                .blocked_functions
                .unwrap_or_else(|| base.blocked_functions.clone()),
            settings:            self.settings.unwrap_or_else(|| base.settings.clone()),
            created_by:          None,
            created_at:          None,
            deleted_at:          None,
            deleted_by:          None
        }
    }
}

/// Every version of one catalog's policy, oldest first.
///
/// At most one version is active (`deleted_at` unset).
#[derive(Debug, Clone, Serialize)]
pub struct PolicyHistory {
    catalog_id: Uuid,
    versions:   Vec<SecurityPolicy>
}

impl PolicyHistory {
    /// Empty history; the first update creates a version from defaults
    pub fn new(catalog_id: Uuid) -> Self {
        Self {
            catalog_id,
            versions: Vec::new()
        }
    }

    /// Rebuild a history from stored versions, checking its invariants
    pub fn from_versions(catalog_id: Uuid, versions: Vec<SecurityPolicy>) -> AppResult<Self> {
        let source = format!("history of catalog {}", catalog_id);
        if let Some(foreign) = versions.iter().find(|v| v.catalog_id != catalog_id) {
            return Err(policy_parse_error(
                &source,
                format!("version belongs to catalog {}", foreign.catalog_id)
            ));
        }
        let active = versions.iter().filter(|v| v.is_active()).count();
        if active > 1 {
            return Err(policy_parse_error(
                &source,
                format!("{} active versions, expected at most one", active)
            ));
        }
        Ok(Self {
            catalog_id,
            versions
        })
    }

    pub fn catalog_id(&self) -> Uuid {
        self.catalog_id
    }

    pub fn versions(&self) -> &[SecurityPolicy] {
        &self.versions
    }

    /// The single version without `deleted_at`
    pub fn active(&self) -> Option<&SecurityPolicy> {
        self.versions.iter().rev().find(|v| v.is_active())
    }

    /// Owned copy of the active version for one evaluation
    pub fn snapshot(&self) -> Option<SecurityPolicy> {
        self.active().cloned()
    }

    /// Soft-delete the active version and append the merged successor
    pub fn apply_update(
        &mut self,
        update: PolicyUpdate,
        actor: Uuid,
        now: DateTime<Utc>
    ) -> &SecurityPolicy {
        let base = self
            .snapshot()
            .unwrap_or_else(|| SecurityPolicy::new(self.catalog_id));
        for version in self.versions.iter_mut().filter(|v| v.is_active()) {
            version.deleted_at = Some(now);
            version.deleted_by = Some(actor);
        }
        let mut next = update.apply_to(&base);
        next.created_by = Some(actor);
        next.created_at = Some(now);
        tracing::info!(
            catalog_id = %self.catalog_id,
            version = self.versions.len() + 1,
            "Created new policy version"
        );
        let index = self.versions.len();
        self.versions.push(next);
        &self.versions[index]
    }
}
