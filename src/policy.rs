//! Per-catalog security policy.
//!
//! A [`SecurityPolicy`] is one immutable version of a catalog's rules. The
//! engine only ever reads a snapshot; [`PolicyHistory`] models the
//! update-as-new-version lifecycle around it.
//!
//! # File Format
//!
//! ```toml
//! catalog_id = "6f1c2a3e-0d4b-4c55-9a51-6f3c1f7e2b10"
//! allow_write = false
//! default_limit = 1000
//! max_rows_returned = 5000
//! banned_tables = ["audit_log", "secrets.api_keys"]
//! banned_columns = ["password", "users.ssn"]
//! banned_schemas = ["internal"]
//! pii_tags = ["email", "*_phone"]
//! pii_masking_enabled = true
//! blocked_functions = ["PG_SLEEP", "LOAD_FILE"]
//! ```

mod history;
mod matcher;

use std::{collections::BTreeMap, fs, path::Path};

use chrono::{DateTime, Utc};
use compact_str::CompactString;
pub use history::{PolicyHistory, PolicyUpdate};
use indexmap::IndexSet;
pub use matcher::{PiiMatcher, PolicyMatcher};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppResult, file_read_error, policy_parse_error};

/// Row limit applied to newly created policies
pub const DEFAULT_ROW_LIMIT: u64 = 1000;

/// Set of case-folded identifiers, kept in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct IdentifierSet(IndexSet<CompactString>);

impl IdentifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.0.contains(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(CompactString::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<S: AsRef<str>> FromIterator<S> for IdentifierSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .map(CompactString::from)
                .collect()
        )
    }
}

impl From<Vec<String>> for IdentifierSet {
    fn from(values: Vec<String>) -> Self {
        values.into_iter().collect()
    }
}

impl From<IdentifierSet> for Vec<String> {
    fn from(set: IdentifierSet) -> Self {
        set.0.into_iter().map(String::from).collect()
    }
}

/// One version of a catalog's security policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityPolicy {
    pub catalog_id:          Uuid,
    #[serde(default)]
    pub allow_write:         bool,
    #[serde(default)]
    pub default_limit:       Option<u64>,
    #[serde(default)]
    pub max_rows_returned:   Option<u64>,
    #[serde(default)]
    pub banned_tables:       IdentifierSet,
    #[serde(default)]
    pub banned_columns:      IdentifierSet,
    #[serde(default)]
    pub banned_schemas:      IdentifierSet,
    #[serde(default)]
    pub pii_tags:            IdentifierSet,
    #[serde(default)]
    pub pii_masking_enabled: bool,
    #[serde(default)]
    pub allowed_functions:   Option<IdentifierSet>,
    #[serde(default)]
    pub blocked_functions:   IdentifierSet,
    #[serde(default)]
    pub settings:            BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub created_by:          Option<Uuid>,
    #[serde(default)]
    pub created_at:          Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted_at:          Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted_by:          Option<Uuid>
}

impl SecurityPolicy {
    /// Read-only policy with the default row limit
    pub fn new(catalog_id: Uuid) -> Self {
        Self {
            catalog_id,
            allow_write: false,
            default_limit: Some(DEFAULT_ROW_LIMIT),
            max_rows_returned: None,
            banned_tables: IdentifierSet::new(),
            banned_columns: IdentifierSet::new(),
            banned_schemas: IdentifierSet::new(),
            pii_tags: IdentifierSet::new(),
            pii_masking_enabled: false,
            allowed_functions: None,
            blocked_functions: IdentifierSet::new(),
            settings: BTreeMap::new(),
            created_by: None,
            created_at: None,
            deleted_at: None,
            deleted_by: None
        }
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// `default_limit`, with `0` meaning unset
    pub fn effective_default_limit(&self) -> Option<u64> {
        self.default_limit.filter(|&n| n > 0)
    }

    /// `max_rows_returned`, with `0` meaning unset
    pub fn effective_max_rows(&self) -> Option<u64> {
        self.max_rows_returned.filter(|&n| n > 0)
    }

    /// Whitelist mode is on when the allow-list is present and non-empty
    pub fn function_whitelist(&self) -> Option<&IdentifierSet> {
        self.allowed_functions.as_ref().filter(|s| !s.is_empty())
    }

    /// Parse a policy document; the format follows the file extension
    pub fn from_str_with_format(content: &str, format: PolicyFormat) -> Result<Self, String> {
        match format {
            PolicyFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            PolicyFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            PolicyFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string())
        }
    }
}

/// Serialization format of a policy file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyFormat {
    Toml,
    Json,
    Yaml
}

impl PolicyFormat {
    /// Pick the format from a file extension, TOML when unknown
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("json") => Self::Json,
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Toml
        }
    }
}

/// Load a policy snapshot from a TOML, JSON or YAML file
pub fn load_policy(path: &Path) -> AppResult<SecurityPolicy> {
    let shown = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|e| file_read_error(&shown, e))?;
    let policy = SecurityPolicy::from_str_with_format(&content, PolicyFormat::from_path(path))
        .map_err(|e| policy_parse_error(&shown, e))?;
    tracing::debug!(
        path = %shown,
        catalog_id = %policy.catalog_id,
        "Loaded security policy"
    );
    Ok(policy)
}
