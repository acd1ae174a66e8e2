//! Configuration loading and management.
//!
//! Configuration is loaded from multiple sources with the following precedence
//! (highest to lowest):
//!
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. `.sql-guardrails.toml` in current directory
//! 4. `~/.config/sql-guardrails/config.toml`
//! 5. Default values
//!
//! # Configuration File Format
//!
//! ```toml
//! [engine]
//! dialect = "postgres"
//!
//! [policy]
//! path = "policies/analytics.toml"
//!
//! [logging]
//! filter = "sql_guardrails=debug"
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `SQL_GUARDRAILS_DIALECT` | Default SQL dialect |
//! | `SQL_GUARDRAILS_POLICY` | Default policy file |
//! | `SQL_GUARDRAILS_LOG` | `tracing` filter directive |

use std::{
    env, fs,
    path::{Path, PathBuf}
};

use serde::Deserialize;

use crate::{
    error::{AppResult, config_error},
    query::SqlDialect
};

pub const LOCAL_CONFIG: &str = ".sql-guardrails.toml";

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub engine:  EngineConfig,
    #[serde(default)]
    pub policy:  PolicyConfig,
    #[serde(default)]
    pub logging: LoggingConfig
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Dialect used when the command line gives none
    pub dialect: Option<String>
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct PolicyConfig {
    pub path: Option<PathBuf>
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    #[serde(default = "default_filter")]
    pub filter: String
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter()
        }
    }
}

fn default_filter() -> String {
    String::from("warn")
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> AppResult<Self> {
        let home = env::var_os("HOME").map(|home| {
            PathBuf::from(home)
                .join(".config")
                .join("sql-guardrails")
                .join("config.toml")
        });
        Self::load_from(home.as_deref(), Path::new(LOCAL_CONFIG), |key| {
            env::var(key).ok()
        })
    }

    /// Layer the given files and variable lookup over the defaults.
    ///
    /// A later file replaces an earlier one wholesale; variables override
    /// single fields.
    pub fn load_from(
        home: Option<&Path>,
        local: &Path,
        var: impl Fn(&str) -> Option<String>
    ) -> AppResult<Self> {
        let mut config = Self::default();

        for path in home.into_iter().chain([local]) {
            if path.exists() {
                let content = fs::read_to_string(path).map_err(|e| {
                    config_error(format!("Failed to read config file {}: {}", path.display(), e))
                })?;
                config = Self::from_toml_str(&content)?;
            }
        }

        if let Some(dialect) = var("SQL_GUARDRAILS_DIALECT") {
            config.engine.dialect = Some(dialect);
        }
        if let Some(policy) = var("SQL_GUARDRAILS_POLICY") {
            config.policy.path = Some(PathBuf::from(policy));
        }
        if let Some(filter) = var("SQL_GUARDRAILS_LOG") {
            config.logging.filter = filter;
        }

        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| config_error(format!("Invalid config file: {}", e)))
    }

    /// Configured dialect, validated
    pub fn dialect(&self) -> AppResult<Option<SqlDialect>> {
        self.engine
            .dialect
            .as_deref()
            .map(str::parse)
            .transpose()
    }
}
