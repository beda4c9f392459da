//! Configuration type definitions.

use serde::{Deserialize, Serialize};

/// Root configuration structure.
///
/// Only the `target` section belongs to this crate; the embedding migration
/// driver may carry additional sections in the same file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Target database configuration (MySQL).
    pub target: TargetConfig,
}

/// Target database (MySQL) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Database adapter (always "mysql" for now).
    #[serde(default = "default_mysql")]
    pub adapter: String,

    /// Database host.
    pub host: String,

    /// Database port (default: 3306).
    #[serde(default = "default_mysql_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password. Never serialized back out.
    #[serde(skip_serializing)]
    pub password: String,

    /// Prefix prepended to every logical table name (default: empty).
    #[serde(default)]
    pub tables_prefix: String,

    /// Connection charset (default: "utf8mb4").
    #[serde(default = "default_charset")]
    pub charset: String,

    /// Write mode (default: live). Fixed for the lifetime of an adapter;
    /// there is no way to toggle dry run after construction.
    #[serde(default)]
    pub mode: WriteMode,
}

impl TargetConfig {
    /// Apply caller-supplied overrides on top of this configuration.
    /// Only fills in values that were explicitly set in the overrides.
    pub fn with_overrides(mut self, overrides: TargetOverrides) -> Self {
        if let Some(adapter) = overrides.adapter {
            self.adapter = adapter;
        }
        if let Some(host) = overrides.host {
            self.host = host;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(database) = overrides.database {
            self.database = database;
        }
        if let Some(user) = overrides.user {
            self.user = user;
        }
        if let Some(password) = overrides.password {
            self.password = password;
        }
        if let Some(tables_prefix) = overrides.tables_prefix {
            self.tables_prefix = tables_prefix;
        }
        if let Some(charset) = overrides.charset {
            self.charset = charset;
        }
        if let Some(mode) = overrides.mode {
            self.mode = mode;
        }
        self
    }

    /// Short endpoint description for logs and error context.
    pub fn endpoint(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}

impl std::fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetConfig")
            .field("adapter", &self.adapter)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("tables_prefix", &self.tables_prefix)
            .field("charset", &self.charset)
            .field("mode", &self.mode)
            .finish()
    }
}

/// Partial target configuration for caller-supplied overrides.
/// All fields use Option<T> to distinguish between "not set" (keep the
/// base value) and "explicitly set" (use the provided value).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetOverrides {
    #[serde(default)]
    pub adapter: Option<String>,

    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub database: Option<String>,

    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub tables_prefix: Option<String>,

    #[serde(default)]
    pub charset: Option<String>,

    #[serde(default)]
    pub mode: Option<WriteMode>,
}

/// Write mode for the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Execute every statement against the target.
    #[default]
    Live,

    /// Suppress mutating statements; existence checks and reads still run.
    DryRun,
}

impl WriteMode {
    /// Whether mutating statements are suppressed.
    pub fn is_dry_run(&self) -> bool {
        matches!(self, WriteMode::DryRun)
    }
}

// Default value functions for serde
fn default_mysql() -> String {
    "mysql".to_string()
}

fn default_mysql_port() -> u16 {
    3306
}

fn default_charset() -> String {
    "utf8mb4".to_string()
}
