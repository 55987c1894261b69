//! Configuration for the Warden gate.
//!
//! ```toml
//! violation_log_level = "debug"
//! catch_sink_panics = true
//!
//! [audit]
//! enabled = true
//! max_entries_per_domain = 100
//! max_domains = 1024
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Log level used when reporting access violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[serde(alias = "warning")]
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    /// Case-insensitive; accepts `warning`/`warn` and `error`/`err`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warn),
            "error" | "err" => Ok(Self::Error),
            other => Err(ConfigError::Invalid(format!("unknown log level '{}'", other))),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// In-memory audit trail configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuditConfig {
    /// Whether denials are also recorded in the in-memory audit log
    #[serde(default)]
    pub enabled: bool,

    /// Maximum number of entries kept per protection domain
    #[serde(default = "default_max_entries_per_domain")]
    pub max_entries_per_domain: usize,

    /// Maximum number of protection domains tracked; the oldest is evicted first
    #[serde(default = "default_max_domains")]
    pub max_domains: usize,
}

fn default_max_entries_per_domain() -> usize {
    100
}

fn default_max_domains() -> usize {
    1024
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_entries_per_domain: default_max_entries_per_domain(),
            max_domains: default_max_domains(),
        }
    }
}

/// Gate configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GateConfig {
    /// Level at which access violations are logged
    #[serde(default = "default_violation_log_level")]
    pub violation_log_level: LogLevel,

    /// Whether a panicking violation sink is contained instead of unwinding
    /// through the decision
    #[serde(default = "default_catch_sink_panics")]
    pub catch_sink_panics: bool,

    /// Audit trail configuration
    #[serde(default)]
    pub audit: AuditConfig,
}

fn default_violation_log_level() -> LogLevel {
    LogLevel::Debug
}

fn default_catch_sink_panics() -> bool {
    true
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            violation_log_level: default_violation_log_level(),
            catch_sink_panics: default_catch_sink_panics(),
            audit: AuditConfig::default(),
        }
    }
}

impl GateConfig {
    /// Parse and validate a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: GateConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file, or the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::LoadFailed {
            path: path.display().to_string(),
            source,
        })?;

        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded gate configuration");
        Ok(config)
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.audit.max_entries_per_domain == 0 {
            return Err(ConfigError::Invalid(
                "audit.max_entries_per_domain must be greater than zero".to_string(),
            ));
        }
        if self.audit.max_domains == 0 {
            return Err(ConfigError::Invalid(
                "audit.max_domains must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
