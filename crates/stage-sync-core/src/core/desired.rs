// crates/stage-sync-core/src/core/desired.rs
// ============================================================================
// Module: Desired Stage Configuration
// Description: Typed desired settings and tags for one stage reconciliation.
// Purpose: Replace loosely shaped option bags with named optional fields.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`DesiredStageConfig`] is built once per run from the deployment descriptor
//! and is never mutated afterwards. Every optional field documents what
//! happens when it is unset. `logs = None` means REST API logging is not
//! configured at all, which also means access logging is off.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Log Level
// ============================================================================

/// Execution log level applied to every method of the stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Informational and error events.
    #[default]
    Info,
    /// Error events only.
    Error,
    /// Execution logging disabled.
    Off,
}

impl LogLevel {
    /// Returns the wire form used in patch operations.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Error => "ERROR",
            Self::Off => "OFF",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Tag Values
// ============================================================================

/// Stack-level tag value; descriptors may carry numbers and booleans as well
/// as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    /// Boolean tag value, written as `true` or `false`.
    Bool(bool),
    /// Integer tag value.
    Integer(i64),
    /// Floating point tag value.
    Float(f64),
    /// String tag value.
    Text(String),
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => value.fmt(f),
            Self::Integer(value) => value.fmt(f),
            Self::Float(value) => value.fmt(f),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<bool> for TagValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for TagValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

// ============================================================================
// SECTION: REST API Logging
// ============================================================================

/// REST API logging settings (the descriptor's `logs.restApi` block).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestApiLogging {
    /// Access logging to the conventional log group. Defaults to `true`.
    #[serde(default = "default_true")]
    pub access_logging: bool,
    /// Access log format; the verbose default template is used when unset.
    #[serde(default)]
    pub access_log_format: Option<String>,
    /// Execution logging; `Some(false)` forces the log level to `OFF`.
    #[serde(default)]
    pub execution_logging: Option<bool>,
    /// Execution log level; `INFO` when unset.
    #[serde(default)]
    pub log_level: Option<LogLevel>,
    /// Full request/response data tracing; `true` when unset.
    #[serde(default)]
    pub full_execution_data: Option<bool>,
}

impl Default for RestApiLogging {
    fn default() -> Self {
        Self {
            access_logging: true,
            access_log_format: None,
            execution_logging: None,
            log_level: None,
            full_execution_data: None,
        }
    }
}

impl RestApiLogging {
    /// Returns the effective execution log level.
    #[must_use]
    pub fn effective_log_level(&self) -> LogLevel {
        if self.execution_logging == Some(false) {
            return LogLevel::Off;
        }
        self.log_level.unwrap_or_default()
    }

    /// Returns the effective data trace flag.
    #[must_use]
    pub fn effective_data_trace(&self) -> bool {
        self.full_execution_data.unwrap_or(true)
    }
}

/// Serde default helper for flags that default to enabled.
const fn default_true() -> bool {
    true
}

// ============================================================================
// SECTION: Desired Stage Configuration
// ============================================================================

/// Desired stage settings and tags for one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesiredStageConfig {
    /// X-Ray tracing toggle; untouched when unset.
    #[serde(default)]
    pub tracing_enabled: Option<bool>,
    /// Detailed `CloudWatch` metrics toggle; untouched when unset.
    #[serde(default)]
    pub metrics_enabled: Option<bool>,
    /// REST API logging block; `None` disables the logging feature.
    #[serde(default)]
    pub logs: Option<RestApiLogging>,
    /// Resource-level tags.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Stack-level tags, overridden by resource-level tags on collision.
    #[serde(default)]
    pub stack_tags: BTreeMap<String, TagValue>,
}

impl DesiredStageConfig {
    /// Returns true when access logging is wanted for this stage.
    #[must_use]
    pub fn access_logging_enabled(&self) -> bool {
        self.logs.as_ref().is_some_and(|logs| logs.access_logging)
    }
}
