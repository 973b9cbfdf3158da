// crates/stage-sync-config/src/config.rs
// ============================================================================
// Module: Stage Sync Configuration
// Description: Configuration loading and validation for stage-sync.toml.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: stage-sync-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The path comes from the caller, then `STAGE_SYNC_CONFIG`, then
//! `stage-sync.toml` in the working directory. Every section has defaults
//! except `[deployment]`, whose fields are all optional overrides of the
//! deployment descriptor.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use stage_sync_core::AccountIdentity;
use stage_sync_core::Partition;
use stage_sync_core::ReconcileOptions;
use stage_sync_core::StageLookupPolicy;
use stage_sync_core::runtime::MAX_PAGE_SIZE;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "stage-sync.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "STAGE_SYNC_CONFIG";
/// Default deployment descriptor filename.
pub const DEFAULT_DESCRIPTOR_NAME: &str = "serverless.yml";
/// Maximum size of any file read by this crate, in bytes.
pub const MAX_INPUT_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of service, stage, and region names.
const MAX_NAME_LENGTH: usize = 128;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Stage Sync configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageSyncConfig {
    /// Deployment inputs and overrides.
    #[serde(default)]
    pub deployment: DeploymentConfig,
    /// Account identity override.
    #[serde(default)]
    pub identity: IdentityConfig,
    /// Reconciler tunables.
    #[serde(default)]
    pub reconcile: ReconcileConfig,
    /// Audit sink selection.
    #[serde(default)]
    pub audit: AuditConfig,
    /// AWS client settings.
    #[serde(default)]
    pub aws: AwsConfig,
}

impl StageSyncConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let content = read_text_file(&resolved).map_err(|err| match err {
            FileReadError::Io(message) => ConfigError::Io(message),
            FileReadError::TooLarge => {
                ConfigError::Invalid("config file exceeds size limit".to_string())
            }
            FileReadError::NotUtf8 => {
                ConfigError::Invalid("config file must be utf-8".to_string())
            }
        })?;
        Self::parse(&content)
    }

    /// Loads configuration like [`StageSyncConfig::load`], but falls back to
    /// defaults when neither a path nor the environment override is given and
    /// the default file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an existing or explicit file fails to load.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if path.is_none()
            && env::var_os(CONFIG_ENV_VAR).is_none()
            && !Path::new(DEFAULT_CONFIG_NAME).exists()
        {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.deployment.validate()?;
        self.identity.validate()?;
        self.reconcile.validate()?;
        self.audit.validate()?;
        self.aws.validate()?;
        Ok(())
    }
}

/// Deployment inputs. Names set here override the descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentConfig {
    /// Service name override.
    #[serde(default)]
    pub service: Option<String>,
    /// Stage name override.
    #[serde(default)]
    pub stage: Option<String>,
    /// Region override.
    #[serde(default)]
    pub region: Option<String>,
    /// Deployment descriptor path (`serverless.yml` when unset).
    #[serde(default)]
    pub descriptor: Option<PathBuf>,
    /// Compiled template path; the API name is derived from the descriptor
    /// when unset.
    #[serde(default)]
    pub template: Option<PathBuf>,
}

impl DeploymentConfig {
    /// Returns the descriptor path to load.
    #[must_use]
    pub fn descriptor_path(&self) -> PathBuf {
        self.descriptor.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_DESCRIPTOR_NAME))
    }

    /// Validates deployment overrides.
    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("deployment.service", &self.service),
            ("deployment.stage", &self.stage),
            ("deployment.region", &self.region),
        ] {
            if let Some(value) = value {
                validate_name(field, value)?;
            }
        }
        if let Some(path) = &self.descriptor {
            validate_path_string("deployment.descriptor", &path.to_string_lossy())?;
        }
        if let Some(path) = &self.template {
            validate_path_string("deployment.template", &path.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Account identity override. When `account_id` is set, no identity lookup
/// is made.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    /// Account identifier.
    #[serde(default)]
    pub account_id: Option<String>,
    /// Partition (`aws` when unset).
    #[serde(default)]
    pub partition: Option<String>,
    /// Reject partitions outside the known set.
    #[serde(default)]
    pub strict_partition: bool,
}

impl IdentityConfig {
    /// Returns the configured identity, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when strict partition checking
    /// rejects the partition.
    pub fn static_identity(&self) -> Result<Option<AccountIdentity>, ConfigError> {
        let Some(account_id) = &self.account_id else {
            return Ok(None);
        };
        let partition = self.partition(self.partition.as_deref().unwrap_or("aws"))?;
        Ok(Some(AccountIdentity::new(account_id.trim(), partition)))
    }

    /// Parses a partition according to the strictness setting.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for unknown partitions in strict mode.
    pub fn partition(&self, value: &str) -> Result<Partition, ConfigError> {
        if self.strict_partition {
            Partition::parse_strict(value)
                .map_err(|err| ConfigError::Invalid(format!("identity.partition: {err}")))
        } else {
            Ok(Partition::parse(value))
        }
    }

    /// Validates identity settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match &self.account_id {
            Some(account_id) => {
                let trimmed = account_id.trim();
                if trimmed.is_empty() || !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
                    return Err(ConfigError::Invalid(
                        "identity.account_id must be a non-empty string of digits".to_string(),
                    ));
                }
            }
            None if self.partition.is_some() => {
                return Err(ConfigError::Invalid(
                    "identity.partition requires identity.account_id".to_string(),
                ));
            }
            None => {}
        }
        if let Some(partition) = &self.partition {
            if partition.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "identity.partition must be non-empty".to_string(),
                ));
            }
            self.partition(partition)?;
        }
        Ok(())
    }
}

/// Reconciler tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconcileConfig {
    /// How stage lookup failures are classified.
    #[serde(default)]
    pub stage_lookup: StageLookupPolicy,
    /// Listing page size.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            stage_lookup: StageLookupPolicy::default(),
            page_size: MAX_PAGE_SIZE,
        }
    }
}

impl ReconcileConfig {
    /// Returns reconciler options for these settings.
    #[must_use]
    pub const fn options(&self) -> ReconcileOptions {
        ReconcileOptions {
            page_size: self.page_size,
            stage_lookup: self.stage_lookup,
        }
    }

    /// Validates reconciler settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "reconcile.page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(())
    }
}

/// Serde default for [`ReconcileConfig::page_size`].
const fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}

/// Audit sink kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
    /// Audit disabled.
    None,
}

/// Audit sink selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Sink kind.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Audit log path for the file sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl AuditConfig {
    /// Validates audit settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.path is required for the file sink".to_string()))
            }
            (AuditSinkKind::File, Some(path)) => {
                validate_path_string("audit.path", &path.to_string_lossy())
            }
            (_, Some(_)) => Err(ConfigError::Invalid(
                "audit.path is only valid for the file sink".to_string(),
            )),
            (_, None) => Ok(()),
        }
    }
}

/// AWS client settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AwsConfig {
    /// Shared config profile name.
    #[serde(default)]
    pub profile: Option<String>,
    /// Endpoint override for every client.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Allow non-TLS endpoints (explicit opt-in).
    #[serde(default)]
    pub allow_http: bool,
}

impl AwsConfig {
    /// Validates AWS client settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(profile) = &self.profile
            && profile.trim().is_empty()
        {
            return Err(ConfigError::Invalid("aws.profile must be non-empty".to_string()));
        }
        if let Some(endpoint) = &self.endpoint {
            let trimmed = endpoint.trim();
            if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
                return Err(ConfigError::Invalid(
                    "aws.endpoint must include http:// or https://".to_string(),
                ));
            }
            if trimmed.starts_with("http://") && !self.allow_http {
                return Err(ConfigError::Invalid(
                    "aws.endpoint uses http:// without allow_http".to_string(),
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Bounded file read failures shared by every loader in this crate.
pub(crate) enum FileReadError {
    /// Underlying I/O failure.
    Io(String),
    /// File exceeds [`MAX_INPUT_FILE_SIZE`].
    TooLarge,
    /// File is not valid UTF-8.
    NotUtf8,
}

/// Reads a UTF-8 file no larger than [`MAX_INPUT_FILE_SIZE`].
pub(crate) fn read_text_file(path: &Path) -> Result<String, FileReadError> {
    let bytes = fs::read(path).map_err(|err| FileReadError::Io(err.to_string()))?;
    if bytes.len() > MAX_INPUT_FILE_SIZE {
        return Err(FileReadError::TooLarge);
    }
    String::from_utf8(bytes).map_err(|_| FileReadError::NotUtf8)
}

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    let path = Path::new(trimmed);
    for component in path.components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a service, stage, or region name.
fn validate_name(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_NAME_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(ConfigError::Invalid(format!("{field} must not contain whitespace")));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
