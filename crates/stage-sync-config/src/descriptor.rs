// crates/stage-sync-config/src/descriptor.rs
// ============================================================================
// Module: Deployment Descriptor
// Description: Parses the service descriptor into desired stage settings.
// Purpose: Map provider-level stage options onto typed reconciliation inputs.
// Dependencies: stage-sync-core, serde, serde_json, serde_yaml
// ============================================================================

//! ## Overview
//! The descriptor is the service's YAML (or JSON) deployment file. Only the
//! `service` name and the `provider` keys that affect the API Gateway stage
//! are read; everything else in the file is ignored.
//!
//! `provider.logs.restApi` accepts `true`, `false`, or an object. `false`
//! and absence both mean "logging not configured", so access logging is off
//! and the access-log group is cleaned up.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use stage_sync_core::ApiReference;
use stage_sync_core::DesiredStageConfig;
use stage_sync_core::LogLevel;
use stage_sync_core::RestApiLogging;
use stage_sync_core::TagValue;
use thiserror::Error;

use crate::config::FileReadError;
use crate::config::read_text_file;
use crate::template::CompiledTemplate;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Stage used when neither the descriptor nor an override names one.
pub const DEFAULT_STAGE: &str = "dev";
/// Region used when neither the descriptor nor an override names one.
pub const DEFAULT_REGION: &str = "us-east-1";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Descriptor and template loading errors.
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// I/O failure while reading the file.
    #[error("descriptor io error: {0}")]
    Io(String),
    /// YAML or JSON parsing error.
    #[error("descriptor parse error: {0}")]
    Parse(String),
    /// Structurally valid but unusable content.
    #[error("invalid descriptor: {0}")]
    Invalid(String),
}

impl From<FileReadError> for DescriptorError {
    fn from(err: FileReadError) -> Self {
        match err {
            FileReadError::Io(message) => Self::Io(message),
            FileReadError::TooLarge => Self::Invalid("file exceeds size limit".to_string()),
            FileReadError::NotUtf8 => Self::Invalid("file must be utf-8".to_string()),
        }
    }
}

// ============================================================================
// SECTION: Descriptor Types
// ============================================================================

/// Service name, written either inline or as `{ name: ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ServiceName {
    /// `service: my-service`.
    Inline(String),
    /// `service: { name: my-service }`.
    Object {
        /// Service name.
        name: String,
    },
}

impl ServiceName {
    /// Returns the service name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Inline(name)
            | Self::Object {
                name,
            } => name,
        }
    }
}

/// Parsed deployment descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentDescriptor {
    /// Service name.
    pub service: ServiceName,
    /// Provider section.
    #[serde(default)]
    pub provider: ProviderSection,
}

/// Provider keys that influence the stage.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSection {
    /// Default stage.
    #[serde(default)]
    pub stage: Option<String>,
    /// Default region.
    #[serde(default)]
    pub region: Option<String>,
    /// Explicit REST API name.
    #[serde(default)]
    pub api_name: Option<String>,
    /// API Gateway options.
    #[serde(default)]
    pub api_gateway: Option<ApiGatewaySection>,
    /// Tracing toggles.
    #[serde(default)]
    pub tracing: Option<TracingSection>,
    /// Logging settings.
    #[serde(default)]
    pub logs: Option<LogsSection>,
    /// Resource-level tags.
    #[serde(default)]
    pub tags: BTreeMap<String, TagValue>,
    /// Stack-level tags.
    #[serde(default)]
    pub stack_tags: BTreeMap<String, TagValue>,
}

/// `provider.apiGateway`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewaySection {
    /// Externally managed REST API: an id string or an intrinsic object.
    #[serde(default)]
    pub rest_api_id: Option<Value>,
    /// Detailed metrics toggle.
    #[serde(default)]
    pub metrics: Option<bool>,
    /// Name the API `<service>-<stage>` instead of `<stage>-<service>`.
    #[serde(default)]
    pub should_start_name_with_service: Option<bool>,
}

/// `provider.tracing`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TracingSection {
    /// API Gateway tracing toggle.
    #[serde(default)]
    pub api_gateway: Option<bool>,
}

/// `provider.logs`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsSection {
    /// REST API logging.
    #[serde(default)]
    pub rest_api: Option<RestApiLogsSetting>,
}

/// `provider.logs.restApi`: a flag or a settings object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RestApiLogsSetting {
    /// `restApi: true | false`.
    Enabled(bool),
    /// `restApi: { ... }`.
    Settings(RestApiLogsObject),
}

/// Object form of `provider.logs.restApi`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestApiLogsObject {
    /// Access logging toggle.
    #[serde(default)]
    pub access_logging: Option<bool>,
    /// Access log format.
    #[serde(default)]
    pub format: Option<String>,
    /// Execution logging toggle.
    #[serde(default)]
    pub execution_logging: Option<bool>,
    /// Execution log level.
    #[serde(default)]
    pub level: Option<LogLevel>,
    /// Full request/response data logging.
    #[serde(default)]
    pub full_execution_data: Option<bool>,
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl DeploymentDescriptor {
    /// Loads a descriptor, choosing JSON for `.json` files and YAML otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError`] when reading or parsing fails.
    pub fn load(path: &Path) -> Result<Self, DescriptorError> {
        let content = read_text_file(path)?;
        let is_json = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json { Self::from_json(&content) } else { Self::from_yaml(&content) }
    }

    /// Parses a YAML descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError`] when parsing or validation fails.
    pub fn from_yaml(content: &str) -> Result<Self, DescriptorError> {
        let descriptor: Self =
            serde_yaml::from_str(content).map_err(|err| DescriptorError::Parse(err.to_string()))?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Parses a JSON descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError`] when parsing or validation fails.
    pub fn from_json(content: &str) -> Result<Self, DescriptorError> {
        let descriptor: Self =
            serde_json::from_str(content).map_err(|err| DescriptorError::Parse(err.to_string()))?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Rejects descriptors without a usable service name.
    fn validate(&self) -> Result<(), DescriptorError> {
        if self.service.as_str().trim().is_empty() {
            return Err(DescriptorError::Invalid("service name must be non-empty".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Interpretation
// ============================================================================

impl DeploymentDescriptor {
    /// Returns the service name.
    #[must_use]
    pub fn service_name(&self) -> &str {
        self.service.as_str()
    }

    /// Returns the descriptor stage, falling back to [`DEFAULT_STAGE`].
    #[must_use]
    pub fn stage(&self) -> &str {
        self.provider.stage.as_deref().unwrap_or(DEFAULT_STAGE)
    }

    /// Returns the descriptor region, falling back to [`DEFAULT_REGION`].
    #[must_use]
    pub fn region(&self) -> &str {
        self.provider.region.as_deref().unwrap_or(DEFAULT_REGION)
    }

    /// Returns the external REST API reference, if one is configured.
    ///
    /// Intrinsic objects such as `Fn::ImportValue` are kept as compact JSON.
    /// Null and blank ids count as unset.
    #[must_use]
    pub fn external_rest_api_id(&self) -> Option<String> {
        let value = self.provider.api_gateway.as_ref()?.rest_api_id.as_ref()?;
        match value {
            Value::Null => None,
            Value::String(id) if id.trim().is_empty() => None,
            Value::String(id) => Some(id.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Returns the REST API name deployed for `service` and `stage` when no
    /// compiled template is available.
    #[must_use]
    pub fn default_api_name(&self, service: &str, stage: &str) -> String {
        if let Some(name) = &self.provider.api_name {
            return name.clone();
        }
        let service_first = self
            .provider
            .api_gateway
            .as_ref()
            .and_then(|api| api.should_start_name_with_service)
            .unwrap_or(false);
        if service_first { format!("{service}-{stage}") } else { format!("{stage}-{service}") }
    }

    /// Resolves how the REST API is referenced.
    ///
    /// An external id wins. Otherwise the compiled template decides the name
    /// when available, and the naming convention decides it when not.
    #[must_use]
    pub fn api_reference(
        &self,
        template: Option<&CompiledTemplate>,
        service: &str,
        stage: &str,
    ) -> ApiReference {
        if let Some(external) = self.external_rest_api_id() {
            return ApiReference::External(external);
        }
        match template {
            Some(template) => {
                template.declared_api_name().map_or(ApiReference::Undeclared, ApiReference::Declared)
            }
            None => ApiReference::Declared(self.default_api_name(service, stage)),
        }
    }

    /// Builds the desired stage settings and tags.
    #[must_use]
    pub fn desired_stage_config(&self) -> DesiredStageConfig {
        let provider = &self.provider;
        DesiredStageConfig {
            tracing_enabled: provider.tracing.as_ref().and_then(|tracing| tracing.api_gateway),
            metrics_enabled: provider.api_gateway.as_ref().and_then(|api| api.metrics),
            logs: provider
                .logs
                .as_ref()
                .and_then(|logs| logs.rest_api.as_ref())
                .and_then(rest_api_logging),
            tags: provider.tags.iter().map(|(key, value)| (key.clone(), value.to_string())).collect(),
            stack_tags: provider.stack_tags.clone(),
        }
    }
}

/// Maps `logs.restApi` onto [`RestApiLogging`]; `false` disables logging.
fn rest_api_logging(setting: &RestApiLogsSetting) -> Option<RestApiLogging> {
    match setting {
        RestApiLogsSetting::Enabled(false) => None,
        RestApiLogsSetting::Enabled(true) => Some(RestApiLogging::default()),
        RestApiLogsSetting::Settings(settings) => Some(RestApiLogging {
            access_logging: settings.access_logging.unwrap_or(true),
            access_log_format: settings.format.clone(),
            execution_logging: settings.execution_logging,
            log_level: settings.level,
            full_execution_data: settings.full_execution_data,
        }),
    }
}
