// crates/stage-sync-config/src/deployment.rs
// ============================================================================
// Module: Deployment Resolution
// Description: Combines tool config, descriptor, and template into one target.
// Purpose: Produce everything a reconciliation needs except account identity.
// Dependencies: stage-sync-core
// ============================================================================

//! ## Overview
//! Overrides in `[deployment]` win over the descriptor, which wins over the
//! built-in defaults. Identity is resolved separately because it may need a
//! network call.
//!
//! Descriptors may hold deployment-time variables such as
//! `${opt:stage, 'dev'}`. Those are never expanded here; a service, stage, or
//! region that still contains one is rejected so the caller supplies an
//! override instead.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use stage_sync_core::AccountIdentity;
use stage_sync_core::ApiReference;
use stage_sync_core::DesiredStageConfig;
use stage_sync_core::PlanContext;
use stage_sync_core::ReconcileRequest;
use stage_sync_core::StageName;

use crate::config::DeploymentConfig;
use crate::descriptor::DeploymentDescriptor;
use crate::descriptor::DescriptorError;
use crate::template::CompiledTemplate;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Fully resolved reconciliation target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedDeployment {
    /// Service name.
    pub service: String,
    /// Stage name.
    pub stage: StageName,
    /// Region.
    pub region: String,
    /// REST API reference.
    pub api: ApiReference,
    /// Desired stage settings and tags.
    pub desired: DesiredStageConfig,
}

impl ResolvedDeployment {
    /// Binds the target to an account identity.
    #[must_use]
    pub fn into_request(self, identity: AccountIdentity) -> ReconcileRequest {
        ReconcileRequest {
            api: self.api,
            context: PlanContext {
                service: self.service,
                stage: self.stage,
                region: self.region,
                identity,
            },
            desired: self.desired,
        }
    }
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Loads the descriptor and optional template named by `config`.
///
/// # Errors
///
/// Returns [`DescriptorError`] when either file cannot be loaded.
pub fn resolve_deployment(config: &DeploymentConfig) -> Result<ResolvedDeployment, DescriptorError> {
    let descriptor = DeploymentDescriptor::load(&config.descriptor_path())?;
    let template = config.template.as_deref().map(CompiledTemplate::load).transpose()?;
    resolve_with(config, &descriptor, template.as_ref())
}

/// Resolves a target from already parsed inputs.
///
/// # Errors
///
/// Returns [`DescriptorError::Invalid`] when the service, stage, or region
/// still holds an unresolved variable.
pub fn resolve_with(
    config: &DeploymentConfig,
    descriptor: &DeploymentDescriptor,
    template: Option<&CompiledTemplate>,
) -> Result<ResolvedDeployment, DescriptorError> {
    let service = config.service.as_deref().unwrap_or_else(|| descriptor.service_name());
    let stage = config.stage.as_deref().unwrap_or_else(|| descriptor.stage());
    let region = config.region.as_deref().unwrap_or_else(|| descriptor.region());
    require_resolved("service", service)?;
    require_resolved("stage", stage)?;
    require_resolved("region", region)?;
    Ok(ResolvedDeployment {
        service: service.to_string(),
        stage: StageName::new(stage),
        region: region.to_string(),
        api: descriptor.api_reference(template, service, stage),
        desired: descriptor.desired_stage_config(),
    })
}

/// Rejects a value that still contains a `${...}` variable.
fn require_resolved(field: &str, value: &str) -> Result<(), DescriptorError> {
    if value.contains("${") {
        return Err(DescriptorError::Invalid(format!(
            "{field} `{value}` contains an unresolved variable; pass --{field} or set \
             deployment.{field}"
        )));
    }
    Ok(())
}
