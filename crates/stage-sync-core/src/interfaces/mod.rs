// crates/stage-sync-core/src/interfaces/mod.rs
// ============================================================================
// Module: Stage Sync Interfaces
// Description: Backend-agnostic control-plane and identity interfaces.
// Purpose: Define the contract surfaces used by the reconciliation runtime.
// Dependencies: crate::core, async-trait, thiserror
// ============================================================================

//! ## Overview
//! The runtime never talks to a cloud SDK directly. It calls these traits,
//! and transport, authentication, retry and timeout policy all live in the
//! implementation. Implementations must report a missing resource as
//! [`ControlPlaneError::NotFound`] so callers can tell absence apart from
//! other failures.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::AccountIdentity;
use crate::core::DeploymentId;
use crate::core::PatchOperation;
use crate::core::RestApiId;
use crate::core::StageName;

// ============================================================================
// SECTION: Paging Types
// ============================================================================

/// Request for one page of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Maximum number of items to return.
    pub page_size: u32,
    /// Opaque continuation token from the previous page.
    pub position: Option<String>,
}

/// One page of listing results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Continuation token; `None` when the listing is exhausted.
    pub next_position: Option<String>,
}

impl<T> Page<T> {
    /// Builds a final page with no continuation.
    #[must_use]
    pub const fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_position: None,
        }
    }
}

/// REST API listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestApiSummary {
    /// REST API identifier.
    pub id: RestApiId,
    /// REST API name; names are not unique.
    pub name: String,
}

/// Deployment listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentSummary {
    /// Deployment identifier.
    pub id: DeploymentId,
}

/// Stage tags and variables returned by a stage lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSnapshot {
    /// Stage tags.
    pub tags: BTreeMap<String, String>,
    /// Stage variables.
    pub variables: BTreeMap<String, String>,
}

// ============================================================================
// SECTION: Control Plane
// ============================================================================

/// Control-plane failures reported by implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlPlaneError {
    /// Target resource does not exist.
    #[error("control plane resource not found: {0}")]
    NotFound(String),
    /// Caller is not authorized for the operation.
    #[error("control plane access denied: {0}")]
    AccessDenied(String),
    /// Request never produced a service response (network, timeout).
    #[error("control plane transport error: {0}")]
    Transport(String),
    /// Service rejected the request.
    #[error("control plane service error: {0}")]
    Service(String),
}

impl ControlPlaneError {
    /// Returns true for [`ControlPlaneError::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// API Gateway and `CloudWatch` Logs operations used by reconciliation.
#[async_trait]
pub trait StageControlPlane: Send + Sync {
    /// Lists REST APIs one page at a time.
    ///
    /// # Errors
    ///
    /// Returns [`ControlPlaneError`] when the listing fails.
    async fn list_rest_apis(
        &self,
        page: PageRequest,
    ) -> Result<Page<RestApiSummary>, ControlPlaneError>;

    /// Lists deployments of a REST API one page at a time.
    ///
    /// # Errors
    ///
    /// Returns [`ControlPlaneError`] when the listing fails.
    async fn list_deployments(
        &self,
        rest_api_id: &RestApiId,
        page: PageRequest,
    ) -> Result<Page<DeploymentSummary>, ControlPlaneError>;

    /// Reads stage tags and variables.
    ///
    /// # Errors
    ///
    /// Returns [`ControlPlaneError::NotFound`] when the stage does not exist,
    /// or another variant when the lookup fails.
    async fn get_stage(
        &self,
        rest_api_id: &RestApiId,
        stage: &StageName,
    ) -> Result<StageSnapshot, ControlPlaneError>;

    /// Creates a stage bound to an existing deployment.
    ///
    /// # Errors
    ///
    /// Returns [`ControlPlaneError`] when creation fails.
    async fn create_stage(
        &self,
        rest_api_id: &RestApiId,
        stage: &StageName,
        deployment_id: &DeploymentId,
    ) -> Result<(), ControlPlaneError>;

    /// Applies an ordered list of patch operations atomically.
    ///
    /// # Errors
    ///
    /// Returns [`ControlPlaneError`] when the update fails.
    async fn update_stage(
        &self,
        rest_api_id: &RestApiId,
        stage: &StageName,
        operations: &[PatchOperation],
    ) -> Result<(), ControlPlaneError>;

    /// Adds or overwrites tags on a resource.
    ///
    /// # Errors
    ///
    /// Returns [`ControlPlaneError`] when tagging fails.
    async fn tag_resource(
        &self,
        resource_arn: &str,
        tags: &BTreeMap<String, String>,
    ) -> Result<(), ControlPlaneError>;

    /// Removes tag keys from a resource.
    ///
    /// # Errors
    ///
    /// Returns [`ControlPlaneError`] when untagging fails.
    async fn untag_resource(
        &self,
        resource_arn: &str,
        tag_keys: &[String],
    ) -> Result<(), ControlPlaneError>;

    /// Deletes a `CloudWatch` Logs log group.
    ///
    /// # Errors
    ///
    /// Returns [`ControlPlaneError::NotFound`] when the group does not exist,
    /// or another variant when deletion fails.
    async fn delete_log_group(&self, log_group_name: &str) -> Result<(), ControlPlaneError>;
}

// ============================================================================
// SECTION: Identity
// ============================================================================

/// Identity resolution errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Identity service call failed.
    #[error("identity lookup failed: {0}")]
    Lookup(String),
    /// Identity response was missing fields or malformed.
    #[error("identity response invalid: {0}")]
    Invalid(String),
}

/// Resolves the caller's account identity.
///
/// The invoking pipeline calls this once and passes the value into each run.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Returns the caller account id and partition.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError`] when the identity cannot be determined.
    async fn account_identity(&self) -> Result<AccountIdentity, IdentityError>;
}

/// Identity resolver returning a fixed, preconfigured identity.
#[derive(Debug, Clone)]
pub struct StaticIdentityResolver {
    /// Identity returned on every call.
    identity: AccountIdentity,
}

impl StaticIdentityResolver {
    /// Creates a resolver for a known identity.
    #[must_use]
    pub const fn new(identity: AccountIdentity) -> Self {
        Self {
            identity,
        }
    }
}

#[async_trait]
impl IdentityResolver for StaticIdentityResolver {
    async fn account_identity(&self) -> Result<AccountIdentity, IdentityError> {
        Ok(self.identity.clone())
    }
}
