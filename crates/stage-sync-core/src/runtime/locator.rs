// crates/stage-sync-core/src/runtime/locator.rs
// ============================================================================
// Module: Resource and Deployment Locators
// Description: Resolve REST API and deployment identifiers by paged search.
// Purpose: Turn a declared API name into a control-plane id without guessing.
// Dependencies: crate::{core, interfaces, runtime::paging}, async-trait
// ============================================================================

//! ## Overview
//! Resolution never decides whether a stage gets created. That decision
//! belongs to the stage fetcher. An unresolved API is a normal outcome, not
//! an error. Listing failures are fatal because they mean the control plane
//! itself is unreachable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;

use crate::core::ApiReference;
use crate::core::DeploymentId;
use crate::core::ResolvedResourceId;
use crate::core::RestApiId;
use crate::interfaces::ControlPlaneError;
use crate::interfaces::DeploymentSummary;
use crate::interfaces::Page;
use crate::interfaces::PageRequest;
use crate::interfaces::RestApiSummary;
use crate::interfaces::StageControlPlane;
use crate::runtime::paging::PagedSearch;
use crate::runtime::paging::PagedSource;
use crate::runtime::reconciler::ReconcileError;

// ============================================================================
// SECTION: Listing Adapters
// ============================================================================

/// REST API listing exposed as a paged source.
struct RestApiListing<'a, C: ?Sized> {
    /// Control plane used for listing.
    control_plane: &'a C,
}

#[async_trait]
impl<'a, C> PagedSource for RestApiListing<'a, C>
where
    C: StageControlPlane + ?Sized,
{
    type Item = RestApiSummary;

    async fn fetch_page(
        &self,
        request: PageRequest,
    ) -> Result<Page<RestApiSummary>, ControlPlaneError> {
        self.control_plane.list_rest_apis(request).await
    }
}

/// Deployment listing of one REST API exposed as a paged source.
struct DeploymentListing<'a, C: ?Sized> {
    /// Control plane used for listing.
    control_plane: &'a C,
    /// REST API whose deployments are listed.
    rest_api_id: &'a RestApiId,
}

#[async_trait]
impl<'a, C> PagedSource for DeploymentListing<'a, C>
where
    C: StageControlPlane + ?Sized,
{
    type Item = DeploymentSummary;

    async fn fetch_page(
        &self,
        request: PageRequest,
    ) -> Result<Page<DeploymentSummary>, ControlPlaneError> {
        self.control_plane.list_deployments(self.rest_api_id, request).await
    }
}

// ============================================================================
// SECTION: Resource Locator
// ============================================================================

/// Resolves the REST API targeted by a deployment.
pub struct ResourceLocator<'a, C: ?Sized> {
    /// Control plane used for listing.
    control_plane: &'a C,
    /// Search parameters.
    search: PagedSearch,
}

impl<'a, C> ResourceLocator<'a, C>
where
    C: StageControlPlane + ?Sized,
{
    /// Creates a locator over a control plane.
    #[must_use]
    pub const fn new(control_plane: &'a C, search: PagedSearch) -> Self {
        Self {
            control_plane,
            search,
        }
    }

    /// Resolves a REST API reference.
    ///
    /// External references and undeclared APIs return without any call.
    /// Declared names are matched exactly (case-sensitive) and the first
    /// match wins.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when a listing call fails or pagination stalls.
    pub async fn resolve(
        &self,
        reference: &ApiReference,
    ) -> Result<ResolvedResourceId, ReconcileError> {
        let name = match reference {
            ApiReference::External(external) => {
                return Ok(ResolvedResourceId::External(external.clone()));
            }
            ApiReference::Undeclared => return Ok(ResolvedResourceId::Unresolved),
            ApiReference::Declared(name) => name.as_str(),
        };
        let listing = RestApiListing {
            control_plane: self.control_plane,
        };
        let found = self.search.find_first(&listing, |api| api.name == name).await?;
        Ok(found.map_or(ResolvedResourceId::Unresolved, |api| ResolvedResourceId::Resolved(api.id)))
    }
}

// ============================================================================
// SECTION: Deployment Locator
// ============================================================================

/// Finds a deployment to attach a newly created stage to.
pub struct DeploymentLocator<'a, C: ?Sized> {
    /// Control plane used for listing.
    control_plane: &'a C,
    /// Search parameters.
    search: PagedSearch,
}

impl<'a, C> DeploymentLocator<'a, C>
where
    C: StageControlPlane + ?Sized,
{
    /// Creates a locator over a control plane.
    #[must_use]
    pub const fn new(control_plane: &'a C, search: PagedSearch) -> Self {
        Self {
            control_plane,
            search,
        }
    }

    /// Returns the first deployment listed for the REST API.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::NoDeploymentFound`] when the API has never
    /// been deployed, or another variant when listing fails.
    pub async fn latest_deployment(
        &self,
        rest_api_id: &RestApiId,
    ) -> Result<DeploymentId, ReconcileError> {
        let listing = DeploymentListing {
            control_plane: self.control_plane,
            rest_api_id,
        };
        self.search
            .find_first(&listing, |_| true)
            .await?
            .map(|deployment| deployment.id)
            .ok_or_else(|| ReconcileError::NoDeploymentFound(rest_api_id.to_string()))
    }
}
