// crates/stage-sync-core/src/runtime/reconciler.rs
// ============================================================================
// Module: Stage Reconciler
// Description: Orchestrates one stage reconciliation run end to end.
// Purpose: Locate, inspect, create, patch, tag, and clean up in strict order.
// Dependencies: crate::{core, interfaces, runtime}, serde, thiserror
// ============================================================================

//! ## Overview
//! A run is a strictly sequential pipeline of control-plane calls:
//!
//! `Locating -> (Unresolved | External)` ends the run without further calls.
//! External and undeclared references settle before any call at all, so
//! callers can use [`settle_without_lookup`] to skip client setup entirely.
//! Otherwise `FetchingStage -> [ResolvingDeployment -> Creating] -> Patching
//! -> ReconcilingTags -> CleaningLogGroup -> Done`.
//!
//! Observed tags are read before any write so the tag diff reflects the
//! state at the start of the run. The reconciler holds no state between
//! runs; distinct APIs may be reconciled in parallel by separate instances.
//! Retries and timeouts belong to the control-plane implementation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::ApiReference;
use crate::core::DesiredStageConfig;
use crate::core::PatchOperation;
use crate::core::ResolvedResourceId;
use crate::core::RestApiId;
use crate::core::StageName;
use crate::core::TagDelta;
use crate::core::stage_arn;
use crate::interfaces::ControlPlaneError;
use crate::interfaces::StageControlPlane;
use crate::runtime::audit::ReconcileAuditEvent;
use crate::runtime::audit::ReconcileAuditEventParams;
use crate::runtime::audit::ReconcileAuditSink;
use crate::runtime::audit::ReconcilePhase;
use crate::runtime::cleanup::CleanupResult;
use crate::runtime::cleanup::LogGroupCleaner;
use crate::runtime::cleanup::LogGroupCleanup;
use crate::runtime::fetcher::StageLookupPolicy;
use crate::runtime::fetcher::StageStateFetcher;
use crate::runtime::locator::DeploymentLocator;
use crate::runtime::locator::ResourceLocator;
use crate::runtime::paging::MAX_PAGE_SIZE;
use crate::runtime::paging::PagedSearch;
use crate::runtime::paging::PagingError;
use crate::runtime::planner::PatchPlanner;
use crate::runtime::planner::PlanContext;
use crate::runtime::tags::TagReconciler;

// ============================================================================
// SECTION: Options
// ============================================================================

/// Tunables for a reconciler instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileOptions {
    /// Listing page size for REST API and deployment lookup.
    pub page_size: u32,
    /// Stage lookup failure classification.
    pub stage_lookup: StageLookupPolicy,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            stage_lookup: StageLookupPolicy::Lenient,
        }
    }
}

// ============================================================================
// SECTION: Request / Outcome
// ============================================================================

/// Inputs for one reconciliation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileRequest {
    /// How the REST API is referenced.
    pub api: ApiReference,
    /// Service, stage, region, and account identity.
    pub context: PlanContext,
    /// Desired stage settings and tags.
    pub desired: DesiredStageConfig,
}

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileStatus {
    /// REST API unresolved; nothing was done.
    NoOp,
    /// REST API externally managed; nothing was done.
    External,
    /// Stage reconciled.
    Applied,
}

/// Report of what a run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    /// Terminal state.
    pub status: ReconcileStatus,
    /// Resolved REST API identifier.
    pub rest_api_id: Option<RestApiId>,
    /// External reference when the API is externally managed.
    pub external_reference: Option<String>,
    /// Whether the stage was created in this run.
    pub stage_created: bool,
    /// Patch operations sent in the update call.
    pub patch_operations: Vec<PatchOperation>,
    /// Tag changes applied.
    pub tag_delta: TagDelta,
    /// Log group cleanup performed.
    pub log_group_cleanup: Option<LogGroupCleanup>,
}

impl ReconcileOutcome {
    /// Builds the outcome of a run that stopped before touching the stage.
    fn skipped(status: ReconcileStatus, external_reference: Option<String>) -> Self {
        Self {
            status,
            rest_api_id: None,
            external_reference,
            stage_created: false,
            patch_operations: Vec::new(),
            tag_delta: TagDelta::default(),
            log_group_cleanup: None,
        }
    }
}

/// Settles a run whose REST API reference needs no lookup.
///
/// External references end as [`ReconcileStatus::External`] and undeclared
/// ones as [`ReconcileStatus::NoOp`]; the terminal audit event is recorded
/// either way. Returns `None` for declared names, which must be located.
#[must_use]
pub fn settle_without_lookup<A>(
    audit: &A,
    service: &str,
    stage: &StageName,
    api: &ApiReference,
) -> Option<ReconcileOutcome>
where
    A: ReconcileAuditSink + ?Sized,
{
    let (phase, outcome) = match api {
        ApiReference::Declared(_) => return None,
        ApiReference::Undeclared => {
            (ReconcilePhase::Unresolved, ReconcileOutcome::skipped(ReconcileStatus::NoOp, None))
        }
        ApiReference::External(reference) => (
            ReconcilePhase::External,
            ReconcileOutcome::skipped(ReconcileStatus::External, Some(reference.clone())),
        ),
    };
    audit.record(&ReconcileAuditEvent::new(ReconcileAuditEventParams {
        service: service.to_string(),
        stage: stage.to_string(),
        rest_api_id: None,
        phase,
        detail: outcome.external_reference.clone(),
    }));
    Some(outcome)
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Fatal reconciliation errors. Non-fatal branches never surface here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// Control-plane call failed.
    #[error(transparent)]
    ControlPlane(#[from] ControlPlaneError),
    /// Stage creation impossible because the REST API has no deployment.
    #[error("no deployment found for rest api {0}")]
    NoDeploymentFound(String),
    /// Listing returned a repeating continuation token.
    #[error("pagination stalled at position {0}")]
    PaginationStalled(String),
}

impl From<PagingError> for ReconcileError {
    fn from(err: PagingError) -> Self {
        match err {
            PagingError::ControlPlane(err) => Self::ControlPlane(err),
            PagingError::Stalled(position) => Self::PaginationStalled(position),
        }
    }
}

// ============================================================================
// SECTION: Reconciler
// ============================================================================

/// Stage reconciler bound to a control plane and an audit sink.
pub struct StageReconciler<C, A> {
    /// Control-plane implementation.
    control_plane: C,
    /// Audit sink for phase events.
    audit: A,
    /// Reconciler tunables.
    options: ReconcileOptions,
}

impl<C, A> StageReconciler<C, A>
where
    C: StageControlPlane,
    A: ReconcileAuditSink,
{
    /// Creates a reconciler.
    #[must_use]
    pub const fn new(control_plane: C, audit: A, options: ReconcileOptions) -> Self {
        Self {
            control_plane,
            audit,
            options,
        }
    }

    /// Returns the control plane.
    #[must_use]
    pub const fn control_plane(&self) -> &C {
        &self.control_plane
    }

    /// Returns the audit sink.
    #[must_use]
    pub const fn audit(&self) -> &A {
        &self.audit
    }

    /// Runs one reconciliation.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] for transport/auth failures and for a
    /// missing deployment on the create path. Unresolved APIs, absent
    /// stages, and absent log groups are handled internally.
    pub async fn reconcile(
        &self,
        request: &ReconcileRequest,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let result = self.run(request).await;
        if let Err(err) = &result {
            self.emit(request, None, ReconcilePhase::Failed, Some(err.to_string()));
        }
        result
    }

    /// Executes the reconciliation state machine.
    async fn run(&self, request: &ReconcileRequest) -> Result<ReconcileOutcome, ReconcileError> {
        let search = PagedSearch::new(self.options.page_size);
        let stage = &request.context.stage;
        if let Some(outcome) =
            settle_without_lookup(&self.audit, &request.context.service, stage, &request.api)
        {
            return Ok(outcome);
        }

        let resolved =
            ResourceLocator::new(&self.control_plane, search).resolve(&request.api).await?;
        let rest_api_id = match resolved {
            ResolvedResourceId::Resolved(id) => id,
            ResolvedResourceId::Unresolved => {
                self.emit(request, None, ReconcilePhase::Unresolved, None);
                return Ok(ReconcileOutcome::skipped(ReconcileStatus::NoOp, None));
            }
            ResolvedResourceId::External(reference) => {
                self.emit(request, None, ReconcilePhase::External, Some(reference.clone()));
                return Ok(ReconcileOutcome::skipped(ReconcileStatus::External, Some(reference)));
            }
        };
        let api = Some(&rest_api_id);
        self.emit(request, api, ReconcilePhase::Located, None);

        let observed = StageStateFetcher::new(&self.control_plane, self.options.stage_lookup)
            .fetch(&rest_api_id, stage)
            .await?;

        let mut stage_created = false;
        if !observed.exists {
            self.emit(request, api, ReconcilePhase::StageAbsent, None);
            let deployment_id = DeploymentLocator::new(&self.control_plane, search)
                .latest_deployment(&rest_api_id)
                .await?;
            self.control_plane.create_stage(&rest_api_id, stage, &deployment_id).await?;
            stage_created = true;
            self.emit(
                request,
                api,
                ReconcilePhase::StageCreated,
                Some(format!("deployment {deployment_id}")),
            );
        }

        let plan = PatchPlanner::plan(&request.desired, &request.context);
        if !plan.operations.is_empty() {
            self.control_plane.update_stage(&rest_api_id, stage, &plan.operations).await?;
            self.emit(
                request,
                api,
                ReconcilePhase::StagePatched,
                Some(format!("{} operations", plan.operations.len())),
            );
        }

        let tag_delta = TagReconciler::reconcile(&request.desired, &observed.tags);
        let resource_arn = stage_arn(
            &request.context.identity.partition,
            &request.context.region,
            &rest_api_id,
            stage,
        );
        if !tag_delta.to_set.is_empty() {
            self.control_plane.tag_resource(&resource_arn, &tag_delta.to_set).await?;
            self.emit(
                request,
                api,
                ReconcilePhase::TagsApplied,
                Some(format!("{} tags", tag_delta.to_set.len())),
            );
        }
        if !tag_delta.to_remove.is_empty() {
            self.control_plane.untag_resource(&resource_arn, &tag_delta.to_remove).await?;
            self.emit(
                request,
                api,
                ReconcilePhase::TagsRemoved,
                Some(tag_delta.to_remove.join(",")),
            );
        }

        let log_group_cleanup = match &plan.log_group_cleanup {
            Some(log_group_name) => {
                let cleanup = LogGroupCleaner::new(&self.control_plane).clean(log_group_name).await?;
                let phase = match cleanup.result {
                    CleanupResult::Deleted => ReconcilePhase::LogGroupDeleted,
                    CleanupResult::AlreadyAbsent => ReconcilePhase::LogGroupAbsent,
                };
                self.emit(request, api, phase, Some(log_group_name.clone()));
                Some(cleanup)
            }
            None => None,
        };

        self.emit(request, api, ReconcilePhase::Completed, None);
        Ok(ReconcileOutcome {
            status: ReconcileStatus::Applied,
            rest_api_id: Some(rest_api_id),
            external_reference: None,
            stage_created,
            patch_operations: plan.operations,
            tag_delta,
            log_group_cleanup,
        })
    }

    /// Records one audit event for the current run.
    fn emit(
        &self,
        request: &ReconcileRequest,
        rest_api_id: Option<&RestApiId>,
        phase: ReconcilePhase,
        detail: Option<String>,
    ) {
        let event = ReconcileAuditEvent::new(ReconcileAuditEventParams {
            service: request.context.service.clone(),
            stage: request.context.stage.to_string(),
            rest_api_id: rest_api_id.map(ToString::to_string),
            phase,
            detail,
        });
        self.audit.record(&event);
    }
}
