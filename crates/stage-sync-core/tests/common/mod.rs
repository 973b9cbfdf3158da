// crates/stage-sync-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Recording control-plane fake and sample reconciliation inputs.
// Purpose: Provide reusable, deterministic test infrastructure.
// Dependencies: stage-sync-core
// ============================================================================

//! ## Overview
//! [`FakeControlPlane`] answers every control-plane call from canned data and
//! records the calls in order, so tests can assert the exact call sequence
//! of a run.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use stage_sync_core::AccountIdentity;
use stage_sync_core::ApiReference;
use stage_sync_core::ControlPlaneError;
use stage_sync_core::DeploymentId;
use stage_sync_core::DeploymentSummary;
use stage_sync_core::DesiredStageConfig;
use stage_sync_core::Page;
use stage_sync_core::PageRequest;
use stage_sync_core::Partition;
use stage_sync_core::PatchOperation;
use stage_sync_core::PlanContext;
use stage_sync_core::ReconcileRequest;
use stage_sync_core::RestApiId;
use stage_sync_core::RestApiSummary;
use stage_sync_core::StageControlPlane;
use stage_sync_core::StageName;
use stage_sync_core::StageSnapshot;

// ============================================================================
// SECTION: Recorded Calls
// ============================================================================

/// One recorded control-plane call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `list_rest_apis`.
    ListRestApis {
        /// Requested page size.
        page_size: u32,
        /// Continuation token sent.
        position: Option<String>,
    },
    /// `list_deployments`.
    ListDeployments {
        /// REST API id.
        rest_api_id: String,
        /// Requested page size.
        page_size: u32,
    },
    /// `get_stage`.
    GetStage {
        /// REST API id.
        rest_api_id: String,
        /// Stage name.
        stage: String,
    },
    /// `create_stage`.
    CreateStage {
        /// REST API id.
        rest_api_id: String,
        /// Stage name.
        stage: String,
        /// Deployment id.
        deployment_id: String,
    },
    /// `update_stage`.
    UpdateStage {
        /// REST API id.
        rest_api_id: String,
        /// Stage name.
        stage: String,
        /// Patch operations.
        operations: Vec<PatchOperation>,
    },
    /// `tag_resource`.
    TagResource {
        /// Stage ARN.
        resource_arn: String,
        /// Tags set.
        tags: BTreeMap<String, String>,
    },
    /// `untag_resource`.
    UntagResource {
        /// Stage ARN.
        resource_arn: String,
        /// Keys removed.
        tag_keys: Vec<String>,
    },
    /// `delete_log_group`.
    DeleteLogGroup {
        /// Log group name.
        log_group_name: String,
    },
}

impl Call {
    /// Returns the operation name of the call.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ListRestApis { .. } => "list_rest_apis",
            Self::ListDeployments { .. } => "list_deployments",
            Self::GetStage { .. } => "get_stage",
            Self::CreateStage { .. } => "create_stage",
            Self::UpdateStage { .. } => "update_stage",
            Self::TagResource { .. } => "tag_resource",
            Self::UntagResource { .. } => "untag_resource",
            Self::DeleteLogGroup { .. } => "delete_log_group",
        }
    }
}

// ============================================================================
// SECTION: Fake Control Plane
// ============================================================================

/// Canned-response control plane that records every call.
pub struct FakeControlPlane {
    /// Calls in arrival order.
    calls: Mutex<Vec<Call>>,
    /// REST API pages keyed by the continuation token that requests them.
    rest_api_pages: BTreeMap<Option<String>, Page<RestApiSummary>>,
    /// Deployments returned on a single page.
    deployments: Vec<DeploymentSummary>,
    /// Result of every stage lookup.
    stage: Result<StageSnapshot, ControlPlaneError>,
    /// Result of every log group deletion.
    log_group: Result<(), ControlPlaneError>,
    /// Failure injected into update calls.
    update_failure: Option<ControlPlaneError>,
}

impl FakeControlPlane {
    /// Creates a fake with no APIs, no deployments, and an existing empty stage.
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            rest_api_pages: BTreeMap::new(),
            deployments: Vec::new(),
            stage: Ok(StageSnapshot::default()),
            log_group: Ok(()),
            update_failure: None,
        }
    }

    /// Mirrors a typical account: three APIs, one deployment, stage tag `old`.
    pub fn standard() -> Self {
        Self::new()
            .with_rest_api_page(
                None,
                &[
                    ("dev-my-service", "devRestApiId"),
                    ("prod-my-service", "prodRestApiId"),
                    ("custom-rest-api-name", "customRestApiId"),
                ],
                None,
            )
            .with_deployments(&["someDeploymentId"])
            .with_stage_tags(&[("old", "tag")])
    }

    /// Adds a REST API page served for `position`.
    pub fn with_rest_api_page(
        mut self,
        position: Option<&str>,
        items: &[(&str, &str)],
        next: Option<&str>,
    ) -> Self {
        let items = items
            .iter()
            .map(|(name, id)| RestApiSummary {
                id: RestApiId::new(*id),
                name: (*name).to_string(),
            })
            .collect();
        self.rest_api_pages.insert(
            position.map(str::to_string),
            Page {
                items,
                next_position: next.map(str::to_string),
            },
        );
        self
    }

    /// Sets the deployments listed for every REST API.
    pub fn with_deployments(mut self, ids: &[&str]) -> Self {
        self.deployments = ids
            .iter()
            .map(|id| DeploymentSummary {
                id: DeploymentId::new(*id),
            })
            .collect();
        self
    }

    /// Makes stage lookups succeed with the given tags.
    pub fn with_stage_tags(mut self, tags: &[(&str, &str)]) -> Self {
        self.stage = Ok(StageSnapshot {
            tags: tags.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect(),
            variables: BTreeMap::new(),
        });
        self
    }

    /// Makes stage lookups fail.
    pub fn with_stage_error(mut self, err: ControlPlaneError) -> Self {
        self.stage = Err(err);
        self
    }

    /// Makes log group deletion fail.
    pub fn with_log_group_error(mut self, err: ControlPlaneError) -> Self {
        self.log_group = Err(err);
        self
    }

    /// Makes update calls fail.
    pub fn with_update_failure(mut self, err: ControlPlaneError) -> Self {
        self.update_failure = Some(err);
        self
    }

    /// Returns the recorded calls.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Returns the recorded operation names.
    pub fn call_names(&self) -> Vec<&'static str> {
        self.calls().iter().map(Call::name).collect()
    }

    /// Records a call.
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl StageControlPlane for FakeControlPlane {
    async fn list_rest_apis(
        &self,
        page: PageRequest,
    ) -> Result<Page<RestApiSummary>, ControlPlaneError> {
        self.record(Call::ListRestApis {
            page_size: page.page_size,
            position: page.position.clone(),
        });
        Ok(self
            .rest_api_pages
            .get(&page.position)
            .cloned()
            .unwrap_or_else(|| Page::last(Vec::new())))
    }

    async fn list_deployments(
        &self,
        rest_api_id: &RestApiId,
        page: PageRequest,
    ) -> Result<Page<DeploymentSummary>, ControlPlaneError> {
        self.record(Call::ListDeployments {
            rest_api_id: rest_api_id.to_string(),
            page_size: page.page_size,
        });
        Ok(Page::last(self.deployments.clone()))
    }

    async fn get_stage(
        &self,
        rest_api_id: &RestApiId,
        stage: &StageName,
    ) -> Result<StageSnapshot, ControlPlaneError> {
        self.record(Call::GetStage {
            rest_api_id: rest_api_id.to_string(),
            stage: stage.to_string(),
        });
        self.stage.clone()
    }

    async fn create_stage(
        &self,
        rest_api_id: &RestApiId,
        stage: &StageName,
        deployment_id: &DeploymentId,
    ) -> Result<(), ControlPlaneError> {
        self.record(Call::CreateStage {
            rest_api_id: rest_api_id.to_string(),
            stage: stage.to_string(),
            deployment_id: deployment_id.to_string(),
        });
        Ok(())
    }

    async fn update_stage(
        &self,
        rest_api_id: &RestApiId,
        stage: &StageName,
        operations: &[PatchOperation],
    ) -> Result<(), ControlPlaneError> {
        self.record(Call::UpdateStage {
            rest_api_id: rest_api_id.to_string(),
            stage: stage.to_string(),
            operations: operations.to_vec(),
        });
        self.update_failure.clone().map_or(Ok(()), Err)
    }

    async fn tag_resource(
        &self,
        resource_arn: &str,
        tags: &BTreeMap<String, String>,
    ) -> Result<(), ControlPlaneError> {
        self.record(Call::TagResource {
            resource_arn: resource_arn.to_string(),
            tags: tags.clone(),
        });
        Ok(())
    }

    async fn untag_resource(
        &self,
        resource_arn: &str,
        tag_keys: &[String],
    ) -> Result<(), ControlPlaneError> {
        self.record(Call::UntagResource {
            resource_arn: resource_arn.to_string(),
            tag_keys: tag_keys.to_vec(),
        });
        Ok(())
    }

    async fn delete_log_group(&self, log_group_name: &str) -> Result<(), ControlPlaneError> {
        self.record(Call::DeleteLogGroup {
            log_group_name: log_group_name.to_string(),
        });
        self.log_group.clone()
    }
}

// ============================================================================
// SECTION: Sample Inputs
// ============================================================================

/// Plan context for service `my-service`, stage `dev`.
pub fn sample_context(region: &str, partition: &str) -> PlanContext {
    PlanContext {
        service: "my-service".to_string(),
        stage: StageName::new("dev"),
        region: region.to_string(),
        identity: AccountIdentity::new("123456", Partition::parse(partition)),
    }
}

/// Request targeting the `dev-my-service` API in `us-east-1`.
pub fn sample_request(desired: DesiredStageConfig) -> ReconcileRequest {
    ReconcileRequest {
        api: ApiReference::Declared("dev-my-service".to_string()),
        context: sample_context("us-east-1", "aws"),
        desired,
    }
}

/// Builds a string map from pairs.
pub fn string_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
}
