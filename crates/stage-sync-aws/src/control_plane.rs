// crates/stage-sync-aws/src/control_plane.rs
// ============================================================================
// Module: AWS Stage Control Plane
// Description: API Gateway and CloudWatch Logs backed StageControlPlane.
// Purpose: Translate control-plane calls into SDK requests and back.
// Dependencies: aws-sdk-apigateway, aws-sdk-cloudwatchlogs, stage-sync-core
// ============================================================================

//! ## Overview
//! Each trait method issues exactly one SDK request. Paging stays with the
//! caller, which passes the continuation token back in on the next call.
//! Listing entries without an id are skipped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_apigateway::types::Op;
use stage_sync_core::ControlPlaneError;
use stage_sync_core::DeploymentId;
use stage_sync_core::DeploymentSummary;
use stage_sync_core::Page;
use stage_sync_core::PageRequest;
use stage_sync_core::PatchOp;
use stage_sync_core::PatchOperation;
use stage_sync_core::RestApiId;
use stage_sync_core::RestApiSummary;
use stage_sync_core::StageControlPlane;
use stage_sync_core::StageName;
use stage_sync_core::StageSnapshot;

use crate::client::AwsClients;
use crate::errors::control_plane_error;

// ============================================================================
// SECTION: Control Plane
// ============================================================================

/// [`StageControlPlane`] backed by the AWS SDK.
#[derive(Debug, Clone)]
pub struct AwsStageControlPlane {
    /// API Gateway client.
    apigateway: aws_sdk_apigateway::Client,
    /// `CloudWatch` Logs client.
    logs: aws_sdk_cloudwatchlogs::Client,
}

impl AwsStageControlPlane {
    /// Creates a control plane from explicit clients.
    #[must_use]
    pub const fn new(
        apigateway: aws_sdk_apigateway::Client,
        logs: aws_sdk_cloudwatchlogs::Client,
    ) -> Self {
        Self {
            apigateway,
            logs,
        }
    }

    /// Creates a control plane from a loaded client set.
    #[must_use]
    pub fn from_clients(clients: &AwsClients) -> Self {
        Self::new(clients.apigateway.clone(), clients.logs.clone())
    }
}

#[async_trait]
impl StageControlPlane for AwsStageControlPlane {
    async fn list_rest_apis(
        &self,
        page: PageRequest,
    ) -> Result<Page<RestApiSummary>, ControlPlaneError> {
        let output = self
            .apigateway
            .get_rest_apis()
            .limit(sdk_limit(page.page_size))
            .set_position(page.position)
            .send()
            .await
            .map_err(|err| control_plane_error("GetRestApis", &err))?;
        let items = output
            .items()
            .iter()
            .filter_map(|api| {
                api.id().map(|id| RestApiSummary {
                    id: RestApiId::new(id),
                    name: api.name().unwrap_or_default().to_string(),
                })
            })
            .collect();
        Ok(Page {
            items,
            next_position: output.position().map(str::to_string),
        })
    }

    async fn list_deployments(
        &self,
        rest_api_id: &RestApiId,
        page: PageRequest,
    ) -> Result<Page<DeploymentSummary>, ControlPlaneError> {
        let output = self
            .apigateway
            .get_deployments()
            .rest_api_id(rest_api_id.as_str())
            .limit(sdk_limit(page.page_size))
            .set_position(page.position)
            .send()
            .await
            .map_err(|err| control_plane_error("GetDeployments", &err))?;
        let items = output
            .items()
            .iter()
            .filter_map(|deployment| {
                deployment.id().map(|id| DeploymentSummary {
                    id: DeploymentId::new(id),
                })
            })
            .collect();
        Ok(Page {
            items,
            next_position: output.position().map(str::to_string),
        })
    }

    async fn get_stage(
        &self,
        rest_api_id: &RestApiId,
        stage: &StageName,
    ) -> Result<StageSnapshot, ControlPlaneError> {
        let output = self
            .apigateway
            .get_stage()
            .rest_api_id(rest_api_id.as_str())
            .stage_name(stage.as_str())
            .send()
            .await
            .map_err(|err| control_plane_error("GetStage", &err))?;
        Ok(StageSnapshot {
            tags: sorted(output.tags()),
            variables: sorted(output.variables()),
        })
    }

    async fn create_stage(
        &self,
        rest_api_id: &RestApiId,
        stage: &StageName,
        deployment_id: &DeploymentId,
    ) -> Result<(), ControlPlaneError> {
        self.apigateway
            .create_stage()
            .rest_api_id(rest_api_id.as_str())
            .stage_name(stage.as_str())
            .deployment_id(deployment_id.as_str())
            .send()
            .await
            .map_err(|err| control_plane_error("CreateStage", &err))?;
        Ok(())
    }

    async fn update_stage(
        &self,
        rest_api_id: &RestApiId,
        stage: &StageName,
        operations: &[PatchOperation],
    ) -> Result<(), ControlPlaneError> {
        let patch = operations.iter().map(sdk_patch_operation).collect();
        self.apigateway
            .update_stage()
            .rest_api_id(rest_api_id.as_str())
            .stage_name(stage.as_str())
            .set_patch_operations(Some(patch))
            .send()
            .await
            .map_err(|err| control_plane_error("UpdateStage", &err))?;
        Ok(())
    }

    async fn tag_resource(
        &self,
        resource_arn: &str,
        tags: &BTreeMap<String, String>,
    ) -> Result<(), ControlPlaneError> {
        let tags: HashMap<String, String> =
            tags.iter().map(|(key, value)| (key.clone(), value.clone())).collect();
        self.apigateway
            .tag_resource()
            .resource_arn(resource_arn)
            .set_tags(Some(tags))
            .send()
            .await
            .map_err(|err| control_plane_error("TagResource", &err))?;
        Ok(())
    }

    async fn untag_resource(
        &self,
        resource_arn: &str,
        tag_keys: &[String],
    ) -> Result<(), ControlPlaneError> {
        self.apigateway
            .untag_resource()
            .resource_arn(resource_arn)
            .set_tag_keys(Some(tag_keys.to_vec()))
            .send()
            .await
            .map_err(|err| control_plane_error("UntagResource", &err))?;
        Ok(())
    }

    async fn delete_log_group(&self, log_group_name: &str) -> Result<(), ControlPlaneError> {
        self.logs
            .delete_log_group()
            .log_group_name(log_group_name)
            .send()
            .await
            .map_err(|err| control_plane_error("DeleteLogGroup", &err))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Conversions
// ============================================================================

/// Converts a page size to the SDK's signed limit.
fn sdk_limit(page_size: u32) -> i32 {
    i32::try_from(page_size).unwrap_or(i32::MAX)
}

/// Copies an optional SDK map into a sorted map.
fn sorted(map: Option<&HashMap<String, String>>) -> BTreeMap<String, String> {
    map.map(|map| map.iter().map(|(key, value)| (key.clone(), value.clone())).collect())
        .unwrap_or_default()
}

/// Converts a patch operation into its SDK shape.
fn sdk_patch_operation(operation: &PatchOperation) -> aws_sdk_apigateway::types::PatchOperation {
    let op = match operation.op {
        PatchOp::Replace => Op::Replace,
        PatchOp::Remove => Op::Remove,
    };
    aws_sdk_apigateway::types::PatchOperation::builder()
        .op(op)
        .path(operation.path.clone())
        .set_value(operation.value.clone())
        .build()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    //! Unit checks for SDK shape conversions.

    use super::*;

    /// Replace operations carry their value and removals carry none.
    #[test]
    fn patch_operations_convert_to_sdk_shape() {
        let replace = sdk_patch_operation(&PatchOperation::replace("/tracingEnabled", true));
        assert_eq!(replace.op(), Some(&Op::Replace));
        assert_eq!(replace.path(), Some("/tracingEnabled"));
        assert_eq!(replace.value(), Some("true"));

        let remove = sdk_patch_operation(&PatchOperation::remove("/accessLogSettings"));
        assert_eq!(remove.op(), Some(&Op::Remove));
        assert_eq!(remove.value(), None);
    }

    /// Page sizes beyond the signed range saturate.
    #[test]
    fn page_size_saturates() {
        assert_eq!(sdk_limit(500), 500);
        assert_eq!(sdk_limit(u32::MAX), i32::MAX);
    }

    /// Missing maps become empty maps and present maps are sorted.
    #[test]
    fn optional_maps_are_sorted() {
        assert!(sorted(None).is_empty());
        let map = HashMap::from([
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "1".to_string()),
        ]);
        let keys: Vec<_> = sorted(Some(&map)).into_keys().collect();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }
}
