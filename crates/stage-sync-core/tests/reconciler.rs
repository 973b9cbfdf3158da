// crates/stage-sync-core/tests/reconciler.rs
// ============================================================================
// Module: Stage Reconciler Tests
// Description: End-to-end reconciliation runs against a recording control plane.
// ============================================================================
//! ## Overview
//! Asserts the exact control-plane call sequence for update, create,
//! external, unresolved, and failure paths.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use common::Call;
use common::FakeControlPlane;
use common::sample_context;
use common::sample_request;
use common::string_map;
use stage_sync_core::ApiReference;
use stage_sync_core::ControlPlaneError;
use stage_sync_core::DesiredStageConfig;
use stage_sync_core::PatchOperation;
use stage_sync_core::ReconcileError;
use stage_sync_core::ReconcileOptions;
use stage_sync_core::ReconcileRequest;
use stage_sync_core::ReconcileStatus;
use stage_sync_core::RestApiId;
use stage_sync_core::RestApiLogging;
use stage_sync_core::StageLookupPolicy;
use stage_sync_core::StageReconciler;
use stage_sync_core::TagValue;
use stage_sync_core::runtime::CleanupResult;
use stage_sync_core::runtime::DEFAULT_ACCESS_LOG_FORMAT;
use stage_sync_core::runtime::MemoryAuditSink;
use stage_sync_core::runtime::ReconcilePhase;
use stage_sync_core::runtime::settle_without_lookup;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds a reconciler with default options and an in-memory audit sink.
fn reconciler(fake: FakeControlPlane) -> StageReconciler<FakeControlPlane, MemoryAuditSink> {
    StageReconciler::new(fake, MemoryAuditSink::new(), ReconcileOptions::default())
}

/// Desired config with tracing, metrics, default logging, and one tag.
fn full_desired() -> DesiredStageConfig {
    DesiredStageConfig {
        tracing_enabled: Some(true),
        metrics_enabled: Some(true),
        logs: Some(RestApiLogging::default()),
        tags: string_map(&[("foo", "bar")]),
        ..DesiredStageConfig::default()
    }
}

/// Conventional stage ARN for the sample API in the commercial partition.
const DEV_STAGE_ARN: &str = "arn:aws:apigateway:us-east-1::/restapis/devRestApiId/stages/dev";

// ============================================================================
// SECTION: Update Path
// ============================================================================

/// An existing stage is patched, tagged, and untagged in that order.
#[tokio::test]
async fn existing_stage_is_patched_and_tagged() {
    let reconciler = reconciler(FakeControlPlane::standard());
    let outcome = reconciler.reconcile(&sample_request(full_desired())).await.unwrap();

    assert_eq!(outcome.status, ReconcileStatus::Applied);
    assert_eq!(outcome.rest_api_id, Some(RestApiId::new("devRestApiId")));
    assert!(!outcome.stage_created);
    assert_eq!(
        reconciler.control_plane().calls(),
        vec![
            Call::ListRestApis {
                page_size: 500,
                position: None,
            },
            Call::GetStage {
                rest_api_id: "devRestApiId".to_string(),
                stage: "dev".to_string(),
            },
            Call::UpdateStage {
                rest_api_id: "devRestApiId".to_string(),
                stage: "dev".to_string(),
                operations: vec![
                    PatchOperation::replace("/tracingEnabled", "true"),
                    PatchOperation::replace("/*/*/metrics/enabled", "true"),
                    PatchOperation::replace(
                        "/accessLogSettings/destinationArn",
                        "arn:aws:logs:us-east-1:123456:log-group:/aws/api-gateway/my-service-dev",
                    ),
                    PatchOperation::replace(
                        "/accessLogSettings/format",
                        DEFAULT_ACCESS_LOG_FORMAT,
                    ),
                    PatchOperation::replace("/*/*/logging/dataTrace", "true"),
                    PatchOperation::replace("/*/*/logging/loglevel", "INFO"),
                ],
            },
            Call::TagResource {
                resource_arn: DEV_STAGE_ARN.to_string(),
                tags: string_map(&[("foo", "bar")]),
            },
            Call::UntagResource {
                resource_arn: DEV_STAGE_ARN.to_string(),
                tag_keys: vec!["old".to_string()],
            },
        ]
    );
    assert_eq!(
        reconciler.audit().phases(),
        vec![
            ReconcilePhase::Located,
            ReconcilePhase::StagePatched,
            ReconcilePhase::TagsApplied,
            ReconcilePhase::TagsRemoved,
            ReconcilePhase::Completed,
        ]
    );
}

/// `GovCloud` accounts get `aws-us-gov` in every emitted ARN.
#[tokio::test]
async fn gov_partition_is_used_for_all_arns() {
    let reconciler = reconciler(FakeControlPlane::standard());
    let request = ReconcileRequest {
        context: sample_context("us-gov-east-1", "aws-us-gov"),
        ..sample_request(full_desired())
    };
    let outcome = reconciler.reconcile(&request).await.unwrap();

    assert!(outcome.patch_operations.contains(&PatchOperation::replace(
        "/accessLogSettings/destinationArn",
        "arn:aws-us-gov:logs:us-gov-east-1:123456:log-group:/aws/api-gateway/my-service-dev",
    )));
    let tag_arns: Vec<String> = reconciler
        .control_plane()
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::TagResource {
                resource_arn, ..
            }
            | Call::UntagResource {
                resource_arn, ..
            } => Some(resource_arn),
            _ => None,
        })
        .collect();
    assert_eq!(tag_arns.len(), 2);
    for arn in tag_arns {
        assert_eq!(arn, "arn:aws-us-gov:apigateway:us-gov-east-1::/restapis/devRestApiId/stages/dev");
    }
}

/// China regions get the `aws-cn` partition.
#[tokio::test]
async fn china_partition_is_used_for_all_arns() {
    let reconciler = reconciler(FakeControlPlane::standard());
    let request = ReconcileRequest {
        context: sample_context("cn-northwest-1", "aws-cn"),
        ..sample_request(full_desired())
    };
    let outcome = reconciler.reconcile(&request).await.unwrap();

    assert!(outcome.patch_operations.contains(&PatchOperation::replace(
        "/accessLogSettings/destinationArn",
        "arn:aws-cn:logs:cn-northwest-1:123456:log-group:/aws/api-gateway/my-service-dev",
    )));
    assert!(reconciler.control_plane().calls().contains(&Call::TagResource {
        resource_arn: "arn:aws-cn:apigateway:cn-northwest-1::/restapis/devRestApiId/stages/dev"
            .to_string(),
        tags: string_map(&[("foo", "bar")]),
    }));
}

/// Without any settings the run only looks up and cleans the log group.
#[tokio::test]
async fn unconfigured_stage_only_cleans_log_group() {
    let reconciler = reconciler(FakeControlPlane::standard().with_stage_tags(&[]));
    let outcome =
        reconciler.reconcile(&sample_request(DesiredStageConfig::default())).await.unwrap();

    assert_eq!(
        reconciler.control_plane().call_names(),
        vec!["list_rest_apis", "get_stage", "delete_log_group"]
    );
    assert!(outcome.patch_operations.is_empty());
    assert!(outcome.tag_delta.is_empty());
    assert_eq!(
        reconciler.control_plane().calls().last(),
        Some(&Call::DeleteLogGroup {
            log_group_name: "/aws/api-gateway/my-service-dev".to_string(),
        })
    );
}

/// Disabling access logging removes the settings and deletes the log group.
#[tokio::test]
async fn disabled_access_logging_removes_settings_and_log_group() {
    let reconciler = reconciler(FakeControlPlane::standard().with_stage_tags(&[]));
    let desired = DesiredStageConfig {
        logs: Some(RestApiLogging {
            access_logging: false,
            ..RestApiLogging::default()
        }),
        ..DesiredStageConfig::default()
    };
    let outcome = reconciler.reconcile(&sample_request(desired)).await.unwrap();

    assert_eq!(
        outcome.patch_operations,
        vec![
            PatchOperation::remove("/accessLogSettings"),
            PatchOperation::replace("/*/*/logging/dataTrace", "true"),
            PatchOperation::replace("/*/*/logging/loglevel", "INFO"),
        ]
    );
    assert!(
        outcome
            .patch_operations
            .iter()
            .all(|op| !op.path.starts_with("/accessLogSettings/"))
    );
    let cleanup = outcome.log_group_cleanup.unwrap();
    assert_eq!(cleanup.log_group_name, "/aws/api-gateway/my-service-dev");
    assert_eq!(cleanup.result, CleanupResult::Deleted);
    assert_eq!(
        reconciler.control_plane().call_names(),
        vec!["list_rest_apis", "get_stage", "update_stage", "delete_log_group"]
    );
}

/// A log group that is already gone counts as a successful cleanup.
#[tokio::test]
async fn missing_log_group_is_not_an_error() {
    let fake = FakeControlPlane::standard()
        .with_stage_tags(&[])
        .with_log_group_error(ControlPlaneError::NotFound("log group".to_string()));
    let reconciler = reconciler(fake);
    let outcome =
        reconciler.reconcile(&sample_request(DesiredStageConfig::default())).await.unwrap();

    assert_eq!(outcome.log_group_cleanup.unwrap().result, CleanupResult::AlreadyAbsent);
    assert!(reconciler.audit().phases().contains(&ReconcilePhase::LogGroupAbsent));
}

/// Log group deletion failures other than not-found abort the run.
#[tokio::test]
async fn log_group_access_denied_is_fatal() {
    let fake = FakeControlPlane::standard()
        .with_stage_tags(&[])
        .with_log_group_error(ControlPlaneError::AccessDenied("logs:DeleteLogGroup".to_string()));
    let reconciler = reconciler(fake);
    let err =
        reconciler.reconcile(&sample_request(DesiredStageConfig::default())).await.unwrap_err();

    assert!(matches!(err, ReconcileError::ControlPlane(ControlPlaneError::AccessDenied(_))));
    assert_eq!(reconciler.audit().phases().last(), Some(&ReconcilePhase::Failed));
}

/// Update failures propagate and stop the run before tagging.
#[tokio::test]
async fn update_failure_stops_before_tagging() {
    let fake = FakeControlPlane::standard()
        .with_update_failure(ControlPlaneError::Service("BadRequestException".to_string()));
    let reconciler = reconciler(fake);
    let err = reconciler.reconcile(&sample_request(full_desired())).await.unwrap_err();

    assert!(matches!(err, ReconcileError::ControlPlane(ControlPlaneError::Service(_))));
    assert_eq!(
        reconciler.control_plane().call_names(),
        vec!["list_rest_apis", "get_stage", "update_stage"]
    );
}

/// Observed tags that already match produce no tag calls.
#[tokio::test]
async fn matching_tags_issue_no_tag_calls() {
    let fake = FakeControlPlane::standard().with_stage_tags(&[("foo", "bar")]);
    let reconciler = reconciler(fake);
    let outcome = reconciler.reconcile(&sample_request(full_desired())).await.unwrap();

    assert!(outcome.tag_delta.is_empty());
    assert_eq!(
        reconciler.control_plane().call_names(),
        vec!["list_rest_apis", "get_stage", "update_stage"]
    );
}

/// Stack tags and resource tags merge with resource tags winning.
#[tokio::test]
async fn stack_and_resource_tags_are_merged() {
    let reconciler = reconciler(FakeControlPlane::standard());
    let desired = DesiredStageConfig {
        tags: string_map(&[("bar", "high-priority")]),
        stack_tags: [
            ("bar".to_string(), TagValue::from("low-priority")),
            ("num".to_string(), TagValue::from(123)),
        ]
        .into_iter()
        .collect(),
        ..DesiredStageConfig::default()
    };
    let outcome = reconciler.reconcile(&sample_request(desired)).await.unwrap();

    assert_eq!(outcome.tag_delta.to_set, string_map(&[("bar", "high-priority"), ("num", "123")]));
    assert_eq!(outcome.tag_delta.to_remove, vec!["old".to_string()]);
}

/// Platform-owned `aws:` tags survive even when not desired.
#[tokio::test]
async fn reserved_tags_are_never_removed() {
    let fake = FakeControlPlane::standard()
        .with_stage_tags(&[("aws:cloudformation:stack-name", "stack"), ("old", "tag")]);
    let reconciler = reconciler(fake);
    let outcome = reconciler.reconcile(&sample_request(full_desired())).await.unwrap();

    assert_eq!(outcome.tag_delta.to_remove, vec!["old".to_string()]);
}

// ============================================================================
// SECTION: Create Path
// ============================================================================

/// A missing stage is created from the first deployment before patching.
#[tokio::test]
async fn absent_stage_is_created_from_first_deployment() {
    let fake = FakeControlPlane::standard()
        .with_deployments(&["someDeploymentId", "olderDeploymentId"])
        .with_stage_error(ControlPlaneError::NotFound("stage".to_string()));
    let reconciler = reconciler(fake);
    let outcome = reconciler.reconcile(&sample_request(full_desired())).await.unwrap();

    assert!(outcome.stage_created);
    let calls = reconciler.control_plane().calls();
    assert_eq!(
        calls.iter().map(Call::name).collect::<Vec<_>>(),
        vec![
            "list_rest_apis",
            "get_stage",
            "list_deployments",
            "create_stage",
            "update_stage",
            "tag_resource",
        ]
    );
    assert_eq!(
        calls[2],
        Call::ListDeployments {
            rest_api_id: "devRestApiId".to_string(),
            page_size: 500,
        }
    );
    assert_eq!(
        calls[3],
        Call::CreateStage {
            rest_api_id: "devRestApiId".to_string(),
            stage: "dev".to_string(),
            deployment_id: "someDeploymentId".to_string(),
        }
    );
    assert_eq!(
        reconciler.audit().phases(),
        vec![
            ReconcilePhase::Located,
            ReconcilePhase::StageAbsent,
            ReconcilePhase::StageCreated,
            ReconcilePhase::StagePatched,
            ReconcilePhase::TagsApplied,
            ReconcilePhase::Completed,
        ]
    );
}

/// Creating a stage on an API with no deployments is fatal.
#[tokio::test]
async fn absent_stage_without_deployment_fails() {
    let fake = FakeControlPlane::standard()
        .with_deployments(&[])
        .with_stage_error(ControlPlaneError::NotFound("stage".to_string()));
    let reconciler = reconciler(fake);
    let err = reconciler.reconcile(&sample_request(full_desired())).await.unwrap_err();

    assert_eq!(err, ReconcileError::NoDeploymentFound("devRestApiId".to_string()));
    assert_eq!(
        reconciler.control_plane().call_names(),
        vec!["list_rest_apis", "get_stage", "list_deployments"]
    );
}

/// The default lenient lookup treats any stage failure as absence.
#[tokio::test]
async fn lenient_lookup_creates_on_any_failure() {
    let fake = FakeControlPlane::standard()
        .with_stage_error(ControlPlaneError::Transport("timeout".to_string()));
    let reconciler = reconciler(fake);
    let outcome = reconciler.reconcile(&sample_request(full_desired())).await.unwrap();

    assert!(outcome.stage_created);
}

/// The strict lookup only creates on not-found and propagates the rest.
#[tokio::test]
async fn strict_lookup_propagates_non_not_found_failures() {
    let fake = FakeControlPlane::standard()
        .with_stage_error(ControlPlaneError::Transport("timeout".to_string()));
    let options = ReconcileOptions {
        stage_lookup: StageLookupPolicy::Strict,
        ..ReconcileOptions::default()
    };
    let reconciler = StageReconciler::new(fake, MemoryAuditSink::new(), options);
    let err = reconciler.reconcile(&sample_request(full_desired())).await.unwrap_err();

    assert_eq!(err, ReconcileError::ControlPlane(ControlPlaneError::Transport("timeout".to_string())));
    assert_eq!(reconciler.control_plane().call_names(), vec!["list_rest_apis", "get_stage"]);
}

/// The strict lookup still takes the create branch on not-found.
#[tokio::test]
async fn strict_lookup_creates_on_not_found() {
    let fake = FakeControlPlane::standard()
        .with_stage_error(ControlPlaneError::NotFound("stage".to_string()));
    let options = ReconcileOptions {
        stage_lookup: StageLookupPolicy::Strict,
        ..ReconcileOptions::default()
    };
    let reconciler = StageReconciler::new(fake, MemoryAuditSink::new(), options);
    let outcome = reconciler.reconcile(&sample_request(full_desired())).await.unwrap();

    assert!(outcome.stage_created);
}

// ============================================================================
// SECTION: Skipped Runs
// ============================================================================

/// Externally managed APIs are skipped without any call.
#[tokio::test]
async fn external_api_makes_no_calls() {
    let reconciler = reconciler(FakeControlPlane::standard());
    let request = ReconcileRequest {
        api: ApiReference::External("xyz123".to_string()),
        ..sample_request(full_desired())
    };
    let outcome = reconciler.reconcile(&request).await.unwrap();

    assert_eq!(outcome.status, ReconcileStatus::External);
    assert_eq!(outcome.external_reference.as_deref(), Some("xyz123"));
    assert!(reconciler.control_plane().calls().is_empty());
    assert_eq!(reconciler.audit().phases(), vec![ReconcilePhase::External]);
}

/// Without a declared API name nothing is called.
#[tokio::test]
async fn undeclared_api_makes_no_calls() {
    let reconciler = reconciler(FakeControlPlane::standard());
    let request = ReconcileRequest {
        api: ApiReference::Undeclared,
        ..sample_request(full_desired())
    };
    let outcome = reconciler.reconcile(&request).await.unwrap();

    assert_eq!(outcome.status, ReconcileStatus::NoOp);
    assert!(reconciler.control_plane().calls().is_empty());
}

/// References that need no lookup settle without a control plane.
#[test]
fn references_settle_without_lookup() {
    let audit = MemoryAuditSink::new();
    let context = sample_context("us-east-1", "aws");

    let external = settle_without_lookup(
        &audit,
        &context.service,
        &context.stage,
        &ApiReference::External("xyz123".to_string()),
    )
    .unwrap();
    let undeclared =
        settle_without_lookup(&audit, &context.service, &context.stage, &ApiReference::Undeclared)
            .unwrap();
    let declared = settle_without_lookup(
        &audit,
        &context.service,
        &context.stage,
        &ApiReference::Declared("dev-my-service".to_string()),
    );

    assert_eq!(external.status, ReconcileStatus::External);
    assert_eq!(undeclared.status, ReconcileStatus::NoOp);
    assert!(declared.is_none());
    assert_eq!(audit.phases(), vec![ReconcilePhase::External, ReconcilePhase::Unresolved]);
}

/// An unmatched API name ends the run after the listing.
#[tokio::test]
async fn unmatched_api_name_is_a_no_op() {
    let reconciler = reconciler(FakeControlPlane::standard());
    let request = ReconcileRequest {
        api: ApiReference::Declared("DEV-MY-SERVICE".to_string()),
        ..sample_request(full_desired())
    };
    let outcome = reconciler.reconcile(&request).await.unwrap();

    assert_eq!(outcome.status, ReconcileStatus::NoOp);
    assert_eq!(reconciler.control_plane().call_names(), vec!["list_rest_apis"]);
}

/// A custom API name resolves to its own id.
#[tokio::test]
async fn custom_api_name_resolves() {
    let reconciler = reconciler(FakeControlPlane::standard());
    let request = ReconcileRequest {
        api: ApiReference::Declared("custom-rest-api-name".to_string()),
        ..sample_request(full_desired())
    };
    let outcome = reconciler.reconcile(&request).await.unwrap();

    assert_eq!(outcome.rest_api_id, Some(RestApiId::new("customRestApiId")));
    assert!(reconciler.control_plane().calls().contains(&Call::GetStage {
        rest_api_id: "customRestApiId".to_string(),
        stage: "dev".to_string(),
    }));
}

// ============================================================================
// SECTION: Pagination
// ============================================================================

/// A match on the second page is found after exactly two listing calls.
#[tokio::test]
async fn match_on_second_page_is_resolved() {
    let fake = FakeControlPlane::new()
        .with_rest_api_page(None, &[], Some("page-2"))
        .with_rest_api_page(Some("page-2"), &[("dev-my-service", "devRestApiId")], None);
    let reconciler = reconciler(fake);
    let outcome = reconciler.reconcile(&sample_request(full_desired())).await.unwrap();

    assert_eq!(outcome.rest_api_id, Some(RestApiId::new("devRestApiId")));
    let listings: Vec<Call> = reconciler
        .control_plane()
        .calls()
        .into_iter()
        .filter(|call| matches!(call, Call::ListRestApis { .. }))
        .collect();
    assert_eq!(
        listings,
        vec![
            Call::ListRestApis {
                page_size: 500,
                position: None,
            },
            Call::ListRestApis {
                page_size: 500,
                position: Some("page-2".to_string()),
            },
        ]
    );
}

/// A listing that repeats its continuation token fails the run.
#[tokio::test]
async fn repeating_continuation_token_fails() {
    let fake = FakeControlPlane::new()
        .with_rest_api_page(None, &[], Some("loop"))
        .with_rest_api_page(Some("loop"), &[], Some("loop"));
    let reconciler = reconciler(fake);
    let err = reconciler.reconcile(&sample_request(full_desired())).await.unwrap_err();

    assert_eq!(err, ReconcileError::PaginationStalled("loop".to_string()));
    assert_eq!(reconciler.control_plane().call_names(), vec!["list_rest_apis", "list_rest_apis"]);
}

/// A listing that cycles back to an earlier token fails the run.
#[tokio::test]
async fn cycling_continuation_tokens_fail() {
    let fake = FakeControlPlane::new()
        .with_rest_api_page(None, &[], Some("a"))
        .with_rest_api_page(Some("a"), &[], Some("b"))
        .with_rest_api_page(Some("b"), &[], Some("a"));
    let reconciler = reconciler(fake);
    let err = reconciler.reconcile(&sample_request(full_desired())).await.unwrap_err();

    assert_eq!(err, ReconcileError::PaginationStalled("a".to_string()));
    assert_eq!(
        reconciler.control_plane().call_names(),
        vec!["list_rest_apis", "list_rest_apis", "list_rest_apis"]
    );
}

/// Configured page sizes are passed through to listing calls.
#[tokio::test]
async fn configured_page_size_is_used() {
    let options = ReconcileOptions {
        page_size: 25,
        ..ReconcileOptions::default()
    };
    let reconciler =
        StageReconciler::new(FakeControlPlane::standard(), MemoryAuditSink::new(), options);
    reconciler.reconcile(&sample_request(full_desired())).await.unwrap();

    assert_eq!(
        reconciler.control_plane().calls()[0],
        Call::ListRestApis {
            page_size: 25,
            position: None,
        }
    );
}

// ============================================================================
// SECTION: Outcome Reporting
// ============================================================================

/// Outcomes serialize to JSON with snake-case status names.
#[tokio::test]
async fn outcome_serializes_to_json() {
    let reconciler = reconciler(FakeControlPlane::standard());
    let outcome = reconciler.reconcile(&sample_request(full_desired())).await.unwrap();
    let json = serde_json::to_value(&outcome).unwrap();

    assert_eq!(json["status"], "applied");
    assert_eq!(json["rest_api_id"], "devRestApiId");
    assert_eq!(json["patch_operations"][0]["op"], "replace");
    assert_eq!(json["tag_delta"]["to_remove"][0], "old");
}
