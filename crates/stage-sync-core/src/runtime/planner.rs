// crates/stage-sync-core/src/runtime/planner.rs
// ============================================================================
// Module: Patch Planner
// Description: Computes stage patch operations from desired settings.
// Purpose: Emit a minimal, order-stable operation list instead of overwriting.
// Dependencies: crate::core, serde
// ============================================================================

//! ## Overview
//! Planning is pure: the same desired config and context always produce the
//! same operations in the same order. An operation is emitted only for a
//! setting the desired config names. Order does not affect correctness
//! because the update call applies the list atomically, but a fixed order
//! keeps emitted plans comparable between runs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::AccountIdentity;
use crate::core::DesiredStageConfig;
use crate::core::PatchOperation;
use crate::core::RestApiLogging;
use crate::core::StageName;
use crate::core::access_log_group_name;
use crate::core::log_group_arn;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default access log format: one `label: $context.field` entry per field.
pub const DEFAULT_ACCESS_LOG_FORMAT: &str = "requestId: $context.requestId, ip: \
     $context.identity.sourceIp, caller: $context.identity.caller, user: \
     $context.identity.user, requestTime: $context.requestTime, httpMethod: \
     $context.httpMethod, resourcePath: $context.resourcePath, status: \
     $context.status, protocol: $context.protocol, responseLength: \
     $context.responseLength";

/// Stage tracing toggle.
pub const PATH_TRACING_ENABLED: &str = "/tracingEnabled";
/// Method-wide metrics toggle.
pub const PATH_METRICS_ENABLED: &str = "/*/*/metrics/enabled";
/// Whole access log settings block.
pub const PATH_ACCESS_LOG_SETTINGS: &str = "/accessLogSettings";
/// Access log destination.
pub const PATH_ACCESS_LOG_DESTINATION: &str = "/accessLogSettings/destinationArn";
/// Access log format.
pub const PATH_ACCESS_LOG_FORMAT: &str = "/accessLogSettings/format";
/// Method-wide data trace toggle.
pub const PATH_DATA_TRACE: &str = "/*/*/logging/dataTrace";
/// Method-wide execution log level.
pub const PATH_LOG_LEVEL: &str = "/*/*/logging/loglevel";

// ============================================================================
// SECTION: Plan Types
// ============================================================================

/// Deployment facts needed to derive names and ARNs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanContext {
    /// Service name from the deployment descriptor.
    pub service: String,
    /// Stage being reconciled.
    pub stage: StageName,
    /// Deployment region.
    pub region: String,
    /// Caller account identity.
    pub identity: AccountIdentity,
}

impl PlanContext {
    /// Returns the conventional access-log group name for this stage.
    #[must_use]
    pub fn log_group_name(&self) -> String {
        access_log_group_name(&self.service, &self.stage)
    }
}

/// Planned stage changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagePlan {
    /// Ordered patch operations; empty means no update call.
    pub operations: Vec<PatchOperation>,
    /// Log group to delete because access logging is off.
    pub log_group_cleanup: Option<String>,
}

// ============================================================================
// SECTION: Planner
// ============================================================================

/// Computes stage patch operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatchPlanner;

impl PatchPlanner {
    /// Plans the patch operations and cleanup for one stage.
    #[must_use]
    pub fn plan(desired: &DesiredStageConfig, context: &PlanContext) -> StagePlan {
        let mut operations = Vec::new();
        if let Some(tracing) = desired.tracing_enabled {
            operations.push(PatchOperation::replace(PATH_TRACING_ENABLED, tracing));
        }
        if let Some(metrics) = desired.metrics_enabled {
            operations.push(PatchOperation::replace(PATH_METRICS_ENABLED, metrics));
        }
        if let Some(logs) = &desired.logs {
            plan_logging(logs, context, &mut operations);
        }
        let log_group_cleanup =
            (!desired.access_logging_enabled()).then(|| context.log_group_name());
        StagePlan {
            operations,
            log_group_cleanup,
        }
    }
}

/// Appends access and execution logging operations.
fn plan_logging(logs: &RestApiLogging, context: &PlanContext, operations: &mut Vec<PatchOperation>) {
    if logs.access_logging {
        let destination =
            log_group_arn(&context.identity, &context.region, &context.log_group_name());
        let format = logs.access_log_format.as_deref().unwrap_or(DEFAULT_ACCESS_LOG_FORMAT);
        operations.push(PatchOperation::replace(PATH_ACCESS_LOG_DESTINATION, destination));
        operations.push(PatchOperation::replace(PATH_ACCESS_LOG_FORMAT, format));
    } else {
        operations.push(PatchOperation::remove(PATH_ACCESS_LOG_SETTINGS));
    }
    operations.push(PatchOperation::replace(PATH_DATA_TRACE, logs.effective_data_trace()));
    operations.push(PatchOperation::replace(PATH_LOG_LEVEL, logs.effective_log_level()));
}

// ============================================================================
// SECTION: Tests
// ============================================================================
