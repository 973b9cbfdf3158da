// crates/stage-sync-core/src/core/mod.rs
// ============================================================================
// Module: Stage Sync Core Types
// Description: Identifiers, ARNs, desired configuration, and per-run state.
// Purpose: Provide stable, serializable types shared by the runtime and adapters.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Core types are plain values with no I/O. The runtime consumes them and the
//! adapters (config, AWS, CLI) produce or report them.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod arn;
pub mod desired;
pub mod identifiers;
pub mod state;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use arn::AccountIdentity;
pub use arn::InvalidPartitionError;
pub use arn::Partition;
pub use arn::access_log_group_name;
pub use arn::build_arn;
pub use arn::log_group_arn;
pub use arn::stage_arn;
pub use desired::DesiredStageConfig;
pub use desired::LogLevel;
pub use desired::RestApiLogging;
pub use desired::TagValue;
pub use identifiers::AccountId;
pub use identifiers::DeploymentId;
pub use identifiers::RestApiId;
pub use identifiers::StageName;
pub use state::ApiReference;
pub use state::ObservedStageState;
pub use state::PatchOp;
pub use state::PatchOperation;
pub use state::ResolvedResourceId;
pub use state::TagDelta;
