// crates/stage-sync-aws/src/lib.rs
// ============================================================================
// Module: Stage Sync AWS Library
// Description: AWS SDK implementations of the stage sync interfaces.
// Purpose: Connect the transport-agnostic reconciler to API Gateway,
//          CloudWatch Logs, and STS.
// Dependencies: aws-config, aws-sdk-apigateway, aws-sdk-cloudwatchlogs,
//               aws-sdk-sts, stage-sync-core
// ============================================================================

//! ## Overview
//! [`AwsStageControlPlane`] implements
//! [`stage_sync_core::StageControlPlane`] and [`StsIdentityResolver`]
//! implements [`stage_sync_core::IdentityResolver`]. Retries, timeouts, and
//! credentials come from the SDK's shared configuration.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;
pub mod control_plane;
pub mod errors;
pub mod identity;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::AwsClientSettings;
pub use client::AwsClients;
pub use client::AwsSetupError;
pub use control_plane::AwsStageControlPlane;
pub use errors::classify_error_code;
pub use identity::StsIdentityResolver;
pub use identity::identity_from_caller;
