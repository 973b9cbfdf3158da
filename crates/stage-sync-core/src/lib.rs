// crates/stage-sync-core/src/lib.rs
// ============================================================================
// Module: Stage Sync Core Library
// Description: Public API surface for API Gateway stage reconciliation.
// Purpose: Expose core types, interfaces, and runtime components.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Stage Sync reconciles an existing API Gateway REST API stage against the
//! settings and tags a deployment asks for. It patches the stage instead of
//! replacing it. The REST API is located by name through paginated listing.
//! Missing APIs, stages, and log groups are ordinary branches, not errors.
//! The crate is transport-agnostic and talks to the cloud only through
//! [`StageControlPlane`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::ControlPlaneError;
pub use interfaces::DeploymentSummary;
pub use interfaces::IdentityError;
pub use interfaces::IdentityResolver;
pub use interfaces::Page;
pub use interfaces::PageRequest;
pub use interfaces::RestApiSummary;
pub use interfaces::StageControlPlane;
pub use interfaces::StageSnapshot;
pub use interfaces::StaticIdentityResolver;
pub use runtime::PatchPlanner;
pub use runtime::PlanContext;
pub use runtime::ReconcileError;
pub use runtime::ReconcileOptions;
pub use runtime::ReconcileOutcome;
pub use runtime::ReconcileRequest;
pub use runtime::ReconcileStatus;
pub use runtime::StageLookupPolicy;
pub use runtime::StagePlan;
pub use runtime::StageReconciler;
pub use runtime::TagReconciler;
