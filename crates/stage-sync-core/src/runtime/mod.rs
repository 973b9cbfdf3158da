// crates/stage-sync-core/src/runtime/mod.rs
// ============================================================================
// Module: Stage Sync Runtime
// Description: Resolution, inspection, planning, and orchestration components.
// Purpose: Group the reconciliation pipeline and its building blocks.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime components are listed leaf-first: paging, locators, fetcher,
//! planner, tag reconciler, cleaner, and the reconciler that sequences them.
//! Components borrow the control plane for the duration of one call and keep
//! nothing afterwards.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;
pub mod cleanup;
pub mod fetcher;
pub mod locator;
pub mod paging;
pub mod planner;
pub mod reconciler;
pub mod tags;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::FileAuditSink;
pub use audit::MemoryAuditSink;
pub use audit::NoopAuditSink;
pub use audit::ReconcileAuditEvent;
pub use audit::ReconcileAuditSink;
pub use audit::ReconcilePhase;
pub use audit::StderrAuditSink;
pub use cleanup::CleanupResult;
pub use cleanup::LogGroupCleaner;
pub use cleanup::LogGroupCleanup;
pub use fetcher::StageLookupPolicy;
pub use fetcher::StageStateFetcher;
pub use locator::DeploymentLocator;
pub use locator::ResourceLocator;
pub use paging::MAX_PAGE_SIZE;
pub use paging::PagedSearch;
pub use paging::PagedSource;
pub use paging::PagingError;
pub use planner::DEFAULT_ACCESS_LOG_FORMAT;
pub use planner::PatchPlanner;
pub use planner::PlanContext;
pub use planner::StagePlan;
pub use reconciler::ReconcileError;
pub use reconciler::ReconcileOptions;
pub use reconciler::ReconcileOutcome;
pub use reconciler::ReconcileRequest;
pub use reconciler::ReconcileStatus;
pub use reconciler::StageReconciler;
pub use reconciler::settle_without_lookup;
pub use tags::RESERVED_TAG_PREFIX;
pub use tags::TagReconciler;
