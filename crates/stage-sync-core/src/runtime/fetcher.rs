// crates/stage-sync-core/src/runtime/fetcher.rs
// ============================================================================
// Module: Stage State Fetcher
// Description: Reads current stage tags and variables, mapping failure to absence.
// Purpose: Drive the create-or-update branch from a single stage lookup.
// Dependencies: crate::{core, interfaces}, serde
// ============================================================================

//! ## Overview
//! The lenient policy treats every lookup failure as "stage absent", which
//! keeps create-or-update behavior idempotent but can misread a transient
//! error as absence. The strict policy only accepts
//! [`ControlPlaneError::NotFound`] as absence and propagates everything else.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::ObservedStageState;
use crate::core::RestApiId;
use crate::core::StageName;
use crate::interfaces::ControlPlaneError;
use crate::interfaces::StageControlPlane;

// ============================================================================
// SECTION: Lookup Policy
// ============================================================================

/// How stage lookup failures are classified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageLookupPolicy {
    /// Any failure means the stage is absent.
    #[default]
    Lenient,
    /// Only a not-found failure means absent; others propagate.
    Strict,
}

// ============================================================================
// SECTION: Fetcher
// ============================================================================

/// Fetches observed stage state.
pub struct StageStateFetcher<'a, C: ?Sized> {
    /// Control plane used for the lookup.
    control_plane: &'a C,
    /// Failure classification policy.
    policy: StageLookupPolicy,
}

impl<'a, C> StageStateFetcher<'a, C>
where
    C: StageControlPlane + ?Sized,
{
    /// Creates a fetcher.
    #[must_use]
    pub const fn new(control_plane: &'a C, policy: StageLookupPolicy) -> Self {
        Self {
            control_plane,
            policy,
        }
    }

    /// Reads the stage, returning [`ObservedStageState::absent`] when it
    /// cannot be found.
    ///
    /// # Errors
    ///
    /// Returns [`ControlPlaneError`] only under [`StageLookupPolicy::Strict`]
    /// for failures other than not-found.
    pub async fn fetch(
        &self,
        rest_api_id: &RestApiId,
        stage: &StageName,
    ) -> Result<ObservedStageState, ControlPlaneError> {
        match self.control_plane.get_stage(rest_api_id, stage).await {
            Ok(snapshot) => Ok(ObservedStageState {
                exists: true,
                tags: snapshot.tags,
                variables: snapshot.variables,
            }),
            Err(err) if self.policy == StageLookupPolicy::Strict && !err.is_not_found() => {
                Err(err)
            }
            Err(_) => Ok(ObservedStageState::absent()),
        }
    }
}
