// crates/stage-sync-core/src/runtime/cleanup.rs
// ============================================================================
// Module: Log Group Cleaner
// Description: Deletes the access-log group when access logging is disabled.
// Purpose: Keep stale log groups from clashing when logging is re-enabled.
// Dependencies: crate::interfaces, serde
// ============================================================================

//! ## Overview
//! Cleanup runs whenever the desired state has access logging off, whether
//! or not it was on before. A missing log group counts as success.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::interfaces::ControlPlaneError;
use crate::interfaces::StageControlPlane;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Result of a log group cleanup attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupResult {
    /// Log group existed and was deleted.
    Deleted,
    /// Log group did not exist.
    AlreadyAbsent,
}

/// Log group cleanup report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogGroupCleanup {
    /// Log group name.
    pub log_group_name: String,
    /// Cleanup result.
    pub result: CleanupResult,
}

// ============================================================================
// SECTION: Cleaner
// ============================================================================

/// Deletes conventionally named access-log groups.
pub struct LogGroupCleaner<'a, C: ?Sized> {
    /// Control plane used for deletion.
    control_plane: &'a C,
}

impl<'a, C> LogGroupCleaner<'a, C>
where
    C: StageControlPlane + ?Sized,
{
    /// Creates a cleaner.
    #[must_use]
    pub const fn new(control_plane: &'a C) -> Self {
        Self {
            control_plane,
        }
    }

    /// Deletes the log group, tolerating its absence.
    ///
    /// # Errors
    ///
    /// Returns [`ControlPlaneError`] for failures other than not-found.
    pub async fn clean(&self, log_group_name: &str) -> Result<LogGroupCleanup, ControlPlaneError> {
        let result = match self.control_plane.delete_log_group(log_group_name).await {
            Ok(()) => CleanupResult::Deleted,
            Err(err) if err.is_not_found() => CleanupResult::AlreadyAbsent,
            Err(err) => return Err(err),
        };
        Ok(LogGroupCleanup {
            log_group_name: log_group_name.to_string(),
            result,
        })
    }
}
