// crates/stage-sync-core/src/core/state.rs
// ============================================================================
// Module: Stage Sync Run State
// Description: Observed stage state, patch operations, tag deltas, and resolution.
// Purpose: Provide the per-run value types exchanged between runtime components.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every value in this module is created at the start of one reconciliation
//! run and dropped at its end. Nothing here is cached across runs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::RestApiId;

// ============================================================================
// SECTION: Resource Resolution
// ============================================================================

/// How the REST API is referenced by the deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ApiReference {
    /// REST API managed outside this deployment, referenced by id or import.
    External(String),
    /// REST API declared by the compiled template under this name.
    Declared(String),
    /// No REST API declared (for example removed from the template).
    Undeclared,
}

/// Result of REST API resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResolvedResourceId {
    /// REST API found by name.
    Resolved(RestApiId),
    /// Nothing to reconcile.
    Unresolved,
    /// Externally managed REST API; skipped but recorded.
    External(String),
}

// ============================================================================
// SECTION: Observed Stage State
// ============================================================================

/// Stage state read from the control plane at the start of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedStageState {
    /// Whether the stage exists.
    pub exists: bool,
    /// Current stage tags.
    pub tags: BTreeMap<String, String>,
    /// Current stage variables.
    pub variables: BTreeMap<String, String>,
}

impl ObservedStageState {
    /// Returns the state used when the stage could not be found.
    #[must_use]
    pub fn absent() -> Self {
        Self::default()
    }
}

// ============================================================================
// SECTION: Patch Operations
// ============================================================================

/// Patch operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    /// Replace the value at a path.
    Replace,
    /// Remove the value at a path.
    Remove,
}

impl PatchOp {
    /// Returns the wire form of the operation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Remove => "remove",
        }
    }
}

/// Single patch instruction against the stage settings document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatchOperation {
    /// Operation kind.
    pub op: PatchOp,
    /// Slash-delimited pointer into the stage settings.
    pub path: String,
    /// String-typed value; absent for removals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl PatchOperation {
    /// Builds a `replace` operation. Values are stringified for the wire.
    #[must_use]
    pub fn replace(path: impl Into<String>, value: impl ToString) -> Self {
        Self {
            op: PatchOp::Replace,
            path: path.into(),
            value: Some(value.to_string()),
        }
    }

    /// Builds a `remove` operation.
    #[must_use]
    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            op: PatchOp::Remove,
            path: path.into(),
            value: None,
        }
    }
}

// ============================================================================
// SECTION: Tag Delta
// ============================================================================

/// Tag changes needed to move observed tags to the desired set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDelta {
    /// Tags to add or overwrite.
    pub to_set: BTreeMap<String, String>,
    /// Tag keys to remove.
    pub to_remove: Vec<String>,
}

impl TagDelta {
    /// Returns true when no tag call is needed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_set.is_empty() && self.to_remove.is_empty()
    }
}
