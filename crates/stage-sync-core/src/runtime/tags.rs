// crates/stage-sync-core/src/runtime/tags.rs
// ============================================================================
// Module: Tag Reconciler
// Description: Merges desired tag layers and diffs them against observed tags.
// Purpose: Compute independent tag-add and tag-remove sets for a stage.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Stack tags are applied first and resource tags on top, so resource tags
//! win on collision. Keys under the platform's reserved prefix belong to the
//! platform and are never removed, even when the desired set omits them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use crate::core::DesiredStageConfig;
use crate::core::TagDelta;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Tag key prefix reserved for platform-owned tags.
pub const RESERVED_TAG_PREFIX: &str = "aws:";

// ============================================================================
// SECTION: Tag Reconciler
// ============================================================================

/// Computes tag changes between desired and observed tag sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagReconciler;

impl TagReconciler {
    /// Merges stack tags and resource tags into the desired tag set.
    #[must_use]
    pub fn merge(desired: &DesiredStageConfig) -> BTreeMap<String, String> {
        let mut merged: BTreeMap<String, String> = desired
            .stack_tags
            .iter()
            .map(|(key, value)| (key.clone(), value.to_string()))
            .collect();
        for (key, value) in &desired.tags {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }

    /// Diffs a merged desired tag set against observed tags.
    #[must_use]
    pub fn diff(desired: &BTreeMap<String, String>, observed: &BTreeMap<String, String>) -> TagDelta {
        let to_set = desired
            .iter()
            .filter(|(key, value)| observed.get(key.as_str()) != Some(*value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let to_remove = observed
            .keys()
            .filter(|key| !desired.contains_key(key.as_str()) && !is_reserved(key))
            .cloned()
            .collect();
        TagDelta {
            to_set,
            to_remove,
        }
    }

    /// Merges the desired tags and diffs them in one step.
    #[must_use]
    pub fn reconcile(desired: &DesiredStageConfig, observed: &BTreeMap<String, String>) -> TagDelta {
        Self::diff(&Self::merge(desired), observed)
    }
}

/// Returns true for platform-owned tag keys.
#[must_use]
pub fn is_reserved(key: &str) -> bool {
    key.starts_with(RESERVED_TAG_PREFIX)
}
