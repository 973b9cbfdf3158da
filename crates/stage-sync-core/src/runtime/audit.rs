// crates/stage-sync-core/src/runtime/audit.rs
// ============================================================================
// Module: Reconciliation Audit Logging
// Description: Structured audit events for stage reconciliation runs.
// Purpose: Emit JSON-line audit records without hard logging dependencies.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Each state transition of a reconciliation run produces one
//! [`ReconcileAuditEvent`]. Sinks decide where events go. Stderr and
//! append-only file sinks write one JSON object per line so deployments can
//! route them into their own logging pipeline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Reconciliation phase recorded by an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcilePhase {
    /// REST API resolved by name.
    Located,
    /// REST API could not be resolved; run ends as a no-op.
    Unresolved,
    /// REST API is externally managed; run ends without changes.
    External,
    /// Stage lookup found nothing.
    StageAbsent,
    /// Stage created from an existing deployment.
    StageCreated,
    /// Patch operations applied.
    StagePatched,
    /// Tags added or overwritten.
    TagsApplied,
    /// Tags removed.
    TagsRemoved,
    /// Access-log group deleted.
    LogGroupDeleted,
    /// Access-log group was already absent.
    LogGroupAbsent,
    /// Run finished.
    Completed,
    /// Run aborted with an error.
    Failed,
}

/// Reconciliation audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Service name.
    pub service: String,
    /// Stage name.
    pub stage: String,
    /// REST API identifier when resolved.
    pub rest_api_id: Option<String>,
    /// Phase reached.
    pub phase: ReconcilePhase,
    /// Phase-specific detail (counts, names, error text).
    pub detail: Option<String>,
}

/// Inputs required to construct an audit event.
pub struct ReconcileAuditEventParams {
    /// Service name.
    pub service: String,
    /// Stage name.
    pub stage: String,
    /// REST API identifier when resolved.
    pub rest_api_id: Option<String>,
    /// Phase reached.
    pub phase: ReconcilePhase,
    /// Phase-specific detail.
    pub detail: Option<String>,
}

impl ReconcileAuditEvent {
    /// Creates a new audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: ReconcileAuditEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "stage_reconcile",
            timestamp_ms,
            service: params.service,
            stage: params.stage,
            rest_api_id: params.rest_api_id,
            phase: params.phase,
            detail: params.detail,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for reconciliation events.
pub trait ReconcileAuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &ReconcileAuditEvent);
}

impl<S: ReconcileAuditSink + ?Sized> ReconcileAuditSink for Box<S> {
    fn record(&self, event: &ReconcileAuditEvent) {
        (**self).record(event);
    }
}

/// Audit sink that drops every event.
pub struct NoopAuditSink;

impl ReconcileAuditSink for NoopAuditSink {
    fn record(&self, _event: &ReconcileAuditEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl ReconcileAuditSink for StderrAuditSink {
    fn record(&self, event: &ReconcileAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl ReconcileAuditSink for FileAuditSink {
    fn record(&self, event: &ReconcileAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// Audit sink that keeps events in memory, for inspection after a run.
#[derive(Default)]
pub struct MemoryAuditSink {
    /// Recorded events in arrival order.
    events: Mutex<Vec<ReconcileAuditEvent>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the phases recorded so far.
    #[must_use]
    pub fn phases(&self) -> Vec<ReconcilePhase> {
        self.events
            .lock()
            .map(|events| events.iter().map(|event| event.phase).collect())
            .unwrap_or_default()
    }
}

impl ReconcileAuditSink for MemoryAuditSink {
    fn record(&self, event: &ReconcileAuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
