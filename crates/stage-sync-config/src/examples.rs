// crates/stage-sync-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic starting point for `stage-sync config example`.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The example lists every section with its default or a representative
//! value and always passes validation.

/// Returns a canonical example `stage-sync.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[deployment]
descriptor = "serverless.yml"
template = ".serverless/cloudformation-template-update-stack.json"
stage = "dev"
region = "us-east-1"

[identity]
strict_partition = false

[reconcile]
stage_lookup = "lenient"
page_size = 500

[audit]
sink = "file"
path = "stage-sync-audit.jsonl"

[aws]
allow_http = false
"#,
    )
}
