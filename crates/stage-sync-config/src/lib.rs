// crates/stage-sync-config/src/lib.rs
// ============================================================================
// Module: Stage Sync Config Library
// Description: Tool configuration, deployment descriptors, and templates.
// Purpose: Turn files on disk into a validated reconciliation request.
// Dependencies: stage-sync-core, serde, serde_json, serde_yaml, toml
// ============================================================================

//! ## Overview
//! `stage-sync-config` owns every file format the tool reads:
//! `stage-sync.toml` for tool settings, the deployment descriptor for the
//! desired stage settings, and the compiled template for the declared API
//! name. All loaders fail closed with size and path limits.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod deployment;
pub mod descriptor;
pub mod examples;
pub mod template;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use deployment::ResolvedDeployment;
pub use deployment::resolve_deployment;
pub use deployment::resolve_with;
pub use descriptor::DeploymentDescriptor;
pub use descriptor::DescriptorError;
pub use examples::config_toml_example;
pub use template::CompiledTemplate;
