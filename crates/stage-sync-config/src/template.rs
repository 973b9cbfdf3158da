// crates/stage-sync-config/src/template.rs
// ============================================================================
// Module: Compiled Template
// Description: Reads the declared REST API name from a compiled template.
// Purpose: Find the name the REST API will be listed under after deployment.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The compiled template is the JSON infrastructure template produced by the
//! deployment pipeline. The REST API resource is chosen in this order:
//! the conventional `ApiGatewayRestApi` logical id, then the API referenced
//! by a deployment resource, then the only REST API in the template. Only a
//! literal string `Name` property yields a declared name.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::config::read_text_file;
use crate::descriptor::DescriptorError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Conventional logical id of the service REST API.
pub const REST_API_LOGICAL_ID: &str = "ApiGatewayRestApi";
/// REST API resource type.
pub const REST_API_TYPE: &str = "AWS::ApiGateway::RestApi";
/// Deployment resource type.
pub const DEPLOYMENT_TYPE: &str = "AWS::ApiGateway::Deployment";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Compiled infrastructure template.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompiledTemplate {
    /// Resources keyed by logical id.
    #[serde(rename = "Resources", default)]
    pub resources: BTreeMap<String, TemplateResource>,
}

/// One template resource.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateResource {
    /// Resource type.
    #[serde(rename = "Type")]
    pub resource_type: String,
    /// Resource properties.
    #[serde(rename = "Properties", default)]
    pub properties: Value,
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl CompiledTemplate {
    /// Loads a compiled template from disk.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError`] when reading or parsing fails.
    pub fn load(path: &Path) -> Result<Self, DescriptorError> {
        let content = read_text_file(path)?;
        Self::from_json(&content)
    }

    /// Parses a compiled template.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::Parse`] for malformed JSON.
    pub fn from_json(content: &str) -> Result<Self, DescriptorError> {
        serde_json::from_str(content).map_err(|err| DescriptorError::Parse(err.to_string()))
    }
}

// ============================================================================
// SECTION: Name Resolution
// ============================================================================

impl CompiledTemplate {
    /// Returns the declared REST API name, or `None` when the template has
    /// no resolvable REST API.
    #[must_use]
    pub fn declared_api_name(&self) -> Option<String> {
        self.rest_api_resource()?.properties.get("Name")?.as_str().map(str::to_string)
    }

    /// Picks the REST API resource.
    fn rest_api_resource(&self) -> Option<&TemplateResource> {
        if let Some(resource) = self.rest_api(REST_API_LOGICAL_ID) {
            return Some(resource);
        }
        let referenced = self
            .resources
            .values()
            .filter(|resource| resource.resource_type == DEPLOYMENT_TYPE)
            .filter_map(|deployment| {
                deployment.properties.get("RestApiId")?.get("Ref")?.as_str()
            })
            .find_map(|logical_id| self.rest_api(logical_id));
        if referenced.is_some() {
            return referenced;
        }
        let mut rest_apis =
            self.resources.values().filter(|resource| resource.resource_type == REST_API_TYPE);
        match (rest_apis.next(), rest_apis.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }

    /// Returns the resource under `logical_id` when it is a REST API.
    fn rest_api(&self, logical_id: &str) -> Option<&TemplateResource> {
        self.resources.get(logical_id).filter(|resource| resource.resource_type == REST_API_TYPE)
    }
}
