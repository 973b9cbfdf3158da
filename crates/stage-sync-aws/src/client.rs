// crates/stage-sync-aws/src/client.rs
// ============================================================================
// Module: AWS Clients
// Description: Shared SDK configuration and service clients.
// Purpose: Load credentials and region once and build every client from them.
// Dependencies: aws-config, aws-sdk-apigateway, aws-sdk-cloudwatchlogs, aws-sdk-sts
// ============================================================================

//! ## Overview
//! Settings left unset fall back to the SDK's default provider chain
//! (environment, shared profile, instance metadata).

// ============================================================================
// SECTION: Imports
// ============================================================================

use aws_config::BehaviorVersion;
use aws_config::Region;
use thiserror::Error;

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Client settings; `None` fields use the SDK defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AwsClientSettings {
    /// Region for every client.
    pub region: Option<String>,
    /// Shared config profile.
    pub profile: Option<String>,
    /// Endpoint override for every client (local emulators).
    pub endpoint: Option<String>,
}

/// AWS client setup errors.
#[derive(Debug, Error)]
pub enum AwsSetupError {
    /// Settings rejected before any SDK call.
    #[error("invalid aws settings: {0}")]
    Invalid(String),
}

impl AwsClientSettings {
    /// Validates settings before loading.
    ///
    /// # Errors
    ///
    /// Returns [`AwsSetupError::Invalid`] for blank values.
    pub fn validate(&self) -> Result<(), AwsSetupError> {
        for (field, value) in
            [("region", &self.region), ("profile", &self.profile), ("endpoint", &self.endpoint)]
        {
            if value.as_deref().is_some_and(|value| value.trim().is_empty()) {
                return Err(AwsSetupError::Invalid(format!("{field} must be non-empty")));
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Clients
// ============================================================================

/// Service clients built from one shared configuration.
#[derive(Debug, Clone)]
pub struct AwsClients {
    /// API Gateway client.
    pub apigateway: aws_sdk_apigateway::Client,
    /// `CloudWatch` Logs client.
    pub logs: aws_sdk_cloudwatchlogs::Client,
    /// STS client.
    pub sts: aws_sdk_sts::Client,
}

impl AwsClients {
    /// Loads the shared configuration and builds every client.
    ///
    /// # Errors
    ///
    /// Returns [`AwsSetupError`] when the settings are invalid.
    pub async fn load(settings: &AwsClientSettings) -> Result<Self, AwsSetupError> {
        settings.validate()?;
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &settings.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(profile) = &settings.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(endpoint) = &settings.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let shared_config = loader.load().await;
        Ok(Self {
            apigateway: aws_sdk_apigateway::Client::new(&shared_config),
            logs: aws_sdk_cloudwatchlogs::Client::new(&shared_config),
            sts: aws_sdk_sts::Client::new(&shared_config),
        })
    }
}
