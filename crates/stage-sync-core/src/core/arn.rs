// crates/stage-sync-core/src/core/arn.rs
// ============================================================================
// Module: Stage Sync ARN Builder
// Description: Partition-aware resource identifiers for stages and log groups.
// Purpose: Build ARNs consistently from account identity, region, and path.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! ARNs follow `arn:<partition>:<service>:<region>:<account>:<resource>`.
//! Partitions form a small known set, but new partitions can appear before
//! this crate learns about them, so lenient parsing keeps unknown values as
//! literals. Strict parsing is available for callers that want to reject
//! them up front.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::AccountId;
use crate::core::identifiers::RestApiId;
use crate::core::identifiers::StageName;

// ============================================================================
// SECTION: Partition
// ============================================================================

/// Top-level cloud partition used as the ARN prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Partition {
    /// Commercial partition (`aws`).
    #[default]
    Aws,
    /// China regions (`aws-cn`).
    AwsCn,
    /// `GovCloud` regions (`aws-us-gov`).
    AwsUsGov,
    /// Isolated region `aws-iso`.
    AwsIso,
    /// Isolated region `aws-iso-b`.
    AwsIsoB,
    /// Isolated region `aws-iso-e`.
    AwsIsoE,
    /// Isolated region `aws-iso-f`.
    AwsIsoF,
    /// European sovereign cloud (`aws-eusc`).
    AwsEusc,
    /// Partition not known to this crate, kept verbatim.
    Other(String),
}

/// Raised by strict partition parsing for unrecognized values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid partition: {0}")]
pub struct InvalidPartitionError(pub String);

impl Partition {
    /// Parses a partition, keeping unknown values as [`Partition::Other`].
    #[must_use]
    pub fn parse(value: &str) -> Self {
        Self::known(value).unwrap_or_else(|| Self::Other(value.to_string()))
    }

    /// Parses a partition, rejecting values outside the known set.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPartitionError`] when the value is not a known partition.
    pub fn parse_strict(value: &str) -> Result<Self, InvalidPartitionError> {
        Self::known(value).ok_or_else(|| InvalidPartitionError(value.to_string()))
    }

    /// Extracts the partition segment from an ARN such as a caller identity ARN.
    #[must_use]
    pub fn from_arn(arn: &str) -> Option<Self> {
        let mut segments = arn.split(':');
        if segments.next() != Some("arn") {
            return None;
        }
        segments.next().filter(|value| !value.is_empty()).map(Self::parse)
    }

    /// Returns the ARN prefix string for this partition.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Aws => "aws",
            Self::AwsCn => "aws-cn",
            Self::AwsUsGov => "aws-us-gov",
            Self::AwsIso => "aws-iso",
            Self::AwsIsoB => "aws-iso-b",
            Self::AwsIsoE => "aws-iso-e",
            Self::AwsIsoF => "aws-iso-f",
            Self::AwsEusc => "aws-eusc",
            Self::Other(value) => value,
        }
    }

    /// Matches the known partition set.
    fn known(value: &str) -> Option<Self> {
        match value {
            "aws" => Some(Self::Aws),
            "aws-cn" => Some(Self::AwsCn),
            "aws-us-gov" => Some(Self::AwsUsGov),
            "aws-iso" => Some(Self::AwsIso),
            "aws-iso-b" => Some(Self::AwsIsoB),
            "aws-iso-e" => Some(Self::AwsIsoE),
            "aws-iso-f" => Some(Self::AwsIsoF),
            "aws-eusc" => Some(Self::AwsEusc),
            _ => None,
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Partition {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Partition {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::parse(&value))
    }
}

// ============================================================================
// SECTION: Account Identity
// ============================================================================

/// Caller account identity, resolved once per run by the invoking pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountIdentity {
    /// Account identifier.
    pub account_id: AccountId,
    /// Partition the account lives in.
    pub partition: Partition,
}

impl AccountIdentity {
    /// Creates a new account identity.
    #[must_use]
    pub fn new(account_id: impl Into<String>, partition: Partition) -> Self {
        Self {
            account_id: AccountId::new(account_id),
            partition,
        }
    }
}

// ============================================================================
// SECTION: ARN Construction
// ============================================================================

/// Builds a fully qualified ARN.
///
/// Global or account-less resources pass an empty `account`.
#[must_use]
pub fn build_arn(
    partition: &Partition,
    service: &str,
    region: &str,
    account: &str,
    resource: &str,
) -> String {
    format!("arn:{partition}:{service}:{region}:{account}:{resource}")
}

/// Builds the ARN of a `CloudWatch` Logs log group.
#[must_use]
pub fn log_group_arn(identity: &AccountIdentity, region: &str, log_group_name: &str) -> String {
    build_arn(
        &identity.partition,
        "logs",
        region,
        identity.account_id.as_str(),
        &format!("log-group:{log_group_name}"),
    )
}

/// Builds the ARN of an API Gateway stage, used for tagging calls.
#[must_use]
pub fn stage_arn(
    partition: &Partition,
    region: &str,
    rest_api_id: &RestApiId,
    stage: &StageName,
) -> String {
    build_arn(partition, "apigateway", region, "", &format!("/restapis/{rest_api_id}/stages/{stage}"))
}

// ============================================================================
// SECTION: Naming Conventions
// ============================================================================

/// Returns the conventional access-log group name for a service stage.
#[must_use]
pub fn access_log_group_name(service: &str, stage: &StageName) -> String {
    format!("/aws/api-gateway/{service}-{stage}")
}

// ============================================================================
// SECTION: Tests
// ============================================================================
