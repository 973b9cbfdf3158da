// crates/stage-sync-aws/src/identity.rs
// ============================================================================
// Module: STS Identity Resolver
// Description: Caller account and partition lookup through STS.
// Purpose: Supply the account identity used to build resource ARNs.
// Dependencies: aws-sdk-sts, stage-sync-core
// ============================================================================

//! ## Overview
//! The partition is read from the caller ARN, so GovCloud and China
//! credentials produce matching resource ARNs without extra configuration.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use aws_sdk_apigateway::error::DisplayErrorContext;
use stage_sync_core::AccountIdentity;
use stage_sync_core::IdentityError;
use stage_sync_core::IdentityResolver;
use stage_sync_core::Partition;

use crate::client::AwsClients;

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// [`IdentityResolver`] backed by `GetCallerIdentity`.
#[derive(Debug, Clone)]
pub struct StsIdentityResolver {
    /// STS client.
    sts: aws_sdk_sts::Client,
}

impl StsIdentityResolver {
    /// Creates a resolver from an STS client.
    #[must_use]
    pub const fn new(sts: aws_sdk_sts::Client) -> Self {
        Self {
            sts,
        }
    }

    /// Creates a resolver from a loaded client set.
    #[must_use]
    pub fn from_clients(clients: &AwsClients) -> Self {
        Self::new(clients.sts.clone())
    }
}

#[async_trait]
impl IdentityResolver for StsIdentityResolver {
    async fn account_identity(&self) -> Result<AccountIdentity, IdentityError> {
        let output = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(|err| IdentityError::Lookup(DisplayErrorContext(&err).to_string()))?;
        identity_from_caller(output.account(), output.arn())
    }
}

/// Builds an identity from the `GetCallerIdentity` account and ARN fields.
///
/// # Errors
///
/// Returns [`IdentityError::Invalid`] when either field is missing or the ARN
/// carries no partition.
pub fn identity_from_caller(
    account: Option<&str>,
    arn: Option<&str>,
) -> Result<AccountIdentity, IdentityError> {
    let account = account
        .filter(|account| !account.is_empty())
        .ok_or_else(|| IdentityError::Invalid("caller identity has no account".to_string()))?;
    let arn = arn.ok_or_else(|| IdentityError::Invalid("caller identity has no arn".to_string()))?;
    let partition = Partition::from_arn(arn)
        .ok_or_else(|| IdentityError::Invalid(format!("caller arn has no partition: {arn}")))?;
    Ok(AccountIdentity::new(account, partition))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
