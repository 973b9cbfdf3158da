// crates/stage-sync-aws/src/errors.rs
// ============================================================================
// Module: SDK Error Mapping
// Description: Classifies SDK failures into control-plane error kinds.
// Purpose: Give the reconciler a reliable not-found signal.
// Dependencies: aws-sdk-apigateway, stage-sync-core
// ============================================================================

//! ## Overview
//! Service errors are classified by their error code. Anything that never
//! reached the service (timeouts, DNS, credentials) is a transport error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::error::Error;
use std::fmt::Debug;

use aws_sdk_apigateway::error::DisplayErrorContext;
use aws_sdk_apigateway::error::ProvideErrorMetadata;
use aws_sdk_apigateway::error::SdkError;
use stage_sync_core::ControlPlaneError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Error codes meaning the target does not exist.
const NOT_FOUND_CODES: [&str; 2] = ["NotFoundException", "ResourceNotFoundException"];
/// Error codes meaning the caller lacks permission.
const ACCESS_DENIED_CODES: [&str; 3] =
    ["AccessDeniedException", "UnauthorizedException", "AccessDenied"];

// ============================================================================
// SECTION: Classification
// ============================================================================

/// Maps a service error code onto a [`ControlPlaneError`] carrying `detail`.
#[must_use]
pub fn classify_error_code(code: Option<&str>, detail: String) -> ControlPlaneError {
    match code {
        Some(code) if NOT_FOUND_CODES.contains(&code) => ControlPlaneError::NotFound(detail),
        Some(code) if ACCESS_DENIED_CODES.contains(&code) => ControlPlaneError::AccessDenied(detail),
        _ => ControlPlaneError::Service(detail),
    }
}

/// Converts an SDK error from any of the service clients.
pub(crate) fn control_plane_error<E, R>(operation: &str, err: &SdkError<E, R>) -> ControlPlaneError
where
    E: ProvideErrorMetadata + Error + 'static,
    R: Debug,
{
    if matches!(err, SdkError::ServiceError(_)) {
        let code = err.code();
        let detail = format!(
            "{operation}: {}: {}",
            code.unwrap_or("UnknownError"),
            err.message().unwrap_or_default()
        );
        classify_error_code(code, detail)
    } else {
        ControlPlaneError::Transport(format!("{operation}: {}", DisplayErrorContext(err)))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
