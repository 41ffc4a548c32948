//! HTTP request handlers.
//!
//! The gateway pipeline lives in [`gateway`] and is mounted as the
//! router fallback so it sees every method and path. The remaining
//! modules are the admin CRUD surface and the health probe.

use serde::Serialize;

use crate::error::GatewayError;

/// Admin API key management endpoints
pub mod api_keys;
/// Admin client management endpoints
pub mod clients;
/// Admin credit balance endpoints
pub mod credits_admin;
/// The credit-metered proxy pipeline
pub mod gateway;
/// Health check endpoint
pub mod health;
/// Read-only routing table endpoints
pub mod targets_admin;

/// Success envelope wrapping every admin response body.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Fallback for unmatched admin paths.
pub async fn not_found() -> GatewayError {
    GatewayError::NotFound("Resource")
}
