//! Admin key authentication middleware.
//!
//! The admin surface is protected by a single static key configured via
//! `ADMIN_KEY` and supplied by callers in the `X-Admin-Key` header. When
//! no key is configured the admin surface is disabled outright: every
//! admin call is rejected.

use crate::{error::GatewayError, state::AppState};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

/// Header carrying the admin key.
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Reject admin requests that do not present the configured key.
///
/// The comparison is constant-time so the key cannot be probed byte by
/// byte through response timing.
pub async fn admin_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let Some(expected) = state.config.admin_key.as_deref() else {
        tracing::warn!("admin request rejected: no ADMIN_KEY configured");
        return Err(GatewayError::AdminUnauthorized);
    };

    let provided = request
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(GatewayError::AdminUnauthorized)?;

    let authorized: bool = provided.as_bytes().ct_eq(expected.as_bytes()).into();
    if !authorized {
        tracing::warn!("admin request rejected: key mismatch");
        return Err(GatewayError::AdminUnauthorized);
    }

    Ok(next.run(request).await)
}
