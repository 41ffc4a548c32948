//! Health check endpoint for service monitoring.

use std::time::Duration;

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::GatewayError;
use crate::state::AppState;

/// Health check response.
///
/// Returns service status, store connectivity, and the number of
/// configured targets.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service status
    pub status: String,

    /// Key-value store connection status
    pub store: String,

    /// Number of routable targets
    pub targets: usize,

    /// Current server timestamp
    pub timestamp: DateTime<Utc>,
}

/// Health check handler.
///
/// # Checks
///
/// - Store connectivity (round-trips a probe key with a short TTL)
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "status": "ok",
///   "store": "connected",
///   "targets": 2,
///   "timestamp": "2026-08-23T19:00:00Z"
/// }
/// ```
///
/// # Response (500 Internal Server Error)
///
/// If the store is unreachable, returns the standard error response.
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, GatewayError> {
    let probe = Utc::now().timestamp_millis().to_string();
    state
        .store
        .put_with_ttl("health:probe", &probe, Duration::from_secs(60))
        .await?;
    state.store.get("health:probe").await?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        store: "connected".to_string(),
        targets: state.targets.len(),
        timestamp: Utc::now(),
    }))
}
