//! Read-only admin endpoints for the routing table.
//!
//! Targets are loaded from configuration at startup, so there are no
//! mutating endpoints here.

use axum::extract::{Path, State};
use axum::Json;

use crate::error::GatewayError;
use crate::handlers::Envelope;
use crate::models::target::TargetDescriptor;
use crate::state::AppState;

/// GET /admin/targets
pub async fn list_targets(
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<TargetDescriptor>>>, GatewayError> {
    let targets: Vec<TargetDescriptor> = state.targets.all().into_iter().cloned().collect();
    Ok(Json(Envelope::new(targets)))
}

/// GET /admin/targets/{id}
pub async fn get_target(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<TargetDescriptor>>, GatewayError> {
    let target = state
        .targets
        .target(&id)
        .cloned()
        .ok_or(GatewayError::NotFound("Target"))?;
    Ok(Json(Envelope::new(target)))
}
