//! Admin endpoints for credit balances.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::handlers::Envelope;
use crate::state::AppState;
use crate::store::keys;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditSummary {
    pub client_id: String,
    pub balance: u64,
}

#[derive(Debug, Deserialize)]
pub struct SetCreditsRequest {
    pub balance: u64,
}

#[derive(Debug, Deserialize)]
pub struct AddCreditsRequest {
    pub amount: u64,
}

/// GET /admin/credits/{client_id}
pub async fn get_credits(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> Result<Json<Envelope<CreditSummary>>, GatewayError> {
    ensure_client_exists(&state, &client_id).await?;
    let balance = state.ledger.balance(&client_id).await?;
    Ok(Json(Envelope::new(CreditSummary { client_id, balance })))
}

/// PUT /admin/credits/{client_id}
pub async fn set_credits(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    Json(request): Json<SetCreditsRequest>,
) -> Result<Json<Envelope<CreditSummary>>, GatewayError> {
    ensure_client_exists(&state, &client_id).await?;
    state.ledger.set(&client_id, request.balance).await?;
    tracing::info!(client = %client_id, balance = request.balance, "credit balance set");
    Ok(Json(Envelope::new(CreditSummary {
        client_id,
        balance: request.balance,
    })))
}

/// POST /admin/credits/{client_id}/add
pub async fn add_credits(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    Json(request): Json<AddCreditsRequest>,
) -> Result<Json<Envelope<CreditSummary>>, GatewayError> {
    ensure_client_exists(&state, &client_id).await?;
    let balance = state.ledger.add(&client_id, request.amount).await?;
    tracing::info!(client = %client_id, added = request.amount, balance, "credits added");
    Ok(Json(Envelope::new(CreditSummary { client_id, balance })))
}

async fn ensure_client_exists(state: &AppState, client_id: &str) -> Result<(), GatewayError> {
    state
        .store
        .get(&keys::client(client_id))
        .await?
        .ok_or(GatewayError::NotFound("Client"))?;
    Ok(())
}
