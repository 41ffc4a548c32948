//! Admin endpoints for client management.
//!
//! Creating a client grants the starting credit balance for its plan.
//! Deleting a client cascades to its API keys, credit balance, and
//! key index.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GatewayError;
use crate::handlers::api_keys::{read_key_index, write_key_index};
use crate::handlers::Envelope;
use crate::models::api_key::{fingerprint, ApiKeyRecord};
use crate::models::client::{ClientRecord, CreateClientRequest, UpdateClientRequest};
use crate::state::AppState;
use crate::store::keys;

/// POST /admin/clients
pub async fn create_client(
    State(state): State<AppState>,
    Json(request): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<Envelope<ClientRecord>>), GatewayError> {
    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "name must not be empty".into(),
        ));
    }

    let id = match request.id {
        Some(id) => {
            let id = id.trim().to_string();
            if id.is_empty() {
                return Err(GatewayError::InvalidRequest("id must not be empty".into()));
            }
            // Colons would collide with the store's key layout.
            if id.contains(':') {
                return Err(GatewayError::InvalidRequest(
                    "id must not contain ':'".into(),
                ));
            }
            id
        }
        None => Uuid::new_v4().to_string(),
    };

    if state.store.get(&keys::client(&id)).await?.is_some() {
        return Err(GatewayError::Conflict(format!(
            "client {id} already exists"
        )));
    }

    let email = match request.email {
        Some(email) => {
            let email = email.trim().to_lowercase();
            if email_in_use(&state, &email, None).await? {
                return Err(GatewayError::Conflict(format!(
                    "email {email} is already registered"
                )));
            }
            Some(email)
        }
        None => None,
    };

    let record = ClientRecord {
        id,
        name,
        email,
        plan: request.plan,
        client_type: request.client_type,
        metadata: request.metadata,
        created_at: chrono::Utc::now(),
    };

    state
        .store
        .put(&keys::client(&record.id), &serde_json::to_string(&record)?)
        .await?;

    let grant = record.plan.initial_grant();
    state.ledger.set(&record.id, grant).await?;

    tracing::info!(client = %record.id, plan = ?record.plan, grant, "client created");

    Ok((StatusCode::CREATED, Json(Envelope::new(record))))
}

/// GET /admin/clients
pub async fn list_clients(
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<ClientRecord>>>, GatewayError> {
    let mut clients = Vec::new();
    for key in state.store.keys(keys::CLIENT_PREFIX).await? {
        if !keys::is_client_record_key(&key) {
            continue;
        }
        let Some(raw) = state.store.get(&key).await? else {
            continue;
        };
        match serde_json::from_str::<ClientRecord>(&raw) {
            Ok(record) => clients.push(record),
            Err(error) => tracing::warn!(%key, %error, "skipping unreadable client record"),
        }
    }
    clients.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(Envelope::new(clients)))
}

/// GET /admin/clients/{id}
pub async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<ClientRecord>>, GatewayError> {
    let record = fetch_client(&state, &id).await?;
    Ok(Json(Envelope::new(record)))
}

/// PUT /admin/clients/{id}
pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateClientRequest>,
) -> Result<Json<Envelope<ClientRecord>>, GatewayError> {
    let mut record = fetch_client(&state, &id).await?;

    if let Some(name) = request.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(GatewayError::InvalidRequest(
                "name must not be empty".into(),
            ));
        }
        record.name = name;
    }
    if let Some(email) = request.email {
        let email = email.trim().to_lowercase();
        if email_in_use(&state, &email, Some(&record.id)).await? {
            return Err(GatewayError::Conflict(format!(
                "email {email} is already registered"
            )));
        }
        record.email = Some(email);
    }
    if let Some(plan) = request.plan {
        record.plan = plan;
    }
    if let Some(client_type) = request.client_type {
        record.client_type = client_type;
    }
    if let Some(metadata) = request.metadata {
        record.metadata = metadata;
    }

    state
        .store
        .put(&keys::client(&record.id), &serde_json::to_string(&record)?)
        .await?;

    Ok(Json(Envelope::new(record)))
}

/// DELETE /admin/clients/{id}
pub async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, GatewayError> {
    fetch_client(&state, &id).await?;

    let owned = read_key_index(state.store.as_ref(), &id).await?;
    for key in &owned {
        state.store.delete(&keys::api_key(key)).await?;
        state.validator.invalidate(key).await;
    }
    state.store.delete(&keys::client_keys(&id)).await?;
    state.ledger.remove(&id).await?;
    state.store.delete(&keys::client(&id)).await?;

    tracing::info!(client = %id, keys = owned.len(), "client deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// GET /admin/clients/{id}/keys
pub async fn get_client_keys(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Vec<ApiKeyRecord>>>, GatewayError> {
    fetch_client(&state, &id).await?;

    let owned = read_key_index(state.store.as_ref(), &id).await?;
    let mut records: Vec<ApiKeyRecord> = Vec::new();
    for key in &owned {
        match state.store.get(&keys::api_key(key)).await? {
            Some(raw) => records.push(serde_json::from_str(&raw)?),
            // Index entries can outlive their record if a delete was
            // interrupted between the two writes. Repair as we go.
            None => {
                tracing::warn!(key = %fingerprint(key), "dropping dangling key index entry");
            }
        }
    }
    if records.len() < owned.len() {
        let live: Vec<String> = records.iter().map(|record| record.key.clone()).collect();
        write_key_index(state.store.as_ref(), &id, &live).await?;
    }

    Ok(Json(Envelope::new(records)))
}

#[derive(Debug, Deserialize)]
pub struct UsageQuery {
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    pub client_id: String,
    pub date: NaiveDate,
    pub requests: u64,
}

/// GET /admin/clients/{id}/usage?date=YYYY-MM-DD
pub async fn get_client_usage(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<UsageQuery>,
) -> Result<Json<Envelope<UsageSummary>>, GatewayError> {
    fetch_client(&state, &id).await?;

    let date = match query.date {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
            GatewayError::InvalidRequest("date must be formatted as YYYY-MM-DD".into())
        })?,
        None => chrono::Utc::now().date_naive(),
    };

    let requests = state.usage.daily(&id, date).await?;
    Ok(Json(Envelope::new(UsageSummary {
        client_id: id,
        date,
        requests,
    })))
}

async fn fetch_client(state: &AppState, id: &str) -> Result<ClientRecord, GatewayError> {
    let raw = state
        .store
        .get(&keys::client(id))
        .await?
        .ok_or(GatewayError::NotFound("Client"))?;
    Ok(serde_json::from_str(&raw)?)
}

async fn email_in_use(
    state: &AppState,
    email: &str,
    exclude_id: Option<&str>,
) -> Result<bool, GatewayError> {
    for key in state.store.keys(keys::CLIENT_PREFIX).await? {
        if !keys::is_client_record_key(&key) {
            continue;
        }
        let Some(raw) = state.store.get(&key).await? else {
            continue;
        };
        let Ok(existing) = serde_json::from_str::<ClientRecord>(&raw) else {
            continue;
        };
        if exclude_id == Some(existing.id.as_str()) {
            continue;
        }
        if existing.email.as_deref() == Some(email) {
            return Ok(true);
        }
    }
    Ok(false)
}
