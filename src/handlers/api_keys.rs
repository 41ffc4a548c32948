//! Admin endpoints for API key management.
//!
//! Keys are stored under `apikey:<key>` with a per-client index at
//! `client:keys:<client_id>` so client deletion can cascade. The raw
//! key value is generated server side and returned in the creation
//! response.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::GatewayError;
use crate::handlers::Envelope;
use crate::models::api_key::{fingerprint, ApiKeyRecord};
use crate::state::AppState;
use crate::store::{keys, KeyStore};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApiKeyRequest {
    pub client_id: String,
    pub target_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Fields absent from the body are left unchanged. `name` and
/// `expiresAt` are nullable on the record, so they take an explicit
/// `null` to clear the stored value.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApiKeyRequest {
    #[serde(default, deserialize_with = "nullable_update")]
    pub name: Option<Option<String>>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default, deserialize_with = "nullable_update")]
    pub expires_at: Option<Option<DateTime<Utc>>>,
    #[serde(default)]
    pub target_id: Option<String>,
}

/// Tells an absent update field apart from an explicit `null`: absent
/// falls back to the serde default (`None`), `null` deserializes to
/// `Some(None)`.
fn nullable_update<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

/// POST /admin/api-keys
pub async fn create_api_key(
    State(state): State<AppState>,
    Json(request): Json<CreateApiKeyRequest>,
) -> Result<(StatusCode, Json<Envelope<ApiKeyRecord>>), GatewayError> {
    if state
        .store
        .get(&keys::client(&request.client_id))
        .await?
        .is_none()
    {
        return Err(GatewayError::InvalidRequest(format!(
            "client {} does not exist",
            request.client_id
        )));
    }
    if state.targets.target(&request.target_id).is_none() {
        return Err(GatewayError::InvalidRequest(format!(
            "target {} is not configured",
            request.target_id
        )));
    }

    let record = ApiKeyRecord {
        key: generate_key(),
        client_id: request.client_id,
        target_id: request.target_id,
        name: request.name,
        active: request.active,
        expires_at: request.expires_at,
        created_at: Utc::now(),
    };

    state
        .store
        .put(&keys::api_key(&record.key), &serde_json::to_string(&record)?)
        .await?;

    let mut owned = read_key_index(state.store.as_ref(), &record.client_id).await?;
    owned.push(record.key.clone());
    write_key_index(state.store.as_ref(), &record.client_id, &owned).await?;

    tracing::info!(
        key = %fingerprint(&record.key),
        client = %record.client_id,
        target = %record.target_id,
        "api key created"
    );

    Ok((StatusCode::CREATED, Json(Envelope::new(record))))
}

/// GET /admin/api-keys/{key}
pub async fn get_api_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Envelope<ApiKeyRecord>>, GatewayError> {
    let raw = state
        .store
        .get(&keys::api_key(&key))
        .await?
        .ok_or(GatewayError::NotFound("API key"))?;
    let record: ApiKeyRecord = serde_json::from_str(&raw)?;
    Ok(Json(Envelope::new(record)))
}

/// PUT /admin/api-keys/{key}
pub async fn update_api_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(request): Json<UpdateApiKeyRequest>,
) -> Result<Json<Envelope<ApiKeyRecord>>, GatewayError> {
    let raw = state
        .store
        .get(&keys::api_key(&key))
        .await?
        .ok_or(GatewayError::NotFound("API key"))?;
    let mut record: ApiKeyRecord = serde_json::from_str(&raw)?;

    if let Some(name) = request.name {
        record.name = name;
    }
    if let Some(active) = request.active {
        record.active = active;
    }
    if let Some(expires_at) = request.expires_at {
        record.expires_at = expires_at;
    }
    if let Some(target_id) = request.target_id {
        if state.targets.target(&target_id).is_none() {
            return Err(GatewayError::InvalidRequest(format!(
                "target {target_id} is not configured"
            )));
        }
        record.target_id = target_id;
    }

    state
        .store
        .put(&keys::api_key(&key), &serde_json::to_string(&record)?)
        .await?;
    // Drop any cached copy so the change applies to the next request.
    state.validator.invalidate(&key).await;

    Ok(Json(Envelope::new(record)))
}

/// DELETE /admin/api-keys/{key}
pub async fn delete_api_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode, GatewayError> {
    let raw = state
        .store
        .get(&keys::api_key(&key))
        .await?
        .ok_or(GatewayError::NotFound("API key"))?;
    let record: ApiKeyRecord = serde_json::from_str(&raw)?;

    state.store.delete(&keys::api_key(&key)).await?;

    let mut owned = read_key_index(state.store.as_ref(), &record.client_id).await?;
    owned.retain(|owned_key| owned_key != &key);
    write_key_index(state.store.as_ref(), &record.client_id, &owned).await?;

    state.validator.invalidate(&key).await;

    tracing::info!(
        key = %fingerprint(&key),
        client = %record.client_id,
        "api key deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Generate a fresh key: a `tg_` prefix over 32 random bytes.
pub(crate) fn generate_key() -> String {
    let bytes: [u8; 32] = rand::random();
    format!("tg_{}", hex::encode(bytes))
}

/// Read the per-client key index, treating a missing or unreadable
/// index as empty.
pub(crate) async fn read_key_index(
    store: &dyn KeyStore,
    client_id: &str,
) -> Result<Vec<String>, GatewayError> {
    let raw = store.get(&keys::client_keys(client_id)).await?;
    Ok(raw.map(|value| parse_index(&value)).unwrap_or_default())
}

fn parse_index(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_else(|error| {
        tracing::warn!(%error, "unreadable key index, treating as empty");
        Vec::new()
    })
}

pub(crate) async fn write_key_index(
    store: &dyn KeyStore,
    client_id: &str,
    owned: &[String],
) -> Result<(), GatewayError> {
    store
        .put(&keys::client_keys(client_id), &serde_json::to_string(owned)?)
        .await?;
    Ok(())
}
