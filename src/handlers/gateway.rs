//! The metered proxy pipeline.
//!
//! Every request that does not match the health or admin routes lands
//! here. The pipeline authenticates the API key, resolves the client
//! and target, debits credits, and forwards the request upstream:
//!
//! 1. `OPTIONS` requests short-circuit with a permissive CORS preflight
//!    response and are never authenticated or billed.
//! 2. The `X-API-Key` header is validated against the store (cached).
//! 3. The owning client record must exist.
//! 4. The key's target must exist and its pattern must match the path.
//! 5. Credits are debited before the upstream call. A failed upstream
//!    call does not refund them.

use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::{GatewayError, CREDITS_REMAINING, CREDITS_USED};
use crate::middleware::request_id::X_REQUEST_ID;
use crate::models::api_key::fingerprint;
use crate::models::client::ClientRecord;
use crate::services::proxy;
use crate::services::targets::matches_pattern;
use crate::state::AppState;
use crate::store::keys;

/// Handle one inbound request end to end.
pub async fn proxy_request(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, GatewayError> {
    if request.method() == Method::OPTIONS {
        return Ok(cors_preflight());
    }

    let (parts, body) = request.into_parts();
    let path = parts.uri.path().to_string();

    let request_id = parts
        .headers
        .get(&X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let raw_key = parts
        .headers
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or(GatewayError::AuthRequired)?
        .to_string();

    let key_record = state.validator.validate(&raw_key).await?;

    let client_raw = state
        .store
        .get(&keys::client(&key_record.client_id))
        .await?
        .ok_or(GatewayError::ClientNotFound)?;
    let client: ClientRecord = serde_json::from_str(&client_raw)?;

    let target = state
        .targets
        .target(&key_record.target_id)
        .ok_or(GatewayError::TargetNotFound)?;

    if !matches_pattern(&path, &target.pattern, target.is_regex) {
        return Err(GatewayError::TargetNotFound);
    }

    let cost = state.targets.cost_for(&path, target);

    // Buffer the body up front so a debit is never charged for a
    // request we cannot read.
    let body_bytes = to_bytes(body, state.config.max_body_bytes)
        .await
        .map_err(|_| GatewayError::InvalidRequest("failed to read request body".into()))?;

    let debit = state.ledger.debit(&client.id, cost).await?;
    if !debit.success {
        return Err(GatewayError::InsufficientCredits {
            remaining: debit.remaining,
            required: cost,
        });
    }

    tracing::info!(
        request_id = %request_id,
        key = %fingerprint(&raw_key),
        client = %client.id,
        target = %target.id,
        path = %path,
        cost,
        remaining = debit.remaining,
        "forwarding request"
    );

    match proxy::forward(
        &state.http,
        &parts,
        body_bytes,
        target,
        &raw_key,
        &debit,
        &request_id,
    )
    .await
    {
        Ok(response) => Ok(response),
        // Credits were already spent, so a failed upstream call still
        // reports the post-debit balance.
        Err(error @ GatewayError::Upstream(_)) => {
            let mut response = error.into_response();
            response
                .headers_mut()
                .insert(&CREDITS_REMAINING, HeaderValue::from(debit.remaining));
            response
                .headers_mut()
                .insert(&CREDITS_USED, HeaderValue::from(debit.used));
            Ok(response)
        }
        Err(error) => Err(error),
    }
}

/// Permissive preflight response for browser clients.
fn cors_preflight() -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, PATCH, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization, X-API-Key"),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static("86400"),
    );
    response
}
