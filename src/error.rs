//! Error types and HTTP error response handling.
//!
//! Every failure a request can hit maps to one [`GatewayError`] variant
//! and from there to an HTTP status plus a JSON body of the shape
//! `{"error": <message>, "code": <status>}`. Client-facing messages stay
//! generic; the detailed cause is logged server-side when the response
//! is built and never echoed to the caller.

use axum::{
    Json,
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::store::StoreError;

/// Remaining credits after the debit (or the untouched balance when the
/// debit was refused).
pub static CREDITS_REMAINING: HeaderName = HeaderName::from_static("x-credits-remaining");

/// Credits taken by a successful debit.
pub static CREDITS_USED: HeaderName = HeaderName::from_static("x-credits-used");

/// Cost the refused request would have needed.
pub static CREDITS_REQUIRED: HeaderName = HeaderName::from_static("x-credits-required");

/// Application-wide error type.
///
/// Gateway pipeline stages short-circuit with the variant matching the
/// stage that failed; admin handlers reuse the generic request/response
/// variants at the bottom.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No `X-API-Key` header on a gateway request. 401.
    #[error("API key required")]
    AuthRequired,

    /// No record exists for the presented key. 403.
    #[error("Invalid API key")]
    AuthInvalid,

    /// The key exists but is inactive or past its expiry. 403.
    #[error("API key expired or inactive")]
    KeyExpired,

    /// The key's owning client record is missing. 403.
    #[error("Client not found")]
    ClientNotFound,

    /// No target for the key's binding, or the path does not match the
    /// target's pattern. 404.
    #[error("Target not found")]
    TargetNotFound,

    /// The client's balance does not cover the request cost. 402, with
    /// the balance and required cost in response headers.
    #[error("Insufficient credits")]
    InsufficientCredits { remaining: u64, required: u64 },

    /// The backend fetch failed or timed out. 502. The debit that
    /// preceded the attempt is not rolled back.
    #[error("Backend request failed")]
    Upstream(#[source] reqwest::Error),

    /// Key-value store failure. 500, details logged only.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// A stored record failed to deserialize. 500, details logged only.
    #[error("Malformed stored record: {0}")]
    Record(#[from] serde_json::Error),

    /// Admin key missing, wrong, or unconfigured. 401.
    #[error("Unauthorized")]
    AdminUnauthorized,

    /// Invalid admin request body or parameters. 400.
    #[error("{0}")]
    InvalidRequest(String),

    /// Admin read of a resource that does not exist. 404.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Admin write conflicting with existing state. 409.
    #[error("{0}")]
    Conflict(String),
}

impl GatewayError {
    fn status(&self) -> StatusCode {
        match self {
            GatewayError::AuthRequired | GatewayError::AdminUnauthorized => {
                StatusCode::UNAUTHORIZED
            }
            GatewayError::AuthInvalid
            | GatewayError::KeyExpired
            | GatewayError::ClientNotFound => StatusCode::FORBIDDEN,
            GatewayError::TargetNotFound | GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::InsufficientCredits { .. } => StatusCode::PAYMENT_REQUIRED,
            GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Store(_) | GatewayError::Record(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    /// Message placed in the response body. Internal variants collapse
    /// to a generic line; their detail only reaches the logs.
    fn message(&self) -> String {
        match self {
            GatewayError::Store(_) | GatewayError::Record(_) => {
                "Internal server error".to_string()
            }
            GatewayError::Upstream(_) => "Backend request failed".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        // Server-side detail for the operator; the client only sees the
        // generic message below.
        match &self {
            GatewayError::Store(error) => tracing::error!(%error, "store failure"),
            GatewayError::Record(error) => tracing::error!(%error, "malformed stored record"),
            GatewayError::Upstream(error) => tracing::warn!(%error, "backend request failed"),
            _ => {}
        }

        let status = self.status();
        let body = Json(json!({
            "error": self.message(),
            "code": status.as_u16(),
        }));

        let mut response = (status, body).into_response();
        if let GatewayError::InsufficientCredits {
            remaining,
            required,
        } = self
        {
            let headers = response.headers_mut();
            headers.insert(&CREDITS_REMAINING, HeaderValue::from(remaining));
            headers.insert(&CREDITS_REQUIRED, HeaderValue::from(required));
        }
        response
    }
}
