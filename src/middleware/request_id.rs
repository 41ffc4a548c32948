//! Request correlation id.
//!
//! Every response the gateway produces, proxied or terminal error,
//! carries an `X-Request-ID` header so operators can cross-reference
//! logs. The id is taken from the inbound request when present and
//! generated otherwise.

use axum::http::{HeaderName, HeaderValue, Request};
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use uuid::Uuid;

/// Header carrying the per-request correlation id.
pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// UUID v4 generator for request ids, plugged into tower-http's
/// request id middleware.
#[derive(Clone, Copy, Default)]
pub struct UuidRequestIdGenerator;

impl MakeRequestId for UuidRequestIdGenerator {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        Some(RequestId::new(HeaderValue::from_str(&id).ok()?))
    }
}

/// The layer pair applied to the router: the set layer stamps requests
/// missing an id, the propagate layer copies the id onto responses.
/// Apply the propagate layer first so the set layer runs outermost.
pub fn layers() -> (
    SetRequestIdLayer<UuidRequestIdGenerator>,
    PropagateRequestIdLayer,
) {
    (
        SetRequestIdLayer::new(X_REQUEST_ID.clone(), UuidRequestIdGenerator),
        PropagateRequestIdLayer::new(X_REQUEST_ID.clone()),
    )
}
