//! Request forwarding to the resolved backend.
//!
//! Rewrites the inbound request into an outbound one (URL construction,
//! header filtering and injection), relays the backend's response, and
//! annotates it with the accounting headers. Forwarding happens strictly
//! after a successful debit; a backend failure maps to 502 and the debit
//! stands, so callers pay for the attempt, not the outcome.

use crate::error::{CREDITS_REMAINING, CREDITS_USED, GatewayError};
use crate::middleware::request_id::X_REQUEST_ID;
use crate::models::credits::DebitOutcome;
use crate::models::target::TargetDescriptor;
use crate::services::targets::relative_path;
use axum::body::{Body, Bytes};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::response::Response;

/// Inbound headers never copied to the backend request: hop-by-hop
/// headers, lengths recomputed by the client, and platform markers that
/// upstream WAFs misread as spoofing.
const HEADERS_TO_STRIP: &[&str] = &[
    "host",
    "connection",
    "keep-alive",
    "content-length",
    "transfer-encoding",
    "te",
    "trailer",
    "upgrade",
    "proxy-authenticate",
    "proxy-authorization",
    "accept-encoding",
    "x-api-key",
    "x-request-id",
    "x-forwarded-for",
    "x-forwarded-proto",
    "x-forwarded-host",
    "x-real-ip",
    "true-client-ip",
    "cf-connecting-ip",
    "cf-ipcountry",
    "cf-ray",
    "cf-visitor",
    "cdn-loop",
];

/// Backend response headers not relayed to the caller.
const RESPONSE_HEADERS_TO_STRIP: &[&str] = &[
    "connection",
    "keep-alive",
    "content-length",
    "transfer-encoding",
    "te",
    "trailer",
    "upgrade",
    "proxy-authenticate",
    "proxy-authorization",
    "x-request-id",
];

fn is_stripped(name: &HeaderName, list: &[&str]) -> bool {
    list.contains(&name.as_str())
}

/// Build the backend URL for a matched request.
///
/// Wildcard targets receive the relative suffix after the matched
/// prefix (`/t/foo/bar` against `/t/*` hits `<base>/foo/bar`), regex
/// targets receive the full original path, and exact or trailing-slash
/// targets hit the base URL as-is. The original query string is always
/// preserved.
pub fn backend_url(target: &TargetDescriptor, path: &str, query: Option<&str>) -> String {
    let base = target.target_url.trim_end_matches('/');

    let forwarded_path = if target.is_regex {
        path.to_string()
    } else if target.pattern.ends_with('*') {
        relative_path(path, &target.pattern)
    } else {
        String::new()
    };

    match query {
        Some(query) => format!("{base}{forwarded_path}?{query}"),
        None => format!("{base}{forwarded_path}"),
    }
}

fn outbound_headers(
    inbound: &HeaderMap,
    target: &TargetDescriptor,
    raw_key: &str,
    request_id: &str,
) -> HeaderMap {
    let mut headers = HeaderMap::new();

    for (name, value) in inbound {
        if !is_stripped(name, HEADERS_TO_STRIP) {
            headers.append(name.clone(), value.clone());
        }
    }

    for (name, value) in &target.custom_headers {
        match (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => {
                tracing::warn!(target = %target.id, header = %name, "skipping malformed custom header");
            }
        }
    }

    if target.forward_api_key {
        if let Ok(value) = HeaderValue::try_from(raw_key) {
            headers.insert(HeaderName::from_static("x-api-key"), value);
        }
    }

    if let Ok(value) = HeaderValue::try_from(request_id) {
        headers.insert(X_REQUEST_ID.clone(), value);
    }

    headers
}

/// Forward the request to its target's backend and relay the response.
///
/// The relayed response always carries the correlation id; the credit
/// headers are added when the target opts in. Network errors and
/// timeouts surface as [`GatewayError::Upstream`].
pub async fn forward(
    http: &reqwest::Client,
    parts: &Parts,
    body: Bytes,
    target: &TargetDescriptor,
    raw_key: &str,
    debit: &DebitOutcome,
    request_id: &str,
) -> Result<Response, GatewayError> {
    let url = backend_url(target, parts.uri.path(), parts.uri.query());
    let headers = outbound_headers(&parts.headers, target, raw_key, request_id);

    let upstream = http
        .request(parts.method.clone(), &url)
        .headers(headers)
        .body(body)
        .send()
        .await
        .map_err(GatewayError::Upstream)?;

    let status = upstream.status();
    let upstream_headers = upstream.headers().clone();
    let bytes = upstream.bytes().await.map_err(GatewayError::Upstream)?;

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    for (name, value) in &upstream_headers {
        if !is_stripped(name, RESPONSE_HEADERS_TO_STRIP) {
            headers.append(name.clone(), value.clone());
        }
    }

    if let Ok(value) = HeaderValue::try_from(request_id) {
        headers.insert(X_REQUEST_ID.clone(), value);
    }
    if target.add_credits_header {
        headers.insert(&CREDITS_REMAINING, HeaderValue::from(debit.remaining));
        headers.insert(&CREDITS_USED, HeaderValue::from(debit.used));
    }

    Ok(response)
}
