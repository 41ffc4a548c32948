//! Tollgate - Credit-Metered API Gateway
//!
//! A reverse proxy that sits in front of upstream HTTP APIs and meters
//! access with prepaid credits. Clients hold API keys bound to a single
//! target; every proxied request debits the owning client's balance
//! before the upstream call is made.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Storage**: Pluggable key-value store behind the [`store::KeyStore`]
//!   trait, with an in-memory implementation
//! - **Authentication**: `X-API-Key` for proxied traffic, `X-Admin-Key`
//!   for the management API
//! - **Format**: JSON requests/responses
//!
//! # Request Flow
//!
//! 1. Non-admin, non-health requests fall through to the gateway handler
//! 2. The API key is validated (cached) and its client and target resolved
//! 3. The target's pattern must match the request path
//! 4. Credits are debited, then the request is forwarded upstream
//! 5. The upstream response is relayed with credit headers attached

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod store;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router.
///
/// `/health` and `/admin/*` are explicit routes; everything else falls
/// through to the metered proxy pipeline. Admin routes sit behind the
/// `X-Admin-Key` middleware, including the admin 404 fallback.
pub fn router(state: AppState) -> Router {
    let admin_routes = Router::new()
        // Client management
        .route(
            "/clients",
            post(handlers::clients::create_client).get(handlers::clients::list_clients),
        )
        .route(
            "/clients/{id}",
            get(handlers::clients::get_client)
                .put(handlers::clients::update_client)
                .delete(handlers::clients::delete_client),
        )
        .route(
            "/clients/{id}/keys",
            get(handlers::clients::get_client_keys),
        )
        .route(
            "/clients/{id}/usage",
            get(handlers::clients::get_client_usage),
        )
        // API key management
        .route("/api-keys", post(handlers::api_keys::create_api_key))
        .route(
            "/api-keys/{key}",
            get(handlers::api_keys::get_api_key)
                .put(handlers::api_keys::update_api_key)
                .delete(handlers::api_keys::delete_api_key),
        )
        // Credit balances
        .route(
            "/credits/{client_id}",
            get(handlers::credits_admin::get_credits).put(handlers::credits_admin::set_credits),
        )
        .route(
            "/credits/{client_id}/add",
            post(handlers::credits_admin::add_credits),
        )
        // Routing table (read-only)
        .route("/targets", get(handlers::targets_admin::list_targets))
        .route("/targets/{id}", get(handlers::targets_admin::get_target))
        .fallback(handlers::not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::admin_auth::admin_auth,
        ));

    let (set_request_id, propagate_request_id) = middleware::request_id::layers();

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/admin", admin_routes)
        // The gateway sees every method on every other path
        .fallback(handlers::gateway::proxy_request)
        .layer(CorsLayer::permissive())
        // Propagate sits outside CORS so even layer-generated preflight
        // responses carry the request id
        .layer(propagate_request_id)
        // Distributed tracing middleware for observability
        .layer(TraceLayer::new_for_http())
        .layer(set_request_id)
        .with_state(state)
}
