#![allow(dead_code)]

//! Shared harness for integration tests.
//!
//! Builds the full router against an in-memory store and spawns real
//! loopback backends so forwarded requests travel the wire.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::Request;
use axum::http::Method;
use axum::response::Response;
use serde_json::{Value, json};
use tower::ServiceExt;

use tollgate::config::Config;
use tollgate::models::target::{CostRule, TargetDescriptor};
use tollgate::services::targets::TargetTable;
use tollgate::state::AppState;
use tollgate::store::memory::MemoryStore;
use tollgate::store::{KeyStore, keys};

pub const ADMIN_KEY: &str = "integration-admin-key";

/// A fully wired application plus handles for seeding and inspection.
pub struct TestApp {
    pub state: AppState,
    router: Router,
}

/// Build an app with the admin surface enabled under [`ADMIN_KEY`].
pub fn test_app(targets: Vec<TargetDescriptor>, rules: Vec<CostRule>) -> TestApp {
    test_app_with(Some(ADMIN_KEY), targets, rules)
}

/// Build an app with an explicit admin key, or none to disable the
/// admin surface.
pub fn test_app_with(
    admin_key: Option<&str>,
    targets: Vec<TargetDescriptor>,
    rules: Vec<CostRule>,
) -> TestApp {
    let mut vars = vec![
        ("UPSTREAM_TIMEOUT_SECS".to_string(), "2".to_string()),
        ("KEY_CACHE_TTL_SECS".to_string(), "60".to_string()),
    ];
    if let Some(key) = admin_key {
        vars.push(("ADMIN_KEY".to_string(), key.to_string()));
    }
    let config: Config = envy::from_iter(vars).unwrap();

    let store: Arc<dyn KeyStore> = Arc::new(MemoryStore::new());
    let state = AppState::new(config, store, TargetTable::new(targets, rules)).unwrap();
    TestApp {
        router: tollgate::router(state.clone()),
        state,
    }
}

impl TestApp {
    /// Drive one request through the whole middleware and routing stack.
    pub async fn send(&self, request: Request) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Write a minimal client record and its starting balance straight
    /// into the store.
    pub async fn seed_client(&self, id: &str, balance: u64) {
        let record = json!({
            "id": id,
            "name": format!("{id} (seeded)"),
            "createdAt": "2026-01-01T00:00:00Z",
        });
        self.state
            .store
            .put(&keys::client(id), &record.to_string())
            .await
            .unwrap();
        self.state.ledger.set(id, balance).await.unwrap();
    }

    /// Write an active, never-expiring API key record.
    pub async fn seed_key(&self, raw: &str, client_id: &str, target_id: &str) {
        self.seed_key_record(
            raw,
            json!({
                "key": raw,
                "clientId": client_id,
                "targetId": target_id,
                "createdAt": "2026-01-01T00:00:00Z",
            }),
        )
        .await;
    }

    /// Write an arbitrary API key record, for inactive or expiring keys.
    pub async fn seed_key_record(&self, raw: &str, record: Value) {
        self.state
            .store
            .put(&keys::api_key(raw), &record.to_string())
            .await
            .unwrap();
    }

    pub async fn balance(&self, client_id: &str) -> u64 {
        self.state.ledger.balance(client_id).await.unwrap()
    }
}

/// Plain descriptor with the defaults the loader would apply.
pub fn target(id: &str, pattern: &str, target_url: &str, cost: u64) -> TargetDescriptor {
    TargetDescriptor {
        id: id.to_string(),
        pattern: pattern.to_string(),
        is_regex: false,
        target_url: target_url.to_string(),
        cost,
        custom_headers: HashMap::new(),
        forward_api_key: false,
        add_credits_header: true,
    }
}

/// GET request carrying an `X-API-Key` header.
pub fn keyed_get(path: &str, api_key: &str) -> Request {
    Request::builder()
        .uri(path)
        .header("x-api-key", api_key)
        .body(Body::empty())
        .unwrap()
}

/// Admin request with the harness admin key and an optional JSON body.
pub fn admin_request(method: Method, path: &str, body: Option<Value>) -> Request {
    let builder = Request::builder()
        .method(method)
        .uri(path)
        .header("x-admin-key", ADMIN_KEY);
    match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Collect a response body as JSON.
pub async fn read_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Spawn an echo backend on a loopback port and return its base URL.
///
/// The backend answers every request with a JSON description of what it
/// received, so tests can assert on the rewritten path, surviving
/// headers, and relayed body.
pub async fn spawn_backend() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(echo);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// A base URL whose port was bound once and then released, so connecting
/// to it fails.
pub async fn unreachable_backend() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

async fn echo(request: Request) -> axum::Json<Value> {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, 1024 * 1024).await.unwrap_or_default();
    let headers: HashMap<String, String> = parts
        .headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect();
    axum::Json(json!({
        "method": parts.method.as_str(),
        "path": parts.uri.path(),
        "query": parts.uri.query(),
        "headers": headers,
        "body": String::from_utf8_lossy(&bytes),
    }))
}
