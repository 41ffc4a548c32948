//! Integration tests for the admin management surface: authentication,
//! client and key lifecycles, credit adjustments, usage, and targets.

mod common;

use axum::body::Body;
use axum::extract::Request;
use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{
    ADMIN_KEY, admin_request, keyed_get, read_json, spawn_backend, target, test_app,
    test_app_with,
};

#[tokio::test]
async fn admin_requires_the_configured_key() {
    let app = test_app(vec![], vec![]);

    let bare = Request::builder()
        .uri("/admin/clients")
        .body(Body::empty())
        .unwrap();
    let response = app.send(bare).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(response).await["error"], "Unauthorized");

    let wrong = Request::builder()
        .uri("/admin/clients")
        .header("x-admin-key", format!("{ADMIN_KEY}-nope"))
        .body(Body::empty())
        .unwrap();
    let response = app.send(wrong).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_surface_is_disabled_when_no_key_is_configured() {
    let app = test_app_with(None, vec![], vec![]);

    let request = Request::builder()
        .uri("/admin/clients")
        .header("x-admin-key", "anything")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_admin_paths_are_guarded_then_404() {
    let app = test_app(vec![], vec![]);

    let unauthenticated = Request::builder()
        .uri("/admin/nonsense")
        .body(Body::empty())
        .unwrap();
    assert_eq!(
        app.send(unauthenticated).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let response = app
        .send(admin_request(Method::GET, "/admin/nonsense", None))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json(response).await["error"], "Resource not found");
}

#[tokio::test]
async fn client_lifecycle_with_plan_grant() {
    let app = test_app(vec![], vec![]);

    let response = app
        .send(admin_request(
            Method::POST,
            "/admin/clients",
            Some(json!({
                "name": "Acme Ingest",
                "email": "Ops@Acme.example",
                "plan": "basic",
            })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = read_json(response).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(created["data"]["email"], "ops@acme.example");
    assert_eq!(created["data"]["plan"], "basic");

    // The basic plan grants 1000 credits at creation.
    let credits = app
        .send(admin_request(
            Method::GET,
            &format!("/admin/credits/{id}"),
            None,
        ))
        .await;
    assert_eq!(read_json(credits).await["data"]["balance"], 1000);

    let listed = app
        .send(admin_request(Method::GET, "/admin/clients", None))
        .await;
    let listed = read_json(listed).await;
    assert!(listed["data"]
        .as_array()
        .unwrap()
        .iter()
        .any(|client| client["id"] == id.as_str()));

    let updated = app
        .send(admin_request(
            Method::PUT,
            &format!("/admin/clients/{id}"),
            Some(json!({"name": "Acme Ingest v2"})),
        ))
        .await;
    assert_eq!(updated.status(), StatusCode::OK);
    assert_eq!(read_json(updated).await["data"]["name"], "Acme Ingest v2");

    let deleted = app
        .send(admin_request(
            Method::DELETE,
            &format!("/admin/clients/{id}"),
            None,
        ))
        .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let gone = app
        .send(admin_request(
            Method::GET,
            &format!("/admin/clients/{id}"),
            None,
        ))
        .await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json(gone).await["error"], "Client not found");
}

#[tokio::test]
async fn explicit_client_ids_must_be_unique_and_wellformed() {
    let app = test_app(vec![], vec![]);

    let first = app
        .send(admin_request(
            Method::POST,
            "/admin/clients",
            Some(json!({"id": "tenant-a", "name": "Tenant A"})),
        ))
        .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let duplicate = app
        .send(admin_request(
            Method::POST,
            "/admin/clients",
            Some(json!({"id": "tenant-a", "name": "Tenant A again"})),
        ))
        .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let malformed = app
        .send(admin_request(
            Method::POST,
            "/admin/clients",
            Some(json!({"id": "ten:ant", "name": "Bad id"})),
        ))
        .await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_emails_conflict_case_insensitively() {
    let app = test_app(vec![], vec![]);

    let first = app
        .send(admin_request(
            Method::POST,
            "/admin/clients",
            Some(json!({"name": "One", "email": "OPS@acme.example"})),
        ))
        .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .send(admin_request(
            Method::POST,
            "/admin/clients",
            Some(json!({"name": "Two", "email": "ops@ACME.example"})),
        ))
        .await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn key_lifecycle_applies_immediately_at_the_gateway() {
    let backend = spawn_backend().await;
    let app = test_app(vec![target("api", "/api/*", &backend, 1)], vec![]);

    let created = app
        .send(admin_request(
            Method::POST,
            "/admin/clients",
            Some(json!({"id": "c1", "name": "Meter me"})),
        ))
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);

    let key_response = app
        .send(admin_request(
            Method::POST,
            "/admin/api-keys",
            Some(json!({"clientId": "c1", "targetId": "api"})),
        ))
        .await;
    assert_eq!(key_response.status(), StatusCode::CREATED);
    let key = read_json(key_response).await["data"]["key"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(key.starts_with("tg_"));

    // The fresh key works at the gateway (and warms the cache).
    let first = app.send(keyed_get("/api/data", &key)).await;
    assert_eq!(first.status(), StatusCode::OK);

    // Deactivating must take effect despite the warmed cache.
    let deactivated = app
        .send(admin_request(
            Method::PUT,
            &format!("/admin/api-keys/{key}"),
            Some(json!({"active": false})),
        ))
        .await;
    assert_eq!(deactivated.status(), StatusCode::OK);

    let rejected = app.send(keyed_get("/api/data", &key)).await;
    assert_eq!(rejected.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        read_json(rejected).await["error"],
        "API key expired or inactive"
    );

    let listed = app
        .send(admin_request(Method::GET, "/admin/clients/c1/keys", None))
        .await;
    let listed = read_json(listed).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);
    assert_eq!(listed["data"][0]["active"], false);
}

#[tokio::test]
async fn key_creation_validates_references() {
    let app = test_app(vec![target("api", "/api/*", "http://127.0.0.1:9", 1)], vec![]);

    let unknown_client = app
        .send(admin_request(
            Method::POST,
            "/admin/api-keys",
            Some(json!({"clientId": "ghost", "targetId": "api"})),
        ))
        .await;
    assert_eq!(unknown_client.status(), StatusCode::BAD_REQUEST);

    app.seed_client("c1", 0).await;
    let unknown_target = app
        .send(admin_request(
            Method::POST,
            "/admin/api-keys",
            Some(json!({"clientId": "c1", "targetId": "ghost"})),
        ))
        .await;
    assert_eq!(unknown_target.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn clearing_an_expiry_takes_an_explicit_null() {
    let backend = spawn_backend().await;
    let app = test_app(vec![target("api", "/api/*", &backend, 1)], vec![]);
    app.seed_client("c1", 10).await;
    app.seed_key_record(
        "tg_waning",
        json!({
            "key": "tg_waning",
            "clientId": "c1",
            "targetId": "api",
            "expiresAt": "2020-01-01T00:00:00Z",
            "createdAt": "2019-01-01T00:00:00Z",
        }),
    )
    .await;

    let rejected = app.send(keyed_get("/api/data", "tg_waning")).await;
    assert_eq!(rejected.status(), StatusCode::FORBIDDEN);

    // An update that omits expiresAt leaves the expiry in place.
    let renamed = app
        .send(admin_request(
            Method::PUT,
            "/admin/api-keys/tg_waning",
            Some(json!({"name": "second wind"})),
        ))
        .await;
    assert_eq!(renamed.status(), StatusCode::OK);
    assert_eq!(
        read_json(renamed).await["data"]["expiresAt"],
        "2020-01-01T00:00:00Z"
    );
    let still_rejected = app.send(keyed_get("/api/data", "tg_waning")).await;
    assert_eq!(still_rejected.status(), StatusCode::FORBIDDEN);

    // An explicit null clears it and the key comes back to life.
    let revived = app
        .send(admin_request(
            Method::PUT,
            "/admin/api-keys/tg_waning",
            Some(json!({"expiresAt": null})),
        ))
        .await;
    assert_eq!(revived.status(), StatusCode::OK);
    assert!(read_json(revived).await["data"].get("expiresAt").is_none());

    let accepted = app.send(keyed_get("/api/data", "tg_waning")).await;
    assert_eq!(accepted.status(), StatusCode::OK);
    assert_eq!(app.balance("c1").await, 9);
}

#[tokio::test]
async fn deleting_a_client_cascades_to_keys_and_credits() {
    let app = test_app(vec![target("api", "/api/*", "http://127.0.0.1:9", 1)], vec![]);

    app.send(admin_request(
        Method::POST,
        "/admin/clients",
        Some(json!({"id": "c1", "name": "Doomed"})),
    ))
    .await;
    let key = read_json(
        app.send(admin_request(
            Method::POST,
            "/admin/api-keys",
            Some(json!({"clientId": "c1", "targetId": "api"})),
        ))
        .await,
    )
    .await["data"]["key"]
        .as_str()
        .unwrap()
        .to_string();

    let deleted = app
        .send(admin_request(Method::DELETE, "/admin/clients/c1", None))
        .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let key_gone = app
        .send(admin_request(
            Method::GET,
            &format!("/admin/api-keys/{key}"),
            None,
        ))
        .await;
    assert_eq!(key_gone.status(), StatusCode::NOT_FOUND);

    let credits_gone = app
        .send(admin_request(Method::GET, "/admin/credits/c1", None))
        .await;
    assert_eq!(credits_gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn credit_balances_can_be_set_and_topped_up() {
    let app = test_app(vec![], vec![]);
    app.send(admin_request(
        Method::POST,
        "/admin/clients",
        Some(json!({"id": "c1", "name": "Billing"})),
    ))
    .await;

    let set = app
        .send(admin_request(
            Method::PUT,
            "/admin/credits/c1",
            Some(json!({"balance": 50})),
        ))
        .await;
    assert_eq!(set.status(), StatusCode::OK);
    assert_eq!(read_json(set).await["data"]["balance"], 50);

    let added = app
        .send(admin_request(
            Method::POST,
            "/admin/credits/c1/add",
            Some(json!({"amount": 25})),
        ))
        .await;
    assert_eq!(added.status(), StatusCode::OK);
    assert_eq!(read_json(added).await["data"]["balance"], 75);

    let fetched = app
        .send(admin_request(Method::GET, "/admin/credits/c1", None))
        .await;
    assert_eq!(read_json(fetched).await["data"]["balance"], 75);

    let missing_client = app
        .send(admin_request(Method::GET, "/admin/credits/ghost", None))
        .await;
    assert_eq!(missing_client.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn usage_endpoint_reports_daily_counters() {
    let app = test_app(vec![], vec![]);
    app.seed_client("c1", 0).await;

    app.state.usage.record("c1", "tg_somekey");

    let today = chrono::Utc::now().date_naive();
    let path = format!("/admin/clients/c1/usage?date={today}");
    let mut observed = 0;
    for _ in 0..100 {
        let response = app.send(admin_request(Method::GET, &path, None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        observed = body["data"]["requests"].as_u64().unwrap();
        if observed == 1 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(observed, 1, "usage counter never reached 1");

    // Without a date parameter the endpoint reports today.
    let default_day = app
        .send(admin_request(Method::GET, "/admin/clients/c1/usage", None))
        .await;
    assert_eq!(read_json(default_day).await["data"]["requests"], 1);

    let bad_date = app
        .send(admin_request(
            Method::GET,
            "/admin/clients/c1/usage?date=23-08-2026",
            None,
        ))
        .await;
    assert_eq!(bad_date.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn targets_endpoints_reflect_configuration() {
    let app = test_app(
        vec![
            target("api", "/api/*", "http://127.0.0.1:9", 1),
            target("data", "/data/*", "http://127.0.0.1:9", 2),
        ],
        vec![],
    );

    let listed = app
        .send(admin_request(Method::GET, "/admin/targets", None))
        .await;
    let listed = read_json(listed).await;
    let ids: Vec<&str> = listed["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|descriptor| descriptor["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["api", "data"]);

    let single = app
        .send(admin_request(Method::GET, "/admin/targets/api", None))
        .await;
    assert_eq!(single.status(), StatusCode::OK);
    assert_eq!(read_json(single).await["data"]["pattern"], "/api/*");

    let missing = app
        .send(admin_request(Method::GET, "/admin/targets/ghost", None))
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json(missing).await["error"], "Target not found");
}
