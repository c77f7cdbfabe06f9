//! End-to-end tests of the HTTP surface over in-memory storage.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Duration;
use fintrack_api::{router, AppState, Config};
use fintrack_auth_core::envelope::{seal_json, Envelope};
use fintrack_auth_core::{ManualClock, PasswordParams, PrivateKey};
use serde_json::{json, Value};
use tower::ServiceExt;

const PKCS8_PEM: &str =
    include_str!("../../../crates/fintrack-auth-core/tests/fixtures/private_pkcs8.pem");

const NOW: i64 = 1_700_000_000;

struct TestApp {
    app: Router,
    state: AppState,
    clock: Arc<ManualClock>,
}

fn test_app(opaque: bool) -> TestApp {
    let opaque = if opaque { "true" } else { "false" };
    let mut config = Config::from_lookup(|key| match key {
        "STORAGE" => Some("memory".to_string()),
        "JWT_SECRET" => Some("api-flow-test-secret-at-least-32-bytes".to_string()),
        "OPAQUE_ENVELOPE_ERRORS" => Some(opaque.to_string()),
        _ => None,
    })
    .unwrap();
    config.auth = config.auth.with_password_params(PasswordParams {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    });

    let key = PrivateKey::from_pem(PKCS8_PEM).unwrap();
    let clock = Arc::new(ManualClock::at_timestamp(NOW));
    let state = AppState::in_memory(config, key, clock.clone()).unwrap();

    TestApp {
        app: router(state.clone()),
        state,
        clock,
    }
}

impl TestApp {
    fn seal_at(&self, payload: &Value, timestamp: i64) -> Envelope {
        seal_json(&self.state.opener.public_key(), payload, timestamp).unwrap()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn post_envelope(
        &self,
        uri: &str,
        envelope: &Envelope,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = builder
            .body(Body::from(serde_json::to_vec(envelope).unwrap()))
            .unwrap();
        self.send(request).await
    }

    async fn post_sealed(
        &self,
        uri: &str,
        payload: Value,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let envelope = self.seal_at(&payload, NOW);
        self.post_envelope(uri, &envelope, token).await
    }

    async fn post_bare(&self, uri: &str, authorization: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> (StatusCode, Value) {
        self.post_sealed(
            "/api/register",
            json!({ "name": name, "email": email, "password": password }),
            None,
        )
        .await
    }

    async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.post_sealed(
            "/api/login",
            json!({ "email": email, "password": password }),
            None,
        )
        .await
    }

    async fn register_and_login(&self, name: &str, email: &str) -> (String, String) {
        let (status, _) = self.register(name, email, "hunter22").await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = self.login(email, "hunter22").await;
        assert_eq!(status, StatusCode::OK);
        (
            body["access_token"].as_str().unwrap().to_string(),
            body["refresh_token"].as_str().unwrap().to_string(),
        )
    }
}

fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}

// ============================================================================
// Account and session lifecycle
// ============================================================================

#[tokio::test]
async fn test_register_login_info_refresh_logout() {
    let t = test_app(false);

    let (status, body) = t.register("Alice", "alice@example.com", "hunter22").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let (status, pair) = t.login("alice@example.com", "hunter22").await;
    assert_eq!(status, StatusCode::OK);
    let access = pair["access_token"].as_str().unwrap().to_string();
    let refresh = pair["refresh_token"].as_str().unwrap().to_string();

    let (status, profile) = t
        .post_bare("/api/user/info", Some(&format!("Bearer {access}")))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["name"], "Alice");
    assert_eq!(profile["email"], "alice@example.com");
    assert_eq!(profile["role"], "user");

    // Bare tokens are accepted as well
    let (status, _) = t.post_bare("/api/user/info", Some(&access)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, rotated) = t
        .post_sealed("/api/refresh-token", json!({ "refresh_token": refresh }), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let new_refresh = rotated["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(new_refresh, refresh);

    // The rotated-away token is dead
    let (status, body) = t
        .post_sealed("/api/refresh-token", json!({ "refresh_token": refresh }), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "REFRESH_TOKEN_EXPIRED");

    let (status, body) = t
        .post_sealed(
            "/api/logout",
            json!({ "refresh_token": new_refresh }),
            Some(&access),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let (status, body) = t
        .post_sealed("/api/refresh-token", json!({ "refresh_token": new_refresh }), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "REFRESH_TOKEN_EXPIRED");
}

#[tokio::test]
async fn test_duplicate_registration() {
    let t = test_app(false);
    t.register("Bob", "bob@example.com", "pw-one").await;

    let (status, body) = t.register("Bobby", "bob@example.com", "pw-two").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "EMAIL_TAKEN");
}

#[tokio::test]
async fn test_login_failures() {
    let t = test_app(false);
    t.register("Carol", "carol@example.com", "right").await;

    let (status, body) = t.login("carol@example.com", "wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "INVALID_CREDENTIALS");

    let (status, body) = t.login("nobody@example.com", "right").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "USER_NOT_FOUND");
}

#[tokio::test]
async fn test_empty_fields_rejected() {
    let t = test_app(false);

    let (status, body) = t.register("Dave", "", "pw").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "BAD_REQUEST");

    let (status, body) = t
        .post_sealed("/api/refresh-token", json!({}), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "BAD_REQUEST");
}

// ============================================================================
// Session gate
// ============================================================================

#[tokio::test]
async fn test_gate_rejections() {
    let t = test_app(false);
    let (_, refresh) = t.register_and_login("Erin", "erin@example.com").await;

    let (status, body) = t.post_bare("/api/user/info", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "MISSING_CREDENTIAL");

    let (status, body) = t.post_bare("/api/user/info", Some("Bearer garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "INVALID_TOKEN");

    // A refresh token never authenticates a request
    let (status, body) = t
        .post_bare("/api/user/info", Some(&format!("Bearer {refresh}")))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "IDENTITY_MISMATCH");
}

#[tokio::test]
async fn test_access_token_expires() {
    let t = test_app(false);
    let (access, _) = t.register_and_login("Frank", "frank@example.com").await;

    // Still valid at exactly `exp`
    t.clock.advance(Duration::seconds(7200));
    let (status, _) = t.post_bare("/api/user/info", Some(&access)).await;
    assert_eq!(status, StatusCode::OK);

    t.clock.advance(Duration::seconds(1));
    let (status, body) = t.post_bare("/api/user/info", Some(&access)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "INVALID_TOKEN");
}

#[tokio::test]
async fn test_logout_requires_ownership() {
    let t = test_app(false);
    let (_, grace_refresh) = t.register_and_login("Grace", "grace@example.com").await;
    let (heidi_access, _) = t.register_and_login("Heidi", "heidi@example.com").await;

    let (status, body) = t
        .post_sealed(
            "/api/logout",
            json!({ "refresh_token": grace_refresh }),
            Some(&heidi_access),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "IDENTITY_MISMATCH");

    // Grace's session survived
    let (status, _) = t
        .post_sealed("/api/refresh-token", json!({ "refresh_token": grace_refresh }), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

// ============================================================================
// Envelope errors
// ============================================================================

#[tokio::test]
async fn test_stale_envelope_reports_distinct_code() {
    let t = test_app(false);
    let envelope = t.seal_at(&json!({ "email": "a@b.c", "password": "x" }), NOW - 61);

    let (status, body) = t.post_envelope("/api/login", &envelope, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "STALE_TIMESTAMP");
}

#[tokio::test]
async fn test_tampered_signature() {
    let t = test_app(false);
    let mut envelope = t.seal_at(&json!({ "email": "a@b.c", "password": "x" }), NOW);
    envelope.sign = "0".repeat(32);

    let (status, body) = t.post_envelope("/api/login", &envelope, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "SIGNATURE_MISMATCH");
}

#[tokio::test]
async fn test_opaque_mode_collapses_envelope_errors() {
    let t = test_app(true);
    let envelope = t.seal_at(&json!({ "email": "a@b.c", "password": "x" }), NOW + 120);

    let (status, body) = t.post_envelope("/api/login", &envelope, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "BAD_ENVELOPE");

    // Non-envelope failures keep their own codes
    let (status, body) = t.login("nobody@example.com", "x").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "USER_NOT_FOUND");
}

#[tokio::test]
async fn test_plain_json_body_is_not_an_envelope() {
    let t = test_app(false);
    let request = Request::builder()
        .method("POST")
        .uri("/api/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"email":"a@b.c","password":"x"}"#))
        .unwrap();

    let (status, body) = t.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "PAYLOAD_DECODE_ERROR");
}

// ============================================================================
// Probes
// ============================================================================

#[tokio::test]
async fn test_health_and_ready() {
    let t = test_app(false);

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = t.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let request = Request::builder().uri("/ready").body(Body::empty()).unwrap();
    let (status, body) = t.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["storage"]["backend"], "memory");
}
