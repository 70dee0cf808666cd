//! HTTP collaborator tests
//! Runs ApiClient and AuthorizedClient against an in-process mock backend

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use farmtwin::api::{ApiClient, AuthorizedClient};
use farmtwin::auth::{KeyValueStore, MemoryStore, Role, Session, SessionManager, TOKEN_KEY, USER_KEY};
use farmtwin::config::ApiConfig;
use farmtwin::Error;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Tokens the mock backend currently accepts
#[derive(Clone, Default)]
struct MockBackend {
    valid_tokens: Arc<Mutex<HashSet<String>>>,
}

impl MockBackend {
    fn revoke_all(&self) {
        self.valid_tokens.lock().unwrap().clear();
    }

    fn authorized(&self, headers: &HeaderMap) -> Option<String> {
        let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
        let token = value.strip_prefix("Bearer ")?;
        self.valid_tokens
            .lock()
            .unwrap()
            .contains(token)
            .then(|| token.to_string())
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Invalid token"})),
    )
        .into_response()
}

async fn login(State(backend): State<MockBackend>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let (token, user) = match (email, password) {
        ("admin@farmtwin.com", "admin123") => (
            "tok-admin",
            json!({"id": 1, "name": "Admin", "email": email, "role": "admin"}),
        ),
        ("manager@farmtwin.com", "manager123") => (
            "tok-manager",
            json!({"id": 3, "name": "Maria", "email": email, "role": "manager"}),
        ),
        ("odd@farmtwin.com", "odd123") => (
            "tok-odd",
            json!({"id": 9, "name": "Odd", "email": email, "role": "farmhand"}),
        ),
        ("broken@farmtwin.com", _) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response()
        }
        ("slow@farmtwin.com", _) => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            return StatusCode::GATEWAY_TIMEOUT.into_response();
        }
        _ => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"detail": "Invalid credentials"})),
            )
                .into_response()
        }
    };

    backend.valid_tokens.lock().unwrap().insert(token.to_string());
    Json(json!({"token": token, "user": user})).into_response()
}

async fn profile(State(backend): State<MockBackend>, headers: HeaderMap) -> Response {
    match backend.authorized(&headers).as_deref() {
        Some("tok-admin") => {
            Json(json!({"id": 1, "name": "Admin", "email": "admin@farmtwin.com", "role": "admin"}))
                .into_response()
        }
        Some("tok-manager") => Json(
            json!({"id": 3, "name": "Maria", "email": "manager@farmtwin.com", "role": "manager"}),
        )
        .into_response(),
        Some(_) => (StatusCode::NOT_FOUND, Json(json!({"detail": "User not found"}))).into_response(),
        None => unauthorized(),
    }
}

async fn dashboard_stats(State(backend): State<MockBackend>, headers: HeaderMap) -> Response {
    if backend.authorized(&headers).is_none() {
        return unauthorized();
    }
    Json(json!({"total_farms": 2, "total_barns": 5, "pending_checklists": 1})).into_response()
}

async fn approve(State(backend): State<MockBackend>, headers: HeaderMap) -> Response {
    match backend.authorized(&headers).as_deref() {
        Some("tok-manager") | Some("tok-admin") => {
            Json(json!({"message": "Checklist approved"})).into_response()
        }
        Some(_) => (
            StatusCode::FORBIDDEN,
            Json(json!({"detail": "Only managers can approve"})),
        )
            .into_response(),
        None => unauthorized(),
    }
}

async fn slow() -> Response {
    tokio::time::sleep(Duration::from_secs(3)).await;
    Json(json!({})).into_response()
}

async fn slow_unauthorized() -> Response {
    tokio::time::sleep(Duration::from_millis(500)).await;
    unauthorized()
}

/// Start the mock backend and return its API base URL
async fn start_mock_backend(backend: MockBackend) -> String {
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/user/profile", get(profile))
        .route("/api/dashboard/stats", get(dashboard_stats))
        .route("/api/checklists/1/approve", post(approve))
        .route("/api/slow", get(slow))
        .route("/api/slow-unauthorized", get(slow_unauthorized))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock backend");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    format!("http://{}/api", addr)
}

struct Harness {
    backend: MockBackend,
    store: MemoryStore,
    sessions: SessionManager,
    client: AuthorizedClient,
}

async fn harness(timeout_secs: u64) -> Harness {
    let backend = MockBackend::default();
    let base_url = start_mock_backend(backend.clone()).await;
    harness_at(backend, base_url, timeout_secs)
}

fn harness_at(backend: MockBackend, base_url: String, timeout_secs: u64) -> Harness {
    let api = ApiClient::new(&ApiConfig {
        base_url,
        timeout_secs,
    })
    .expect("Failed to build client");
    let store = MemoryStore::new();
    let sessions = SessionManager::new(Arc::new(store.clone()), Arc::new(api.clone()));
    let client = AuthorizedClient::new(api, sessions.clone());
    Harness {
        backend,
        store,
        sessions,
        client,
    }
}

#[tokio::test]
async fn test_login_over_http() {
    let h = harness(10).await;
    let session = h
        .sessions
        .login("admin@farmtwin.com", "admin123")
        .await
        .expect("login should succeed");

    assert_eq!(session.token(), Some("tok-admin"));
    assert_eq!(session.role(), Some(Role::Admin));
    assert_eq!(
        h.store.get(TOKEN_KEY).await.unwrap().as_deref(),
        Some("tok-admin")
    );
}

#[tokio::test]
async fn test_login_rejection_carries_server_detail() {
    let h = harness(10).await;
    let err = h.sessions.login("a@b.com", "wrong").await.unwrap_err();

    match err {
        Error::InvalidCredentials(message) => assert_eq!(message, "Invalid credentials"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(h.sessions.current(), Session::LoggedOut);
}

#[tokio::test]
async fn test_login_error_without_detail_uses_fallback() {
    let h = harness(10).await;
    let err = h
        .sessions
        .login("broken@farmtwin.com", "whatever")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidCredentials(ref m) if m == "Invalid credentials"));
}

#[tokio::test]
async fn test_unknown_role_over_http_becomes_worker() {
    let h = harness(10).await;
    let session = h.sessions.login("odd@farmtwin.com", "odd123").await.unwrap();
    assert_eq!(session.role(), Some(Role::Worker));
}

#[tokio::test]
async fn test_authorized_request_attaches_bearer() {
    let h = harness(10).await;
    h.sessions
        .login("manager@farmtwin.com", "manager123")
        .await
        .unwrap();

    let user = h.client.profile().await.expect("profile should load");
    assert_eq!(user.id, 3);
    assert_eq!(user.role, Role::Manager);

    let stats: Value = h.client.get_json("/dashboard/stats").await.unwrap();
    assert_eq!(stats["total_barns"], 5);
}

#[tokio::test]
async fn test_401_forces_logout() {
    let h = harness(10).await;
    h.sessions
        .login("manager@farmtwin.com", "manager123")
        .await
        .unwrap();
    assert_eq!(h.sessions.current().user().unwrap().id, 3);

    // Server-side revocation
    h.backend.revoke_all();

    let err = h.client.get_json::<Value>("/dashboard/stats").await.unwrap_err();
    assert!(matches!(err, Error::AuthorizationExpired(ref m) if m == "Invalid token"));
    assert_eq!(h.sessions.current(), Session::LoggedOut);
    assert!(!h.store.contains(TOKEN_KEY).await);
    assert!(!h.store.contains(USER_KEY).await);
}

#[tokio::test]
async fn test_request_without_session_gets_401() {
    let h = harness(10).await;
    let err = h.client.profile().await.unwrap_err();
    assert!(matches!(err, Error::AuthorizationExpired(_)));
    assert_eq!(h.sessions.current(), Session::LoggedOut);
}

#[tokio::test]
async fn test_non_401_errors_keep_session() {
    let h = harness(10).await;
    h.sessions
        .login("odd@farmtwin.com", "odd123")
        .await
        .unwrap();

    let err = h
        .client
        .post_json::<(), Value>("/checklists/1/approve", None)
        .await
        .unwrap_err();
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "Only managers can approve");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(h.sessions.current().is_logged_in());
}

#[tokio::test]
async fn test_post_with_bearer() {
    let h = harness(10).await;
    h.sessions
        .login("manager@farmtwin.com", "manager123")
        .await
        .unwrap();

    let reply: Value = h
        .client
        .post_json::<(), Value>("/checklists/1/approve", None)
        .await
        .unwrap();
    assert_eq!(reply["message"], "Checklist approved");
}

#[tokio::test]
async fn test_unreachable_backend() {
    // Grab a free port, then close it so nothing is listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let h = harness_at(MockBackend::default(), format!("http://{}/api", addr), 10);
    let err = h
        .sessions
        .login("admin@farmtwin.com", "admin123")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NetworkUnavailable(_)));
    assert_eq!(h.sessions.current(), Session::LoggedOut);
}

#[tokio::test]
async fn test_login_timeout_is_network_unavailable() {
    let h = harness(1).await;
    let err = h
        .sessions
        .login("slow@farmtwin.com", "whatever")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NetworkUnavailable(_)));
}

#[tokio::test]
async fn test_request_timeout_keeps_session() {
    let h = harness(1).await;
    h.sessions
        .login("admin@farmtwin.com", "admin123")
        .await
        .unwrap();

    let err = h.client.get_json::<Value>("/slow").await.unwrap_err();
    assert!(matches!(err, Error::NetworkUnavailable(_)));
    assert!(h.sessions.current().is_logged_in());
}

#[tokio::test]
async fn test_late_401_from_anonymous_request_keeps_new_login() {
    let h = harness(10).await;

    // Sent before anyone logged in, answered after the login lands
    let anonymous = {
        let client = h.client.clone();
        tokio::spawn(async move { client.get_json::<Value>("/slow-unauthorized").await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    h.sessions
        .login("manager@farmtwin.com", "manager123")
        .await
        .unwrap();

    let err = anonymous.await.unwrap().unwrap_err();
    assert!(matches!(err, Error::AuthorizationExpired(_)));
    assert_eq!(h.sessions.current().role(), Some(Role::Manager));
    assert_eq!(
        h.store.get(TOKEN_KEY).await.unwrap().as_deref(),
        Some("tok-manager")
    );
    assert!(h.store.contains(USER_KEY).await);
}
