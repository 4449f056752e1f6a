//! Test helpers: a mock identity service plus store construction.
//!
//! The mock binds a random local port and speaks the same routes and
//! response shapes as the real identity service, so tests exercise the
//! full HTTP client path.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use auth_client::config::{AuthSettings, AuthSettingsBuilder};
use auth_client::services::identity::HttpIdentityClient;
use auth_client::session::AuthSessionStore;
use auth_client::storage::{keys, MemoryStorage};
use auth_core::models::{
    Branding, IdentityProvider, Organization, Permission, ResolvedRole, RoleDetails, User,
};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use tokio::net::TcpListener;
use uuid::Uuid;

pub const TEST_API_KEY: &str = "test-api-key-12345";

static TRACING: Once = Once::new();

/// Initialize test log output once per test binary.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn test_user() -> User {
    User {
        id: format!("u-{}", Uuid::new_v4()),
        email: "ada@example.com".to_string(),
        first_name: Some("Ada".to_string()),
        last_name: Some("Lovelace".to_string()),
        role: Some("admin".to_string()),
        email_verified: true,
        provider: IdentityProvider::Password,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn test_organization() -> Organization {
    Organization {
        id: "org-1".to_string(),
        name: "Analytical Engines Ltd".to_string(),
        contact_email: Some("ops@example.com".to_string()),
        branding: Branding::default(),
    }
}

pub fn test_role() -> ResolvedRole {
    ResolvedRole::new(
        "editor",
        Some(RoleDetails {
            name: "Editor".to_string(),
            slug: "editor".to_string(),
            permissions: vec![
                Permission {
                    resource: "billing".to_string(),
                    action: "view".to_string(),
                    allowed: true,
                },
                Permission {
                    resource: "billing".to_string(),
                    action: "edit".to_string(),
                    allowed: false,
                },
            ],
            is_system: false,
            is_default: false,
        }),
    )
}

/// Behavior switches and recorded observations for the mock service.
#[derive(Clone)]
pub struct MockState {
    pub valid_token: String,
    pub user: User,
    pub organization: Organization,
    pub role: ResolvedRole,
    /// Force 401 from `/users/me`.
    pub reject_user: Arc<AtomicBool>,
    /// Force 500 from `/users/me/role`.
    pub fail_role: Arc<AtomicBool>,
    /// Delay `/users/me` responses, for races around logout.
    pub user_delay_ms: Arc<AtomicU64>,
    pub logout_calls: Arc<AtomicUsize>,
    /// Headers seen on the last `/users/me` call.
    pub seen_headers: Arc<Mutex<Option<HeaderMap>>>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            valid_token: format!("tok-{}", Uuid::new_v4()),
            user: test_user(),
            organization: test_organization(),
            role: test_role(),
            reject_user: Arc::new(AtomicBool::new(false)),
            fail_role: Arc::new(AtomicBool::new(false)),
            user_delay_ms: Arc::new(AtomicU64::new(0)),
            logout_calls: Arc::new(AtomicUsize::new(0)),
            seen_headers: Arc::new(Mutex::new(None)),
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

fn api_key(headers: &HeaderMap) -> Option<&str> {
    headers.get("x-api-key").and_then(|value| value.to_str().ok())
}

async fn current_user(
    State(state): State<MockState>,
    headers: HeaderMap,
) -> (StatusCode, Json<serde_json::Value>) {
    *state.seen_headers.lock().unwrap() = Some(headers.clone());

    if api_key(&headers) != Some(TEST_API_KEY) {
        return (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({ "error": "Invalid tenant API key" })),
        );
    }

    let delay = state.user_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    if state.reject_user.load(Ordering::SeqCst)
        || bearer_token(&headers) != Some(state.valid_token.as_str())
    {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "Invalid or expired token" })),
        );
    }

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "user": state.user,
            "organization": state.organization,
        })),
    )
}

async fn current_role(
    State(state): State<MockState>,
    headers: HeaderMap,
) -> (StatusCode, Json<serde_json::Value>) {
    if api_key(&headers) != Some(TEST_API_KEY) {
        return (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({ "error": "Invalid tenant API key" })),
        );
    }

    if state.fail_role.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "Role lookup failed" })),
        );
    }

    if bearer_token(&headers) != Some(state.valid_token.as_str()) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "Invalid or expired token" })),
        );
    }

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "role": state.role.role,
            "role_details": state.role.role_details,
        })),
    )
}

async fn logout(State(state): State<MockState>) -> StatusCode {
    state.logout_calls.fetch_add(1, Ordering::SeqCst);
    StatusCode::OK
}

async fn introspect(
    State(state): State<MockState>,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, Json<serde_json::Value>) {
    let token = body["token"].as_str().unwrap_or_default();
    if token == state.valid_token {
        (
            StatusCode::OK,
            Json(serde_json::json!({ "valid": true, "user": state.user })),
        )
    } else {
        (
            StatusCode::OK,
            Json(serde_json::json!({ "valid": false, "error": "Invalid or expired token" })),
        )
    }
}

fn router(state: MockState) -> Router {
    Router::new()
        .route("/users/me", get(current_user))
        .route("/users/me/role", get(current_role))
        .route("/auth/logout", post(logout))
        .route("/auth/introspect", post(introspect))
        .with_state(state)
}

/// Mock identity service bound to a random local port.
pub struct TestApp {
    pub address: String,
    pub state: MockState,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(MockState::default()).await
    }

    pub async fn spawn_with(state: MockState) -> Self {
        init_tracing();

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener.local_addr().unwrap().port();

        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Mock identity service crashed");
        });

        Self {
            address: format!("http://127.0.0.1:{}", port),
            state,
        }
    }

    pub fn valid_token(&self) -> &str {
        &self.state.valid_token
    }

    pub fn settings_builder(&self) -> AuthSettingsBuilder {
        AuthSettingsBuilder::default()
            .api_auth_base_url(self.address.as_str())
            .ui_auth_url("https://id.example.com")
            .api_key(TEST_API_KEY)
    }

    pub fn settings(&self) -> AuthSettings {
        self.settings_builder().build().unwrap()
    }

    pub fn client(&self) -> HttpIdentityClient {
        HttpIdentityClient::new(&self.settings()).unwrap()
    }

    /// Store backed by fresh in-memory storage.
    pub fn store(&self) -> (Arc<AuthSessionStore>, Arc<MemoryStorage>) {
        self.store_with(self.settings())
    }

    pub fn store_with(&self, settings: AuthSettings) -> (Arc<AuthSessionStore>, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let store =
            AuthSessionStore::new(settings, storage.clone(), Arc::new(self.client())).unwrap();
        (Arc::new(store), storage)
    }

    /// Store whose storage is pre-seeded as a previously logged-in
    /// client.
    pub fn seeded_store(&self) -> (Arc<AuthSessionStore>, Arc<MemoryStorage>) {
        let storage = self.seeded_storage();
        let store = AuthSessionStore::new(self.settings(), storage.clone(), Arc::new(self.client()))
            .unwrap();
        (Arc::new(store), storage)
    }

    pub fn seeded_storage(&self) -> Arc<MemoryStorage> {
        use auth_client::storage::KeyValueStorage;

        let storage = Arc::new(MemoryStorage::new());
        storage.set(keys::AUTH_TOKEN, &self.state.valid_token);
        storage.set(keys::USER, &serde_json::to_string(&self.state.user).unwrap());
        storage.set(
            keys::ORGANIZATION,
            &serde_json::to_string(&self.state.organization).unwrap(),
        );
        storage
    }
}
