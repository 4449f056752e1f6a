//! The session store: single source of truth for the authenticated
//! session, mediating between durable storage and the identity service.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use auth_core::authz;
use auth_core::models::{Organization, ResolvedRole, User};
use secrecy::ExposeSecret;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::AuthSettings;
use crate::services::error::AuthError;
use crate::services::identity::IdentityApi;
use crate::session::url::extract_token_param;
use crate::storage::{keys, KeyValueStorage};

/// In-memory snapshot of the authenticated session.
///
/// `is_authenticated` is never true while `user` is absent, and
/// `is_loading` settles to false whenever a fetch settles, success or
/// failure.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub user: Option<User>,
    pub organization: Option<Organization>,
    pub role: Option<ResolvedRole>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Session {
    fn anonymous() -> Self {
        Self::default()
    }
}

/// Callbacks fired when an identity fetch settles.
#[derive(Default)]
pub struct AuthCallbacks {
    pub on_auth_success: Option<Box<dyn Fn(&User) + Send + Sync>>,
    pub on_auth_error: Option<Box<dyn Fn(&AuthError) + Send + Sync>>,
}

/// Single source of truth for the authenticated session.
///
/// All collaborators are injected: settings, durable storage, and the
/// identity transport. The session is mutated only through the
/// operations below; consumers observe it via [`AuthSessionStore::session`]
/// snapshots or a [`AuthSessionStore::subscribe`] watch channel.
pub struct AuthSessionStore {
    settings: AuthSettings,
    storage: Arc<dyn KeyValueStorage>,
    api: Arc<dyn IdentityApi>,
    callbacks: AuthCallbacks,
    state: watch::Sender<Session>,
    /// Bumped on logout and token swap; in-flight refreshes compare
    /// against it before applying their result, so a stale resolution
    /// cannot resurrect a session that was torn down in the interim.
    generation: AtomicU64,
}

impl AuthSessionStore {
    /// Build a store and hydrate it synchronously from durable storage.
    ///
    /// A cached user alongside a token yields an optimistic
    /// authenticated session before any network call resolves.
    pub fn new(
        settings: AuthSettings,
        storage: Arc<dyn KeyValueStorage>,
        api: Arc<dyn IdentityApi>,
    ) -> Result<Self, AuthError> {
        Self::with_callbacks(settings, storage, api, AuthCallbacks::default())
    }

    pub fn with_callbacks(
        settings: AuthSettings,
        storage: Arc<dyn KeyValueStorage>,
        api: Arc<dyn IdentityApi>,
        callbacks: AuthCallbacks,
    ) -> Result<Self, AuthError> {
        let settings = settings.validated()?;
        storage.set(keys::API_KEY, settings.api_key.expose_secret());

        let session = Self::hydrate(storage.as_ref(), settings.auto_fetch);
        let (state, _) = watch::channel(session);

        Ok(Self {
            settings,
            storage,
            api,
            callbacks,
            state,
            generation: AtomicU64::new(0),
        })
    }

    fn hydrate(storage: &dyn KeyValueStorage, auto_fetch: bool) -> Session {
        let token = storage.get(keys::AUTH_TOKEN);
        let user: Option<User> = storage
            .get(keys::USER)
            .and_then(|raw| serde_json::from_str(&raw).ok());
        let organization: Option<Organization> = storage
            .get(keys::ORGANIZATION)
            .and_then(|raw| serde_json::from_str(&raw).ok());
        let role: Option<ResolvedRole> = storage
            .get(keys::ROLE)
            .and_then(|raw| serde_json::from_str(&raw).ok());

        match (token, user) {
            (Some(_), Some(user)) => Session {
                user: Some(user),
                organization,
                role,
                is_authenticated: true,
                is_loading: auto_fetch,
                error: None,
            },
            (Some(_), None) => Session {
                is_loading: auto_fetch,
                ..Session::anonymous()
            },
            // No token forces the unauthenticated terminal state; stale
            // cached identity data is not trusted without one.
            _ => Session::anonymous(),
        }
    }

    /// Run the initial identity check. Call once after construction; a
    /// no-op when `auto_fetch` is disabled or no token is stored.
    pub async fn start(&self) {
        if self.settings.auto_fetch && self.get_auth_token().is_some() {
            let (_, _) = futures::join!(self.refresh_user(), self.refresh_role());
        }
    }

    /// Absorb a magic-link token from a navigable URL, persisting it and
    /// returning the URL with the parameter stripped so the host can
    /// replace its visible location. `None` when the URL carries no
    /// token.
    pub fn absorb_redirect_url(&self, url: &str) -> Option<String> {
        let (token, cleaned) = extract_token_param(url)?;
        self.storage.set(keys::AUTH_TOKEN, &token);
        Some(cleaned)
    }

    /// Re-fetch the current user and organization from the identity
    /// service.
    ///
    /// Success populates user/organization and clears the error; failure
    /// clears them, purges the cached snapshots, and surfaces the error
    /// in the session. A logout or token swap while the fetch is in
    /// flight discards the result.
    pub async fn refresh_user(&self) -> Result<(), AuthError> {
        let Some(token) = self.get_auth_token() else {
            self.update(|session| *session = Session::anonymous());
            return Ok(());
        };

        let generation = self.generation.load(Ordering::SeqCst);
        self.update(|session| session.is_loading = true);

        let result = self.api.fetch_current_user(&token).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("Discarding stale identity fetch result");
            return Ok(());
        }

        match result {
            Ok(current) => {
                self.cache_json(keys::USER, &current.user);
                match &current.organization {
                    Some(organization) => self.cache_json(keys::ORGANIZATION, organization),
                    None => self.storage.remove(keys::ORGANIZATION),
                }
                tracing::info!(user_id = %current.user.id, "Identity refreshed");
                if let Some(on_success) = &self.callbacks.on_auth_success {
                    on_success(&current.user);
                }
                self.update(move |session| {
                    session.user = Some(current.user);
                    session.organization = current.organization;
                    session.is_authenticated = true;
                    session.is_loading = false;
                    session.error = None;
                });
                Ok(())
            }
            Err(err) => {
                self.storage.remove(keys::USER);
                self.storage.remove(keys::ORGANIZATION);
                if let Some(on_error) = &self.callbacks.on_auth_error {
                    on_error(&err);
                }
                let message = err.to_string();
                self.update(move |session| {
                    session.user = None;
                    session.organization = None;
                    session.is_authenticated = false;
                    session.is_loading = false;
                    session.error = Some(message);
                });
                Err(err)
            }
        }
    }

    /// Re-fetch the resolved role.
    ///
    /// Failure is isolated to the role field: it is logged and the role
    /// cleared, while user, error, and the authentication flag keep
    /// their pre-call values. A secondary data fetch must never lock a
    /// user out of an otherwise-valid session.
    pub async fn refresh_role(&self) {
        let Some(token) = self.get_auth_token() else {
            self.update(|session| session.role = None);
            return;
        };

        let generation = self.generation.load(Ordering::SeqCst);
        let result = self.api.fetch_current_role(&token).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("Discarding stale role fetch result");
            return;
        }

        match result {
            Ok(current) => {
                let role = ResolvedRole::from(current);
                self.cache_json(keys::ROLE, &role);
                self.update(move |session| session.role = Some(role));
            }
            Err(err) => {
                tracing::warn!(error = %err, "Role refresh failed, clearing role");
                self.storage.remove(keys::ROLE);
                self.update(|session| session.role = None);
            }
        }
    }

    /// Install a new bearer token and refresh user and role
    /// concurrently, or log out when `token` is `None`.
    pub async fn set_auth_token(&self, token: Option<&str>) -> Result<(), AuthError> {
        match token {
            Some(token) => {
                self.generation.fetch_add(1, Ordering::SeqCst);
                self.storage.set(keys::AUTH_TOKEN, token);
                let (user_result, _) = futures::join!(self.refresh_user(), self.refresh_role());
                user_result
            }
            None => {
                let _ = self.logout();
                Ok(())
            }
        }
    }

    /// Log out locally, then notify the identity service best-effort.
    ///
    /// Local teardown is synchronous and unconditional: storage keys are
    /// removed and the session reset before any network activity, so the
    /// session never stays authenticated pending a round trip. The
    /// returned handle resolves the remote notification and may be
    /// dropped; its failure is logged and swallowed.
    pub fn logout(&self) -> JoinHandle<Result<(), AuthError>> {
        self.generation.fetch_add(1, Ordering::SeqCst);

        let token = self.storage.get(keys::AUTH_TOKEN);
        self.storage.remove(keys::AUTH_TOKEN);
        self.storage.remove(keys::USER);
        self.storage.remove(keys::ORGANIZATION);
        self.storage.remove(keys::ROLE);
        self.update(|session| *session = Session::anonymous());

        let api = Arc::clone(&self.api);
        tokio::spawn(async move {
            let Some(token) = token else {
                return Ok(());
            };
            api.notify_logout(&token).await.map_err(|err| {
                tracing::debug!(error = %err, "Logout notification failed");
                err
            })
        })
    }

    /// Current session snapshot.
    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Subscribe to session transitions.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub fn get_auth_token(&self) -> Option<String> {
        self.storage.get(keys::AUTH_TOKEN)
    }

    /// Replace the persisted tenant scoping key. The key is configured
    /// once per application instance; transports keep the key they were
    /// constructed with.
    pub fn set_api_key(&self, api_key: &str) {
        self.storage.set(keys::API_KEY, api_key);
    }

    pub fn get_api_key(&self) -> Option<String> {
        self.storage.get(keys::API_KEY)
    }

    /// Check a `resource:action` permission against the resolved role.
    pub fn has_permission(&self, permission: &str) -> bool {
        let session = self.state.borrow();
        authz::has_permission(session.role.as_ref(), permission)
    }

    pub fn has_any_permission(&self, permissions: &[&str]) -> bool {
        let session = self.state.borrow();
        authz::has_any_permission(session.role.as_ref(), permissions)
    }

    pub fn has_all_permissions(&self, permissions: &[&str]) -> bool {
        let session = self.state.borrow();
        authz::has_all_permissions(session.role.as_ref(), permissions)
    }

    /// Check a role slug against the resolved role, falling back to the
    /// user's embedded role slug.
    pub fn has_role(&self, slug: &str) -> bool {
        let session = self.state.borrow();
        authz::has_role(
            session.role.as_ref(),
            session.user.as_ref().and_then(|user| user.role.as_deref()),
            slug,
        )
    }

    /// URL of the hosted logout page.
    pub fn logout_url(&self) -> String {
        self.settings.logout_url()
    }

    /// URL of the hosted profile page.
    pub fn profile_url(&self) -> String {
        self.settings.profile_url()
    }

    fn cache_json<T: serde::Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => self.storage.set(key, &json),
            Err(err) => tracing::warn!(key, error = %err, "Failed to serialize session snapshot"),
        }
    }

    fn update(&self, mutate: impl FnOnce(&mut Session)) {
        self.state.send_modify(mutate);
    }
}
