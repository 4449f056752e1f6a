//! Provider/handle pair exposing the session store to a host
//! application.
//!
//! The provider owns the store for an application tree; consumers hold
//! cloneable handles. Nothing is a global: every collaborator is passed
//! in at construction.

use std::sync::{Arc, Weak};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::AuthSettings;
use crate::services::error::AuthError;
use crate::services::identity::IdentityApi;
use crate::session::{AuthCallbacks, AuthSessionStore, Session};
use crate::storage::KeyValueStorage;

/// Owns the session store for an application tree and hands out handles.
pub struct AuthProvider {
    store: Arc<AuthSessionStore>,
}

impl AuthProvider {
    /// Build the provider with explicit collaborators. Fails fast on
    /// invalid settings.
    pub fn new(
        settings: AuthSettings,
        storage: Arc<dyn KeyValueStorage>,
        api: Arc<dyn IdentityApi>,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            store: Arc::new(AuthSessionStore::new(settings, storage, api)?),
        })
    }

    pub fn with_callbacks(
        settings: AuthSettings,
        storage: Arc<dyn KeyValueStorage>,
        api: Arc<dyn IdentityApi>,
        callbacks: AuthCallbacks,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            store: Arc::new(AuthSessionStore::with_callbacks(
                settings, storage, api, callbacks,
            )?),
        })
    }

    /// Run the initial identity check (the mount trigger).
    pub async fn start(&self) {
        self.store.start().await;
    }

    /// Hand out a handle for consumers inside this provider's scope.
    pub fn handle(&self) -> AuthHandle {
        AuthHandle {
            store: Arc::downgrade(&self.store),
        }
    }

    /// Direct store access for the owner.
    pub fn store(&self) -> &Arc<AuthSessionStore> {
        &self.store
    }
}

/// Cloneable accessor used by consumers.
///
/// A handle outliving its provider is a wiring mistake, so every
/// accessor fails with a configuration error once the provider is gone.
#[derive(Clone)]
pub struct AuthHandle {
    store: Weak<AuthSessionStore>,
}

impl AuthHandle {
    fn store(&self) -> Result<Arc<AuthSessionStore>, AuthError> {
        self.store.upgrade().ok_or_else(|| {
            AuthError::Configuration(
                "AuthHandle used after its AuthProvider was dropped".to_string(),
            )
        })
    }

    /// Current session snapshot.
    pub fn session(&self) -> Result<Session, AuthError> {
        Ok(self.store()?.session())
    }

    /// Subscribe to session transitions.
    pub fn subscribe(&self) -> Result<watch::Receiver<Session>, AuthError> {
        Ok(self.store()?.subscribe())
    }

    pub async fn refresh_user(&self) -> Result<(), AuthError> {
        self.store()?.refresh_user().await
    }

    pub async fn refresh_role(&self) -> Result<(), AuthError> {
        self.store()?.refresh_role().await;
        Ok(())
    }

    pub async fn set_auth_token(&self, token: Option<&str>) -> Result<(), AuthError> {
        self.store()?.set_auth_token(token).await
    }

    pub fn logout(&self) -> Result<JoinHandle<Result<(), AuthError>>, AuthError> {
        Ok(self.store()?.logout())
    }

    pub fn absorb_redirect_url(&self, url: &str) -> Result<Option<String>, AuthError> {
        Ok(self.store()?.absorb_redirect_url(url))
    }

    pub fn get_auth_token(&self) -> Result<Option<String>, AuthError> {
        Ok(self.store()?.get_auth_token())
    }

    pub fn set_api_key(&self, api_key: &str) -> Result<(), AuthError> {
        self.store()?.set_api_key(api_key);
        Ok(())
    }

    pub fn get_api_key(&self) -> Result<Option<String>, AuthError> {
        Ok(self.store()?.get_api_key())
    }

    pub fn has_permission(&self, permission: &str) -> Result<bool, AuthError> {
        Ok(self.store()?.has_permission(permission))
    }

    pub fn has_any_permission(&self, permissions: &[&str]) -> Result<bool, AuthError> {
        Ok(self.store()?.has_any_permission(permissions))
    }

    pub fn has_all_permissions(&self, permissions: &[&str]) -> Result<bool, AuthError> {
        Ok(self.store()?.has_all_permissions(permissions))
    }

    pub fn has_role(&self, slug: &str) -> Result<bool, AuthError> {
        Ok(self.store()?.has_role(slug))
    }

    pub fn logout_url(&self) -> Result<String, AuthError> {
        Ok(self.store()?.logout_url())
    }

    pub fn profile_url(&self) -> Result<String, AuthError> {
        Ok(self.store()?.profile_url())
    }
}
