use std::collections::HashMap;

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use validator::Validate;

use crate::services::error::AuthError;

/// SDK settings recognized by the session store.
#[derive(Clone, Deserialize, Validate)]
pub struct AuthSettings {
    /// Identity service base URL.
    #[validate(url)]
    pub api_auth_base_url: String,
    /// Base URL of the hosted login/profile/logout pages.
    #[validate(url)]
    pub ui_auth_url: String,
    /// Tenant scoping key attached to every identity-service call.
    pub api_key: Secret<String>,
    /// Perform an identity check as soon as the store starts.
    #[serde(default = "default_auto_fetch")]
    pub auto_fetch: bool,
    /// Extra headers merged into every identity-service call.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_auto_fetch() -> bool {
    true
}

impl AuthSettings {
    /// Validate the settings. Invalid settings are a programmer error and
    /// fail construction, they never become session state.
    pub fn validated(self) -> Result<Self, AuthError> {
        if self.api_key.expose_secret().is_empty() {
            return Err(AuthError::Configuration(
                "api_key must not be empty".to_string(),
            ));
        }
        self.validate()
            .map_err(|e| AuthError::Configuration(e.to_string()))?;
        Ok(self)
    }

    /// URL of the hosted logout page.
    pub fn logout_url(&self) -> String {
        format!("{}/logout", self.ui_auth_url.trim_end_matches('/'))
    }

    /// URL of the hosted profile page.
    pub fn profile_url(&self) -> String {
        format!("{}/profile", self.ui_auth_url.trim_end_matches('/'))
    }
}

/// Programmatic construction path for [`AuthSettings`].
#[derive(Default)]
pub struct AuthSettingsBuilder {
    api_auth_base_url: Option<String>,
    ui_auth_url: Option<String>,
    api_key: Option<String>,
    auto_fetch: Option<bool>,
    headers: HashMap<String, String>,
}

impl AuthSettingsBuilder {
    pub fn api_auth_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_auth_base_url = Some(url.into());
        self
    }

    pub fn ui_auth_url(mut self, url: impl Into<String>) -> Self {
        self.ui_auth_url = Some(url.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn auto_fetch(mut self, auto_fetch: bool) -> Self {
        self.auto_fetch = Some(auto_fetch);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn build(self) -> Result<AuthSettings, AuthError> {
        let api_auth_base_url = self.api_auth_base_url.ok_or_else(|| {
            AuthError::Configuration("api_auth_base_url is required".to_string())
        })?;
        let ui_auth_url = self
            .ui_auth_url
            .ok_or_else(|| AuthError::Configuration("ui_auth_url is required".to_string()))?;
        let api_key = self
            .api_key
            .ok_or_else(|| AuthError::Configuration("api_key is required".to_string()))?;

        AuthSettings {
            api_auth_base_url,
            ui_auth_url,
            api_key: Secret::new(api_key),
            auto_fetch: self.auto_fetch.unwrap_or(true),
            headers: self.headers,
        }
        .validated()
    }
}

/// Load settings from `config/base.yaml` plus `APP_`-prefixed environment
/// overrides.
pub fn get_configuration() -> Result<AuthSettings, AuthError> {
    dotenvy::dotenv().ok();

    let base_path = std::env::current_dir()
        .map_err(|e| AuthError::Configuration(format!("Failed to determine current directory: {}", e)))?;
    let configuration_directory = base_path.join("config");

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()
        .map_err(|e| AuthError::Configuration(e.to_string()))?;

    settings
        .try_deserialize::<AuthSettings>()
        .map_err(|e| AuthError::Configuration(e.to_string()))?
        .validated()
}
