//! Typed client for the remote identity service.

use async_trait::async_trait;
use auth_core::models::{Organization, ResolvedRole, RoleDetails, User};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::AuthSettings;
use crate::services::error::AuthError;

/// Header carrying the tenant scoping key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Identity payload for the current token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUserResponse {
    pub user: User,
    pub organization: Option<Organization>,
}

/// Role payload for the current token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentRoleResponse {
    pub role: String,
    pub role_details: Option<RoleDetails>,
}

impl From<CurrentRoleResponse> for ResolvedRole {
    fn from(response: CurrentRoleResponse) -> Self {
        ResolvedRole::new(response.role, response.role_details)
    }
}

/// Introspection result. The shape is shared with request-authenticating
/// middleware on the server side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenValidation {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Remote identity service operations consumed by the session store.
#[async_trait]
pub trait IdentityApi: Send + Sync {
    async fn fetch_current_user(&self, token: &str) -> Result<CurrentUserResponse, AuthError>;

    async fn fetch_current_role(&self, token: &str) -> Result<CurrentRoleResponse, AuthError>;

    /// Best-effort logout notification; callers are free to drop the
    /// result.
    async fn notify_logout(&self, token: &str) -> Result<(), AuthError>;

    async fn validate_token(&self, token: &str) -> Result<TokenValidation, AuthError>;
}

/// HTTP implementation of [`IdentityApi`].
///
/// Every call carries the bearer token, the tenant API key header, and
/// any extra headers from the settings. Timeout and retry policy belong
/// to the transport configuration, not to this client.
pub struct HttpIdentityClient {
    client: Client,
    base_url: String,
    api_key: String,
    headers: HeaderMap,
}

impl HttpIdentityClient {
    pub fn new(settings: &AuthSettings) -> Result<Self, AuthError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &settings.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                AuthError::Configuration(format!("Invalid header name {:?}: {}", name, e))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| {
                AuthError::Configuration(format!("Invalid value for header {:?}: {}", name, e))
            })?;
            headers.insert(header_name, header_value);
        }

        Ok(Self {
            client: Client::new(),
            base_url: settings.api_auth_base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.expose_secret().clone(),
            headers,
        })
    }

    async fn get(&self, path: &str, token: &str) -> Result<Response, AuthError> {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .get(&url)
            .headers(self.headers.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send GET request to {}: {}", url, e);
                AuthError::Transport(e.to_string())
            })
    }

    async fn post(
        &self,
        path: &str,
        token: &str,
        body: serde_json::Value,
    ) -> Result<Response, AuthError> {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .post(&url)
            .headers(self.headers.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send POST request to {}: {}", url, e);
                AuthError::Transport(e.to_string())
            })
    }

    /// Map a non-success response onto the error taxonomy. The response
    /// message is preserved when the body carries one.
    async fn error_for(response: Response) -> AuthError {
        let status = response.status();
        let message = response.json::<ErrorBody>().await.map(|b| b.error).ok();
        match status {
            StatusCode::UNAUTHORIZED => AuthError::Authentication(
                message.unwrap_or_else(|| "Invalid or expired token".to_string()),
            ),
            StatusCode::FORBIDDEN => AuthError::Authorization(
                message.unwrap_or_else(|| "Invalid tenant API key".to_string()),
            ),
            _ => AuthError::Api(message.unwrap_or_else(|| format!("Unexpected status {}", status))),
        }
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, AuthError> {
        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| AuthError::Api(format!("Malformed identity response: {}", e)))
    }
}

#[async_trait]
impl IdentityApi for HttpIdentityClient {
    async fn fetch_current_user(&self, token: &str) -> Result<CurrentUserResponse, AuthError> {
        let response = self.get("/users/me", token).await?;
        Self::decode(response).await
    }

    async fn fetch_current_role(&self, token: &str) -> Result<CurrentRoleResponse, AuthError> {
        let response = self.get("/users/me/role", token).await?;
        Self::decode(response).await
    }

    async fn notify_logout(&self, token: &str) -> Result<(), AuthError> {
        let response = self
            .post("/auth/logout", token, serde_json::json!({ "token": token }))
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }
        Ok(())
    }

    async fn validate_token(&self, token: &str) -> Result<TokenValidation, AuthError> {
        let response = self
            .post("/auth/introspect", token, serde_json::json!({ "token": token }))
            .await?;
        Self::decode(response).await
    }
}
