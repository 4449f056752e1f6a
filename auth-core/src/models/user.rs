//! User model - identity records served by the identity service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the account was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityProvider {
    Password,
    Google,
    Magic,
}

impl IdentityProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityProvider::Password => "password",
            IdentityProvider::Google => "google",
            IdentityProvider::Magic => "magic",
        }
    }
}

/// User identity record, tenant-scoped by the API key the caller used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Flat role slug assigned directly to the user. Kept alongside the
    /// resolved role document for legacy assignments.
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    pub provider: IdentityProvider,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Display name assembled from the name fields, falling back to the
    /// email address.
    pub fn full_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.to_string(),
            (None, Some(last)) => last.to_string(),
            (None, None) => self.email.clone(),
        }
    }
}
