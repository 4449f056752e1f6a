//! Organization model - the tenant record scoped by an API key.

use serde::{Deserialize, Serialize};

/// Branding assets configured by the tenant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Branding {
    pub logo_url: Option<String>,
    pub accent_color: Option<String>,
}

/// Tenant organization record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub contact_email: Option<String>,
    #[serde(default)]
    pub branding: Branding,
}
