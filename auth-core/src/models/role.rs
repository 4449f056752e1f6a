//! Role model - wire-form roles served to clients.

use serde::{Deserialize, Serialize};

use crate::models::Permission;

/// Role payload served to clients, with every grant already collapsed to
/// a wire-form permission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleDetails {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub is_system: bool,
    #[serde(default)]
    pub is_default: bool,
}

/// Resolved role cached in the session: the slug plus, when the identity
/// service can resolve it, the full wire-form details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRole {
    pub role: String,
    pub role_details: Option<RoleDetails>,
}

impl ResolvedRole {
    pub fn new(role: impl Into<String>, role_details: Option<RoleDetails>) -> Self {
        Self {
            role: role.into(),
            role_details,
        }
    }
}
