//! Access model - the dual representation of permission grants.
//!
//! Editors configure grants as access types grouped under access-group
//! associations; clients consume the collapsed wire form where each
//! permission carries a pre-resolved `allowed` flag. [`resolve_grants`]
//! is the single path between the two.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Configured strength of a permission grant.
///
/// `ReadOnly` and `Full` both grant visibility; the distinction is a hint
/// for editor surfaces and is not enforced at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessType {
    Allow,
    Deny,
    ReadOnly,
    Full,
}

impl AccessType {
    /// Whether this grant admits access on its own. `Deny` never does.
    pub fn grants_access(&self) -> bool {
        !matches!(self, AccessType::Deny)
    }
}

/// Wire-form permission served to clients: the resolution of every
/// configured grant for one resource/action pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub resource: String,
    pub action: String,
    pub allowed: bool,
}

impl Permission {
    /// Permission key in `resource:action` form.
    pub fn key(&self) -> String {
        format!("{}:{}", self.resource, self.action)
    }

    /// Check this record against a `resource:action` key.
    pub fn matches(&self, key: &str) -> bool {
        key.strip_prefix(self.resource.as_str())
            .and_then(|rest| rest.strip_prefix(':'))
            .map(|rest| rest == self.action)
            .unwrap_or(false)
    }
}

/// Editor-form grant: one access-type assignment inside an access-group
/// association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub permission_id: String,
    pub resource: String,
    pub action: String,
    pub access_type: AccessType,
}

impl PermissionGrant {
    pub fn key(&self) -> String {
        format!("{}:{}", self.resource, self.action)
    }
}

/// Named bundle of permissions for one feature module. Groups live in a
/// library independent of any role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGroup {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

/// A role's attachment to an access group, carrying its own grant list.
///
/// A disabled association denies everything beneath it regardless of the
/// individual grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGroupAssociation {
    pub group_id: String,
    pub enabled: bool,
    pub grants: Vec<PermissionGrant>,
}

#[derive(Debug)]
struct ResolutionEntry {
    resource: String,
    action: String,
    granted: bool,
    denied: bool,
}

/// Collapse editor-form grants into wire-form permissions.
///
/// Disabled associations contribute nothing. Within the enabled set, a
/// key resolves to `allowed = true` iff at least one grant admits access
/// and no grant for the same key is `Deny` - `Deny` wins even across
/// associations. Output preserves first-seen key order.
pub fn resolve_grants(associations: &[AccessGroupAssociation]) -> Vec<Permission> {
    let mut order: Vec<String> = Vec::new();
    let mut entries: HashMap<String, ResolutionEntry> = HashMap::new();

    for association in associations.iter().filter(|a| a.enabled) {
        for grant in &association.grants {
            let key = grant.key();
            let entry = entries.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                ResolutionEntry {
                    resource: grant.resource.clone(),
                    action: grant.action.clone(),
                    granted: false,
                    denied: false,
                }
            });
            if grant.access_type == AccessType::Deny {
                entry.denied = true;
            } else {
                entry.granted = true;
            }
        }
    }

    order
        .iter()
        .map(|key| {
            let entry = &entries[key];
            Permission {
                resource: entry.resource.clone(),
                action: entry.action.clone(),
                allowed: entry.granted && !entry.denied,
            }
        })
        .collect()
}
