//! Permission evaluation over wire-form roles.
//!
//! Pure and fail-closed: an absent role, absent details, or empty
//! permission list denies everything. Authorization decisions consume
//! only the pre-resolved `allowed` flag; the richer access-type taxonomy
//! lives in the configuration domain (see [`crate::models::access`]).

use crate::models::ResolvedRole;

/// Check whether the resolved role grants a `resource:action` permission.
pub fn has_permission(role: Option<&ResolvedRole>, permission: &str) -> bool {
    let Some(details) = role.and_then(|r| r.role_details.as_ref()) else {
        return false;
    };
    details
        .permissions
        .iter()
        .any(|p| p.allowed && p.matches(permission))
}

/// Logical OR over [`has_permission`]; short-circuits.
pub fn has_any_permission(role: Option<&ResolvedRole>, permissions: &[&str]) -> bool {
    permissions.iter().any(|p| has_permission(role, p))
}

/// Logical AND over [`has_permission`]; short-circuits.
pub fn has_all_permissions(role: Option<&ResolvedRole>, permissions: &[&str]) -> bool {
    permissions.iter().all(|p| has_permission(role, p))
}

/// Check a role slug against the resolved role, falling back to the
/// user's embedded role slug for legacy flat assignments.
pub fn has_role(role: Option<&ResolvedRole>, user_role: Option<&str>, slug: &str) -> bool {
    if let Some(resolved) = role {
        if resolved.role == slug {
            return true;
        }
    }
    user_role == Some(slug)
}
