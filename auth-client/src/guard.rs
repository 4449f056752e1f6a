//! Declarative gating over session snapshots.
//!
//! Guards are pure render-time branching: no session mutation, no side
//! effects, and loading always wins over the predicate.

use auth_core::authz;

use crate::session::Session;

/// Predicate a guard gates on.
#[derive(Debug, Clone)]
pub enum GuardRule {
    /// Any authenticated session.
    Authenticated,
    /// Session whose role matches the slug (resolved role first, then
    /// the user's embedded role slug).
    Role(String),
    /// Session granted a `resource:action` permission.
    Permission(String),
    /// Session granted at least one of the permissions.
    AnyPermission(Vec<String>),
    /// Session granted all of the permissions.
    AllPermissions(Vec<String>),
}

/// Render-time branch selected by a guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Session is still loading; show the loading placeholder.
    Loading,
    /// Predicate failed; show the denied placeholder.
    Denied,
    /// Predicate passed; render the children.
    Allowed,
}

impl GuardRule {
    /// Evaluate against a session snapshot.
    pub fn evaluate(&self, session: &Session) -> GuardOutcome {
        if session.is_loading {
            return GuardOutcome::Loading;
        }

        let role = session.role.as_ref();
        let allowed = match self {
            GuardRule::Authenticated => session.is_authenticated,
            GuardRule::Role(slug) => authz::has_role(
                role,
                session.user.as_ref().and_then(|user| user.role.as_deref()),
                slug,
            ),
            GuardRule::Permission(permission) => authz::has_permission(role, permission),
            GuardRule::AnyPermission(permissions) => permissions
                .iter()
                .any(|permission| authz::has_permission(role, permission)),
            GuardRule::AllPermissions(permissions) => permissions
                .iter()
                .all(|permission| authz::has_permission(role, permission)),
        };

        if allowed {
            GuardOutcome::Allowed
        } else {
            GuardOutcome::Denied
        }
    }
}

/// Placeholder composition: one value per branch, selected purely from
/// the session snapshot.
#[derive(Debug, Clone)]
pub struct Guard<T> {
    pub loading: T,
    pub denied: T,
    pub allowed: T,
}

impl<T> Guard<T> {
    /// Select the branch for a session under a rule.
    pub fn select(&self, rule: &GuardRule, session: &Session) -> &T {
        match rule.evaluate(session) {
            GuardOutcome::Loading => &self.loading,
            GuardOutcome::Denied => &self.denied,
            GuardOutcome::Allowed => &self.allowed,
        }
    }
}
