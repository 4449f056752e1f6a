pub mod access;
pub mod organization;
pub mod role;
pub mod user;

pub use access::{
    resolve_grants, AccessGroup, AccessGroupAssociation, AccessType, Permission, PermissionGrant,
};
pub use organization::{Branding, Organization};
pub use role::{ResolvedRole, RoleDetails};
pub use user::{IdentityProvider, User};
