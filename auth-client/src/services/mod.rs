//! Services layer: the error taxonomy and the typed identity-service
//! client consumed by the session store.

pub mod error;
pub mod identity;

pub use error::AuthError;
pub use identity::{
    CurrentRoleResponse, CurrentUserResponse, HttpIdentityClient, IdentityApi, TokenValidation,
    API_KEY_HEADER,
};
