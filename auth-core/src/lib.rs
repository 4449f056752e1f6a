//! auth-core: shared identity and authorization vocabulary.
//!
//! Pure data model and evaluation logic consumed by the client SDK and
//! by services sitting behind the identity service. No I/O lives here.

pub mod authz;
pub mod models;

pub use authz::{has_all_permissions, has_any_permission, has_permission, has_role};
