//! The authenticated-session lifecycle.

mod store;
mod url;

pub use store::{AuthCallbacks, AuthSessionStore, Session};
pub use url::extract_token_param;
