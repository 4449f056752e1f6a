//! Durable key-value storage for credentials and identity snapshots.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Storage keys for persisted credential and identity data.
pub mod keys {
    /// Bearer token for the current session.
    pub const AUTH_TOKEN: &str = "auth_token";
    /// Tenant scoping key.
    pub const API_KEY: &str = "auth_api_key";
    /// Cached user snapshot (JSON).
    pub const USER: &str = "auth_user";
    /// Cached organization snapshot (JSON).
    pub const ORGANIZATION: &str = "auth_organization";
    /// Cached resolved-role snapshot (JSON).
    pub const ROLE: &str = "auth_role";
}

/// String key-value storage for credentials and cached identity
/// snapshots.
///
/// Implementations are infallible from the caller's perspective: an
/// unavailable backend degrades to a no-op rather than erroring.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Inert storage for non-interactive contexts: reads miss, writes vanish.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStorage;

impl KeyValueStorage for NullStorage {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _value: &str) {}

    fn remove(&self, _key: &str) {}
}
