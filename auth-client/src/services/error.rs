use thiserror::Error;

/// Errors surfaced by the client SDK.
///
/// Credential absence is not represented here: an anonymous session is a
/// legitimate state, not a failure.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// Token rejected by the identity service.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Tenant API key rejected by the identity service.
    #[error("Authorization failed: {0}")]
    Authorization(String),

    /// Identity service answered with a non-auth failure.
    #[error("Identity service error: {0}")]
    Api(String),

    /// The identity service could not be reached.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Programmer error: invalid settings or a misused handle.
    #[error("Configuration error: {0}")]
    Configuration(String),
}
