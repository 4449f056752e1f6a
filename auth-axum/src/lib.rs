//! Bearer-token authentication middleware for axum services sitting
//! behind the identity service.
//!
//! The middleware shares the introspection response shape with the
//! client SDK, so the same HTTP client doubles as the validator.

use std::sync::Arc;

use auth_client::services::error::AuthError;
use auth_client::services::identity::{HttpIdentityClient, IdentityApi, TokenValidation};
use auth_core::models::User;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::IntoResponse,
    Json,
};
use serde::Serialize;

/// Validates bearer tokens for incoming requests.
#[axum::async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(&self, token: &str) -> Result<TokenValidation, AuthError>;
}

#[axum::async_trait]
impl TokenValidator for HttpIdentityClient {
    async fn validate(&self, token: &str) -> Result<TokenValidation, AuthError> {
        self.validate_token(token).await
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn unauthorized(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

/// Middleware to require a valid bearer token.
///
/// The validated user is stored in request extensions for handlers to
/// pick up via [`AuthUser`].
pub async fn auth_middleware(
    State(validator): State<Arc<dyn TokenValidator>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let token = match token {
        Some(token) => token,
        None => {
            return Err(unauthorized("Missing or invalid Authorization header"));
        }
    };

    let validation = validator.validate(token).await.map_err(|err| {
        tracing::error!(error = %err, "Token introspection failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Internal server error".to_string(),
            }),
        )
    })?;

    if !validation.valid {
        let message = validation
            .error
            .unwrap_or_else(|| "Invalid or expired token".to_string());
        return Err((StatusCode::UNAUTHORIZED, Json(ErrorResponse { error: message })));
    }

    let user = match validation.user {
        Some(user) => user,
        None => {
            return Err(unauthorized("Invalid or expired token"));
        }
    };
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Extractor for the validated user in downstream handlers.
pub struct AuthUser(pub User);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<User>().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Auth user missing from request extensions".to_string(),
            }),
        ))?;

        Ok(AuthUser(user.clone()))
    }
}
