//! Bearer token authentication
//!
//! Tokens are HS256 JWTs issued by Supabase Auth. The subject claim is the
//! user's UUID and the audience is `authenticated`.

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use minimind_types::UserId;

use crate::error::ApiError;
use crate::state::AppState;

/// Audience Supabase puts on user access tokens
pub const TOKEN_AUDIENCE: &str = "authenticated";

/// Claims we read from the access token
#[derive(Debug, Deserialize)]
struct AccessClaims {
    sub: String,
}

/// Verifies HS256 bearer tokens against the shared secret
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Create a verifier for the given shared secret
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[TOKEN_AUDIENCE]);
        validation.set_required_spec_claims(&["exp", "sub", "aud"]);
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Validate a token and return the user it was issued to
    pub fn verify(&self, token: &str) -> Result<UserId, ApiError> {
        let data = decode::<AccessClaims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!(error = ?e, "Token validation failed");
            ApiError::InvalidToken
        })?;

        UserId::parse(&data.claims.sub).map_err(|_| {
            tracing::debug!("Token subject is not a UUID");
            ApiError::InvalidToken
        })
    }
}

/// Authenticated user extracted from the bearer token
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: UserId,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let token = extract_bearer(parts)?;
        let user_id = app_state.jwt.verify(token)?;
        Ok(Self { user_id })
    }
}

/// Extract token from the Authorization header
fn extract_bearer(parts: &Parts) -> Result<&str, ApiError> {
    let header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or(ApiError::MissingToken)?;
    let value = header.to_str().map_err(|_| ApiError::InvalidToken)?;

    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::MissingToken)
}
