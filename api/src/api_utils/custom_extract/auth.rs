use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::{async_trait, http::StatusCode};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use abi::errors::Error;

use crate::AppState;

const BEARER: &str = "Bearer ";

/// Token claims; `sub` is the id of the acting user. Tokens are issued
/// elsewhere and only verified here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

/// The caller, taken from a verified `Authorization: Bearer <jwt>` header.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = (StatusCode, Error);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
            .and_then(|header| header.strip_prefix(BEARER))
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Error::unauthorized_with_details("missing bearer token"),
                )
            })?;

        let data = decode::<Claims>(
            token.trim(),
            &DecodingKey::from_secret(app_state.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|err| {
            (
                StatusCode::UNAUTHORIZED,
                Error::unauthorized(err, "invalid token"),
            )
        })?;

        Ok(Self(data.claims.sub))
    }
}
