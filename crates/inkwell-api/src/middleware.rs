use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use tracing::warn;

use crate::auth::AppState;
use crate::error::ApiError;

/// The authenticated caller, taken from `Authorization: Bearer <token>`.
/// A missing, malformed, expired or forged token rejects the request with 401
/// before the handler body runs.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub u32);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::Unauthorized)?;

        let user_id = state.tokens.validate(bearer.token()).map_err(|e| {
            warn!("Rejected bearer token: {}", e);
            ApiError::Unauthorized
        })?;

        Ok(AuthUser(user_id))
    }
}
