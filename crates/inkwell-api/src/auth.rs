use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use axum_extra::extract::WithRejection;
use tracing::{error, info};

use inkwell_auth::{PasswordError, TokenService, hash_password, verify_password};
use inkwell_db::Database;
use inkwell_types::api::{LoginRequest, LoginResponse};

use crate::error::ApiError;
use crate::run_blocking;
use crate::validation::Validate;

pub type AppState = Arc<AppStateInner>;

/// Everything a request handler needs. Built once in `main`.
pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenService,
}

impl AppStateInner {
    pub fn new(db: Database, tokens: TokenService) -> AppState {
        Arc::new(Self { db, tokens })
    }
}

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(mut req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    req.prepare();
    req.validate()?;

    let db = state.clone();
    let user_id = run_blocking(move || {
        let user = db
            .db
            .find_user_by_email(&req.email)?
            .ok_or_else(|| ApiError::Validation("Incorrect Details".into()))?;

        verify_password(&user.password, &req.password).map_err(|e| match e {
            PasswordError::Mismatch => ApiError::Validation("Incorrect Password".into()),
            other => {
                error!("Password check failed for user {}: {}", user.id, other);
                ApiError::Internal
            }
        })?;

        Ok(user.id)
    })
    .await?;

    let token = issue_token(&state.tokens, user_id)?;
    info!("User {} logged in", user_id);

    Ok(Json(LoginResponse { user_id, token }))
}

pub(crate) fn issue_token(tokens: &TokenService, user_id: u32) -> Result<String, ApiError> {
    tokens.issue(user_id).map_err(|e| {
        error!("Token signing failed: {}", e);
        ApiError::Internal
    })
}

/// Hash on the blocking pool.
pub(crate) async fn hash_on_pool(password: String) -> Result<String, ApiError> {
    run_blocking(move || {
        hash_password(&password).map_err(|e| {
            error!("Password hashing failed: {}", e);
            ApiError::Internal
        })
    })
    .await
}
