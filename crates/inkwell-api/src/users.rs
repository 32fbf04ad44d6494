use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderName, StatusCode, header},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::{info, warn};

use inkwell_db::models::{NewUser, UserPatch};
use inkwell_types::api::{CreateUserRequest, UpdateUserRequest};
use inkwell_types::models::User;

use crate::auth::{AppState, hash_on_pool};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::run_blocking;
use crate::validation::Validate;

const LIST_LIMIT: u32 = 100;

pub(crate) const ENTITY: HeaderName = HeaderName::from_static("entity");

pub async fn create_user(
    State(state): State<AppState>,
    WithRejection(Json(mut req), _): WithRejection<Json<CreateUserRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    req.prepare();
    req.validate()?;

    let password_hash = hash_on_pool(req.password).await?;

    let db = state.clone();
    let row = run_blocking(move || {
        Ok(db.db.create_user(&NewUser {
            nickname: &req.nickname,
            email: &req.email,
            password_hash: &password_hash,
        })?)
    })
    .await?;

    info!("Created user {} ({})", row.id, row.nickname);
    let location = format!("/users/{}", row.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(User::from(row)),
    ))
}

pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = run_blocking(move || Ok(state.db.find_all_users(LIST_LIMIT)?)).await?;
    let users: Vec<User> = rows.into_iter().map(User::from).collect();
    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<u32>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let row = run_blocking(move || {
        state
            .db
            .find_user_by_id(id)
            .map_err(ApiError::missing("User not found"))
    })
    .await?;

    Ok(Json(User::from(row)))
}

pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    WithRejection(Path(id), _): WithRejection<Path<u32>, ApiError>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    if caller != id {
        warn!("User {} attempted to update user {}", caller, id);
        return Err(ApiError::Unauthorized);
    }

    let Json(mut req) = payload?;
    req.prepare();
    req.validate()?;

    let password_hash = match req.password.take() {
        Some(password) => Some(hash_on_pool(password).await?),
        None => None,
    };

    let db = state.clone();
    let row = run_blocking(move || {
        db.db
            .update_user(
                id,
                &UserPatch {
                    nickname: req.nickname.as_deref(),
                    email: req.email.as_deref(),
                    password_hash: password_hash.as_deref(),
                },
            )
            .map_err(ApiError::missing("User not found"))
    })
    .await?;

    Ok(Json(User::from(row)))
}

/// Users may only delete their own account. Deleting an account that is
/// already gone answers 404 rather than a second 204.
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    WithRejection(Path(id), _): WithRejection<Path<u32>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    if caller != id {
        warn!("User {} attempted to delete user {}", caller, id);
        return Err(ApiError::Unauthorized);
    }

    let removed = run_blocking(move || Ok(state.db.delete_user(id)?)).await?;
    if removed == 0 {
        return Err(ApiError::NotFound("User not found"));
    }

    info!("Deleted user {}", id);
    Ok((StatusCode::NO_CONTENT, [(ENTITY, id.to_string())]))
}
