use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::{info, warn};

use inkwell_db::models::{NewPost, PostPatch};
use inkwell_types::api::{CreatePostRequest, UpdatePostRequest};
use inkwell_types::models::Post;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::run_blocking;
use crate::users::ENTITY;
use crate::validation::Validate;

const LIST_LIMIT: u32 = 100;

/// A body without `author_id` deserializes it as 0 and fails the ownership
/// check with 401 before validation runs.
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    WithRejection(Json(mut req), _): WithRejection<Json<CreatePostRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    if caller != req.author_id {
        warn!("User {} attempted to post as user {}", caller, req.author_id);
        return Err(ApiError::Unauthorized);
    }

    req.prepare();
    req.validate()?;

    let db = state.clone();
    let row = run_blocking(move || {
        Ok(db.db.create_post(&NewPost {
            title: &req.title,
            content: &req.content,
            author_id: req.author_id,
        })?)
    })
    .await?;

    info!("User {} created post {}", caller, row.id);
    let location = format!("/posts/{}", row.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(Post::from(row)),
    ))
}

pub async fn list_posts(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = run_blocking(move || Ok(state.db.find_all_posts(LIST_LIMIT)?)).await?;
    let posts: Vec<Post> = rows.into_iter().map(Post::from).collect();
    Ok(Json(posts))
}

pub async fn get_post(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<u64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let row = run_blocking(move || {
        state
            .db
            .find_post_by_id(id)
            .map_err(ApiError::missing("Post not found"))
    })
    .await?;

    Ok(Json(Post::from(row)))
}

/// Ownership is checked against the stored post before the body is read.
pub async fn update_post(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    WithRejection(Path(id), _): WithRejection<Path<u64>, ApiError>,
    payload: Result<Json<UpdatePostRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_author(&state, id, caller).await?;

    let Json(mut req) = payload?;
    if req.author_id.is_some_and(|author| author != caller) {
        warn!("User {} attempted to reassign post {}", caller, id);
        return Err(ApiError::Unauthorized);
    }

    req.prepare();
    req.validate()?;

    let db = state.clone();
    let row = run_blocking(move || {
        db.db
            .update_post(
                id,
                &PostPatch {
                    title: &req.title,
                    content: &req.content,
                },
            )
            .map_err(ApiError::missing("Post not found"))
    })
    .await?;

    Ok(Json(Post::from(row)))
}

pub async fn delete_post(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    WithRejection(Path(id), _): WithRejection<Path<u64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_author(&state, id, caller).await?;

    let removed = run_blocking(move || Ok(state.db.delete_post(id, caller)?)).await?;
    if removed == 0 {
        // Deleted or reassigned between the ownership check and the delete.
        return Err(ApiError::NotFound("Post not found"));
    }

    info!("User {} deleted post {}", caller, id);
    Ok((StatusCode::NO_CONTENT, [(ENTITY, id.to_string())]))
}

/// 404 if the post does not exist, 401 if `caller` did not write it.
async fn ensure_author(state: &AppState, id: u64, caller: u32) -> Result<(), ApiError> {
    let db = state.clone();
    let author_id = run_blocking(move || {
        db.db
            .find_post_by_id(id)
            .map(|post| post.author_id)
            .map_err(ApiError::missing("Post not found"))
    })
    .await?;

    if author_id != caller {
        warn!("User {} is not the author of post {}", caller, id);
        return Err(ApiError::Unauthorized);
    }
    Ok(())
}
