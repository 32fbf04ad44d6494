use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use inkwell_db::DbError;
use inkwell_types::api::ErrorBody;

use crate::validation::ValidationError;

/// Every failure a handler can produce. Converted once, at the handler
/// boundary, into a status code and `{"error": "..."}` body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    MalformedInput(String),

    #[error("{0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("Internal Server Error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MalformedInput(_) | ApiError::Validation(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Map a store error for a lookup of a single `entity` row.
    pub fn missing(entity: &'static str) -> impl FnOnce(DbError) -> ApiError {
        move |err| match err {
            DbError::NotFound => ApiError::NotFound(entity),
            other => other.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Turn the column named in a unique-constraint failure into a message.
pub fn conflict_message(columns: &str) -> &'static str {
    if columns.contains("nickname") {
        "Nickname Already taken"
    } else if columns.contains("email") {
        "Email already taken"
    } else if columns.contains("title") {
        "Title already taken"
    } else {
        "Incorrect Details"
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Conflict(columns) => ApiError::Conflict(conflict_message(&columns).into()),
            DbError::InvalidReference => ApiError::Validation("Incorrect Details".into()),
            DbError::NotFound => ApiError::NotFound("Record not found"),
            other => {
                error!("Database error: {}", other);
                ApiError::Internal
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedInput(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
