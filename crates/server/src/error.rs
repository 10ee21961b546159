use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForbiddenReason {
    NotAContributor,
    NotAnAuthor,
    AuthorRequired,
    CannotRemoveAuthor,
    SelfOnly,
}

impl ForbiddenReason {
    pub fn code(self) -> &'static str {
        match self {
            Self::NotAContributor => "not_a_contributor",
            Self::NotAnAuthor => "not_an_author",
            Self::AuthorRequired => "author_required",
            Self::CannotRemoveAuthor => "cannot_remove_author",
            Self::SelfOnly => "self_only",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::NotAContributor => "You are not a contributor of this project",
            Self::NotAnAuthor => "Only the author can modify or delete this resource",
            Self::AuthorRequired => "Only the project author can manage contributors",
            Self::CannotRemoveAuthor => "The project author cannot be removed from contributors",
            Self::SelfOnly => "You can only access your own account",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{}", .0.message())]
    Forbidden(ForbiddenReason),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Authentication required")]
    Unauthorized,
    #[error("Full-replace updates are not allowed, use PATCH")]
    MethodNotAllowed,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Forbidden(reason) => (StatusCode::FORBIDDEN, reason.code()),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed"),
            AppError::Database(err) => {
                tracing::error!("database error: {err}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
            AppError::Internal(err) => {
                tracing::error!("internal error: {err}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let error = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorBody { error, code })).into_response()
    }
}

// Keeps the exactly-one-winner semantics of unique constraints: the losing
// insert surfaces as the given domain error instead of a 500.
pub fn unique_violation(err: sqlx::Error, conflict: AppError) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => conflict,
        _ => AppError::Database(err),
    }
}
