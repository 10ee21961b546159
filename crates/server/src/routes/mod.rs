pub mod auth;
pub mod comments;
pub mod issues;
pub mod projects;
pub mod users;

use crate::error::AppError;

// PUT is reserved for full replacement, which no resource supports; callers
// must PATCH.
pub async fn full_replace_rejected() -> AppError {
    AppError::MethodNotAllowed
}
