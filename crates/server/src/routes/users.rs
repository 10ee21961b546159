use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::{
    db::models::User,
    error::{AppError, ForbiddenReason, Result},
    middleware::auth::AuthUser,
    routes::{auth::hash_password, full_replace_rejected},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/:id",
        get(get_user)
            .patch(update_user)
            .put(full_replace_rejected)
            .delete(delete_user),
    )
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub password: Option<String>,
    pub can_be_contacted: Option<bool>,
    pub can_data_be_shared: Option<bool>,
}

// Accounts are private: every operation here is gated to the holder.
fn ensure_self(user: &AuthUser, id: &str) -> Result<()> {
    if user.id != id {
        return Err(AppError::Forbidden(ForbiddenReason::SelfOnly));
    }
    Ok(())
}

async fn fetch_user(state: &AppState, id: &str) -> Result<User> {
    sqlx::query_as::<_, User>(
        "SELECT id, username, password_hash, birth_date, can_be_contacted, can_data_be_shared, created_at FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&state.db.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

async fn get_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<User>> {
    ensure_self(&user, &id)?;
    let account = fetch_user(&state, &id).await?;
    Ok(Json(account))
}

async fn update_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<User>> {
    ensure_self(&user, &id)?;
    let account = fetch_user(&state, &id).await?;

    let password_hash = match &body.password {
        Some(password) if password.len() < 8 => {
            return Err(AppError::Validation(
                "Password must be at least 8 characters".to_string(),
            ))
        }
        Some(password) => hash_password(password)?,
        None => account.password_hash.clone(),
    };
    let can_be_contacted = body.can_be_contacted.unwrap_or(account.can_be_contacted);
    let can_data_be_shared = body.can_data_be_shared.unwrap_or(account.can_data_be_shared);

    sqlx::query(
        "UPDATE users SET password_hash = ?, can_be_contacted = ?, can_data_be_shared = ? WHERE id = ?",
    )
    .bind(&password_hash)
    .bind(can_be_contacted)
    .bind(can_data_be_shared)
    .bind(&id)
    .execute(&state.db.pool)
    .await?;

    Ok(Json(User {
        password_hash,
        can_be_contacted,
        can_data_be_shared,
        ..account
    }))
}

async fn delete_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<()>> {
    ensure_self(&user, &id)?;
    fetch_user(&state, &id).await?;

    // Authored projects, issues and comments cascade away with the account.
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(&id)
        .execute(&state.db.pool)
        .await?;

    Ok(Json(()))
}
