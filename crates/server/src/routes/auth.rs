use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, routing::post, Json, Router};
use chrono::{Datelike, NaiveDate, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{unique_violation, AppError, Result},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub birth_date: NaiveDate,
    pub can_be_contacted: Option<bool>,
    pub can_data_be_shared: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub can_be_contacted: bool,
    pub can_data_be_shared: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub username: String,
    pub exp: usize,
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|_| AppError::Internal("Failed to hash password".to_string()))
}

fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn create_token(user_id: &str, username: &str, secret: &str) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(chrono::Duration::days(7))
        .expect("valid timestamp")
        .timestamp() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AppError::Internal("Failed to create token".to_string()))
}

// Consent rules require account holders to be at least 15 years old.
pub fn validate_birth_date(birth_date: NaiveDate) -> Result<()> {
    let today = Utc::now().date_naive();
    let mut age = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    if age < 15 {
        return Err(AppError::Validation(
            "You must be at least 15 years old to create an account".to_string(),
        ));
    }
    Ok(())
}

async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>> {
    if body.username.trim().is_empty() {
        return Err(AppError::Validation("Username is required".to_string()));
    }
    if body.password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    validate_birth_date(body.birth_date)?;

    let password_hash = hash_password(&body.password)?;

    let user_id = Uuid::new_v4().to_string();
    let can_be_contacted = body.can_be_contacted.unwrap_or(true);
    let can_data_be_shared = body.can_data_be_shared.unwrap_or(true);

    sqlx::query(
        "INSERT INTO users (id, username, password_hash, birth_date, can_be_contacted, can_data_be_shared, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&user_id)
    .bind(&body.username)
    .bind(&password_hash)
    .bind(body.birth_date)
    .bind(can_be_contacted)
    .bind(can_data_be_shared)
    .bind(Utc::now())
    .execute(&state.db.pool)
    .await
    .map_err(|e| {
        unique_violation(
            e,
            AppError::Validation("Username is already taken".to_string()),
        )
    })?;

    let token = create_token(&user_id, &body.username, &state.config.jwt_secret)?;

    Ok(Json(AuthResponse {
        token,
        user: UserResponse {
            id: user_id,
            username: body.username,
            can_be_contacted,
            can_data_be_shared,
        },
    }))
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let user = sqlx::query_as::<_, (String, String, String, bool, bool)>(
        "SELECT id, username, password_hash, can_be_contacted, can_data_be_shared FROM users WHERE username = ?",
    )
    .bind(&body.username)
    .fetch_optional(&state.db.pool)
    .await?
    .ok_or(AppError::Unauthorized)?;

    let (user_id, username, password_hash, can_be_contacted, can_data_be_shared) = user;

    if !verify_password(&body.password, &password_hash)? {
        return Err(AppError::Unauthorized);
    }

    let token = create_token(&user_id, &username, &state.config.jwt_secret)?;

    Ok(Json(AuthResponse {
        token,
        user: UserResponse {
            id: user_id,
            username,
            can_be_contacted,
            can_data_be_shared,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_users_younger_than_fifteen() {
        let today = Utc::now().date_naive();
        let too_young = today - chrono::Duration::days(14 * 365);
        assert!(validate_birth_date(too_young).is_err());

        let old_enough = today - chrono::Duration::days(20 * 366);
        assert!(validate_birth_date(old_enough).is_ok());
    }

    #[test]
    fn password_hashes_verify_and_do_not_repeat() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
        assert_ne!(hash, hash_password("correct horse").unwrap());
    }
}
