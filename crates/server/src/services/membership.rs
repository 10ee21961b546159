use serde::Serialize;
use sqlx::SqlitePool;

use crate::{
    db::models::Contributor,
    error::{unique_violation, AppError, ForbiddenReason, Result},
    services::{
        access::{self, Action},
        resolve::{self, ResourceRef},
    },
};

// Public profile fields only; never the password hash or birth date.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ContributorProfile {
    pub id: String,
    pub username: String,
    pub can_be_contacted: bool,
    pub can_data_be_shared: bool,
}

pub async fn is_contributor(pool: &SqlitePool, project_id: &str, user_id: &str) -> Result<bool> {
    let row = sqlx::query_as::<_, Contributor>(
        "SELECT project_id, user_id FROM contributors WHERE project_id = ? AND user_id = ?",
    )
    .bind(project_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

// The (project, user) primary key decides races between concurrent inserts:
// exactly one writer wins, the loser sees a conflict.
pub async fn insert<'e, E>(executor: E, project_id: &str, user_id: &str) -> Result<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    sqlx::query("INSERT INTO contributors (project_id, user_id) VALUES (?, ?)")
        .bind(project_id)
        .bind(user_id)
        .execute(executor)
        .await
        .map_err(|e| {
            unique_violation(
                e,
                AppError::Conflict("User is already a contributor of this project".to_string()),
            )
        })?;
    Ok(())
}

pub async fn list_contributors(
    pool: &SqlitePool,
    principal: &str,
    project_id: &str,
) -> Result<Vec<ContributorProfile>> {
    resolve::resolve_project(pool, ResourceRef::Project(project_id)).await?;
    let member = is_contributor(pool, project_id, principal).await?;
    access::authorize(principal, Action::Retrieve, Some(member), None)?;

    let contributors = sqlx::query_as::<_, ContributorProfile>(
        r#"
        SELECT u.id, u.username, u.can_be_contacted, u.can_data_be_shared
        FROM contributors c
        JOIN users u ON c.user_id = u.id
        WHERE c.project_id = ?
        ORDER BY u.username ASC
        "#,
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    Ok(contributors)
}

pub async fn add_contributor(
    pool: &SqlitePool,
    principal: &str,
    project_id: &str,
    user_id: &str,
) -> Result<()> {
    let project = resolve::resolve_project(pool, ResourceRef::Project(project_id)).await?;

    if project.author_id != principal {
        return Err(AppError::Forbidden(ForbiddenReason::AuthorRequired));
    }

    let user_exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    if user_exists == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    insert(pool, project_id, user_id).await
}

pub async fn remove_contributor(
    pool: &SqlitePool,
    principal: &str,
    project_id: &str,
    user_id: &str,
) -> Result<()> {
    let project = resolve::resolve_project(pool, ResourceRef::Project(project_id)).await?;

    if project.author_id != principal {
        return Err(AppError::Forbidden(ForbiddenReason::AuthorRequired));
    }
    if user_id == project.author_id {
        return Err(AppError::Forbidden(ForbiddenReason::CannotRemoveAuthor));
    }

    let mut tx = pool.begin().await?;

    let removed = sqlx::query("DELETE FROM contributors WHERE project_id = ? AND user_id = ?")
        .bind(project_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    if removed.rows_affected() == 0 {
        return Err(AppError::NotFound(
            "User is not a contributor of this project".to_string(),
        ));
    }

    // A removed contributor cannot stay assigned to issues in the project.
    sqlx::query("UPDATE issues SET assigned_id = NULL WHERE project_id = ? AND assigned_id = ?")
        .bind(project_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}
