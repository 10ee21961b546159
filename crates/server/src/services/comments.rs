use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    db::models::Comment,
    error::{AppError, Result},
    services::{
        access::{self, Action},
        membership,
        resolve::{self, ResourceRef},
    },
};

#[derive(Debug, Deserialize)]
pub struct CreateComment {
    pub issue: String,
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentPatch {
    pub description: Option<String>,
}

pub async fn list(pool: &SqlitePool, principal: &str, issue: Option<&str>) -> Result<Vec<Comment>> {
    match issue {
        Some(issue_id) => {
            let project = resolve::resolve_project(pool, ResourceRef::Issue(issue_id)).await?;
            let member = membership::is_contributor(pool, &project.id, principal).await?;
            access::authorize(principal, Action::List, Some(member), None)?;

            let comments = sqlx::query_as::<_, Comment>(
                r#"
                SELECT id, issue_id, author_id, description, created_at
                FROM comments
                WHERE issue_id = ?
                ORDER BY created_at ASC
                "#,
            )
            .bind(issue_id)
            .fetch_all(pool)
            .await?;
            Ok(comments)
        }
        None => {
            access::authorize(principal, Action::List, None, None)?;

            let comments = sqlx::query_as::<_, Comment>(
                r#"
                SELECT co.id, co.issue_id, co.author_id, co.description, co.created_at
                FROM comments co
                JOIN issues i ON co.issue_id = i.id
                JOIN contributors c ON c.project_id = i.project_id
                WHERE c.user_id = ?
                ORDER BY co.created_at DESC
                "#,
            )
            .bind(principal)
            .fetch_all(pool)
            .await?;
            Ok(comments)
        }
    }
}

pub async fn create(pool: &SqlitePool, principal: &str, input: CreateComment) -> Result<Comment> {
    let project = resolve::resolve_project(
        pool,
        ResourceRef::CommentCreate {
            issue_id: &input.issue,
        },
    )
    .await?;
    let member = membership::is_contributor(pool, &project.id, principal).await?;
    access::authorize(principal, Action::Create, Some(member), None)?;

    if input.description.trim().is_empty() {
        return Err(AppError::Validation(
            "Comment description is required".to_string(),
        ));
    }

    let comment = Comment {
        id: Uuid::new_v4().to_string(),
        issue_id: input.issue,
        author_id: principal.to_string(),
        description: input.description,
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO comments (id, issue_id, author_id, description, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&comment.id)
    .bind(&comment.issue_id)
    .bind(&comment.author_id)
    .bind(&comment.description)
    .bind(comment.created_at)
    .execute(pool)
    .await?;

    Ok(comment)
}

pub async fn get(pool: &SqlitePool, principal: &str, id: &str) -> Result<Comment> {
    let project = resolve::resolve_project(pool, ResourceRef::Comment(id)).await?;
    let comment = fetch(pool, id).await?;
    let member = membership::is_contributor(pool, &project.id, principal).await?;
    access::authorize(principal, Action::Retrieve, Some(member), Some(&comment.author_id))?;

    Ok(comment)
}

pub async fn update(
    pool: &SqlitePool,
    principal: &str,
    id: &str,
    patch: CommentPatch,
) -> Result<Comment> {
    let project = resolve::resolve_project(pool, ResourceRef::Comment(id)).await?;
    let comment = fetch(pool, id).await?;
    let member = membership::is_contributor(pool, &project.id, principal).await?;
    access::authorize(principal, Action::Update, Some(member), Some(&comment.author_id))?;

    if let Some(description) = &patch.description {
        if description.trim().is_empty() {
            return Err(AppError::Validation(
                "Comment description is required".to_string(),
            ));
        }
    }

    let updated = Comment {
        description: patch.description.unwrap_or(comment.description),
        id: comment.id,
        issue_id: comment.issue_id,
        author_id: comment.author_id,
        created_at: comment.created_at,
    };

    sqlx::query("UPDATE comments SET description = ? WHERE id = ?")
        .bind(&updated.description)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(updated)
}

pub async fn delete(pool: &SqlitePool, principal: &str, id: &str) -> Result<()> {
    let project = resolve::resolve_project(pool, ResourceRef::Comment(id)).await?;
    let comment = fetch(pool, id).await?;
    let member = membership::is_contributor(pool, &project.id, principal).await?;
    access::authorize(principal, Action::Delete, Some(member), Some(&comment.author_id))?;

    sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

async fn fetch(pool: &SqlitePool, id: &str) -> Result<Comment> {
    sqlx::query_as::<_, Comment>(
        "SELECT id, issue_id, author_id, description, created_at FROM comments WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))
}
