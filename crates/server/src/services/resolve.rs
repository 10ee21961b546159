use sqlx::SqlitePool;

use crate::{
    db::models::Project,
    error::{AppError, Result},
};

/// A reference to any resource the authorization layer can be asked about:
/// an existing object by id, or a pending creation identified by the id of
/// its parent.
#[derive(Debug, Clone, Copy)]
pub enum ResourceRef<'a> {
    Project(&'a str),
    Issue(&'a str),
    Comment(&'a str),
    IssueCreate { project_id: &'a str },
    CommentCreate { issue_id: &'a str },
}

/// Walks any resource reference up to its owning project. A missing resource
/// (or missing creation parent) is NotFound, established before any
/// permission check runs.
pub async fn resolve_project(pool: &SqlitePool, target: ResourceRef<'_>) -> Result<Project> {
    match target {
        ResourceRef::Project(id) | ResourceRef::IssueCreate { project_id: id } => {
            project_by_id(pool, id).await
        }
        ResourceRef::Issue(id) | ResourceRef::CommentCreate { issue_id: id } => {
            project_of_issue(pool, id).await
        }
        ResourceRef::Comment(id) => project_of_comment(pool, id).await,
    }
}

async fn project_by_id(pool: &SqlitePool, id: &str) -> Result<Project> {
    sqlx::query_as::<_, Project>(
        r#"
        SELECT p.id, p.title, p.description, p."type", p.author_id, p.created_at
        FROM projects p
        WHERE p.id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Project not found".to_string()))
}

async fn project_of_issue(pool: &SqlitePool, issue_id: &str) -> Result<Project> {
    sqlx::query_as::<_, Project>(
        r#"
        SELECT p.id, p.title, p.description, p."type", p.author_id, p.created_at
        FROM projects p
        JOIN issues i ON i.project_id = p.id
        WHERE i.id = ?
        "#,
    )
    .bind(issue_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Issue not found".to_string()))
}

async fn project_of_comment(pool: &SqlitePool, comment_id: &str) -> Result<Project> {
    sqlx::query_as::<_, Project>(
        r#"
        SELECT p.id, p.title, p.description, p."type", p.author_id, p.created_at
        FROM projects p
        JOIN issues i ON i.project_id = p.id
        JOIN comments c ON c.issue_id = i.id
        WHERE c.id = ?
        "#,
    )
    .bind(comment_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))
}
