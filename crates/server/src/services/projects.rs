use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    db::models::{Project, ProjectType},
    error::{unique_violation, AppError, Result},
    services::{
        access::{self, Action},
        membership,
        resolve::{self, ResourceRef},
    },
};

#[derive(Debug, Deserialize)]
pub struct CreateProject {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub project_type: Option<ProjectType>,
}

pub async fn list(pool: &SqlitePool, principal: &str) -> Result<Vec<Project>> {
    access::authorize(principal, Action::List, None, None)?;

    let projects = sqlx::query_as::<_, Project>(
        r#"
        SELECT p.id, p.title, p.description, p."type", p.author_id, p.created_at
        FROM projects p
        JOIN contributors c ON c.project_id = p.id
        WHERE c.user_id = ?
        ORDER BY p.created_at DESC
        "#,
    )
    .bind(principal)
    .fetch_all(pool)
    .await?;

    Ok(projects)
}

pub async fn create(pool: &SqlitePool, principal: &str, input: CreateProject) -> Result<Project> {
    access::authorize(principal, Action::CreateProject, None, None)?;

    if input.title.trim().is_empty() {
        return Err(AppError::Validation("Project title is required".to_string()));
    }

    let project = Project {
        id: Uuid::new_v4().to_string(),
        title: input.title,
        description: input.description,
        project_type: input.project_type,
        author_id: principal.to_string(),
        created_at: Utc::now(),
    };

    // The author joins the contributor table in the same transaction, so a
    // project is never visible without its author as a member.
    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"INSERT INTO projects (id, title, description, "type", author_id, created_at) VALUES (?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&project.id)
    .bind(&project.title)
    .bind(&project.description)
    .bind(project.project_type)
    .bind(&project.author_id)
    .bind(project.created_at)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        unique_violation(
            e,
            AppError::Validation("A project with this title already exists".to_string()),
        )
    })?;
    membership::insert(&mut *tx, &project.id, principal).await?;
    tx.commit().await?;

    Ok(project)
}

pub async fn get(pool: &SqlitePool, principal: &str, id: &str) -> Result<Project> {
    let project = resolve::resolve_project(pool, ResourceRef::Project(id)).await?;
    let member = membership::is_contributor(pool, id, principal).await?;
    access::authorize(principal, Action::Retrieve, Some(member), Some(&project.author_id))?;

    Ok(project)
}

pub async fn update(
    pool: &SqlitePool,
    principal: &str,
    id: &str,
    patch: ProjectPatch,
) -> Result<Project> {
    let project = resolve::resolve_project(pool, ResourceRef::Project(id)).await?;
    let member = membership::is_contributor(pool, id, principal).await?;
    access::authorize(principal, Action::Update, Some(member), Some(&project.author_id))?;

    if let Some(title) = &patch.title {
        if title.trim().is_empty() {
            return Err(AppError::Validation("Project title is required".to_string()));
        }
    }

    let updated = Project {
        title: patch.title.unwrap_or(project.title),
        description: patch.description.unwrap_or(project.description),
        project_type: patch.project_type.unwrap_or(project.project_type),
        id: project.id,
        author_id: project.author_id,
        created_at: project.created_at,
    };

    sqlx::query(r#"UPDATE projects SET title = ?, description = ?, "type" = ? WHERE id = ?"#)
        .bind(&updated.title)
        .bind(&updated.description)
        .bind(updated.project_type)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| {
            unique_violation(
                e,
                AppError::Validation("A project with this title already exists".to_string()),
            )
        })?;

    Ok(updated)
}

pub async fn delete(pool: &SqlitePool, principal: &str, id: &str) -> Result<()> {
    let project = resolve::resolve_project(pool, ResourceRef::Project(id)).await?;
    let member = membership::is_contributor(pool, id, principal).await?;
    access::authorize(principal, Action::Delete, Some(member), Some(&project.author_id))?;

    // Issues, comments and contributor rows go with the project.
    sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}
