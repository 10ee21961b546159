use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    db::models::{Issue, IssueNature, IssuePriority, IssueStatus},
    error::{unique_violation, AppError, Result},
    services::{
        access::{self, Action},
        membership,
        resolve::{self, ResourceRef},
    },
};

#[derive(Debug, Deserialize)]
pub struct CreateIssue {
    pub project: String,
    pub title: String,
    pub description: String,
    pub nature: IssueNature,
    pub status: Option<IssueStatus>,
    pub priority: Option<IssuePriority>,
    pub assigned: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IssuePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<IssueStatus>,
    pub priority: Option<IssuePriority>,
    pub nature: Option<IssueNature>,
    pub assigned: Option<String>,
}

pub async fn list(pool: &SqlitePool, principal: &str, project: Option<&str>) -> Result<Vec<Issue>> {
    match project {
        Some(project_id) => {
            resolve::resolve_project(pool, ResourceRef::Project(project_id)).await?;
            let member = membership::is_contributor(pool, project_id, principal).await?;
            access::authorize(principal, Action::List, Some(member), None)?;

            let issues = sqlx::query_as::<_, Issue>(
                r#"
                SELECT id, project_id, title, description, status, priority, nature, author_id, assigned_id, created_at
                FROM issues
                WHERE project_id = ?
                ORDER BY created_at DESC
                "#,
            )
            .bind(project_id)
            .fetch_all(pool)
            .await?;
            Ok(issues)
        }
        None => {
            access::authorize(principal, Action::List, None, None)?;

            let issues = sqlx::query_as::<_, Issue>(
                r#"
                SELECT i.id, i.project_id, i.title, i.description, i.status, i.priority, i.nature, i.author_id, i.assigned_id, i.created_at
                FROM issues i
                JOIN contributors c ON c.project_id = i.project_id
                WHERE c.user_id = ?
                ORDER BY i.created_at DESC
                "#,
            )
            .bind(principal)
            .fetch_all(pool)
            .await?;
            Ok(issues)
        }
    }
}

pub async fn create(pool: &SqlitePool, principal: &str, input: CreateIssue) -> Result<Issue> {
    let project = resolve::resolve_project(
        pool,
        ResourceRef::IssueCreate {
            project_id: &input.project,
        },
    )
    .await?;
    let member = membership::is_contributor(pool, &project.id, principal).await?;
    access::authorize(principal, Action::Create, Some(member), None)?;

    if input.title.trim().is_empty() {
        return Err(AppError::Validation("Issue title is required".to_string()));
    }
    if let Some(assigned) = &input.assigned {
        ensure_assignable(pool, &project.id, assigned).await?;
    }

    let issue = Issue {
        id: Uuid::new_v4().to_string(),
        project_id: project.id,
        title: input.title,
        description: input.description,
        status: input.status.unwrap_or_default(),
        priority: input.priority.unwrap_or_default(),
        nature: input.nature,
        author_id: principal.to_string(),
        assigned_id: input.assigned,
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO issues (id, project_id, title, description, status, priority, nature, author_id, assigned_id, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&issue.id)
    .bind(&issue.project_id)
    .bind(&issue.title)
    .bind(&issue.description)
    .bind(issue.status)
    .bind(issue.priority)
    .bind(issue.nature)
    .bind(&issue.author_id)
    .bind(&issue.assigned_id)
    .bind(issue.created_at)
    .execute(pool)
    .await
    .map_err(|e| {
        unique_violation(
            e,
            AppError::Validation(
                "An issue with this title already exists in this project".to_string(),
            ),
        )
    })?;

    Ok(issue)
}

pub async fn get(pool: &SqlitePool, principal: &str, id: &str) -> Result<Issue> {
    let project = resolve::resolve_project(pool, ResourceRef::Issue(id)).await?;
    let issue = fetch(pool, id).await?;
    let member = membership::is_contributor(pool, &project.id, principal).await?;
    access::authorize(principal, Action::Retrieve, Some(member), Some(&issue.author_id))?;

    Ok(issue)
}

pub async fn update(
    pool: &SqlitePool,
    principal: &str,
    id: &str,
    patch: IssuePatch,
) -> Result<Issue> {
    let project = resolve::resolve_project(pool, ResourceRef::Issue(id)).await?;
    let issue = fetch(pool, id).await?;
    let member = membership::is_contributor(pool, &project.id, principal).await?;
    access::authorize(principal, Action::Update, Some(member), Some(&issue.author_id))?;

    if let Some(title) = &patch.title {
        if title.trim().is_empty() {
            return Err(AppError::Validation("Issue title is required".to_string()));
        }
    }
    if let Some(assigned) = &patch.assigned {
        ensure_assignable(pool, &project.id, assigned).await?;
    }

    let updated = Issue {
        title: patch.title.unwrap_or(issue.title),
        description: patch.description.unwrap_or(issue.description),
        status: patch.status.unwrap_or(issue.status),
        priority: patch.priority.unwrap_or(issue.priority),
        nature: patch.nature.unwrap_or(issue.nature),
        assigned_id: patch.assigned.or(issue.assigned_id),
        id: issue.id,
        project_id: issue.project_id,
        author_id: issue.author_id,
        created_at: issue.created_at,
    };

    sqlx::query(
        "UPDATE issues SET title = ?, description = ?, status = ?, priority = ?, nature = ?, assigned_id = ? WHERE id = ?",
    )
    .bind(&updated.title)
    .bind(&updated.description)
    .bind(updated.status)
    .bind(updated.priority)
    .bind(updated.nature)
    .bind(&updated.assigned_id)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| {
        unique_violation(
            e,
            AppError::Validation(
                "An issue with this title already exists in this project".to_string(),
            ),
        )
    })?;

    Ok(updated)
}

pub async fn delete(pool: &SqlitePool, principal: &str, id: &str) -> Result<()> {
    let project = resolve::resolve_project(pool, ResourceRef::Issue(id)).await?;
    let issue = fetch(pool, id).await?;
    let member = membership::is_contributor(pool, &project.id, principal).await?;
    access::authorize(principal, Action::Delete, Some(member), Some(&issue.author_id))?;

    // Comments on the issue go with it.
    sqlx::query("DELETE FROM issues WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

async fn fetch(pool: &SqlitePool, id: &str) -> Result<Issue> {
    sqlx::query_as::<_, Issue>(
        "SELECT id, project_id, title, description, status, priority, nature, author_id, assigned_id, created_at FROM issues WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Issue not found".to_string()))
}

async fn ensure_assignable(pool: &SqlitePool, project_id: &str, user_id: &str) -> Result<()> {
    if !membership::is_contributor(pool, project_id, user_id).await? {
        return Err(AppError::Validation(
            "Assigned user is not a contributor of this project".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::ProjectType;
    use crate::db::test_support::{memory_pool, seed_user};
    use crate::error::ForbiddenReason;
    use crate::services::projects;

    async fn project_owned_by(pool: &SqlitePool, author: &str, title: &str) -> String {
        projects::create(
            pool,
            author,
            projects::CreateProject {
                title: title.to_string(),
                description: "A project".to_string(),
                project_type: ProjectType::BackEnd,
            },
        )
        .await
        .expect("project")
        .id
    }

    fn bug(project: &str, title: &str) -> CreateIssue {
        CreateIssue {
            project: project.to_string(),
            title: title.to_string(),
            description: "It breaks".to_string(),
            nature: IssueNature::Bug,
            status: None,
            priority: None,
            assigned: None,
        }
    }

    #[tokio::test]
    async fn creation_applies_defaults_and_authorship() {
        let pool = memory_pool().await;
        let x = seed_user(&pool, "x").await;
        let project = project_owned_by(&pool, &x, "P1").await;

        let issue = create(&pool, &x, bug(&project, "bug1")).await.unwrap();
        assert_eq!(issue.author_id, x);
        assert_eq!(issue.status, IssueStatus::ToDo);
        assert_eq!(issue.priority, IssuePriority::Medium);
        assert_eq!(issue.assigned_id, None);
    }

    #[tokio::test]
    async fn contributors_create_issues_and_outsiders_cannot() {
        let pool = memory_pool().await;
        let x = seed_user(&pool, "x").await;
        let y = seed_user(&pool, "y").await;
        let eve = seed_user(&pool, "eve").await;
        let project = project_owned_by(&pool, &x, "P1").await;
        membership::add_contributor(&pool, &x, &project, &y)
            .await
            .unwrap();

        assert!(create(&pool, &y, bug(&project, "bug1")).await.is_ok());

        let err = create(&pool, &eve, bug(&project, "bug2")).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Forbidden(ForbiddenReason::NotAContributor)
        ));
    }

    #[tokio::test]
    async fn missing_parent_project_is_not_found_before_any_permission_check() {
        let pool = memory_pool().await;
        let eve = seed_user(&pool, "eve").await;

        let err = create(&pool, &eve, bug("missing", "bug1")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn assigning_a_non_contributor_is_a_validation_error() {
        let pool = memory_pool().await;
        let x = seed_user(&pool, "x").await;
        let z = seed_user(&pool, "z").await;
        let project = project_owned_by(&pool, &x, "P1").await;

        let mut input = bug(&project, "bug1");
        input.assigned = Some(z.clone());
        let err = create(&pool, &x, input).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // Nothing was created.
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM issues")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn issue_titles_are_unique_per_project_only() {
        let pool = memory_pool().await;
        let x = seed_user(&pool, "x").await;
        let p1 = project_owned_by(&pool, &x, "P1").await;
        let p2 = project_owned_by(&pool, &x, "P2").await;

        create(&pool, &x, bug(&p1, "bug1")).await.unwrap();
        let err = create(&pool, &x, bug(&p1, "bug1")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // The same title is fine in another project.
        assert!(create(&pool, &x, bug(&p2, "bug1")).await.is_ok());
    }

    #[tokio::test]
    async fn only_the_issue_author_updates_or_deletes() {
        let pool = memory_pool().await;
        let x = seed_user(&pool, "x").await;
        let y = seed_user(&pool, "y").await;
        let project = project_owned_by(&pool, &x, "P1").await;
        membership::add_contributor(&pool, &x, &project, &y)
            .await
            .unwrap();
        let issue = create(&pool, &x, bug(&project, "bug1")).await.unwrap();

        // y can read it.
        assert!(get(&pool, &y, &issue.id).await.is_ok());

        let patch = IssuePatch {
            status: Some(IssueStatus::Finished),
            ..IssuePatch::default()
        };
        let err = update(&pool, &y, &issue.id, patch).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Forbidden(ForbiddenReason::NotAnAuthor)
        ));

        let err = delete(&pool, &y, &issue.id).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Forbidden(ForbiddenReason::NotAnAuthor)
        ));

        let patch = IssuePatch {
            status: Some(IssueStatus::Finished),
            ..IssuePatch::default()
        };
        let updated = update(&pool, &x, &issue.id, patch).await.unwrap();
        assert_eq!(updated.status, IssueStatus::Finished);
        assert_eq!(updated.author_id, x);
    }

    #[tokio::test]
    async fn patch_assignment_is_validated_against_membership() {
        let pool = memory_pool().await;
        let x = seed_user(&pool, "x").await;
        let y = seed_user(&pool, "y").await;
        let z = seed_user(&pool, "z").await;
        let project = project_owned_by(&pool, &x, "P1").await;
        membership::add_contributor(&pool, &x, &project, &y)
            .await
            .unwrap();
        let issue = create(&pool, &x, bug(&project, "bug1")).await.unwrap();

        let patch = IssuePatch {
            assigned: Some(z.clone()),
            ..IssuePatch::default()
        };
        let err = update(&pool, &x, &issue.id, patch).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let patch = IssuePatch {
            assigned: Some(y.clone()),
            ..IssuePatch::default()
        };
        let updated = update(&pool, &x, &issue.id, patch).await.unwrap();
        assert_eq!(updated.assigned_id, Some(y));
    }

    #[tokio::test]
    async fn removing_a_contributor_clears_their_assignments() {
        let pool = memory_pool().await;
        let x = seed_user(&pool, "x").await;
        let y = seed_user(&pool, "y").await;
        let project = project_owned_by(&pool, &x, "P1").await;
        membership::add_contributor(&pool, &x, &project, &y)
            .await
            .unwrap();

        let mut input = bug(&project, "bug1");
        input.assigned = Some(y.clone());
        let issue = create(&pool, &x, input).await.unwrap();
        assert_eq!(issue.assigned_id, Some(y.clone()));

        membership::remove_contributor(&pool, &x, &project, &y)
            .await
            .unwrap();

        let reloaded = get(&pool, &x, &issue.id).await.unwrap();
        assert_eq!(reloaded.assigned_id, None);
    }

    #[tokio::test]
    async fn listing_scoped_to_a_project_requires_membership() {
        let pool = memory_pool().await;
        let x = seed_user(&pool, "x").await;
        let eve = seed_user(&pool, "eve").await;
        let project = project_owned_by(&pool, &x, "P1").await;
        create(&pool, &x, bug(&project, "bug1")).await.unwrap();

        let err = list(&pool, &eve, Some(&project)).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Forbidden(ForbiddenReason::NotAContributor)
        ));

        // The unscoped listing simply filters eve's view down to nothing.
        assert!(list(&pool, &eve, None).await.unwrap().is_empty());
        assert_eq!(list(&pool, &x, None).await.unwrap().len(), 1);
    }
}
