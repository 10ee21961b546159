use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::models::Issue,
    error::Result,
    middleware::auth::AuthUser,
    routes::full_replace_rejected,
    services::issues,
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_issues).post(create_issue))
        .route(
            "/:id",
            get(get_issue)
                .patch(update_issue)
                .put(full_replace_rejected)
                .delete(delete_issue),
        )
}

#[derive(Debug, Deserialize)]
pub struct IssueListQuery {
    pub project: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IssueListResponse {
    pub issues: Vec<Issue>,
}

async fn list_issues(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<IssueListQuery>,
) -> Result<Json<IssueListResponse>> {
    let issues = issues::list(&state.db.pool, &user.id, query.project.as_deref()).await?;
    Ok(Json(IssueListResponse { issues }))
}

async fn create_issue(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<issues::CreateIssue>,
) -> Result<Json<Issue>> {
    let issue = issues::create(&state.db.pool, &user.id, body).await?;
    Ok(Json(issue))
}

async fn get_issue(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Issue>> {
    let issue = issues::get(&state.db.pool, &user.id, &id).await?;
    Ok(Json(issue))
}

async fn update_issue(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<issues::IssuePatch>,
) -> Result<Json<Issue>> {
    let issue = issues::update(&state.db.pool, &user.id, &id, body).await?;
    Ok(Json(issue))
}

async fn delete_issue(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<()>> {
    issues::delete(&state.db.pool, &user.id, &id).await?;
    Ok(Json(()))
}
