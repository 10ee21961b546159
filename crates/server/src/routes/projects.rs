use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    db::models::Project,
    error::Result,
    middleware::auth::AuthUser,
    routes::full_replace_rejected,
    services::{membership, projects},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route(
            "/:id",
            get(get_project)
                .patch(update_project)
                .put(full_replace_rejected)
                .delete(delete_project),
        )
        .route(
            "/:id/contributors",
            get(list_contributors).post(add_contributor),
        )
        .route(
            "/:id/contributors/:user_id",
            axum::routing::delete(remove_contributor),
        )
}

#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<Project>,
}

#[derive(Debug, Deserialize)]
pub struct AddContributorRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ContributorPathParams {
    pub id: String,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct ContributorsListResponse {
    pub contributors: Vec<membership::ContributorProfile>,
}

async fn list_projects(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ProjectListResponse>> {
    let projects = projects::list(&state.db.pool, &user.id).await?;
    Ok(Json(ProjectListResponse { projects }))
}

async fn create_project(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<projects::CreateProject>,
) -> Result<Json<Project>> {
    let project = projects::create(&state.db.pool, &user.id, body).await?;
    Ok(Json(project))
}

async fn get_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Project>> {
    let project = projects::get(&state.db.pool, &user.id, &id).await?;
    Ok(Json(project))
}

async fn update_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<projects::ProjectPatch>,
) -> Result<Json<Project>> {
    let project = projects::update(&state.db.pool, &user.id, &id, body).await?;
    Ok(Json(project))
}

async fn delete_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<()>> {
    projects::delete(&state.db.pool, &user.id, &id).await?;
    Ok(Json(()))
}

async fn list_contributors(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<ContributorsListResponse>> {
    let contributors = membership::list_contributors(&state.db.pool, &user.id, &project_id).await?;
    Ok(Json(ContributorsListResponse { contributors }))
}

async fn add_contributor(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<String>,
    Json(body): Json<AddContributorRequest>,
) -> Result<Json<Value>> {
    membership::add_contributor(&state.db.pool, &user.id, &project_id, &body.user_id).await?;
    Ok(Json(json!({
        "message": "User added as a contributor",
        "code": "contributor_added"
    })))
}

async fn remove_contributor(
    State(state): State<AppState>,
    user: AuthUser,
    Path(params): Path<ContributorPathParams>,
) -> Result<Json<Value>> {
    membership::remove_contributor(&state.db.pool, &user.id, &params.id, &params.user_id).await?;
    Ok(Json(json!({
        "message": "User removed from contributors",
        "code": "contributor_removed"
    })))
}
