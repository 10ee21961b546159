use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::models::Comment,
    error::Result,
    middleware::auth::AuthUser,
    routes::full_replace_rejected,
    services::comments,
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_comments).post(create_comment))
        .route(
            "/:id",
            get(get_comment)
                .patch(update_comment)
                .put(full_replace_rejected)
                .delete(delete_comment),
        )
}

#[derive(Debug, Deserialize)]
pub struct CommentListQuery {
    pub issue: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CommentListResponse {
    pub comments: Vec<Comment>,
}

async fn list_comments(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<CommentListQuery>,
) -> Result<Json<CommentListResponse>> {
    let comments = comments::list(&state.db.pool, &user.id, query.issue.as_deref()).await?;
    Ok(Json(CommentListResponse { comments }))
}

async fn create_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<comments::CreateComment>,
) -> Result<Json<Comment>> {
    let comment = comments::create(&state.db.pool, &user.id, body).await?;
    Ok(Json(comment))
}

async fn get_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Comment>> {
    let comment = comments::get(&state.db.pool, &user.id, &id).await?;
    Ok(Json(comment))
}

async fn update_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<comments::CommentPatch>,
) -> Result<Json<Comment>> {
    let comment = comments::update(&state.db.pool, &user.id, &id, body).await?;
    Ok(Json(comment))
}

async fn delete_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<()>> {
    comments::delete(&state.db.pool, &user.id, &id).await?;
    Ok(Json(()))
}
