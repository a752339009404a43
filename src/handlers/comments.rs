use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::comment::{CreateCommentRequest, NewComment, UpdateCommentRequest, forest_to_json},
    store::CommentStore,
    utils::jwt::Claims,
};

/// List the comment threads of a post, newest first at every level.
pub async fn list_comments(
    State(comments): State<Arc<dyn CommentStore>>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let forest = comments.list(post_id).await?;
    let body = format!("{{\"comments\":{}}}", forest_to_json(&forest)?);

    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}

/// Create a new comment, or a reply when `parentId` is given.
pub async fn create_comment(
    State(comments): State<Arc<dyn CommentStore>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let comment = comments
        .create(NewComment {
            post_id: payload.post_id,
            author_id: claims.user_id()?,
            content: payload.content,
            parent_id: payload.parent_id,
        })
        .await?;

    tracing::debug!(
        "Comment {} added to post {} (parent {:?})",
        comment.id,
        comment.post_id,
        comment.parent_id
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Comment created successfully",
            "comment": comment,
        })),
    ))
}

/// Edit the text of one of the caller's comments.
pub async fn update_comment(
    State(comments): State<Arc<dyn CommentStore>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let comment = comments
        .update(id, claims.user_id()?, &payload.content)
        .await?;

    Ok(Json(json!({
        "message": "Comment updated successfully",
        "comment": comment,
    })))
}

/// Delete one of the caller's comments and every reply under it.
pub async fn delete_comment(
    State(comments): State<Arc<dyn CommentStore>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let removed = comments.delete(id, user_id).await?;

    tracing::info!("Comment {} deleted by user {} ({} records)", id, user_id, removed);

    Ok(Json(json!({
        "message": "Comment deleted successfully",
        "removed": removed,
    })))
}
