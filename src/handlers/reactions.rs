use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::reaction::{ReactRequest, ReactionOutcome},
    store::{PostStore, ReactionStore},
    utils::jwt::Claims,
};

/// Reaction counts per type for a post.
pub async fn get_reactions(
    State(posts): State<Arc<PostStore>>,
    State(reactions): State<Arc<ReactionStore>>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if posts.get(post_id).await.is_none() {
        return Err(AppError::NotFound("Post not found".to_string()));
    }

    Ok(Json(reactions.summary(post_id).await))
}

/// The caller's own reaction to a post, if any.
pub async fn get_user_reaction(
    State(reactions): State<Arc<ReactionStore>>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let kind = reactions.user_reaction(post_id, claims.user_id()?).await;

    Ok(Json(json!({
        "postId": post_id,
        "userReaction": kind,
    })))
}

/// Add, switch, or toggle off the caller's reaction.
pub async fn react(
    State(posts): State<Arc<PostStore>>,
    State(reactions): State<Arc<ReactionStore>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ReactRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    if posts.get(payload.post_id).await.is_none() {
        return Err(AppError::NotFound("Post not found".to_string()));
    }

    let response = match reactions.toggle(payload.post_id, user_id, payload.kind).await {
        ReactionOutcome::Added(reaction) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "Reaction added",
                "action": "added",
                "type": reaction.kind,
                "reaction": reaction,
            })),
        ),
        ReactionOutcome::Updated(kind) => (
            StatusCode::OK,
            Json(json!({
                "message": "Reaction updated",
                "action": "updated",
                "type": kind,
            })),
        ),
        ReactionOutcome::Removed => (
            StatusCode::OK,
            Json(json!({
                "message": "Reaction removed",
                "action": "removed",
                "type": null,
            })),
        ),
    };

    Ok(response)
}

/// Remove the caller's reaction from a post.
pub async fn remove_reaction(
    State(reactions): State<Arc<ReactionStore>>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !reactions.remove(post_id, claims.user_id()?).await {
        return Err(AppError::NotFound("Reaction not found".to_string()));
    }

    Ok(Json(json!({ "message": "Reaction removed successfully" })))
}
