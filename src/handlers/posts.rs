use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        comment::AuthorSnapshot,
        post::{CreatePostRequest, PostListParams, UpdatePostRequest, excerpt_from},
    },
    store::{
        CommentStore, PostStore, ReactionStore, UserStore,
        posts::{PostChanges, PostDraft},
    },
    utils::{html::clean_html, jwt::Claims},
};

/// List published posts (Recent first).
/// Supports author/tag filters and page-based pagination.
pub async fn list_posts(
    State(posts): State<Arc<PostStore>>,
    Query(params): Query<PostListParams>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(posts.list(&params).await))
}

/// Get a single published post by ID.
pub async fn get_post(
    State(posts): State<Arc<PostStore>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let post = posts
        .get_published(id)
        .await
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    Ok(Json(post))
}

/// Published posts written by one user.
pub async fn list_user_posts(
    State(posts): State<Arc<PostStore>>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(json!({ "posts": posts.list_by_author(user_id).await })))
}

/// Create a new post.
/// Requires: Login.
pub async fn create_post(
    State(posts): State<Arc<PostStore>>,
    State(users): State<Arc<UserStore>>,
    Extension(claims): Extension<Claims>,
    Json(mut payload): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    // 1. Validate payload (on trimmed text)
    payload.normalize();
    payload.validate()?;

    // 2. Snapshot the author
    let author = users
        .get(claims.user_id()?)
        .await
        .ok_or(AppError::NotFound("Author not found".to_string()))?;

    let content = clean_html(&payload.content);
    let excerpt = payload.excerpt.unwrap_or_else(|| excerpt_from(&content));

    // 3. Insert Post
    let post = posts
        .insert(PostDraft {
            title: payload.title,
            content,
            excerpt,
            tags: clean_tags(payload.tags),
            featured_image: payload.featured_image,
            author: AuthorSnapshot {
                id: author.id,
                username: author.username,
                avatar: author.avatar,
            },
        })
        .await;

    tracing::info!("Post {} created by user {}", post.id, post.author_id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Post created successfully",
            "post": post,
        })),
    ))
}

/// Update a post.
/// Requires: Login + Author.
pub async fn update_post(
    State(posts): State<Arc<PostStore>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(mut payload): Json<UpdatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.normalize();
    payload.validate()?;
    let user_id = claims.user_id()?;

    // 1. Fetch Post to check ownership
    let post = posts
        .get(id)
        .await
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    // 2. Check Permission
    if post.author_id != user_id {
        return Err(AppError::Forbidden(
            "You can only edit your own posts".to_string(),
        ));
    }

    // 3. Apply. New content without an explicit excerpt regenerates it.
    let content = payload.content.as_deref().map(clean_html);
    let excerpt = match (payload.excerpt, content.as_deref()) {
        (Some(excerpt), _) => Some(excerpt),
        (None, Some(content)) => Some(excerpt_from(content)),
        (None, None) => None,
    };

    let post = posts
        .update(
            id,
            PostChanges {
                title: payload.title,
                content,
                excerpt,
                tags: payload.tags.map(clean_tags),
                featured_image: payload.featured_image,
            },
        )
        .await
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    Ok(Json(json!({
        "message": "Post updated successfully",
        "post": post,
    })))
}

/// Delete a post together with its comments and reactions.
/// Requires: Login + Author.
pub async fn delete_post(
    State(posts): State<Arc<PostStore>>,
    State(comments): State<Arc<dyn CommentStore>>,
    State(reactions): State<Arc<ReactionStore>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let post = posts
        .get(id)
        .await
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    if post.author_id != user_id {
        return Err(AppError::Forbidden(
            "You can only delete your own posts".to_string(),
        ));
    }

    posts.remove(id).await;
    let removed_comments = comments.remove_post(id).await;
    let removed_reactions = reactions.remove_post(id).await;

    tracing::info!(
        "Post {} deleted with {} comments and {} reactions",
        id,
        removed_comments,
        removed_reactions
    );

    Ok(Json(json!({ "message": "Post deleted successfully" })))
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}
