use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{UpdateProfileRequest, UserProfile},
    store::users::{ProfileChanges, UserConflict, UserStore},
    utils::jwt::Claims,
};

/// Public profile of any user.
pub async fn get_user(
    State(users): State<Arc<UserStore>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = users
        .get(id)
        .await
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserProfile::from(&user)))
}

/// Edits the caller's own profile.
/// Existing post and comment attributions keep the old name and avatar.
pub async fn update_profile(
    State(users): State<Arc<UserStore>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    let username = match payload.username.as_deref().map(str::trim) {
        Some(name) if name.chars().count() < 3 => {
            return Err(AppError::BadRequest(
                "Username must be at least 3 characters".to_string(),
            ));
        }
        other => other.map(str::to_string),
    };

    let changes = ProfileChanges {
        username,
        bio: payload.bio.map(|b| b.trim().to_string()),
        avatar: payload.avatar,
    };

    let user = users
        .update_profile(user_id, changes)
        .await
        .map_err(|conflict| match conflict {
            UserConflict::Username => AppError::BadRequest("Username is already taken".to_string()),
            UserConflict::Email => AppError::BadRequest("Email is already taken".to_string()),
        })?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({
        "message": "Profile updated successfully",
        "user": user,
    })))
}
