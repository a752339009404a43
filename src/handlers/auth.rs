// src/handlers/auth.rs

use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{CreateUserRequest, LoginRequest, User},
    store::users::{UserConflict, UserStore},
    utils::{
        hash::{hash_password, verify_password},
        jwt::{Claims, sign_jwt},
    },
};

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created with a token and the user object (excluding password).
pub async fn register(
    State(users): State<Arc<UserStore>>,
    State(config): State<Config>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let username = payload.username.trim();
    let hashed_password = hash_password(&payload.password)?;

    let user = users
        .insert(username, payload.email.trim(), hashed_password)
        .await
        .map_err(|conflict| match conflict {
            UserConflict::Email => {
                AppError::Conflict("An account with this email already exists".to_string())
            }
            UserConflict::Username => {
                AppError::Conflict(format!("Username '{}' already exists", username))
            }
        })?;

    tracing::info!("Registered user {} ({})", user.id, user.username);

    let token = issue_token(&user, &config)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "token": token,
            "user": user,
        })),
    ))
}

/// Authenticates a user and returns a JWT token.
///
/// Verifies the email and password against the user store.
/// If valid, signs a JWT token carrying the user's ID.
pub async fn login(
    State(users): State<Arc<UserStore>>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = users
        .find_by_email(payload.email.trim())
        .await
        .ok_or(AppError::AuthError("Invalid credentials".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError("Invalid credentials".to_string()));
    }

    let token = issue_token(&user, &config)?;

    Ok(Json(json!({
        "message": "Login successful",
        "token": token,
        "user": user,
    })))
}

/// Returns the authenticated user, including their email.
pub async fn me(
    State(users): State<Arc<UserStore>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = users
        .get(claims.user_id()?)
        .await
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

fn issue_token(user: &User, config: &Config) -> Result<String, AppError> {
    sign_jwt(
        user.id,
        &user.username,
        &config.jwt_secret,
        config.jwt_expiration,
    )
}
