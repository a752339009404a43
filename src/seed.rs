// src/seed.rs

use crate::{
    error::AppError,
    models::{
        comment::{AuthorSnapshot, NewComment},
        post::excerpt_from,
    },
    state::AppState,
    store::{posts::PostDraft, users::ProfileChanges},
    utils::hash::hash_password,
};

const DEMO_AVATAR: &str =
    "https://images.pexels.com/photos/220453/pexels-photo-220453.jpeg?auto=compress&cs=tinysrgb&w=150";

/// Seeds a demo account with a welcome post and a first comment,
/// so a fresh instance has something to render.
pub async fn seed_demo(state: &AppState, email: &str, password: &str) -> Result<(), AppError> {
    if state.users.find_by_email(email).await.is_some() {
        return Ok(());
    }

    tracing::info!("Seeding demo user: {}", email);
    let hashed_password = hash_password(password)?;
    let user = state
        .users
        .insert("demo", email, hashed_password)
        .await
        .map_err(|e| AppError::Conflict(format!("Demo user conflicts on {:?}", e)))?;
    let changes = ProfileChanges {
        avatar: Some(DEMO_AVATAR.to_string()),
        ..Default::default()
    };
    let user = state
        .users
        .update_profile(user.id, changes)
        .await
        .ok()
        .flatten()
        .unwrap_or(user);

    let content = "This is a sample blog post demonstrating the features of the platform. \
                   You can create, edit, and delete posts, as well as comment and react to them!";
    let post = state
        .posts
        .insert(PostDraft {
            title: "Welcome to the Blog Platform".to_string(),
            content: content.to_string(),
            excerpt: excerpt_from(content),
            tags: vec!["welcome".to_string(), "demo".to_string()],
            featured_image: None,
            author: AuthorSnapshot {
                id: user.id,
                username: user.username.clone(),
                avatar: user.avatar.clone(),
            },
        })
        .await;

    state
        .comments
        .create(NewComment {
            post_id: post.id,
            author_id: user.id,
            content: "Great introduction to the platform! Looking forward to more features."
                .to_string(),
            parent_id: None,
        })
        .await?;

    tracing::info!("Demo content created (post {}).", post.id);
    Ok(())
}
