use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{comment::AuthorSnapshot, validate_url_string};

/// Publication state of a post. Only published posts are listed or served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Published,
    Draft,
}

/// A blog post.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub author_id: i64,
    /// Snapshot of the author taken at creation time.
    pub author: AuthorSnapshot,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub featured_image: Option<String>,
}

/// DTO for creating a new post.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[validate(length(
        min = 5,
        max = 200,
        message = "Title must be between 5 and 200 characters"
    ))]
    pub title: String,

    #[validate(length(min = 10, message = "Content must be at least 10 characters"))]
    pub content: String,

    #[validate(length(max = 300, message = "Excerpt must be less than 300 characters"))]
    pub excerpt: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[validate(custom(function = validate_url_string, message = "Featured image must be a valid URL"))]
    pub featured_image: Option<String>,
}

impl CreatePostRequest {
    /// Trims free-text fields in place so length rules apply to trimmed text.
    pub fn normalize(&mut self) {
        self.title = self.title.trim().to_string();
        self.content = self.content.trim().to_string();
        if let Some(excerpt) = self.excerpt.as_mut() {
            *excerpt = excerpt.trim().to_string();
        }
    }
}

/// DTO for a partial post update.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    #[validate(length(
        min = 5,
        max = 200,
        message = "Title must be between 5 and 200 characters"
    ))]
    pub title: Option<String>,

    #[validate(length(min = 10, message = "Content must be at least 10 characters"))]
    pub content: Option<String>,

    #[validate(length(max = 300, message = "Excerpt must be less than 300 characters"))]
    pub excerpt: Option<String>,

    pub tags: Option<Vec<String>>,

    #[validate(custom(function = validate_url_string, message = "Featured image must be a valid URL"))]
    pub featured_image: Option<String>,
}

impl UpdatePostRequest {
    pub fn normalize(&mut self) {
        for field in [&mut self.title, &mut self.content, &mut self.excerpt] {
            if let Some(value) = field.as_mut() {
                *value = value.trim().to_string();
            }
        }
    }
}

/// Query parameters for listing posts.
#[derive(Debug, Default, Deserialize)]
pub struct PostListParams {
    /// 1-based page number (default: 1).
    pub page: Option<usize>,

    /// Number of items per page (default: 10, max: 100).
    pub limit: Option<usize>,

    /// Case-insensitive substring match on the author's username.
    pub author: Option<String>,

    /// Case-insensitive substring match on any tag.
    pub tag: Option<String>,
}

/// One page of the post listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub total_posts: usize,
    pub current_page: usize,
    pub total_pages: usize,
}

/// Builds the default excerpt: the first 150 characters followed by an ellipsis.
pub fn excerpt_from(content: &str) -> String {
    let head: String = content.chars().take(150).collect();
    format!("{}...", head)
}
