use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{CollaboratorError, PostRegistry};
use crate::models::comment::AuthorSnapshot;
use crate::models::post::{Post, PostListParams, PostPage, PostStatus};

const DEFAULT_PAGE_SIZE: usize = 10;
const MAX_PAGE_SIZE: usize = 100;

/// A validated post ready to be stored.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub tags: Vec<String>,
    pub featured_image: Option<String>,
    pub author: AuthorSnapshot,
}

/// Validated partial edits; `None` leaves a field as is.
#[derive(Debug, Default, Clone)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub tags: Option<Vec<String>>,
    pub featured_image: Option<String>,
}

struct Inner {
    posts: Vec<Post>,
    next_id: i64,
}

pub struct PostStore {
    inner: RwLock<Inner>,
}

impl Default for PostStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PostStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                posts: Vec::new(),
                next_id: 1,
            }),
        }
    }

    pub async fn insert(&self, draft: PostDraft) -> Post {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let post = Post {
            id: inner.next_id,
            title: draft.title,
            content: draft.content,
            excerpt: draft.excerpt,
            author_id: draft.author.id,
            author: draft.author,
            created_at: now,
            updated_at: now,
            tags: draft.tags,
            status: PostStatus::Published,
            featured_image: draft.featured_image,
        };
        inner.next_id += 1;
        inner.posts.push(post.clone());
        post
    }

    /// Any post, whatever its status.
    pub async fn get(&self, id: i64) -> Option<Post> {
        self.inner
            .read()
            .await
            .posts
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    pub async fn get_published(&self, id: i64) -> Option<Post> {
        self.get(id)
            .await
            .filter(|p| p.status == PostStatus::Published)
    }

    /// Published posts, newest first, filtered and sliced into one page.
    pub async fn list(&self, params: &PostListParams) -> PostPage {
        let page = params.page.unwrap_or(1).max(1);
        let limit = params
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let author = params.author.as_deref().map(str::to_lowercase);
        let tag = params.tag.as_deref().map(str::to_lowercase);

        let inner = self.inner.read().await;
        let mut matched: Vec<&Post> = inner
            .posts
            .iter()
            .filter(|p| p.status == PostStatus::Published)
            .filter(|p| {
                author
                    .as_deref()
                    .is_none_or(|a| p.author.username.to_lowercase().contains(a))
            })
            .filter(|p| {
                tag.as_deref()
                    .is_none_or(|t| p.tags.iter().any(|pt| pt.to_lowercase().contains(t)))
            })
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));

        let total_posts = matched.len();
        let posts = matched
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .cloned()
            .collect();

        PostPage {
            posts,
            total_posts,
            current_page: page,
            total_pages: total_posts.div_ceil(limit),
        }
    }

    /// Published posts of one author, newest first.
    pub async fn list_by_author(&self, author_id: i64) -> Vec<Post> {
        let inner = self.inner.read().await;
        let mut posts: Vec<Post> = inner
            .posts
            .iter()
            .filter(|p| p.author_id == author_id && p.status == PostStatus::Published)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        posts
    }

    /// Applies edits and bumps `updated_at`. `None` if the post is gone.
    pub async fn update(&self, id: i64, changes: PostChanges) -> Option<Post> {
        let mut inner = self.inner.write().await;
        let post = inner.posts.iter_mut().find(|p| p.id == id)?;

        if let Some(title) = changes.title {
            post.title = title;
        }
        if let Some(content) = changes.content {
            post.content = content;
        }
        if let Some(excerpt) = changes.excerpt {
            post.excerpt = excerpt;
        }
        if let Some(tags) = changes.tags {
            post.tags = tags;
        }
        if let Some(image) = changes.featured_image {
            post.featured_image = Some(image);
        }
        post.updated_at = Utc::now();

        Some(post.clone())
    }

    pub async fn remove(&self, id: i64) -> Option<Post> {
        let mut inner = self.inner.write().await;
        let index = inner.posts.iter().position(|p| p.id == id)?;
        Some(inner.posts.remove(index))
    }
}

#[async_trait]
impl PostRegistry for PostStore {
    async fn exists(&self, post_id: i64) -> Result<bool, CollaboratorError> {
        Ok(self.inner.read().await.posts.iter().any(|p| p.id == post_id))
    }
}
