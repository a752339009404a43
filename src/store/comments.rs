use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tokio::time::timeout;

use super::thread::{self, ThreadError};
use super::{Identity, IdentityProvider, PostRegistry};
use crate::models::comment::{AuthorSnapshot, Comment, CommentNode, NewComment};

/// Threaded comments attached to posts.
///
/// Every mutation validates fully before it changes anything, and is applied
/// atomically with respect to other mutations and to `list`.
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// The reply forest of a post, newest first at every level.
    async fn list(&self, post_id: i64) -> Result<Vec<CommentNode>, ThreadError>;

    /// Appends a comment, optionally as a reply to one on the same post.
    async fn create(&self, new: NewComment) -> Result<Comment, ThreadError>;

    /// Replaces the text of a comment owned by `acting_user_id`.
    async fn update(
        &self,
        comment_id: i64,
        acting_user_id: i64,
        content: &str,
    ) -> Result<Comment, ThreadError>;

    /// Removes a comment owned by `acting_user_id` and every reply below it,
    /// whoever wrote them. Returns how many records were removed.
    async fn delete(&self, comment_id: i64, acting_user_id: i64) -> Result<usize, ThreadError>;

    /// Drops every comment of a post that is going away.
    async fn remove_post(&self, post_id: i64) -> usize;
}

struct Inner {
    comments: Vec<Comment>,
    next_id: i64,
}

/// `CommentStore` over a single in-memory vector guarded by one lock.
pub struct InMemoryCommentStore {
    inner: RwLock<Inner>,
    posts: Arc<dyn PostRegistry>,
    identities: Arc<dyn IdentityProvider>,
    lookup_timeout: Duration,
}

impl InMemoryCommentStore {
    pub fn new(
        posts: Arc<dyn PostRegistry>,
        identities: Arc<dyn IdentityProvider>,
        lookup_timeout: Duration,
    ) -> Self {
        Self::with_comments(Vec::new(), posts, identities, lookup_timeout)
    }

    /// Starts from existing records. New ids continue after the largest one.
    pub fn with_comments(
        seed: Vec<Comment>,
        posts: Arc<dyn PostRegistry>,
        identities: Arc<dyn IdentityProvider>,
        lookup_timeout: Duration,
    ) -> Self {
        let next_id = seed.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        Self {
            inner: RwLock::new(Inner {
                comments: seed,
                next_id,
            }),
            posts,
            identities,
            lookup_timeout,
        }
    }

    /// Number of stored comments across all posts.
    pub async fn len(&self) -> usize {
        self.inner.read().await.comments.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn get(&self, comment_id: i64) -> Option<Comment> {
        self.inner
            .read()
            .await
            .comments
            .iter()
            .find(|c| c.id == comment_id)
            .cloned()
    }

    async fn ensure_post(&self, post_id: i64) -> Result<(), ThreadError> {
        let exists = timeout(self.lookup_timeout, self.posts.exists(post_id))
            .await
            .map_err(|_| {
                ThreadError::Unavailable(format!(
                    "post lookup timed out after {:?}",
                    self.lookup_timeout
                ))
            })?
            .map_err(|e| ThreadError::Unavailable(e.to_string()))?;

        if exists {
            Ok(())
        } else {
            Err(ThreadError::PostNotFound(post_id))
        }
    }

    async fn resolve_author(&self, user_id: i64) -> Result<Identity, ThreadError> {
        timeout(self.lookup_timeout, self.identities.resolve(user_id))
            .await
            .map_err(|_| {
                ThreadError::Unavailable(format!(
                    "identity lookup timed out after {:?}",
                    self.lookup_timeout
                ))
            })?
            .map_err(|e| ThreadError::Unavailable(e.to_string()))?
            .ok_or(ThreadError::AuthorNotFound(user_id))
    }
}

#[async_trait]
impl CommentStore for InMemoryCommentStore {
    async fn list(&self, post_id: i64) -> Result<Vec<CommentNode>, ThreadError> {
        self.ensure_post(post_id).await?;

        let inner = self.inner.read().await;
        Ok(thread::build_forest(&inner.comments, post_id))
    }

    async fn create(&self, new: NewComment) -> Result<Comment, ThreadError> {
        self.ensure_post(new.post_id).await?;
        let content = thread::validate_content(&new.content)?;
        // Resolved before taking the lock; reported after the parent check.
        let author = self.resolve_author(new.author_id).await;

        let mut inner = self.inner.write().await;

        // Rechecked under the lock: a post deleted since the first check has
        // already had `remove_post` run or is waiting on this lock.
        self.ensure_post(new.post_id).await?;

        if let Some(parent_id) = new.parent_id {
            let parent_on_post = inner
                .comments
                .iter()
                .any(|c| c.id == parent_id && c.post_id == new.post_id);
            if !parent_on_post {
                return Err(ThreadError::ParentNotFound(parent_id));
            }
        }

        let author = author?;
        let now = Utc::now();
        let comment = Comment {
            id: inner.next_id,
            post_id: new.post_id,
            author_id: author.id,
            author: AuthorSnapshot {
                id: author.id,
                username: author.display_name,
                avatar: author.avatar_url,
            },
            content,
            parent_id: new.parent_id,
            created_at: now,
            updated_at: now,
        };

        inner.next_id += 1;
        inner.comments.push(comment.clone());

        Ok(comment)
    }

    async fn update(
        &self,
        comment_id: i64,
        acting_user_id: i64,
        content: &str,
    ) -> Result<Comment, ThreadError> {
        let mut inner = self.inner.write().await;

        let comment = inner
            .comments
            .iter_mut()
            .find(|c| c.id == comment_id)
            .ok_or(ThreadError::CommentNotFound(comment_id))?;

        if comment.author_id != acting_user_id {
            return Err(ThreadError::Forbidden {
                comment_id,
                user_id: acting_user_id,
            });
        }

        comment.content = thread::validate_content(content)?;
        comment.updated_at = Utc::now();

        Ok(comment.clone())
    }

    async fn delete(&self, comment_id: i64, acting_user_id: i64) -> Result<usize, ThreadError> {
        let mut inner = self.inner.write().await;

        let target = inner
            .comments
            .iter()
            .find(|c| c.id == comment_id)
            .ok_or(ThreadError::CommentNotFound(comment_id))?;

        // Ownership is checked on the target only; replies go with it.
        if target.author_id != acting_user_id {
            return Err(ThreadError::Forbidden {
                comment_id,
                user_id: acting_user_id,
            });
        }

        let doomed: HashSet<i64> = thread::collect_subtree(&inner.comments, comment_id)?
            .into_iter()
            .collect();

        let before = inner.comments.len();
        inner.comments.retain(|c| !doomed.contains(&c.id));

        Ok(before - inner.comments.len())
    }

    async fn remove_post(&self, post_id: i64) -> usize {
        let mut inner = self.inner.write().await;
        let before = inner.comments.len();
        inner.comments.retain(|c| c.post_id != post_id);
        before - inner.comments.len()
    }
}
