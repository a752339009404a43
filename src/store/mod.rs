//! In-memory collections backing the API.
//!
//! Each collection sits behind its own `tokio::sync::RwLock`. The comment
//! store is the only one with an abstract interface (`CommentStore`), since
//! it is the part handlers must be able to swap or fake; it reaches posts and
//! users only through the collaborator traits below.

use std::fmt;

use async_trait::async_trait;

pub mod comments;
pub mod posts;
pub mod reactions;
pub mod thread;
pub mod users;

pub use comments::{CommentStore, InMemoryCommentStore};
pub use posts::PostStore;
pub use reactions::ReactionStore;
pub use thread::ThreadError;
pub use users::UserStore;

/// A lookup against a collaborator could not be answered.
#[derive(Debug, Clone)]
pub struct CollaboratorError(pub String);

impl fmt::Display for CollaboratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for CollaboratorError {}

/// Display attributes of an actor, as resolved at comment creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// Answers whether a post exists.
#[async_trait]
pub trait PostRegistry: Send + Sync {
    async fn exists(&self, post_id: i64) -> Result<bool, CollaboratorError>;
}

/// Resolves a user id to display attributes; `Ok(None)` for unknown users.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self, user_id: i64) -> Result<Option<Identity>, CollaboratorError>;
}
