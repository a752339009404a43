use std::sync::Arc;

use axum::extract::FromRef;

use crate::config::Config;
use crate::store::{
    CommentStore, InMemoryCommentStore, PostStore, ReactionStore, UserStore,
};

/// Shared handles to every in-memory collection plus configuration.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserStore>,
    pub posts: Arc<PostStore>,
    pub reactions: Arc<ReactionStore>,
    pub comments: Arc<dyn CommentStore>,
    pub config: Config,
}

impl AppState {
    /// Builds empty collections wired together: the comment store resolves
    /// posts and authors through the post and user stores.
    pub fn new(config: Config) -> Self {
        let users = Arc::new(UserStore::new());
        let posts = Arc::new(PostStore::new());
        let comments = InMemoryCommentStore::new(
            posts.clone(),
            users.clone(),
            config.collaborator_timeout,
        );

        Self {
            users,
            posts,
            reactions: Arc::new(ReactionStore::new()),
            comments: Arc::new(comments),
            config,
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<UserStore> {
    fn from_ref(state: &AppState) -> Self {
        state.users.clone()
    }
}

impl FromRef<AppState> for Arc<PostStore> {
    fn from_ref(state: &AppState) -> Self {
        state.posts.clone()
    }
}

impl FromRef<AppState> for Arc<ReactionStore> {
    fn from_ref(state: &AppState) -> Self {
        state.reactions.clone()
    }
}

impl FromRef<AppState> for Arc<dyn CommentStore> {
    fn from_ref(state: &AppState) -> Self {
        state.comments.clone()
    }
}
