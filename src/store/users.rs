use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{CollaboratorError, Identity, IdentityProvider};
use crate::models::user::User;

struct Inner {
    users: Vec<User>,
    next_id: i64,
}

/// Registered accounts. Usernames and emails are unique (emails case-insensitively).
pub struct UserStore {
    inner: RwLock<Inner>,
}

/// Why a user could not be inserted or renamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserConflict {
    Email,
    Username,
}

/// Fields accepted by `UserStore::update_profile`; `None` leaves a field as is.
#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                users: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Inserts a new account. `password` must already be hashed.
    pub async fn insert(
        &self,
        username: &str,
        email: &str,
        password: String,
    ) -> Result<User, UserConflict> {
        let mut inner = self.inner.write().await;

        if inner.users.iter().any(|u| u.email.eq_ignore_ascii_case(email)) {
            return Err(UserConflict::Email);
        }
        if inner.users.iter().any(|u| u.username == username) {
            return Err(UserConflict::Username);
        }

        let user = User {
            id: inner.next_id,
            username: username.to_string(),
            email: email.to_lowercase(),
            password,
            avatar: None,
            bio: None,
            created_at: Utc::now(),
        };
        inner.next_id += 1;
        inner.users.push(user.clone());

        Ok(user)
    }

    pub async fn get(&self, id: i64) -> Option<User> {
        self.inner
            .read()
            .await
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
    }

    pub async fn find_by_email(&self, email: &str) -> Option<User> {
        self.inner
            .read()
            .await
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned()
    }

    /// Applies profile edits. Returns `Ok(None)` when the user does not exist.
    pub async fn update_profile(
        &self,
        id: i64,
        changes: ProfileChanges,
    ) -> Result<Option<User>, UserConflict> {
        let mut inner = self.inner.write().await;

        if let Some(name) = changes.username.as_deref() {
            if inner.users.iter().any(|u| u.username == name && u.id != id) {
                return Err(UserConflict::Username);
            }
        }

        let Some(user) = inner.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };

        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(bio) = changes.bio {
            user.bio = Some(bio);
        }
        if let Some(avatar) = changes.avatar {
            user.avatar = Some(avatar);
        }

        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl IdentityProvider for UserStore {
    async fn resolve(&self, user_id: i64) -> Result<Option<Identity>, CollaboratorError> {
        Ok(self.get(user_id).await.map(|user| Identity {
            id: user.id,
            display_name: user.username,
            avatar_url: user.avatar,
        }))
    }
}
