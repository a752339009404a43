use std::collections::BTreeMap;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::models::reaction::{Reaction, ReactionOutcome, ReactionSummary, ReactionType};

struct Inner {
    reactions: Vec<Reaction>,
    next_id: i64,
}

/// At most one reaction per (post, user).
pub struct ReactionStore {
    inner: RwLock<Inner>,
}

impl Default for ReactionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ReactionStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                reactions: Vec::new(),
                next_id: 1,
            }),
        }
    }

    pub async fn summary(&self, post_id: i64) -> ReactionSummary {
        let mut counts: BTreeMap<ReactionType, usize> =
            ReactionType::ALL.iter().map(|&kind| (kind, 0)).collect();

        let inner = self.inner.read().await;
        let mut total_reactions = 0;
        for reaction in inner.reactions.iter().filter(|r| r.post_id == post_id) {
            *counts.entry(reaction.kind).or_default() += 1;
            total_reactions += 1;
        }

        ReactionSummary {
            post_id,
            reactions: counts,
            total_reactions,
        }
    }

    pub async fn user_reaction(&self, post_id: i64, user_id: i64) -> Option<ReactionType> {
        self.inner
            .read()
            .await
            .reactions
            .iter()
            .find(|r| r.post_id == post_id && r.user_id == user_id)
            .map(|r| r.kind)
    }

    /// Adds a reaction, switches it to `kind`, or removes it when the user
    /// sends the type they already have.
    pub async fn toggle(&self, post_id: i64, user_id: i64, kind: ReactionType) -> ReactionOutcome {
        let mut inner = self.inner.write().await;

        let existing = inner
            .reactions
            .iter()
            .position(|r| r.post_id == post_id && r.user_id == user_id);

        match existing {
            Some(index) if inner.reactions[index].kind == kind => {
                inner.reactions.remove(index);
                ReactionOutcome::Removed
            }
            Some(index) => {
                let reaction = &mut inner.reactions[index];
                reaction.kind = kind;
                reaction.created_at = Utc::now();
                ReactionOutcome::Updated(kind)
            }
            None => {
                let reaction = Reaction {
                    id: inner.next_id,
                    post_id,
                    user_id,
                    kind,
                    created_at: Utc::now(),
                };
                inner.next_id += 1;
                inner.reactions.push(reaction.clone());
                ReactionOutcome::Added(reaction)
            }
        }
    }

    /// Removes the user's reaction. `false` if there was none.
    pub async fn remove(&self, post_id: i64, user_id: i64) -> bool {
        let mut inner = self.inner.write().await;
        let before = inner.reactions.len();
        inner
            .reactions
            .retain(|r| !(r.post_id == post_id && r.user_id == user_id));
        inner.reactions.len() != before
    }

    pub async fn remove_post(&self, post_id: i64) -> usize {
        let mut inner = self.inner.write().await;
        let before = inner.reactions.len();
        inner.reactions.retain(|r| r.post_id != post_id);
        before - inner.reactions.len()
    }
}
