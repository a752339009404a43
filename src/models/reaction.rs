use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// The emoji-style reactions a reader can leave on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionType {
    Like,
    Love,
    Laugh,
    Wow,
    Sad,
    Angry,
}

impl ReactionType {
    pub const ALL: [ReactionType; 6] = [
        ReactionType::Like,
        ReactionType::Love,
        ReactionType::Laugh,
        ReactionType::Wow,
        ReactionType::Sad,
        ReactionType::Angry,
    ];
}

/// One user's reaction to one post.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: ReactionType,
    pub created_at: DateTime<Utc>,
}

/// What a toggle request did to the user's reaction.
#[derive(Debug, Clone)]
pub enum ReactionOutcome {
    /// No previous reaction; this one was stored.
    Added(Reaction),
    /// A reaction of another type was replaced.
    Updated(ReactionType),
    /// The same type was sent again, which toggles it off.
    Removed,
}

/// Per-type counters for a post. Every type is present, zero or not.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionSummary {
    pub post_id: i64,
    pub reactions: BTreeMap<ReactionType, usize>,
    pub total_reactions: usize,
}

/// DTO for adding, switching or toggling off a reaction.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReactRequest {
    #[validate(range(min = 1, message = "Valid post ID is required"))]
    pub post_id: i64,
    #[serde(rename = "type")]
    pub kind: ReactionType,
}
