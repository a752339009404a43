//! Comment threading over a flat, parent-pointer collection.
//!
//! The store keeps comments as a flat list where each record may point at a
//! parent. Threads are rebuilt per read into owned trees, and removals walk the
//! same relation downward. Both walks use explicit stacks, so reply chains of
//! any depth are safe.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::models::comment::{Comment, CommentNode};

/// Maximum comment length, counted in characters after trimming.
pub const MAX_CONTENT_CHARS: usize = 1000;

/// Errors surfaced by comment thread operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadError {
    /// The referenced post does not exist.
    PostNotFound(i64),
    /// The targeted comment does not exist.
    CommentNotFound(i64),
    /// The parent comment does not exist on the same post.
    ParentNotFound(i64),
    /// The acting user could not be resolved.
    AuthorNotFound(i64),
    /// Content is blank or too long after trimming.
    InvalidContent(String),
    /// The acting user did not write the targeted comment.
    Forbidden { comment_id: i64, user_id: i64 },
    /// A post or identity lookup failed or timed out.
    Unavailable(String),
    /// The parent relation loops back on itself at this comment id.
    Corrupted(i64),
}

impl fmt::Display for ThreadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PostNotFound(id) => write!(f, "Post not found: {id}"),
            Self::CommentNotFound(id) => write!(f, "Comment not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "Parent comment not found: {id}"),
            Self::AuthorNotFound(id) => write!(f, "Author not found: {id}"),
            Self::InvalidContent(msg) => write!(f, "{msg}"),
            Self::Forbidden { comment_id, .. } => {
                write!(f, "You can only modify your own comments (comment {comment_id})")
            }
            Self::Unavailable(msg) => write!(f, "Lookup unavailable: {msg}"),
            Self::Corrupted(id) => write!(f, "Comment thread is corrupted at comment {id}"),
        }
    }
}

impl std::error::Error for ThreadError {}

/// Trims `raw` and checks it holds between 1 and 1000 characters.
/// Returns the trimmed text, which is what gets stored.
pub fn validate_content(raw: &str) -> Result<String, ThreadError> {
    let trimmed = raw.trim();
    let len = trimmed.chars().count();
    if len == 0 || len > MAX_CONTENT_CHARS {
        return Err(ThreadError::InvalidContent(format!(
            "Content must be between 1 and {MAX_CONTENT_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Rebuilds the reply forest of `post_id`.
///
/// Comments are ordered newest first (ties: higher id first) before assembly,
/// so every sibling group keeps that order. A comment whose parent is not part
/// of the post's comments is dropped together with its replies.
pub fn build_forest(comments: &[Comment], post_id: i64) -> Vec<CommentNode> {
    let mut ordered: Vec<&Comment> = comments.iter().filter(|c| c.post_id == post_id).collect();
    ordered.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });

    // Pass 1: id -> arena slot.
    let index: HashMap<i64, usize> = ordered
        .iter()
        .enumerate()
        .map(|(slot, c)| (c.id, slot))
        .collect();

    // Pass 2: attach every slot under its parent, preserving recency order.
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); ordered.len()];
    let mut roots = Vec::new();
    for (slot, comment) in ordered.iter().enumerate() {
        match comment.parent_id {
            None => roots.push(slot),
            Some(parent_id) => {
                if let Some(&parent_slot) = index.get(&parent_id) {
                    children[parent_slot].push(slot);
                }
            }
        }
    }

    // Materialize owned nodes children-first. Only slots reachable from a root
    // are visited, so a looping parent chain is never entered.
    let mut built: Vec<Option<CommentNode>> = (0..ordered.len()).map(|_| None).collect();
    let mut stack: Vec<(usize, bool)> = roots.iter().map(|&slot| (slot, false)).collect();
    while let Some((slot, expanded)) = stack.pop() {
        if expanded {
            let replies = children[slot]
                .iter()
                .filter_map(|&child| built[child].take())
                .collect();
            built[slot] = Some(CommentNode {
                comment: ordered[slot].clone(),
                replies,
            });
        } else {
            stack.push((slot, true));
            stack.extend(children[slot].iter().map(|&child| (child, false)));
        }
    }

    roots.into_iter().filter_map(|slot| built[slot].take()).collect()
}

/// Collects `root_id` and every comment below it, descendants before their
/// ancestors. Authorship is not considered: the whole subtree goes.
///
/// Fails with `Corrupted` if the walk reaches the same id twice, which only
/// happens when some `parent_id` chain loops.
pub fn collect_subtree(comments: &[Comment], root_id: i64) -> Result<Vec<i64>, ThreadError> {
    let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
    for comment in comments {
        if let Some(parent_id) = comment.parent_id {
            children.entry(parent_id).or_default().push(comment.id);
        }
    }

    let mut visited = HashSet::new();
    let mut order = Vec::new();
    let mut stack = vec![(root_id, false)];
    while let Some((id, expanded)) = stack.pop() {
        if expanded {
            order.push(id);
            continue;
        }
        if !visited.insert(id) {
            return Err(ThreadError::Corrupted(id));
        }
        stack.push((id, true));
        if let Some(kids) = children.get(&id) {
            stack.extend(kids.iter().map(|&kid| (kid, false)));
        }
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::models::comment::AuthorSnapshot;

    fn comment(id: i64, post_id: i64, parent_id: Option<i64>, minute: i64) -> Comment {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minute);
        Comment {
            id,
            post_id,
            author_id: 1,
            author: AuthorSnapshot {
                id: 1,
                username: "demo".to_string(),
                avatar: None,
            },
            content: format!("comment {id}"),
            parent_id,
            created_at: at,
            updated_at: at,
        }
    }

    fn ids(nodes: &[CommentNode]) -> Vec<i64> {
        nodes.iter().map(|n| n.comment.id).collect()
    }

    #[test]
    fn chain_becomes_nested_path() {
        let comments = vec![
            comment(1, 1, None, 0),
            comment(2, 1, Some(1), 1),
            comment(3, 1, Some(2), 2),
        ];

        let forest = build_forest(&comments, 1);

        assert_eq!(ids(&forest), vec![1]);
        assert_eq!(ids(&forest[0].replies), vec![2]);
        assert_eq!(ids(&forest[0].replies[0].replies), vec![3]);
        assert!(forest[0].replies[0].replies[0].replies.is_empty());
    }

    #[test]
    fn siblings_are_newest_first() {
        let comments = vec![
            comment(1, 1, None, 0),
            comment(2, 1, Some(1), 5),
            comment(3, 1, Some(1), 9),
            comment(4, 1, Some(1), 7),
            comment(5, 1, None, 3),
        ];

        let forest = build_forest(&comments, 1);

        assert_eq!(ids(&forest), vec![5, 1]);
        assert_eq!(ids(&forest[1].replies), vec![3, 4, 2]);
    }

    #[test]
    fn equal_timestamps_fall_back_to_id() {
        let comments = vec![comment(1, 1, None, 0), comment(2, 1, None, 0)];

        assert_eq!(ids(&build_forest(&comments, 1)), vec![2, 1]);
    }

    #[test]
    fn other_posts_are_excluded() {
        let comments = vec![
            comment(1, 1, None, 0),
            comment(2, 2, None, 1),
            comment(3, 2, Some(2), 2),
        ];

        let forest = build_forest(&comments, 1);

        assert_eq!(ids(&forest), vec![1]);
        assert!(forest[0].replies.is_empty());
    }

    #[test]
    fn orphans_are_dropped_not_promoted() {
        let comments = vec![
            comment(1, 1, None, 0),
            comment(2, 1, Some(42), 1),
            comment(3, 1, Some(2), 2),
        ];

        let forest = build_forest(&comments, 1);

        assert_eq!(ids(&forest), vec![1]);
        assert_eq!(forest[0].subtree_size(), 1);
    }

    #[test]
    fn looping_parents_never_reach_the_forest() {
        let comments = vec![
            comment(1, 1, None, 0),
            comment(2, 1, Some(3), 1),
            comment(3, 1, Some(2), 2),
            comment(4, 1, Some(4), 3),
        ];

        assert_eq!(ids(&build_forest(&comments, 1)), vec![1]);
    }

    #[test]
    fn deep_chain_builds_without_recursion() {
        let depth = 50_000;
        let comments: Vec<Comment> = (1..=depth)
            .map(|id| comment(id, 1, if id == 1 { None } else { Some(id - 1) }, id))
            .collect();

        let forest = build_forest(&comments, 1);

        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].subtree_size(), depth as usize);
        drop(forest);
    }

    #[test]
    fn subtree_lists_descendants_before_ancestors() {
        let comments = vec![
            comment(1, 1, None, 0),
            comment(2, 1, Some(1), 1),
            comment(3, 1, Some(2), 2),
            comment(4, 1, Some(1), 3),
            comment(5, 1, None, 4),
        ];

        let order = collect_subtree(&comments, 1).unwrap();

        assert_eq!(order.len(), 4);
        assert_eq!(*order.last().unwrap(), 1);
        let pos = |id| order.iter().position(|&x| x == id).unwrap();
        assert!(pos(3) < pos(2));
        assert!(!order.contains(&5));
    }

    #[test]
    fn self_parent_is_reported_as_corruption() {
        let comments = vec![comment(1, 1, None, 0), comment(2, 1, Some(2), 1)];

        assert_eq!(collect_subtree(&comments, 2), Err(ThreadError::Corrupted(2)));
    }

    #[test]
    fn cycle_is_reported_as_corruption() {
        let comments = vec![comment(1, 1, Some(2), 0), comment(2, 1, Some(1), 1)];

        assert!(matches!(
            collect_subtree(&comments, 1),
            Err(ThreadError::Corrupted(_))
        ));
    }

    #[test]
    fn content_is_trimmed_and_bounded() {
        assert_eq!(validate_content("  hello \n").unwrap(), "hello");
        assert!(validate_content("   ").is_err());
        assert!(validate_content(&"x".repeat(1001)).is_err());
        assert!(validate_content(&format!("  {}  ", "é".repeat(1000))).is_ok());
    }
}
