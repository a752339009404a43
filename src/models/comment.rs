use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, ser::Error as _};
use validator::Validate;

/// Author attribution captured when a comment or post was written.
/// Later profile edits do not touch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSnapshot {
    pub id: i64,
    pub username: String,
    pub avatar: Option<String>,
}

/// A single comment record in the flat collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub author: AuthorSnapshot,
    pub content: String,

    /// `None` for top-level comments attached directly to the post.
    pub parent_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A comment together with its replies, newest first.
///
/// Threads can be arbitrarily deep, so dropping and rendering never recurse
/// per level. Use [`forest_to_json`] rather than a derived `Serialize`.
#[derive(Debug, PartialEq, Eq)]
pub struct CommentNode {
    pub comment: Comment,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.replies.iter());
        }
        count
    }
}

impl Drop for CommentNode {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.replies);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.replies);
        }
    }
}

enum Emit<'a> {
    Node(&'a CommentNode),
    Text(&'static str),
}

/// Renders a reply forest as a JSON array. Each node is its comment's fields
/// plus a `replies` array.
pub fn forest_to_json(forest: &[CommentNode]) -> serde_json::Result<String> {
    fn push_siblings<'a>(stack: &mut Vec<Emit<'a>>, nodes: &'a [CommentNode]) {
        for (i, node) in nodes.iter().enumerate().rev() {
            stack.push(Emit::Node(node));
            if i > 0 {
                stack.push(Emit::Text(","));
            }
        }
    }

    let mut out = String::from("[");
    let mut stack = vec![Emit::Text("]")];
    push_siblings(&mut stack, forest);

    while let Some(step) = stack.pop() {
        match step {
            Emit::Text(text) => out.push_str(text),
            Emit::Node(node) => {
                let fields = serde_json::to_string(&node.comment)?;
                let fields = fields.strip_suffix('}').ok_or_else(|| {
                    serde_json::Error::custom("comment did not serialize to an object")
                })?;
                out.push_str(fields);
                out.push_str(",\"replies\":[");
                stack.push(Emit::Text("]}"));
                push_siblings(&mut stack, &node.replies);
            }
        }
    }

    Ok(out)
}

/// Input for `CommentStore::create`.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i64,
    pub author_id: i64,
    pub content: String,
    pub parent_id: Option<i64>,
}

/// DTO for creating a new comment.
/// Content length is checked by the store after trimming.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[validate(range(min = 1, message = "Valid post ID is required"))]
    pub post_id: i64,

    pub content: String,

    /// Optional: the ID of the comment being replied to.
    #[validate(range(min = 1, message = "Parent ID must be a valid integer"))]
    pub parent_id: Option<i64>,
}

/// DTO for editing a comment's text.
#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}
