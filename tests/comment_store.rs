// tests/comment_store.rs

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use blog_api::models::comment::{AuthorSnapshot, Comment, CommentNode, NewComment, forest_to_json};
use blog_api::store::users::{ProfileChanges, UserStore};
use blog_api::store::{
    CollaboratorError, CommentStore, Identity, IdentityProvider, InMemoryCommentStore,
    PostRegistry, ThreadError,
};
use chrono::Utc;

/// Posts 1 and 2 exist.
struct FixedPosts;

#[async_trait]
impl PostRegistry for FixedPosts {
    async fn exists(&self, post_id: i64) -> Result<bool, CollaboratorError> {
        Ok(post_id == 1 || post_id == 2)
    }
}

/// Users 1..=3 exist.
struct FixedPeople;

#[async_trait]
impl IdentityProvider for FixedPeople {
    async fn resolve(&self, user_id: i64) -> Result<Option<Identity>, CollaboratorError> {
        Ok((1..=3).contains(&user_id).then(|| Identity {
            id: user_id,
            display_name: format!("user{user_id}"),
            avatar_url: None,
        }))
    }
}

struct SlowPosts;

#[async_trait]
impl PostRegistry for SlowPosts {
    async fn exists(&self, _post_id: i64) -> Result<bool, CollaboratorError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(true)
    }
}

/// Post 1 exists for the first lookup only, as if deleted right after.
struct VanishingPost {
    lookups: AtomicUsize,
}

#[async_trait]
impl PostRegistry for VanishingPost {
    async fn exists(&self, post_id: i64) -> Result<bool, CollaboratorError> {
        let seen = self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(post_id == 1 && seen == 0)
    }
}

struct BrokenPeople;

#[async_trait]
impl IdentityProvider for BrokenPeople {
    async fn resolve(&self, _user_id: i64) -> Result<Option<Identity>, CollaboratorError> {
        Err(CollaboratorError("connection refused".to_string()))
    }
}

fn store() -> InMemoryCommentStore {
    InMemoryCommentStore::new(
        Arc::new(FixedPosts),
        Arc::new(FixedPeople),
        Duration::from_secs(1),
    )
}

fn new_comment(post_id: i64, author_id: i64, parent_id: Option<i64>) -> NewComment {
    NewComment {
        post_id,
        author_id,
        content: "a reply".to_string(),
        parent_id,
    }
}

fn ids(nodes: &[CommentNode]) -> Vec<i64> {
    nodes.iter().map(|n| n.comment.id).collect()
}

/// Every node of the forest, paired with the id of its parent node.
fn flatten(forest: &[CommentNode]) -> Vec<(Option<i64>, &Comment)> {
    let mut out = Vec::new();
    let mut stack: Vec<(Option<i64>, &CommentNode)> = forest.iter().map(|n| (None, n)).collect();
    while let Some((parent, node)) = stack.pop() {
        out.push((parent, &node.comment));
        stack.extend(node.replies.iter().map(|r| (Some(node.comment.id), r)));
    }
    out
}

#[tokio::test]
async fn reply_chain_lists_as_nested_path_and_deletes_as_one() {
    let store = store();
    let c1 = store.create(new_comment(1, 1, None)).await.unwrap();
    let c2 = store.create(new_comment(1, 1, Some(c1.id))).await.unwrap();
    let c3 = store.create(new_comment(1, 1, Some(c2.id))).await.unwrap();

    let forest = store.list(1).await.unwrap();
    assert_eq!(ids(&forest), vec![c1.id]);
    assert_eq!(ids(&forest[0].replies), vec![c2.id]);
    assert_eq!(ids(&forest[0].replies[0].replies), vec![c3.id]);

    let removed = store.delete(c1.id, 1).await.unwrap();

    assert_eq!(removed, 3);
    assert!(store.list(1).await.unwrap().is_empty());
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn forest_links_match_parent_ids_and_stay_on_one_post() {
    let store = store();
    let a = store.create(new_comment(1, 1, None)).await.unwrap();
    let b = store.create(new_comment(1, 2, None)).await.unwrap();
    store.create(new_comment(1, 3, Some(a.id))).await.unwrap();
    store.create(new_comment(1, 1, Some(b.id))).await.unwrap();
    let other = store.create(new_comment(2, 1, None)).await.unwrap();
    store.create(new_comment(2, 2, Some(other.id))).await.unwrap();

    let forest = store.list(1).await.unwrap();
    let nodes = flatten(&forest);

    assert_eq!(nodes.len(), 4);
    for (parent, comment) in nodes {
        assert_eq!(comment.post_id, 1);
        assert_eq!(comment.parent_id, parent);
    }
}

#[tokio::test]
async fn newest_comments_come_first_at_every_level() {
    let store = store();
    let root = store.create(new_comment(1, 1, None)).await.unwrap();
    let first = store.create(new_comment(1, 1, Some(root.id))).await.unwrap();
    let second = store.create(new_comment(1, 1, Some(root.id))).await.unwrap();
    let later_root = store.create(new_comment(1, 1, None)).await.unwrap();

    let forest = store.list(1).await.unwrap();

    assert_eq!(ids(&forest), vec![later_root.id, root.id]);
    assert_eq!(ids(&forest[1].replies), vec![second.id, first.id]);
    for pair in forest[1].replies.windows(2) {
        assert!(pair[0].comment.created_at >= pair[1].comment.created_at);
    }
}

#[tokio::test]
async fn listing_twice_yields_the_same_forest() {
    let store = store();
    let root = store.create(new_comment(1, 1, None)).await.unwrap();
    store.create(new_comment(1, 2, Some(root.id))).await.unwrap();

    assert_eq!(store.list(1).await.unwrap(), store.list(1).await.unwrap());
}

#[tokio::test]
async fn missing_parent_is_not_found_and_appends_nothing() {
    let store = store();
    store.create(new_comment(1, 1, None)).await.unwrap();

    let err = store.create(new_comment(1, 1, Some(99))).await.unwrap_err();

    assert_eq!(err, ThreadError::ParentNotFound(99));
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn parent_on_another_post_is_rejected() {
    let store = store();
    let foreign = store.create(new_comment(2, 1, None)).await.unwrap();

    let err = store
        .create(new_comment(1, 1, Some(foreign.id)))
        .await
        .unwrap_err();

    assert_eq!(err, ThreadError::ParentNotFound(foreign.id));
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn unknown_post_is_not_found() {
    let store = store();

    assert_eq!(store.list(7).await.unwrap_err(), ThreadError::PostNotFound(7));
    assert_eq!(
        store.create(new_comment(7, 1, None)).await.unwrap_err(),
        ThreadError::PostNotFound(7)
    );
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn unknown_author_is_not_found() {
    let store = store();

    let err = store.create(new_comment(1, 42, None)).await.unwrap_err();

    assert_eq!(err, ThreadError::AuthorNotFound(42));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn content_is_trimmed_and_length_checked() {
    let store = store();

    let mut blank = new_comment(1, 1, None);
    blank.content = "   \n\t ".to_string();
    assert!(matches!(
        store.create(blank).await,
        Err(ThreadError::InvalidContent(_))
    ));

    let mut long = new_comment(1, 1, None);
    long.content = "x".repeat(1001);
    assert!(matches!(
        store.create(long).await,
        Err(ThreadError::InvalidContent(_))
    ));

    let mut padded = new_comment(1, 1, None);
    padded.content = format!("  {}  ", "x".repeat(1000));
    let created = store.create(padded).await.unwrap();
    assert_eq!(created.content.len(), 1000);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn update_touches_only_content_and_updated_at() {
    let store = store();
    let root = store.create(new_comment(1, 1, None)).await.unwrap();
    let reply = store.create(new_comment(1, 2, Some(root.id))).await.unwrap();

    let updated = store.update(reply.id, 2, "  edited  ").await.unwrap();

    assert_eq!(updated.content, "edited");
    assert!(updated.updated_at >= reply.updated_at);
    assert_eq!(updated.id, reply.id);
    assert_eq!(updated.post_id, reply.post_id);
    assert_eq!(updated.author_id, reply.author_id);
    assert_eq!(updated.parent_id, reply.parent_id);
    assert_eq!(updated.created_at, reply.created_at);
    assert_eq!(store.get(reply.id).await.unwrap(), updated);
}

#[tokio::test]
async fn update_validates_existence_ownership_then_content() {
    let store = store();
    let comment = store.create(new_comment(1, 1, None)).await.unwrap();

    assert_eq!(
        store.update(99, 1, "text").await.unwrap_err(),
        ThreadError::CommentNotFound(99)
    );
    assert_eq!(
        store.update(comment.id, 2, "").await.unwrap_err(),
        ThreadError::Forbidden {
            comment_id: comment.id,
            user_id: 2
        }
    );
    assert!(matches!(
        store.update(comment.id, 1, " ").await,
        Err(ThreadError::InvalidContent(_))
    ));
    assert_eq!(store.get(comment.id).await.unwrap(), comment);
}

#[tokio::test]
async fn non_author_cannot_delete() {
    let store = store();
    let root = store.create(new_comment(1, 1, None)).await.unwrap();
    store.create(new_comment(1, 2, Some(root.id))).await.unwrap();
    let before = store.list(1).await.unwrap();

    let err = store.delete(root.id, 2).await.unwrap_err();

    assert!(matches!(err, ThreadError::Forbidden { .. }));
    assert_eq!(store.list(1).await.unwrap(), before);
    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn deleting_a_comment_takes_replies_by_other_authors_with_it() {
    let store = store();
    let root = store.create(new_comment(1, 1, None)).await.unwrap();
    let by_two = store.create(new_comment(1, 2, Some(root.id))).await.unwrap();
    store.create(new_comment(1, 3, Some(by_two.id))).await.unwrap();
    store.create(new_comment(1, 3, Some(root.id))).await.unwrap();
    let sibling = store.create(new_comment(1, 2, None)).await.unwrap();

    // Four records: the root plus three descendants, two of them not by user 1.
    let removed = store.delete(root.id, 1).await.unwrap();

    assert_eq!(removed, 4);
    let forest = store.list(1).await.unwrap();
    assert_eq!(ids(&forest), vec![sibling.id]);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn deleting_a_reply_keeps_its_ancestors() {
    let store = store();
    let root = store.create(new_comment(1, 1, None)).await.unwrap();
    let reply = store.create(new_comment(1, 2, Some(root.id))).await.unwrap();
    store.create(new_comment(1, 1, Some(reply.id))).await.unwrap();

    assert_eq!(store.delete(reply.id, 2).await.unwrap(), 2);

    let forest = store.list(1).await.unwrap();
    assert_eq!(ids(&forest), vec![root.id]);
    assert!(forest[0].replies.is_empty());
}

#[tokio::test]
async fn missing_comment_cannot_be_deleted() {
    let store = store();

    assert_eq!(
        store.delete(5, 1).await.unwrap_err(),
        ThreadError::CommentNotFound(5)
    );
}

#[tokio::test]
async fn self_referencing_record_aborts_delete() {
    let now = Utc::now();
    let record = |id: i64, parent_id: Option<i64>| Comment {
        id,
        post_id: 1,
        author_id: 1,
        author: AuthorSnapshot {
            id: 1,
            username: "user1".to_string(),
            avatar: None,
        },
        content: "seeded".to_string(),
        parent_id,
        created_at: now,
        updated_at: now,
    };
    let store = InMemoryCommentStore::with_comments(
        vec![record(1, None), record(2, Some(1)), record(3, Some(3))],
        Arc::new(FixedPosts),
        Arc::new(FixedPeople),
        Duration::from_secs(1),
    );

    assert_eq!(
        store.delete(3, 1).await.unwrap_err(),
        ThreadError::Corrupted(3)
    );
    assert_eq!(store.len().await, 3);

    // The healthy part of the thread is unaffected and ids continue after the seed.
    assert_eq!(store.delete(1, 1).await.unwrap(), 2);
    let next = store.create(new_comment(1, 1, None)).await.unwrap();
    assert_eq!(next.id, 4);
}

#[tokio::test]
async fn ids_are_never_reused() {
    let store = store();
    let first = store.create(new_comment(1, 1, None)).await.unwrap();
    store.delete(first.id, 1).await.unwrap();

    let second = store.create(new_comment(1, 1, None)).await.unwrap();

    assert!(second.id > first.id);
}

#[tokio::test]
async fn slow_post_lookup_is_unavailable() {
    let store = InMemoryCommentStore::new(
        Arc::new(SlowPosts),
        Arc::new(FixedPeople),
        Duration::from_millis(20),
    );

    assert!(matches!(
        store.list(1).await,
        Err(ThreadError::Unavailable(_))
    ));
    assert!(matches!(
        store.create(new_comment(1, 1, None)).await,
        Err(ThreadError::Unavailable(_))
    ));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn failing_identity_lookup_is_unavailable() {
    let store = InMemoryCommentStore::new(
        Arc::new(FixedPosts),
        Arc::new(BrokenPeople),
        Duration::from_secs(1),
    );

    assert!(matches!(
        store.create(new_comment(1, 1, None)).await,
        Err(ThreadError::Unavailable(_))
    ));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn author_snapshot_survives_profile_changes() {
    let users = Arc::new(UserStore::new());
    let user = users
        .insert("original", "original@example.com", "hash".to_string())
        .await
        .unwrap();
    let store = InMemoryCommentStore::new(
        Arc::new(FixedPosts),
        users.clone(),
        Duration::from_secs(1),
    );

    let comment = store.create(new_comment(1, user.id, None)).await.unwrap();
    users
        .update_profile(
            user.id,
            ProfileChanges {
                username: Some("renamed".to_string()),
                avatar: Some("https://example.com/a.png".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let forest = store.list(1).await.unwrap();
    assert_eq!(comment.author.username, "original");
    assert_eq!(forest[0].comment.author.username, "original");
    assert_eq!(forest[0].comment.author.avatar, None);
}

#[tokio::test]
async fn concurrent_creates_get_distinct_ids() {
    let store = Arc::new(store());
    let root = store.create(new_comment(1, 1, None)).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..32 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .create(new_comment(1, 1 + i % 3, Some(root.id)))
                .await
                .unwrap()
                .id
        }));
    }

    let mut seen = HashSet::new();
    for handle in handles {
        assert!(seen.insert(handle.await.unwrap()));
    }
    let forest = store.list(1).await.unwrap();
    assert_eq!(forest[0].replies.len(), 32);
}

#[tokio::test]
async fn removing_a_post_drops_only_its_comments() {
    let store = store();
    let root = store.create(new_comment(1, 1, None)).await.unwrap();
    store.create(new_comment(1, 2, Some(root.id))).await.unwrap();
    store.create(new_comment(2, 1, None)).await.unwrap();

    assert_eq!(store.remove_post(1).await, 2);
    assert_eq!(store.len().await, 1);
    assert_eq!(store.list(2).await.unwrap().len(), 1);
}

#[tokio::test]
async fn post_deleted_during_create_gets_no_comment() {
    let store = InMemoryCommentStore::new(
        Arc::new(VanishingPost {
            lookups: AtomicUsize::new(0),
        }),
        Arc::new(FixedPeople),
        Duration::from_secs(1),
    );

    assert_eq!(
        store.create(new_comment(1, 1, None)).await.unwrap_err(),
        ThreadError::PostNotFound(1)
    );
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn deep_reply_chain_lists_renders_and_drops() {
    let depth: i64 = 50_000;
    let now = Utc::now();
    let chain: Vec<Comment> = (1..=depth)
        .map(|id| Comment {
            id,
            post_id: 1,
            author_id: 1,
            author: AuthorSnapshot {
                id: 1,
                username: "user1".to_string(),
                avatar: None,
            },
            content: "deeper".to_string(),
            parent_id: (id > 1).then(|| id - 1),
            created_at: now,
            updated_at: now,
        })
        .collect();
    let store = InMemoryCommentStore::with_comments(
        chain,
        Arc::new(FixedPosts),
        Arc::new(FixedPeople),
        Duration::from_secs(1),
    );

    let forest = store.list(1).await.unwrap();
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].subtree_size(), depth as usize);

    let json = forest_to_json(&forest).unwrap();
    assert_eq!(json.matches("\"replies\":[").count(), depth as usize);
    drop(forest);

    assert_eq!(store.delete(1, 1).await.unwrap(), depth as usize);
    assert!(store.is_empty().await);
}
