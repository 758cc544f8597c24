//! Post records
//!
//! A [`Post`] is either a root post or a reply; only its position in the tree
//! decides which. [`PostRecord`] holds the scalar fields shared by the nested
//! wire shape and the arena in [`crate::store`].
//!
//! JSON uses the field names the feed backend sends (`authorId`,
//! `createDate`, `likedByUser`, ...).

use crate::error::TreeError;
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};

/// Maximum post body length in characters, enforced by editors
pub const MAX_CONTENT_CHARS: usize = 160;

/// Opaque post identifier
///
/// Assigned by the backend on creation and never changed afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(String);

impl PostId {
    /// Create new id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get id as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if id is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for PostId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for PostId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PostId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PostId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Author identifier
///
/// The backend sends numeric ids, token claims may carry strings. Both
/// deserialize into the same textual form so `1` and `"1"` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct AuthorId(String);

impl AuthorId {
    /// Create new author id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get id as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for AuthorId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for AuthorId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for AuthorId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAuthorId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

impl<'de> Deserialize<'de> for AuthorId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RawAuthorId::deserialize(deserializer)? {
            RawAuthorId::Text(s) => Self(s),
            RawAuthorId::Signed(n) => Self(n.to_string()),
            RawAuthorId::Unsigned(n) => Self(n.to_string()),
        })
    }
}

/// Scalar fields of a post
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    /// Unique id across the whole tree
    pub id: PostId,
    /// Creating user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<AuthorId>,
    /// Author display name at creation time
    #[serde(default)]
    pub name: String,
    /// Author handle at creation time
    #[serde(default)]
    pub username: String,
    /// Body text
    #[serde(default)]
    pub content: String,
    /// Creation time, epoch milliseconds
    pub create_date: i64,
    /// Like counter
    #[serde(default)]
    pub likes: u64,
    /// Whether the requesting viewer liked this post
    #[serde(default)]
    pub liked_by_user: bool,
    /// Display-only repost counter
    #[serde(default)]
    pub retweets: u64,
}

impl PostRecord {
    /// Create record with id and creation time
    #[must_use]
    pub fn new(id: impl Into<PostId>, create_date: i64) -> Self {
        Self {
            id: id.into(),
            author_id: None,
            name: String::new(),
            username: String::new(),
            content: String::new(),
            create_date,
            likes: 0,
            liked_by_user: false,
            retweets: 0,
        }
    }

    /// With author snapshot
    #[must_use]
    pub fn with_author(
        mut self,
        author_id: impl Into<AuthorId>,
        name: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        self.author_id = Some(author_id.into());
        self.name = name.into();
        self.username = username.into();
        self
    }

    /// With body text
    #[inline]
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// With like counter
    #[inline]
    #[must_use]
    pub fn with_likes(mut self, likes: u64) -> Self {
        self.likes = likes;
        self
    }

    /// With viewer like flag
    #[inline]
    #[must_use]
    pub fn with_liked_by_user(mut self, liked: bool) -> Self {
        self.liked_by_user = liked;
        self
    }

    /// Check required fields
    ///
    /// # Errors
    /// Returns [`TreeError::MalformedInput`] when the id is empty
    pub fn validate(&self) -> Result<(), TreeError> {
        if self.id.is_empty() {
            return Err(TreeError::malformed(None, "empty post id"));
        }
        Ok(())
    }
}

/// Fields some payloads carry to point at a parent
///
/// Only read by [`crate::thread::is_root_post`]; tree position is what
/// actually makes a post a reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentHints {
    /// Explicit reply flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_reply: Option<bool>,
    /// Parent reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<PostId>,
    /// Parent reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<PostId>,
    /// Parent reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<PostId>,
    /// Parent reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_tweet_id: Option<PostId>,
}

impl ParentHints {
    /// Check if no hint points at a parent
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.is_reply.unwrap_or(false)
            && self.reply_to.is_none()
            && self.reply_to_id.is_none()
            && self.parent_id.is_none()
            && self.parent_tweet_id.is_none()
    }
}

/// A post with its nested replies
///
/// Nesting depth is unbounded. Cloning, comparing and dropping walk the tree
/// with an explicit stack; `Debug` and serde recurse once per level.
#[derive(Debug, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Scalar fields
    #[serde(flatten)]
    pub record: PostRecord,
    /// Replies in arrival order
    #[serde(default)]
    pub replies: Vec<Post>,
    #[serde(flatten)]
    hints: ParentHints,
}

impl Post {
    /// Create post without replies
    #[inline]
    #[must_use]
    pub fn new(record: PostRecord) -> Self {
        Self::from_parts(record, Vec::new())
    }

    /// Create post from record and replies
    #[inline]
    #[must_use]
    pub fn from_parts(record: PostRecord, replies: Vec<Post>) -> Self {
        Self {
            record,
            replies,
            hints: ParentHints::default(),
        }
    }

    /// Split into record and replies, dropping hints
    #[inline]
    #[must_use]
    pub fn into_parts(mut self) -> (PostRecord, Vec<Post>) {
        (
            std::mem::take(&mut self.record),
            std::mem::take(&mut self.replies),
        )
    }

    /// Get post id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &PostId {
        &self.record.id
    }

    /// Append reply
    #[inline]
    #[must_use]
    pub fn with_reply(mut self, reply: Post) -> Self {
        self.replies.push(reply);
        self
    }

    /// Get parent hints
    #[inline]
    #[must_use]
    pub fn hints(&self) -> &ParentHints {
        &self.hints
    }

    /// With parent hints
    #[inline]
    #[must_use]
    pub fn with_hints(mut self, hints: ParentHints) -> Self {
        self.hints = hints;
        self
    }

    /// Count this post and all descendants
    #[must_use]
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(post) = stack.pop() {
            count += 1;
            stack.extend(post.replies.iter());
        }
        count
    }

    /// Copy of the post's own fields, without replies
    fn shallow(&self) -> Self {
        Self {
            record: self.record.clone(),
            replies: Vec::with_capacity(self.replies.len()),
            hints: self.hints.clone(),
        }
    }
}

impl Clone for Post {
    fn clone(&self) -> Self {
        let tops: Vec<&Post> = self.replies.iter().collect();
        let mut copy = self.shallow();
        copy.replies = assemble(tops, |post| {
            Some((post.shallow(), post.replies.iter().collect()))
        });
        copy
    }
}

impl PartialEq for Post {
    fn eq(&self, other: &Self) -> bool {
        let mut stack = vec![(self, other)];
        while let Some((a, b)) = stack.pop() {
            if a.record != b.record || a.hints != b.hints || a.replies.len() != b.replies.len() {
                return false;
            }
            stack.extend(a.replies.iter().zip(&b.replies));
        }
        true
    }
}

impl Drop for Post {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.replies);
        while let Some(mut post) = pending.pop() {
            pending.append(&mut post.replies);
        }
    }
}

/// Build nested posts from keys without recursion
///
/// `open` turns a key into the post's own fields (no replies yet) and the
/// keys of its replies, or `None` to skip it. Posts are finished in
/// post-order and attached to their parent in key order.
pub(crate) fn assemble<K>(
    tops: Vec<K>,
    mut open: impl FnMut(K) -> Option<(Post, Vec<K>)>,
) -> Vec<Post> {
    struct Frame<K> {
        post: Post,
        pending: std::vec::IntoIter<K>,
    }

    let mut out = Vec::with_capacity(tops.len());
    let mut tops = tops.into_iter();
    let mut stack: Vec<Frame<K>> = Vec::new();

    loop {
        let next = match stack.last_mut() {
            Some(frame) => frame.pending.next(),
            None => match tops.next() {
                Some(key) => Some(key),
                None => break,
            },
        };

        match next {
            Some(key) => {
                if let Some((post, replies)) = open(key) {
                    stack.push(Frame {
                        post,
                        pending: replies.into_iter(),
                    });
                }
            }
            None => {
                if let Some(done) = stack.pop() {
                    match stack.last_mut() {
                        Some(parent) => parent.post.replies.push(done.post),
                        None => out.push(done.post),
                    }
                }
            }
        }
    }
    out
}

impl From<PostRecord> for Post {
    fn from(record: PostRecord) -> Self {
        Self::new(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_backend_shape() {
        let json = r#"{
            "id": "a",
            "authorId": 3,
            "retweets": 4,
            "content": "hello",
            "createDate": 100,
            "likes": 2,
            "replies": [{"id": "b", "createDate": 150, "likes": 5}],
            "name": "Murat Kaya",
            "username": "blue_hawk"
        }"#;
        let post: Post = serde_json::from_str(json).unwrap();

        assert_eq!(post.id().as_str(), "a");
        assert_eq!(post.record.author_id, Some(AuthorId::new("3")));
        assert_eq!(post.record.retweets, 4);
        assert!(!post.record.liked_by_user);
        assert_eq!(post.replies.len(), 1);
        assert_eq!(post.replies[0].record.likes, 5);
        assert!(post.hints().is_empty());
    }

    #[test]
    fn missing_replies_default_to_empty() {
        let post: Post = serde_json::from_str(r#"{"id": "x", "createDate": 1}"#).unwrap();
        assert!(post.replies.is_empty());
        assert_eq!(post.node_count(), 1);
    }

    #[test]
    fn numeric_and_string_author_ids_match() {
        let a: AuthorId = serde_json::from_str("7").unwrap();
        let b: AuthorId = serde_json::from_str("\"7\"").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, AuthorId::from(7));
    }

    #[test]
    fn parent_hints_are_read() {
        let post: Post =
            serde_json::from_str(r#"{"id": "r", "createDate": 1, "parentId": "a"}"#).unwrap();
        assert_eq!(post.hints().parent_id, Some(PostId::new("a")));
        assert!(!post.hints().is_empty());
    }

    #[test]
    fn false_reply_flag_is_not_a_hint() {
        let post: Post =
            serde_json::from_str(r#"{"id": "r", "createDate": 1, "isReply": false}"#).unwrap();
        assert!(post.hints().is_empty());
    }

    #[test]
    fn serializes_camel_case() {
        let post = Post::new(PostRecord::new("a", 10).with_liked_by_user(true));
        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(value["createDate"], 10);
        assert_eq!(value["likedByUser"], true);
        assert!(value.get("authorId").is_none());
        assert!(value.get("isReply").is_none());
    }

    #[test]
    fn empty_id_is_malformed() {
        let record = PostRecord::new("", 1);
        assert!(record.validate().unwrap_err().is_malformed());
    }

    #[test]
    fn node_count_includes_nested_replies() {
        let post = Post::new(PostRecord::new("a", 1)).with_reply(
            Post::new(PostRecord::new("b", 2)).with_reply(Post::new(PostRecord::new("c", 3))),
        );
        assert_eq!(post.node_count(), 3);
    }

    /// Single reply chain `n0 -> n1 -> ... -> n{depth-1}`
    fn chain(depth: usize, leaf_likes: u64) -> Post {
        let leaf = PostRecord::new(format!("n{}", depth - 1), 0).with_likes(leaf_likes);
        let mut post = Post::new(leaf);
        for i in (0..depth - 1).rev() {
            post = Post::new(PostRecord::new(format!("n{i}"), 0)).with_reply(post);
        }
        post
    }

    #[test]
    fn deep_chains_clone_compare_and_drop() {
        let post = chain(200_000, 0);
        let copy = post.clone();
        assert_eq!(copy.node_count(), 200_000);
        assert!(copy == post);
        assert!(chain(200_000, 1) != post);
    }

    #[test]
    fn assemble_keeps_key_order() {
        let source = Post::new(PostRecord::new("a", 1))
            .with_reply(
                Post::new(PostRecord::new("b", 2)).with_reply(Post::new(PostRecord::new("c", 3))),
            )
            .with_reply(Post::new(PostRecord::new("d", 4)));
        let copy = source.clone();
        let ids: Vec<&str> = copy.replies.iter().map(|p| p.id().as_str()).collect();
        assert_eq!(ids, vec!["b", "d"]);
        assert_eq!(copy.replies[0].replies[0].id().as_str(), "c");
        assert_eq!(copy.into_parts().1.len(), 2);
    }
}
