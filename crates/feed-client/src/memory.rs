//! In-memory backend
//!
//! [`MemoryTransport`] behaves like a small feed server: it keeps nested
//! posts, assigns ids and timestamps, tracks likes per viewer and refuses
//! deletes from anyone but the author. Useful for tests and offline demos.

use crate::error::TransportError;
use crate::transport::Transport;
use async_trait::async_trait;
use chrono::Utc;
use feed_tree::search::{count_nodes, find_by_id, find_by_id_mut, remove_by_id};
use feed_tree::{is_owner, Identity, Post, PostId, PostRecord};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Backend {
    posts: Vec<Post>,
    likes: HashMap<String, HashSet<PostId>>,
    viewer: Option<Identity>,
    last_date: i64,
}

impl Backend {
    fn viewer(&self) -> Result<&Identity, TransportError> {
        self.viewer.as_ref().ok_or(TransportError::Unauthorized)
    }

    fn viewer_key(&self) -> Result<String, TransportError> {
        let viewer = self.viewer()?;
        viewer
            .subject_id
            .as_ref()
            .map(|id| id.as_str().to_string())
            .or_else(|| viewer.handle.clone())
            .ok_or(TransportError::Unauthorized)
    }

    /// Strictly increasing millisecond timestamps
    fn next_date(&mut self) -> i64 {
        let now = Utc::now().timestamp_millis();
        self.last_date = now.max(self.last_date + 1);
        self.last_date
    }

    fn new_post(&mut self, content: &str) -> Result<Post, TransportError> {
        let viewer = self.viewer()?.clone();
        let date = self.next_date();
        let mut record = PostRecord::new(Uuid::new_v4().to_string(), date).with_content(content);
        record.author_id = viewer.subject_id.clone();
        record.username = viewer.handle.clone().unwrap_or_default();
        record.name = viewer.display_name.clone().unwrap_or_default();
        Ok(Post::new(record))
    }

    /// Copy of `post` with `liked_by_user` set for the current viewer
    fn decorate(&self, post: &Post) -> Post {
        let liked = self
            .viewer_key()
            .ok()
            .and_then(|key| self.likes.get(&key));
        let mut copy = post.clone();
        mark_liked(&mut copy, liked);
        copy
    }
}

fn mark_liked(post: &mut Post, liked: Option<&HashSet<PostId>>) {
    let mut stack = vec![post];
    while let Some(post) = stack.pop() {
        post.record.liked_by_user = liked.is_some_and(|set| set.contains(post.id()));
        stack.extend(post.replies.iter_mut());
    }
}

/// Ids of `post` and every reply below it
fn subtree_ids(post: &Post) -> Vec<PostId> {
    let mut ids = Vec::new();
    let mut stack = vec![post];
    while let Some(post) = stack.pop() {
        ids.push(post.id().clone());
        stack.extend(post.replies.iter());
    }
    ids
}

/// Backend held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryTransport {
    backend: Mutex<Backend>,
}

impl MemoryTransport {
    /// Create empty backend with no viewer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With seeded posts
    #[must_use]
    pub fn with_posts(self, posts: Vec<Post>) -> Self {
        {
            let mut backend = self.backend.lock();
            backend.last_date = posts
                .iter()
                .map(|post| post.record.create_date)
                .max()
                .unwrap_or(0);
            backend.posts = posts;
        }
        self
    }

    /// With requesting viewer
    #[must_use]
    pub fn with_viewer(self, viewer: Identity) -> Self {
        self.set_viewer(Some(viewer));
        self
    }

    /// Switch the requesting viewer
    pub fn set_viewer(&self, viewer: Option<Identity>) {
        self.backend.lock().viewer = viewer;
    }

    /// Number of posts stored, replies included
    #[must_use]
    pub fn post_count(&self) -> usize {
        count_nodes(&self.backend.lock().posts)
    }

    /// Likes recorded across all viewers
    #[must_use]
    pub fn like_count(&self) -> usize {
        self.backend.lock().likes.values().map(HashSet::len).sum()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn list_posts(&self) -> Result<Vec<Post>, TransportError> {
        let backend = self.backend.lock();
        Ok(backend.posts.iter().map(|post| backend.decorate(post)).collect())
    }

    async fn create_post(&self, content: &str) -> Result<Post, TransportError> {
        let mut backend = self.backend.lock();
        let post = backend.new_post(content)?;
        debug!(id = %post.id(), "stored post");
        backend.posts.push(post.clone());
        Ok(post)
    }

    async fn create_reply(&self, parent_id: &str, content: &str) -> Result<Post, TransportError> {
        let mut backend = self.backend.lock();
        if find_by_id(&backend.posts, parent_id).is_none() {
            return Err(TransportError::NotFound(parent_id.to_string()));
        }
        let reply = backend.new_post(content)?;
        let parent = find_by_id_mut(&mut backend.posts, parent_id)
            .ok_or_else(|| TransportError::NotFound(parent_id.to_string()))?;
        parent.replies.push(reply.clone());
        debug!(id = %reply.id(), parent = parent_id, "stored reply");
        Ok(reply)
    }

    async fn like(&self, id: &str) -> Result<(), TransportError> {
        let mut backend = self.backend.lock();
        let key = backend.viewer_key()?;
        if find_by_id(&backend.posts, id).is_none() {
            return Err(TransportError::NotFound(id.to_string()));
        }
        if !backend.likes.entry(key).or_default().insert(PostId::new(id)) {
            return Ok(());
        }
        if let Some(post) = find_by_id_mut(&mut backend.posts, id) {
            post.record.likes = post.record.likes.saturating_add(1);
        }
        Ok(())
    }

    async fn unlike(&self, id: &str) -> Result<(), TransportError> {
        let mut backend = self.backend.lock();
        let key = backend.viewer_key()?;
        if find_by_id(&backend.posts, id).is_none() {
            return Err(TransportError::NotFound(id.to_string()));
        }
        let removed = backend
            .likes
            .get_mut(&key)
            .is_some_and(|set| set.remove(id));
        if removed {
            if let Some(post) = find_by_id_mut(&mut backend.posts, id) {
                post.record.likes = post.record.likes.saturating_sub(1);
            }
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), TransportError> {
        let mut backend = self.backend.lock();
        let viewer = backend.viewer()?.clone();
        let post = find_by_id(&backend.posts, id)
            .ok_or_else(|| TransportError::NotFound(id.to_string()))?;
        if !is_owner(Some(&viewer), &post.record) {
            return Err(TransportError::rejected(403, "only the author can delete a post"));
        }
        let gone = subtree_ids(post);

        let (posts, _) = remove_by_id(std::mem::take(&mut backend.posts), id);
        backend.posts = posts;
        for liked in backend.likes.values_mut() {
            for removed in &gone {
                liked.remove(removed);
            }
        }
        backend.likes.retain(|_, liked| !liked.is_empty());
        debug!(id, removed = gone.len(), "deleted post");
        Ok(())
    }

    async fn get_post(&self, id: &str) -> Result<Post, TransportError> {
        let backend = self.backend.lock();
        find_by_id(&backend.posts, id)
            .map(|post| backend.decorate(post))
            .ok_or_else(|| TransportError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewer(subject: u64, handle: &str) -> Identity {
        Identity::new().with_subject(subject).with_handle(handle)
    }

    #[tokio::test]
    async fn assigns_ids_and_increasing_dates() {
        let transport = MemoryTransport::new().with_viewer(viewer(1, "chaotic_orange"));
        let first = transport.create_post("one").await.unwrap();
        let second = transport.create_post("two").await.unwrap();

        assert_ne!(first.id(), second.id());
        assert!(second.record.create_date > first.record.create_date);
        assert_eq!(first.record.username, "chaotic_orange");
    }

    #[tokio::test]
    async fn likes_are_per_viewer() {
        let transport = MemoryTransport::new().with_viewer(viewer(1, "chaotic_orange"));
        let post = transport.create_post("hello").await.unwrap();
        let id = post.id().as_str();

        transport.like(id).await.unwrap();
        transport.like(id).await.unwrap();
        assert_eq!(transport.get_post(id).await.unwrap().record.likes, 1);

        transport.set_viewer(Some(viewer(2, "sunny_rose")));
        let seen = transport.get_post(id).await.unwrap();
        assert!(!seen.record.liked_by_user);
        transport.unlike(id).await.unwrap();
        assert_eq!(transport.get_post(id).await.unwrap().record.likes, 1);
    }

    #[tokio::test]
    async fn only_author_deletes() {
        let transport = MemoryTransport::new().with_viewer(viewer(1, "chaotic_orange"));
        let post = transport.create_post("mine").await.unwrap();

        transport.set_viewer(Some(viewer(2, "sunny_rose")));
        let err = transport.delete(post.id().as_str()).await.unwrap_err();
        assert_eq!(err, TransportError::rejected(403, "only the author can delete a post"));

        transport.set_viewer(Some(viewer(1, "chaotic_orange")));
        transport.delete(post.id().as_str()).await.unwrap();
        assert_eq!(transport.post_count(), 0);
    }

    #[tokio::test]
    async fn anonymous_cannot_write() {
        let transport = MemoryTransport::new();
        assert_eq!(
            transport.create_post("x").await.unwrap_err(),
            TransportError::Unauthorized
        );
        assert!(transport.list_posts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_forgets_likes_on_removed_subtree() {
        let transport = MemoryTransport::new().with_viewer(viewer(1, "chaotic_orange"));
        let root = transport.create_post("root").await.unwrap();
        let reply = transport.create_reply(root.id().as_str(), "reply").await.unwrap();
        let keep = transport.create_post("keep").await.unwrap();

        transport.like(reply.id().as_str()).await.unwrap();
        transport.like(keep.id().as_str()).await.unwrap();
        transport.set_viewer(Some(viewer(2, "sunny_rose")));
        transport.like(root.id().as_str()).await.unwrap();
        assert_eq!(transport.like_count(), 3);

        transport.set_viewer(Some(viewer(1, "chaotic_orange")));
        transport.delete(root.id().as_str()).await.unwrap();
        assert_eq!(transport.like_count(), 1);
        assert!(transport.get_post(keep.id().as_str()).await.unwrap().record.liked_by_user);
    }

    #[tokio::test]
    async fn marks_likes_along_deep_chains() {
        let mut top = Post::new(PostRecord::new("n9999", 9_999));
        for i in (0..9_999).rev() {
            top = Post::new(PostRecord::new(format!("n{i}"), i)).with_reply(top);
        }
        let transport = MemoryTransport::new()
            .with_posts(vec![top])
            .with_viewer(viewer(1, "chaotic_orange"));

        transport.like("n9999").await.unwrap();
        let listed = transport.list_posts().await.unwrap();
        assert_eq!(count_nodes(&listed), 10_000);
        assert!(transport.get_post("n9999").await.unwrap().record.liked_by_user);
        assert!(!transport.get_post("n0").await.unwrap().record.liked_by_user);
    }
}
