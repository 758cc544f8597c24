//! Canonical post store
//!
//! Provides [`TreeStore`], the single owner of the feed's posts.
//!
//! Posts live in an arena keyed by id. Each node keeps its parent id and the
//! ordered ids of its replies, so "find anywhere" is a map lookup and a
//! mutation touches exactly one node. The nested [`Post`] shape is rebuilt on
//! demand via [`TreeStore::subtree`] and [`TreeStore::to_tree`].
//!
//! Root order is newest first and is re-established on every load and root
//! insert. Replies keep arrival order; ordering for display is the job of
//! [`crate::view`].

use crate::error::TreeError;
use crate::post::{self, Post, PostId, PostRecord};
use crate::thread::ThreadContext;
use crate::view::{self, FeedEntry, ViewMode};
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    record: PostRecord,
    parent: Option<PostId>,
    children: Vec<PostId>,
}

/// Arena of posts with ordered roots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeStore {
    nodes: HashMap<PostId, Node>,
    roots: Vec<PostId>,
}

impl TreeStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole store with `posts`
    ///
    /// Nothing is merged with the previous state. Roots are ordered newest
    /// first.
    ///
    /// # Errors
    /// Returns [`TreeError::MalformedInput`] if a post has an empty id or an
    /// id repeats anywhere in the input; the store is left unchanged.
    pub fn load(&mut self, posts: Vec<Post>) -> Result<(), TreeError> {
        let mut staged = Self::new();
        staged.admit(&posts)?;
        for post in posts {
            staged.ingest(post, None);
        }
        staged.sort_roots();

        debug!(roots = staged.roots.len(), nodes = staged.nodes.len(), "loaded posts");
        *self = staged;
        Ok(())
    }

    /// Add a new root post
    ///
    /// Any replies the post already carries are ingested with it.
    ///
    /// # Errors
    /// Returns [`TreeError::MalformedInput`] if an id is empty or already in
    /// the store.
    pub fn insert_root(&mut self, post: Post) -> Result<(), TreeError> {
        self.admit(std::slice::from_ref(&post))?;
        let id = self.ingest(post, None);
        self.sort_roots();
        debug!(%id, "inserted root post");
        Ok(())
    }

    /// Append reply under `parent_id`
    ///
    /// Returns `Ok(false)` without changes when the parent is not in the
    /// store.
    ///
    /// # Errors
    /// Returns [`TreeError::MalformedInput`] if an id is empty or already in
    /// the store.
    pub fn insert_reply(&mut self, parent_id: &str, reply: Post) -> Result<bool, TreeError> {
        let Some(parent) = self.nodes.get(parent_id).map(|n| n.record.id.clone()) else {
            debug!(parent = parent_id, "reply parent not in tree");
            return Ok(false);
        };
        self.admit(std::slice::from_ref(&reply))?;
        let id = self.ingest(reply, Some(parent.clone()));
        debug!(%id, %parent, "inserted reply");
        Ok(true)
    }

    /// Record a like from the viewer
    ///
    /// Returns whether anything changed: unknown ids and posts the viewer
    /// already liked are left alone.
    pub fn like(&mut self, id: &str) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) if !node.record.liked_by_user => {
                node.record.likes = node.record.likes.saturating_add(1);
                node.record.liked_by_user = true;
                debug!(id, likes = node.record.likes, "liked post");
                true
            }
            Some(_) => {
                trace!(id, "post already liked");
                false
            }
            None => {
                debug!(id, "like target not in tree");
                false
            }
        }
    }

    /// Withdraw the viewer's like
    ///
    /// Returns whether anything changed. Only a post the viewer liked can be
    /// unliked, and the counter never goes below zero.
    pub fn unlike(&mut self, id: &str) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) if node.record.liked_by_user => {
                node.record.likes = node.record.likes.saturating_sub(1);
                node.record.liked_by_user = false;
                debug!(id, likes = node.record.likes, "unliked post");
                true
            }
            Some(_) => {
                trace!(id, "post not liked");
                false
            }
            None => {
                debug!(id, "unlike target not in tree");
                false
            }
        }
    }

    /// Remove post and its whole reply subtree
    ///
    /// Returns whether a post was removed.
    pub fn delete_by_id(&mut self, id: &str) -> bool {
        let Some(node) = self.nodes.remove(id) else {
            debug!(id, "delete target not in tree");
            return false;
        };

        match &node.parent {
            Some(parent) => {
                if let Some(parent) = self.nodes.get_mut(parent) {
                    parent.children.retain(|child| child.as_str() != id);
                }
            }
            None => self.roots.retain(|root| root.as_str() != id),
        }

        let mut removed = 1usize;
        let mut pending = node.children;
        while let Some(child) = pending.pop() {
            if let Some(child) = self.nodes.remove(&child) {
                removed += 1;
                pending.extend(child.children);
            }
        }

        debug!(id, removed, "deleted post");
        true
    }

    /// Get post fields by id
    #[inline]
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&PostRecord> {
        self.nodes.get(id).map(|node| &node.record)
    }

    /// Check if post is in the store
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Total number of posts
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Root ids, newest first
    #[inline]
    #[must_use]
    pub fn roots(&self) -> &[PostId] {
        &self.roots
    }

    /// Reply ids of a post in arrival order
    #[must_use]
    pub fn children(&self, id: &str) -> &[PostId] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Parent id of a post, `None` for roots and unknown ids
    #[must_use]
    pub fn parent_of(&self, id: &str) -> Option<&PostId> {
        self.nodes.get(id).and_then(|node| node.parent.as_ref())
    }

    /// Rebuild a post with its nested replies
    #[must_use]
    pub fn subtree(&self, id: &str) -> Option<Post> {
        let node = self.nodes.get(id)?;
        let mut post = Post::new(node.record.clone());
        post.replies = self.assemble(node.children.iter().collect());
        Some(post)
    }

    /// Rebuild the nested tree in store order
    #[must_use]
    pub fn to_tree(&self) -> Vec<Post> {
        self.assemble(self.roots.iter().collect())
    }

    /// Flatten the arena in pre-order
    ///
    /// Yields the same sequence as [`view::flatten`] over [`Self::to_tree`].
    #[must_use]
    pub fn flatten(&self) -> Vec<FeedEntry> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(&PostId, usize)> = self.roots.iter().rev().map(|id| (id, 0)).collect();

        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            out.push(FeedEntry::new(node.record.clone(), depth, node.children.len()));
            stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
        }
        out
    }

    /// Project the store into `mode`
    #[must_use]
    pub fn view(&self, mode: ViewMode) -> Vec<FeedEntry> {
        view::select(self.flatten(), mode)
    }

    /// Thread context for a detail page
    ///
    /// `external` replaces the local copy of the target when supplied; it
    /// must carry `id`, otherwise there is no context. The parent comes from
    /// the arena's parent link.
    #[must_use]
    pub fn thread_context(&self, id: &str, external: Option<Post>) -> Option<ThreadContext> {
        let target = match external {
            Some(post) if post.id().as_str() == id => post,
            Some(post) => {
                debug!(id, fetched = %post.id(), "fetched post does not match thread id");
                return None;
            }
            None => self.subtree(id)?,
        };
        let parent = self
            .parent_of(id)
            .and_then(|parent| self.subtree(parent.as_str()));
        Some(ThreadContext::new(target, parent))
    }

    /// Best-effort root classification, see [`crate::thread::is_root_post`]
    #[must_use]
    pub fn is_root_post(&self, post: &Post) -> bool {
        if !post.hints().is_empty() {
            return false;
        }
        self.is_empty()
            || self
                .nodes
                .get(post.id().as_str())
                .is_some_and(|node| node.parent.is_none())
    }

    /// Root posts written by `username`, in store order
    #[must_use]
    pub fn posts_by_username(&self, username: &str) -> Vec<Post> {
        self.roots_where(|record| record.username == username)
    }

    /// Root posts the viewer liked, in store order
    #[must_use]
    pub fn liked_posts(&self) -> Vec<Post> {
        self.roots_where(|record| record.liked_by_user)
    }

    fn roots_where(&self, keep: impl Fn(&PostRecord) -> bool) -> Vec<Post> {
        self.roots
            .iter()
            .filter(|id| self.get(id.as_str()).is_some_and(&keep))
            .filter_map(|id| self.subtree(id.as_str()))
            .collect()
    }

    fn assemble<'a>(&'a self, ids: Vec<&'a PostId>) -> Vec<Post> {
        post::assemble(ids, |id| {
            self.nodes
                .get(id)
                .map(|node| (Post::new(node.record.clone()), node.children.iter().collect()))
        })
    }

    /// Check that `posts` can enter the store without breaking id uniqueness
    fn admit(&self, posts: &[Post]) -> Result<(), TreeError> {
        let mut seen: HashSet<&PostId> = HashSet::new();
        let mut stack: Vec<&Post> = posts.iter().collect();

        while let Some(post) = stack.pop() {
            post.record.validate()?;
            let id = post.id();
            if self.nodes.contains_key(id) || !seen.insert(id) {
                return Err(TreeError::malformed(Some(id.clone()), "duplicate post id"));
            }
            stack.extend(post.replies.iter());
        }
        Ok(())
    }

    /// Insert an admitted post and its replies
    fn ingest(&mut self, post: Post, parent: Option<PostId>) -> PostId {
        let top = post.id().clone();
        let mut pending = vec![(post, parent)];

        while let Some((post, parent)) = pending.pop() {
            let (record, replies) = post.into_parts();
            let id = record.id.clone();

            match &parent {
                Some(parent) => {
                    if let Some(node) = self.nodes.get_mut(parent) {
                        node.children.push(id.clone());
                    }
                }
                None => self.roots.push(id.clone()),
            }
            self.nodes.insert(
                id.clone(),
                Node {
                    record,
                    parent,
                    children: Vec::with_capacity(replies.len()),
                },
            );

            // reversed so replies are attached in arrival order
            pending.extend(replies.into_iter().rev().map(|reply| (reply, Some(id.clone()))));
        }
        top
    }

    fn sort_roots(&mut self) {
        let nodes = &self.nodes;
        self.roots.sort_by_key(|id| {
            Reverse(nodes.get(id).map_or(i64::MIN, |node| node.record.create_date))
        });
    }
}
