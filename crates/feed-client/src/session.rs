//! Feed session
//!
//! [`FeedSession`] owns the canonical [`TreeStore`] and drives it from user
//! actions: send the request, await the response, then mutate. Nothing is
//! applied optimistically, so a failed call leaves the tree at the last state
//! the backend confirmed.
//!
//! The store sits behind a mutex that is only taken after a response has
//! arrived and never across an `.await`. Several requests for different ids
//! may be in flight at once and complete in any order; each completion only
//! touches its own post.

use crate::config::ClientConfig;
use crate::error::{ClientError, TransportError};
use crate::transport::{IdentityProvider, Transport};
use feed_tree::view::replies_by;
use feed_tree::{
    is_owner, FeedEntry, Identity, Post, PostId, ThreadContext, TreeError, TreeStore, ViewMode,
};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Client-side feed state and the actions that change it
pub struct FeedSession {
    transport: Arc<dyn Transport>,
    identity: Arc<dyn IdentityProvider>,
    config: ClientConfig,
    store: Mutex<TreeStore>,
    closed: AtomicBool,
}

impl std::fmt::Debug for FeedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedSession")
            .field("config", &self.config)
            .field("posts", &self.store.lock().len())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl FeedSession {
    /// Create session with an empty tree
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        identity: Arc<dyn IdentityProvider>,
        config: ClientConfig,
    ) -> Self {
        Self {
            transport,
            identity,
            config,
            store: Mutex::new(TreeStore::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Current caller, if signed in
    #[inline]
    #[must_use]
    pub fn caller(&self) -> Option<Identity> {
        self.identity.current()
    }

    /// Discard the session
    ///
    /// Requests still in flight complete on the backend, but their results
    /// are no longer written into the tree.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        debug!("feed session closed");
    }

    /// Check if session was discarded
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Reload the whole feed from the backend
    ///
    /// Returns the number of posts now in the tree.
    ///
    /// # Errors
    /// Transport failures and malformed payloads; the old tree is kept.
    pub async fn refresh(&self) -> Result<usize, ClientError> {
        let posts = self.call("list_posts", self.transport.list_posts()).await?;
        let count = self.commit("list_posts", |store| {
            store.load(posts)?;
            Ok::<_, TreeError>(store.len())
        })??;
        info!(posts = count, "feed refreshed");
        Ok(count)
    }

    /// Publish a root post
    ///
    /// # Errors
    /// Invalid content, anonymous caller, transport failure
    pub async fn publish(&self, content: &str) -> Result<PostId, ClientError> {
        self.require_caller()?;
        self.check_content(content)?;

        let post = self.call("create_post", self.transport.create_post(content)).await?;
        let id = post.id().clone();
        self.commit("create_post", |store| store.insert_root(post))??;
        info!(%id, "published post");
        Ok(id)
    }

    /// Reply to a post anywhere in the tree
    ///
    /// If the parent vanished locally while the request was in flight, the
    /// reply is created on the backend but not inserted here.
    ///
    /// # Errors
    /// Invalid content, anonymous caller, transport failure
    pub async fn reply(&self, parent_id: &str, content: &str) -> Result<PostId, ClientError> {
        self.require_caller()?;
        self.check_content(content)?;

        let reply = self
            .call("create_reply", self.transport.create_reply(parent_id, content))
            .await?;
        let id = reply.id().clone();
        let inserted =
            self.commit("create_reply", |store| store.insert_reply(parent_id, reply))??;
        if inserted {
            info!(%id, parent = parent_id, "published reply");
        } else {
            debug!(%id, parent = parent_id, "reply parent no longer in tree");
        }
        Ok(id)
    }

    /// Like a post
    ///
    /// Returns whether the local tree changed.
    ///
    /// # Errors
    /// Anonymous caller, transport failure
    pub async fn like(&self, id: &str) -> Result<bool, ClientError> {
        self.require_caller()?;
        self.call("like", self.transport.like(id)).await?;
        self.commit("like", |store| store.like(id))
    }

    /// Withdraw a like
    ///
    /// Returns whether the local tree changed.
    ///
    /// # Errors
    /// Anonymous caller, transport failure
    pub async fn unlike(&self, id: &str) -> Result<bool, ClientError> {
        self.require_caller()?;
        self.call("unlike", self.transport.unlike(id)).await?;
        self.commit("unlike", |store| store.unlike(id))
    }

    /// Like or unlike depending on the local `liked_by_user` flag
    ///
    /// Returns the flag as stored once the call completes. If the post left
    /// the tree meanwhile, that is the flag it had before the toggle.
    ///
    /// # Errors
    /// Post not in the local tree, anonymous caller, transport failure
    pub async fn toggle_like(&self, id: &str) -> Result<bool, ClientError> {
        let liked = self
            .read(|store| store.get(id).map(|post| post.liked_by_user))
            .ok_or_else(|| TreeError::NotFound(PostId::new(id)))?;

        let changed = if liked {
            self.unlike(id).await?
        } else {
            self.like(id).await?
        };
        if changed {
            return Ok(!liked);
        }
        Ok(self
            .read(|store| store.get(id).map(|post| post.liked_by_user))
            .unwrap_or(liked))
    }

    /// Delete a post with its replies
    ///
    /// Returns whether the local tree changed.
    ///
    /// # Errors
    /// Anonymous caller, caller not the author (when ownership is
    /// required), transport failure
    pub async fn delete(&self, id: &str) -> Result<bool, ClientError> {
        let caller = self.require_caller()?;

        if self.config.require_ownership_for_delete {
            let owned = self
                .read(|store| store.get(id).map(|post| is_owner(Some(&caller), post)))
                .ok_or_else(|| TreeError::NotFound(PostId::new(id)))?;
            if !owned {
                return Err(ClientError::NotOwner(PostId::new(id)));
            }
        }

        self.call("delete", self.transport.delete(id)).await?;
        self.commit("delete", |store| store.delete_by_id(id))
    }

    /// Fetch a post and place it in its local thread
    ///
    /// # Errors
    /// Transport failure (including a post the backend does not know)
    pub async fn open_thread(&self, id: &str) -> Result<ThreadContext, ClientError> {
        if self.config.refresh_on_open {
            self.refresh().await?;
        }

        let target = self.call("get_post", self.transport.get_post(id)).await?;
        self.read(|store| store.thread_context(id, Some(target)))
            .ok_or_else(|| ClientError::Tree(TreeError::NotFound(PostId::new(id))))
    }

    /// Project the tree into `mode`
    #[must_use]
    pub fn view(&self, mode: ViewMode) -> Vec<FeedEntry> {
        self.read(|store| store.view(mode))
    }

    /// Project the tree into the configured default view
    #[must_use]
    pub fn default_view(&self) -> Vec<FeedEntry> {
        self.view(self.config.default_view)
    }

    /// Replies written by the current caller, newest first
    #[must_use]
    pub fn my_replies(&self) -> Vec<FeedEntry> {
        let caller = self.caller();
        replies_by(self.view(ViewMode::RepliesOnly), caller.as_ref())
    }

    /// Root posts written by `username`
    #[must_use]
    pub fn posts_by_username(&self, username: &str) -> Vec<Post> {
        self.read(|store| store.posts_by_username(username))
    }

    /// Root posts the caller liked
    #[must_use]
    pub fn liked_posts(&self) -> Vec<Post> {
        self.read(TreeStore::liked_posts)
    }

    /// Check if the current caller wrote post `id`
    #[must_use]
    pub fn is_owner(&self, id: &str) -> bool {
        let caller = self.caller();
        self.read(|store| {
            store
                .get(id)
                .is_some_and(|post| is_owner(caller.as_ref(), post))
        })
    }

    /// Best-effort root classification for labels
    #[must_use]
    pub fn is_root_post(&self, post: &Post) -> bool {
        self.read(|store| store.is_root_post(post))
    }

    /// Nested copy of the current tree
    #[must_use]
    pub fn snapshot(&self) -> Vec<Post> {
        self.read(TreeStore::to_tree)
    }

    /// Number of posts in the tree
    #[must_use]
    pub fn len(&self) -> usize {
        self.read(TreeStore::len)
    }

    /// Check if the tree is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read(TreeStore::is_empty)
    }

    async fn call<T>(
        &self,
        op: &'static str,
        request: impl Future<Output = Result<T, TransportError>>,
    ) -> Result<T, ClientError> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        request.await.map_err(|err| {
            warn!(op, error = %err, "transport call failed");
            ClientError::Transport(err)
        })
    }

    /// Apply a confirmed result to the tree unless the session was closed
    fn commit<R>(
        &self,
        op: &'static str,
        apply: impl FnOnce(&mut TreeStore) -> R,
    ) -> Result<R, ClientError> {
        if self.is_closed() {
            warn!(op, "late completion ignored after close");
            return Err(ClientError::Closed);
        }
        Ok(apply(&mut self.store.lock()))
    }

    fn read<R>(&self, query: impl FnOnce(&TreeStore) -> R) -> R {
        query(&self.store.lock())
    }

    fn require_caller(&self) -> Result<Identity, ClientError> {
        self.caller().ok_or(ClientError::Anonymous)
    }

    fn check_content(&self, content: &str) -> Result<(), ClientError> {
        if content.trim().is_empty() {
            return Err(ClientError::EmptyContent);
        }
        let len = content.chars().count();
        if len > self.config.max_content_chars {
            return Err(ClientError::ContentTooLong {
                len,
                max: self.config.max_content_chars,
            });
        }
        Ok(())
    }
}
