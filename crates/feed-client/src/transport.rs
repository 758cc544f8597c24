//! Collaborator interfaces
//!
//! [`Transport`] is the backend seam (HTTP in a real client) and
//! [`IdentityProvider`] supplies the signed-in caller. The session only
//! reads identities; it never changes them.

use crate::error::TransportError;
use async_trait::async_trait;
use feed_tree::{Identity, Post};
use parking_lot::RwLock;

/// Backend operations the session depends on
///
/// Every method fails with a recoverable [`TransportError`]. Posts returned
/// from `list_posts` and `get_post` carry `liked_by_user` for the requesting
/// viewer.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the whole feed
    async fn list_posts(&self) -> Result<Vec<Post>, TransportError>;

    /// Create a root post
    async fn create_post(&self, content: &str) -> Result<Post, TransportError>;

    /// Create a reply under `parent_id`
    async fn create_reply(&self, parent_id: &str, content: &str) -> Result<Post, TransportError>;

    /// Like a post
    async fn like(&self, id: &str) -> Result<(), TransportError>;

    /// Withdraw a like
    async fn unlike(&self, id: &str) -> Result<(), TransportError>;

    /// Delete a post and its replies
    async fn delete(&self, id: &str) -> Result<(), TransportError>;

    /// Fetch one post with its replies
    async fn get_post(&self, id: &str) -> Result<Post, TransportError>;
}

/// Source of the current caller
pub trait IdentityProvider: Send + Sync {
    /// Current caller, `None` when anonymous
    fn current(&self) -> Option<Identity>;
}

/// Identity held in memory, switched by login/logout
#[derive(Debug, Default)]
pub struct StaticIdentity {
    inner: RwLock<Option<Identity>>,
}

impl StaticIdentity {
    /// Create provider for a signed-in caller
    #[inline]
    #[must_use]
    pub fn new(identity: Identity) -> Self {
        Self {
            inner: RwLock::new(Some(identity)),
        }
    }

    /// Create provider with no caller
    #[inline]
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Replace the current caller
    pub fn login(&self, identity: Identity) {
        *self.inner.write() = Some(identity);
    }

    /// Forget the current caller
    pub fn logout(&self) {
        *self.inner.write() = None;
    }
}

impl IdentityProvider for StaticIdentity {
    fn current(&self) -> Option<Identity> {
        self.inner.read().clone()
    }
}
