//! Feed Tree
//!
//! Normalized post/reply tree with derived feed views.
//!
//! # Overview
//!
//! - **Post / PostRecord**: a tweet or a reply; same shape, the tree position decides
//! - **TreeStore**: arena-backed canonical state with load/insert/like/unlike/delete
//! - **search**: recursive find/remove over nested posts
//! - **view**: flatten + filter + sort into the four named views
//! - **thread**: parent/sibling context for a detail page
//! - **ownership**: caller vs author comparison
//!
//! # Example
//!
//! ```rust
//! use feed_tree::{Post, PostRecord, TreeStore, ViewMode};
//!
//! let mut store = TreeStore::new();
//! store
//!     .load(vec![Post::new(PostRecord::new("a", 100).with_likes(2))
//!         .with_reply(Post::new(PostRecord::new("b", 150).with_likes(5)))])
//!     .unwrap();
//!
//! let timeline = store.view(ViewMode::Timeline);
//! assert_eq!(timeline[0].post().id.as_str(), "b");
//!
//! store.like("a");
//! assert_eq!(store.get("a").unwrap().likes, 3);
//!
//! assert!(store.delete_by_id("a"));
//! assert!(store.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod ownership;
pub mod post;
pub mod search;
pub mod store;
pub mod thread;
pub mod view;

// Re-exports
pub use error::TreeError;
pub use ownership::{is_owner, Identity};
pub use post::{AuthorId, ParentHints, Post, PostId, PostRecord, MAX_CONTENT_CHARS};
pub use store::TreeStore;
pub use thread::{is_root_post, reconstruct, ThreadContext};
pub use view::{project, FeedEntry, ViewMode};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the post tree
    pub use crate::{
        is_owner, FeedEntry, Identity, Post, PostId, PostRecord, ThreadContext, TreeError,
        TreeStore, ViewMode,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
