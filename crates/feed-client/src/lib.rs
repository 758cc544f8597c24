//! Feed Client
//!
//! Session layer over [`feed_tree`]: talks to a backend through [`Transport`],
//! reads the caller from an [`IdentityProvider`] and keeps the post tree in
//! step with confirmed responses.
//!
//! # Example
//!
//! ```rust
//! use feed_client::{ClientConfig, FeedSession, MemoryTransport, StaticIdentity};
//! use feed_tree::{Identity, ViewMode};
//! use std::sync::Arc;
//!
//! # block_on(async {
//! let me = Identity::new().with_subject(1u64).with_handle("chaotic_orange");
//! let session = FeedSession::new(
//!     Arc::new(MemoryTransport::new().with_viewer(me.clone())),
//!     Arc::new(StaticIdentity::new(me)),
//!     ClientConfig::default(),
//! );
//!
//! let id = session.publish("hello").await.unwrap();
//! session.reply(id.as_str(), "first!").await.unwrap();
//! assert_eq!(session.view(ViewMode::Timeline).len(), 2);
//! # });
//! # fn block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     futures::executor::block_on(f)
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod memory;
pub mod session;
pub mod transport;

// Re-exports
pub use config::ClientConfig;
pub use error::{ClientError, ConfigError, TransportError};
pub use memory::MemoryTransport;
pub use session::FeedSession;
pub use transport::{IdentityProvider, StaticIdentity, Transport};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
