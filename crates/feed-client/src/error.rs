//! Error types for the feed client
//!
//! Transport failures pass through unchanged inside [`ClientError::Transport`];
//! the session never mutates its tree when one occurs.

use feed_tree::{PostId, TreeError};

/// Main client error type
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport call failed
    #[error("transport failed: {0}")]
    Transport(#[from] TransportError),

    /// Tree rejected the data
    #[error("tree error: {0}")]
    Tree(#[from] TreeError),

    /// Post body is empty or whitespace
    #[error("content is empty")]
    EmptyContent,

    /// Post body exceeds the configured limit
    #[error("content has {len} characters (max {max})")]
    ContentTooLong {
        /// Characters submitted
        len: usize,
        /// Configured limit
        max: usize,
    },

    /// Caller is not the author
    #[error("caller does not own post {0}")]
    NotOwner(PostId),

    /// Action needs a signed-in caller
    #[error("not signed in")]
    Anonymous,

    /// Session was discarded before the call completed
    #[error("session closed")]
    Closed,

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// Check if error came from the transport
    #[inline]
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(err) if err.is_retryable())
    }
}

/// Transport collaborator errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Remote resource does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller not authenticated
    #[error("unauthorized")]
    Unauthorized,

    /// Remote refused the request
    #[error("rejected ({status}): {message}")]
    Rejected {
        /// Status code
        status: u16,
        /// Reason from the remote
        message: String,
    },

    /// Remote could not be reached
    #[error("connection failed: {0}")]
    Connection(String),
}

impl TransportError {
    /// Create rejection error
    #[inline]
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Rejected { status, .. } => *status >= 500,
            Self::NotFound(_) | Self::Unauthorized => false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config is not valid TOML for [`crate::ClientConfig`]
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config values are out of range
    #[error("invalid config: {0}")]
    Invalid(String),
}
