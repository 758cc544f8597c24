//! Error types for the post tree
//!
//! Stale references are not errors here: like/unlike/reply against an id
//! that is no longer in the tree resolve to a no-op. The variants below cover
//! what callers can actually act on.

use crate::post::PostId;

/// Tree error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// Referenced post is not in the tree
    #[error("post not found: {0}")]
    NotFound(PostId),

    /// Post is missing a required field or collides with an existing id
    #[error("malformed post{}: {reason}", id_suffix(.id))]
    MalformedInput {
        /// Offending post id, when one was present
        id: Option<PostId>,
        /// What was wrong with it
        reason: String,
    },

    /// View mode string outside the closed set
    #[error("unknown view mode: {0}")]
    UnknownViewMode(String),
}

impl TreeError {
    /// Create malformed-input error
    #[inline]
    pub fn malformed(id: Option<PostId>, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            id,
            reason: reason.into(),
        }
    }

    /// Check if error came from caller-supplied data
    #[inline]
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedInput { .. })
    }
}

#[allow(clippy::ref_option)]
fn id_suffix(id: &Option<PostId>) -> String {
    id.as_ref().map(|id| format!(" {id}")).unwrap_or_default()
}
