//! Ownership predicate
//!
//! [`is_owner`] decides whether a caller authored a post. The client uses it to
//! gate delete controls and "your reply" labels; a backend must apply the same
//! comparison as its authorization check.

use crate::post::{AuthorId, PostRecord};
use serde::{Deserialize, Serialize};

/// Identity of the current caller
///
/// Deserializes from token claims as well (`sub`, `nickname`, `name`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Stable subject id, compared against `PostRecord::author_id`
    #[serde(default, alias = "sub")]
    pub subject_id: Option<AuthorId>,
    /// Handle, compared against `PostRecord::username`
    #[serde(default, alias = "nickname")]
    pub handle: Option<String>,
    /// Display name
    #[serde(default, alias = "name")]
    pub display_name: Option<String>,
}

impl Identity {
    /// Create empty identity
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With subject id
    #[inline]
    #[must_use]
    pub fn with_subject(mut self, subject_id: impl Into<AuthorId>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }

    /// With handle
    #[inline]
    #[must_use]
    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = Some(handle.into());
        self
    }

    /// With display name
    #[inline]
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Check whether `caller` authored `post`
///
/// Subject and author ids win when both are present. Otherwise the handle is
/// compared against the recorded username, and only if both are non-empty.
/// Anonymous callers never own anything.
#[must_use]
pub fn is_owner(caller: Option<&Identity>, post: &PostRecord) -> bool {
    let Some(caller) = caller else {
        return false;
    };

    if let (Some(subject), Some(author)) = (&caller.subject_id, &post.author_id) {
        return subject == author;
    }

    match caller.handle.as_deref() {
        Some(handle) if !handle.is_empty() && !post.username.is_empty() => {
            handle == post.username
        }
        _ => false,
    }
}
