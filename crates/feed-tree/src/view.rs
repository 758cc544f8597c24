//! Derived feed views
//!
//! A view is always computed, never stored: the tree is flattened in
//! pre-order (each post followed by its replies, recursively) and the
//! resulting entries are filtered and stably sorted for the requested
//! [`ViewMode`].
//!
//! | mode | entries | order |
//! |---|---|---|
//! | `timeline` | all | newest first |
//! | `tweets` | roots | newest first |
//! | `replies` | replies at any depth | newest first |
//! | `most_liked` | all | most likes first, ties in flatten order |

use crate::error::TreeError;
use crate::ownership::{is_owner, Identity};
use crate::post::{Post, PostRecord};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Named projection over the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ViewMode {
    /// Every post, newest first
    #[default]
    #[serde(rename = "timeline")]
    Timeline,
    /// Root posts only, newest first
    #[serde(rename = "tweets")]
    RootsOnly,
    /// Replies only, newest first
    #[serde(rename = "replies")]
    RepliesOnly,
    /// Every post, most liked first
    #[serde(rename = "most_liked")]
    MostLiked,
}

impl ViewMode {
    /// All modes in selector order
    pub const ALL: [ViewMode; 4] = [
        ViewMode::Timeline,
        ViewMode::RootsOnly,
        ViewMode::RepliesOnly,
        ViewMode::MostLiked,
    ];

    /// Wire name of the mode
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Timeline => "timeline",
            ViewMode::RootsOnly => "tweets",
            ViewMode::RepliesOnly => "replies",
            ViewMode::MostLiked => "most_liked",
        }
    }
}

impl Display for ViewMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ViewMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| TreeError::UnknownViewMode(s.to_string()))
    }
}

/// One post in a flattened view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    #[serde(flatten)]
    post: PostRecord,
    depth: usize,
    reply_count: usize,
    is_reply: bool,
}

impl FeedEntry {
    /// Create entry; depth 0 marks a root
    #[inline]
    #[must_use]
    pub fn new(post: PostRecord, depth: usize, reply_count: usize) -> Self {
        Self {
            post,
            depth,
            reply_count,
            is_reply: depth > 0,
        }
    }

    /// Get post fields
    #[inline]
    #[must_use]
    pub fn post(&self) -> &PostRecord {
        &self.post
    }

    /// Nesting depth below the root
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of direct replies
    #[inline]
    #[must_use]
    pub fn reply_count(&self) -> usize {
        self.reply_count
    }

    /// Check if entry is a reply
    #[inline]
    #[must_use]
    pub fn is_reply(&self) -> bool {
        self.is_reply
    }

    /// Take the post fields
    #[inline]
    #[must_use]
    pub fn into_post(self) -> PostRecord {
        self.post
    }
}

/// Flatten nested posts in pre-order
#[must_use]
pub fn flatten(roots: &[Post]) -> Vec<FeedEntry> {
    let mut out = Vec::new();
    let mut stack: Vec<(&Post, usize)> = roots.iter().rev().map(|post| (post, 0)).collect();

    while let Some((post, depth)) = stack.pop() {
        out.push(FeedEntry::new(post.record.clone(), depth, post.replies.len()));
        stack.extend(post.replies.iter().rev().map(|reply| (reply, depth + 1)));
    }
    out
}

/// Filter and order flattened entries for `mode`
#[must_use]
pub fn select(entries: Vec<FeedEntry>, mode: ViewMode) -> Vec<FeedEntry> {
    let mut selected: Vec<FeedEntry> = match mode {
        ViewMode::Timeline | ViewMode::MostLiked => entries,
        ViewMode::RootsOnly => entries.into_iter().filter(|e| !e.is_reply()).collect(),
        ViewMode::RepliesOnly => entries.into_iter().filter(FeedEntry::is_reply).collect(),
    };

    // sort_by is stable; most_liked ties keep flatten order
    match mode {
        ViewMode::MostLiked => selected.sort_by(|a, b| b.post.likes.cmp(&a.post.likes)),
        ViewMode::Timeline | ViewMode::RootsOnly | ViewMode::RepliesOnly => {
            selected.sort_by(|a, b| b.post.create_date.cmp(&a.post.create_date));
        }
    }
    selected
}

/// Project nested posts into `mode`
#[must_use]
pub fn project(roots: &[Post], mode: ViewMode) -> Vec<FeedEntry> {
    select(flatten(roots), mode)
}

/// Keep only replies written by `caller`
#[must_use]
pub fn replies_by(entries: Vec<FeedEntry>, caller: Option<&Identity>) -> Vec<FeedEntry> {
    entries
        .into_iter()
        .filter(|entry| entry.is_reply() && is_owner(caller, entry.post()))
        .collect()
}
