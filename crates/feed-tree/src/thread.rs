//! Thread context for a detail page
//!
//! The detail page shows a post together with the post it answers and the
//! other replies to that same post. The target itself may come from a
//! separate fetch; the local tree only supplies the surroundings.

use crate::post::Post;
use crate::search::{find_by_id, find_parent};
use serde::Serialize;

/// A post with its parent and siblings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadContext {
    /// The post being shown
    pub target: Post,
    /// Nearest ancestor, if known locally
    pub parent: Option<Post>,
    /// Parent's replies (target included), empty without a parent
    pub siblings: Vec<Post>,
}

impl ThreadContext {
    /// Build context from target and optional parent
    #[must_use]
    pub fn new(target: Post, parent: Option<Post>) -> Self {
        let siblings = parent
            .as_ref()
            .map(|p| p.replies.clone())
            .unwrap_or_default();
        Self {
            target,
            parent,
            siblings,
        }
    }

    /// Check if no parent was found
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Reconstruct thread context against nested posts
///
/// `external` is used as the target when supplied (e.g. a fresh fetch) and
/// must carry `target_id`; otherwise the target is looked up in `roots`.
/// Returns `None` when neither yields a matching post.
#[must_use]
pub fn reconstruct(
    roots: &[Post],
    target_id: &str,
    external: Option<Post>,
) -> Option<ThreadContext> {
    let target = match external {
        Some(post) if post.id().as_str() == target_id => post,
        Some(_) => return None,
        None => find_by_id(roots, target_id)?.clone(),
    };
    let parent = find_parent(roots, target_id).cloned();
    Some(ThreadContext::new(target, parent))
}

/// Best-effort root classification for display labels
///
/// A post counts as a root when it carries no parent hints and either the
/// local tree is empty or its id is among the known roots. Never use this
/// for access decisions.
#[must_use]
pub fn is_root_post(post: &Post, roots: &[Post]) -> bool {
    if !post.hints().is_empty() {
        return false;
    }
    roots.is_empty() || roots.iter().any(|root| root.id() == post.id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::{ParentHints, PostId, PostRecord};

    fn post(id: &str, date: i64) -> Post {
        Post::new(PostRecord::new(id, date))
    }

    fn tree() -> Vec<Post> {
        vec![post("a", 1)
            .with_reply(post("b", 2).with_reply(post("d", 4)))
            .with_reply(post("c", 3))]
    }

    #[test]
    fn reply_gets_parent_and_siblings() {
        let ctx = reconstruct(&tree(), "c", None).unwrap();
        assert_eq!(ctx.target.id().as_str(), "c");
        assert_eq!(ctx.parent.as_ref().unwrap().id().as_str(), "a");
        let siblings: Vec<&str> = ctx.siblings.iter().map(|p| p.id().as_str()).collect();
        assert_eq!(siblings, vec!["b", "c"]);
        assert!(!ctx.is_root());
    }

    #[test]
    fn deep_reply_parent_is_nearest_ancestor() {
        let ctx = reconstruct(&tree(), "d", None).unwrap();
        assert_eq!(ctx.parent.unwrap().id().as_str(), "b");
        assert_eq!(ctx.siblings.len(), 1);
    }

    #[test]
    fn root_has_no_parent() {
        let ctx = reconstruct(&tree(), "a", None).unwrap();
        assert!(ctx.is_root());
        assert!(ctx.siblings.is_empty());
    }

    #[test]
    fn external_target_is_correlated() {
        let fetched = post("c", 3).with_reply(post("late", 9));
        let ctx = reconstruct(&tree(), "c", Some(fetched.clone())).unwrap();
        assert_eq!(ctx.target, fetched);
        assert_eq!(ctx.parent.unwrap().id().as_str(), "a");
    }

    #[test]
    fn fetch_for_another_id_is_none() {
        assert!(reconstruct(&tree(), "c", Some(post("b", 2))).is_none());
    }

    #[test]
    fn unknown_target_without_fetch_is_none() {
        assert!(reconstruct(&tree(), "zz", None).is_none());
    }

    #[test]
    fn external_target_unknown_locally_has_no_parent() {
        let ctx = reconstruct(&tree(), "x", Some(post("x", 5))).unwrap();
        assert!(ctx.is_root());
    }

    #[test]
    fn root_heuristic() {
        let roots = tree();
        assert!(is_root_post(&roots[0], &roots));
        assert!(!is_root_post(&post("b", 2), &roots));
        assert!(is_root_post(&post("anything", 2), &[]));

        let hinted = post("a", 1).with_hints(ParentHints {
            reply_to: Some(PostId::new("z")),
            ..ParentHints::default()
        });
        assert!(!is_root_post(&hinted, &roots));
        assert!(!is_root_post(&hinted, &[]));
    }
}
