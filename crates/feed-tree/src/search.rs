//! Lookup and removal over nested posts
//!
//! Replies can receive replies of their own, so nothing here assumes a
//! post → flat replies shape. Traversal is depth-first with an explicit
//! stack: roots in slice order, descending into a post's replies before
//! moving to its next sibling. Depth is bounded only by memory.

use crate::post::Post;

/// Find post by id anywhere in the tree
#[must_use]
pub fn find_by_id<'a>(roots: &'a [Post], id: &str) -> Option<&'a Post> {
    let mut stack: Vec<&Post> = roots.iter().rev().collect();
    while let Some(post) = stack.pop() {
        if post.id().as_str() == id {
            return Some(post);
        }
        stack.extend(post.replies.iter().rev());
    }
    None
}

/// Find post by id anywhere in the tree, mutably
pub fn find_by_id_mut<'a>(roots: &'a mut [Post], id: &str) -> Option<&'a mut Post> {
    let mut stack: Vec<&mut Post> = roots.iter_mut().rev().collect();
    while let Some(post) = stack.pop() {
        if post.id().as_str() == id {
            return Some(post);
        }
        stack.extend(post.replies.iter_mut().rev());
    }
    None
}

/// Find the post whose direct replies contain `id`
///
/// Returns `None` for roots and for ids not in the tree.
#[must_use]
pub fn find_parent<'a>(roots: &'a [Post], id: &str) -> Option<&'a Post> {
    let mut stack: Vec<&Post> = roots.iter().rev().collect();
    while let Some(post) = stack.pop() {
        if post.replies.iter().any(|reply| reply.id().as_str() == id) {
            return Some(post);
        }
        stack.extend(post.replies.iter().rev());
    }
    None
}

/// Remove post (and its reply subtree) from wherever it occurs
///
/// Untouched posts stay where they are. Removing an id that is not present
/// returns the input unchanged with `false`.
#[must_use]
pub fn remove_by_id(mut roots: Vec<Post>, id: &str) -> (Vec<Post>, bool) {
    let before = roots.len();
    roots.retain(|post| post.id().as_str() != id);
    let mut removed = roots.len() != before;

    let mut stack: Vec<&mut Post> = roots.iter_mut().collect();
    while let Some(post) = stack.pop() {
        let before = post.replies.len();
        post.replies.retain(|reply| reply.id().as_str() != id);
        removed |= post.replies.len() != before;
        stack.extend(post.replies.iter_mut());
    }
    (roots, removed)
}

/// Count every post in the tree
#[must_use]
pub fn count_nodes(roots: &[Post]) -> usize {
    roots.iter().map(Post::node_count).sum()
}
