//! Testing utilities for the feed workspace
//!
//! Shared fixtures and tree builders.

#![allow(missing_docs)]

use feed_tree::{Identity, Post, PostRecord, TreeStore};

/// Authors used by the sample trees, `(id, name, username)`
pub const AUTHORS: [(u64, &str, &str); 3] = [
    (1, "Ahmet Yilmaz", "chaotic_orange"),
    (2, "Ayse Demir", "sunny_rose"),
    (3, "Murat Kaya", "blue_hawk"),
];

pub fn post(id: &str, create_date: i64, likes: u64) -> Post {
    Post::new(PostRecord::new(id, create_date).with_likes(likes))
}

pub fn authored(id: &str, create_date: i64, author: usize) -> Post {
    let (author_id, name, username) = AUTHORS[author % AUTHORS.len()];
    Post::new(
        PostRecord::new(id, create_date)
            .with_author(author_id, name, username)
            .with_content(format!("post {id}")),
    )
}

pub fn identity(author: usize) -> Identity {
    let (author_id, name, username) = AUTHORS[author % AUTHORS.len()];
    Identity::new()
        .with_subject(author_id)
        .with_handle(username)
        .with_display_name(name)
}

/// `a(100, 2 likes)` with reply `b(150, 5 likes)`
pub fn scenario_tree() -> Vec<Post> {
    vec![post("a", 100, 2).with_reply(post("b", 150, 5))]
}

/// Roots with zero, one and many replies, one reply with its own replies
pub fn mixed_tree() -> Vec<Post> {
    vec![
        post("lonely", 10, 0),
        post("single", 20, 4).with_reply(post("single.1", 25, 1)),
        post("busy", 30, 4)
            .with_reply(
                post("busy.1", 31, 7)
                    .with_reply(post("busy.1.1", 40, 0))
                    .with_reply(post("busy.1.2", 41, 4)),
            )
            .with_reply(post("busy.2", 32, 2))
            .with_reply(post("busy.3", 33, 0)),
    ]
}

pub fn store_with(posts: Vec<Post>) -> TreeStore {
    let mut store = TreeStore::new();
    store.load(posts).expect("fixture posts have unique ids");
    store
}

pub fn feed_json(posts: &[Post]) -> String {
    serde_json::to_string(posts).expect("posts serialize")
}
