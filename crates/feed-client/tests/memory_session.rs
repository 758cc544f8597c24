//! End-to-end flows over the in-memory backend

use async_trait::async_trait;
use feed_client::{
    ClientConfig, ClientError, FeedSession, MemoryTransport, StaticIdentity, Transport,
    TransportError,
};
use feed_test_utils::{authored, identity, mixed_tree};
use feed_tree::{Post, ViewMode};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tokio::sync::Semaphore;

fn session_for(transport: Arc<MemoryTransport>, caller: usize) -> FeedSession {
    FeedSession::new(
        transport,
        Arc::new(StaticIdentity::new(identity(caller))),
        ClientConfig::default(),
    )
}

fn shared_backend(posts: Vec<Post>, viewer: usize) -> Arc<MemoryTransport> {
    Arc::new(MemoryTransport::new().with_posts(posts).with_viewer(identity(viewer)))
}

#[tokio::test]
async fn publish_reply_like_delete() {
    let backend = shared_backend(Vec::new(), 0);
    let session = session_for(backend.clone(), 0);

    let root = session.publish("first post").await.unwrap();
    let reply = session.reply(root.as_str(), "self reply").await.unwrap();
    assert!(session.like(reply.as_str()).await.unwrap());
    assert!(!session.like(reply.as_str()).await.unwrap());

    let mine = session.my_replies();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].post().likes, 1);
    assert_eq!(session.posts_by_username("chaotic_orange").len(), 1);

    assert!(session.delete(root.as_str()).await.unwrap());
    assert!(session.is_empty());
    assert_eq!(backend.post_count(), 0);
}

#[tokio::test]
async fn refresh_reflects_backend_after_local_changes() {
    let backend = shared_backend(mixed_tree(), 0);
    let session = session_for(backend, 0);
    session.refresh().await.unwrap();

    session.like("busy.1.2").await.unwrap();
    let local = session.snapshot();
    session.refresh().await.unwrap();
    assert_eq!(session.snapshot(), local);
}

#[tokio::test]
async fn concurrent_completions_touch_only_their_posts() {
    let backend = shared_backend(mixed_tree(), 0);
    let session = session_for(backend, 0);
    session.refresh().await.unwrap();

    let (liked, replied, unliked) = futures::join!(
        session.like("single.1"),
        session.reply("busy.1.1", "nested"),
        session.unlike("lonely"),
    );
    assert!(liked.unwrap());
    let reply_id = replied.unwrap();
    assert!(!unliked.unwrap());

    assert_eq!(session.len(), 10);
    let entries = session.view(ViewMode::Timeline);
    let reply = entries.iter().find(|e| e.post().id == reply_id).unwrap();
    assert_eq!(reply.depth(), 3);
    let lonely = entries.iter().find(|e| e.post().id.as_str() == "lonely").unwrap();
    assert_eq!(lonely.post().likes, 0);
}

#[tokio::test]
async fn reply_to_missing_parent_is_transport_error() {
    let session = session_for(shared_backend(mixed_tree(), 0), 0);
    session.refresh().await.unwrap();

    let err = session.reply("ghost", "hello?").await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(TransportError::NotFound(_))));
    assert_eq!(session.len(), 9);
}

#[tokio::test]
async fn backend_refuses_foreign_delete_when_check_disabled() {
    let backend = shared_backend(vec![authored("theirs", 5, 2)], 0);
    let session = FeedSession::new(
        backend,
        Arc::new(StaticIdentity::new(identity(0))),
        ClientConfig::default().with_ownership_check(false),
    );
    session.refresh().await.unwrap();

    let err = session.delete("theirs").await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(TransportError::Rejected { status: 403, .. })));
    assert_eq!(session.len(), 1);
}

#[tokio::test]
async fn refresh_on_open_picks_up_remote_posts() {
    let backend = shared_backend(Vec::new(), 1);
    let remote = backend.create_post("posted elsewhere").await.unwrap();

    let session = FeedSession::new(
        backend,
        Arc::new(StaticIdentity::new(identity(1))),
        ClientConfig::default().with_refresh_on_open(true),
    );
    let thread = session.open_thread(remote.id().as_str()).await.unwrap();
    assert!(thread.is_root());
    assert_eq!(session.len(), 1);
}

/// Applies `like` on the backend, then holds the response until a permit is released
struct Gated {
    inner: Arc<MemoryTransport>,
    gate: Arc<Semaphore>,
}

#[async_trait]
impl Transport for Gated {
    async fn list_posts(&self) -> Result<Vec<Post>, TransportError> {
        self.inner.list_posts().await
    }

    async fn create_post(&self, content: &str) -> Result<Post, TransportError> {
        self.inner.create_post(content).await
    }

    async fn create_reply(&self, parent_id: &str, content: &str) -> Result<Post, TransportError> {
        self.inner.create_reply(parent_id, content).await
    }

    async fn like(&self, id: &str) -> Result<(), TransportError> {
        self.inner.like(id).await?;
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|err| TransportError::Connection(err.to_string()))?;
        Ok(())
    }

    async fn unlike(&self, id: &str) -> Result<(), TransportError> {
        self.inner.unlike(id).await
    }

    async fn delete(&self, id: &str) -> Result<(), TransportError> {
        self.inner.delete(id).await
    }

    async fn get_post(&self, id: &str) -> Result<Post, TransportError> {
        self.inner.get_post(id).await
    }
}

fn gated_session(backend: Arc<MemoryTransport>) -> (FeedSession, Arc<Semaphore>) {
    let gate = Arc::new(Semaphore::new(0));
    let session = FeedSession::new(
        Arc::new(Gated {
            inner: backend,
            gate: gate.clone(),
        }),
        Arc::new(StaticIdentity::new(identity(0))),
        ClientConfig::default(),
    );
    (session, gate)
}

#[tokio::test]
async fn completion_after_close_is_dropped() {
    let backend = shared_backend(mixed_tree(), 0);
    let (session, gate) = gated_session(backend.clone());
    session.refresh().await.unwrap();

    let (late, ()) = tokio::join!(session.like("lonely"), async {
        tokio::task::yield_now().await;
        session.close();
        gate.add_permits(1);
    });

    assert!(matches!(late, Err(ClientError::Closed)));
    assert_eq!(session.view(ViewMode::RootsOnly)[2].post().likes, 0);
    assert_eq!(backend.get_post("lonely").await.unwrap().record.likes, 1);
}

#[tokio::test]
async fn toggle_reports_stored_flag_when_post_vanishes() {
    let backend = shared_backend(vec![authored("mine", 10, 0)], 0);
    let (session, gate) = gated_session(backend);
    session.refresh().await.unwrap();

    let (toggled, deleted) = tokio::join!(session.toggle_like("mine"), async {
        tokio::task::yield_now().await;
        let deleted = session.delete("mine").await;
        gate.add_permits(1);
        deleted
    });

    assert!(deleted.unwrap());
    assert!(!toggled.unwrap());
    assert!(session.is_empty());
}
