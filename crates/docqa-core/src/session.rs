//! Per-session state: the active index handle and the conversation log.
//!
//! Operations take `&mut self`, so an embed and a query on the same
//! session can never interleave. The handle is only replaced once a new
//! index build has fully succeeded.

use tracing::{info, warn};

use crate::conversation::Conversation;
use crate::error::Result;
use crate::index::{IndexHandle, Indexer};
use crate::models::{Chunk, Turn};
use crate::progress::IndexProgress;
use crate::respond::{Answer, Responder};

/// Session context passed explicitly to each operation.
#[derive(Debug, Default)]
pub struct Session {
    index: Option<IndexHandle>,
    conversation: Conversation,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// A session that starts out grounded in an existing index.
    pub fn with_index(index: IndexHandle) -> Self {
        Self {
            index: Some(index),
            conversation: Conversation::new(),
        }
    }

    pub fn index(&self) -> Option<&IndexHandle> {
        self.index.as_ref()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Answer `query` and record both turns.
    ///
    /// The user turn is appended first. On failure the error is returned
    /// and no assistant turn is recorded; earlier turns are untouched.
    pub async fn ask(&mut self, responder: &Responder, query: &str) -> Result<Answer> {
        self.conversation.append(Turn::user(query));
        let answer = responder.respond(self.index.as_ref(), query).await?;
        self.conversation.append(Turn::assistant(answer.text.clone()));
        Ok(answer)
    }

    /// Build a new index from `chunks` and make it active.
    ///
    /// On failure the previous handle (if any) stays active. On success a
    /// superseded generation built by this process is dropped from the
    /// store best-effort; attached collections are left alone.
    pub async fn rebuild_index(
        &mut self,
        indexer: &Indexer,
        name: &str,
        chunks: &[Chunk],
        progress: &dyn IndexProgress,
    ) -> Result<&IndexHandle> {
        let fresh = indexer.build(name, chunks, progress).await?;
        let superseded = self.index.take();
        let active = self.index.insert(fresh);
        if let Some(old) = superseded {
            release(old).await;
        }
        Ok(&*active)
    }

    /// Clear the conversation and forget the active index, dropping it
    /// from the store when this session built it.
    pub async fn reset(&mut self) {
        self.conversation.reset();
        if let Some(old) = self.index.take() {
            release(old).await;
        }
    }

    /// End the session, dropping an index it built.
    pub async fn close(mut self) {
        if let Some(old) = self.index.take() {
            release(old).await;
        }
    }
}

/// Best-effort removal of a generation this process built. Attached
/// collections are never dropped.
async fn release(handle: IndexHandle) {
    if !handle.is_owned() {
        return;
    }
    match handle.drop_remote().await {
        Ok(()) => info!(collection = handle.collection(), "dropped index"),
        Err(e) => warn!(collection = handle.collection(), error = %e, "failed to drop index"),
    }
}
