//! Progress events emitted while building an index.
//!
//! The indexer reports through [`IndexProgress`]; the app decides how to
//! render (human lines, JSON lines, or nothing).

use serde::Serialize;

/// A single progress event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum IndexEvent {
    /// Indexing began for `chunks` chunks.
    Started { collection: String, chunks: usize },
    /// `done` of `total` chunks have vectors.
    BatchEmbedded { done: usize, total: usize },
    /// All points were written.
    Stored { collection: String, points: usize },
}

/// Receives [`IndexEvent`]s. Implementations must not fail.
pub trait IndexProgress: Send + Sync {
    fn report(&self, event: IndexEvent);
}

/// Discards every event.
pub struct NoProgress;

impl IndexProgress for NoProgress {
    fn report(&self, _event: IndexEvent) {}
}
