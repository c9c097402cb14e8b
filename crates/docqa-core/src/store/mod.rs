//! Vector store abstraction.
//!
//! The [`VectorStore`] trait is everything the indexer and retriever need
//! from a store: named collections of `(vector, chunk text)` points and
//! top-k cosine search. Backends: [`memory::InMemoryVectorStore`] here,
//! Qdrant in the app crate.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::RetrievedChunk;

/// One point written to a collection: a chunk's vector plus its text.
///
/// Keyed by the chunk ordinal; upserting an existing id replaces it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPoint {
    pub id: u64,
    pub vector: Vec<f32>,
    pub text: String,
}

/// Abstract vector store backend.
///
/// # Operations
///
/// | Method | Purpose | Error |
/// |--------|---------|-------|
/// | [`ensure_collection`](VectorStore::ensure_collection) | Create if absent | `StoreWrite` |
/// | [`collection_exists`](VectorStore::collection_exists) | Existence probe | `Retrieval` |
/// | [`upsert`](VectorStore::upsert) | Insert or replace points | `StoreWrite` |
/// | [`similarity_search`](VectorStore::similarity_search) | Top-k by cosine | `Retrieval` |
/// | [`drop_collection`](VectorStore::drop_collection) | Delete a collection | `StoreWrite` |
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Short backend label used in logs (e.g. `"memory"`, `"qdrant"`).
    fn backend(&self) -> &str;

    /// Create a collection with the given dimensionality and cosine
    /// distance. No-op if it already exists.
    async fn ensure_collection(&self, name: &str, dims: usize) -> Result<()>;

    async fn collection_exists(&self, name: &str) -> Result<bool>;

    async fn upsert(&self, collection: &str, points: &[StoredPoint]) -> Result<()>;

    /// Return the `k` points closest to `vector`, ordered by descending
    /// score, ties broken by ascending point id.
    async fn similarity_search(
        &self,
        collection: &str,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievedChunk>>;

    async fn drop_collection(&self, name: &str) -> Result<()>;
}

/// Sort hits by descending score, then ascending chunk ordinal.
pub fn sort_hits(hits: &mut [RetrievedChunk]) {
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.index.cmp(&b.index))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(index: usize, score: f32) -> RetrievedChunk {
        RetrievedChunk {
            index,
            text: format!("chunk {index}"),
            score,
        }
    }

    #[test]
    fn sort_hits_breaks_ties_by_ordinal() {
        let mut hits = vec![hit(3, 0.5), hit(1, 0.9), hit(0, 0.5), hit(2, 0.5)];
        sort_hits(&mut hits);
        let order: Vec<usize> = hits.iter().map(|h| h.index).collect();
        assert_eq!(order, vec![1, 0, 2, 3]);
    }
}
