//! Retriever: top-k similarity search against an [`IndexHandle`].
//!
//! The query is embedded with the same embedder that built the index and
//! the store returns the closest chunk texts, ordered by descending cosine
//! similarity. Equal scores are ordered by ascending chunk ordinal.

use tracing::debug;

use crate::error::Result;
use crate::index::IndexHandle;
use crate::models::RetrievedChunk;

/// Default number of chunks retrieved per query.
pub const DEFAULT_TOP_K: usize = 5;

/// Return the `k` chunks most similar to `query`.
///
/// # Errors
///
/// - [`Error::EmbeddingService`](crate::Error::EmbeddingService) if the query cannot be embedded.
/// - [`Error::Retrieval`](crate::Error::Retrieval) if the collection is gone or the store is unreachable.
pub async fn retrieve(handle: &IndexHandle, query: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
    if k == 0 {
        return Ok(Vec::new());
    }

    let query_vec = handle.embedder().embed(query).await?;
    let hits = handle
        .store()
        .similarity_search(handle.collection(), &query_vec, k)
        .await?;

    debug!(
        collection = handle.collection(),
        k,
        hits = hits.len(),
        top_score = hits.first().map(|h| h.score),
        "retrieved chunks"
    );
    Ok(hits)
}

/// Join retrieved chunk texts into a context block, each followed by a newline.
pub fn context_block(chunks: &[RetrievedChunk]) -> String {
    let mut out = String::new();
    for c in chunks {
        out.push_str(&c.text);
        out.push('\n');
    }
    out
}
