//! Indexer: embeds chunks and writes them into a vector store collection.
//!
//! Every build writes into a fresh physical collection named
//! `<name>-<generation>`, so a failed or half-written build can never
//! disturb an index that is already being queried. A build only yields an
//! [`IndexHandle`] once every point has been written.
//!
//! ```text
//! chunks ──▶ embed (batches) ──▶ ensure collection ──▶ upsert (batches) ──▶ IndexHandle
//!                 │                                         │
//!                 └─ EmbeddingService error                 └─ StoreWrite error (+ drop partial)
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::embedding::Embedder;
use crate::error::{Error, Result};
use crate::models::Chunk;
use crate::progress::{IndexEvent, IndexProgress};
use crate::store::{StoredPoint, VectorStore};

/// Default number of texts per embedding call and points per upsert.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Reference to a fully written collection.
///
/// Cheap to clone; holds no local data beyond the names and the service
/// handles needed to query it.
#[derive(Clone)]
pub struct IndexHandle {
    name: String,
    collection: String,
    points: usize,
    owned: bool,
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
}

impl IndexHandle {
    /// Bind a handle to a collection written earlier (e.g. by another
    /// process). No remote call is made; a missing collection surfaces as
    /// a retrieval error on first query.
    pub fn attach(
        collection: impl Into<String>,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        let collection = collection.into();
        Self {
            name: collection.clone(),
            collection,
            points: 0,
            owned: false,
            store,
            embedder,
        }
    }

    /// Logical collection name the build was requested under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Physical collection holding this generation's points.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Points written by the build (0 for attached handles).
    pub fn points(&self) -> usize {
        self.points
    }

    /// Whether this process built the collection (attached handles are
    /// never dropped on replacement).
    pub fn is_owned(&self) -> bool {
        self.owned
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Delete this generation's collection from the store.
    pub async fn drop_remote(&self) -> Result<()> {
        self.store.drop_collection(&self.collection).await
    }
}

impl fmt::Debug for IndexHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexHandle")
            .field("name", &self.name)
            .field("collection", &self.collection)
            .field("points", &self.points)
            .field("store", &self.store.backend())
            .field("embedder", &self.embedder.model_name())
            .finish()
    }
}

/// Builds [`IndexHandle`]s from chunks.
pub struct Indexer {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    batch_size: usize,
}

impl Indexer {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedder,
            store,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Embed `chunks` and write them into a new generation of `name`.
    ///
    /// # Errors
    ///
    /// - [`Error::EmbeddingService`] if the embedder fails or returns the
    ///   wrong number or size of vectors. Nothing has been written yet.
    /// - [`Error::StoreWrite`] if creating the collection or writing points
    ///   fails. The partial collection is dropped best-effort.
    pub async fn build(
        &self,
        name: &str,
        chunks: &[Chunk],
        progress: &dyn IndexProgress,
    ) -> Result<IndexHandle> {
        let collection = generation_name(name);
        let dims = self.embedder.dims();
        let total = chunks.len();

        progress.report(IndexEvent::Started {
            collection: collection.clone(),
            chunks: total,
        });

        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(total);
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let batch_vectors = self.embedder.embed_batch(&texts).await?;
            if batch_vectors.len() != batch.len() {
                return Err(Error::embedding(
                    self.embedder.model_name(),
                    format!(
                        "expected {} vectors, got {}",
                        batch.len(),
                        batch_vectors.len()
                    ),
                ));
            }
            if let Some(bad) = batch_vectors.iter().find(|v| v.len() != dims) {
                return Err(Error::embedding(
                    self.embedder.model_name(),
                    format!("expected {}-dim vectors, got {}", dims, bad.len()),
                ));
            }
            vectors.extend(batch_vectors);
            debug!(collection = %collection, done = vectors.len(), total, "embedded batch");
            progress.report(IndexEvent::BatchEmbedded {
                done: vectors.len(),
                total,
            });
        }

        self.store.ensure_collection(&collection, dims).await?;

        let points: Vec<StoredPoint> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| StoredPoint {
                id: chunk.index as u64,
                vector,
                text: chunk.text.clone(),
            })
            .collect();

        for batch in points.chunks(self.batch_size) {
            if let Err(e) = self.store.upsert(&collection, batch).await {
                if let Err(cleanup) = self.store.drop_collection(&collection).await {
                    warn!(collection = %collection, error = %cleanup, "failed to drop partial collection");
                }
                return Err(e);
            }
        }

        progress.report(IndexEvent::Stored {
            collection: collection.clone(),
            points: points.len(),
        });
        info!(
            collection = %collection,
            points = points.len(),
            backend = self.store.backend(),
            model = self.embedder.model_name(),
            "index built"
        );

        Ok(IndexHandle {
            name: name.to_string(),
            collection,
            points: points.len(),
            owned: true,
            store: Arc::clone(&self.store),
            embedder: Arc::clone(&self.embedder),
        })
    }
}

fn generation_name(name: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{}-{}", name, &id[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{chunk_text, ChunkConfig};
    use crate::embedding::HashingEmbedder;
    use crate::progress::NoProgress;
    use crate::store::memory::InMemoryVectorStore;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<IndexEvent>>);

    impl IndexProgress for Recorder {
        fn report(&self, event: IndexEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    fn chunks(n: usize) -> Vec<Chunk> {
        let text = (0..n)
            .map(|i| format!("{:02} clause text", i))
            .collect::<Vec<_>>()
            .join("\n");
        chunk_text(&text, &ChunkConfig::new(16, 0)).unwrap()
    }

    #[tokio::test]
    async fn build_writes_every_chunk() {
        let store = Arc::new(InMemoryVectorStore::new());
        let indexer = Indexer::new(Arc::new(HashingEmbedder::new(32)), store.clone())
            .with_batch_size(3);
        let chunks = chunks(7);
        let recorder = Recorder(Mutex::new(Vec::new()));

        let handle = indexer.build("beginning", &chunks, &recorder).await.unwrap();

        assert!(handle.collection().starts_with("beginning-"));
        assert_eq!(handle.name(), "beginning");
        assert_eq!(handle.points(), chunks.len());
        assert_eq!(store.point_count(handle.collection()), Some(chunks.len()));

        let events = recorder.0.into_inner().unwrap();
        assert!(matches!(events.first(), Some(IndexEvent::Started { .. })));
        assert!(matches!(events.last(), Some(IndexEvent::Stored { points, .. }) if *points == chunks.len()));
    }

    #[tokio::test]
    async fn each_build_gets_its_own_generation() {
        let store = Arc::new(InMemoryVectorStore::new());
        let indexer = Indexer::new(Arc::new(HashingEmbedder::new(8)), store.clone());
        let a = indexer.build("docs", &chunks(2), &NoProgress).await.unwrap();
        let b = indexer.build("docs", &chunks(2), &NoProgress).await.unwrap();
        assert_ne!(a.collection(), b.collection());
        assert_eq!(store.collection_names().len(), 2);
    }

    #[tokio::test]
    async fn empty_chunks_yield_empty_collection() {
        let store = Arc::new(InMemoryVectorStore::new());
        let indexer = Indexer::new(Arc::new(HashingEmbedder::new(8)), store.clone());
        let handle = indexer.build("docs", &[], &NoProgress).await.unwrap();
        assert_eq!(store.point_count(handle.collection()), Some(0));
    }

    struct ShortEmbedder;

    #[async_trait::async_trait]
    impl Embedder for ShortEmbedder {
        fn model_name(&self) -> &str {
            "short"
        }
        fn dims(&self) -> usize {
            4
        }
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().skip(1).map(|_| vec![0.0; 4]).collect())
        }
    }

    #[tokio::test]
    async fn vector_count_mismatch_is_embedding_error() {
        let store = Arc::new(InMemoryVectorStore::new());
        let indexer = Indexer::new(Arc::new(ShortEmbedder), store.clone());
        let err = indexer.build("docs", &chunks(3), &NoProgress).await.unwrap_err();
        assert!(matches!(err, Error::EmbeddingService { .. }));
        assert!(store.collection_names().is_empty());
    }
}
