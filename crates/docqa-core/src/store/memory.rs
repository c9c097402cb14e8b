//! In-memory [`VectorStore`] for tests and offline runs.
//!
//! Uses a `HashMap` of collections behind `std::sync::RwLock`. Search is
//! brute-force cosine similarity over every point in the collection.
//! Contents live only as long as the process.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::error::{Error, Result};
use crate::models::RetrievedChunk;

use super::{sort_hits, StoredPoint, VectorStore};

struct Collection {
    dims: usize,
    points: Vec<StoredPoint>,
}

/// In-memory vector store.
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Number of points in a collection, if it exists.
    pub fn point_count(&self, name: &str) -> Option<usize> {
        self.collections
            .read()
            .ok()
            .and_then(|c| c.get(name).map(|col| col.points.len()))
    }

    /// Names of all collections, sorted.
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .collections
            .read()
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn backend(&self) -> &str {
        "memory"
    }

    async fn ensure_collection(&self, name: &str, dims: usize) -> Result<()> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| Error::store_write(name, "store lock poisoned"))?;
        collections.entry(name.to_string()).or_insert(Collection {
            dims,
            points: Vec::new(),
        });
        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        let collections = self
            .collections
            .read()
            .map_err(|_| Error::retrieval(name, "store lock poisoned"))?;
        Ok(collections.contains_key(name))
    }

    async fn upsert(&self, collection: &str, points: &[StoredPoint]) -> Result<()> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| Error::store_write(collection, "store lock poisoned"))?;
        let col = collections
            .get_mut(collection)
            .ok_or_else(|| Error::store_write(collection, "collection does not exist"))?;

        for p in points {
            if p.vector.len() != col.dims {
                return Err(Error::store_write(
                    collection,
                    format!(
                        "vector for point {} has {} dims, collection expects {}",
                        p.id,
                        p.vector.len(),
                        col.dims
                    ),
                ));
            }
        }

        for p in points {
            match col.points.iter_mut().find(|existing| existing.id == p.id) {
                Some(existing) => *existing = p.clone(),
                None => col.points.push(p.clone()),
            }
        }
        Ok(())
    }

    async fn similarity_search(
        &self,
        collection: &str,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        let collections = self
            .collections
            .read()
            .map_err(|_| Error::retrieval(collection, "store lock poisoned"))?;
        let col = collections
            .get(collection)
            .ok_or_else(|| Error::retrieval(collection, "collection does not exist"))?;

        let mut hits: Vec<RetrievedChunk> = col
            .points
            .iter()
            .map(|p| RetrievedChunk {
                index: p.id as usize,
                text: p.text.clone(),
                score: cosine_similarity(vector, &p.vector),
            })
            .collect();
        sort_hits(&mut hits);
        hits.truncate(k);
        Ok(hits)
    }

    async fn drop_collection(&self, name: &str) -> Result<()> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| Error::store_write(name, "store lock poisoned"))?;
        collections.remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: u64, vector: Vec<f32>) -> StoredPoint {
        StoredPoint {
            id,
            vector,
            text: format!("text {id}"),
        }
    }

    #[tokio::test]
    async fn search_orders_by_score() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("c", 2).await.unwrap();
        store
            .upsert(
                "c",
                &[
                    point(0, vec![0.0, 1.0]),
                    point(1, vec![1.0, 0.0]),
                    point(2, vec![0.7, 0.7]),
                ],
            )
            .await
            .unwrap();

        let hits = store.similarity_search("c", &[1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].index, 1);
        assert_eq!(hits[1].index, 2);
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn upsert_replaces_same_id() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("c", 1).await.unwrap();
        store.upsert("c", &[point(0, vec![1.0])]).await.unwrap();
        store.upsert("c", &[point(0, vec![1.0])]).await.unwrap();
        assert_eq!(store.point_count("c"), Some(1));
    }

    #[tokio::test]
    async fn dimension_mismatch_is_write_error() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("c", 3).await.unwrap();
        let err = store.upsert("c", &[point(0, vec![1.0])]).await.unwrap_err();
        assert!(matches!(err, Error::StoreWrite { .. }));
        assert_eq!(store.point_count("c"), Some(0));
    }

    #[tokio::test]
    async fn missing_collection_is_retrieval_error() {
        let store = InMemoryVectorStore::new();
        let err = store.similarity_search("nope", &[1.0], 5).await.unwrap_err();
        assert!(matches!(err, Error::Retrieval { .. }));
    }

    #[tokio::test]
    async fn ensure_collection_is_idempotent_and_drop_removes() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("c", 1).await.unwrap();
        store.upsert("c", &[point(0, vec![1.0])]).await.unwrap();
        store.ensure_collection("c", 1).await.unwrap();
        assert_eq!(store.point_count("c"), Some(1));

        store.drop_collection("c").await.unwrap();
        assert!(!store.collection_exists("c").await.unwrap());
    }
}
