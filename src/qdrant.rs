//! Qdrant vector store backend.
//!
//! [`QdrantVectorStore`] implements [`VectorStore`] over gRPC with
//! [qdrant-client](https://docs.rs/qdrant-client). Collections use cosine
//! distance; each point is keyed by its chunk ordinal and carries
//! `{ "text", "index" }` as payload.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, ScoredPoint, SearchPointsBuilder,
    UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant, QdrantError};
use tracing::debug;

use docqa_core::models::RetrievedChunk;
use docqa_core::store::{sort_hits, StoredPoint, VectorStore};
use docqa_core::{Error, Result};

/// A [`VectorStore`] backed by [Qdrant](https://qdrant.tech/).
pub struct QdrantVectorStore {
    client: Qdrant,
}

impl QdrantVectorStore {
    /// Connect to `url` (e.g. `https://xyz.cloud.qdrant.io:6334`).
    ///
    /// No request is made here; an unreachable endpoint surfaces on the
    /// first operation.
    pub fn new(url: &str, api_key: Option<String>, timeout_secs: u64) -> Result<Self> {
        let client = Qdrant::from_url(url)
            .api_key(api_key)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("invalid qdrant endpoint '{}': {}", url, e)))?;
        Ok(Self { client })
    }

    fn write_err(collection: &str, e: QdrantError) -> Error {
        Error::store_write(collection, e)
    }

    fn read_err(collection: &str, e: QdrantError) -> Error {
        Error::retrieval(collection, e)
    }
}

/// Points requested per search. Qdrant does not order equal scores, so
/// extra candidates are fetched and ties at the cut are settled locally.
fn search_limit(k: usize) -> u64 {
    k.saturating_mul(2).max(k.saturating_add(1)) as u64
}

fn rank(mut hits: Vec<RetrievedChunk>, k: usize) -> Vec<RetrievedChunk> {
    sort_hits(&mut hits);
    hits.truncate(k);
    hits
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    fn backend(&self) -> &str {
        "qdrant"
    }

    async fn ensure_collection(&self, name: &str, dims: usize) -> Result<()> {
        let exists = self
            .client
            .collection_exists(name)
            .await
            .map_err(|e| Self::write_err(name, e))?;
        if exists {
            debug!(collection = name, "qdrant collection already exists, skipping creation");
            return Ok(());
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(name)
                    .vectors_config(VectorParamsBuilder::new(dims as u64, Distance::Cosine)),
            )
            .await
            .map_err(|e| Self::write_err(name, e))?;

        debug!(collection = name, dims, "created qdrant collection");
        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        self.client
            .collection_exists(name)
            .await
            .map_err(|e| Self::read_err(name, e))
    }

    async fn upsert(&self, collection: &str, points: &[StoredPoint]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }

        let mut structs = Vec::with_capacity(points.len());
        for point in points {
            let payload = Payload::try_from(serde_json::json!({
                "text": point.text,
                "index": point.id,
            }))
            .map_err(|e| Self::write_err(collection, e))?;
            structs.push(PointStruct::new(point.id, point.vector.clone(), payload));
        }

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, structs).wait(true))
            .await
            .map_err(|e| Self::write_err(collection, e))?;

        debug!(collection, count = points.len(), "upserted points to qdrant");
        Ok(())
    }

    async fn similarity_search(
        &self,
        collection: &str,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(collection, vector.to_vec(), search_limit(k))
                    .with_payload(true),
            )
            .await
            .map_err(|e| Self::read_err(collection, e))?;

        let mut hits: Vec<RetrievedChunk> = response.result.into_iter().map(hit_from_scored).collect();
        Ok(rank(hits, k))
    }

    async fn drop_collection(&self, name: &str) -> Result<()> {
        self.client
            .delete_collection(name)
            .await
            .map_err(|e| Self::write_err(name, e))?;
        debug!(collection = name, "deleted qdrant collection");
        Ok(())
    }
}

fn hit_from_scored(scored: ScoredPoint) -> RetrievedChunk {
    let id_index = scored
        .id
        .as_ref()
        .and_then(|pid| match &pid.point_id_options {
            Some(PointIdOptions::Num(n)) => Some(*n as usize),
            _ => None,
        });
    let index = payload_index(&scored.payload).or(id_index).unwrap_or_default();
    let text = scored
        .payload
        .get("text")
        .and_then(|v| match &v.kind {
            Some(Kind::StringValue(s)) => Some(s.clone()),
            _ => None,
        })
        .unwrap_or_default();

    RetrievedChunk {
        index,
        text,
        score: scored.score,
    }
}

fn payload_index(payload: &HashMap<String, QdrantValue>) -> Option<usize> {
    match payload.get("index").and_then(|v| v.kind.as_ref()) {
        Some(Kind::IntegerValue(i)) => usize::try_from(*i).ok(),
        Some(Kind::DoubleValue(d)) if *d >= 0.0 => Some(*d as usize),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdrant_client::qdrant::PointId;

    fn scored(id: u64, payload: Vec<(&str, QdrantValue)>, score: f32) -> ScoredPoint {
        ScoredPoint {
            id: Some(PointId::from(id)),
            payload: payload
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            score,
            ..Default::default()
        }
    }

    #[test]
    fn hit_reads_text_and_index_from_payload() {
        let hit = hit_from_scored(scored(
            9,
            vec![
                ("text", QdrantValue::from("Section 103. Punishment for murder.")),
                ("index", QdrantValue::from(4i64)),
            ],
            0.82,
        ));
        assert_eq!(hit.index, 4);
        assert_eq!(hit.text, "Section 103. Punishment for murder.");
        assert!((hit.score - 0.82).abs() < 1e-6);
    }

    #[test]
    fn hit_falls_back_to_point_id() {
        let hit = hit_from_scored(scored(7, vec![("text", QdrantValue::from("x"))], 0.1));
        assert_eq!(hit.index, 7);
    }

    #[test]
    fn equal_scores_sort_by_ordinal() {
        let mut hits: Vec<RetrievedChunk> = vec![
            scored(5, vec![("text", QdrantValue::from("e"))], 0.5),
            scored(2, vec![("text", QdrantValue::from("b"))], 0.5),
            scored(9, vec![("text", QdrantValue::from("i"))], 0.9),
        ]
        .into_iter()
        .map(hit_from_scored)
        .collect();
        sort_hits(&mut hits);
        let order: Vec<usize> = hits.iter().map(|h| h.index).collect();
        assert_eq!(order, vec![9, 2, 5]);
    }

    #[test]
    fn search_fetches_more_than_k() {
        assert_eq!(search_limit(1), 2);
        assert_eq!(search_limit(5), 10);
        assert!(search_limit(usize::MAX) >= 1);
    }

    #[test]
    fn ties_at_the_cut_keep_lowest_ordinals() {
        // Server order puts the higher ordinals first among the tied hits.
        let hits: Vec<RetrievedChunk> = vec![
            scored(9, vec![("text", QdrantValue::from("top"))], 0.9),
            scored(7, vec![("text", QdrantValue::from("g"))], 0.4),
            scored(6, vec![("text", QdrantValue::from("f"))], 0.4),
            scored(1, vec![("text", QdrantValue::from("a"))], 0.4),
            scored(3, vec![("text", QdrantValue::from("c"))], 0.4),
        ]
        .into_iter()
        .map(hit_from_scored)
        .collect();
        let order: Vec<usize> = rank(hits, 3).iter().map(|h| h.index).collect();
        assert_eq!(order, vec![9, 1, 3]);
    }
}
