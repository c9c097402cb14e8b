//! Ingestion: documents on disk → extracted text → chunks → index.
//!
//! ```text
//! paths ──▶ load_documents ──▶ extract_all ──▶ chunk_text ──▶ Indexer::build
//! ```
//!
//! Also wires the configured embedder and vector store into an
//! [`Indexer`], which the chat REPL reuses for `/embed`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::info;

use docqa_core::chunk::chunk_text;
use docqa_core::index::Indexer;
use docqa_core::models::Chunk;
use docqa_core::progress::IndexProgress;
use docqa_core::store::memory::InMemoryVectorStore;
use docqa_core::store::VectorStore;

use crate::config::{Config, Secrets};
use crate::embedding::create_embedder;
use crate::extract::{extract_all, load_documents};
use crate::qdrant::QdrantVectorStore;

const QDRANT_TIMEOUT_SECS: u64 = 30;

/// Create the vector store named by `vector_store.backend`.
pub fn create_store(config: &Config, secrets: &Secrets) -> Result<Arc<dyn VectorStore>> {
    match config.vector_store.backend.as_str() {
        "qdrant" => {
            let url = secrets
                .store_url
                .as_deref()
                .ok_or_else(|| anyhow!("{} not set", config.vector_store.host_env))?;
            Ok(Arc::new(QdrantVectorStore::new(
                url,
                secrets.store_api_key.clone(),
                QDRANT_TIMEOUT_SECS,
            )?))
        }
        "memory" => Ok(Arc::new(InMemoryVectorStore::new())),
        other => Err(anyhow!("Unknown vector store backend: {}", other)),
    }
}

/// Build an [`Indexer`] over the configured embedder and store.
pub fn create_indexer(config: &Config, secrets: &Secrets) -> Result<Indexer> {
    let embedder = create_embedder(&config.embedding, secrets)?;
    let store = create_store(config, secrets)?;
    Ok(Indexer::new(embedder, store).with_batch_size(config.embedding.batch_size))
}

/// Result of reading and chunking a set of paths.
#[derive(Debug)]
pub struct Prepared {
    pub documents: usize,
    pub chars: usize,
    pub chunks: Vec<Chunk>,
}

/// Load, extract and chunk `paths`. No service is contacted.
pub fn prepare(config: &Config, paths: &[PathBuf]) -> Result<Prepared> {
    let docs = load_documents(paths, &config.ingest)?;
    let text = extract_all(&docs)?;
    let chunks = chunk_text(&text, &config.chunking)?;
    Ok(Prepared {
        documents: docs.len(),
        chars: text.chars().count(),
        chunks,
    })
}

/// `docqa chunk`: print the chunk table for `paths`.
pub fn run_chunk(config: &Config, paths: &[PathBuf]) -> Result<()> {
    let prepared = prepare(config, paths)?;
    println!(
        "documents: {}  chars: {}  chunks: {}",
        prepared.documents,
        prepared.chars,
        prepared.chunks.len()
    );
    for chunk in &prepared.chunks {
        println!(
            "  #{:<4} [{}..{})  overlap {:<4} {}",
            chunk.index,
            chunk.start,
            chunk.end,
            chunk.overlap,
            preview(&chunk.text, 60)
        );
    }
    Ok(())
}

/// `docqa ingest`: index `paths` into a new generation of `collection`
/// and print the physical collection name.
pub async fn run_ingest(
    config: &Config,
    secrets: &Secrets,
    paths: &[PathBuf],
    collection: Option<String>,
    progress: &dyn IndexProgress,
) -> Result<()> {
    let indexer = create_indexer(config, secrets)?;
    let prepared = prepare(config, paths)?;
    let name = collection.unwrap_or_else(|| config.vector_store.collection.clone());

    let handle = indexer.build(&name, &prepared.chunks, progress).await?;
    info!(
        collection = handle.collection(),
        documents = prepared.documents,
        chunks = prepared.chunks.len(),
        "ingest complete"
    );

    println!("Ingest {}", name);
    println!("  documents: {}", prepared.documents);
    println!("  chunks: {}", prepared.chunks.len());
    println!("  collection: {}", handle.collection());
    println!("ok");
    Ok(())
}

/// First `max` characters of `text` on one line.
pub fn preview(text: &str, max: usize) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    if flat.chars().count() > max {
        let cut: String = flat.chars().take(max).collect();
        format!("{}...", cut)
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_core::progress::NoProgress;
    use std::fs;
    use tempfile::TempDir;

    fn offline_config() -> Config {
        let mut config = Config::default();
        config.embedding.provider = "hashing".to_string();
        config.embedding.dims = Some(32);
        config.vector_store.backend = "memory".to_string();
        config
    }

    #[test]
    fn prepare_reads_directory_in_sorted_order() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.txt"), "second\n").unwrap();
        fs::write(tmp.path().join("a.md"), "first\n").unwrap();
        fs::write(tmp.path().join("skip.csv"), "ignored").unwrap();

        let prepared = prepare(&offline_config(), &[tmp.path().to_path_buf()]).unwrap();
        assert_eq!(prepared.documents, 2);
        assert_eq!(prepared.chunks.len(), 1);
        assert_eq!(prepared.chunks[0].text, "first\nsecond\n");
    }

    #[test]
    fn unknown_extension_given_explicitly_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("table.csv");
        fs::write(&path, "a,b").unwrap();
        let err = prepare(&offline_config(), &[path]).unwrap_err();
        assert!(err.to_string().contains("table.csv"), "{}", err);
    }

    #[test]
    fn preview_flattens_and_truncates() {
        assert_eq!(preview("a\nb", 10), "a b");
        assert_eq!(preview("abcdef", 3), "abc...");
    }

    #[tokio::test]
    async fn indexer_from_offline_config_builds() {
        let config = offline_config();
        let indexer = create_indexer(&config, &Secrets::default()).unwrap();
        let chunks = chunk_text("A\nB\nC", &config.chunking).unwrap();
        let handle = indexer.build("beginning", &chunks, &NoProgress).await.unwrap();
        assert_eq!(handle.points(), 1);
        assert_eq!(handle.store().backend(), "memory");
    }
}
