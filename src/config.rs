//! Configuration parsing and validation.
//!
//! Settings are read from a TOML file (default `./config/docqa.toml`).
//! Every section and field has a default, so an empty file, or no file at
//! the default path, yields a working configuration. Credentials never live
//! in the file: [`Secrets::from_env`] reads them from the environment.
//!
//! # Example
//!
//! ```toml
//! [chunking]
//! chunk_size = 1000
//! chunk_overlap = 200
//!
//! [retrieval]
//! top_k = 5
//!
//! [embedding]
//! provider = "local"
//! model = "bge-base-en-v1.5"
//!
//! [vector_store]
//! backend = "qdrant"
//! collection = "beginning"
//!
//! [completion]
//! base_url = "https://api.groq.com/openai/v1"
//! model = "llama3-70b-8192"
//!
//! [prompt]
//! domain = "Indian law as codified in the BNSS, BNS and BSA"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use docqa_core::chunk::ChunkConfig;
use docqa_core::prompt::PromptTemplate;
use docqa_core::respond::DEFAULT_MODEL;
use docqa_core::retrieve::DEFAULT_TOP_K;

/// Path used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "./config/docqa.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub vector_store: VectorStoreConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub prompt: PromptTemplate,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// `local`, `openai`, `ollama`, or `hashing`.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL for `openai` and `ollama` providers.
    #[serde(default)]
    pub url: Option<String>,
    /// Environment variable holding the key for the `openai` provider.
    #[serde(default = "default_embedding_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: None,
            url: None,
            api_key_env: default_embedding_key_env(),
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "local".to_string()
}
fn default_embedding_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct VectorStoreConfig {
    /// `qdrant` or `memory`.
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Logical collection name; each index build writes `<collection>-<generation>`.
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_host_env")]
    pub host_env: String,
    #[serde(default = "default_store_key_env")]
    pub api_key_env: String,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            collection: default_collection(),
            host_env: default_host_env(),
            api_key_env: default_store_key_env(),
        }
    }
}

fn default_backend() -> String {
    "qdrant".to_string()
}
fn default_collection() -> String {
    "beginning".to_string()
}
fn default_host_env() -> String {
    "QDRANT_HOST".to_string()
}
fn default_store_key_env() -> String {
    "QDRANT_API_KEY".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompletionConfig {
    /// OpenAI-compatible API base; `/chat/completions` is appended.
    #[serde(default = "default_completion_url")]
    pub base_url: String,
    #[serde(default = "default_completion_model")]
    pub model: String,
    #[serde(default = "default_completion_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_completion_timeout")]
    pub timeout_secs: u64,
    /// Extra attempts after a failed request. 0 means a single request.
    #[serde(default)]
    pub max_retries: u32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: default_completion_url(),
            model: default_completion_model(),
            api_key_env: default_completion_key_env(),
            timeout_secs: default_completion_timeout(),
            max_retries: 0,
        }
    }
}

fn default_completion_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}
fn default_completion_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_completion_key_env() -> String {
    "GROQ_API_KEY".to_string()
}
fn default_completion_timeout() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    /// Globs (relative to a directory argument) selecting files to load.
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

fn default_include_globs() -> Vec<String> {
    vec![
        "**/*.pdf".to_string(),
        "**/*.docx".to_string(),
        "**/*.txt".to_string(),
        "**/*.md".to_string(),
    ]
}

/// Load and validate the configuration at `path`.
///
/// When `explicit` is false and the file does not exist, defaults are
/// used. A missing file that was asked for by name is an error.
pub fn load_config(path: &Path, explicit: bool) -> Result<Config> {
    if !path.exists() && !explicit {
        let config = Config::default();
        validate(&config)?;
        return Ok(config);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    config.chunking.validate()?;

    if config.retrieval.top_k < 1 {
        bail!("retrieval.top_k must be >= 1");
    }

    if config.embedding.batch_size == 0 {
        bail!("embedding.batch_size must be > 0");
    }
    if config.embedding.dims == Some(0) {
        bail!("embedding.dims must be > 0");
    }
    match config.embedding.provider.as_str() {
        "local" | "hashing" => {}
        "openai" | "ollama" => {
            if config.embedding.model.is_none() || config.embedding.dims.is_none() {
                bail!(
                    "embedding.model and embedding.dims must be specified when provider is '{}'",
                    config.embedding.provider
                );
            }
        }
        other => bail!(
            "Unknown embedding provider: '{}'. Must be local, openai, ollama, or hashing.",
            other
        ),
    }

    match config.vector_store.backend.as_str() {
        "qdrant" | "memory" => {}
        other => bail!(
            "Unknown vector store backend: '{}'. Must be qdrant or memory.",
            other
        ),
    }
    if config.vector_store.collection.trim().is_empty() {
        bail!("vector_store.collection must not be empty");
    }

    if config.completion.model.trim().is_empty() {
        bail!("completion.model must not be empty");
    }

    Ok(())
}

/// Credentials and endpoints read from the environment.
///
/// Only the variables a command actually needs are required; the rest
/// stay `None`.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    pub completion_api_key: Option<String>,
    pub store_url: Option<String>,
    pub store_api_key: Option<String>,
    pub embedding_api_key: Option<String>,
}

/// Which services a command will talk to.
#[derive(Debug, Clone, Copy, Default)]
pub struct Needs {
    pub completion: bool,
    pub index: bool,
}

impl Secrets {
    /// Read the variables required for `needs`.
    ///
    /// Fails with [`docqa_core::Error::Config`] naming the first missing
    /// variable, before any pipeline work starts.
    pub fn from_env(config: &Config, needs: Needs) -> docqa_core::Result<Self> {
        let mut secrets = Secrets::default();
        if needs.completion {
            secrets.completion_api_key = Some(require_env(&config.completion.api_key_env)?);
        }
        if needs.index {
            if config.vector_store.backend == "qdrant" {
                secrets.store_url = Some(require_env(&config.vector_store.host_env)?);
                secrets.store_api_key = Some(require_env(&config.vector_store.api_key_env)?);
            }
            if config.embedding.provider == "openai" {
                secrets.embedding_api_key = Some(require_env(&config.embedding.api_key_env)?);
            }
        }
        Ok(secrets)
    }
}

fn require_env(name: &str) -> docqa_core::Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(docqa_core::Error::Config(format!(
            "environment variable {} is not set",
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_without_file() {
        let tmp = TempDir::new().unwrap();
        let cfg = load_config(&tmp.path().join("absent.toml"), false).unwrap();
        assert_eq!(cfg.chunking.chunk_size, 1000);
        assert_eq!(cfg.chunking.chunk_overlap, 200);
        assert_eq!(cfg.chunking.separator, "\n");
        assert_eq!(cfg.retrieval.top_k, 5);
        assert_eq!(cfg.completion.model, "llama3-70b-8192");
        assert_eq!(cfg.completion.max_retries, 0);
        assert_eq!(cfg.vector_store.backend, "qdrant");
        assert!(cfg.prompt.domain.contains("Bharatiya Nyaya Sanhita"));
    }

    #[test]
    fn explicit_missing_file_is_error() {
        let tmp = TempDir::new().unwrap();
        assert!(load_config(&tmp.path().join("absent.toml"), true).is_err());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("docqa.toml");
        fs::write(
            &path,
            "[chunking]\nchunk_size = 400\nchunk_overlap = 50\n\n[prompt]\ndomain = \"maritime law\"\n",
        )
        .unwrap();
        let cfg = load_config(&path, true).unwrap();
        assert_eq!(cfg.chunking.chunk_size, 400);
        assert_eq!(cfg.chunking.separator, "\n");
        assert_eq!(cfg.prompt.domain, "maritime law");
        assert_eq!(cfg.embedding.provider, "local");
    }

    #[test]
    fn overlap_not_below_size_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("docqa.toml");
        fs::write(&path, "[chunking]\nchunk_size = 100\nchunk_overlap = 100\n").unwrap();
        let err = load_config(&path, true).unwrap_err();
        assert!(err.to_string().contains("chunk_overlap"), "{}", err);
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("docqa.toml");
        fs::write(&path, "[embedding]\nprovider = \"magic\"\n").unwrap();
        assert!(load_config(&path, true).is_err());
    }

    #[test]
    fn missing_env_names_the_variable() {
        let mut cfg = Config::default();
        cfg.completion.api_key_env = "DOCQA_TEST_SURELY_UNSET_KEY".to_string();
        let err = Secrets::from_env(
            &cfg,
            Needs {
                completion: true,
                index: false,
            },
        )
        .unwrap_err();
        assert!(matches!(err, docqa_core::Error::Config(_)));
        assert!(err.to_string().contains("DOCQA_TEST_SURELY_UNSET_KEY"));
    }

    #[test]
    fn memory_backend_needs_no_store_env() {
        let mut cfg = Config::default();
        cfg.vector_store.backend = "memory".to_string();
        cfg.vector_store.host_env = "DOCQA_TEST_SURELY_UNSET_HOST".to_string();
        let secrets = Secrets::from_env(
            &cfg,
            Needs {
                completion: false,
                index: true,
            },
        )
        .unwrap();
        assert!(secrets.store_url.is_none());
    }
}
