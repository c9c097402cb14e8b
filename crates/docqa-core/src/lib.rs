//! # docqa core
//!
//! The retrieval-augmented question-answering pipeline, independent of any
//! concrete embedding model, vector database, or completion endpoint.
//!
//! ```text
//! text ──▶ chunk ──▶ Indexer ──▶ IndexHandle ─┐
//!                                             ▼
//! query ─────────────────────────────▶ Responder ──▶ CompletionService ──▶ Answer
//!                                             ▲
//!                                 Session { Option<IndexHandle>, Conversation }
//! ```
//!
//! This crate performs no network or filesystem I/O of its own. Services
//! are injected through the [`Embedder`](embedding::Embedder),
//! [`VectorStore`](store::VectorStore) and
//! [`CompletionService`](completion::CompletionService) traits.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`chunk`] | Separator-aware overlapping chunker |
//! | [`embedding`] | Embedder trait, hashing embedder, cosine similarity |
//! | [`store`] | Vector store trait and in-memory backend |
//! | [`index`] | Staged index builds and [`IndexHandle`](index::IndexHandle) |
//! | [`retrieve`] | Top-k similarity retrieval |
//! | [`prompt`] | Grounded / no-index prompt templates |
//! | [`respond`] | Query answering |
//! | [`conversation`] | Append-only turn log |
//! | [`session`] | Per-session state |

pub mod chunk;
pub mod completion;
pub mod conversation;
pub mod embedding;
pub mod error;
pub mod index;
pub mod models;
pub mod progress;
pub mod prompt;
pub mod respond;
pub mod retrieve;
pub mod session;
pub mod store;

pub use error::{Error, Result};
