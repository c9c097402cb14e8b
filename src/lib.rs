//! # docqa
//!
//! Ask questions about your documents. Upload PDFs, DOCX or text files;
//! docqa splits them into overlapping chunks, embeds them into a Qdrant
//! collection, and answers questions by sending the closest passages with
//! the question to a chat-completion model. Without documents it answers
//! from the configured subject domain alone.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌─────────────┐   ┌──────────┐
//! │  extract   │──▶│ chunk+embed │──▶│  Qdrant  │
//! │ PDF/DOCX/… │   │  (Indexer)  │   │ / memory │
//! └────────────┘   └─────────────┘   └────┬─────┘
//!                                         │ top-k
//!                  ┌──────────────┐       ▼
//!   query ────────▶│  Responder   │◀── context
//!                  └──────┬───────┘
//!                         ▼
//!                  chat completion (Groq)
//! ```
//!
//! The pipeline itself lives in [`docqa_core`]; this crate supplies the
//! concrete services, configuration and the `docqa` CLI.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment secrets |
//! | [`extract`] | PDF / DOCX / text extraction and file loading |
//! | [`embedding`] | OpenAI, Ollama, fastembed and hashing embedders |
//! | [`qdrant`] | Qdrant vector store |
//! | [`completion`] | OpenAI-compatible chat-completion client |
//! | [`ingest`] | Extract → chunk → index orchestration |
//! | [`ask`] | One-shot answers |
//! | [`chat`] | Interactive REPL |
//! | [`progress`] | Index progress rendering |

pub mod ask;
pub mod chat;
pub mod completion;
pub mod config;
pub mod embedding;
pub mod extract;
pub mod http;
pub mod ingest;
pub mod progress;
pub mod qdrant;
