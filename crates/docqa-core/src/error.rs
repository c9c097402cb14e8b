//! Error taxonomy shared by every pipeline stage.
//!
//! Each variant names the stage that failed. None of them are retried
//! implicitly by the core; callers decide what to show the user and the
//! session keeps its state intact.

use thiserror::Error;

/// Errors raised by the extraction, chunking, indexing, retrieval and
/// completion stages.
#[derive(Debug, Error)]
pub enum Error {
    /// A document could not be read or decoded.
    #[error("extraction failed for '{document}': {message}")]
    Extraction {
        /// Display name of the offending document.
        document: String,
        /// A description of the failure.
        message: String,
    },

    /// Invalid chunking parameters or missing required configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The embedding service was unavailable, timed out, or returned
    /// something unusable.
    #[error("embedding service error ({provider}): {message}")]
    EmbeddingService {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// Creating a collection or writing points to it failed.
    #[error("vector store write failed ({collection}): {message}")]
    StoreWrite {
        /// The physical collection being written.
        collection: String,
        /// A description of the failure.
        message: String,
    },

    /// The collection is gone or the store could not be queried.
    #[error("retrieval failed ({collection}): {message}")]
    Retrieval {
        /// The physical collection being searched.
        collection: String,
        /// A description of the failure.
        message: String,
    },

    /// The completion service timed out, returned a non-2xx status, or
    /// a malformed body.
    #[error("completion service error: {0}")]
    CompletionService(String),
}

impl Error {
    pub fn extraction(document: impl Into<String>, message: impl ToString) -> Self {
        Error::Extraction {
            document: document.into(),
            message: message.to_string(),
        }
    }

    pub fn embedding(provider: impl Into<String>, message: impl ToString) -> Self {
        Error::EmbeddingService {
            provider: provider.into(),
            message: message.to_string(),
        }
    }

    pub fn store_write(collection: impl Into<String>, message: impl ToString) -> Self {
        Error::StoreWrite {
            collection: collection.into(),
            message: message.to_string(),
        }
    }

    pub fn retrieval(collection: impl Into<String>, message: impl ToString) -> Self {
        Error::Retrieval {
            collection: collection.into(),
            message: message.to_string(),
        }
    }
}

/// Convenience result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
