//! Responder: picks the prompt mode, retrieves context, and calls the
//! completion service.
//!
//! ```text
//! index? ─┬─ None ─────────────────────────────▶ NoIndex ───────────┐
//!         └─ Some ──▶ retrieve(k) ─┬─ no hits ──▶ NoIndex ───────────┼──▶ complete() ──▶ Answer
//!                                  └─ hits ─────▶ Grounded{context} ─┘
//! ```

use std::sync::Arc;

use tracing::info;

use crate::completion::CompletionService;
use crate::error::Result;
use crate::index::IndexHandle;
use crate::models::RetrievedChunk;
use crate::prompt::{AnswerMode, PromptMode, PromptTemplate};
use crate::retrieve::{context_block, retrieve, DEFAULT_TOP_K};

/// Default completion model identifier.
pub const DEFAULT_MODEL: &str = "llama3-70b-8192";

/// The answer to one query.
#[derive(Debug, Clone)]
pub struct Answer {
    /// Completion text, exactly as returned by the service.
    pub text: String,
    pub mode: AnswerMode,
    /// Chunks that grounded the answer (empty in `NoIndex` mode).
    pub sources: Vec<RetrievedChunk>,
}

/// Answers queries against an optional index.
///
/// Holds an explicitly constructed completion service; there is no
/// process-wide client.
pub struct Responder {
    completion: Arc<dyn CompletionService>,
    model: String,
    template: PromptTemplate,
    top_k: usize,
}

impl Responder {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self {
            completion,
            model: DEFAULT_MODEL.to_string(),
            template: PromptTemplate::default(),
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Answer `query`, grounded in `index` when one is present.
    ///
    /// # Errors
    ///
    /// Retrieval and embedding errors in grounded mode; completion errors
    /// in both modes. Nothing is retried here.
    pub async fn respond(&self, index: Option<&IndexHandle>, query: &str) -> Result<Answer> {
        let (mode, sources) = match index {
            Some(handle) => {
                let sources = retrieve(handle, query, self.top_k).await?;
                if sources.is_empty() {
                    // Nothing was indexed; an empty context would refuse every query.
                    (PromptMode::NoIndex, sources)
                } else {
                    let context = context_block(&sources);
                    (PromptMode::Grounded { context }, sources)
                }
            }
            None => (PromptMode::NoIndex, Vec::new()),
        };

        let messages = self.template.compose(&mode, query);
        let text = self.completion.complete(&messages, &self.model).await?;

        info!(
            mode = ?mode.kind(),
            model = %self.model,
            sources = sources.len(),
            answer_len = text.len(),
            "answered query"
        );

        Ok(Answer {
            text,
            mode: mode.kind(),
            sources,
        })
    }
}
