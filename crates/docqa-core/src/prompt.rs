//! Prompt composition for the two answering modes.
//!
//! [`PromptMode::Grounded`] carries the retrieved context block;
//! [`PromptMode::NoIndex`] carries nothing and asks the model to stay
//! within the configured domain. Both produce the same payload shape:
//! an instruction message followed by the literal user query.

use serde::{Deserialize, Serialize};

use crate::models::ChatMessage;

/// Default subject domain for ungrounded answers and citation hints.
pub const DEFAULT_DOMAIN: &str = "Indian law as codified in the Bharatiya Nagarik Suraksha Sanhita (BNSS), \
Bharatiya Nyaya Sanhita (BNS) and Bharatiya Sakshya Adhiniyam (BSA)";

/// Which prompt template a query is answered with.
///
/// Decided per query from whether the session holds an index; there is
/// no persistent mode switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptMode {
    /// No index: answer from domain knowledge, decline unrelated queries.
    NoIndex,
    /// Answer only from the supplied context block.
    Grounded { context: String },
}

/// Discriminant of [`PromptMode`] without the payload, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMode {
    NoIndex,
    Grounded,
}

impl PromptMode {
    pub fn kind(&self) -> AnswerMode {
        match self {
            PromptMode::NoIndex => AnswerMode::NoIndex,
            PromptMode::Grounded { .. } => AnswerMode::Grounded,
        }
    }
}

/// Instruction wording, parameterized by subject domain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PromptTemplate {
    #[serde(default = "default_domain")]
    pub domain: String,
}

fn default_domain() -> String {
    DEFAULT_DOMAIN.to_string()
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            domain: default_domain(),
        }
    }
}

impl PromptTemplate {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }

    /// The instruction message for `mode`.
    pub fn instruction(&self, mode: &PromptMode, query: &str) -> String {
        match mode {
            PromptMode::Grounded { context } => format!(
                "Take a look at the following documents: {} and do not reply to anything \
                 unrelated to the documents. Also return the part, chapter or specific clause \
                 that is relevant to the query with respect to {}.",
                context, self.domain
            ),
            PromptMode::NoIndex => format!(
                "Take a look at the following query: {} and do not reply to anything \
                 unrelated to {}. Also return the part, chapter or specific clause that is \
                 relevant to the query.",
                query, self.domain
            ),
        }
    }

    /// Full completion payload: instruction, then the query verbatim.
    pub fn compose(&self, mode: &PromptMode, query: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::user(self.instruction(mode, query)),
            ChatMessage::user(query),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[test]
    fn no_index_embeds_query_and_domain() {
        let t = PromptTemplate::new("maritime law");
        let msgs = t.compose(&PromptMode::NoIndex, "what is A");
        assert_eq!(msgs.len(), 2);
        assert!(msgs.iter().all(|m| m.role == Role::User));
        assert!(msgs[0].content.contains("following query: what is A"));
        assert!(msgs[0].content.contains("unrelated to maritime law"));
        assert!(msgs[0].content.contains("part, chapter or specific clause"));
        assert_eq!(msgs[1].content, "what is A");
    }

    #[test]
    fn grounded_embeds_context_not_query() {
        let t = PromptTemplate::default();
        let mode = PromptMode::Grounded {
            context: "Section 303: theft.\n".to_string(),
        };
        let msgs = t.compose(&mode, "define theft");
        assert!(msgs[0].content.contains("following documents: Section 303: theft.\n"));
        assert!(msgs[0].content.contains("unrelated to the documents"));
        assert!(msgs[0].content.contains(DEFAULT_DOMAIN));
        assert!(!msgs[0].content.contains("define theft"));
        assert_eq!(msgs[1].content, "define theft");
    }

    #[test]
    fn mode_kind() {
        assert_eq!(PromptMode::NoIndex.kind(), AnswerMode::NoIndex);
        let g = PromptMode::Grounded { context: String::new() };
        assert_eq!(g.kind(), AnswerMode::Grounded);
    }
}
