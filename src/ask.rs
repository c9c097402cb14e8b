//! One-shot question answering (`docqa ask`).

use std::sync::Arc;

use anyhow::{anyhow, Result};

use docqa_core::index::IndexHandle;
use docqa_core::prompt::AnswerMode;
use docqa_core::respond::{Answer, Responder};

use crate::completion::ChatCompletionClient;
use crate::config::{Config, Secrets};
use crate::embedding::create_embedder;
use crate::ingest::{create_store, preview};

/// Build a [`Responder`] over the configured completion endpoint.
pub fn create_responder(config: &Config, secrets: &Secrets) -> Result<Responder> {
    let key = secrets
        .completion_api_key
        .clone()
        .ok_or_else(|| anyhow!("{} not set", config.completion.api_key_env))?;
    let client = ChatCompletionClient::new(&config.completion, key)?;
    Ok(Responder::new(Arc::new(client))
        .with_model(config.completion.model.clone())
        .with_template(config.prompt.clone())
        .with_top_k(config.retrieval.top_k))
}

/// Answer `query`, grounded in the physical `collection` when given.
pub async fn run_ask(
    config: &Config,
    secrets: &Secrets,
    query: &str,
    collection: Option<String>,
) -> Result<()> {
    let responder = create_responder(config, secrets)?;
    let handle = match collection {
        Some(collection) => Some(IndexHandle::attach(
            collection,
            create_store(config, secrets)?,
            create_embedder(&config.embedding, secrets)?,
        )),
        None => None,
    };

    let answer = responder.respond(handle.as_ref(), query).await?;
    print_answer(&answer);
    Ok(())
}

/// Print the answer text unmodified, then its sources if grounded.
pub fn print_answer(answer: &Answer) {
    println!("{}", answer.text);
    if answer.mode == AnswerMode::Grounded && !answer.sources.is_empty() {
        println!();
        println!("sources:");
        for source in &answer.sources {
            println!(
                "  #{:<4} {:.3}  {}",
                source.index,
                source.score,
                preview(&source.text, 70)
            );
        }
    }
}
