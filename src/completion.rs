//! OpenAI-compatible chat-completion client (Groq by default).
//!
//! Sends `POST {base_url}/chat/completions` with a bearer key and returns
//! `choices[0].message.content` unmodified.

use async_trait::async_trait;

use docqa_core::completion::CompletionService;
use docqa_core::models::ChatMessage;
use docqa_core::{Error, Result};

use crate::config::CompletionConfig;
use crate::http;

/// Chat-completion client, constructed once and passed to the responder.
pub struct ChatCompletionClient {
    client: reqwest::Client,
    url: String,
    api_key: String,
    max_retries: u32,
}

impl ChatCompletionClient {
    pub fn new(config: &CompletionConfig, api_key: String) -> anyhow::Result<Self> {
        Ok(Self {
            client: http::client(config.timeout_secs)?,
            url: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl CompletionService for ChatCompletionClient {
    async fn complete(&self, messages: &[ChatMessage], model: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": model,
            "messages": messages,
        });
        let json = http::post_json(
            &self.client,
            &self.url,
            Some(self.api_key.as_str()),
            &body,
            self.max_retries,
        )
        .await
        .map_err(Error::CompletionService)?;
        parse_completion(&json)
    }
}

fn parse_completion(json: &serde_json::Value) -> Result<String> {
    if let Some(error) = json.get("error") {
        return Err(Error::CompletionService(format!(
            "API returned error: {}",
            error
        )));
    }

    json["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| {
            Error::CompletionService(
                "invalid response format: missing content in choices".to_string(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_is_returned_verbatim() {
        let json = serde_json::json!({
            "id": "chatcmpl-1",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "  Section 35, BNSS.\n" } }
            ]
        });
        assert_eq!(parse_completion(&json).unwrap(), "  Section 35, BNSS.\n");
    }

    #[test]
    fn missing_choices_is_completion_error() {
        let err = parse_completion(&serde_json::json!({ "choices": [] })).unwrap_err();
        assert!(matches!(err, Error::CompletionService(_)));
    }

    #[test]
    fn error_body_is_completion_error() {
        let json = serde_json::json!({ "error": { "message": "model not found" } });
        let err = parse_completion(&json).unwrap_err();
        assert!(err.to_string().contains("model not found"));
    }

    #[test]
    fn messages_serialize_with_lowercase_roles() {
        let body = serde_json::json!({ "messages": [ChatMessage::user("hi")] });
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hi");
    }

    #[test]
    fn endpoint_joins_base_url() {
        let config = CompletionConfig {
            base_url: "https://api.groq.com/openai/v1/".to_string(),
            ..CompletionConfig::default()
        };
        let client = ChatCompletionClient::new(&config, "k".to_string()).unwrap();
        assert_eq!(client.url, "https://api.groq.com/openai/v1/chat/completions");
    }
}
