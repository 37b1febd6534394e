//! Chat-completion transport against the configured OpenAI-compatible
//! endpoint.
//!
//! One blocking request/response exchange per call — no retries, no
//! batching, no parallel calls.  The only deadline is the client-wide
//! timeout fixed at construction.  `ChatClient` is the seam the evaluator
//! talks through; tests substitute a scripted implementation.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::EvalConfig;

// ─── Error type ───────────────────────────────────────────────────────────────

/// Transport-level failure.  Fatal: never caught inside the evaluator — it
/// propagates and aborts the operation that issued the call.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("completion request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("endpoint returned HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("completion response carried no choices")]
    NoChoices,
}

// ─── ChatClient trait ─────────────────────────────────────────────────────────

/// A two-message (system + user) chat exchange returning the trimmed text
/// content of the single reply.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn chat(&self, system_prompt: &str, user_prompt: &str)
        -> Result<String, TransportError>;
}

// ─── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    /// Null when the model returned an empty completion — treated as an
    /// empty-string response, not a failure, so the parser stays tolerant.
    content: Option<String>,
}

// ─── HTTP client ──────────────────────────────────────────────────────────────

/// `ChatClient` over HTTP: POST `{base_url}/chat/completions`.
///
/// Endpoint, credential, model identifier, and sampling temperature are
/// fixed at construction and never re-negotiated per call.
pub struct HttpChatClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    temperature: f64,
}

impl HttpChatClient {
    pub fn new(config: &EvalConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            url: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl ChatClient for HttpChatClient {
    async fn chat(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, TransportError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: self.temperature,
        };

        let resp = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }

        let body: ChatResponse = resp.json().await?;
        let choice = body.choices.into_iter().next().ok_or(TransportError::NoChoices)?;
        let content = choice.message.content.unwrap_or_default().trim().to_string();

        debug!(response_len = content.len(), "completion request finished");
        Ok(content)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_two_messages_in_order() {
        let req = ChatRequest {
            model: "test-model",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "sys",
                },
                ChatMessage {
                    role: "user",
                    content: "usr",
                },
            ],
            temperature: 0.7,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["model"], "test-model");
        assert_eq!(v["messages"][0]["role"], "system");
        assert_eq!(v["messages"][1]["role"], "user");
        assert_eq!(v["temperature"], 0.7);
    }

    #[test]
    fn null_content_deserializes_to_none() {
        let body = r#"{"choices": [{"message": {"content": null}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }

    #[test]
    fn missing_choices_is_an_error_shape() {
        let body = r#"{"choices": []}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.choices.is_empty());
    }
}
