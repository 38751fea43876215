//! Provider Abstraction
//!
//! Uniform async interface over interchangeable AI backends. Callers talk to
//! `dyn Provider`; the wire contract, credential handling, and endpoint
//! shape stay inside each client. `create_provider` is a pure function of
//! configuration.

mod ollama;
mod openai;

pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

use crate::config::Settings;
use crate::core::message::Message;
use crate::core::classify;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Preamble sent ahead of every chat history.
pub const CHAT_PREAMBLE: &str = "You are a coding assistant embedded in a text editor. \
Answer questions about the user's code and keep explanations concise.";

/// Preamble for single-shot code generation.
pub const CODE_PREAMBLE: &str = "You are a code generator. Reply with a single fenced \
code block containing only the requested code, with no commentary before or after it.";

/// Preamble for single-shot text generation.
pub const TEXT_PREAMBLE: &str = "You are a writing assistant embedded in a text editor. \
Reply with plain text and no surrounding commentary.";

/// Preamble for plot-data generation.
pub const PLOT_PREAMBLE: &str = "You are a data assistant. Reply with a single fenced \
code block containing Chart.js-compatible JSON: one object with \"type\", \"data\" and \
\"options\" keys. No commentary.";

/// Sampling temperature for code generation, lower than chat.
pub const CODE_TEMPERATURE: f32 = 0.2;

const MAX_RETRIES: u32 = 2;
const BASE_DELAY_MS: u64 = 1000;

/// What a single-shot generation request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateKind {
    Code,
    Text,
}

/// Uniform interface over AI backends.
#[async_trait]
pub trait Provider: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// Send the conversation and return the assistant reply. Requires at
    /// least one message; rejected before any network call otherwise.
    async fn chat(&self, messages: &[Message]) -> Result<String>;

    /// Single-shot generation with a fixed preamble per `kind`.
    async fn generate(&self, prompt: &str, kind: GenerateKind) -> Result<String>;

    /// Ask for Chart.js-compatible JSON. Optional capability; clients that
    /// support it must return a payload that parses as JSON.
    async fn generate_plot(&self, _description: &str) -> Result<String> {
        Err(Error::Configuration(format!(
            "{} does not support plot generation",
            self.name()
        )))
    }
}

/// Build the configured provider. `"openai"` requires a credential from
/// settings or the OPENAI_API_KEY environment variable; `"ollama"` needs
/// none; anything else is a configuration error.
pub fn create_provider(settings: &Settings) -> Result<Box<dyn Provider>> {
    match settings.provider.name.as_str() {
        "openai" => {
            let api_key = match settings
                .provider
                .api_key
                .clone()
                .filter(|k| !k.trim().is_empty())
            {
                Some(key) => key,
                None => Settings::api_key().map_err(|_| {
                    Error::Configuration(
                        "provider.api_key is not set and OPENAI_API_KEY is missing".to_string(),
                    )
                })?,
            };
            Ok(Box::new(OpenAiClient::new(&settings.provider, api_key)?))
        }
        "ollama" => Ok(Box::new(OllamaClient::new(&settings.provider)?)),
        other => Err(Error::Configuration(format!("unknown provider: {other}"))),
    }
}

/// Message as both backends put it on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl From<&Message> for ChatMessage {
    fn from(msg: &Message) -> Self {
        let content = match &msg.code_context {
            Some(ctx) => format!("{}\n\nActive code:\n```\n{}\n```", msg.content, ctx),
            None => msg.content.clone(),
        };
        Self {
            role: msg.role.to_string(),
            content,
        }
    }
}

/// Preamble plus the caller's messages in wire shape.
pub(crate) fn wire_messages(preamble: &str, messages: &[Message]) -> Vec<ChatMessage> {
    let mut wire = Vec::with_capacity(messages.len() + 1);
    wire.push(ChatMessage {
        role: "system".to_string(),
        content: preamble.to_string(),
    });
    wire.extend(messages.iter().map(ChatMessage::from));
    wire
}

/// Preamble plus one user prompt, for single-shot requests.
pub(crate) fn wire_prompt(preamble: &str, prompt: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: "system".to_string(),
            content: preamble.to_string(),
        },
        ChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        },
    ]
}

/// Send a request with bounded retries: transport failures and 5xx are
/// retried with exponential backoff, 4xx fail immediately.
pub(crate) async fn send_with_retry(
    request: RequestBuilder,
    provider: &str,
) -> Result<reqwest::Response> {
    let mut last_error: Option<Error> = None;

    for attempt in 0..=MAX_RETRIES {
        if attempt > 0 {
            let delay = BASE_DELAY_MS * 2_u64.pow(attempt - 1);
            tracing::warn!(
                "[{}] retrying request (attempt {}/{}) after {}ms delay",
                provider,
                attempt + 1,
                MAX_RETRIES + 1,
                delay
            );
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let builder = match request.try_clone() {
            Some(builder) => builder,
            None => return Err(Error::Provider("request body cannot be retried".to_string())),
        };

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("[{}] transport failure: {}", provider, e);
                last_error = Some(e.into());
                continue;
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        let error = Error::Provider(format!("{} returned {}: {}", provider, status, body));
        if status.is_client_error() {
            return Err(error);
        }

        tracing::warn!("[{}] server error {}: {}", provider, status, body);
        last_error = Some(error);
    }

    Err(last_error
        .unwrap_or_else(|| Error::Provider("all retry attempts failed".to_string())))
}

/// Reject blank replies as unusable content.
pub(crate) fn require_text(content: String, provider: &str) -> Result<String> {
    if content.trim().is_empty() {
        Err(Error::Content(format!("{provider} returned an empty reply")))
    } else {
        Ok(content)
    }
}

/// Extract the fenced payload from a plot reply and check it parses as JSON.
pub(crate) fn validate_plot_payload(reply: &str) -> Result<String> {
    let (_, payload) = classify::extract_fenced(reply);
    serde_json::from_str::<serde_json::Value>(&payload)
        .map_err(|e| Error::Content(format!("plot response is not valid JSON: {e}")))?;
    Ok(payload)
}
