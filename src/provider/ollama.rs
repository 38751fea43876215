//! Ollama Client
//!
//! POST `{base_url}/api/chat` against a local Ollama server. No credential;
//! the default endpoint is `http://127.0.0.1:11434`.

use super::{
    send_with_retry, require_text, validate_plot_payload, wire_messages, wire_prompt,
    ChatMessage, GenerateKind, Provider, CHAT_PREAMBLE, CODE_PREAMBLE, CODE_TEMPERATURE,
    PLOT_PREAMBLE, TEXT_PREAMBLE,
};
use crate::config::ProviderConfig;
use crate::core::message::Message;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434";

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

#[derive(Debug)]
pub struct OllamaClient {
    client: Client,
    config: ProviderConfig,
    base_url: String,
}

impl OllamaClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
            base_url,
        })
    }

    async fn request(&self, messages: Vec<ChatMessage>, temperature: f32) -> Result<String> {
        let request = OllamaChatRequest {
            model: self.config.model.clone(),
            messages,
            stream: false,
            options: OllamaOptions {
                temperature,
                num_predict: self.config.max_tokens,
            },
        };

        tracing::debug!("[OllamaClient] POST {}/api/chat", self.base_url);

        let response = send_with_retry(
            self.client
                .post(format!("{}/api/chat", self.base_url))
                .json(&request),
            "ollama",
        )
        .await?;

        let chat_response: OllamaChatResponse = response.json().await?;

        require_text(chat_response.message.content, "ollama")
    }
}

#[async_trait]
impl Provider for OllamaClient {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn chat(&self, messages: &[Message]) -> Result<String> {
        if messages.is_empty() {
            return Err(Error::Validation(
                "chat requires at least one message".to_string(),
            ));
        }

        self.request(
            wire_messages(CHAT_PREAMBLE, messages),
            self.config.temperature,
        )
        .await
    }

    async fn generate(&self, prompt: &str, kind: GenerateKind) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(Error::Validation("prompt must not be empty".to_string()));
        }

        let (preamble, temperature) = match kind {
            GenerateKind::Code => (CODE_PREAMBLE, CODE_TEMPERATURE),
            GenerateKind::Text => (TEXT_PREAMBLE, self.config.temperature),
        };

        self.request(wire_prompt(preamble, prompt), temperature).await
    }

    async fn generate_plot(&self, description: &str) -> Result<String> {
        if description.trim().is_empty() {
            return Err(Error::Validation(
                "plot description must not be empty".to_string(),
            ));
        }

        let reply = self
            .request(
                wire_prompt(PLOT_PREAMBLE, description),
                self.config.temperature,
            )
            .await?;

        validate_plot_payload(&reply)
    }
}
