//! OpenAI-Style Client
//!
//! POST `{base_url}/chat/completions` with a bearer credential. The base
//! URL is configurable, so any OpenAI-compatible endpoint works.

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

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug)]
pub struct OpenAiClient {
    client: Client,
    config: ProviderConfig,
    base_url: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(config: &ProviderConfig, api_key: String) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::Configuration(
                "openai requires a credential; set provider.api_key or OPENAI_API_KEY".to_string(),
            ));
        }

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
            api_key,
        })
    }

    async fn request(&self, messages: Vec<ChatMessage>, temperature: f32) -> Result<String> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages,
            temperature,
            max_tokens: self.config.max_tokens,
        };

        tracing::debug!("[OpenAiClient] POST {}/chat/completions", self.base_url);

        let response = send_with_retry(
            self.client
                .post(format!("{}/chat/completions", self.base_url))
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&request),
            "openai",
        )
        .await?;

        let chat_response: ChatResponse = response.json().await?;

        let content = chat_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default();

        require_text(content, "openai")
    }
}

#[async_trait]
impl Provider for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
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
