use anyhow::Result;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub review: ReviewConfig,
    #[serde(default)]
    pub testing: TestingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Backend to talk to: "openai" or "ollama"
    #[serde(default = "default_provider")]
    pub name: String,
    /// Credential for providers that need one; falls back to OPENAI_API_KEY
    #[serde(default)]
    pub api_key: Option<String>,
    /// Overrides the provider's stock endpoint when set
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Retained messages per conversation; oldest are trimmed beyond this
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Leading document lines attached as context to code requests
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "default_inline_enabled")]
    pub inline_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Print unchanged lines when rendering a proposal diff
    #[serde(default)]
    pub show_unchanged: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestingConfig {
    /// Test framework named in code-generation prompts; empty means unset
    #[serde(default)]
    pub framework: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_history_limit() -> usize {
    10
}

fn default_context_lines() -> usize {
    40
}

fn default_inline_enabled() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider(),
            api_key: None,
            base_url: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            context_lines: default_context_lines(),
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            inline_enabled: default_inline_enabled(),
        }
    }
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            show_unchanged: false,
        }
    }
}

impl Default for TestingConfig {
    fn default() -> Self {
        Self {
            framework: String::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            conversation: ConversationConfig::default(),
            completion: CompletionConfig::default(),
            review: ReviewConfig::default(),
            testing: TestingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config_env = env::var("CONFIG_ENV").unwrap_or_else(|_| "default".to_string());

        let config = Config::builder()
            .add_source(File::with_name(&format!("config/{}", config_env)).required(false))
            .add_source(Environment::with_prefix("CODEMATE").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    pub fn api_key() -> Result<String> {
        env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))
    }
}
