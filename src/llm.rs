//! Chat Model Client
//!
//! OpenAI-compatible chat completions (Arcee endpoint by default). The
//! [`ChatModel`] trait is the seam the chat loop talks to; tests swap in a
//! scripted model.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Config;

/// Default sampling temperature
const TEMPERATURE: f32 = 0.7;

/// Default completion length
const MAX_TOKENS: usize = 1000;

/// One chat message as sent to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }
}

/// General-purpose chat model
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Reply to `messages` (oldest first, system prompt included)
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
}

/// Arcee chat completions client
#[derive(Clone)]
pub struct ArceeClient {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl ArceeClient {
    pub fn new(api_url: &str, api_key: Option<&str>, model: &str, timeout: std::time::Duration) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_url: api_url.to_string(),
            api_key: api_key.map(|s| s.to_string()),
            model: model.to_string(),
        })
    }

    /// Create from config
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.arcee_api_url,
            config.arcee_api_key.as_deref(),
            &config.arcee_model,
            config.http_timeout(),
        )
    }

    /// Check if API key is configured
    pub fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatModel for ArceeClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("ARCEE_API_KEY não definida - modelo de chat indisponível"))?;

        let request = CompletionRequest {
            model: &self.model,
            messages,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        debug!("Calling chat model: model={}, messages={}", self.model, messages.len());

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            anyhow::bail!("Chat model error {}: {}", status, text);
        }

        let result: CompletionResponse = response.json().await?;

        if let Some(usage) = &result.usage {
            info!(
                "Chat model response: model={}, in={}, out={}",
                result.model.as_deref().unwrap_or(&self.model),
                usage.prompt_tokens,
                usage.completion_tokens
            );
        }

        let content = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        Ok(content)
    }
}
