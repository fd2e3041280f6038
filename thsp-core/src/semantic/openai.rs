//! OpenAI backend
//!
//! POSTs to the chat completions endpoint and reads the first choice.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::backend::SemanticBackend;
use super::config::{fingerprint, Provider, SemanticConfig};
use super::prompts::SemanticPrompts;
use super::types::{parse_judgment, SemanticJudgment};

pub struct OpenAiBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: u32,
    prompts: SemanticPrompts,
    api_key: String,
}

impl OpenAiBackend {
    pub fn new(config: &SemanticConfig, api_key: String) -> Result<Self> {
        Self::with_prompts(config, api_key, SemanticPrompts::default())
    }

    pub fn with_prompts(
        config: &SemanticConfig,
        api_key: String,
        prompts: SemanticPrompts,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.effective_base_url().to_string(),
            model: config.effective_model().to_string(),
            max_tokens: config.max_tokens,
            prompts,
            api_key,
        })
    }

    fn build_request(&self, content: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: self.prompts.system_prompt.clone(),
                },
                Message {
                    role: "user".to_string(),
                    content: self.prompts.render_user_message(content),
                },
            ],
            temperature: 0.0,
            max_tokens: self.max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    fn text(&self) -> Option<&str> {
        self.choices.first()?.message.content.as_deref()
    }
}

#[async_trait]
impl SemanticBackend for OpenAiBackend {
    async fn evaluate(&self, content: &str) -> Result<SemanticJudgment> {
        debug!("Semantic evaluation via OpenAI ({})", self.model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&self.build_request(content))
            .send()
            .await
            .context("Failed to send request to OpenAI")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("OpenAI API error: {} - {}", status, body);
            return Err(anyhow::anyhow!("OpenAI API error: {} - {}", status, body));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI response")?;

        let text = chat_response
            .text()
            .context("OpenAI response contained no message content")?;
        debug!("Semantic raw response: {}", text);

        parse_judgment(text)
    }

    fn name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn fingerprint(&self) -> String {
        fingerprint(Provider::OpenAi, &self.model, &self.api_key)
    }

    fn override_model(&mut self, model: String) {
        self.model = model;
    }
}
