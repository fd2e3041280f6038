//! Anthropic backend
//!
//! POSTs to the messages endpoint and reads the first text block.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::backend::SemanticBackend;
use super::config::{fingerprint, Provider, SemanticConfig};
use super::prompts::SemanticPrompts;
use super::types::{parse_judgment, SemanticJudgment};

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: u32,
    prompts: SemanticPrompts,
    api_key: String,
}

impl AnthropicBackend {
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

    fn build_request(&self, content: &str) -> MessagesRequest {
        MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: self.prompts.system_prompt.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: self.prompts.render_user_message(content),
            }],
            temperature: 0.0,
        }
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl MessagesResponse {
    fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text.as_deref())
    }
}

#[async_trait]
impl SemanticBackend for AnthropicBackend {
    async fn evaluate(&self, content: &str) -> Result<SemanticJudgment> {
        debug!("Semantic evaluation via Anthropic ({})", self.model);

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&self.build_request(content))
            .send()
            .await
            .context("Failed to send request to Anthropic")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Anthropic API error: {} - {}", status, body);
            return Err(anyhow::anyhow!(
                "Anthropic API error: {} - {}",
                status,
                body
            ));
        }

        let messages_response: MessagesResponse = response
            .json()
            .await
            .context("Failed to parse Anthropic response")?;

        let text = messages_response
            .text()
            .context("Anthropic response contained no text block")?;
        debug!("Semantic raw response: {}", text);

        parse_judgment(text)
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn fingerprint(&self) -> String {
        fingerprint(Provider::Anthropic, &self.model, &self.api_key)
    }

    fn override_model(&mut self, model: String) {
        self.model = model;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> AnthropicBackend {
        let config = SemanticConfig::for_provider(Provider::Anthropic);
        AnthropicBackend::new(&config, "sk-ant-test".to_string()).unwrap()
    }

    #[test]
    fn test_request_shape() {
        let request = backend().build_request("bridge 10 USDC");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "claude-3-5-haiku-latest");
        assert_eq!(json["max_tokens"], 1024);
        assert!(json["system"].as_str().unwrap().contains("four gates"));
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn test_response_skips_non_text_blocks() {
        let response: MessagesResponse = serde_json::from_value(serde_json::json!({
            "content": [
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "{\"safe\": false}"}
            ]
        }))
        .unwrap();
        assert_eq!(response.text(), Some("{\"safe\": false}"));
    }

    #[test]
    fn test_fingerprint_is_provider_scoped() {
        let backend = backend();
        assert!(backend.fingerprint().starts_with("anthropic:claude-3-5-haiku-latest:"));
    }
}
