//! Semantic validation configuration
//!
//! ```json
//! {"provider": "anthropic", "model": "claude-3-5-haiku-latest", "timeout_ms": 8000}
//! ```
//!
//! The credential is taken from `api_key` when set programmatically, and
//! otherwise from the environment variable named by `api_key_env`
//! (`OPENAI_API_KEY` / `ANTHROPIC_API_KEY` by default).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::Duration;

use crate::error::SemanticError;

/// Floor for the provider call timeout
pub const MIN_TIMEOUT_MS: u64 = 500;

/// Chat completion API shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAi,
    Anthropic,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4o-mini",
            Provider::Anthropic => "claude-3-5-haiku-latest",
        }
    }

    pub fn default_api_key_env(self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::Anthropic => "https://api.anthropic.com/v1",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SemanticConfig {
    #[serde(default)]
    pub provider: Provider,

    /// Model ID; provider default when unset
    #[serde(default)]
    pub model: Option<String>,

    /// Environment variable holding the API key; provider default when unset
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// Explicit API key, takes precedence over the environment. Never serialized.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Override the provider endpoint (proxies, gateways)
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,

    /// 0 disables the result cache
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,

    /// Build and log requests without calling the provider
    #[serde(default)]
    pub dry_run: bool,
}

impl fmt::Debug for SemanticConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SemanticConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key_env", &self.api_key_env)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout_ms", &self.timeout_ms)
            .field("max_tokens", &self.max_tokens)
            .field("cache_ttl_seconds", &self.cache_ttl_seconds)
            .field("cache_max_entries", &self.cache_max_entries)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: None,
            api_key_env: None,
            api_key: None,
            base_url: None,
            timeout_ms: default_timeout_ms(),
            max_tokens: default_max_tokens(),
            cache_ttl_seconds: default_cache_ttl_seconds(),
            cache_max_entries: default_cache_max_entries(),
            dry_run: false,
        }
    }
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_cache_ttl_seconds() -> u64 {
    60
}

fn default_cache_max_entries() -> usize {
    100
}

impl SemanticConfig {
    pub fn for_provider(provider: Provider) -> Self {
        Self {
            provider,
            ..Default::default()
        }
    }

    pub fn effective_model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    pub fn effective_api_key_env(&self) -> &str {
        self.api_key_env
            .as_deref()
            .unwrap_or_else(|| self.provider.default_api_key_env())
    }

    pub fn effective_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
            .trim_end_matches('/')
    }

    /// Provider call timeout, never below [`MIN_TIMEOUT_MS`]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(MIN_TIMEOUT_MS))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    /// Explicit key first, then the environment
    pub fn resolve_api_key(&self) -> Result<String, SemanticError> {
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            return Ok(key.to_string());
        }
        let env = self.effective_api_key_env();
        std::env::var(env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| SemanticError::MissingApiKey {
                env: env.to_string(),
            })
    }
}

/// Identity of a provider/model/credential combination. Cached results are
/// only valid for the fingerprint that produced them.
pub fn fingerprint(provider: Provider, model: &str, api_key: &str) -> String {
    let digest = Sha256::digest(api_key.as_bytes());
    let key_hash = hex::encode(digest);
    format!("{}:{}:{}", provider, model, &key_hash[..16])
}
