//! Semantic THSP validation - LLM-as-judge in front of the heuristic pipeline
//!
//! When a provider credential is available, content is judged by an LLM
//! under a timeout. Any failure (no credential, transport error, non-2xx,
//! unparseable reply, timeout) degrades to the heuristic content assessment
//! with a warning attached to the result.
//!
//! ```json
//! {"provider": "openai", "model": "gpt-4o-mini", "timeout_ms": 10000, "cache_ttl_seconds": 60}
//! ```

pub mod backend;
pub mod cache;
pub mod config;
pub mod prompts;
pub mod types;

#[cfg(feature = "semantic")]
pub mod anthropic;
#[cfg(feature = "semantic")]
pub mod openai;

pub use backend::SemanticBackend;
pub use cache::SemanticCache;
pub use config::{Provider, SemanticConfig};
pub use prompts::SemanticPrompts;
pub use types::{
    EvaluationMethod, GateJudgment, GateJudgments, SemanticJudgment, SemanticValidationResult,
};

use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::decision::SafetyValidationResult;
use crate::error::SemanticError;
use crate::input::ValidationInput;
use crate::validator::SafetyValidator;

/// Owns the heuristic validator and, optionally, an LLM backend
pub struct SemanticCoordinator {
    validator: SafetyValidator,
    backend: Option<Box<dyn SemanticBackend>>,
    cache: SemanticCache,
    timeout: Duration,
    dry_run: bool,
}

impl SemanticCoordinator {
    /// Build from configuration. A missing credential is not an error: the
    /// coordinator then runs heuristics only.
    pub fn new(validator: SafetyValidator, config: &SemanticConfig) -> Result<Self, SemanticError> {
        let backend = build_backend(config)?;
        match &backend {
            Some(b) => info!(
                "Semantic validation enabled (backend: {}, model: {}, dry_run: {})",
                b.name(),
                b.model(),
                config.dry_run
            ),
            None => info!("Semantic validation disabled; using heuristic analysis only"),
        }

        Ok(Self {
            validator,
            backend,
            cache: SemanticCache::new(config.cache_max_entries, config.cache_ttl()),
            timeout: config.timeout(),
            dry_run: config.dry_run,
        })
    }

    pub fn heuristic_only(validator: SafetyValidator) -> Self {
        let config = SemanticConfig::default();
        Self {
            validator,
            backend: None,
            cache: SemanticCache::new(config.cache_max_entries, config.cache_ttl()),
            timeout: config.timeout(),
            dry_run: false,
        }
    }

    /// Use a caller-supplied backend; cache and timeout settings come from `config`
    pub fn with_backend(
        validator: SafetyValidator,
        backend: Box<dyn SemanticBackend>,
        config: &SemanticConfig,
    ) -> Self {
        Self {
            validator,
            backend: Some(backend),
            cache: SemanticCache::new(config.cache_max_entries, config.cache_ttl()),
            timeout: config.timeout(),
            dry_run: config.dry_run,
        }
    }

    /// Replace (or remove) the backend. Cached judgments are discarded.
    pub fn set_backend(&mut self, backend: Option<Box<dyn SemanticBackend>>) {
        self.backend = backend;
        self.cache.reset();
    }

    /// Switch the backend's model. Cached judgments are discarded.
    pub fn override_model(&mut self, model: String) {
        if let Some(backend) = self.backend.as_mut() {
            info!("Semantic model override: {} -> {}", backend.model(), model);
            backend.override_model(model);
            self.cache.reset();
        }
    }

    pub fn is_semantic_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub fn validator(&self) -> &SafetyValidator {
        &self.validator
    }

    pub fn validator_mut(&mut self) -> &mut SafetyValidator {
        &mut self.validator
    }

    /// Heuristic validation of a structured action
    pub fn validate(&mut self, input: &ValidationInput) -> SafetyValidationResult {
        self.validator.validate(input)
    }

    /// Judge free text, preferring the LLM and falling back to heuristics
    ///
    /// Fails only on empty content.
    #[instrument(
        name = "validate_semantic",
        skip(self, content),
        fields(
            content_len = content.len(),
            method = tracing::field::Empty,
            safe = tracing::field::Empty,
        )
    )]
    pub async fn validate_semantic(
        &mut self,
        content: &str,
    ) -> Result<SemanticValidationResult, SemanticError> {
        if content.trim().is_empty() {
            return Err(SemanticError::EmptyContent);
        }

        let result = match self.judge(content).await {
            Ok(result) => result,
            Err(err) => {
                warn!("Semantic validation failed, falling back to heuristics: {err}");
                self.fallback(content, &err.to_string())?
            }
        };

        let span = tracing::Span::current();
        span.record("method", tracing::field::debug(&result.method));
        span.record("safe", result.safe);

        Ok(result)
    }

    /// LLM judgment without the heuristic fallback
    pub async fn judge(&mut self, content: &str) -> Result<SemanticValidationResult, SemanticError> {
        if content.trim().is_empty() {
            return Err(SemanticError::EmptyContent);
        }
        let backend = self.backend.as_deref().ok_or(SemanticError::NotConfigured)?;

        if self.dry_run {
            let preview: String = content.chars().take(500).collect();
            info!(
                "Semantic dry_run: would send {} chars to {} model {}: {}...",
                content.len(),
                backend.name(),
                backend.model(),
                preview
            );
            return Ok(SemanticValidationResult::dry_run());
        }

        self.cache.sync_fingerprint(&backend.fingerprint());
        if let Some(judgment) = self.cache.get(content) {
            debug!("Semantic cache hit");
            return Ok(SemanticValidationResult::from_judgment(judgment, true));
        }

        let judgment = match tokio::time::timeout(self.timeout, backend.evaluate(content)).await {
            Ok(outcome) => outcome?,
            Err(_) => return Err(SemanticError::Timeout(self.timeout)),
        };

        debug!(
            "Semantic decision: safe={}, confidence={}, reasoning={}",
            judgment.safe, judgment.confidence, judgment.overall_reasoning
        );
        self.cache.insert(content, judgment.clone());
        Ok(SemanticValidationResult::from_judgment(judgment, false))
    }

    fn fallback(
        &self,
        content: &str,
        reason: &str,
    ) -> Result<SemanticValidationResult, SemanticError> {
        let assessment = self
            .validator
            .assess_content(content)
            .map_err(|_| SemanticError::EmptyContent)?;
        let warning = format!(
            "Semantic validation unavailable ({reason}); using heuristic analysis with reduced accuracy"
        );
        Ok(SemanticValidationResult::from_assessment(&assessment, warning))
    }
}

#[cfg(feature = "semantic")]
fn build_backend(config: &SemanticConfig) -> Result<Option<Box<dyn SemanticBackend>>, SemanticError> {
    let api_key = match config.resolve_api_key() {
        Ok(key) => key,
        // Dry run never calls the provider, so it doesn't need a real key
        Err(_) if config.dry_run => "DRY_RUN_NO_KEY".to_string(),
        Err(err) => {
            debug!("{err}");
            return Ok(None);
        }
    };

    let backend: Box<dyn SemanticBackend> = match config.provider {
        Provider::OpenAi => Box::new(openai::OpenAiBackend::new(config, api_key)?),
        Provider::Anthropic => Box::new(anthropic::AnthropicBackend::new(config, api_key)?),
    };
    Ok(Some(backend))
}

#[cfg(not(feature = "semantic"))]
fn build_backend(config: &SemanticConfig) -> Result<Option<Box<dyn SemanticBackend>>, SemanticError> {
    if config.resolve_api_key().is_ok() {
        warn!("Semantic API key found but the 'semantic' feature is not compiled in");
    }
    Ok(None)
}
