//! Semantic backend trait - abstraction over LLM providers
//!
//! - OpenAI chat completions (HTTP API)
//! - Anthropic messages (HTTP API)
//! - Mock (testing)

use anyhow::Result;
use async_trait::async_trait;

use super::types::SemanticJudgment;

/// An LLM provider able to produce a THSP judgment for a piece of content
#[async_trait]
pub trait SemanticBackend: Send + Sync {
    /// Judge `content` against the four gates.
    ///
    /// Transport, status and parse failures are all errors; the caller owns
    /// the timeout and the fallback.
    async fn evaluate(&self, content: &str) -> Result<SemanticJudgment>;

    /// Backend identifier for logging
    fn name(&self) -> &'static str;

    fn model(&self) -> &str;

    /// Provider/model/credential identity used to scope cached results
    fn fingerprint(&self) -> String;

    /// Switch models at runtime
    fn override_model(&mut self, model: String);
}

#[cfg(test)]
pub use mock::{MockBackend, MockReply};

#[cfg(test)]
mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Debug, Clone)]
    pub enum MockReply {
        Judgment(SemanticJudgment),
        Error(String),
        /// Sleep, then answer
        Slow(Duration, SemanticJudgment),
    }

    pub struct MockBackend {
        pub reply: MockReply,
        pub model: String,
        /// Shared so tests can count calls after handing the backend over
        pub calls: Arc<AtomicUsize>,
    }

    impl MockBackend {
        pub fn new(reply: MockReply) -> Self {
            Self {
                reply,
                model: "mock-model".to_string(),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl SemanticBackend for MockBackend {
        async fn evaluate(&self, _content: &str) -> Result<SemanticJudgment> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                MockReply::Judgment(judgment) => Ok(judgment.clone()),
                MockReply::Error(message) => Err(anyhow::anyhow!("{message}")),
                MockReply::Slow(delay, judgment) => {
                    tokio::time::sleep(*delay).await;
                    Ok(judgment.clone())
                }
            }
        }

        fn name(&self) -> &'static str {
            "mock"
        }

        fn model(&self) -> &str {
            &self.model
        }

        fn fingerprint(&self) -> String {
            format!("mock:{}", self.model)
        }

        fn override_model(&mut self, model: String) {
            self.model = model;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::types::parse_judgment;
    use std::sync::atomic::Ordering;

    const SAFE: &str = r#"{"safe": true, "gates": {
        "truth": {"passed": true}, "harm": {"passed": true},
        "scope": {"passed": true}, "purpose": {"passed": true}
    }, "confidence": 0.8}"#;

    #[tokio::test]
    async fn test_mock_backend() {
        let backend = MockBackend::new(MockReply::Judgment(parse_judgment(SAFE).unwrap()));
        let judgment = backend.evaluate("hello").await.unwrap();
        assert!(judgment.safe);
        assert_eq!(judgment.confidence, 0.8);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_mock_error_and_model_override() {
        let mut backend = MockBackend::new(MockReply::Error("boom".to_string()));
        assert!(backend.evaluate("hello").await.is_err());

        let before = backend.fingerprint();
        backend.override_model("other".to_string());
        assert_eq!(backend.model(), "other");
        assert_ne!(before, backend.fingerprint());
    }
}
