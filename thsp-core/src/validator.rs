//! The heuristic validation pipeline.
//!
//! normalize -> gates + pattern scan -> risk -> decision -> recommendations
//! -> history -> observer
//!
//! One [`SafetyValidator`] per session or agent. It holds no locks; hosts
//! that share one across concurrent callers must serialize access.

use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::address::canonical_address;
use crate::config::{ConfigUpdate, ValidationCallback, ValidatorConfig};
use crate::decision::{
    ContentAssessment, DecisionPolicy, ResultMetadata, SafetyValidationResult,
};
use crate::error::{ConfigError, InputError};
use crate::gates::{Gate, GateEvaluator, GateResult};
use crate::history::{ValidationHistory, ValidationStats};
use crate::input::ValidationInput;
use crate::patterns::PatternRegistry;
use crate::recommendations;
use crate::risk::RiskLevel;
use crate::scanner::PatternScanner;

pub struct SafetyValidator {
    config: ValidatorConfig,
    registry: PatternRegistry,
    history: ValidationHistory,
}

impl SafetyValidator {
    /// Build a validator, compiling the pattern registry up front
    pub fn new(mut config: ValidatorConfig) -> Result<Self, ConfigError> {
        config.check()?;
        config.canonicalize_addresses();
        let registry = PatternRegistry::new(&config.custom_patterns)?;
        let history = ValidationHistory::new(config.max_history_size);

        info!(
            "Safety validator ready: {} patterns, strict_mode={}, history={}",
            registry.len(),
            config.strict_mode,
            config.max_history_size
        );

        Ok(Self {
            config,
            registry,
            history,
        })
    }

    /// Validate a typed action. Never fails; malformed input yields a
    /// critical, non-proceedable verdict.
    #[instrument(
        name = "validate",
        skip_all,
        fields(
            action = %input.action,
            risk_level = tracing::field::Empty,
            should_proceed = tracing::field::Empty
        )
    )]
    pub fn validate(&mut self, input: &ValidationInput) -> SafetyValidationResult {
        let start = Instant::now();
        let result = match input.normalize() {
            Ok(normalized) => self.evaluate(&normalized, start),
            Err(e) => self.reject(&input.action, &e, start),
        };
        self.finish(result)
    }

    /// Validate a loosely-typed host record
    #[instrument(
        name = "validate_json",
        skip_all,
        fields(
            risk_level = tracing::field::Empty,
            should_proceed = tracing::field::Empty
        )
    )]
    pub fn validate_json(&mut self, raw: &Value) -> SafetyValidationResult {
        let start = Instant::now();
        let result = match ValidationInput::from_value(raw) {
            Ok(normalized) => self.evaluate(&normalized, start),
            Err(e) => {
                let action = raw.get("action").and_then(Value::as_str).unwrap_or("");
                self.reject(action, &e, start)
            }
        };
        self.finish(result)
    }

    fn evaluate(&self, input: &ValidationInput, start: Instant) -> SafetyValidationResult {
        let gate_results = GateEvaluator::new(&self.config).evaluate(input);

        let mut risk_level = RiskLevel::Low;
        let mut concerns = Vec::new();
        for gate in gate_results.iter().filter(|g| !g.passed) {
            risk_level = risk_level.escalate(gate.gate.failure_risk());
            if let Some(reason) = &gate.reason {
                concerns.push(reason.clone());
            }
        }

        let scan = PatternScanner::new(self.registry.snapshot()).scan_input(input);
        risk_level = risk_level.escalate(scan.risk_level);
        concerns.extend(scan.concerns().map(String::from));

        let decision = DecisionPolicy::from_config(&self.config).decide(
            &gate_results,
            concerns.len(),
            risk_level,
            input.amount,
        );

        let recommendations = recommendations::generate(
            input,
            &concerns,
            risk_level,
            self.config.confirmation_threshold,
        );

        debug!(
            "Validated '{}': safe={}, risk={}, concerns={}",
            input.action,
            decision.safe,
            risk_level,
            concerns.len()
        );

        SafetyValidationResult {
            safe: decision.safe,
            risk_level,
            should_proceed: decision.should_proceed,
            requires_confirmation: decision.requires_confirmation,
            gate_results,
            concerns,
            recommendations,
            metadata: ResultMetadata {
                action: input.action.clone(),
                timestamp: chrono::Utc::now(),
                validation_duration_ms: elapsed_ms(start),
            },
        }
    }

    fn reject(&self, action: &str, error: &InputError, start: Instant) -> SafetyValidationResult {
        warn!("Rejected malformed input: {}", error);
        SafetyValidationResult::rejected(action, error, elapsed_ms(start))
    }

    /// Record the verdict, then notify the observer
    fn finish(&mut self, result: SafetyValidationResult) -> SafetyValidationResult {
        let span = tracing::Span::current();
        span.record("risk_level", result.risk_level.as_str());
        span.record("should_proceed", result.should_proceed);

        self.history.record(result.clone());

        if let Some(callback) = &self.config.on_validation {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| callback.call(&result))) {
                error!(
                    "on_validation callback panicked: {}",
                    panic_message(payload.as_ref())
                );
            }
        }

        result
    }

    /// Heuristic THSP judgment of free text
    ///
    /// A gate fails when a pattern attributed to it matches; generic patterns
    /// only add concerns. Nothing is recorded in history.
    pub fn assess_content(&self, content: &str) -> Result<ContentAssessment, InputError> {
        if content.trim().is_empty() {
            return Err(InputError::EmptyField { field: "content" });
        }

        let scan = PatternScanner::new(self.registry.snapshot()).scan(content);

        let mut risk_level = scan.risk_level;
        let gate_results: Vec<GateResult> = Gate::ALL
            .iter()
            .map(|&gate| {
                let messages: Vec<&str> = scan.for_gate(gate).map(|m| m.message.as_str()).collect();
                if messages.is_empty() {
                    GateResult::pass(gate)
                } else {
                    risk_level = risk_level.escalate(gate.failure_risk());
                    GateResult::fail(gate, messages.join("; "))
                }
            })
            .collect();

        let concerns: Vec<String> = scan.concerns().map(String::from).collect();
        let safe = gate_results.iter().all(|g| g.passed) && concerns.is_empty();

        Ok(ContentAssessment {
            safe,
            risk_level,
            gate_results,
            concerns,
        })
    }

    /// Apply a partial update
    ///
    /// Patterns are recompiled only when `custom_patterns` is supplied and
    /// differs from the current list. On error nothing changes.
    pub fn update_config(&mut self, update: ConfigUpdate) -> Result<(), ConfigError> {
        let recompile = update
            .custom_patterns
            .as_ref()
            .is_some_and(|patterns| *patterns != self.config.custom_patterns);
        let mut next = self.config.clone();
        next.apply(update);
        next.check()?;
        next.canonicalize_addresses();

        if recompile {
            let registry = PatternRegistry::new(&next.custom_patterns)?;
            info!(
                "Recompiled pattern registry: {} patterns ({} custom)",
                registry.len(),
                next.custom_patterns.len()
            );
            self.registry = registry;
        }

        if next.max_history_size != self.history.capacity() {
            self.history.set_capacity(next.max_history_size);
        }

        self.config = next;
        Ok(())
    }

    pub fn set_on_validation(&mut self, callback: Option<ValidationCallback>) {
        self.config.on_validation = callback;
    }

    /// Returns `true` if the address was not already blocked
    ///
    /// Hex addresses are stored lowercased.
    pub fn block_address(&mut self, address: &str) -> bool {
        let address = canonical_address(address);
        if address.is_empty() {
            return false;
        }
        let inserted = self.config.blocked_addresses.insert(address.clone());
        if inserted {
            info!("Blocked address {}", address);
        }
        inserted
    }

    /// Returns `true` if the address was blocked
    pub fn unblock_address(&mut self, address: &str) -> bool {
        let address = canonical_address(address);
        let removed = self.config.blocked_addresses.remove(&address);
        if removed {
            info!("Unblocked address {}", address);
        }
        removed
    }

    pub fn is_address_blocked(&self, address: &str) -> bool {
        self.config.is_blocked(address)
    }

    pub fn get_stats(&self) -> ValidationStats {
        self.history.stats()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn history(&self) -> &ValidationHistory {
        &self.history
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
