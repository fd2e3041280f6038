//! Decision policy and the verdict type.
//!
//! - `safe` = every gate passed and there are no concerns
//! - `should_proceed` = `safe` in strict mode; otherwise every gate passed
//!   and risk is below critical (pattern-only concerns are tolerated)
//! - `requires_confirmation` = amount above the confirmation threshold, or
//!   risk exactly `high`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ValidatorConfig;
use crate::error::InputError;
use crate::gates::{Gate, GateResult};
use crate::risk::RiskLevel;

/// The three booleans of a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub safe: bool,
    pub should_proceed: bool,
    pub requires_confirmation: bool,
}

/// Turns gate results, concerns and risk into a [`Decision`]
#[derive(Debug, Clone, Copy)]
pub struct DecisionPolicy {
    pub strict_mode: bool,
    pub confirmation_threshold: f64,
}

impl DecisionPolicy {
    pub fn from_config(config: &ValidatorConfig) -> Self {
        Self {
            strict_mode: config.strict_mode,
            confirmation_threshold: config.confirmation_threshold,
        }
    }

    pub fn decide(
        &self,
        gate_results: &[GateResult],
        concern_count: usize,
        risk_level: RiskLevel,
        amount: Option<f64>,
    ) -> Decision {
        let all_gates_passed = gate_results.iter().all(|g| g.passed);
        let safe = all_gates_passed && concern_count == 0;

        let should_proceed = if self.strict_mode {
            safe
        } else {
            all_gates_passed && risk_level != RiskLevel::Critical
        };

        let requires_confirmation = amount.is_some_and(|a| a > self.confirmation_threshold)
            || risk_level == RiskLevel::High;

        Decision {
            safe,
            should_proceed,
            requires_confirmation,
        }
    }
}

/// Bookkeeping attached to every verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    pub action: String,
    pub timestamp: DateTime<Utc>,
    pub validation_duration_ms: f64,
}

/// The verdict on one action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyValidationResult {
    pub safe: bool,
    pub risk_level: RiskLevel,
    pub should_proceed: bool,
    pub requires_confirmation: bool,
    pub gate_results: Vec<GateResult>,
    pub concerns: Vec<String>,
    pub recommendations: Vec<String>,
    pub metadata: ResultMetadata,
}

impl SafetyValidationResult {
    /// Verdict for input that never reached the gates
    ///
    /// Critical, non-proceedable, with the input error as the single concern.
    /// The Truth gate carries the error; the others are reported as not
    /// evaluated.
    pub fn rejected(action: &str, error: &InputError, duration_ms: f64) -> Self {
        let reason = error.to_string();
        let gate_results = Gate::ALL
            .iter()
            .map(|&gate| match gate {
                Gate::Truth => GateResult::fail(gate, reason.clone()),
                _ => GateResult::fail(gate, "Not evaluated: input was rejected"),
            })
            .collect();

        Self {
            safe: false,
            risk_level: RiskLevel::Critical,
            should_proceed: false,
            requires_confirmation: false,
            gate_results,
            concerns: vec![reason],
            recommendations: vec!["Fix the malformed input and validate again".to_string()],
            metadata: ResultMetadata {
                action: action.to_string(),
                timestamp: Utc::now(),
                validation_duration_ms: duration_ms,
            },
        }
    }

    pub fn all_gates_passed(&self) -> bool {
        self.gate_results.iter().all(|g| g.passed)
    }

    pub fn gate(&self, gate: Gate) -> Option<&GateResult> {
        self.gate_results.iter().find(|g| g.gate == gate)
    }

    pub fn failed_gates(&self) -> impl Iterator<Item = Gate> + '_ {
        self.gate_results
            .iter()
            .filter(|g| !g.passed)
            .map(|g| g.gate)
    }

    /// Not proceeding
    pub fn is_blocked(&self) -> bool {
        !self.should_proceed
    }
}

/// Heuristic verdict on free text (chat messages, tool output)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentAssessment {
    pub safe: bool,
    pub risk_level: RiskLevel,
    pub gate_results: Vec<GateResult>,
    pub concerns: Vec<String>,
}
