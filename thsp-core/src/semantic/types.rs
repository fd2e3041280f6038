//! Semantic judgment types - what providers return and what callers receive.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::decision::ContentAssessment;
use crate::gates::Gate;
use crate::risk::{self, RiskLevel};

/// Confidence reported for heuristic results. The heuristic layer is a
/// lexical classifier, not semantic understanding.
pub const HEURISTIC_CONFIDENCE: f64 = 0.5;

/// One gate as judged by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateJudgment {
    pub passed: bool,
    #[serde(default)]
    pub reasoning: String,
}

impl GateJudgment {
    fn pass(reasoning: &str) -> Self {
        Self {
            passed: true,
            reasoning: reasoning.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateJudgments {
    pub truth: GateJudgment,
    pub harm: GateJudgment,
    pub scope: GateJudgment,
    pub purpose: GateJudgment,
}

impl GateJudgments {
    pub fn get(&self, gate: Gate) -> &GateJudgment {
        match gate {
            Gate::Truth => &self.truth,
            Gate::Harm => &self.harm,
            Gate::Scope => &self.scope,
            Gate::Purpose => &self.purpose,
        }
    }

    pub fn all_passed(&self) -> bool {
        Gate::ALL.iter().all(|&g| self.get(g).passed)
    }

    /// Highest failure risk among failed gates
    fn risk_level(&self) -> RiskLevel {
        risk::aggregate(
            Gate::ALL
                .iter()
                .filter(|&&g| !self.get(g).passed)
                .map(|g| g.failure_risk()),
        )
    }
}

/// Structured THSP judgment as returned by a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticJudgment {
    pub safe: bool,
    pub gates: GateJudgments,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub overall_reasoning: String,
}

fn default_confidence() -> f64 {
    HEURISTIC_CONFIDENCE
}

/// Parse a provider reply, tolerating a markdown code fence around the JSON
pub fn parse_judgment(raw: &str) -> Result<SemanticJudgment> {
    let cleaned = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let mut judgment: SemanticJudgment = serde_json::from_str(cleaned)
        .with_context(|| format!("Failed to parse semantic judgment as JSON: {cleaned}"))?;

    if !judgment.confidence.is_finite() {
        judgment.confidence = 0.0;
    }
    judgment.confidence = judgment.confidence.clamp(0.0, 1.0);
    Ok(judgment)
}

/// How a result was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMethod {
    Semantic,
    Heuristic,
    DryRun,
}

/// What `validate_semantic` returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticValidationResult {
    pub safe: bool,
    pub gates: GateJudgments,
    pub confidence: f64,
    pub overall_reasoning: String,
    pub risk_level: RiskLevel,
    pub method: EvaluationMethod,
    /// Served from the result cache
    #[serde(default)]
    pub cached: bool,
    /// Set when accuracy is reduced (heuristic fallback)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl SemanticValidationResult {
    /// Wrap a provider judgment. A failed gate always makes the result unsafe,
    /// whatever the provider said at the top level.
    pub fn from_judgment(judgment: SemanticJudgment, cached: bool) -> Self {
        let safe = judgment.safe && judgment.gates.all_passed();
        let risk_level = judgment.gates.risk_level();
        Self {
            safe,
            gates: judgment.gates,
            confidence: judgment.confidence,
            overall_reasoning: judgment.overall_reasoning,
            risk_level,
            method: EvaluationMethod::Semantic,
            cached,
            warning: None,
        }
    }

    /// Wrap a heuristic content assessment
    pub fn from_assessment(assessment: &ContentAssessment, warning: String) -> Self {
        let judgment_for = |gate: Gate| {
            let result = assessment.gate_results.iter().find(|r| r.gate == gate);
            match result {
                Some(r) if !r.passed => GateJudgment {
                    passed: false,
                    reasoning: r.reason.clone().unwrap_or_default(),
                },
                _ => GateJudgment::pass("No heuristic patterns matched"),
            }
        };

        let overall_reasoning = if assessment.concerns.is_empty() {
            "Heuristic analysis found no concerns".to_string()
        } else {
            format!("Heuristic analysis flagged: {}", assessment.concerns.join("; "))
        };

        Self {
            safe: assessment.safe,
            gates: GateJudgments {
                truth: judgment_for(Gate::Truth),
                harm: judgment_for(Gate::Harm),
                scope: judgment_for(Gate::Scope),
                purpose: judgment_for(Gate::Purpose),
            },
            confidence: HEURISTIC_CONFIDENCE,
            overall_reasoning,
            risk_level: assessment.risk_level,
            method: EvaluationMethod::Heuristic,
            cached: false,
            warning: Some(warning),
        }
    }

    /// Passing result for dry-run mode; nothing was evaluated
    pub fn dry_run() -> Self {
        let skipped = GateJudgment::pass("dry_run: not evaluated");
        Self {
            safe: true,
            gates: GateJudgments {
                truth: skipped.clone(),
                harm: skipped.clone(),
                scope: skipped.clone(),
                purpose: skipped,
            },
            confidence: 0.0,
            overall_reasoning: "Semantic dry_run mode: request built but API call was skipped"
                .to_string(),
            risk_level: RiskLevel::Low,
            method: EvaluationMethod::DryRun,
            cached: false,
            warning: None,
        }
    }
}
