//! Pattern scanner - runs the compiled registry over an input's text.
//!
//! The scanned blob is `action`, `memo`, `purpose` and the sanitized
//! metadata (JSON, allow-listed keys only), one per line. Each match
//! contributes its message as a concern and folds its severity into the
//! running risk level.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::gates::Gate;
use crate::input::ValidationInput;
use crate::patterns::CompiledPattern;
use crate::risk::RiskLevel;

/// One pattern that fired
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub pattern_id: String,
    pub gate: Option<Gate>,
    pub severity: RiskLevel,
    pub message: String,
}

/// Everything a scan found
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanOutcome {
    pub matches: Vec<PatternMatch>,
    /// Highest severity among matches; `Low` when nothing matched
    pub risk_level: RiskLevel,
}

impl ScanOutcome {
    pub fn concerns(&self) -> impl Iterator<Item = &str> {
        self.matches.iter().map(|m| m.message.as_str())
    }

    pub fn is_clean(&self) -> bool {
        self.matches.is_empty()
    }

    /// Matches attributed to one gate
    pub fn for_gate(&self, gate: Gate) -> impl Iterator<Item = &PatternMatch> {
        self.matches.iter().filter(move |m| m.gate == Some(gate))
    }
}

/// Scans text with a fixed compiled pattern list
pub struct PatternScanner {
    patterns: Arc<[CompiledPattern]>,
}

impl PatternScanner {
    pub fn new(patterns: Arc<[CompiledPattern]>) -> Self {
        Self { patterns }
    }

    /// Scan the textual fields of a normalized input
    pub fn scan_input(&self, input: &ValidationInput) -> ScanOutcome {
        self.scan(&scan_text(input))
    }

    /// Scan arbitrary text
    pub fn scan(&self, text: &str) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();

        for pattern in self.patterns.iter() {
            if !pattern.is_match(text) {
                continue;
            }
            debug!(
                "Pattern {} matched (severity: {})",
                pattern.id, pattern.severity
            );
            outcome.risk_level = outcome.risk_level.escalate(pattern.severity);
            outcome.matches.push(PatternMatch {
                pattern_id: pattern.id.clone(),
                gate: pattern.gate,
                severity: pattern.severity,
                message: pattern.message.clone(),
            });
        }

        trace!(
            "Scan complete: {} matches, risk {}",
            outcome.matches.len(),
            outcome.risk_level
        );
        outcome
    }
}

/// The text blob a scan runs against
pub fn scan_text(input: &ValidationInput) -> String {
    let mut parts: Vec<String> = vec![input.action.clone()];
    parts.extend(input.memo.iter().cloned());
    parts.extend(input.purpose.iter().cloned());
    if !input.metadata.is_empty() {
        if let Ok(json) = serde_json::to_string(&input.metadata) {
            parts.push(json);
        }
    }
    parts.join("\n")
}
