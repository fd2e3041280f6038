//! The four THSP gates - Truth, Harm, Scope, Purpose.
//!
//! Each gate is an independent check over a normalized [`ValidationInput`]
//! and yields exactly one [`GateResult`]. Gates never fail hard; a failure is
//! a `passed: false` result carrying one human-readable reason.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::address::{is_valid_address, AddressValidationMode};
use crate::config::ValidatorConfig;
use crate::input::ValidationInput;
use crate::risk::RiskLevel;

const MIN_PURPOSE_CHARS: usize = 20;
const MIN_PURPOSE_WORDS: usize = 3;
const DEGENERATE_REPEAT: usize = 10;

/// One safety dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gate {
    Truth,
    Harm,
    Scope,
    Purpose,
}

impl Gate {
    /// Evaluation order
    pub const ALL: [Gate; 4] = [Gate::Truth, Gate::Harm, Gate::Scope, Gate::Purpose];

    pub fn as_str(self) -> &'static str {
        match self {
            Gate::Truth => "truth",
            Gate::Harm => "harm",
            Gate::Scope => "scope",
            Gate::Purpose => "purpose",
        }
    }

    /// Risk contributed when this gate fails
    pub fn failure_risk(self) -> RiskLevel {
        match self {
            Gate::Truth | Gate::Harm => RiskLevel::High,
            Gate::Scope | Gate::Purpose => RiskLevel::Medium,
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateResult {
    pub gate: Gate,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl GateResult {
    pub fn pass(gate: Gate) -> Self {
        Self {
            gate,
            passed: true,
            reason: None,
        }
    }

    pub fn fail(gate: Gate, reason: impl Into<String>) -> Self {
        Self {
            gate,
            passed: false,
            reason: Some(reason.into()),
        }
    }

    fn from_check(gate: Gate, check: Result<(), String>) -> Self {
        match check {
            Ok(()) => Self::pass(gate),
            Err(reason) => Self::fail(gate, reason),
        }
    }
}

/// Runs the four gates against one configuration
pub struct GateEvaluator<'a> {
    config: &'a ValidatorConfig,
}

impl<'a> GateEvaluator<'a> {
    pub fn new(config: &'a ValidatorConfig) -> Self {
        Self { config }
    }

    /// All four gates, in [`Gate::ALL`] order
    pub fn evaluate(&self, input: &ValidationInput) -> Vec<GateResult> {
        Gate::ALL
            .iter()
            .map(|&gate| self.evaluate_gate(gate, input))
            .collect()
    }

    pub fn evaluate_gate(&self, gate: Gate, input: &ValidationInput) -> GateResult {
        let check = match gate {
            Gate::Truth => self.check_truth(input),
            Gate::Harm => self.check_harm(input),
            Gate::Scope => self.check_scope(input),
            Gate::Purpose => self.check_purpose(input),
        };
        GateResult::from_check(gate, check)
    }

    fn check_truth(&self, input: &ValidationInput) -> Result<(), String> {
        for (field, value) in input.address_fields() {
            if is_valid_address(value) {
                continue;
            }
            match self.config.address_validation_mode {
                AddressValidationMode::Strict => {
                    return Err(format!("Invalid {field} address format: {value}"));
                }
                AddressValidationMode::Warn => {
                    warn!("Invalid {} address format: {}", field, value);
                }
                AddressValidationMode::Ignore => {}
            }
        }

        if let Some(amount) = input.amount {
            if amount.is_nan() {
                return Err("Amount is not a valid number".to_string());
            }
            if amount < 0.0 {
                return Err(format!("Amount cannot be negative: {amount}"));
            }
        }

        Ok(())
    }

    fn check_harm(&self, input: &ValidationInput) -> Result<(), String> {
        if let Some(recipient) = &input.recipient {
            if self.config.is_blocked(recipient) {
                return Err(format!(
                    "Recipient {recipient} is on the blocked address list"
                ));
            }
        }

        let action = input.action.to_lowercase();
        if let Some(keyword) = first_keyword(&action, &self.config.high_risk_actions) {
            return Err(format!(
                "Action '{}' matches high-risk keyword '{}'",
                input.action, keyword
            ));
        }

        if let (Some(allowed), Some(program)) = (&self.config.allowed_programs, &input.program_id)
        {
            if !allowed.contains(program) {
                return Err(format!("Program {program} is not in the allowed program list"));
            }
        }

        Ok(())
    }

    fn check_scope(&self, input: &ValidationInput) -> Result<(), String> {
        match input.amount {
            Some(amount) if amount > self.config.max_transaction_amount => Err(format!(
                "Transaction amount {} exceeds maximum allowed {}",
                amount, self.config.max_transaction_amount
            )),
            _ => Ok(()),
        }
    }

    fn check_purpose(&self, input: &ValidationInput) -> Result<(), String> {
        let Some(purpose) = input.purpose.as_deref() else {
            let action = input.action.to_lowercase();
            return match first_keyword(&action, &self.config.require_purpose_for) {
                Some(_) => Err(format!(
                    "Action '{}' requires an explicit purpose",
                    input.action
                )),
                None => Ok(()),
            };
        };

        let purpose = purpose.trim();
        if purpose.chars().count() < MIN_PURPOSE_CHARS {
            return Err(format!(
                "Purpose is too short (minimum {MIN_PURPOSE_CHARS} characters)"
            ));
        }
        if purpose.split_whitespace().count() < MIN_PURPOSE_WORDS {
            return Err(format!(
                "Purpose must contain at least {MIN_PURPOSE_WORDS} words"
            ));
        }
        if is_degenerate(purpose) {
            return Err("Purpose appears to be repeated or meaningless text".to_string());
        }

        Ok(())
    }
}

/// First configured keyword contained in an already-lowercased action
fn first_keyword<'k>(action: &str, keywords: &'k [String]) -> Option<&'k str> {
    keywords
        .iter()
        .map(String::as_str)
        .find(|kw| !kw.is_empty() && action.contains(&kw.to_lowercase()))
}

/// One character repeated at least [`DEGENERATE_REPEAT`] times, whitespace ignored
fn is_degenerate(text: &str) -> bool {
    let mut chars = text.chars().filter(|c| !c.is_whitespace());
    let Some(first) = chars.next() else {
        return false;
    };
    let mut count = 1;
    for c in chars {
        if c != first {
            return false;
        }
        count += 1;
    }
    count >= DEGENERATE_REPEAT
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    const VALID_ADDRESS: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";
    const VALID_PURPOSE: &str = "Payment for NFT purchase from verified seller";

    fn gate(config: &ValidatorConfig, g: Gate, input: &ValidationInput) -> GateResult {
        GateEvaluator::new(config).evaluate_gate(g, input)
    }

    #[test]
    fn test_clean_transfer_passes_all_gates() {
        let config = ValidatorConfig::default();
        let input = ValidationInput::new("transfer")
            .with_amount(50.0)
            .with_recipient(VALID_ADDRESS)
            .with_purpose(VALID_PURPOSE);

        let results = GateEvaluator::new(&config).evaluate(&input);
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.passed));
        let order: Vec<Gate> = results.iter().map(|r| r.gate).collect();
        assert_eq!(order, Gate::ALL.to_vec());
    }

    #[test]
    fn test_truth_address_modes() {
        let input = ValidationInput::new("send").with_recipient("not-an-address");

        let strict = ValidatorConfig::default();
        let result = gate(&strict, Gate::Truth, &input);
        assert!(!result.passed);
        assert!(result.reason.unwrap().contains("Invalid recipient address"));

        for mode in [AddressValidationMode::Warn, AddressValidationMode::Ignore] {
            let config = ValidatorConfig {
                address_validation_mode: mode,
                ..Default::default()
            };
            assert!(gate(&config, Gate::Truth, &input).passed);
        }
    }

    #[test]
    fn test_truth_negative_amount() {
        let config = ValidatorConfig::default();
        let input = ValidationInput::new("stake").with_amount(-1.0);
        let result = gate(&config, Gate::Truth, &input);
        assert_eq!(result.reason.as_deref(), Some("Amount cannot be negative: -1"));
    }

    #[test]
    fn test_harm_blocked_recipient() {
        let config = ValidatorConfig {
            blocked_addresses: BTreeSet::from([VALID_ADDRESS.to_string()]),
            ..Default::default()
        };
        let input = ValidationInput::new("transfer").with_recipient(VALID_ADDRESS);
        let result = gate(&config, Gate::Harm, &input);
        assert!(!result.passed);
        assert!(result.reason.unwrap().contains("blocked address list"));
    }

    #[test]
    fn test_harm_blocked_hex_recipient_ignores_case() {
        let config = ValidatorConfig {
            blocked_addresses: BTreeSet::from([
                "0x52908400098527886E0F7030069857D2E4169EE7".to_string()
            ]),
            ..Default::default()
        };
        for recipient in [
            "0x52908400098527886e0f7030069857d2e4169ee7",
            "0X52908400098527886E0F7030069857D2E4169EE7",
        ] {
            let input = ValidationInput::new("transfer").with_recipient(recipient);
            let result = gate(&config, Gate::Harm, &input);
            assert!(!result.passed, "{recipient}");
        }

        // Base58 stays case-sensitive
        let config = ValidatorConfig {
            blocked_addresses: BTreeSet::from([VALID_ADDRESS.to_string()]),
            ..Default::default()
        };
        let input = ValidationInput::new("transfer").with_recipient(VALID_ADDRESS.to_lowercase());
        assert!(gate(&config, Gate::Harm, &input).passed);
    }

    #[test]
    fn test_harm_high_risk_keyword_is_case_insensitive() {
        let config = ValidatorConfig::default();
        let result = gate(&config, Gate::Harm, &ValidationInput::new("drainWallet"));
        assert!(!result.passed);
        assert!(result.reason.unwrap().contains("'drain'"));
    }

    #[test]
    fn test_harm_program_whitelist() {
        let config = ValidatorConfig {
            allowed_programs: Some(BTreeSet::from([VALID_ADDRESS.to_string()])),
            ..Default::default()
        };
        let other = "11111111111111111111111111111111";

        assert!(gate(&config, Gate::Harm, &ValidationInput::new("swap")).passed);
        assert!(
            gate(
                &config,
                Gate::Harm,
                &ValidationInput::new("swap").with_program_id(VALID_ADDRESS)
            )
            .passed
        );
        assert!(
            !gate(
                &config,
                Gate::Harm,
                &ValidationInput::new("swap").with_program_id(other)
            )
            .passed
        );
    }

    #[test]
    fn test_scope_limit() {
        let config = ValidatorConfig {
            max_transaction_amount: 100.0,
            ..Default::default()
        };
        assert!(gate(&config, Gate::Scope, &ValidationInput::new("x").with_amount(100.0)).passed);

        let result = gate(&config, Gate::Scope, &ValidationInput::new("x").with_amount(500.0));
        assert_eq!(
            result.reason.as_deref(),
            Some("Transaction amount 500 exceeds maximum allowed 100")
        );
    }

    #[test]
    fn test_purpose_required_for_keyword_actions() {
        let config = ValidatorConfig::default();
        let result = gate(&config, Gate::Purpose, &ValidationInput::new("Transfer"));
        assert!(!result.passed);
        assert!(gate(&config, Gate::Purpose, &ValidationInput::new("balance")).passed);
    }

    #[test]
    fn test_purpose_heuristics() {
        let config = ValidatorConfig::default();
        let check = |purpose: &str| {
            gate(
                &config,
                Gate::Purpose,
                &ValidationInput::new("transfer").with_purpose(purpose),
            )
        };

        assert!(check("too short").reason.unwrap().contains("too short"));
        assert!(check("Supercalifragilisticexpialidocious")
            .reason
            .unwrap()
            .contains("at least 3 words"));
        assert!(check("aaa aaa aaa aaa aaa aaa")
            .reason
            .unwrap()
            .contains("repeated or meaningless"));
        assert!(check(VALID_PURPOSE).passed);
    }

    #[test]
    fn test_is_degenerate() {
        assert!(is_degenerate("a a a a a a a a a a"));
        assert!(!is_degenerate("aaaaaaaaa"));
        assert!(!is_degenerate("aaaaaaaaab"));
        assert!(!is_degenerate("   "));
    }
}
