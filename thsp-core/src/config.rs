//! Validator configuration
//!
//! [`ValidatorConfig`] is built once per validator and changed through
//! [`ConfigUpdate`], a partial overlay where every `None` leaves the current
//! value alone. Both types deserialize from JSON/YAML with per-field
//! defaults so hosts can load them however they like.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::address::{canonical_address, is_hex_address, AddressValidationMode};
use crate::decision::SafetyValidationResult;
use crate::error::ConfigError;
use crate::patterns::PatternSpec;

/// Observer invoked once per validation, after the verdict is stored
#[derive(Clone)]
pub struct ValidationCallback(Arc<dyn Fn(&SafetyValidationResult) + Send + Sync>);

impl ValidationCallback {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&SafetyValidationResult) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, result: &SafetyValidationResult) {
        (self.0)(result)
    }
}

impl fmt::Debug for ValidationCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValidationCallback(..)")
    }
}

/// Top-level validator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Amounts above this fail the Scope gate
    #[serde(default = "default_max_transaction_amount")]
    pub max_transaction_amount: f64,

    /// Amounts above this require confirmation
    #[serde(default = "default_confirmation_threshold")]
    pub confirmation_threshold: f64,

    /// When true, any concern blocks; otherwise only failed gates or
    /// critical risk block
    #[serde(default)]
    pub strict_mode: bool,

    #[serde(default)]
    pub blocked_addresses: BTreeSet<String>,

    /// Program whitelist; `None` allows any program
    #[serde(default)]
    pub allowed_programs: Option<BTreeSet<String>>,

    /// Action keywords that require an explicit purpose
    #[serde(default = "default_require_purpose_for")]
    pub require_purpose_for: Vec<String>,

    /// Action keywords that fail the Harm gate outright
    #[serde(default = "default_high_risk_actions")]
    pub high_risk_actions: Vec<String>,

    #[serde(default)]
    pub address_validation_mode: AddressValidationMode,

    /// Extra detection rules compiled after the built-in catalog
    #[serde(default)]
    pub custom_patterns: Vec<PatternSpec>,

    #[serde(default = "default_max_history_size")]
    pub max_history_size: usize,

    #[serde(skip)]
    pub on_validation: Option<ValidationCallback>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_transaction_amount: default_max_transaction_amount(),
            confirmation_threshold: default_confirmation_threshold(),
            strict_mode: false,
            blocked_addresses: BTreeSet::new(),
            allowed_programs: None,
            require_purpose_for: default_require_purpose_for(),
            high_risk_actions: default_high_risk_actions(),
            address_validation_mode: AddressValidationMode::default(),
            custom_patterns: Vec::new(),
            max_history_size: default_max_history_size(),
            on_validation: None,
        }
    }
}

fn default_max_transaction_amount() -> f64 {
    1000.0
}

fn default_confirmation_threshold() -> f64 {
    100.0
}

fn default_require_purpose_for() -> Vec<String> {
    ["transfer", "send", "swap", "bridge", "withdraw"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_high_risk_actions() -> Vec<String> {
    ["drain", "dump", "rug", "exploit", "steal", "sweep"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_max_history_size() -> usize {
    1000
}

impl ValidatorConfig {
    /// Reject values the gates cannot work with
    pub fn check(&self) -> Result<(), ConfigError> {
        check_limit("max_transaction_amount", self.max_transaction_amount)?;
        check_limit("confirmation_threshold", self.confirmation_threshold)?;
        Ok(())
    }

    /// Rewrite every blocked address into its lookup form
    pub fn canonicalize_addresses(&mut self) {
        self.blocked_addresses = self
            .blocked_addresses
            .iter()
            .map(|a| canonical_address(a))
            .filter(|a| !a.is_empty())
            .collect();
    }

    /// Blocklist membership, ignoring case for hex addresses
    pub fn is_blocked(&self, address: &str) -> bool {
        let key = canonical_address(address);
        if self.blocked_addresses.contains(&key) {
            return true;
        }
        // Entries that skipped canonicalization
        is_hex_address(&key)
            && self
                .blocked_addresses
                .iter()
                .any(|a| canonical_address(a) == key)
    }

    /// Overlay a partial update. Pattern recompilation is the caller's job.
    pub fn apply(&mut self, update: ConfigUpdate) {
        let ConfigUpdate {
            max_transaction_amount,
            confirmation_threshold,
            strict_mode,
            blocked_addresses,
            allowed_programs,
            require_purpose_for,
            high_risk_actions,
            address_validation_mode,
            custom_patterns,
            max_history_size,
            on_validation,
        } = update;

        if let Some(v) = max_transaction_amount {
            self.max_transaction_amount = v;
        }
        if let Some(v) = confirmation_threshold {
            self.confirmation_threshold = v;
        }
        if let Some(v) = strict_mode {
            self.strict_mode = v;
        }
        if let Some(v) = blocked_addresses {
            self.blocked_addresses = v;
        }
        if let Some(v) = allowed_programs {
            self.allowed_programs = v;
        }
        if let Some(v) = require_purpose_for {
            self.require_purpose_for = v;
        }
        if let Some(v) = high_risk_actions {
            self.high_risk_actions = v;
        }
        if let Some(v) = address_validation_mode {
            self.address_validation_mode = v;
        }
        if let Some(v) = custom_patterns {
            self.custom_patterns = v;
        }
        if let Some(v) = max_history_size {
            self.max_history_size = v;
        }
        if let Some(v) = on_validation {
            self.on_validation = Some(v);
        }
    }
}

fn check_limit(key: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidValue {
            key,
            message: format!("expected a finite, non-negative number, got {value}"),
        });
    }
    Ok(())
}

/// Partial configuration update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_transaction_amount: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_threshold: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict_mode: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_addresses: Option<BTreeSet<String>>,

    /// `Some(None)` removes the whitelist
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_programs: Option<Option<BTreeSet<String>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_purpose_for: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_risk_actions: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_validation_mode: Option<AddressValidationMode>,

    /// Supplying this triggers pattern recompilation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_patterns: Option<Vec<PatternSpec>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_history_size: Option<usize>,

    #[serde(skip)]
    pub on_validation: Option<ValidationCallback>,
}
