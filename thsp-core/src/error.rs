//! Error types for the validator
//!
//! Input errors never escape `validate`; they are folded into a critical,
//! non-proceedable verdict. Configuration errors surface when the validator
//! is built or reconfigured. Semantic errors are only returned when the
//! heuristic fallback cannot run either.

use std::time::Duration;
use thiserror::Error;

/// A malformed field in an action record
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Field '{field}' must not be empty")]
    EmptyField { field: &'static str },

    #[error("Field '{field}' must be a {expected}")]
    InvalidType {
        field: String,
        expected: &'static str,
    },

    #[error("Field '{field}' must be a finite number")]
    NonFinite { field: &'static str },

    #[error("Input must be a JSON object")]
    NotAnObject,
}

impl InputError {
    /// Name of the offending field, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            InputError::MissingField { field }
            | InputError::EmptyField { field }
            | InputError::NonFinite { field } => Some(field),
            InputError::InvalidType { field, .. } => Some(field),
            InputError::NotAnObject => None,
        }
    }
}

/// Problems with a validator configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid pattern '{id}': {source}")]
    InvalidPattern {
        id: String,
        #[source]
        source: regex::Error,
    },

    #[error("Duplicate pattern id: {id}")]
    DuplicatePattern { id: String },

    #[error("Pattern '{id}' has an empty matcher")]
    EmptyPattern { id: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

/// Failures on the semantic (LLM) path
#[derive(Error, Debug)]
pub enum SemanticError {
    #[error("Content to validate is empty")]
    EmptyContent,

    #[error("No semantic backend configured")]
    NotConfigured,

    #[error("No API key configured (set {env} or provide one explicitly)")]
    MissingApiKey { env: String },

    #[error("Semantic validation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Backend error: {0}")]
    Backend(#[from] anyhow::Error),
}
