//! Pattern registry - the catalog of detection rules.
//!
//! Patterns are declared as [`PatternSpec`] (serializable, caller-supplied or
//! built-in) and compiled once into a [`PatternRegistry`]. The registry holds
//! its compiled list behind an `Arc`, so a reconfiguration builds a fresh
//! registry and swaps it in while scans that already hold the old list keep
//! using it.

pub mod builtin;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::gates::Gate;
use crate::risk::RiskLevel;

/// How a pattern's matcher string is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatcherKind {
    /// A regular expression, used as written (case-insensitive)
    #[default]
    Regex,
    /// A literal phrase, escaped and anchored on word boundaries
    Literal,
}

/// A detection rule as declared in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSpec {
    /// Unique identifier
    pub id: String,

    /// Regex source or literal phrase, depending on `kind`
    pub pattern: String,

    #[serde(default)]
    pub kind: MatcherKind,

    /// Gate this rule speaks for; `None` for generic rules
    #[serde(default)]
    pub gate: Option<Gate>,

    pub severity: RiskLevel,

    /// Concern text reported when the rule matches
    pub message: String,
}

impl PatternSpec {
    pub fn regex(
        id: impl Into<String>,
        pattern: impl Into<String>,
        gate: Option<Gate>,
        severity: RiskLevel,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            pattern: pattern.into(),
            kind: MatcherKind::Regex,
            gate,
            severity,
            message: message.into(),
        }
    }

    pub fn literal(
        id: impl Into<String>,
        phrase: impl Into<String>,
        gate: Option<Gate>,
        severity: RiskLevel,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            pattern: phrase.into(),
            kind: MatcherKind::Literal,
            gate,
            severity,
            message: message.into(),
        }
    }

    /// Regex source actually compiled for this rule
    fn source(&self) -> String {
        match self.kind {
            MatcherKind::Regex => self.pattern.clone(),
            MatcherKind::Literal => literal_source(self.pattern.trim()),
        }
    }

    /// Compile into a ready-to-scan pattern
    pub fn compile(&self) -> Result<CompiledPattern, ConfigError> {
        if self.pattern.trim().is_empty() {
            return Err(ConfigError::EmptyPattern {
                id: self.id.clone(),
            });
        }

        let regex = RegexBuilder::new(&self.source())
            .case_insensitive(true)
            .build()
            .map_err(|source| ConfigError::InvalidPattern {
                id: self.id.clone(),
                source,
            })?;

        Ok(CompiledPattern {
            id: self.id.clone(),
            regex,
            gate: self.gate,
            severity: self.severity,
            message: self.message.clone(),
        })
    }
}

/// Escape a literal phrase and put word boundaries on whichever ends are
/// word characters, so "drain" never matches inside "drainage".
fn literal_source(phrase: &str) -> String {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let mut source = String::with_capacity(phrase.len() + 4);
    if phrase.chars().next().is_some_and(is_word) {
        source.push_str(r"\b");
    }
    source.push_str(&regex::escape(phrase));
    if phrase.chars().last().is_some_and(is_word) {
        source.push_str(r"\b");
    }
    source
}

/// A compiled detection rule
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub id: String,
    pub regex: Regex,
    pub gate: Option<Gate>,
    pub severity: RiskLevel,
    pub message: String,
}

impl CompiledPattern {
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Immutable compiled pattern list
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    patterns: Arc<[CompiledPattern]>,
}

impl PatternRegistry {
    /// Compile the built-in catalog followed by `custom`
    pub fn new(custom: &[PatternSpec]) -> Result<Self, ConfigError> {
        let mut specs = builtin::builtin_patterns();
        specs.extend_from_slice(custom);
        Self::from_specs(&specs)
    }

    /// Compile exactly the given specs, without the built-in catalog
    pub fn from_specs(specs: &[PatternSpec]) -> Result<Self, ConfigError> {
        let mut seen = HashSet::with_capacity(specs.len());
        let mut compiled = Vec::with_capacity(specs.len());

        for spec in specs {
            if !seen.insert(spec.id.as_str()) {
                return Err(ConfigError::DuplicatePattern {
                    id: spec.id.clone(),
                });
            }
            let pattern = spec.compile()?;
            debug!("Compiled pattern {} ({})", pattern.id, pattern.severity);
            compiled.push(pattern);
        }

        info!("Pattern registry compiled: {} patterns", compiled.len());

        Ok(Self {
            patterns: compiled.into(),
        })
    }

    /// Shared handle to the compiled list
    pub fn snapshot(&self) -> Arc<[CompiledPattern]> {
        Arc::clone(&self.patterns)
    }

    pub fn patterns(&self) -> &[CompiledPattern] {
        &self.patterns
    }

    pub fn get(&self, id: &str) -> Option<&CompiledPattern> {
        self.patterns.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
