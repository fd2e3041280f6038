//! THSP safety validation library exports
//!
//! Every proposed agent action is checked against four gates (Truth, Harm,
//! Scope, Purpose) plus a catalog of suspicious-text patterns, producing an
//! advisory decision. Callers remain responsible for actually blocking.

pub mod address;
pub mod config;
pub mod decision;
pub mod error;
pub mod gates;
pub mod history;
pub mod input;
pub mod patterns;
pub mod recommendations;
pub mod risk;
pub mod scanner;
pub mod semantic;
pub mod validator;

pub use address::AddressValidationMode;
pub use config::{ConfigUpdate, ValidationCallback, ValidatorConfig};
pub use decision::{ContentAssessment, SafetyValidationResult};
pub use error::{ConfigError, InputError, SemanticError};
pub use gates::{Gate, GateResult};
pub use history::ValidationStats;
pub use input::{MetadataValue, ValidationInput};
pub use patterns::{MatcherKind, PatternSpec};
pub use risk::RiskLevel;
pub use semantic::{SemanticConfig, SemanticCoordinator, SemanticValidationResult};
pub use validator::SafetyValidator;
