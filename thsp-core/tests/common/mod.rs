//! Test helper functions for integration tests
//!
//! Shared across test files using the tests/common/ pattern.

#![allow(dead_code)]

use std::sync::Once;
use thsp_core::{SafetyValidator, ValidationInput, ValidatorConfig};

/// A well-formed base58 account address
pub const VALID_ADDRESS: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";

pub const VALID_PURPOSE: &str = "Payment for NFT purchase from verified seller";

/// Initialize logging for tests (only once per test run)
static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

pub fn validator() -> SafetyValidator {
    validator_with(ValidatorConfig::default())
}

pub fn validator_with(config: ValidatorConfig) -> SafetyValidator {
    init_test_logging();
    SafetyValidator::new(config).expect("config should compile")
}

/// A transfer that passes every gate under the default configuration
pub fn clean_transfer(amount: f64) -> ValidationInput {
    ValidationInput::new("transfer")
        .with_amount(amount)
        .with_recipient(VALID_ADDRESS)
        .with_purpose(VALID_PURPOSE)
}
