//! Remediation hints derived from a verdict. Supplementary only: nothing
//! here feeds back into `safe` or `should_proceed`.

use crate::input::ValidationInput;
use crate::risk::RiskLevel;

pub const CONFIRM_HIGH_VALUE: &str =
    "High-value transaction: obtain manual confirmation before executing";
pub const REVIEW_HIGH_RISK: &str = "High risk detected: review this action carefully before proceeding";
pub const PROVIDE_PURPOSE: &str =
    "Provide an explicit purpose explaining why this action is needed";
pub const VERIFY_RECIPIENT: &str = "Verify the recipient address before transferring";

pub fn generate(
    input: &ValidationInput,
    concerns: &[String],
    risk_level: RiskLevel,
    confirmation_threshold: f64,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if input.amount.is_some_and(|a| a > confirmation_threshold) {
        recommendations.push(CONFIRM_HIGH_VALUE.to_string());
    }

    if risk_level.is_high_or_above() {
        recommendations.push(REVIEW_HIGH_RISK.to_string());
    }

    if concerns
        .iter()
        .any(|c| c.to_lowercase().contains("purpose"))
    {
        recommendations.push(PROVIDE_PURPOSE.to_string());
    }

    if input.action.to_lowercase().contains("transfer") && input.recipient.is_none() {
        recommendations.push(VERIFY_RECIPIENT.to_string());
    }

    recommendations
}
