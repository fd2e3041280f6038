//! Risk scale and the monotonic escalation rule.
//!
//! Every place that combines risk (gate failures, pattern matches) goes
//! through [`RiskLevel::escalate`], so a validation can only ever move up
//! the scale `low < medium < high < critical`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordered risk scale. The derived `Ord` follows declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// All levels, lowest first
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    /// Combine the current level with an incoming one. Never downgrades.
    #[must_use]
    pub fn escalate(self, incoming: RiskLevel) -> RiskLevel {
        self.max(incoming)
    }

    /// Position on the scale (low = 0)
    pub fn index(self) -> usize {
        self as usize
    }

    /// High or critical
    pub fn is_high_or_above(self) -> bool {
        self >= RiskLevel::High
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            "critical" => Ok(RiskLevel::Critical),
            other => Err(format!("unknown risk level: {other}")),
        }
    }
}

/// Fold a sequence of contributions into one level, starting from `Low`
pub fn aggregate<I>(levels: I) -> RiskLevel
where
    I: IntoIterator<Item = RiskLevel>,
{
    levels
        .into_iter()
        .fold(RiskLevel::Low, RiskLevel::escalate)
}
