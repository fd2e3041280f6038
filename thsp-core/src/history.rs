//! Bounded verdict history and the stats derived from it.
//!
//! FIFO with a hard cap: when full, the oldest entry is evicted before the
//! new one is appended, so the cap is never exceeded even transiently.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use tracing::trace;

use crate::decision::SafetyValidationResult;

/// Aggregate metrics over the retained history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ValidationStats {
    pub total: usize,
    pub blocked: usize,
    pub approved: usize,
    pub high_risk: usize,
    pub by_action: BTreeMap<String, usize>,
    /// `blocked / total`, `0.0` when empty
    pub block_rate: f64,
    pub average_duration_ms: f64,
}

#[derive(Debug, Clone)]
pub struct ValidationHistory {
    entries: VecDeque<SafetyValidationResult>,
    capacity: usize,
}

impl ValidationHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            // Avoid a huge up-front allocation for generous caps
            entries: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the cap, evicting the oldest entries if it shrank
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        while self.entries.len() > capacity {
            self.entries.pop_front();
        }
    }

    pub fn record(&mut self, result: SafetyValidationResult) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                trace!("Evicted history entry for '{}'", evicted.metadata.action);
            }
        }
        self.entries.push_back(result);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &SafetyValidationResult> {
        self.entries.iter()
    }

    /// The newest `n` entries, newest first
    pub fn recent(&self, n: usize) -> Vec<&SafetyValidationResult> {
        self.entries.iter().rev().take(n).collect()
    }

    pub fn stats(&self) -> ValidationStats {
        let total = self.entries.len();
        let mut stats = ValidationStats {
            total,
            ..Default::default()
        };
        let mut duration_sum = 0.0;

        for entry in &self.entries {
            if entry.should_proceed {
                stats.approved += 1;
            } else {
                stats.blocked += 1;
            }
            if entry.risk_level.is_high_or_above() {
                stats.high_risk += 1;
            }
            *stats
                .by_action
                .entry(entry.metadata.action.clone())
                .or_insert(0) += 1;
            duration_sum += entry.metadata.validation_duration_ms;
        }

        if total > 0 {
            stats.block_rate = stats.blocked as f64 / total as f64;
            stats.average_duration_ms = duration_sum / total as f64;
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::ResultMetadata;
    use crate::risk::RiskLevel;
    use chrono::Utc;

    fn entry(action: &str, should_proceed: bool, risk_level: RiskLevel) -> SafetyValidationResult {
        SafetyValidationResult {
            safe: should_proceed,
            risk_level,
            should_proceed,
            requires_confirmation: false,
            gate_results: vec![],
            concerns: vec![],
            recommendations: vec![],
            metadata: ResultMetadata {
                action: action.to_string(),
                timestamp: Utc::now(),
                validation_duration_ms: 2.0,
            },
        }
    }

    #[test]
    fn test_empty_stats_have_zero_block_rate() {
        let stats = ValidationHistory::new(10).stats();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.block_rate, 0.0);
        assert!(!stats.block_rate.is_nan());
        assert_eq!(stats.average_duration_ms, 0.0);
    }

    #[test]
    fn test_fifo_eviction() {
        let mut history = ValidationHistory::new(3);
        for i in 0..5 {
            history.record(entry(&format!("a{i}"), true, RiskLevel::Low));
            assert!(history.len() <= 3);
        }
        let actions: Vec<&str> = history.iter().map(|e| e.metadata.action.as_str()).collect();
        assert_eq!(actions, vec!["a2", "a3", "a4"]);
        assert_eq!(history.recent(1)[0].metadata.action, "a4");
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let mut history = ValidationHistory::new(0);
        history.record(entry("a", true, RiskLevel::Low));
        assert!(history.is_empty());
    }

    #[test]
    fn test_shrinking_capacity_evicts_oldest() {
        let mut history = ValidationHistory::new(5);
        for i in 0..5 {
            history.record(entry(&format!("a{i}"), true, RiskLevel::Low));
        }
        history.set_capacity(2);
        let actions: Vec<&str> = history.iter().map(|e| e.metadata.action.as_str()).collect();
        assert_eq!(actions, vec!["a3", "a4"]);
    }

    #[test]
    fn test_stats_breakdown() {
        let mut history = ValidationHistory::new(10);
        history.record(entry("transfer", true, RiskLevel::Low));
        history.record(entry("transfer", false, RiskLevel::High));
        history.record(entry("swap", false, RiskLevel::Critical));
        history.record(entry("swap", true, RiskLevel::Medium));

        let stats = history.stats();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.blocked, 2);
        assert_eq!(stats.approved, 2);
        assert_eq!(stats.high_risk, 2);
        assert_eq!(stats.by_action.get("transfer"), Some(&2));
        assert_eq!(stats.block_rate, 0.5);
        assert_eq!(stats.average_duration_ms, 2.0);

        history.clear();
        assert_eq!(history.stats().total, 0);
    }
}
