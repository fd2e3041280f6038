//! Built-in detection catalog
//!
//! Grouped by the gate each rule speaks for. All rules are word-boundary
//! anchored; security-critical terms (keys, seed phrases) are flagged even in
//! benign contexts because a miss there costs more than a false alarm.

use super::PatternSpec;
use crate::gates::Gate;
use crate::risk::RiskLevel;

pub fn builtin_patterns() -> Vec<PatternSpec> {
    let mut patterns = Vec::new();
    patterns.extend(harm_patterns());
    patterns.extend(truth_patterns());
    patterns.extend(scope_patterns());
    patterns.extend(purpose_patterns());
    patterns.extend(generic_patterns());
    patterns
}

fn harm_patterns() -> Vec<PatternSpec> {
    let gate = Some(Gate::Harm);
    vec![
        PatternSpec::regex(
            "harm-drain",
            r"\bdrain(s|ed|ing)?\b",
            gate,
            RiskLevel::High,
            "Potential wallet drain detected",
        ),
        PatternSpec::regex(
            "harm-rug-pull",
            r"\brug[\s_-]?pull(s|ed|ing)?\b",
            gate,
            RiskLevel::Critical,
            "Rug pull language detected",
        ),
        PatternSpec::regex(
            "harm-private-key",
            r"\bprivate[\s_-]?keys?\b",
            gate,
            RiskLevel::Critical,
            "Private key reference detected",
        ),
        PatternSpec::regex(
            "harm-seed-phrase",
            r"\b(seed|recovery|mnemonic)[\s_-]?(phrase|words?)\b",
            gate,
            RiskLevel::Critical,
            "Seed phrase reference detected",
        ),
        PatternSpec::regex(
            "harm-move-everything",
            r"\b(send|transfer|withdraw|move)\s+(all|everything|entire)\b",
            gate,
            RiskLevel::High,
            "Request to move all funds at once",
        ),
        PatternSpec::regex(
            "harm-malicious-code",
            r"\b(malware|ransomware|keylogger|backdoor)s?\b",
            gate,
            RiskLevel::Critical,
            "Malicious software reference detected",
        ),
    ]
}

fn truth_patterns() -> Vec<PatternSpec> {
    let gate = Some(Gate::Truth);
    vec![
        PatternSpec::regex(
            "truth-impersonation",
            r"\b(i\s+am|this\s+is)\s+(the\s+|an?\s+)?(admin|administrator|support\s+team|official\s+support)\b",
            gate,
            RiskLevel::Medium,
            "Possible impersonation of a trusted party",
        ),
        PatternSpec::regex(
            "truth-guaranteed-returns",
            r"\bguaranteed\s+(returns?|profits?|gains?|yield)\b",
            gate,
            RiskLevel::High,
            "Unrealistic guaranteed-returns claim",
        ),
        PatternSpec::regex(
            "truth-false-urgency",
            r"\b(act\s+now|before\s+it'?s\s+too\s+late|last\s+chance)\b",
            gate,
            RiskLevel::Low,
            "Urgency pressure language detected",
        ),
    ]
}

fn scope_patterns() -> Vec<PatternSpec> {
    let gate = Some(Gate::Scope);
    vec![
        PatternSpec::regex(
            "scope-instruction-override",
            r"\b(ignore|disregard|forget)\s+(all\s+)?(the\s+)?(previous|prior|above|your)\s+(instructions|rules|prompts?)\b",
            gate,
            RiskLevel::Critical,
            "Prompt injection: attempt to override instructions",
        ),
        PatternSpec::regex(
            "scope-system-prompt",
            r"\b(reveal|show|print|repeat)\s+(me\s+)?(your|the)\s+system\s+prompt\b",
            gate,
            RiskLevel::High,
            "Attempt to extract the system prompt",
        ),
        PatternSpec::regex(
            "scope-jailbreak",
            r"\b(jailbreak|dan\s+mode|developer\s+mode)\b",
            gate,
            RiskLevel::High,
            "Jailbreak attempt detected",
        ),
        PatternSpec::regex(
            "scope-role-override",
            r"\byou\s+are\s+now\b",
            gate,
            RiskLevel::Medium,
            "Attempt to reassign the agent's role",
        ),
    ]
}

fn purpose_patterns() -> Vec<PatternSpec> {
    vec![PatternSpec::regex(
        "purpose-no-reason",
        r"\b(just\s+because|no\s+reason|for\s+the\s+lulz|why\s+not)\b",
        Some(Gate::Purpose),
        RiskLevel::Medium,
        "Action states no legitimate purpose",
    )]
}

fn generic_patterns() -> Vec<PatternSpec> {
    vec![PatternSpec::regex(
        "unlimited-approval",
        r"\b(unlimited|infinite)\s+(token\s+)?(approvals?|allowances?)\b",
        None,
        RiskLevel::High,
        "Unlimited token approval requested",
    )]
}
