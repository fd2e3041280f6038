//! Short-lived cache of semantic judgments
//!
//! Keyed by the SHA-256 of the content. Entries expire after a TTL and the
//! cache holds at most `capacity` entries, evicting the oldest insertion.
//! Lookups use `peek`, so reads never refresh an entry's position.
//! All entries belong to one backend fingerprint; a new fingerprint empties
//! the cache.

use lru::LruCache;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::types::SemanticJudgment;

#[derive(Debug, Clone)]
struct CacheEntry {
    judgment: SemanticJudgment,
    inserted_at: Instant,
}

#[derive(Debug)]
pub struct SemanticCache {
    /// `None` when caching is disabled
    entries: Option<LruCache<String, CacheEntry>>,
    ttl: Duration,
    fingerprint: Option<String>,
}

impl SemanticCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(LruCache::new),
            ttl,
            fingerprint: None,
        }
    }

    pub fn key(content: &str) -> String {
        hex::encode(Sha256::digest(content.as_bytes()))
    }

    pub fn get(&mut self, content: &str) -> Option<SemanticJudgment> {
        let entries = self.entries.as_mut()?;
        let key = Self::key(content);

        let expired = match entries.peek(&key) {
            None => return None,
            Some(entry) => entry.inserted_at.elapsed() >= self.ttl,
        };

        if expired {
            debug!("Semantic cache entry expired");
            entries.pop(&key);
            return None;
        }

        entries.peek(&key).map(|entry| entry.judgment.clone())
    }

    pub fn insert(&mut self, content: &str, judgment: SemanticJudgment) {
        if let Some(entries) = self.entries.as_mut() {
            entries.put(
                Self::key(content),
                CacheEntry {
                    judgment,
                    inserted_at: Instant::now(),
                },
            );
        }
    }

    /// Adopt `fingerprint`, clearing entries if it differs from the current
    /// one. Returns `true` when entries were dropped.
    pub fn sync_fingerprint(&mut self, fingerprint: &str) -> bool {
        if self.fingerprint.as_deref() == Some(fingerprint) {
            return false;
        }
        let had_entries = !self.is_empty();
        self.clear();
        if had_entries {
            info!("Semantic cache invalidated: backend changed");
        }
        self.fingerprint = Some(fingerprint.to_string());
        had_entries
    }

    pub fn clear(&mut self) {
        if let Some(entries) = self.entries.as_mut() {
            entries.clear();
        }
    }

    /// Forget entries and the fingerprint
    pub fn reset(&mut self) {
        self.clear();
        self.fingerprint = None;
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::types::{GateJudgment, GateJudgments};

    fn judgment(reasoning: &str) -> SemanticJudgment {
        let gate = GateJudgment {
            passed: true,
            reasoning: "ok".to_string(),
        };
        SemanticJudgment {
            safe: true,
            gates: GateJudgments {
                truth: gate.clone(),
                harm: gate.clone(),
                scope: gate.clone(),
                purpose: gate,
            },
            confidence: 0.9,
            overall_reasoning: reasoning.to_string(),
        }
    }

    #[test]
    fn test_hit_and_miss() {
        let mut cache = SemanticCache::new(4, Duration::from_secs(60));
        assert!(cache.get("hello").is_none());

        cache.insert("hello", judgment("first"));
        assert_eq!(cache.get("hello").unwrap().overall_reasoning, "first");
        assert!(cache.get("hello ").is_none());
    }

    #[test]
    fn test_evicts_oldest_insertion_despite_reads() {
        let mut cache = SemanticCache::new(2, Duration::from_secs(60));
        cache.insert("a", judgment("a"));
        cache.insert("b", judgment("b"));
        // Reading "a" must not save it from eviction
        assert!(cache.get("a").is_some());
        cache.insert("c", judgment("c"));

        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_ttl_expiry() {
        let mut cache = SemanticCache::new(4, Duration::ZERO);
        cache.insert("a", judgment("a"));
        assert!(cache.get("a").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_capacity_disables_cache() {
        let mut cache = SemanticCache::new(0, Duration::from_secs(60));
        cache.insert("a", judgment("a"));
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn test_fingerprint_change_clears() {
        let mut cache = SemanticCache::new(4, Duration::from_secs(60));
        assert!(!cache.sync_fingerprint("openai:m:1"));
        cache.insert("a", judgment("a"));

        assert!(!cache.sync_fingerprint("openai:m:1"));
        assert_eq!(cache.len(), 1);

        assert!(cache.sync_fingerprint("openai:m2:1"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_key_is_sha256_hex() {
        assert_eq!(
            SemanticCache::key(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
