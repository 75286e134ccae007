//! Idempotency cache: request signature → reply body, with a TTL and a
//! capacity bound. When full, a new signature replaces the oldest entry.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone)]
struct CachedReply {
    body: Value,
    stored_at: Instant,
}

#[derive(Debug)]
pub struct ReplayCache {
    entries: DashMap<String, CachedReply>,
    ttl: Duration,
    capacity: usize,
}

impl ReplayCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            capacity,
        }
    }

    /// Fresh reply for `signature`; an expired entry is dropped on the way.
    pub fn get(&self, signature: &str) -> Option<Value> {
        let expired = match self.entries.get(signature) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                debug!(signature, "replay cache hit");
                return Some(entry.body.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(signature);
        }
        None
    }

    pub fn insert(&self, signature: impl Into<String>, body: Value) {
        if self.capacity == 0 {
            return;
        }
        let signature = signature.into();
        if !self.entries.contains_key(&signature) && self.entries.len() >= self.capacity {
            self.evict_oldest();
        }
        self.entries.insert(
            signature,
            CachedReply {
                body,
                stored_at: Instant::now(),
            },
        );
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.stored_at)
            .map(|entry| entry.key().clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hit_within_ttl() {
        let cache = ReplayCache::new(Duration::from_secs(60), 4);
        cache.insert("a", json!([1]));
        assert_eq!(cache.get("a"), Some(json!([1])));
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn test_expired_entry_is_dropped() {
        let cache = ReplayCache::new(Duration::ZERO, 4);
        cache.insert("a", json!([1]));
        assert_eq!(cache.get("a"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_replaces_oldest() {
        let cache = ReplayCache::new(Duration::from_secs(60), 2);
        cache.insert("a", json!(1));
        std::thread::sleep(Duration::from_millis(2));
        cache.insert("b", json!(2));
        std::thread::sleep(Duration::from_millis(2));
        cache.insert("c", json!(3));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("c"), Some(json!(3)));
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let cache = ReplayCache::new(Duration::from_secs(60), 1);
        cache.insert("a", json!(1));
        cache.insert("a", json!(2));
        assert_eq!(cache.get("a"), Some(json!(2)));
    }
}
