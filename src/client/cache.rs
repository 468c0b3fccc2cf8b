/// Query cache for list/detail reads
///
/// Lock-free map of query key -> last JSON response, swapped atomically on every write the
/// same way a hot-reload registry swaps its whole map. Mutations invalidate the keys they
/// make stale; there is no TTL or size-based eviction.
///
/// Every invalidation bumps a generation counter. A read takes the generation before it
/// goes to the network and stores its response with [`QueryCache::put_if_fresh`], which
/// refuses the write if an invalidation happened in between.

use arc_swap::ArcSwap;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::{collections::HashMap, sync::Arc};

#[derive(Debug, Clone, Default)]
struct CacheState {
    generation: u64,
    entries: HashMap<String, Value>,
}

#[derive(Debug)]
pub struct QueryCache {
    state: ArcSwap<CacheState>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self { state: ArcSwap::new(Arc::new(CacheState::default())) }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.state.load().entries.get(key).cloned()?;
        serde_json::from_value(value).ok()
    }

    /// Current invalidation generation; pass it to `put_if_fresh` after the fetch
    pub fn generation(&self) -> u64 {
        self.state.load().generation
    }

    /// Store `value` only if nothing was invalidated since `generation` was read.
    /// Returns whether the entry was written.
    pub fn put_if_fresh<T: Serialize>(&self, key: &str, value: &T, generation: u64) -> bool {
        let Ok(value) = serde_json::to_value(value) else {
            return false;
        };
        let mut written = false;
        self.state.rcu(|current| {
            written = current.generation == generation;
            if !written {
                return Arc::clone(current);
            }
            let mut next = CacheState::clone(current);
            next.entries.insert(key.to_string(), value.clone());
            Arc::new(next)
        });
        if !written {
            tracing::debug!("Skipped caching stale response for {}", key);
        }
        written
    }

    pub fn invalidate(&self, keys: &[&str]) {
        self.state.rcu(|current| {
            let mut next = CacheState::clone(current);
            next.generation = next.generation.wrapping_add(1);
            for key in keys {
                next.entries.remove(*key);
            }
            next
        });
        tracing::debug!("🧹 Invalidated cached queries: {:?}", keys);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.state.load().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.state.load().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.load().entries.is_empty()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_invalidate() {
        let cache = QueryCache::new();
        let generation = cache.generation();
        assert!(cache.put_if_fresh("ai-workflows:dep", &vec!["a", "b"], generation));
        assert!(cache.put_if_fresh("ai-workflows:dep:a", &"detail", generation));

        let list: Vec<String> = cache.get("ai-workflows:dep").unwrap();
        assert_eq!(list, vec!["a", "b"]);
        assert_eq!(cache.len(), 2);

        cache.invalidate(&["ai-workflows:dep", "missing"]);
        assert!(!cache.contains("ai-workflows:dep"));
        assert!(cache.contains("ai-workflows:dep:a"));
    }

    #[test]
    fn test_get_with_wrong_shape_misses() {
        let cache = QueryCache::new();
        cache.put_if_fresh("k", &"text", cache.generation());
        assert_eq!(cache.get::<Vec<u32>>("k"), None);
    }

    #[test]
    fn test_read_started_before_invalidation_is_not_cached() {
        let cache = QueryCache::new();
        let before = cache.generation();

        // a write lands while the read is in flight
        cache.invalidate(&["ai-workflows:dep"]);
        assert!(!cache.put_if_fresh("ai-workflows:dep", &vec!["stale"], before));
        assert!(!cache.contains("ai-workflows:dep"));

        let after = cache.generation();
        assert!(cache.put_if_fresh("ai-workflows:dep", &vec!["fresh"], after));
        let list: Vec<String> = cache.get("ai-workflows:dep").unwrap();
        assert_eq!(list, vec!["fresh"]);
    }
}
