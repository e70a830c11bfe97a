//! Process-wide memo of predictor evidence

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::debug;

use crate::types::EvidenceResult;

/// Identity of a cached evidence lookup
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Predictor branch
    pub branch: String,
    /// Head revision of the push
    pub rev: String,
    /// Number of pushes merged into the result
    pub num_pushes: usize,
}

impl CacheKey {
    /// Create a new cache key
    pub fn new(branch: impl Into<String>, rev: impl Into<String>, num_pushes: usize) -> Self {
        Self {
            branch: branch.into(),
            rev: rev.into(),
            num_pushes,
        }
    }
}

/// A memoized lookup outcome
#[derive(Debug, Clone)]
pub enum CachedEvidence {
    /// Evidence was fetched
    Ready(Arc<EvidenceResult>),
    /// The predictor never became ready for this push
    TimedOut { elapsed: Duration },
}

/// Evidence cache shared by every predictor strategy in a run
#[derive(Debug, Default)]
pub struct EvidenceCache {
    entries: Mutex<HashMap<CacheKey, CachedEvidence>>,
}

impl EvidenceCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entry
    pub fn get(&self, key: &CacheKey) -> Option<CachedEvidence> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let hit = entries.get(key).cloned();
        debug!(
            branch = %key.branch,
            rev = %key.rev,
            num_pushes = key.num_pushes,
            hit = hit.is_some(),
            "evidence cache lookup"
        );
        hit
    }

    /// Store an entry, replacing any previous one
    pub fn insert(&self, key: CacheKey, value: CachedEvidence) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, value);
    }

    /// Drop every entry
    pub fn clear(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        debug!(entries = entries.len(), "clearing evidence cache");
        entries.clear();
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_clear() {
        let cache = EvidenceCache::new();
        let key = CacheKey::new("integration/autoland", "abcdef", 1);
        assert!(cache.get(&key).is_none());

        cache.insert(key.clone(), CachedEvidence::Ready(Arc::new(EvidenceResult::default())));
        assert!(matches!(cache.get(&key), Some(CachedEvidence::Ready(_))));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_window_size_is_part_of_key() {
        let cache = EvidenceCache::new();
        cache.insert(
            CacheKey::new("b", "r", 1),
            CachedEvidence::TimedOut {
                elapsed: Duration::from_secs(1),
            },
        );
        assert!(cache.get(&CacheKey::new("b", "r", 10)).is_none());
    }

    #[test]
    fn test_shared_across_threads() {
        let cache = Arc::new(EvidenceCache::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    cache.insert(
                        CacheKey::new("b", format!("rev{}", i), 1),
                        CachedEvidence::Ready(Arc::new(EvidenceResult::default())),
                    );
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 4);
    }
}
