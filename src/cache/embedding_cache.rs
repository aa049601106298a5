use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

/// Thread-safe LRU cache of text embeddings
///
/// answer_relevancy embeds the same question once per generated question set;
/// repeated evaluations of one question hit this cache instead of the API.
pub struct EmbeddingCache {
    cache: Mutex<LruCache<String, Vec<f32>>>,
}

impl EmbeddingCache {
    /// Create a cache holding at most `capacity` embeddings (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(cap)),
        }
    }

    // A poisoned lock only means another thread panicked mid-insert; the map is still usable.
    fn lock(&self) -> MutexGuard<'_, LruCache<String, Vec<f32>>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cached embedding for `text`, refreshing its recency
    pub fn get(&self, text: &str) -> Option<Vec<f32>> {
        self.lock().get(text).cloned()
    }

    pub fn put(&self, text: String, embedding: Vec<f32>) {
        self.lock().put(text, embedding);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get() {
        let cache = EmbeddingCache::new(10);
        cache.put("what is nvidia?".to_string(), vec![1.0, 2.0, 3.0]);

        assert_eq!(cache.get("what is nvidia?"), Some(vec![1.0, 2.0, 3.0]));
        assert!(cache.get("something else").is_none());
    }

    #[test]
    fn test_eviction_respects_recency() {
        let cache = EmbeddingCache::new(2);
        cache.put("q1".to_string(), vec![1.0]);
        cache.put("q2".to_string(), vec![2.0]);

        // Touch q1 so q2 becomes least recently used
        let _ = cache.get("q1");
        cache.put("q3".to_string(), vec![3.0]);

        assert!(cache.get("q1").is_some());
        assert!(cache.get("q2").is_none());
        assert!(cache.get("q3").is_some());
    }

    #[test]
    fn test_zero_capacity_becomes_one() {
        let cache = EmbeddingCache::new(0);
        cache.put("a".to_string(), vec![1.0]);
        cache.put("b".to_string(), vec![2.0]);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("b").is_some());
    }

    #[test]
    fn test_clear() {
        let cache = EmbeddingCache::new(4);
        cache.put("a".to_string(), vec![1.0]);
        assert!(!cache.is_empty());

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get("a").is_none());
    }
}
