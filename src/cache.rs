//! Query embedding cache
//!
//! Repeated requests with the same ingredient list produce the same query
//! text, so the query vector can be reused instead of calling the embedding
//! provider again. Entries expire after a fixed TTL and the number of stored
//! queries is capped; a zero TTL disables caching. Cached vectors are the
//! exact vectors the provider returned, so ranking results do not change.
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use pantry_match::cache::CachedEmbedder;
//! use pantry_match::embedding::{EmbeddingProvider, HashingEmbedder};
//!
//! let inner = Arc::new(HashingEmbedder::new(32).unwrap());
//! let cached = CachedEmbedder::new(inner, Duration::from_secs(300));
//! let first = cached.encode("rice, onion").unwrap();
//! let second = cached.encode("rice, onion").unwrap();
//! assert_eq!(first, second);
//! assert_eq!(cached.cache().stats().hits, 1);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::embedding::EmbeddingProvider;
use crate::errors::AppResult;

/// Default cap on stored query vectors
pub const DEFAULT_MAX_ENTRIES: usize = 1024;

/// Cached vector with expiration time
#[derive(Debug, Clone)]
struct CacheEntry {
    vector: Vec<f32>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    /// Total number of entries, expired ones included until cleanup
    pub entries: usize,
    /// Number of hits
    pub hits: u64,
    /// Number of misses
    pub misses: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

/// Thread-safe TTL cache from query text to embedding vector
#[derive(Debug)]
pub struct QueryEmbeddingCache {
    data: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl QueryEmbeddingCache {
    /// Create a cache whose entries live for `ttl`, holding at most [`DEFAULT_MAX_ENTRIES`]
    pub fn new(ttl: Duration) -> Self {
        Self::with_max_entries(ttl, DEFAULT_MAX_ENTRIES)
    }

    /// Create a cache holding at most `max_entries` vectors
    ///
    /// A zero `ttl` or zero `max_entries` yields a disabled cache.
    pub fn with_max_entries(ttl: Duration, max_entries: usize) -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            ttl,
            max_entries,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Whether entries are stored at all
    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero() && self.max_entries > 0
    }

    /// Cached vector for `query`, if present and not expired
    pub fn get(&self, query: &str) -> Option<Vec<f32>> {
        let found = self
            .data
            .read()
            .get(query)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.vector.clone());

        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        crate::observability::record_query_cache_metrics(found.is_some());
        found
    }

    /// Store a vector for `query`
    ///
    /// Expired entries are dropped first. When the cache is still full, the
    /// entry closest to expiry makes room. Does nothing on a disabled cache.
    pub fn insert(&self, query: String, vector: Vec<f32>) {
        if !self.is_enabled() {
            return;
        }

        let mut data = self.data.write();
        data.retain(|_, entry| !entry.is_expired());

        if data.len() >= self.max_entries && !data.contains_key(&query) {
            self.evict_to_make_room(&mut data);
        }

        let entry = CacheEntry {
            vector,
            expires_at: Instant::now() + self.ttl,
        };
        data.insert(query, entry);
    }

    /// Remove entries closest to expiry until one slot is free
    fn evict_to_make_room(&self, data: &mut HashMap<String, CacheEntry>) {
        while data.len() >= self.max_entries {
            let oldest = data
                .iter()
                .min_by_key(|(_, entry)| entry.expires_at)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    data.remove(&key);
                    tracing::trace!(query = %key, "Evicted query embedding to make room");
                }
                None => break,
            }
        }
    }

    /// Drop expired entries
    pub fn cleanup(&self) {
        let mut data = self.data.write();
        let before = data.len();
        data.retain(|_, entry| !entry.is_expired());
        let removed = before - data.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = data.len(), "Expired query embeddings removed");
        }
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Current statistics
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            entries: self.len(),
            hits,
            misses,
            hit_rate: if total > 0 {
                hits as f64 / total as f64
            } else {
                0.0
            },
        }
    }
}

/// Embedding provider wrapper that caches single-text encodes
///
/// Batch encodes pass straight through; only [`EmbeddingProvider::encode`]
/// consults the cache, and only while the cache is enabled.
pub struct CachedEmbedder {
    inner: Arc<dyn EmbeddingProvider>,
    cache: QueryEmbeddingCache,
}

impl CachedEmbedder {
    /// Wrap `inner` with a cache of the given TTL
    pub fn new(inner: Arc<dyn EmbeddingProvider>, ttl: Duration) -> Self {
        Self {
            inner,
            cache: QueryEmbeddingCache::new(ttl),
        }
    }

    /// The underlying cache
    pub fn cache(&self) -> &QueryEmbeddingCache {
        &self.cache
    }
}

impl EmbeddingProvider for CachedEmbedder {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn encode_batch(&self, texts: &[&str]) -> AppResult<Vec<Vec<f32>>> {
        self.inner.encode_batch(texts)
    }

    fn encode(&self, text: &str) -> AppResult<Vec<f32>> {
        if !self.cache.is_enabled() {
            return self.inner.encode(text);
        }
        if let Some(vector) = self.cache.get(text) {
            return Ok(vector);
        }
        let vector = self.inner.encode(text)?;
        self.cache.insert(text.to_string(), vector.clone());
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_and_miss_counting() {
        let cache = QueryEmbeddingCache::new(Duration::from_secs(60));
        assert!(cache.get("rice").is_none());
        cache.insert("rice".to_string(), vec![1.0, 0.0]);
        assert_eq!(cache.get("rice"), Some(vec![1.0, 0.0]));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_expired_entries_miss_and_cleanup() {
        let cache = QueryEmbeddingCache::new(Duration::from_millis(5));
        cache.insert("rice".to_string(), vec![1.0]);
        std::thread::sleep(Duration::from_millis(15));
        assert!(cache.get("rice").is_none());
        cache.cleanup();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_ttl_disables_the_cache() {
        let cache = QueryEmbeddingCache::new(Duration::ZERO);
        assert!(!cache.is_enabled());
        cache.insert("rice".to_string(), vec![1.0]);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_drops_expired_entries() {
        let cache = QueryEmbeddingCache::new(Duration::from_millis(5));
        cache.insert("rice".to_string(), vec![1.0]);
        cache.insert("dal".to_string(), vec![1.0]);
        std::thread::sleep(Duration::from_millis(15));
        cache.insert("onion".to_string(), vec![1.0]);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_entry_count_is_capped() {
        let cache = QueryEmbeddingCache::with_max_entries(Duration::from_secs(60), 3);
        for i in 0..10 {
            cache.insert(format!("query {}", i), vec![i as f32]);
            assert!(cache.len() <= 3);
        }
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get("query 9"), Some(vec![9.0]));

        // re-inserting a stored key does not evict anything
        cache.insert("query 9".to_string(), vec![0.5]);
        assert_eq!(cache.len(), 3);
    }
}
