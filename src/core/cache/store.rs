//! Response cache store
//!
//! Key-addressed store with per-app TTLs, capacity-bounded eviction, and
//! app/pattern invalidation. Expired entries are purged lazily on read,
//! not proactively swept. Concurrent writes to the same key are
//! last-writer-wins; cached values for the same key are equivalent by
//! construction of the key.

use std::collections::HashMap;
use std::time::Duration;

use lru::LruCache;
use parking_lot::Mutex;
use regex::Regex;
use tracing::debug;

use super::key::chat_key;
use super::types::{
    CacheAnalysis, CacheConfig, CacheEntry, CacheStats, EntryMetadata, EvictionPolicy,
    default_ttl_for,
};
use crate::core::types::{ApplicationContext, ChatMessage, RequestConfig};

struct Inner {
    /// Backing store; the LRU ordering drives the `Lru` policy, the other
    /// policies scan for their victim
    map: LruCache<String, CacheEntry>,
    hits: u64,
    misses: u64,
    evictions: u64,
    cost_saved: f64,
}

/// In-memory response cache shared by all in-flight requests
pub struct ResponseCache {
    inner: Mutex<Inner>,
    config: CacheConfig,
}

impl ResponseCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                map: LruCache::unbounded(),
                hits: 0,
                misses: 0,
                evictions: 0,
                cost_saved: 0.0,
            }),
            config,
        }
    }

    /// Look up a cached value by key, purging it if expired
    pub fn get(&self, key: &str) -> Option<String> {
        enum Lookup {
            Hit(String, f64),
            Expired,
            Miss,
        }

        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let lookup = match inner.map.get_mut(key) {
            Some(entry) if entry.is_expired() => Lookup::Expired,
            Some(entry) => {
                entry.mark_accessed();
                Lookup::Hit(entry.value.clone(), entry.metadata.cost.unwrap_or(0.0))
            }
            None => Lookup::Miss,
        };
        match lookup {
            Lookup::Hit(value, saved) => {
                inner.hits += 1;
                inner.cost_saved += saved;
                debug!(key, "cache hit");
                Some(value)
            }
            Lookup::Expired => {
                inner.map.pop(key);
                inner.evictions += 1;
                inner.misses += 1;
                None
            }
            Lookup::Miss => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Insert a value under an explicit key. Evicts one entry per the
    /// configured policy when at capacity.
    pub fn set(&self, key: String, value: String, ttl: Option<Duration>, metadata: EntryMetadata) {
        let ttl = ttl.unwrap_or(self.config.default_ttl);
        let mut inner = self.inner.lock();
        if inner.map.len() >= self.config.max_entries && !inner.map.contains(&key) {
            self.evict_one(&mut inner);
        }
        inner.map.put(key, CacheEntry::new(value, ttl, metadata));
    }

    /// Cache a chat response, deriving key and TTL. Returns the key.
    #[allow(clippy::too_many_arguments)]
    pub fn cache_response(
        &self,
        messages: &[ChatMessage],
        model: &str,
        response: &str,
        app: ApplicationContext,
        cost: Option<f64>,
        response_time_ms: Option<u64>,
        config: Option<&RequestConfig>,
    ) -> String {
        let key = chat_key(messages, model, config);
        let ttl = config
            .and_then(|c| c.cache_ttl)
            .unwrap_or_else(|| default_ttl_for(app));
        let metadata = EntryMetadata {
            model: model.to_string(),
            app,
            cost,
            response_time_ms,
        };
        self.set(key.clone(), response.to_string(), Some(ttl), metadata);
        key
    }

    /// Look up a chat response by derived key
    pub fn get_cached_response(
        &self,
        messages: &[ChatMessage],
        model: &str,
        config: Option<&RequestConfig>,
    ) -> Option<String> {
        self.get(&chat_key(messages, model, config))
    }

    /// Drop every entry recorded for an application. Returns the count.
    pub fn invalidate_by_app(&self, app: ApplicationContext) -> usize {
        let mut inner = self.inner.lock();
        let keys: Vec<String> = inner
            .map
            .iter()
            .filter(|(_, e)| e.metadata.app == app)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &keys {
            inner.map.pop(key);
        }
        inner.evictions += keys.len() as u64;
        keys.len()
    }

    /// Drop every entry whose key matches the pattern. Returns the count.
    pub fn invalidate_by_pattern(&self, pattern: &Regex) -> usize {
        let mut inner = self.inner.lock();
        let keys: Vec<String> = inner
            .map
            .iter()
            .filter(|(k, _)| pattern.is_match(k))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &keys {
            inner.map.pop(key);
        }
        inner.evictions += keys.len() as u64;
        keys.len()
    }

    /// Drop all entries
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        let len = inner.map.len() as u64;
        inner.map.clear();
        inner.evictions += len;
    }

    /// Statistics snapshot
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            entries: inner.map.len(),
            cost_saved: inner.cost_saved,
        }
    }

    /// Hit distribution across models and apps
    pub fn analyze(&self) -> CacheAnalysis {
        let inner = self.inner.lock();
        let mut by_model: HashMap<String, u64> = HashMap::new();
        let mut by_app: HashMap<ApplicationContext, u64> = HashMap::new();
        for (_, entry) in inner.map.iter() {
            *by_model.entry(entry.metadata.model.clone()).or_default() += entry.hits;
            *by_app.entry(entry.metadata.app).or_default() += entry.hits;
        }
        let mut top_models: Vec<_> = by_model.into_iter().collect();
        top_models.sort_by(|a, b| b.1.cmp(&a.1));
        let mut top_apps: Vec<_> = by_app.into_iter().collect();
        top_apps.sort_by(|a, b| b.1.cmp(&a.1));
        CacheAnalysis {
            top_models,
            top_apps,
        }
    }

    fn evict_one(&self, inner: &mut Inner) {
        let victim = match self.config.eviction_policy {
            // The backing store's own ordering: least recently used tail.
            EvictionPolicy::Lru => inner.map.pop_lru().map(|(k, _)| k),
            EvictionPolicy::Lfu => {
                let key = inner
                    .map
                    .iter()
                    .min_by_key(|(_, e)| e.hits)
                    .map(|(k, _)| k.clone());
                key.inspect(|k| {
                    inner.map.pop(k);
                })
            }
            EvictionPolicy::Ttl => {
                let key = inner
                    .map
                    .iter()
                    .min_by_key(|(_, e)| e.expires_at)
                    .map(|(k, _)| k.clone());
                key.inspect(|k| {
                    inner.map.pop(k);
                })
            }
        };
        if let Some(key) = victim {
            debug!(key, policy = ?self.config.eviction_policy, "evicted cache entry");
            inner.evictions += 1;
        }
    }

    /// Shift an entry's clock backwards, as if it were inserted `by` ago.
    #[cfg(test)]
    pub(crate) fn backdate(&self, key: &str, by: Duration) {
        let mut inner = self.inner.lock();
        if let Some(entry) = inner.map.peek_mut(key) {
            // Only the expiry drives the lifecycle; checked_sub avoids
            // Instant underflow on recently booted hosts.
            if let Some(expires_at) = entry.expires_at.checked_sub(by) {
                entry.expires_at = expires_at;
            }
            if let Some(created_at) = entry.created_at.checked_sub(by) {
                entry.created_at = created_at;
            }
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::user_message;

    fn metadata(app: ApplicationContext) -> EntryMetadata {
        EntryMetadata {
            model: "qwq-32b".into(),
            app,
            cost: Some(0.02),
            response_time_ms: Some(300),
        }
    }

    fn cache_with(policy: EvictionPolicy, max_entries: usize) -> ResponseCache {
        ResponseCache::new(CacheConfig {
            max_entries,
            default_ttl: Duration::from_secs(3600),
            eviction_policy: policy,
        })
    }

    #[test]
    fn test_hit_and_cost_saved() {
        let cache = cache_with(EvictionPolicy::Lru, 10);
        cache.set("k1".into(), "v1".into(), None, metadata(ApplicationContext::Staff));
        assert_eq!(cache.get("k1"), Some("v1".into()));
        assert_eq!(cache.get("k1"), Some("v1".into()));
        assert_eq!(cache.get("nope"), None);

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.cost_saved - 0.04).abs() < 1e-12);
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_ttl_expiry_is_lazy() {
        // eos-l10 context: one hour TTL. Hit at 59 minutes, miss at 61.
        let cache = cache_with(EvictionPolicy::Lru, 10);
        let messages = vec![user_message("quarterly rocks summary")];
        let key = cache.cache_response(
            &messages,
            "qwq-32b",
            "summary text",
            ApplicationContext::EosL10,
            Some(0.03),
            Some(800),
            None,
        );

        cache.backdate(&key, Duration::from_secs(59 * 60));
        assert_eq!(
            cache.get_cached_response(&messages, "qwq-32b", None),
            Some("summary text".into())
        );

        cache.backdate(&key, Duration::from_secs(2 * 60));
        assert_eq!(cache.get_cached_response(&messages, "qwq-32b", None), None);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_lru_eviction() {
        let cache = cache_with(EvictionPolicy::Lru, 2);
        cache.set("a".into(), "1".into(), None, metadata(ApplicationContext::Staff));
        cache.set("b".into(), "2".into(), None, metadata(ApplicationContext::Staff));
        // Touch "a" so "b" is least recently used.
        cache.get("a");
        cache.set("c".into(), "3".into(), None, metadata(ApplicationContext::Staff));
        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_lfu_eviction() {
        let cache = cache_with(EvictionPolicy::Lfu, 2);
        cache.set("a".into(), "1".into(), None, metadata(ApplicationContext::Staff));
        cache.set("b".into(), "2".into(), None, metadata(ApplicationContext::Staff));
        cache.get("a");
        cache.get("a");
        cache.get("b");
        // "b" has fewer hits and is the LFU victim.
        cache.set("c".into(), "3".into(), None, metadata(ApplicationContext::Staff));
        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
    }

    #[test]
    fn test_ttl_eviction_picks_soonest_expiry() {
        let cache = cache_with(EvictionPolicy::Ttl, 2);
        cache.set(
            "short".into(),
            "1".into(),
            Some(Duration::from_secs(10)),
            metadata(ApplicationContext::Staff),
        );
        cache.set(
            "long".into(),
            "2".into(),
            Some(Duration::from_secs(1000)),
            metadata(ApplicationContext::Staff),
        );
        cache.set("c".into(), "3".into(), None, metadata(ApplicationContext::Staff));
        assert!(cache.get("short").is_none());
        assert!(cache.get("long").is_some());
    }

    #[test]
    fn test_invalidate_by_app() {
        let cache = cache_with(EvictionPolicy::Lru, 10);
        cache.set("a".into(), "1".into(), None, metadata(ApplicationContext::Staff));
        cache.set("b".into(), "2".into(), None, metadata(ApplicationContext::Handouts));
        cache.set("c".into(), "3".into(), None, metadata(ApplicationContext::Handouts));
        assert_eq!(cache.invalidate_by_app(ApplicationContext::Handouts), 2);
        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
    }

    #[test]
    fn test_invalidate_by_pattern() {
        let cache = cache_with(EvictionPolicy::Lru, 10);
        cache.set("abc1".into(), "1".into(), None, metadata(ApplicationContext::Staff));
        cache.set("abc2".into(), "2".into(), None, metadata(ApplicationContext::Staff));
        cache.set("xyz".into(), "3".into(), None, metadata(ApplicationContext::Staff));
        let pattern = Regex::new("^abc").unwrap();
        assert_eq!(cache.invalidate_by_pattern(&pattern), 2);
        assert_eq!(cache.stats().entries, 1);
    }

    #[test]
    fn test_analyze_ranks_by_hits() {
        let cache = cache_with(EvictionPolicy::Lru, 10);
        cache.set("a".into(), "1".into(), None, metadata(ApplicationContext::Staff));
        let mut other = metadata(ApplicationContext::Handouts);
        other.model = "llama-3.2-3b-instruct".into();
        cache.set("b".into(), "2".into(), None, other);
        cache.get("b");
        cache.get("b");
        cache.get("a");
        let analysis = cache.analyze();
        assert_eq!(analysis.top_models[0].0, "llama-3.2-3b-instruct");
        assert_eq!(analysis.top_apps[0].0, ApplicationContext::Handouts);
    }
}
