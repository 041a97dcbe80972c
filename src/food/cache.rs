use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

use super::models::{AnalysisResult, FoodRecord};

pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// Values the scanner remembers between calls.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Analysis(AnalysisResult),
    Food(FoodRecord),
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

/// Time-expiring map. Expired entries are skipped on lookup but never
/// evicted, and there is no size bound.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        if entry.stored_at.elapsed() >= self.ttl {
            log::debug!("Cache entry {} expired", key);
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn put(&self, key: impl Into<String>, value: V) {
        self.entries.write().insert(
            key.into(),
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

pub fn image_key(bytes: &[u8]) -> String {
    format!("image_{}", hex::encode(Sha256::digest(bytes)))
}

pub fn search_key(query: &str) -> String {
    format!("search_{}", query.trim().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.put("apple", 1);
        assert_eq!(cache.get("apple"), Some(1));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get("apple"), Some(1));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("apple"), None);
        // lazily expired, still stored
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn put_overwrites_and_refreshes() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.put("apple", 1);
        tokio::time::advance(Duration::from_secs(50)).await;
        cache.put("apple", 2);
        tokio::time::advance(Duration::from_secs(50)).await;
        assert_eq!(cache.get("apple"), Some(2));
    }

    #[test]
    fn clear_removes_everything() {
        let cache: TtlCache<u32> = TtlCache::default();
        cache.put("a", 1);
        cache.put("b", 2);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn keys_are_deterministic() {
        assert_eq!(image_key(b"abc"), image_key(b"abc"));
        assert_ne!(image_key(b"abc"), image_key(b"abd"));
        assert!(image_key(b"abc").starts_with("image_"));
        assert_eq!(search_key("  Banana "), "search_banana");
    }
}
