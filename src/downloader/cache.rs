use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Default number of stores after which the whole cache is dropped.
pub const MAX_CACHE_SIZE: u64 = 10_000;

/// Resolved artwork for one item identifier
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CacheEntry {
    pub url: String,
    /// Album resolved for a track lookup, empty otherwise.
    pub album: String,
}

/// Process-wide image URL cache shared by every request.
///
/// Eviction is all-or-nothing: once more than `capacity` stores have been
/// counted, the next store starts from an empty map.
pub struct ImageUrlCache {
    cache: Arc<RwLock<HashMap<String, CacheEntry>>>,
    stores: AtomicU64,
    capacity: u64,
}

impl ImageUrlCache {
    pub fn new(capacity: u64) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            stores: AtomicU64::new(0),
            capacity,
        }
    }

    pub async fn get(&self, key: &str) -> Option<CacheEntry> {
        let cache = self.cache.read().await;
        cache.get(key).cloned()
    }

    pub async fn set(&self, key: String, entry: CacheEntry) {
        let mut cache = self.cache.write().await;
        if self.stores.load(Ordering::Acquire) > self.capacity {
            log::info!(
                "🧹 [CACHE] {} stores exceeded capacity {}, dropping {} cached image URLs",
                self.count(),
                self.capacity,
                cache.len()
            );
            *cache = HashMap::new();
            self.stores.store(0, Ordering::Release);
        }
        cache.insert(key, entry);
        self.stores.fetch_add(1, Ordering::AcqRel);
    }

    /// Stores counted since the last eviction (overwrites included).
    pub fn count(&self) -> u64 {
        self.stores.load(Ordering::Acquire)
    }

}

impl Default for ImageUrlCache {
    fn default() -> Self {
        Self::new(MAX_CACHE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(url: &str) -> CacheEntry {
        CacheEntry {
            url: url.to_string(),
            album: String::new(),
        }
    }

    #[tokio::test]
    async fn stores_and_reads_entries() {
        let cache = ImageUrlCache::default();
        assert!(cache.get("missing").await.is_none());

        cache
            .set(
                "mbid-1extralarge".to_string(),
                CacheEntry {
                    url: "https://img/1.jpg".to_string(),
                    album: "Album".to_string(),
                },
            )
            .await;
        let hit = cache.get("mbid-1extralarge").await.unwrap();
        assert_eq!(hit.url, "https://img/1.jpg");
        assert_eq!(hit.album, "Album");
    }

    #[tokio::test]
    async fn overwrites_still_count_towards_capacity() {
        let cache = ImageUrlCache::new(2);
        cache.set("a".to_string(), entry("1")).await;
        cache.set("a".to_string(), entry("2")).await;
        assert_eq!(cache.count(), 2);
        assert_eq!(cache.get("a").await.unwrap().url, "2");
    }

    #[tokio::test]
    async fn evicts_everything_after_capacity_is_exceeded() {
        let cache = ImageUrlCache::default();
        for i in 0..=MAX_CACHE_SIZE {
            cache.set(format!("key-{}", i), entry("u")).await;
        }
        // 10_001 stores: nothing evicted yet
        assert_eq!(cache.count(), MAX_CACHE_SIZE + 1);
        assert!(cache.get("key-0").await.is_some());
        assert!(cache.get(&format!("key-{}", MAX_CACHE_SIZE)).await.is_some());

        cache.set("fresh".to_string(), entry("new")).await;
        assert!(cache.get("key-0").await.is_none());
        assert!(cache.get(&format!("key-{}", MAX_CACHE_SIZE)).await.is_none());
        assert_eq!(cache.get("fresh").await.unwrap().url, "new");
        assert_eq!(cache.count(), 1);
    }
}
