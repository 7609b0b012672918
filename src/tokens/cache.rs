use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// In-process cache with a fixed time-to-live. Expired entries are evicted
/// when read.
#[derive(Debug)]
pub struct TtlCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, V)>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some((inserted, value)) if inserted.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub async fn insert(&self, key: impl Into<String>, value: V) {
        self.entries
            .lock()
            .await
            .insert(key.into(), (Instant::now(), value));
    }

    pub async fn invalidate(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hit_within_ttl() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("a", 1u32).await;
        assert_eq!(cache.get("a").await, Some(1));
        assert_eq!(cache.get("b").await, None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_evicted() {
        let cache = TtlCache::new(Duration::from_millis(20));
        cache.insert("a", "v".to_string()).await;
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert_eq!(cache.get("a").await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_zero_ttl_never_hits() {
        let cache = TtlCache::new(Duration::ZERO);
        cache.insert("a", 1u8).await;
        assert_eq!(cache.get("a").await, None);
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("a", 1u8).await;
        cache.invalidate("a").await;
        assert_eq!(cache.get("a").await, None);
    }
}
