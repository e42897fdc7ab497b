use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::policy::Expiry;
use tracing::debug;

use super::TtlCache;

const DEFAULT_MAX_CAPACITY: u64 = 10_000;

/// 缓存条目：值和写入时指定的 TTL 一起存储
#[derive(Debug, Clone)]
struct CachedEntry {
    value: String,
    ttl: Duration,
}

/// 自定义过期策略：每个条目按写入时携带的 TTL 过期
///
/// 行缓存（约 60 秒）和地理缓存（成功约一周、失败数小时）共用一个实例，
/// 所以 TTL 必须是条目级而不是缓存级。
struct PerEntryExpiry;

impl Expiry<String, CachedEntry> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Moka 缓存后端
pub struct MokaCache {
    inner: Cache<String, CachedEntry>,
}

impl MokaCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_CAPACITY)
    }

    pub fn with_capacity(max_capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryExpiry)
            .build();

        debug!("MokaCache initialized with max capacity: {}", max_capacity);
        Self { inner }
    }
}

impl Default for MokaCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TtlCache for MokaCache {
    async fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).await.map(|entry| entry.value)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) {
        self.inner
            .insert(key.to_string(), CachedEntry { value, ttl })
            .await;
    }

    async fn remove(&self, key: &str) {
        self.inner.invalidate(key).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let cache = MokaCache::new();
        cache
            .set("k", "v".to_string(), Duration::from_secs(60))
            .await;
        assert_eq!(cache.get("k").await, Some("v".to_string()));

        cache.remove("k").await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn test_empty_string_is_a_hit() {
        // 空字符串代表已缓存的失败解析，必须与未命中区分开
        let cache = MokaCache::new();
        cache
            .set("geo:ip-api:203.0.113.7", String::new(), Duration::from_secs(60))
            .await;
        assert_eq!(cache.get("geo:ip-api:203.0.113.7").await, Some(String::new()));
        assert_eq!(cache.get("geo:ip-api:203.0.113.8").await, None);
    }

    #[tokio::test]
    async fn test_per_entry_ttl_expiry() {
        let cache = MokaCache::new();
        cache
            .set("short", "a".to_string(), Duration::from_millis(50))
            .await;
        cache
            .set("long", "b".to_string(), Duration::from_secs(60))
            .await;

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert_eq!(cache.get("short").await, None);
        assert_eq!(cache.get("long").await, Some("b".to_string()));
    }
}
