use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;

use super::TtlCache;

/// 空缓存后端：所有读取都未命中
///
/// 缓存后端不可用时注入，聚合和地理解析退化为每次重算/重取。
pub struct NullCache;

#[async_trait]
impl TtlCache for NullCache {
    async fn get(&self, _key: &str) -> Option<String> {
        None
    }

    async fn set(&self, key: &str, _value: String, _ttl: Duration) {
        trace!("NullCache: discarding set for key '{}'", key);
    }

    async fn remove(&self, _key: &str) {}
}
