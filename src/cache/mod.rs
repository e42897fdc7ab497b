//! TTL 键值缓存
//!
//! 行缓存和地理缓存共用同一个后端抽象：带过期时间的字符串键值存储。
//! 不要求跨进程持久化；后端不可用时注入 [`NullCache`]，
//! 调用方退化为"永远未命中"，只慢不错。

mod moka;
mod null;

pub use self::moka::MokaCache;
pub use self::null::NullCache;

use std::time::Duration;

use async_trait::async_trait;

/// 通用 TTL 键值缓存接口
///
/// 命中返回缓存值（空字符串是合法值，代表一次已缓存的失败解析），
/// 未命中或已过期返回 None。
#[async_trait]
pub trait TtlCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: String, ttl: Duration);
    async fn remove(&self, key: &str);
}
