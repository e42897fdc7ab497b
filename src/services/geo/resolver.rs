//! 地理位置解析器
//!
//! 单 IP 解析状态机：
//! 1. loopback → 固定标签 "local"，不进缓存
//! 2. 私有网段 → 固定标签 "internal"，不发请求
//! 3. 进程内热缓存 / 注入的 TTL 缓存查询（空串是合法的失败缓存）
//! 4. provider fallback 链：首选 provider 之后按固定顺序逐个尝试
//! 5. 回写缓存：成功用长 TTL，失败用短 TTL 以便自愈
//!
//! 解析失败永远不向调用方抛错，统一降级为空文本。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream;
use tracing::{debug, info, trace, warn};
use ureq::Agent;

use super::provider::{GeoLookup, IpApiProvider, IpInfoProvider, PconlineProvider};
use super::{GeoLocation, INTERNAL_LABEL, LOCAL_LABEL, ResolutionError};
use crate::cache::TtlCache;
use crate::config::{GeoConfig, GeoProviderKind};
use crate::utils::ip::{is_loopback_ip, is_private_ip, parse_ip};

/// 热缓存 TTL（15 分钟）：吸收同一页面内的重复 IP
const WARM_CACHE_TTL_SECS: u64 = 15 * 60;
/// 热缓存最大容量
const WARM_CACHE_MAX_CAPACITY: u64 = 10_000;

/// 按 fallback 链逐个尝试 provider（阻塞，调用方放入 spawn_blocking）
///
/// 任一 provider 返回非空负载即短路；超时、网络错误、错误负载
/// 都只是前进到下一个；全部失败返回 [`ResolutionError::Exhausted`]。
fn lookup_chain(
    providers: &[Box<dyn GeoLookup>],
    ip: &str,
) -> Result<GeoLocation, ResolutionError> {
    for provider in providers {
        match provider.lookup(ip) {
            Ok(location) if !location.is_empty() => {
                debug!("GeoResolver: {} resolved '{}' ", provider.name(), ip);
                return Ok(location);
            }
            Ok(_) => {
                warn!(
                    "GeoResolver: {} returned empty payload for '{}', trying next",
                    provider.name(),
                    ip
                );
            }
            Err(e) => {
                warn!(
                    "GeoResolver: {} failed for '{}': {}, trying next",
                    provider.name(),
                    ip,
                    e
                );
            }
        }
    }
    Err(ResolutionError::Exhausted)
}

/// IP → 位置文本解析器
pub struct GeoResolver {
    providers: Arc<Vec<Box<dyn GeoLookup>>>,
    store: Arc<dyn TtlCache>,
    warm: moka::future::Cache<String, String>,
    config: GeoConfig,
}

impl GeoResolver {
    /// 按配置构建：首选 provider 排在链首，其余按固定顺序跟在后面
    pub fn new(store: Arc<dyn TtlCache>, config: GeoConfig) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .build()
            .into();

        let mut kinds = vec![config.provider];
        kinds.extend(GeoProviderKind::ALL.iter().filter(|k| **k != config.provider));

        let providers: Vec<Box<dyn GeoLookup>> = kinds
            .into_iter()
            .map(|kind| -> Box<dyn GeoLookup> {
                match kind {
                    GeoProviderKind::IpApi => Box::new(IpApiProvider::new(agent.clone())),
                    GeoProviderKind::IpInfo => Box::new(IpInfoProvider::new(agent.clone())),
                    GeoProviderKind::Pconline => Box::new(PconlineProvider::new(agent.clone())),
                }
            })
            .collect();

        info!(
            "GeoResolver: initialized with {} providers, preferred '{}'",
            providers.len(),
            config.provider
        );
        Self::with_providers(store, config, providers)
    }

    /// 用显式 provider 链构建（测试和嵌入方自定义时使用）
    pub fn with_providers(
        store: Arc<dyn TtlCache>,
        config: GeoConfig,
        providers: Vec<Box<dyn GeoLookup>>,
    ) -> Self {
        let warm = moka::future::Cache::builder()
            .time_to_live(Duration::from_secs(WARM_CACHE_TTL_SECS))
            .max_capacity(WARM_CACHE_MAX_CAPACITY)
            .build();

        Self {
            providers: Arc::new(providers),
            store,
            warm,
            config,
        }
    }

    fn cache_key(&self, ip: &str) -> String {
        format!("geo:{}:{}", self.config.provider, ip)
    }

    /// 解析单个 IP 为位置文本
    ///
    /// 失败返回空串，调用方直接留白展示。
    pub async fn resolve(&self, ip: &str) -> String {
        let Some(addr) = parse_ip(ip) else {
            debug!("GeoResolver: unparseable ip '{}', skipping", ip);
            return String::new();
        };

        if is_loopback_ip(&addr) {
            return LOCAL_LABEL.to_string();
        }
        if is_private_ip(&addr) {
            return INTERNAL_LABEL.to_string();
        }

        let key = self.cache_key(ip);

        // 热缓存命中时不再查注入的缓存后端
        if let Some(label) = self.warm.get(&key).await {
            trace!("GeoResolver: warm cache hit for '{}'", ip);
            return label;
        }

        if let Some(label) = self.store.get(&key).await {
            trace!("GeoResolver: cache hit for '{}'", ip);
            self.warm.insert(key, label.clone()).await;
            return label;
        }

        let label = match self.resolve_uncached(ip).await {
            Ok(location) => location.display_string(),
            Err(e) => {
                debug!("GeoResolver: resolution failed for '{}': {}", ip, e);
                String::new()
            }
        };

        // 失败结果用短 TTL 缓存：既不对坏地址热循环重试，也能自愈
        let ttl_hours = if label.is_empty() {
            self.config.failure_cache_hours
        } else {
            self.config.cache_hours
        };
        self.store
            .set(&key, label.clone(), Duration::from_secs(ttl_hours * 3600))
            .await;
        self.warm.insert(key, label.clone()).await;

        label
    }

    /// 跳过缓存，直接走 provider 链（内部保留错误，便于测试观察）
    async fn resolve_uncached(&self, ip: &str) -> Result<GeoLocation, ResolutionError> {
        let providers = Arc::clone(&self.providers);
        let ip = ip.to_string();

        tokio::task::spawn_blocking(move || lookup_chain(&providers, &ip))
            .await
            .unwrap_or_else(|e| Err(ResolutionError::Request(e.to_string())))
    }

    /// 批量解析
    ///
    /// 超出 `batch_limit` 的 IP 被丢弃（防止单次请求滥用）；
    /// 去重后各 IP 独立走单 IP 状态机，miss 以有限并发向外请求。
    pub async fn resolve_batch(&self, ips: &[String]) -> HashMap<String, String> {
        let mut unique: Vec<&String> = Vec::new();
        for ip in ips {
            if !unique.contains(&ip) {
                unique.push(ip);
            }
        }

        if unique.len() > self.config.batch_limit {
            warn!(
                "GeoResolver: batch of {} ips exceeds limit {}, truncating",
                unique.len(),
                self.config.batch_limit
            );
            unique.truncate(self.config.batch_limit);
        }

        let concurrency = self.config.batch_concurrency.max(1);
        stream::iter(unique)
            .map(|ip| async move { (ip.clone(), self.resolve(ip).await) })
            .buffer_unordered(concurrency)
            .collect()
            .await
    }
}
