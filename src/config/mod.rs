//! 配置结构定义
//!
//! 所有配置均为显式注入：构造 [`crate::stats::StatsAggregator`] 或
//! [`crate::services::geo::GeoResolver`] 时传入，不做任何全局查找。

use serde::{Deserialize, Serialize};

fn default_row_cache_ttl_secs() -> u64 {
    60
}

fn default_page_size() -> usize {
    100
}

fn default_page_size_options() -> Vec<usize> {
    vec![50, 100, 200]
}

/// 统计聚合配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// 行缓存 TTL（秒）
    #[serde(default = "default_row_cache_ttl_secs")]
    pub row_cache_ttl_secs: u64,
    /// 运营者偏好的默认分页大小
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    /// 分页大小白名单
    #[serde(default = "default_page_size_options")]
    pub page_size_options: Vec<usize>,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            row_cache_ttl_secs: default_row_cache_ttl_secs(),
            default_page_size: default_page_size(),
            page_size_options: default_page_size_options(),
        }
    }
}

/// 外部地理位置查询服务
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GeoProviderKind {
    /// ip-api.com
    #[default]
    IpApi,
    /// ipinfo.io
    IpInfo,
    /// whois.pconline.com.cn
    Pconline,
}

impl GeoProviderKind {
    /// 固定的 fallback 顺序，首选 provider 之后按此顺序尝试
    pub const ALL: [GeoProviderKind; 3] = [
        GeoProviderKind::IpApi,
        GeoProviderKind::IpInfo,
        GeoProviderKind::Pconline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IpApi => "ip-api",
            Self::IpInfo => "ipinfo",
            Self::Pconline => "pconline",
        }
    }
}

impl std::fmt::Display for GeoProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for GeoProviderKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ip-api" | "ipapi" | "ip_api" => Ok(Self::IpApi),
            "ipinfo" | "ip_info" => Ok(Self::IpInfo),
            "pconline" => Ok(Self::Pconline),
            _ => Err(format!(
                "Invalid geo provider: '{}'. Valid: ip-api, ipinfo, pconline",
                s
            )),
        }
    }
}

fn default_cache_hours() -> u64 {
    168
}

fn default_failure_cache_hours() -> u64 {
    4
}

fn default_batch_limit() -> usize {
    100
}

fn default_timeout_secs() -> u64 {
    3
}

fn default_batch_concurrency() -> usize {
    8
}

/// 地理位置解析配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoConfig {
    /// 运营者首选的查询服务
    #[serde(default)]
    pub provider: GeoProviderKind,
    /// 成功解析结果的缓存时长（小时）
    #[serde(default = "default_cache_hours")]
    pub cache_hours: u64,
    /// 失败结果的缓存时长（小时），短于成功缓存以便自愈
    #[serde(default = "default_failure_cache_hours")]
    pub failure_cache_hours: u64,
    /// 单次批量解析的 IP 数上限
    #[serde(default = "default_batch_limit")]
    pub batch_limit: usize,
    /// 单次外部请求超时（秒）
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// 批量解析的并发上限
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            provider: GeoProviderKind::default(),
            cache_hours: default_cache_hours(),
            failure_cache_hours: default_failure_cache_hours(),
            batch_limit: default_batch_limit(),
            timeout_secs: default_timeout_secs(),
            batch_concurrency: default_batch_concurrency(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_stats_config_defaults() {
        let config: StatsConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.row_cache_ttl_secs, 60);
        assert_eq!(config.default_page_size, 100);
        assert_eq!(config.page_size_options, vec![50, 100, 200]);
    }

    #[test]
    fn test_geo_config_defaults() {
        let config = GeoConfig::default();
        assert_eq!(config.provider, GeoProviderKind::IpApi);
        assert_eq!(config.cache_hours, 168);
        assert!(config.failure_cache_hours < config.cache_hours);
        assert_eq!(config.batch_limit, 100);
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!(
            GeoProviderKind::from_str("ip-api").unwrap(),
            GeoProviderKind::IpApi
        );
        assert_eq!(
            GeoProviderKind::from_str("IPINFO").unwrap(),
            GeoProviderKind::IpInfo
        );
        assert_eq!(
            GeoProviderKind::from_str("pconline").unwrap(),
            GeoProviderKind::Pconline
        );
        assert!(GeoProviderKind::from_str("taobao").is_err());
    }
}
