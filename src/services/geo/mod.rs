//! IP 地理位置解析
//!
//! 把展示中的客户端 IP 解析为简短的位置文本：
//! - loopback / 私有网段直接短路，不发任何网络请求
//! - 外部查询走 provider fallback 链，结果进 (provider, ip) 键的 TTL 缓存
//! - 解析失败对调用方永远不是错误，只降级为空文本

mod provider;
mod resolver;

pub use provider::{GeoLookup, IpApiProvider, IpInfoProvider, PconlineProvider};
pub use resolver::GeoResolver;

use std::fmt;

/// loopback 地址的固定标签
pub const LOCAL_LABEL: &str = "local";

/// 私有网段地址的固定标签
pub const INTERNAL_LABEL: &str = "internal";

/// 一次成功解析出的地理位置信息
///
/// 各 provider 的响应字段不同，统一归一到这四个可选字段。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoLocation {
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    /// 运营商 / 机构
    pub org: Option<String>,
}

impl GeoLocation {
    /// 是否没有任何有效字段
    pub fn is_empty(&self) -> bool {
        self.display_string().is_empty()
    }

    /// 归一化为展示文本：国家、地区、城市依次拼接，运营商缀在最后
    pub fn display_string(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        for field in [&self.country, &self.region, &self.city] {
            if let Some(value) = field {
                let value = value.trim();
                if !value.is_empty() {
                    parts.push(value);
                }
            }
        }
        let mut out = parts.join(", ");
        if let Some(org) = &self.org {
            let org = org.trim();
            if !org.is_empty() {
                if !out.is_empty() {
                    out.push_str(" - ");
                }
                out.push_str(org);
            }
        }
        out
    }
}

/// 解析过程的内部错误
///
/// 只在 provider 链内部流转，便于测试观察失败原因；
/// 在 [`GeoResolver`] 边界统一转换为空文本，绝不向展示层传播。
#[derive(Debug, Clone)]
pub enum ResolutionError {
    /// 网络错误或超时
    Request(String),
    /// 响应格式异常或 provider 返回错误负载
    Payload(String),
    /// 所有 provider 均失败
    Exhausted,
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionError::Request(msg) => write!(f, "request failed: {}", msg),
            ResolutionError::Payload(msg) => write!(f, "bad payload: {}", msg),
            ResolutionError::Exhausted => write!(f, "all providers exhausted"),
        }
    }
}

impl std::error::Error for ResolutionError {}
