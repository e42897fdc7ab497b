//! 外部地理位置查询 provider
//!
//! 每个 provider 负责一个外部 HTTP API，响应用 `serde_json::Value`
//! 宽容解析：字段缺失不报错，错误负载作为 [`ResolutionError::Payload`]
//! 交给上层的 fallback 链。查询是同步阻塞的，由解析器放到
//! `spawn_blocking` 线程池里执行。

use serde_json::Value;
use tracing::trace;
use ureq::Agent;

use super::{GeoLocation, ResolutionError};

/// 单个外部查询服务的接口
///
/// 实现必须在 Agent 自带的超时内返回；一次调用只尝试一次请求，
/// 重试交给上层的 fallback 链。
pub trait GeoLookup: Send + Sync {
    fn lookup(&self, ip: &str) -> Result<GeoLocation, ResolutionError>;

    /// provider 名称（用于日志）
    fn name(&self) -> &'static str;
}

fn fetch_json(agent: &Agent, url: &str) -> Result<Value, ResolutionError> {
    let resp = agent
        .get(url)
        .call()
        .map_err(|e| ResolutionError::Request(e.to_string()))?;
    resp.into_body()
        .read_json()
        .map_err(|e| ResolutionError::Payload(e.to_string()))
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value[key]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// ip-api.com
///
/// 成功: `{"status":"success","country":"...","regionName":"...","city":"...","isp":"..."}`
/// 失败: `{"status":"fail","message":"..."}`
pub struct IpApiProvider {
    agent: Agent,
}

impl IpApiProvider {
    pub fn new(agent: Agent) -> Self {
        Self { agent }
    }
}

impl GeoLookup for IpApiProvider {
    fn lookup(&self, ip: &str) -> Result<GeoLocation, ResolutionError> {
        let url = format!(
            "http://ip-api.com/json/{}?lang=zh-CN&fields=status,message,country,regionName,city,isp",
            ip
        );
        let json = fetch_json(&self.agent, &url)?;

        if json["status"].as_str() == Some("fail") {
            return Err(ResolutionError::Payload(
                str_field(&json, "message").unwrap_or_else(|| "fail status".to_string()),
            ));
        }

        let location = GeoLocation {
            country: str_field(&json, "country"),
            region: str_field(&json, "regionName"),
            city: str_field(&json, "city"),
            org: str_field(&json, "isp"),
        };
        trace!("IpApiProvider: resolved {} -> {:?}", ip, location);
        Ok(location)
    }

    fn name(&self) -> &'static str {
        "ip-api"
    }
}

/// ipinfo.io
///
/// 成功: `{"country":"US","region":"California","city":"Mountain View","org":"AS15169 Google LLC"}`
/// 保留地址: `{"bogon":true}`；错误: `{"error":{...}}`
pub struct IpInfoProvider {
    agent: Agent,
}

impl IpInfoProvider {
    pub fn new(agent: Agent) -> Self {
        Self { agent }
    }
}

impl GeoLookup for IpInfoProvider {
    fn lookup(&self, ip: &str) -> Result<GeoLocation, ResolutionError> {
        let url = format!("https://ipinfo.io/{}/json", ip);
        let json = fetch_json(&self.agent, &url)?;

        if json["bogon"].as_bool() == Some(true) {
            return Err(ResolutionError::Payload("bogon address".to_string()));
        }
        if !json["error"].is_null() {
            return Err(ResolutionError::Payload(json["error"].to_string()));
        }

        let location = GeoLocation {
            country: str_field(&json, "country"),
            region: str_field(&json, "region"),
            city: str_field(&json, "city"),
            org: str_field(&json, "org"),
        };
        trace!("IpInfoProvider: resolved {} -> {:?}", ip, location);
        Ok(location)
    }

    fn name(&self) -> &'static str {
        "ipinfo"
    }
}

/// whois.pconline.com.cn
///
/// 成功: `{"ip":"...","pro":"广东省","city":"深圳市","addr":"广东省深圳市 电信"}`
/// 失败时 `err` 非空或各字段为空。只覆盖国内 IP，放在链尾兜底。
pub struct PconlineProvider {
    agent: Agent,
}

impl PconlineProvider {
    pub fn new(agent: Agent) -> Self {
        Self { agent }
    }
}

impl GeoLookup for PconlineProvider {
    fn lookup(&self, ip: &str) -> Result<GeoLocation, ResolutionError> {
        let url = format!("http://whois.pconline.com.cn/ipJson.jsp?ip={}&json=true", ip);
        let json = fetch_json(&self.agent, &url)?;

        if let Some(err) = str_field(&json, "err") {
            return Err(ResolutionError::Payload(err));
        }

        let mut location = GeoLocation {
            country: None,
            region: str_field(&json, "pro"),
            city: str_field(&json, "city"),
            org: None,
        };
        // 省市都缺时退回整段地址文本
        if location.region.is_none() && location.city.is_none() {
            location.city = str_field(&json, "addr");
        }
        trace!("PconlineProvider: resolved {} -> {:?}", ip, location);
        Ok(location)
    }

    fn name(&self) -> &'static str {
        "pconline"
    }
}
