//! 下载统计聚合
//!
//! 把扁平的点击事件表与网盘目录对账，产出每个 (资源, 附件) 的统计行，
//! 并提供排序、分页和行缓存。

pub mod aggregator;
pub mod query;

pub use aggregator::StatsAggregator;
pub use query::{StatsPage, StatsQuery, StatsQueryParams};

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 一个 (资源, 附件) 的聚合统计行
///
/// 派生数据，按需重算；行缓存把未排序的行集整体序列化为 JSON 存放。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRow {
    pub resource_id: u64,
    pub attachment_index: u8,
    /// 显示名称
    pub name: String,
    /// 声明大小原文（可能为空）
    pub size_raw: String,
    /// 换算为字节的大小，无法解析时为 None（排序时排最小）
    pub size_bytes: Option<u64>,
    /// 更新时间，缺失时回退到发布时间
    pub date: DateTime<Utc>,
    /// 当前已上传的网盘：effective id → 显示名
    pub uploaded: BTreeMap<String, String>,
    /// 每网盘校正计数（key 与 alias 的历史记录合并）
    pub drive_counts: BTreeMap<String, u64>,
    /// 仅对当前已上传网盘求和的总数
    pub total: u64,
}

impl AggregatedRow {
    /// 声明大小的展示文本，缺失显示 "unknown"
    pub fn size_display(&self) -> &str {
        if self.size_raw.trim().is_empty() {
            "unknown"
        } else {
            &self.size_raw
        }
    }
}

/// 排序字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Name,
    Date,
    Size,
    #[default]
    Count,
}

impl SortField {
    /// 各字段的默认方向：计数降序，其余升序
    pub fn default_direction(&self) -> SortDirection {
        match self {
            SortField::Count => SortDirection::Descending,
            _ => SortDirection::Ascending,
        }
    }
}

impl std::str::FromStr for SortField {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "date" => Ok(Self::Date),
            "size" => Ok(Self::Size),
            "count" => Ok(Self::Count),
            _ => Err(format!(
                "Invalid sort field: '{}'. Valid: name, date, size, count",
                s
            )),
        }
    }
}

/// 排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl std::str::FromStr for SortDirection {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            _ => Err(format!(
                "Invalid sort direction: '{}'. Valid: asc, desc",
                s
            )),
        }
    }
}
