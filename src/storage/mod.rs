//! 存储协作方接口
//!
//! 核心只消费两个抽象：追加式的点击事件存储，和按资源/附件/网盘
//! 提供下载链接的资源提供方。两者的具体实现（数据库、CMS 元数据等）
//! 由嵌入方注入。

pub mod memory;

pub use memory::MemoryClickStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::DriveEntry;

/// 每个资源最多的附件槽位数（1 基索引）
pub const MAX_ATTACHMENTS: u8 = 6;

/// "未选择网盘" 的哨兵伪类型，分组统计时排除
pub const NO_DRIVE_SENTINEL: &str = "none";

/// 一次下载点击事件，写入后不可变
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickEvent {
    pub id: u64,
    pub resource_id: u64,
    /// 附件槽位，1..=6
    pub attachment_index: u8,
    /// 点击时记录的网盘标识，可能是 key 也可能是当时的别名
    pub drive_type: String,
    pub ip: String,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
}

/// 分组计数查询结果行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedCount {
    pub resource_id: u64,
    pub attachment_index: u8,
    pub drive_type: String,
    pub count: u64,
}

/// 资源元数据（标题、声明大小、发布/更新时间）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceMeta {
    pub resource_id: u64,
    pub title: String,
    /// 运营者填写的声明大小原文，可能为空
    #[serde(default)]
    pub size: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// 点击事件存储
///
/// 聚合路径只用 `query_grouped_counts`，一次分组查询取回全部计数；
/// `delete` / `delete_batch` 供运营者的日志管理使用，删除后不要求
/// 主动失效行缓存，TTL 内的陈旧度在容忍范围内。
#[async_trait]
pub trait ClickStore: Send + Sync {
    /// 追加一条点击事件，返回分配的事件 id
    async fn record(&self, event: ClickEvent) -> anyhow::Result<u64>;

    /// 按 (resource, attachment, drive_type) 分组计数
    ///
    /// `resource_ids` 为空表示不过滤。结果必须排除
    /// [`NO_DRIVE_SENTINEL`] 伪类型。
    async fn query_grouped_counts(&self, resource_ids: &[u64])
        -> anyhow::Result<Vec<GroupedCount>>;

    async fn delete(&self, event_id: u64) -> anyhow::Result<()>;

    async fn delete_batch(&self, event_ids: &[u64]) -> anyhow::Result<()>;
}

/// 资源下载链接提供方
pub trait ResourceLinkProvider: Send + Sync {
    /// 枚举候选资源
    fn resources(&self) -> Vec<ResourceMeta>;

    /// 指定资源/附件/网盘当前存储的下载链接
    fn get_link(&self, resource_id: u64, attachment_index: u8, entry: &DriveEntry)
        -> Option<String>;

    fn has_link(&self, resource_id: u64, attachment_index: u8, entry: &DriveEntry) -> bool {
        self.get_link(resource_id, attachment_index, entry)
            .is_some_and(|url| !url.trim().is_empty())
    }
}
