//! 统计行的构建、排序、分页与行缓存
//!
//! `build_rows` 是纯计算，不碰任何缓存；[`StatsAggregator::rows`] 在外层
//! 包一层 TTL 缓存。排序和分页始终作用在取回后的内存行集上，
//! 不进入缓存负载，运营者切换排序无需失效缓存。

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cache::TtlCache;
use crate::catalog::{DriveCatalog, sanitize_id};
use crate::config::StatsConfig;
use crate::errors::{PanstatsError, Result};
use crate::stats::{AggregatedRow, SortDirection, SortField};
use crate::storage::{ClickStore, GroupedCount, MAX_ATTACHMENTS, ResourceLinkProvider, ResourceMeta};
use crate::utils::size::parse_size_bytes;

/// 行缓存的固定键：负载是未排序的全量行集，不按排序/过滤参数区分
const ROW_CACHE_KEY: &str = "panstats:rows";

/// 从分组计数和网盘目录构建全量统计行（纯计算）
///
/// 每个 (资源, 附件) 只要对任一启用网盘配置了链接就产出一行；
/// `uploaded` 只含当前有链接的网盘，历史有点击但链接已删的网盘
/// 既不进 `uploaded` 也不计入 `total`。
///
/// 分组计数只遍历一次建立索引，之后不再回查存储。
pub fn build_rows(
    grouped: &[GroupedCount],
    catalog: &DriveCatalog,
    resources: &[ResourceMeta],
    provider: &dyn ResourceLinkProvider,
) -> Vec<AggregatedRow> {
    // (resource, attachment) → 小写 drive_type → 计数
    let mut counts: HashMap<(u64, u8), HashMap<String, u64>> = HashMap::new();
    for row in grouped {
        *counts
            .entry((row.resource_id, row.attachment_index))
            .or_default()
            .entry(row.drive_type.to_lowercase())
            .or_insert(0) += row.count;
    }

    let empty: HashMap<String, u64> = HashMap::new();
    let mut rows = Vec::new();

    for resource in resources {
        for attachment_index in 1..=MAX_ATTACHMENTS {
            let uploaded_entries: Vec<_> = catalog
                .enabled_entries()
                .filter(|e| provider.has_link(resource.resource_id, attachment_index, e))
                .collect();
            if uploaded_entries.is_empty() {
                continue;
            }

            let raw = counts
                .get(&(resource.resource_id, attachment_index))
                .unwrap_or(&empty);

            let mut uploaded = BTreeMap::new();
            let mut drive_counts = BTreeMap::new();
            let mut total = 0u64;

            for entry in uploaded_entries {
                let effective_id = entry.effective_id();
                let key_lower = entry.key.to_lowercase();
                let alias_id = sanitize_id(&entry.alias);

                // key 与 alias 两种历史标识各记了一部分点击，这里合并
                let mut count = raw.get(&key_lower).copied().unwrap_or(0);
                if !alias_id.is_empty() && alias_id != key_lower {
                    count += raw.get(&alias_id).copied().unwrap_or(0);
                }

                total += count;
                uploaded.insert(effective_id.clone(), entry.label.clone());
                drive_counts.insert(effective_id, count);
            }

            rows.push(AggregatedRow {
                resource_id: resource.resource_id,
                attachment_index,
                name: resource.title.clone(),
                size_raw: resource.size.clone(),
                size_bytes: parse_size_bytes(&resource.size),
                date: resource.updated_at.unwrap_or(resource.published_at),
                uploaded,
                drive_counts,
                total,
            });
        }
    }

    rows
}

/// 原地稳定排序
///
/// 同值行保持输入顺序，重复调用结果一致。
pub fn sort_rows(rows: &mut [AggregatedRow], field: SortField, direction: SortDirection) {
    rows.sort_by(|a, b| {
        let ordering = match field {
            SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortField::Date => a.date.cmp(&b.date),
            // None 排最小（未知大小）
            SortField::Size => a.size_bytes.cmp(&b.size_bytes),
            SortField::Count => a.total.cmp(&b.total),
        };
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

/// 统计聚合器：纯计算外包一层行缓存
pub struct StatsAggregator {
    store: Arc<dyn ClickStore>,
    provider: Arc<dyn ResourceLinkProvider>,
    cache: Arc<dyn TtlCache>,
    config: StatsConfig,
}

impl StatsAggregator {
    pub fn new(
        store: Arc<dyn ClickStore>,
        provider: Arc<dyn ResourceLinkProvider>,
        cache: Arc<dyn TtlCache>,
        config: StatsConfig,
    ) -> Self {
        Self {
            store,
            provider,
            cache,
            config,
        }
    }

    /// 取全量未排序行集，优先走行缓存
    ///
    /// 缓存未命中或反序列化失败时重算并回填；缓存后端退化为
    /// 永远未命中时每次重算，慢但正确。
    pub async fn rows(&self, catalog: &DriveCatalog) -> Result<Vec<AggregatedRow>> {
        if let Some(blob) = self.cache.get(ROW_CACHE_KEY).await {
            match serde_json::from_str::<Vec<AggregatedRow>>(&blob) {
                Ok(rows) => {
                    debug!("StatsAggregator: row cache hit, {} rows", rows.len());
                    return Ok(rows);
                }
                Err(e) => {
                    warn!("StatsAggregator: cached row blob invalid, recomputing: {}", e);
                }
            }
        }

        let rows = self.compute_rows(catalog).await?;

        let blob = serde_json::to_string(&rows)?;
        self.cache
            .set(
                ROW_CACHE_KEY,
                blob,
                Duration::from_secs(self.config.row_cache_ttl_secs),
            )
            .await;

        Ok(rows)
    }

    /// 全量重算（跳过行缓存读取）
    async fn compute_rows(&self, catalog: &DriveCatalog) -> Result<Vec<AggregatedRow>> {
        let resources = self.provider.resources();
        let resource_ids: Vec<u64> = resources.iter().map(|r| r.resource_id).collect();

        // 一次分组查询取回全部计数，之后的行构建不再回查存储
        let grouped = self
            .store
            .query_grouped_counts(&resource_ids)
            .await
            .map_err(|e| PanstatsError::storage_operation(e.to_string()))?;

        let rows = build_rows(&grouped, catalog, &resources, self.provider.as_ref());
        info!(
            "StatsAggregator: computed {} rows from {} grouped counts",
            rows.len(),
            grouped.len()
        );
        Ok(rows)
    }

    /// 主动失效行缓存（网盘配置保存钩子使用；平时靠 TTL 自然过期）
    pub async fn invalidate(&self) {
        self.cache.remove(ROW_CACHE_KEY).await;
        debug!("StatsAggregator: row cache invalidated");
    }

    /// 分页大小白名单校验：不在白名单时回退运营者默认值，再不行取白名单首项
    pub fn effective_page_size(&self, requested: usize) -> usize {
        let options = &self.config.page_size_options;
        if options.contains(&requested) {
            requested
        } else if options.contains(&self.config.default_page_size) {
            self.config.default_page_size
        } else {
            options.first().copied().unwrap_or(100)
        }
    }

    /// 分页
    ///
    /// `page_size` 经 [`Self::effective_page_size`] 收敛，
    /// `page` 收敛到 `[1, total_pages]`。
    pub fn paginate(
        &self,
        rows: Vec<AggregatedRow>,
        page_size: usize,
        page: usize,
    ) -> (Vec<AggregatedRow>, usize, usize) {
        let page_size = self.effective_page_size(page_size);

        let total = rows.len();
        let total_pages = std::cmp::max(1, total.div_ceil(page_size));
        let page = page.clamp(1, total_pages);

        let start = (page - 1) * page_size;
        let page_rows: Vec<AggregatedRow> =
            rows.into_iter().skip(start).take(page_size).collect();

        (page_rows, total, total_pages)
    }
}
