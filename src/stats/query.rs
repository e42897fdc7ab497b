//! 统计查询边界
//!
//! 解释调用方传来的排序/方向/分页参数并驱动聚合器。
//! 非法输入一律收敛到安全默认值，展示层永远看不到错误。

use tracing::debug;

use crate::catalog::DriveCatalog;
use crate::errors::Result;
use crate::stats::aggregator::{StatsAggregator, sort_rows};
use crate::stats::{AggregatedRow, SortDirection, SortField};

/// 原始查询参数（通常来自请求查询串）
#[derive(Debug, Clone, Default)]
pub struct StatsQueryParams {
    /// 排序字段：name / date / size / count
    pub sort: Option<String>,
    /// 方向：asc / desc
    pub order: Option<String>,
    /// 分页大小，需命中白名单
    pub per_page: Option<usize>,
    /// 页码，1 基
    pub page: Option<usize>,
}

/// 一页统计结果
#[derive(Debug, Clone)]
pub struct StatsPage {
    pub rows: Vec<AggregatedRow>,
    pub total: usize,
    pub total_pages: usize,
    pub page: usize,
    pub page_size: usize,
    pub sort: SortField,
    pub direction: SortDirection,
}

/// 统计查询入口，只消费 [`StatsAggregator`]
pub struct StatsQuery {
    aggregator: StatsAggregator,
}

impl StatsQuery {
    pub fn new(aggregator: StatsAggregator) -> Self {
        Self { aggregator }
    }

    /// 解析参数：非法排序字段退回默认字段，方向缺省按字段默认
    fn interpret(params: &StatsQueryParams) -> (SortField, SortDirection) {
        let sort = params
            .sort
            .as_deref()
            .and_then(|s| s.parse::<SortField>().ok())
            .unwrap_or_default();
        let direction = params
            .order
            .as_deref()
            .and_then(|s| s.parse::<SortDirection>().ok())
            .unwrap_or_else(|| sort.default_direction());
        (sort, direction)
    }

    /// 执行查询：取行（经缓存）→ 排序 → 分页
    pub async fn run(
        &self,
        catalog: &DriveCatalog,
        params: &StatsQueryParams,
    ) -> Result<StatsPage> {
        let (sort, direction) = Self::interpret(params);
        debug!(
            "StatsQuery: sort={:?}, direction={:?}, per_page={:?}, page={:?}",
            sort, direction, params.per_page, params.page
        );

        let mut rows = self.aggregator.rows(catalog).await?;
        sort_rows(&mut rows, sort, direction);

        let page_size = self.aggregator.effective_page_size(params.per_page.unwrap_or(0));
        let (page_rows, total, total_pages) =
            self.aggregator
                .paginate(rows, page_size, params.page.unwrap_or(1));
        let page = params.page.unwrap_or(1).clamp(1, total_pages);

        Ok(StatsPage {
            rows: page_rows,
            total,
            total_pages,
            page,
            page_size,
            sort,
            direction,
        })
    }
}
