//! 内存点击存储
//!
//! DashMap 实现的参考后端，供测试和无数据库的嵌入场景使用。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use super::{ClickEvent, ClickStore, GroupedCount, NO_DRIVE_SENTINEL};

#[derive(Default)]
pub struct MemoryClickStore {
    events: DashMap<u64, ClickEvent>,
    next_id: AtomicU64,
}

impl MemoryClickStore {
    pub fn new() -> Self {
        Self {
            events: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[async_trait]
impl ClickStore for MemoryClickStore {
    async fn record(&self, mut event: ClickEvent) -> anyhow::Result<u64> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        event.id = id;
        self.events.insert(id, event);
        Ok(id)
    }

    async fn query_grouped_counts(
        &self,
        resource_ids: &[u64],
    ) -> anyhow::Result<Vec<GroupedCount>> {
        let mut grouped: HashMap<(u64, u8, String), u64> = HashMap::new();

        for entry in self.events.iter() {
            let event = entry.value();
            if !resource_ids.is_empty() && !resource_ids.contains(&event.resource_id) {
                continue;
            }
            // 哨兵伪类型不参与统计
            if event.drive_type == NO_DRIVE_SENTINEL {
                continue;
            }
            *grouped
                .entry((
                    event.resource_id,
                    event.attachment_index,
                    event.drive_type.clone(),
                ))
                .or_insert(0) += 1;
        }

        let mut rows: Vec<GroupedCount> = grouped
            .into_iter()
            .map(|((resource_id, attachment_index, drive_type), count)| GroupedCount {
                resource_id,
                attachment_index,
                drive_type,
                count,
            })
            .collect();
        // 输出顺序确定化，方便测试断言
        rows.sort_by(|a, b| {
            (a.resource_id, a.attachment_index, &a.drive_type)
                .cmp(&(b.resource_id, b.attachment_index, &b.drive_type))
        });

        debug!("MemoryClickStore: grouped query returned {} rows", rows.len());
        Ok(rows)
    }

    async fn delete(&self, event_id: u64) -> anyhow::Result<()> {
        self.events.remove(&event_id);
        Ok(())
    }

    async fn delete_batch(&self, event_ids: &[u64]) -> anyhow::Result<()> {
        for id in event_ids {
            self.events.remove(id);
        }
        debug!("MemoryClickStore: deleted {} events", event_ids.len());
        Ok(())
    }
}
