//! 网盘目录
//!
//! 维护运营者配置的下载网盘列表，并提供 key/alias 归一化规则。
//! 历史点击记录里的 drive_type 可能是稳定 key，也可能是后来设置的别名，
//! 聚合时通过 effective id 把两者对到同一个网盘上。

use serde::{Deserialize, Serialize};
use tracing::debug;

/// 兜底网盘的稳定 key，冲突消解时永不丢弃
pub const CATCH_ALL_KEY: &str = "other";

/// 一个已配置的网盘条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveEntry {
    /// 稳定标识，内置网盘创建后不可变
    pub key: String,
    /// 运营者可编辑的短标识，用于路由和匹配历史点击
    #[serde(default)]
    pub alias: String,
    /// 显示名称
    #[serde(default)]
    pub label: String,
    /// 是否启用
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// 是否为运营者自建网盘（区别于内置）
    #[serde(default)]
    pub is_custom: bool,
    /// 显示顺序
    #[serde(default)]
    pub order: i32,
}

fn default_enabled() -> bool {
    true
}

/// 归一化标识：小写并只保留 [a-z0-9-]
pub fn sanitize_id(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

impl DriveEntry {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            alias: String::new(),
            label: label.into(),
            enabled: true,
            is_custom: false,
            order: 0,
        }
    }

    /// 生效标识：别名非空取别名，否则回退到稳定 key，均做归一化
    ///
    /// 别名自动生成（如从中文显示名转写）属于展示层逻辑，这里一律回退 key。
    pub fn effective_id(&self) -> String {
        let alias = sanitize_id(&self.alias);
        if !alias.is_empty() {
            return alias;
        }
        sanitize_id(&self.key)
    }
}

/// 冲突消解：每个 effective id 只保留一个条目
///
/// 策略：
/// 1. 自建条目优先于同 id 的内置条目；
/// 2. 同类冲突保留先出现的；
/// 3. key 为 `"other"` 的条目永不丢弃（兜底网盘必须始终可寻址）；
/// 4. 消解后兜底条目先占用自己的 id，其余仍撞 id 的条目追加
///    `-2`、`-3`… 数字后缀。
pub fn resolve_alias_conflicts(entries: Vec<DriveEntry>) -> Vec<DriveEntry> {
    let mut kept: Vec<DriveEntry> = Vec::with_capacity(entries.len());

    for entry in entries {
        let id = entry.effective_id();
        let existing = kept.iter().position(|e| e.effective_id() == id);

        match existing {
            None => kept.push(entry),
            Some(idx) => {
                let existing_is_catch_all = kept[idx].key == CATCH_ALL_KEY;
                let incoming_is_catch_all = entry.key == CATCH_ALL_KEY;

                if incoming_is_catch_all {
                    // 兜底条目不丢，交给后缀阶段改名
                    kept.push(entry);
                } else if entry.is_custom && !kept[idx].is_custom && !existing_is_catch_all {
                    debug!(
                        "DriveCatalog: custom entry '{}' replaces default entry '{}' for id '{}'",
                        entry.key, kept[idx].key, id
                    );
                    kept[idx] = entry;
                } else {
                    debug!(
                        "DriveCatalog: dropping entry '{}' colliding on id '{}'",
                        entry.key, id
                    );
                }
            }
        }
    }

    // 后缀唯一化阶段：兜底条目先占位，"other" 始终指向兜底网盘本身
    let mut seen: Vec<String> = Vec::with_capacity(kept.len());
    for entry in kept.iter_mut().filter(|e| e.key == CATCH_ALL_KEY) {
        let id = claim_unique_id(entry, &seen);
        seen.push(id);
    }
    for entry in kept.iter_mut().filter(|e| e.key != CATCH_ALL_KEY) {
        let id = claim_unique_id(entry, &seen);
        seen.push(id);
    }

    kept
}

/// 取条目的 effective id；已被占用时追加数字后缀并写回 alias
fn claim_unique_id(entry: &mut DriveEntry, seen: &[String]) -> String {
    let mut id = entry.effective_id();
    if seen.contains(&id) {
        let base = id.clone();
        let mut n = 2usize;
        loop {
            id = format!("{}-{}", base, n);
            if !seen.contains(&id) {
                break;
            }
            n += 1;
        }
        debug!(
            "DriveCatalog: suffixing alias of '{}' to '{}' for uniqueness",
            entry.key, id
        );
        entry.alias = id.clone();
    }
    id
}

/// 网盘目录：冲突消解后的有序快照
///
/// 运营者编辑后重建一个新快照即可，聚合读取方在行缓存 TTL 窗口内接受旧值。
#[derive(Debug, Clone, Default)]
pub struct DriveCatalog {
    entries: Vec<DriveEntry>,
}

impl DriveCatalog {
    /// 从原始条目列表构建目录：消解别名冲突并按 order 升序排列
    pub fn from_entries(entries: Vec<DriveEntry>) -> Self {
        let mut entries = resolve_alias_conflicts(entries);
        entries.sort_by_key(|e| e.order);
        Self { entries }
    }

    /// 所有条目（含停用），按 order 升序
    pub fn all_entries(&self) -> &[DriveEntry] {
        &self.entries
    }

    /// 启用的条目，按 order 升序
    pub fn enabled_entries(&self) -> impl Iterator<Item = &DriveEntry> {
        self.entries.iter().filter(|e| e.enabled)
    }

    /// 按 effective id 查找条目
    pub fn find(&self, effective_id: &str) -> Option<&DriveEntry> {
        self.entries.iter().find(|e| e.effective_id() == effective_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, alias: &str, is_custom: bool) -> DriveEntry {
        DriveEntry {
            key: key.to_string(),
            alias: alias.to_string(),
            label: key.to_string(),
            enabled: true,
            is_custom,
            order: 0,
        }
    }

    #[test]
    fn test_sanitize_id() {
        assert_eq!(sanitize_id("BaiDu"), "baidu");
        assert_eq!(sanitize_id(" lan-zou "), "lan-zou");
        assert_eq!(sanitize_id("百度网盘"), "");
        assert_eq!(sanitize_id("pan_123!"), "pan123");
    }

    #[test]
    fn test_effective_id_fallback() {
        // 别名为空或净化后为空时回退到 key
        assert_eq!(entry("baidu", "", false).effective_id(), "baidu");
        assert_eq!(entry("custom_17", "蓝奏", false).effective_id(), "custom17");
        assert_eq!(entry("custom_17", "jianguo", false).effective_id(), "jianguo");
    }

    #[test]
    fn test_custom_beats_default() {
        let resolved = resolve_alias_conflicts(vec![
            entry("baidu", "", false),
            entry("custom_1", "baidu", true),
        ]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].key, "custom_1");
    }

    #[test]
    fn test_same_category_keeps_first() {
        let resolved = resolve_alias_conflicts(vec![
            entry("custom_1", "pan", true),
            entry("custom_2", "pan", true),
        ]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].key, "custom_1");
    }

    #[test]
    fn test_catch_all_never_dropped() {
        // 自建条目撞上 other 的 id，other 保留、自建不替换
        let resolved = resolve_alias_conflicts(vec![
            entry("other", "", false),
            entry("custom_1", "other", true),
        ]);
        assert!(resolved.iter().any(|e| e.key == "other"));

        // other 出现在后面也不丢，由后缀阶段改名
        let resolved = resolve_alias_conflicts(vec![
            entry("custom_1", "other", true),
            entry("other", "", false),
        ]);
        assert!(resolved.iter().any(|e| e.key == "other"));
        assert_eq!(resolved.len(), 2);
    }

    #[test]
    fn test_catch_all_keeps_its_id_on_late_arrival() {
        // 自建条目抢先占了 "other"，兜底条目随后才出现：
        // 后缀必须落在自建条目上，"other" 仍然指向兜底网盘
        let resolved = resolve_alias_conflicts(vec![
            entry("custom_1", "other", true),
            entry("other", "", false),
        ]);

        let catch_all = resolved.iter().find(|e| e.key == "other").unwrap();
        assert_eq!(catch_all.effective_id(), "other");
        let custom = resolved.iter().find(|e| e.key == "custom_1").unwrap();
        assert_eq!(custom.effective_id(), "other-2");
    }

    #[test]
    fn test_suffix_uniqueness_pass() {
        let resolved = resolve_alias_conflicts(vec![
            entry("other", "", false),
            entry("custom_1", "other", true),
            entry("custom_2", "other", true),
        ]);
        let mut ids: Vec<String> = resolved.iter().map(|e| e.effective_id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), resolved.len(), "effective ids must be unique");
    }

    #[test]
    fn test_catalog_ordering_and_lookup() {
        let mut a = entry("baidu", "", false);
        a.order = 2;
        let mut b = entry("lanzou", "", false);
        b.order = 1;
        let mut c = entry("quark", "", false);
        c.order = 3;
        c.enabled = false;

        let catalog = DriveCatalog::from_entries(vec![a, b, c]);
        let enabled: Vec<&str> = catalog.enabled_entries().map(|e| e.key.as_str()).collect();
        assert_eq!(enabled, vec!["lanzou", "baidu"]);
        assert!(catalog.find("quark").is_some());
        assert!(catalog.find("missing").is_none());
    }

    #[test]
    fn test_entry_serde_round_trip() {
        let entries = vec![entry("baidu", "", false), entry("custom_1", "jianguo", true)];
        let json = serde_json::to_string(&entries).unwrap();
        let back: Vec<DriveEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(entries, back);
    }
}
