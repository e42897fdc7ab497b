//! 资源声明大小解析
//!
//! 运营者在资源上填写的大小是自由文本（如 "500MB"、"1.5 GB"、"700 kb"），
//! 排序需要统一换算为字节。解析失败返回 None，调用方按"未知"处理并排在最小。

/// 解析声明大小字符串为字节数
///
/// 支持的单位：B / KB / MB / GB / TB（不区分大小写，允许数字与单位间有空格）。
/// 纯数字按字节处理。
pub fn parse_size_bytes(input: &str) -> Option<u64> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    // 切分数字部分和单位部分
    let split_at = input
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit() && *c != '.')
        .map(|(i, _)| i)
        .unwrap_or(input.len());

    let (num_str, unit_str) = input.split_at(split_at);
    let num: f64 = num_str.parse().ok()?;
    if !num.is_finite() || num < 0.0 {
        return None;
    }

    let multiplier: u64 = match unit_str.trim().to_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kb" => 1024,
        "m" | "mb" => 1024 * 1024,
        "g" | "gb" => 1024 * 1024 * 1024,
        "t" | "tb" => 1024_u64.pow(4),
        _ => return None,
    };

    Some((num * multiplier as f64).round() as u64)
}
