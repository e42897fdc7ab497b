//! Panstats - 网盘下载统计核心库
//!
//! This library provides the statistics core for netdisk download cards:
//! click aggregation against an operator-editable drive catalog, cached
//! sortable/paginated per-resource rows, and best-effort IP geo-resolution.
//!
//! # Architecture
//! - `catalog`: drive entries, effective-id normalization, alias conflict resolution
//! - `storage`: click event store and resource link provider seams
//! - `stats`: aggregation, sorting, pagination and the row cache
//! - `cache`: generic TTL key-value cache backends (moka / null)
//! - `services::geo`: provider fallback chain and the geo cache
//! - `config`: injected configuration structs
//! - `utils`: IP classification and size parsing helpers

pub mod cache;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod services;
pub mod stats;
pub mod storage;
pub mod utils;
