//! # QQWry Database Library
//!
//! A Rust library for parsing and querying QQWry-format (`qqwry.dat`) IPv4 location databases.
//!
//! ## Features
//! - Resolves an IPv4 address to a city and an ISP label.
//! - Binary search over the 7-byte range index and full support for the record redirect modes.
//! - GB18030/GBK text decoding of every stored string.
//! - Load-once, immutable database store that is safe to share between threads.
//! - Optional expiring result cache and memory-mapped loading (`mmap` feature).
//! - Mapping of a request's client address onto two configurable header values.
//!
//! ## Usage
//!
//! 1. Load the database into a store and build a `Locator`:
//! ```rust,ignore
//! use qqwry::{DatabaseStore, Locator};
//! use std::sync::Arc;
//!
//! let store = Arc::new(DatabaseStore::new());
//! store.load_from_path("qqwry.dat").expect("Failed to load database");
//! let locator = Locator::new(store);
//! ```
//!
//! 2. Query an address:
//! ```rust,ignore
//! match locator.query("1.1.1.1") {
//!     Ok(location) => println!("{} / {}", location.city, location.isp),
//!     Err(e) => println!("lookup failed: {e}"),
//! }
//! ```
//!
//! ## Error Handling
//! - `NotLoaded`: a query was issued before any database was loaded.
//! - `Io`: the database or configuration file could not be read.
//! - `InvalidAddress`: the input is not an IPv4 literal (IPv6 included).
//! - `AddressNotFound`: no range in the index covers the address.
//! - `Json`: a configuration document or JSON output could not be (de)serialized.
//!
//! Malformed records never produce an error; they resolve to truncated or empty strings.
//!
//! # 纯真 QQWry 解析库
//!
//! 这是一个用于解析和查询 QQWry 格式（`qqwry.dat`）IPv4 地理位置数据库的 Rust 库。
//!
//! ## 功能
//! - 将 IPv4 地址解析为城市与运营商。
//! - 对 7 字节范围索引进行二分查找，完整支持记录重定向模式。
//! - 对所有字符串进行 GB18030/GBK 解码。
//! - 只加载一次的不可变数据库存储，可在线程间安全共享。
//! - 可选的过期结果缓存与 mmap 加载（`mmap` feature）。
//! - 将请求的客户端地址映射为两个可配置的请求头。
//!
//! ## 错误处理
//! - `NotLoaded`: 尚未加载数据库就发起查询。
//! - `Io`: 数据库或配置文件读取失败。
//! - `InvalidAddress`: 输入不是 IPv4 地址（包括 IPv6）。
//! - `AddressNotFound`: 索引中没有覆盖该地址的范围。
//! - `Json`: 配置文档或 JSON 输出的序列化失败。
//!
//! ## 注意事项
//! - 数据库文件没有魔数或版本字段，格式正确性仅依赖约定。
//! - 记录格式错误时不会报错，而是返回截断或空字符串。

use std::net::Ipv4Addr;

pub mod cache;
pub mod common;
pub mod config;
pub mod headers;
pub mod index;
pub mod locator;
pub mod record;
pub mod store;

pub use cache::{CacheStats, CachedLocator};
pub use common::Location;
pub use config::LocatorConfig;
pub use headers::HeaderNames;
pub use locator::Locator;
pub use store::{DatabaseStore, LoadStatus};

/// Errors returned by database loading and queries.
#[derive(Debug, thiserror::Error)]
pub enum QqwryError {
    #[error("No database has been loaded")]
    NotLoaded,
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid IPv4 address: {0}")]
    InvalidAddress(String),
    #[error("Address not found: {0}")]
    AddressNotFound(Ipv4Addr),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, QqwryError>;
