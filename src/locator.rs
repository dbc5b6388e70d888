use crate::{
    DatabaseStore, QqwryError, Result,
    common::Location,
    index::{self, IndexHeader},
    record,
};
use std::{net::Ipv4Addr, sync::Arc};

/// Query facade over a shared [`DatabaseStore`].
///
/// 基于共享 [`DatabaseStore`] 的查询入口。
#[derive(Debug, Clone)]
pub struct Locator {
    store: Arc<DatabaseStore>,
}

impl Locator {
    pub fn new(store: Arc<DatabaseStore>) -> Self {
        Self { store }
    }

    /// Build a locator over a fresh store loaded with `data`.
    ///
    /// 使用内存字节构建查询器。
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let store = DatabaseStore::new();
        store.load(data);
        Self::new(Arc::new(store))
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<DatabaseStore> {
        &self.store
    }

    /// Parse `ip` as an IPv4 literal and look it up.
    ///
    /// # Errors
    /// - `InvalidAddress` if `ip` is not an IPv4 literal (IPv6 included).
    /// - `NotLoaded` if the store has no buffer yet.
    /// - `AddressNotFound` if no range covers the address.
    ///
    /// 解析 IPv4 字符串并查询。
    pub fn query(&self, ip: &str) -> Result<Location> {
        self.lookup(parse_ipv4(ip)?)
    }

    /// Look up an already parsed address.
    ///
    /// 查询已解析的 IPv4 地址。
    pub fn lookup(&self, ip: Ipv4Addr) -> Result<Location> {
        let data = self.store.bytes()?;
        let offset = index::search(data, u32::from(ip)).ok_or(QqwryError::AddressNotFound(ip))?;
        Ok(record::resolve(data, offset))
    }

    /// Query a small batch of addresses.
    ///
    /// 批量查询。
    pub fn query_many(&self, ips: &[&str]) -> Vec<Result<Location>> {
        ips.iter().map(|ip| self.query(ip)).collect()
    }

    /// Number of entries in the range index, 0 if the index is unusable.
    pub fn entry_count(&self) -> Result<u32> {
        let data = self.store.bytes()?;
        Ok(IndexHeader::parse(data).map_or(0, |h| h.entry_count()))
    }
}

/// Parse an IPv4 literal exactly as given; padding, IPv6 and anything else
/// are rejected.
pub(crate) fn parse_ipv4(ip: &str) -> Result<Ipv4Addr> {
    ip.parse::<Ipv4Addr>()
        .map_err(|_| QqwryError::InvalidAddress(ip.to_string()))
}
