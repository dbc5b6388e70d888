//! Expiring result cache in front of a [`Locator`].

use crate::{
    Locator, QqwryError, Result, common::Location, headers::HeaderNames, locator::parse_ipv4,
};
use quick_cache::sync::Cache;
use std::{
    net::Ipv4Addr,
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

/// Default number of cached addresses.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;
/// Default lifetime of a cached result.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    stored_at: Instant,
    /// `None` records a lookup that found no range.
    location: Option<Location>,
}

/// Hit and miss counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// A [`Locator`] that memoizes results per address for a fixed TTL.
///
/// Both found and not-found outcomes are cached. Unparseable input and
/// `NotLoaded` errors are never cached.
///
/// 带过期时间的查询结果缓存。
pub struct CachedLocator {
    locator: Locator,
    cache: Option<Cache<Ipv4Addr, CacheEntry>>,
    ttl: Duration,
    headers: HeaderNames,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CachedLocator {
    /// Wrap `locator` with the default capacity and TTL.
    pub fn new(locator: Locator) -> Self {
        Self::with_settings(locator, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL)
    }

    /// Wrap `locator`; a capacity of 0 disables caching.
    ///
    /// 指定容量与过期时间，容量为 0 时关闭缓存。
    pub fn with_settings(locator: Locator, capacity: usize, ttl: Duration) -> Self {
        let cache = (capacity > 0).then(|| Cache::new(capacity));
        Self {
            locator,
            cache,
            ttl,
            headers: HeaderNames::default(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Replace the header names used by [`CachedLocator::header_values`].
    pub fn with_headers(mut self, headers: HeaderNames) -> Self {
        self.headers = headers;
        self
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn headers(&self) -> &HeaderNames {
        &self.headers
    }

    /// Cached equivalent of [`Locator::query`].
    ///
    /// 带缓存的查询。
    pub fn query(&self, ip: &str) -> Result<Location> {
        let ip = parse_ipv4(ip)?;
        self.lookup(ip)
    }

    /// Cached equivalent of [`Locator::lookup`].
    pub fn lookup(&self, ip: Ipv4Addr) -> Result<Location> {
        let Some(cache) = &self.cache else {
            return self.locator.lookup(ip);
        };

        if let Some(entry) = cache.get(&ip) {
            if entry.stored_at.elapsed() < self.ttl {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return entry.location.ok_or(QqwryError::AddressNotFound(ip));
            }
            log::trace!("cache entry for {ip} expired");
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let location = match self.locator.lookup(ip) {
            Ok(location) => Some(location),
            Err(QqwryError::AddressNotFound(_)) => None,
            Err(e) => return Err(e),
        };
        cache.insert(
            ip,
            CacheEntry {
                stored_at: Instant::now(),
                location: location.clone(),
            },
        );
        location.ok_or(QqwryError::AddressNotFound(ip))
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    /// Number of cached entries, expired ones included.
    pub fn len(&self) -> usize {
        self.cache.as_ref().map_or(0, |c| c.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
