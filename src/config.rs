use crate::{
    CachedLocator, DatabaseStore, LoadStatus, Locator, Result,
    cache::{DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL},
    headers::HeaderNames,
};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

/// Settings for opening a database and caching its results.
///
/// 打开数据库与缓存结果的配置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Path of the `qqwry.dat` file.
    pub db_path: PathBuf,
    /// Memory-map the file instead of reading it (requires the `mmap` feature).
    pub mmap: bool,
    pub cache_enabled: bool,
    pub cache_capacity: usize,
    pub cache_ttl_secs: u64,
    /// Header names receiving the city and ISP.
    pub headers: HeaderNames,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("qqwry.dat"),
            mmap: false,
            cache_enabled: true,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_ttl_secs: DEFAULT_CACHE_TTL.as_secs(),
            headers: HeaderNames::default(),
        }
    }
}

impl LocatorConfig {
    /// Parse a JSON document; missing fields take their defaults.
    ///
    /// 解析 JSON 配置，缺省字段使用默认值。
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    fn effective_capacity(&self) -> usize {
        if self.cache_enabled {
            self.cache_capacity
        } else {
            0
        }
    }

    /// Load `db_path` into `store` honouring the `mmap` setting.
    pub fn load_into(&self, store: &DatabaseStore) -> Result<LoadStatus> {
        if self.mmap {
            #[cfg(feature = "mmap")]
            {
                return store.load_mmap(&self.db_path);
            }
            #[cfg(not(feature = "mmap"))]
            {
                log::warn!("mmap requested without the `mmap` feature, reading into memory");
            }
        }
        store.load_from_path(&self.db_path)
    }
}

impl CachedLocator {
    /// Load the configured database and wrap it in a cache.
    ///
    /// 按配置加载数据库并创建带缓存的查询器。
    pub fn from_config(config: &LocatorConfig) -> Result<Self> {
        let store = Arc::new(DatabaseStore::new());
        config.load_into(&store)?;
        Ok(Self::with_settings(
            Locator::new(store),
            config.effective_capacity(),
            config.cache_ttl(),
        )
        .with_headers(config.headers.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QqwryError;

    #[test]
    fn defaults_fill_missing_fields() {
        let config = LocatorConfig::from_json_str(r#"{"db_path": "/data/qqwry.dat"}"#).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/data/qqwry.dat"));
        assert!(config.cache_enabled);
        assert_eq!(config.cache_capacity, DEFAULT_CACHE_CAPACITY);
        assert_eq!(config.cache_ttl(), Duration::from_secs(1800));
        assert_eq!(config.headers.city, "X-QQWry-City");
        assert_eq!(config.headers.isp, "X-QQWry-ISP");

        let config = LocatorConfig::from_json_str("{}").unwrap();
        assert_eq!(config, LocatorConfig::default());
    }

    #[test]
    fn disabled_cache_has_no_capacity() {
        let config =
            LocatorConfig::from_json_str(r#"{"cache_enabled": false, "cache_capacity": 5}"#)
                .unwrap();
        assert_eq!(config.effective_capacity(), 0);
    }

    #[test]
    fn malformed_json_is_json_error() {
        let err = LocatorConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, QqwryError::Json(_)));
    }

    #[test]
    fn missing_database_is_io_error() {
        let config = LocatorConfig {
            db_path: PathBuf::from("/definitely/not/here/qqwry.dat"),
            ..LocatorConfig::default()
        };
        assert!(matches!(
            CachedLocator::from_config(&config),
            Err(QqwryError::Io(_))
        ));
    }
}
