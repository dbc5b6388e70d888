use crate::{QqwryError, Result};
#[cfg(feature = "mmap")]
use memmap2::Mmap;
use once_cell::sync::OnceCell;
use std::{fs, ops::Deref, path::Path};

/// Database bytes, backed by a `Vec<u8>` or, with the `mmap` feature, a
/// memory-mapped file.
#[derive(Debug)]
enum DbBytes {
    Vec(Vec<u8>),
    #[cfg(feature = "mmap")]
    Mmap(Mmap),
}

impl Deref for DbBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        match self {
            DbBytes::Vec(v) => v.as_slice(),
            #[cfg(feature = "mmap")]
            DbBytes::Mmap(m) => m,
        }
    }
}

/// Outcome of a load call.
///
/// 加载调用的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// This call installed the buffer.
    Loaded,
    /// A buffer was already installed; the call changed nothing.
    AlreadyLoaded,
}

/// Immutable, load-once holder of the QQWry database buffer.
///
/// The first successful load wins; later loads are ignored and report
/// [`LoadStatus::AlreadyLoaded`]. After loading the buffer is never mutated,
/// so a shared `DatabaseStore` can serve concurrent queries without locking.
///
/// 只加载一次的不可变数据库缓冲区。首次加载生效，之后的加载被忽略。
#[derive(Debug, Default)]
pub struct DatabaseStore {
    bytes: OnceCell<DbBytes>,
}

impl DatabaseStore {
    /// Create an empty store.
    ///
    /// 创建一个空的存储。
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `data` as the database buffer if nothing is loaded yet.
    ///
    /// 若尚未加载，则将 `data` 设为数据库缓冲区。
    pub fn load(&self, data: Vec<u8>) -> LoadStatus {
        self.install(DbBytes::Vec(data))
    }

    /// Read the whole file at `path` and load it.
    ///
    /// Once a buffer is installed the file is not touched again.
    ///
    /// 读取文件全部内容并加载。
    pub fn load_from_path<P: AsRef<Path>>(&self, path: P) -> Result<LoadStatus> {
        if self.is_loaded() {
            log::warn!(
                "database already loaded, ignoring {}",
                path.as_ref().display()
            );
            return Ok(LoadStatus::AlreadyLoaded);
        }
        let data = fs::read(path.as_ref())?;
        log::info!(
            "read {} bytes from {}",
            data.len(),
            path.as_ref().display()
        );
        Ok(self.load(data))
    }

    /// Memory-map the file at `path` and load it.
    ///
    /// 使用内存映射加载数据库文件。
    #[cfg(feature = "mmap")]
    pub fn load_mmap<P: AsRef<Path>>(&self, path: P) -> Result<LoadStatus> {
        if self.is_loaded() {
            log::warn!(
                "database already loaded, ignoring {}",
                path.as_ref().display()
            );
            return Ok(LoadStatus::AlreadyLoaded);
        }
        let file = fs::File::open(path.as_ref())?;
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(self.install(DbBytes::Mmap(mmap)))
    }

    fn install(&self, bytes: DbBytes) -> LoadStatus {
        let len = bytes.len();
        if len > u32::MAX as usize {
            log::warn!("database of {len} bytes exceeds the 32-bit offset range");
        }
        let mut installed = false;
        self.bytes.get_or_init(|| {
            installed = true;
            bytes
        });
        if installed {
            log::info!("loaded database ({len} bytes)");
            LoadStatus::Loaded
        } else {
            log::warn!("database already loaded, ignoring {len} new bytes");
            LoadStatus::AlreadyLoaded
        }
    }

    /// Returns true once a buffer has been installed.
    pub fn is_loaded(&self) -> bool {
        self.bytes.get().is_some()
    }

    /// Length of the loaded buffer, 0 before loading.
    pub fn len(&self) -> usize {
        self.bytes.get().map_or(0, |b| b.len())
    }

    /// Returns true when nothing is loaded or the loaded buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the loaded buffer.
    ///
    /// 借用已加载的缓冲区，未加载时返回 `NotLoaded`。
    pub fn bytes(&self) -> Result<&[u8]> {
        self.bytes
            .get()
            .map(|b| &**b)
            .ok_or(QqwryError::NotLoaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, thread};

    #[test]
    fn bytes_before_load_is_not_loaded() {
        let store = DatabaseStore::new();
        assert!(!store.is_loaded());
        assert!(store.is_empty());
        assert!(matches!(store.bytes(), Err(QqwryError::NotLoaded)));
    }

    #[test]
    fn second_load_is_ignored() {
        let store = DatabaseStore::new();
        assert_eq!(store.load(vec![1, 2, 3]), LoadStatus::Loaded);
        assert_eq!(store.load(vec![9; 16]), LoadStatus::AlreadyLoaded);
        assert_eq!(store.bytes().unwrap(), &[1, 2, 3]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn load_from_missing_path_is_io_error() {
        let store = DatabaseStore::new();
        let err = store
            .load_from_path("/definitely/not/here/qqwry.dat")
            .unwrap_err();
        assert!(matches!(err, QqwryError::Io(_)));
        assert!(!store.is_loaded());
    }

    #[test]
    fn load_from_path_after_load_skips_file() {
        let store = DatabaseStore::new();
        store.load(vec![7; 8]);
        let status = store
            .load_from_path("/definitely/not/here/qqwry.dat")
            .unwrap();
        assert_eq!(status, LoadStatus::AlreadyLoaded);
    }

    #[cfg(feature = "mmap")]
    #[test]
    fn load_mmap_maps_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[4, 3, 2, 1]).unwrap();
        file.flush().unwrap();

        let store = DatabaseStore::new();
        assert_eq!(store.load_mmap(file.path()).unwrap(), LoadStatus::Loaded);
        assert_eq!(store.bytes().unwrap(), &[4, 3, 2, 1]);
        assert_eq!(store.load(vec![0]), LoadStatus::AlreadyLoaded);
    }

    #[test]
    fn concurrent_loads_have_one_winner() {
        let store = Arc::new(DatabaseStore::new());
        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.load(vec![i; 4]))
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|s| *s == LoadStatus::Loaded)
            .count();
        assert_eq!(winners, 1);
        let bytes = store.bytes().unwrap();
        assert!(bytes.iter().all(|&b| b == bytes[0]));
    }
}
