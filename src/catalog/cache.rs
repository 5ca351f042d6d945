//! Memoization of parsed reference tables.
//!
//! Two layers:
//! - an in-memory memo keyed by (path, include_eplets), rebuilt whenever the md5 digest
//!   of the source bytes changes
//! - an optional on-disk `bincode` cache, checked against the same digest
//!
//! All file access goes through [`FileSystem`] so tests can swap in an in-memory double.

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::catalog::metadata::EpletMetadata;
use crate::catalog::store::{DatabaseError, ReferenceTable};
use crate::core::types::Locus;
use crate::parsing::reference::{parse_metadata, parse_reference_table};

/// File access used by the cache
pub trait FileSystem: Send + Sync {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

/// The real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TableKey {
    path: PathBuf,
    include_eplets: bool,
}

struct Memo<T> {
    /// md5 of the source bytes `value` was parsed from
    source_md5: String,
    value: Arc<T>,
}

/// On-disk cache entry
#[derive(Serialize, Deserialize)]
struct DiskEntry<T> {
    /// md5 of the source file the value was parsed from
    source_md5: String,
    created_at: String,
    value: T,
}

type MemoMap<K, T> = RwLock<HashMap<K, Memo<T>>>;

pub struct TableCache<F: FileSystem = OsFileSystem> {
    fs: F,
    disk_dir: Option<PathBuf>,
    tables: MemoMap<TableKey, ReferenceTable>,
    metadata: MemoMap<PathBuf, EpletMetadata>,
}

impl TableCache<OsFileSystem> {
    pub fn new() -> Self {
        Self::with_filesystem(OsFileSystem)
    }
}

impl Default for TableCache<OsFileSystem> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FileSystem> TableCache<F> {
    pub fn with_filesystem(fs: F) -> Self {
        Self {
            fs,
            disk_dir: None,
            tables: RwLock::new(HashMap::new()),
            metadata: RwLock::new(HashMap::new()),
        }
    }

    /// Also persist parsed tables under `dir`
    #[must_use]
    pub fn with_disk_cache(mut self, dir: impl Into<PathBuf>) -> Self {
        self.disk_dir = Some(dir.into());
        self
    }

    pub fn filesystem(&self) -> &F {
        &self.fs
    }

    /// Number of tables and metadata tables held in memory
    pub fn len(&self) -> usize {
        self.tables.read().len() + self.metadata.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load a reference table, parsing it only if it is not memoized or its content has
    /// changed.
    ///
    /// # Errors
    ///
    /// Returns a `DatabaseError` if the file cannot be read or parsed.
    pub fn load_table(
        &self,
        path: &Path,
        locus: Locus,
        include_eplets: bool,
    ) -> Result<Arc<ReferenceTable>, DatabaseError> {
        let key = TableKey {
            path: path.to_path_buf(),
            include_eplets,
        };
        let disk_name = format!("{}_{}", file_stem(path), include_eplets);

        self.memoized(&self.tables, key, path, &disk_name, |bytes| {
            parse_reference_table(bytes, path, locus, include_eplets)
        })
    }

    /// Load the eplet metadata table.
    ///
    /// # Errors
    ///
    /// Returns a `DatabaseError` if the file cannot be read or parsed.
    pub fn load_metadata(&self, path: &Path) -> Result<Arc<EpletMetadata>, DatabaseError> {
        self.memoized(
            &self.metadata,
            path.to_path_buf(),
            path,
            &file_stem(path),
            |bytes| parse_metadata(bytes, path),
        )
    }

    fn memoized<K, T>(
        &self,
        memo: &MemoMap<K, T>,
        key: K,
        path: &Path,
        disk_name: &str,
        parse: impl FnOnce(&[u8]) -> Result<T, DatabaseError>,
    ) -> Result<Arc<T>, DatabaseError>
    where
        K: Eq + Hash,
        T: Serialize + DeserializeOwned,
    {
        let bytes = self.fs.read(path)?;
        let digest = format!("{:x}", md5::compute(&bytes));

        if let Some(hit) = memo.read().get(&key) {
            if hit.source_md5 == digest {
                return Ok(Arc::clone(&hit.value));
            }
            debug!("{} changed on disk, reloading", path.display());
        }

        let value = Arc::new(self.read_through(path, &bytes, &digest, disk_name, parse)?);
        memo.write().insert(
            key,
            Memo {
                source_md5: digest,
                value: Arc::clone(&value),
            },
        );
        Ok(value)
    }

    fn read_through<T>(
        &self,
        path: &Path,
        bytes: &[u8],
        digest: &str,
        disk_name: &str,
        parse: impl FnOnce(&[u8]) -> Result<T, DatabaseError>,
    ) -> Result<T, DatabaseError>
    where
        T: Serialize + DeserializeOwned,
    {
        let Some(dir) = &self.disk_dir else {
            return parse(bytes);
        };

        let cache_path = dir.join(format!("{disk_name}.bin"));

        if let Some(entry) = self.read_disk_entry::<T>(&cache_path, digest) {
            debug!(
                "Using cached {} for {} (created {})",
                cache_path.display(),
                path.display(),
                entry.created_at
            );
            return Ok(entry.value);
        }

        let value = parse(bytes)?;
        if let Err(e) = self.write_disk_entry(&cache_path, digest, &value) {
            warn!("Failed to write cache {}: {}", cache_path.display(), e);
        }
        Ok(value)
    }

    /// `None` when the entry is missing, unreadable or was built from other source bytes
    fn read_disk_entry<T: DeserializeOwned>(
        &self,
        cache_path: &Path,
        digest: &str,
    ) -> Option<DiskEntry<T>> {
        let bytes = self.fs.read(cache_path).ok()?;
        let entry: DiskEntry<T> = bincode::deserialize(&bytes).ok()?;
        (entry.source_md5 == digest).then_some(entry)
    }

    fn write_disk_entry<T: Serialize>(
        &self,
        cache_path: &Path,
        digest: &str,
        value: &T,
    ) -> Result<(), DatabaseError> {
        let entry = DiskEntry {
            source_md5: digest.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            value,
        };
        let bytes = bincode::serialize(&entry)?;
        self.fs.write(cache_path, &bytes)?;
        Ok(())
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| "table".to_string(), |s| s.to_string_lossy().into_owned())
}
