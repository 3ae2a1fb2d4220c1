use crate::{CacheError, CacheStore, FileStore, MemoryStore, Result, UnavailableStore};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Clone, Debug, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    File,
    Memory,
    Disabled,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,

    /// Directory for the file backend
    pub dir: PathBuf,

    /// Maximum entries kept by the memory backend
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::File,
            dir: PathBuf::from(".flexload/cache"),
            capacity: 32,
        }
    }
}

impl CacheConfig {
    pub fn memory(capacity: usize) -> Self {
        Self {
            backend: CacheBackend::Memory,
            capacity,
            ..Default::default()
        }
    }
}

pub fn parse_cache_backend(value: &str) -> Result<CacheBackend> {
    match value.trim().to_lowercase().as_str() {
        "file" => Ok(CacheBackend::File),
        "memory" => Ok(CacheBackend::Memory),
        "none" | "disabled" | "off" => Ok(CacheBackend::Disabled),
        other => Err(CacheError::InvalidBackend(other.to_string())),
    }
}

/// Build the configured backend. Construction never touches the filesystem;
/// the file backend creates its directory lazily on the first write.
pub fn open_store(cfg: &CacheConfig) -> Box<dyn CacheStore> {
    match cfg.backend {
        CacheBackend::File => Box::new(FileStore::new(&cfg.dir)),
        CacheBackend::Memory => Box::new(MemoryStore::new(cfg.capacity)),
        CacheBackend::Disabled => Box::new(UnavailableStore),
    }
}
