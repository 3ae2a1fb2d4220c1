use crate::store::{unix_ms_now, CacheStore, Envelope};
use crate::{CacheError, Result};
use lru::LruCache;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::sync::Mutex;

const DEFAULT_CAPACITY: usize = 32;

/// Process-local store. Least recently used entries are evicted once
/// `capacity` is reached; expired entries are dropped lazily on read.
pub struct MemoryStore {
    entries: Mutex<LruCache<String, Envelope>>,
}

impl MemoryStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .or(NonZeroUsize::new(DEFAULT_CAPACITY))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, LruCache<String, Envelope>>> {
        self.entries
            .lock()
            .map_err(|_| CacheError::Unavailable("memory cache lock poisoned".into()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut entries = self.lock()?;
        let expired = match entries.get(key) {
            None => return Ok(None),
            Some(envelope) => envelope.is_expired_at(unix_ms_now()),
        };
        if expired {
            entries.pop(key);
            log::debug!("Memory cache entry expired: {key}");
            return Ok(None);
        }
        Ok(entries.get(key).map(|envelope| envelope.data.clone()))
    }

    fn set(&self, key: &str, value: Value, ttl_seconds: u64) -> Result<()> {
        let mut entries = self.lock()?;
        let envelope = Envelope::new(key, value, ttl_seconds);
        if let Some((evicted, _)) = entries.push(key.to_string(), envelope) {
            if evicted != key {
                log::debug!("Memory cache evicted {evicted}");
            }
        }
        Ok(())
    }
}
