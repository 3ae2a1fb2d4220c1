use crate::{CacheError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Minimal key/value contract the loader relies on.
///
/// A `ttl_seconds` of `0` means the value never expires. Implementations report
/// an unreachable backend as [`CacheError::Unavailable`]; callers are expected to
/// treat any error like a miss.
pub trait CacheStore: Send {
    fn get(&self, key: &str) -> Result<Option<Value>>;

    fn set(&self, key: &str, value: Value, ttl_seconds: u64) -> Result<()>;
}

impl<T: CacheStore + ?Sized> CacheStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Value, ttl_seconds: u64) -> Result<()> {
        (**self).set(key, value, ttl_seconds)
    }
}

impl<T: CacheStore + Sync + ?Sized> CacheStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Value, ttl_seconds: u64) -> Result<()> {
        (**self).set(key, value, ttl_seconds)
    }
}

/// Stored value plus the bookkeeping needed to expire it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    pub key: String,
    pub created_ms: u64,
    pub ttl_seconds: u64,
    pub data: Value,
}

impl Envelope {
    pub fn new(key: &str, data: Value, ttl_seconds: u64) -> Self {
        Self {
            key: key.to_string(),
            created_ms: unix_ms_now(),
            ttl_seconds,
            data,
        }
    }

    #[must_use]
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        if self.ttl_seconds == 0 {
            return false;
        }
        let ttl_ms = self.ttl_seconds.saturating_mul(1_000);
        now_ms.saturating_sub(self.created_ms) >= ttl_ms
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(unix_ms_now())
    }
}

/// Backend that is never reachable. Used when caching is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStore;

impl CacheStore for UnavailableStore {
    fn get(&self, _key: &str) -> Result<Option<Value>> {
        Err(CacheError::Unavailable("caching disabled".into()))
    }

    fn set(&self, _key: &str, _value: Value, _ttl_seconds: u64) -> Result<()> {
        Err(CacheError::Unavailable("caching disabled".into()))
    }
}

pub(crate) fn unix_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(created_ms: u64, ttl_seconds: u64) -> Envelope {
        Envelope {
            key: "k".into(),
            created_ms,
            ttl_seconds,
            data: json!(null),
        }
    }

    #[test]
    fn zero_ttl_never_expires() {
        assert!(!envelope(0, 0).is_expired_at(u64::MAX));
    }

    #[test]
    fn expires_once_ttl_elapsed() {
        let env = envelope(10_000, 5);
        assert!(!env.is_expired_at(14_999));
        assert!(env.is_expired_at(15_000));
    }

    #[test]
    fn unavailable_store_always_errors() {
        let store = UnavailableStore;
        assert!(matches!(store.get("x"), Err(CacheError::Unavailable(_))));
        assert!(matches!(
            store.set("x", json!(1), 0),
            Err(CacheError::Unavailable(_))
        ));
    }
}
