//! # Flexload Cache
//!
//! Opaque key/value storage for persisted scan results.
//!
//! The loader only needs `get`, `set` and a TTL, so every backend sits behind
//! [`CacheStore`]:
//!
//! ```text
//! CacheConfig
//!     │
//!     ├──> memory  (process-local, LRU bounded)
//!     ├──> file    (JSON envelopes in a directory, shared between processes)
//!     └──> none    (always unavailable; every load becomes a scan)
//! ```
//!
//! ## Example
//!
//! ```
//! use flexload_cache::{CacheStore, MemoryStore};
//! use serde_json::json;
//!
//! let store = MemoryStore::new(8);
//! store.set("flexload:/srv/app", json!({"k": 1}), 0).unwrap();
//! assert_eq!(store.get("flexload:/srv/app").unwrap(), Some(json!({"k": 1})));
//! ```

mod config;
mod error;
mod file;
mod memory;
mod store;

pub use config::{open_store, parse_cache_backend, CacheBackend, CacheConfig};
pub use error::{CacheError, Result};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::{CacheStore, Envelope, UnavailableStore};
