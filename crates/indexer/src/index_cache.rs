use crate::config::LoaderConfig;
use crate::extractor::{ExtractionReport, SymbolExtractor};
use crate::scanner::DirectoryScanner;
use crate::stats::CacheStats;
use flexload_cache::CacheStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Persisted scan result of one root.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub class_map: BTreeMap<String, PathBuf>,
    pub directories: Vec<PathBuf>,
    pub namespaces: BTreeMap<String, Vec<PathBuf>>,
}

/// Scan-or-cache front for a single root.
///
/// A cached entry is an immutable snapshot and may be stale; correcting it is
/// left to the resolver's forced rescans.
pub struct IndexCache {
    store: Box<dyn CacheStore>,
    scanner: DirectoryScanner,
    extractor: SymbolExtractor,
    prefix: String,
    ttl_seconds: u64,
    stats: CacheStats,
}

impl IndexCache {
    pub fn new(config: &LoaderConfig, store: Box<dyn CacheStore>) -> Self {
        Self {
            store,
            scanner: DirectoryScanner::new(config),
            extractor: SymbolExtractor::new(),
            prefix: config.cache_prefix.clone(),
            ttl_seconds: config.cache_ttl_seconds,
            stats: CacheStats::default(),
        }
    }

    pub fn key_for(&self, root: &Path) -> String {
        format!("{}:{}", self.prefix, root.display())
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Return the entry for `root`, from the cache unless `force_rescan` is
    /// set. Cache failures never propagate: an unreadable cache means a scan,
    /// an unwritable one means the fresh entry is returned unsaved.
    pub fn load(&mut self, root: &Path, force_rescan: bool) -> CacheEntry {
        let key = self.key_for(root);

        if !force_rescan {
            if let Some(entry) = self.read(&key) {
                self.stats.hits += 1;
                log::debug!("Cache hit for {}", root.display());
                return entry;
            }
            self.stats.misses += 1;
        }

        let (entry, report) = self.scan(root);
        log::info!(
            "Indexed {}: {} symbols from {} files ({} skipped){}",
            root.display(),
            entry.class_map.len(),
            report.files_scanned,
            report.files_skipped,
            if force_rescan { " [rescan]" } else { "" }
        );

        match serde_json::to_value(&entry) {
            Ok(value) => {
                if let Err(err) = self.store.set(&key, value, self.ttl_seconds) {
                    self.stats.errors += 1;
                    log::warn!("Failed to persist index for {}: {err}", root.display());
                }
            }
            Err(err) => {
                self.stats.errors += 1;
                log::warn!("Failed to serialize index for {}: {err}", root.display());
            }
        }

        entry
    }

    /// Scan without touching the cache.
    pub fn scan(&mut self, root: &Path) -> (CacheEntry, ExtractionReport) {
        self.stats.scans += 1;
        let outcome = self.scanner.scan(root);
        let extraction = self.extractor.extract(&outcome.files, root);
        let entry = CacheEntry {
            class_map: extraction.class_map,
            directories: outcome.directories,
            namespaces: extraction.namespaces,
        };
        (entry, extraction.report)
    }

    fn read(&mut self, key: &str) -> Option<CacheEntry> {
        let value = match self.store.get(key) {
            Ok(Some(value)) => value,
            Ok(None) => return None,
            Err(err) => {
                self.stats.errors += 1;
                log::warn!("Cache unavailable, scanning instead: {err}");
                return None;
            }
        };
        match serde_json::from_value::<CacheEntry>(value) {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::warn!("Ignoring malformed cache entry {key}: {err}");
                None
            }
        }
    }
}
