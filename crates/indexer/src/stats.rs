use serde::{Deserialize, Serialize};

/// Counters kept by [`crate::IndexCache`]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheStats {
    /// Loads answered from the persisted cache
    pub hits: usize,

    /// Loads that found nothing usable in the cache
    pub misses: usize,

    /// Filesystem scans performed (misses plus forced rescans)
    pub scans: usize,

    /// Cache reads or writes that failed
    pub errors: usize,
}

/// Counters kept by [`crate::Resolver`]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolveStats {
    /// Resolutions answered from the class map
    pub memory_hits: usize,

    /// Resolutions that had to walk the namespace hierarchy
    pub misses: usize,

    /// Directories force-rescanned
    pub rescans: usize,

    /// Resolutions that ended without a path
    pub not_found: usize,
}
