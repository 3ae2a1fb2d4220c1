use crate::config::CURRENT_DIR_SENTINEL;
use crate::index_cache::CacheEntry;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Ordered search path with the working-directory sentinel kept in front of
/// registered roots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    entries: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new(entries: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut path = Self::default();
        for entry in entries {
            if !path.contains(&entry) {
                path.entries.push(entry);
            }
        }
        path
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.iter().any(|entry| entry == path)
    }

    /// Insert right after the `.` sentinel, or at the front when there is
    /// none. Returns `false` if `path` was already present.
    pub fn insert(&mut self, path: &Path) -> bool {
        if self.contains(path) {
            return false;
        }
        let position = self
            .entries
            .iter()
            .position(|entry| entry.as_os_str() == CURRENT_DIR_SENTINEL)
            .map_or(0, |sentinel| sentinel + 1);
        self.entries.insert(position, path.to_path_buf());
        true
    }
}

/// Everything the resolver knows: class map, namespace map, registered roots,
/// directories already force-rescanned, and the search path.
///
/// All collections only grow. Entries are overwritten, never pruned.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    class_map: BTreeMap<String, PathBuf>,
    namespaces: BTreeMap<String, Vec<PathBuf>>,
    roots: Vec<PathBuf>,
    root_set: HashSet<PathBuf>,
    rescanned: HashSet<PathBuf>,
    search_path: SearchPath,
}

impl Registry {
    pub fn new(search_path: SearchPath) -> Self {
        Self {
            search_path,
            ..Default::default()
        }
    }

    pub fn class_map(&self) -> &BTreeMap<String, PathBuf> {
        &self.class_map
    }

    pub fn class_path(&self, key: &str) -> Option<&Path> {
        self.class_map.get(key).map(PathBuf::as_path)
    }

    pub fn namespaces(&self) -> &BTreeMap<String, Vec<PathBuf>> {
        &self.namespaces
    }

    pub fn namespace_dirs(&self, prefix: &str) -> &[PathBuf] {
        self.namespaces.get(prefix).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn is_root(&self, path: &Path) -> bool {
        self.root_set.contains(path)
    }

    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    pub fn search_path_mut(&mut self) -> &mut SearchPath {
        &mut self.search_path
    }

    pub fn was_rescanned(&self, dir: &Path) -> bool {
        self.rescanned.contains(dir)
    }

    pub fn rescanned_count(&self) -> usize {
        self.rescanned.len()
    }

    /// Record a forced rescan of `dir`. Returns `false` if it was already
    /// rescanned.
    pub fn mark_rescanned(&mut self, dir: &Path) -> bool {
        self.rescanned.insert(dir.to_path_buf())
    }

    /// Returns `false` if `path` was already a root.
    pub fn add_root(&mut self, path: &Path) -> bool {
        if !self.root_set.insert(path.to_path_buf()) {
            return false;
        }
        self.roots.push(path.to_path_buf());
        true
    }

    /// Explicit mapping, same last-write-wins rule as scanned entries.
    pub fn insert_mapping(&mut self, key: impl Into<String>, path: impl Into<PathBuf>) {
        self.class_map.insert(key.into(), path.into());
    }

    pub fn add_namespace_dir(&mut self, prefix: &str, dir: &Path) -> bool {
        let dirs = self.namespaces.entry(prefix.to_string()).or_default();
        if dirs.iter().any(|known| known == dir) {
            return false;
        }
        dirs.push(dir.to_path_buf());
        true
    }

    /// Fold a scan result into the registry.
    pub fn merge(&mut self, entry: CacheEntry) {
        self.class_map.extend(entry.class_map);
        for (prefix, dirs) in entry.namespaces {
            for dir in dirs {
                self.add_namespace_dir(&prefix, &dir);
            }
        }
        for dir in entry.directories {
            self.add_root(&dir);
        }
    }
}
