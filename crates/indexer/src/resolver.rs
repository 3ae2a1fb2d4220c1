use crate::config::LoaderConfig;
use crate::index_cache::IndexCache;
use crate::registry::{Registry, SearchPath};
use crate::stats::ResolveStats;
use crate::symbol::{join_segments, Symbol};
use crate::{LoaderError, Result};
use flexload_cache::{open_store, CacheStore};
use std::path::{Path, PathBuf};

/// Answer to a resolution request. `NotFound` is an expected outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Resolution {
    Resolved(PathBuf),
    NotFound,
}

impl Resolution {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Resolution::Resolved(path) => Some(path),
            Resolution::NotFound => None,
        }
    }

    pub fn into_path(self) -> Option<PathBuf> {
        match self {
            Resolution::Resolved(path) => Some(path),
            Resolution::NotFound => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// Root was new and has been indexed
    Indexed { root: PathBuf, symbols: usize },

    /// Root (or an ancestor scan that covered it) was already known
    AlreadyRegistered { root: PathBuf },
}

impl Registration {
    pub fn root(&self) -> &Path {
        match self {
            Registration::Indexed { root, .. } | Registration::AlreadyRegistered { root } => root,
        }
    }
}

/// Host side of a load: materializes the symbol from its resolved file.
pub trait HostLoader {
    fn load(&mut self, symbol: &Symbol, path: &Path) -> anyhow::Result<()>;
}

impl<F> HostLoader for F
where
    F: FnMut(&Symbol, &Path) -> anyhow::Result<()>,
{
    fn load(&mut self, symbol: &Symbol, path: &Path) -> anyhow::Result<()> {
        self(symbol, path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(PathBuf),
    Undefined,
}

/// Symbol resolver with miss-driven healing.
///
/// On a class-map miss the namespace of the requested symbol is walked from
/// the most to the least specific prefix, and every directory known for a
/// prefix is force-rescanned at most once per resolver lifetime.
pub struct Resolver {
    registry: Registry,
    index: IndexCache,
    stats: ResolveStats,
}

impl Resolver {
    pub fn new(config: &LoaderConfig, store: Box<dyn CacheStore>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            registry: Registry::new(SearchPath::new(config.search_path.iter().cloned())),
            index: IndexCache::new(config, store),
            stats: ResolveStats::default(),
        })
    }

    /// Build with the cache backend described by `config.cache`.
    pub fn from_config(config: &LoaderConfig) -> Result<Self> {
        Self::new(config, open_store(&config.cache))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn index_cache(&self) -> &IndexCache {
        &self.index
    }

    pub fn stats(&self) -> ResolveStats {
        self.stats
    }

    pub fn register_root(&mut self, path: impl AsRef<Path>) -> Result<Registration> {
        self.register(path, 0, true)
    }

    /// Register a root directory, ascending `depth_hint` parents first.
    ///
    /// Fails fast with [`LoaderError::RootNotADirectory`] when `path` is not
    /// an existing directory. Registering a known root is a no-op.
    pub fn register(
        &mut self,
        path: impl AsRef<Path>,
        depth_hint: usize,
        add_to_search_path: bool,
    ) -> Result<Registration> {
        let path = path.as_ref();
        let root = resolve_root(path, depth_hint)?;

        if !self.registry.add_root(&root) {
            log::debug!("Root {} already registered", root.display());
            return Ok(Registration::AlreadyRegistered { root });
        }
        if add_to_search_path {
            self.registry.search_path_mut().insert(&root);
        }

        let entry = self.index.load(&root, false);
        let symbols = entry.class_map.len();
        self.registry.merge(entry);
        log::info!("Registered {} ({symbols} symbols)", root.display());

        Ok(Registration::Indexed { root, symbols })
    }

    pub fn resolve_name(&mut self, raw: &str) -> Result<Resolution> {
        let symbol = Symbol::parse(raw)?;
        Ok(self.resolve(&symbol))
    }

    pub fn resolve(&mut self, symbol: &Symbol) -> Resolution {
        let key = symbol.key();
        if let Some(path) = self.lookup(&key) {
            self.stats.memory_hits += 1;
            return Resolution::Resolved(path);
        }
        self.stats.misses += 1;

        if let Some(stale) = self.registry.class_path(&key) {
            log::debug!("{key} maps to missing file {}, healing", stale.display());
        }

        for prefix in symbol.prefixes() {
            let prefix = join_segments(prefix);
            let dirs = self.registry.namespace_dirs(&prefix).to_vec();
            if dirs.is_empty() {
                continue;
            }

            for dir in dirs {
                if self.registry.was_rescanned(&dir) {
                    continue;
                }
                log::debug!("Rescanning {} for {key} (prefix {prefix})", dir.display());
                let entry = self.index.load(&dir, true);
                self.registry.merge(entry);
                self.registry.mark_rescanned(&dir);
                self.stats.rescans += 1;
            }

            if let Some(path) = self.lookup(&key) {
                return Resolution::Resolved(path);
            }
        }

        self.stats.not_found += 1;
        log::debug!("{key} not found");
        Resolution::NotFound
    }

    /// Resolve `symbol` and hand the file to `host`.
    pub fn load(&mut self, symbol: &Symbol, host: &mut dyn HostLoader) -> Result<LoadOutcome> {
        let Resolution::Resolved(path) = self.resolve(symbol) else {
            return Ok(LoadOutcome::Undefined);
        };
        host.load(symbol, &path)
            .map_err(|source| LoaderError::HostLoader {
                symbol: symbol.key(),
                source,
            })?;
        Ok(LoadOutcome::Loaded(path))
    }

    fn lookup(&self, key: &str) -> Option<PathBuf> {
        self.registry
            .class_path(key)
            .filter(|path| path.is_file())
            .map(Path::to_path_buf)
    }
}

fn resolve_root(path: &Path, depth_hint: usize) -> Result<PathBuf> {
    let canonical = match std::fs::canonicalize(path) {
        Ok(canonical) => canonical,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(LoaderError::RootNotADirectory(path.to_path_buf()));
        }
        Err(err) => return Err(err.into()),
    };
    if !canonical.is_dir() {
        return Err(LoaderError::RootNotADirectory(path.to_path_buf()));
    }

    let mut root = canonical.as_path();
    for _ in 0..depth_hint {
        match root.parent() {
            Some(parent) => root = parent,
            None => break,
        }
    }
    Ok(root.to_path_buf())
}
