use crate::resolver::{Registration, Resolution, Resolver};
use crate::stats::ResolveStats;
use crate::symbol::Symbol;
use crate::{LoaderError, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Thread-safe handle to one [`Resolver`].
///
/// Resolution interleaves reads and writes across every registry map, so the
/// whole resolver sits behind a single lock.
#[derive(Clone)]
pub struct SharedResolver {
    inner: Arc<Mutex<Resolver>>,
}

impl SharedResolver {
    pub fn new(resolver: Resolver) -> Self {
        Self {
            inner: Arc::new(Mutex::new(resolver)),
        }
    }

    pub fn register(
        &self,
        path: impl AsRef<Path>,
        depth_hint: usize,
        add_to_search_path: bool,
    ) -> Result<Registration> {
        self.lock()?.register(path, depth_hint, add_to_search_path)
    }

    pub fn resolve(&self, symbol: &Symbol) -> Result<Resolution> {
        Ok(self.lock()?.resolve(symbol))
    }

    pub fn resolve_name(&self, raw: &str) -> Result<Resolution> {
        self.lock()?.resolve_name(raw)
    }

    pub fn stats(&self) -> Result<ResolveStats> {
        Ok(self.lock()?.stats())
    }

    pub fn search_path(&self) -> Result<Vec<PathBuf>> {
        Ok(self.lock()?.registry().search_path().entries().to_vec())
    }

    /// Run `f` with exclusive access to the resolver.
    pub fn with<T>(&self, f: impl FnOnce(&mut Resolver) -> T) -> Result<T> {
        let mut guard = self.lock()?;
        Ok(f(&mut guard))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Resolver>> {
        self.inner.lock().map_err(|_| LoaderError::LockPoisoned)
    }
}
