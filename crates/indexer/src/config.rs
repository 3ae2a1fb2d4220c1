use crate::{LoaderError, Result};
use flexload_cache::CacheConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_CACHE_PREFIX: &str = "FLEXLOAD_CACHE_PREFIX";
const ENV_CACHE_TTL: &str = "FLEXLOAD_CACHE_TTL";
const ENV_EXTENSIONS: &str = "FLEXLOAD_EXTENSIONS";
const ENV_EXCLUDE: &str = "FLEXLOAD_EXCLUDE";

/// Search path entry standing for the working directory.
pub const CURRENT_DIR_SENTINEL: &str = ".";

/// Configuration for discovery, caching and resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// File extensions (without the dot) treated as source files
    pub extensions: Vec<String>,

    /// Directory names that are never descended into
    pub excluded_dirs: Vec<String>,

    /// Directories whose name starts with this marker are skipped
    pub hidden_prefix: String,

    /// Prefix of persisted cache keys (`prefix:root`)
    pub cache_prefix: String,

    /// TTL of persisted scan results in seconds, 0 = never expires
    pub cache_ttl_seconds: u64,

    /// Follow symbolic links while scanning. There is no cycle protection.
    pub follow_links: bool,

    /// Files larger than this are not read (0 = unlimited)
    pub max_file_bytes: u64,

    /// Initial search path; registered roots are inserted after the `.` entry
    pub search_path: Vec<PathBuf>,

    pub cache: CacheConfig,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["src".to_string()],
            excluded_dirs: DEFAULT_EXCLUDED_DIRS
                .iter()
                .map(|name| name.to_string())
                .collect(),
            hidden_prefix: ".".to_string(),
            cache_prefix: "flexload".to_string(),
            cache_ttl_seconds: 0,
            follow_links: false,
            max_file_bytes: 0,
            search_path: vec![PathBuf::from(CURRENT_DIR_SENTINEL)],
            cache: CacheConfig::default(),
        }
    }
}

impl LoaderConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|err| LoaderError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            LoaderError::InvalidConfig(format!("read {}: {err}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Apply `FLEXLOAD_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|name| std::env::var(name).ok())
    }

    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(prefix) = lookup(ENV_CACHE_PREFIX) {
            self.cache_prefix = prefix.trim().to_string();
        }
        if let Some(ttl) = lookup(ENV_CACHE_TTL) {
            self.cache_ttl_seconds = ttl.trim().parse().map_err(|err| {
                LoaderError::InvalidConfig(format!("{ENV_CACHE_TTL}={ttl}: {err}"))
            })?;
        }
        if let Some(extensions) = lookup(ENV_EXTENSIONS) {
            self.extensions = split_list(&extensions);
        }
        if let Some(exclude) = lookup(ENV_EXCLUDE) {
            for name in split_list(&exclude) {
                if !self.excluded_dirs.contains(&name) {
                    self.excluded_dirs.push(name);
                }
            }
        }
        self.validate()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.extensions.iter().all(|ext| normalize_extension(ext).is_empty()) {
            return Err(LoaderError::InvalidConfig(
                "at least one source extension is required".into(),
            ));
        }
        if self.cache_prefix.is_empty() {
            return Err(LoaderError::InvalidConfig("cache_prefix must not be empty".into()));
        }
        if self.cache_prefix.contains(':') {
            return Err(LoaderError::InvalidConfig(format!(
                "cache_prefix must not contain ':' (got {})",
                self.cache_prefix
            )));
        }
        Ok(())
    }
}

pub(crate) fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_string()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    // VCS
    ".git",
    ".hg",
    ".svn",
    // dependencies / builds
    "node_modules",
    "vendor",
    "target",
    "build",
    "dist",
    // scratch
    "tmp",
    "cache",
    "logs",
];
