use crate::config::{normalize_extension, LoaderConfig};
use ignore::{DirEntry, WalkBuilder};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Files and directories found under one root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    pub files: Vec<PathBuf>,

    /// Directories directly containing a source file, plus the root itself
    pub directories: Vec<PathBuf>,
}

/// Scanner for finding source files below a root
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    extensions: Vec<String>,
    excluded: Arc<HashSet<String>>,
    hidden_prefix: Arc<str>,
    follow_links: bool,
    max_file_bytes: u64,
}

impl DirectoryScanner {
    pub fn new(config: &LoaderConfig) -> Self {
        Self {
            extensions: config
                .extensions
                .iter()
                .map(|ext| normalize_extension(ext))
                .filter(|ext| !ext.is_empty())
                .collect(),
            excluded: Arc::new(config.excluded_dirs.iter().cloned().collect()),
            hidden_prefix: Arc::from(config.hidden_prefix.as_str()),
            follow_links: config.follow_links,
            max_file_bytes: config.max_file_bytes,
        }
    }

    /// Walk `root` recursively. Excluded and hidden subdirectories are not
    /// descended into; the root itself is always walked.
    pub fn scan(&self, root: &Path) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();
        if root.is_dir() {
            outcome.directories.push(root.to_path_buf());
        } else {
            log::debug!("Scan root {} is not a directory", root.display());
            return outcome;
        }

        let excluded = Arc::clone(&self.excluded);
        let hidden_prefix = Arc::clone(&self.hidden_prefix);
        let mut builder = WalkBuilder::new(root);
        builder
            .standard_filters(false)
            .follow_links(self.follow_links)
            .sort_by_file_name(|a, b| a.cmp(b));
        builder.filter_entry(move |entry| !Self::is_skipped_dir(entry, &excluded, &hidden_prefix));

        let mut seen_dirs: HashSet<PathBuf> = HashSet::from([root.to_path_buf()]);
        for result in builder.build() {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    log::warn!("Failed to read entry: {err}");
                    continue;
                }
            };
            let Some(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_file() {
                continue;
            }

            let path = entry.path();
            if !self.is_source_file(path) {
                continue;
            }

            if self.max_file_bytes > 0 {
                if let Ok(meta) = entry.metadata() {
                    if meta.len() > self.max_file_bytes {
                        log::debug!(
                            "Skipping large file {} ({} bytes > {})",
                            path.display(),
                            meta.len(),
                            self.max_file_bytes
                        );
                        continue;
                    }
                }
            }

            if let Some(parent) = path.parent() {
                if seen_dirs.insert(parent.to_path_buf()) {
                    outcome.directories.push(parent.to_path_buf());
                }
            }
            outcome.files.push(path.to_path_buf());
        }

        log::debug!(
            "Found {} source files in {} directories under {}",
            outcome.files.len(),
            outcome.directories.len(),
            root.display()
        );
        outcome
    }

    fn is_source_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|candidate| candidate == ext))
    }

    fn is_skipped_dir(entry: &DirEntry, excluded: &HashSet<String>, hidden_prefix: &str) -> bool {
        if entry.depth() == 0 {
            return false;
        }
        if !entry.file_type().is_some_and(|ft| ft.is_dir()) {
            return false;
        }
        let Some(name) = entry.file_name().to_str() else {
            return false;
        };
        excluded.contains(name) || (!hidden_prefix.is_empty() && name.starts_with(hidden_prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn scanner() -> DirectoryScanner {
        DirectoryScanner::new(&LoaderConfig::default())
    }

    #[test]
    fn collects_source_files_and_their_directories() {
        let temp = tempdir().unwrap();
        let root = temp.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("Models/Nested")).unwrap();
        fs::create_dir_all(root.join("Empty")).unwrap();
        fs::write(root.join("Models/User.src"), "class User {}").unwrap();
        fs::write(root.join("Models/Nested/Deep.src"), "class Deep {}").unwrap();
        fs::write(root.join("Models/readme.md"), "# notes").unwrap();

        let outcome = scanner().scan(&root);

        let mut files = outcome.files.clone();
        files.sort();
        assert_eq!(
            files,
            vec![
                root.join("Models/Nested/Deep.src"),
                root.join("Models/User.src")
            ]
        );
        let mut dirs = outcome.directories.clone();
        dirs.sort();
        assert_eq!(
            dirs,
            vec![root.clone(), root.join("Models"), root.join("Models/Nested")]
        );
        assert_eq!(outcome.directories[0], root);
    }

    #[test]
    fn empty_root_is_still_listed() {
        let temp = tempdir().unwrap();
        let outcome = scanner().scan(temp.path());
        assert!(outcome.files.is_empty());
        assert_eq!(outcome.directories, vec![temp.path().to_path_buf()]);
    }

    #[test]
    fn skips_excluded_and_hidden_directories() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        for dir in ["vendor/lib", ".hidden", "src", "vendored"] {
            fs::create_dir_all(root.join(dir)).unwrap();
        }
        fs::write(root.join("vendor/lib/Dep.src"), "class Dep {}").unwrap();
        fs::write(root.join(".hidden/Secret.src"), "class Secret {}").unwrap();
        fs::write(root.join("src/App.src"), "class App {}").unwrap();
        fs::write(root.join("vendored/Kept.src"), "class Kept {}").unwrap();
        fs::write(root.join(".dotfile.src"), "class Dotfile {}").unwrap();

        let outcome = scanner().scan(root);
        let mut names: Vec<String> = outcome
            .files
            .iter()
            .filter_map(|p| p.file_name()?.to_str().map(str::to_string))
            .collect();
        names.sort();
        assert_eq!(names, vec![".dotfile.src", "App.src", "Kept.src"]);
    }

    #[test]
    fn hidden_root_is_still_scanned() {
        let temp = tempdir().unwrap();
        let root = temp.path().join(".config");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("Cfg.src"), "class Cfg {}").unwrap();

        let outcome = scanner().scan(&root);
        assert_eq!(outcome.files, vec![root.join("Cfg.src")]);
    }

    #[test]
    fn respects_extension_filter_and_size_limit() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        fs::write(root.join("a.php"), "class A {}").unwrap();
        fs::write(root.join("b.src"), "class B {}").unwrap();
        fs::write(root.join("big.php"), vec![b' '; 64]).unwrap();

        let mut config = LoaderConfig::default().with_extensions([".php"]);
        let unlimited = DirectoryScanner::new(&config).scan(root);
        assert_eq!(unlimited.files, vec![root.join("a.php"), root.join("big.php")]);

        config.max_file_bytes = 32;
        let outcome = DirectoryScanner::new(&config).scan(root);
        assert_eq!(outcome.files, vec![root.join("a.php")]);
    }

    #[test]
    fn missing_root_yields_nothing() {
        let temp = tempdir().unwrap();
        let outcome = scanner().scan(&temp.path().join("gone"));
        assert_eq!(outcome, ScanOutcome::default());
    }
}
