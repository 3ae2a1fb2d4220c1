use crate::store::{unix_ms_now, CacheStore, Envelope};
use crate::{CacheError, Result};
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Directory of JSON envelopes, one file per key.
///
/// File names are derived from a blake3 hash of the key, so arbitrary keys
/// (including absolute paths) are safe. Every write goes through its own
/// temporary file and a rename, so a concurrent reader never sees a
/// half-written entry and concurrent writers never share a scratch file.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for_key(&self, key: &str) -> PathBuf {
        let digest = blake3::hash(key.as_bytes());
        self.dir.join(format!("{}.json", digest.to_hex()))
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|err| {
            CacheError::Unavailable(format!(
                "cannot create cache dir {}: {err}",
                self.dir.display()
            ))
        })
    }
}

impl CacheStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for_key(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let envelope: Envelope = match serde_json::from_slice(&bytes) {
            Ok(envelope) => envelope,
            Err(err) => {
                log::warn!("Cache entry corrupted {}: {err}", path.display());
                return Ok(None);
            }
        };

        if envelope.key != key {
            log::warn!("Cache key collision at {}", path.display());
            return Ok(None);
        }

        if envelope.is_expired_at(unix_ms_now()) {
            log::debug!("Cache entry expired: {key}");
            let _ = fs::remove_file(&path);
            return Ok(None);
        }

        Ok(Some(envelope.data))
    }

    fn set(&self, key: &str, value: Value, ttl_seconds: u64) -> Result<()> {
        self.ensure_dir()?;
        let path = self.path_for_key(key);
        let bytes = serde_json::to_vec_pretty(&Envelope::new(key, value, ttl_seconds))?;
        // uniquely named per writer; dropped (and deleted) on any failure
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&bytes)?;
        tmp.persist(&path).map_err(|err| err.error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn persists_between_instances() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("cache");

        FileStore::new(&dir)
            .set("flexload:/srv/app", json!({"a": "b"}), 0)
            .unwrap();

        let reopened = FileStore::new(&dir);
        assert_eq!(
            reopened.get("flexload:/srv/app").unwrap(),
            Some(json!({"a": "b"}))
        );
        assert_eq!(reopened.get("flexload:/srv/other").unwrap(), None);
    }

    #[test]
    fn corrupted_entry_reads_as_miss() {
        let temp = tempdir().unwrap();
        let store = FileStore::new(temp.path());
        fs::write(store.path_for_key("k"), b"{not json").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn expired_entry_is_removed() {
        let temp = tempdir().unwrap();
        let store = FileStore::new(temp.path());
        let stale = Envelope {
            key: "k".into(),
            created_ms: 1,
            ttl_seconds: 1,
            data: json!(true),
        };
        fs::write(store.path_for_key("k"), serde_json::to_vec(&stale).unwrap()).unwrap();

        assert_eq!(store.get("k").unwrap(), None);
        assert!(!store.path_for_key("k").exists());
    }

    #[test]
    fn concurrent_writers_leave_one_complete_entry() {
        let temp = tempdir().unwrap();
        let dir = temp.path().to_path_buf();

        let handles: Vec<_> = (0..8)
            .map(|writer| {
                let store = FileStore::new(&dir);
                std::thread::spawn(move || {
                    let payload = json!({ "writer": writer, "fill": "x".repeat(64 * 1024) });
                    store.set("shared", payload, 0).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let value = FileStore::new(&dir).get("shared").unwrap().expect("entry");
        assert!(value["writer"].as_u64().is_some_and(|writer| writer < 8));
        let leftovers: Vec<_> = fs::read_dir(&dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path() != FileStore::new(&dir).path_for_key("shared"))
            .collect();
        assert!(leftovers.is_empty(), "scratch files left behind: {leftovers:?}");
    }

    #[test]
    fn failed_persist_removes_scratch_file() {
        let temp = tempdir().unwrap();
        let store = FileStore::new(temp.path());
        // a directory squatting on the entry path makes the rename fail
        fs::create_dir_all(store.path_for_key("k").join("occupied")).unwrap();

        assert!(store.set("k", json!(1), 0).is_err());
        let names: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn unwritable_dir_reports_unavailable() {
        let temp = tempdir().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, b"file, not a dir").unwrap();

        let store = FileStore::new(blocker.join("cache"));
        assert!(matches!(
            store.set("k", json!(1), 0),
            Err(CacheError::Unavailable(_))
        ));
    }
}
