use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::{Result, Storage, StorageError};

/// A [Storage] implementation backed by a single JSON file.
///
/// The whole map is kept in memory and written through on every
/// mutation. A missing file is treated as an empty store so a fresh
/// deployment starts cleanly.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl JsonFileStorage {
    pub fn new<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref().to_path_buf();
        let entries = read_if_found(&path)?
            .map(|contents| {
                serde_json::from_str(&contents).map_err(|e| StorageError::Malformed {
                    key: path.display().to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn flush(&self, entries: &HashMap<String, String>) -> Result<()> {
        let parent = self.path.parent().filter(|p| !p.as_os_str().is_empty());

        if let Some(parent) = parent {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Internal(Box::new(e)))?;
        }

        let contents =
            serde_json::to_string_pretty(entries).map_err(|e| StorageError::Malformed {
                key: self.path.display().to_string(),
                reason: e.to_string(),
            })?;

        std::fs::write(&self.path, contents).map_err(|e| StorageError::Internal(Box::new(e)))
    }
}

fn read_if_found(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StorageError::Internal(Box::new(e))),
    }
}

impl Storage for JsonFileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock();

        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn clear(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock();

        entries.remove(key);
        self.flush(&entries)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("store.json")).unwrap();

        assert_eq!(storage.get("anything").unwrap(), None);
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        {
            let storage = JsonFileStorage::new(&path).unwrap();
            storage.set("key", "value").unwrap();
            storage.set("gone", "soon").unwrap();
            storage.clear("gone").unwrap();
        }

        let reopened = JsonFileStorage::new(&path).unwrap();
        assert_eq!(reopened.get("key").unwrap(), Some("value".to_string()));
        assert_eq!(reopened.get("gone").unwrap(), None);
    }
}
