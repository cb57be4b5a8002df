use std::collections::HashMap;

use parking_lot::RwLock;

use super::{Result, Storage};

/// An in-memory [Storage] implementation.
///
/// State lives for the lifetime of the process, which is exactly the
/// page-lifetime model the storefront was designed around. Also used by
/// tests so they never need a real backing file.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());

        Ok(())
    }

    fn clear(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_set_get_clear() {
        let storage = MemoryStorage::default();

        assert_eq!(storage.get("key").unwrap(), None);

        storage.set("key", "value").unwrap();
        assert_eq!(storage.get("key").unwrap(), Some("value".to_string()));

        storage.set("key", "other").unwrap();
        assert_eq!(storage.get("key").unwrap(), Some("other".to_string()));

        storage.clear("key").unwrap();
        assert_eq!(storage.get("key").unwrap(), None);
    }
}
