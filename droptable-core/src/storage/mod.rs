use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

mod file;
mod memory;

pub use file::*;
pub use memory::*;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    /// An unknown or internal error happened with the backing store
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
    /// A stored value could not be serialized or deserialized
    #[error("Malformed value under key {key}: {reason}")]
    Malformed { key: String, reason: String },
}

/// A persisted key-value store.
///
/// Every piece of durable state goes through this seam, so the backing
/// store can be swapped out without touching the components above it.
/// Reads and writes are synchronous and atomic per key.
pub trait Storage: Send + Sync + 'static {
    /// Returns the value under `key`, if any
    fn get(&self, key: &str) -> Result<Option<String>>;
    /// Sets the value under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Removes the value under `key`, if any
    fn clear(&self, key: &str) -> Result<()>;
}

/// JSON helpers layered on top of [Storage] to reduce boilerplate
pub trait StorageExt: Storage {
    fn get_json<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let raw = self.get(key)?;

        raw.map(|value| {
            serde_json::from_str(&value).map_err(|e| StorageError::Malformed {
                key: key.to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()
    }

    fn set_json<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        let raw = serde_json::to_string(value).map_err(|e| StorageError::Malformed {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        self.set(key, &raw)
    }
}

impl<S> StorageExt for S where S: Storage + ?Sized {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_json_roundtrip() {
        let storage = MemoryStorage::default();

        storage.set_json("numbers", &vec![1, 2, 3]).unwrap();

        let numbers: Option<Vec<i32>> = storage.get_json("numbers").unwrap();
        assert_eq!(numbers, Some(vec![1, 2, 3]));

        let absent: Option<Vec<i32>> = storage.get_json("nothing").unwrap();
        assert_eq!(absent, None);
    }

    #[test]
    fn test_malformed_value() {
        let storage = MemoryStorage::default();

        storage.set("broken", "not json").unwrap();

        let result: Result<Option<Vec<i32>>> = storage.get_json("broken");
        assert!(matches!(
            result,
            Err(StorageError::Malformed { key, .. }) if key == "broken"
        ));
    }
}
