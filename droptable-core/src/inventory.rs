use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Item, PrimaryKey, Storage, StorageError, StorageExt};

const NEXT_ENTRY_ID_KEY: &str = "inventory:next_entry_id";

/// One owned instance of a catalog item.
///
/// The same catalog item can be drawn repeatedly, so each acquisition
/// gets its own entry id. Removal is keyed by that id, never by the
/// item id, which keeps duplicates safe to sell individually.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntry {
    pub entry_id: PrimaryKey,
    /// A snapshot of the item at the time it was drawn
    pub item: Item,
    pub acquired_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("entry:{entry_id} doesn't exist")]
    NotFound { entry_id: PrimaryKey },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub(crate) type Result<T> = std::result::Result<T, InventoryError>;

/// Per-user inventories in acquisition order
pub struct Inventories<S> {
    storage: Arc<S>,
    lock: Arc<Mutex<()>>,
}

impl<S> Clone for Inventories<S> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            lock: self.lock.clone(),
        }
    }
}

impl<S> Inventories<S>
where
    S: Storage,
{
    pub fn new(storage: &Arc<S>) -> Self {
        Self {
            storage: storage.clone(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn list(&self, steam_id: &str) -> Result<Vec<InventoryEntry>> {
        Ok(self
            .storage
            .get_json(&inventory_key(steam_id))?
            .unwrap_or_default())
    }

    /// Appends a drawn item, allocating a unique entry id
    pub fn append(&self, steam_id: &str, item: Item) -> Result<InventoryEntry> {
        let _guard = self.lock.lock();

        let entry = InventoryEntry {
            entry_id: self.allocate_entry_id()?,
            item,
            acquired_at: Utc::now(),
        };

        let mut entries = self.list(steam_id)?;
        entries.push(entry.clone());
        self.storage.set_json(&inventory_key(steam_id), &entries)?;

        Ok(entry)
    }

    /// Removes exactly the targeted entry and returns it
    pub fn remove(&self, steam_id: &str, entry_id: PrimaryKey) -> Result<InventoryEntry> {
        let _guard = self.lock.lock();

        let mut entries = self.list(steam_id)?;
        let position = entries
            .iter()
            .position(|e| e.entry_id == entry_id)
            .ok_or(InventoryError::NotFound { entry_id })?;

        let removed = entries.remove(position);
        self.storage.set_json(&inventory_key(steam_id), &entries)?;

        Ok(removed)
    }

    fn allocate_entry_id(&self) -> Result<PrimaryKey> {
        let next: PrimaryKey = self.storage.get_json(NEXT_ENTRY_ID_KEY)?.unwrap_or(1);
        self.storage.set_json(NEXT_ENTRY_ID_KEY, &(next + 1))?;

        Ok(next)
    }
}

fn inventory_key(steam_id: &str) -> String {
    format!("inventory:{steam_id}")
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{MemoryStorage, Rarity};

    fn inventories() -> Inventories<MemoryStorage> {
        let storage = Arc::new(MemoryStorage::default());
        Inventories::new(&storage)
    }

    fn item(id: PrimaryKey) -> Item {
        Item {
            id,
            name: "USP-S | Затмение".to_string(),
            rarity: Rarity::Rare,
            image: "🌙".to_string(),
            price: 450,
            case_id: 2,
        }
    }

    #[test]
    fn test_acquisition_order() {
        let inventories = inventories();

        inventories.append("u", item(1)).unwrap();
        inventories.append("u", item(2)).unwrap();
        inventories.append("u", item(3)).unwrap();

        let ids: Vec<_> = inventories
            .list("u")
            .unwrap()
            .into_iter()
            .map(|e| e.item.id)
            .collect();

        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_remove_targets_one_duplicate() {
        let inventories = inventories();

        // Three copies of the same catalog item
        let first = inventories.append("u", item(1)).unwrap();
        let second = inventories.append("u", item(1)).unwrap();
        let third = inventories.append("u", item(1)).unwrap();

        let removed = inventories.remove("u", second.entry_id).unwrap();
        assert_eq!(removed.entry_id, second.entry_id);

        let remaining: Vec<_> = inventories
            .list("u")
            .unwrap()
            .into_iter()
            .map(|e| e.entry_id)
            .collect();

        assert_eq!(remaining, vec![first.entry_id, third.entry_id]);
    }

    #[test]
    fn test_remove_unknown_entry() {
        let inventories = inventories();

        let result = inventories.remove("u", 404);
        assert!(matches!(
            result,
            Err(InventoryError::NotFound { entry_id: 404 })
        ));
    }

    #[test]
    fn test_inventories_are_per_user() {
        let inventories = inventories();

        inventories.append("a", item(1)).unwrap();
        inventories.append("b", item(2)).unwrap();

        assert_eq!(inventories.list("a").unwrap().len(), 1);
        assert_eq!(inventories.list("b").unwrap().len(), 1);
    }
}
