use std::sync::Arc;

use log::info;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Storage, StorageError, StorageExt};

/// The type used for primary keys in the catalog and inventories.
pub type PrimaryKey = i64;

const CASES_KEY: &str = "catalog:cases";
const ITEMS_KEY: &str = "catalog:items";
const NEXT_ID_KEY: &str = "catalog:next_id";

/// The five rarity tiers, in descending order of value.
/// Rarity controls the draw weight of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Legendary,
    Epic,
    Rare,
    Uncommon,
    Common,
}

/// A purchasable container that yields one randomly drawn item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    pub id: PrimaryKey,
    pub name: String,
    pub price: i64,
    /// An emoji literal or an inline data: URL
    pub image: String,
    pub description: String,
}

/// A cosmetic reward belonging to exactly one case
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: PrimaryKey,
    pub name: String,
    pub rarity: Rarity,
    /// An emoji literal or an inline data: URL
    pub image: String,
    pub price: i64,
    /// The case this item can drop from
    pub case_id: PrimaryKey,
}

#[derive(Debug)]
pub struct NewCase {
    pub name: String,
    pub price: i64,
    pub image: String,
    pub description: String,
}

#[derive(Debug, Default)]
pub struct UpdatedCase {
    pub name: Option<String>,
    pub price: Option<i64>,
    pub image: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug)]
pub struct NewItem {
    pub name: String,
    pub rarity: Rarity,
    pub image: String,
    pub price: i64,
    pub case_id: PrimaryKey,
}

#[derive(Debug, Default)]
pub struct UpdatedItem {
    pub name: Option<String>,
    pub rarity: Option<Rarity>,
    pub image: Option<String>,
    pub price: Option<i64>,
    pub case_id: Option<PrimaryKey>,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    /// A case or item doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: PrimaryKey,
    },
    /// A price was negative
    #[error("Price must not be negative")]
    NegativePrice,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub(crate) type Result<T> = std::result::Result<T, CatalogError>;

/// The catalog of cases and items.
///
/// One store is shared by the storefront and the admin surface, so
/// edits made by an administrator are immediately visible to buyers.
/// Every surviving item references an existing case.
pub struct Catalog<S> {
    storage: Arc<S>,
    /// Guards read-modify-write sequences on the catalog keys
    lock: Arc<Mutex<()>>,
}

impl<S> Clone for Catalog<S> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            lock: self.lock.clone(),
        }
    }
}

impl<S> Catalog<S>
where
    S: Storage,
{
    pub fn new(storage: &Arc<S>) -> Self {
        Self {
            storage: storage.clone(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Seeds the stock catalog if no catalog has been stored yet
    pub fn seed_if_empty(&self) -> std::result::Result<(), StorageError> {
        let _guard = self.lock.lock();

        if self.storage.get(CASES_KEY)?.is_some() {
            return Ok(());
        }

        info!("Seeding the stock catalog...");

        let (cases, items) = stock_catalog();
        let next_id = 1 + cases
            .iter()
            .map(|c| c.id)
            .chain(items.iter().map(|i| i.id))
            .max()
            .unwrap_or(0);

        self.storage.set_json(CASES_KEY, &cases)?;
        self.storage.set_json(ITEMS_KEY, &items)?;
        self.storage.set_json(NEXT_ID_KEY, &next_id)?;

        Ok(())
    }

    pub fn list_cases(&self) -> Result<Vec<Case>> {
        Ok(self.storage.get_json(CASES_KEY)?.unwrap_or_default())
    }

    pub fn list_items(&self) -> Result<Vec<Item>> {
        Ok(self.storage.get_json(ITEMS_KEY)?.unwrap_or_default())
    }

    pub fn case_by_id(&self, case_id: PrimaryKey) -> Result<Case> {
        self.list_cases()?
            .into_iter()
            .find(|c| c.id == case_id)
            .ok_or(CatalogError::NotFound {
                resource: "case",
                identifier: case_id,
            })
    }

    pub fn item_by_id(&self, item_id: PrimaryKey) -> Result<Item> {
        self.list_items()?
            .into_iter()
            .find(|i| i.id == item_id)
            .ok_or(CatalogError::NotFound {
                resource: "item",
                identifier: item_id,
            })
    }

    /// Returns the items that can drop from the given case
    pub fn items_in_case(&self, case_id: PrimaryKey) -> Result<Vec<Item>> {
        Ok(self
            .list_items()?
            .into_iter()
            .filter(|i| i.case_id == case_id)
            .collect())
    }

    pub fn create_case(&self, new_case: NewCase) -> Result<Case> {
        ensure_price(new_case.price)?;

        let _guard = self.lock.lock();

        let case = Case {
            id: self.allocate_id()?,
            name: new_case.name,
            price: new_case.price,
            image: new_case.image,
            description: new_case.description,
        };

        let mut cases = self.list_cases()?;
        cases.push(case.clone());
        self.storage.set_json(CASES_KEY, &cases)?;

        Ok(case)
    }

    pub fn update_case(&self, case_id: PrimaryKey, updated: UpdatedCase) -> Result<Case> {
        if let Some(price) = updated.price {
            ensure_price(price)?;
        }

        let _guard = self.lock.lock();

        let mut cases = self.list_cases()?;
        let case = cases
            .iter_mut()
            .find(|c| c.id == case_id)
            .ok_or(CatalogError::NotFound {
                resource: "case",
                identifier: case_id,
            })?;

        if let Some(name) = updated.name {
            case.name = name;
        }
        if let Some(price) = updated.price {
            case.price = price;
        }
        if let Some(image) = updated.image {
            case.image = image;
        }
        if let Some(description) = updated.description {
            case.description = description;
        }

        let case = case.clone();
        self.storage.set_json(CASES_KEY, &cases)?;

        Ok(case)
    }

    /// Deletes a case, cascading to every item that referenced it.
    /// Returns the removed items.
    pub fn delete_case(&self, case_id: PrimaryKey) -> Result<Vec<Item>> {
        let _guard = self.lock.lock();

        let mut cases = self.list_cases()?;
        let before = cases.len();
        cases.retain(|c| c.id != case_id);

        if cases.len() == before {
            return Err(CatalogError::NotFound {
                resource: "case",
                identifier: case_id,
            });
        }

        let items = self.list_items()?;
        let (removed, kept): (Vec<_>, Vec<_>) =
            items.into_iter().partition(|i| i.case_id == case_id);

        self.storage.set_json(CASES_KEY, &cases)?;
        self.storage.set_json(ITEMS_KEY, &kept)?;

        Ok(removed)
    }

    pub fn create_item(&self, new_item: NewItem) -> Result<Item> {
        ensure_price(new_item.price)?;

        let _guard = self.lock.lock();

        // The referenced case must exist
        self.case_by_id(new_item.case_id)?;

        let item = Item {
            id: self.allocate_id()?,
            name: new_item.name,
            rarity: new_item.rarity,
            image: new_item.image,
            price: new_item.price,
            case_id: new_item.case_id,
        };

        let mut items = self.list_items()?;
        items.push(item.clone());
        self.storage.set_json(ITEMS_KEY, &items)?;

        Ok(item)
    }

    pub fn update_item(&self, item_id: PrimaryKey, updated: UpdatedItem) -> Result<Item> {
        if let Some(price) = updated.price {
            ensure_price(price)?;
        }

        let _guard = self.lock.lock();

        if let Some(case_id) = updated.case_id {
            self.case_by_id(case_id)?;
        }

        let mut items = self.list_items()?;
        let item = items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or(CatalogError::NotFound {
                resource: "item",
                identifier: item_id,
            })?;

        if let Some(name) = updated.name {
            item.name = name;
        }
        if let Some(rarity) = updated.rarity {
            item.rarity = rarity;
        }
        if let Some(image) = updated.image {
            item.image = image;
        }
        if let Some(price) = updated.price {
            item.price = price;
        }
        if let Some(case_id) = updated.case_id {
            item.case_id = case_id;
        }

        let item = item.clone();
        self.storage.set_json(ITEMS_KEY, &items)?;

        Ok(item)
    }

    pub fn delete_item(&self, item_id: PrimaryKey) -> Result<()> {
        let _guard = self.lock.lock();

        let mut items = self.list_items()?;
        let before = items.len();
        items.retain(|i| i.id != item_id);

        if items.len() == before {
            return Err(CatalogError::NotFound {
                resource: "item",
                identifier: item_id,
            });
        }

        self.storage.set_json(ITEMS_KEY, &items)?;

        Ok(())
    }

    fn allocate_id(&self) -> Result<PrimaryKey> {
        let next: PrimaryKey = self.storage.get_json(NEXT_ID_KEY)?.unwrap_or(1);
        self.storage.set_json(NEXT_ID_KEY, &(next + 1))?;

        Ok(next)
    }
}

fn ensure_price(price: i64) -> Result<()> {
    if price < 0 {
        return Err(CatalogError::NegativePrice);
    }

    Ok(())
}

/// The catalog the storefront ships with
fn stock_catalog() -> (Vec<Case>, Vec<Item>) {
    let case = |id, name: &str, price, image: &str, description: &str| Case {
        id,
        name: name.to_string(),
        price,
        image: image.to_string(),
        description: description.to_string(),
    };

    let item = |id, name: &str, rarity, image: &str, price, case_id| Item {
        id,
        name: name.to_string(),
        rarity,
        image: image.to_string(),
        price,
        case_id,
    };

    let cases = vec![
        case(1, "Стартовый кейс", 100, "🎁", "Идеально для новичков"),
        case(2, "Золотой кейс", 500, "💎", "Повышенный шанс редких скинов"),
        case(3, "Легендарный кейс", 1000, "👑", "Эксклюзивные легендарные скины"),
    ];

    let items = vec![
        item(4, "AK-47 | Огненный змей", Rarity::Legendary, "🔥", 2500, 3),
        item(5, "AWP | Азимов", Rarity::Epic, "⚡", 1200, 2),
        item(6, "M4A4 | Неон", Rarity::Rare, "🌟", 500, 1),
        item(7, "Desert Eagle | Пламя", Rarity::Epic, "💥", 800, 2),
        item(8, "Glock-18 | Градиент", Rarity::Uncommon, "🎨", 200, 1),
        item(9, "USP-S | Затмение", Rarity::Rare, "🌙", 450, 2),
        item(10, "Нож-бабочка | Убийство", Rarity::Legendary, "🦋", 3000, 3),
        item(11, "P90 | Азиимов", Rarity::Uncommon, "💫", 150, 1),
    ];

    (cases, items)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::MemoryStorage;

    fn catalog() -> Catalog<MemoryStorage> {
        let storage = Arc::new(MemoryStorage::default());
        Catalog::new(&storage)
    }

    fn new_case(name: &str, price: i64) -> NewCase {
        NewCase {
            name: name.to_string(),
            price,
            image: "🎁".to_string(),
            description: String::new(),
        }
    }

    fn new_item(name: &str, case_id: PrimaryKey) -> NewItem {
        NewItem {
            name: name.to_string(),
            rarity: Rarity::Common,
            image: "🌟".to_string(),
            price: 100,
            case_id,
        }
    }

    #[test]
    fn test_seed_is_idempotent() {
        let catalog = catalog();

        catalog.seed_if_empty().unwrap();
        let cases = catalog.list_cases().unwrap();
        let items = catalog.list_items().unwrap();

        assert_eq!(cases.len(), 3);
        assert_eq!(items.len(), 8);

        catalog.seed_if_empty().unwrap();
        assert_eq!(catalog.list_cases().unwrap().len(), 3);

        // Seeded ids must not collide with newly allocated ones
        let created = catalog.create_case(new_case("Новый кейс", 250)).unwrap();
        assert!(cases.iter().all(|c| c.id != created.id));
        assert!(items.iter().all(|i| i.id != created.id));
    }

    #[test]
    fn test_crud_roundtrip() {
        let catalog = catalog();

        let case = catalog.create_case(new_case("Кейс", 100)).unwrap();
        let item = catalog.create_item(new_item("Скин", case.id)).unwrap();

        assert_eq!(catalog.case_by_id(case.id).unwrap().name, "Кейс");
        assert_eq!(catalog.items_in_case(case.id).unwrap().len(), 1);

        let updated = catalog
            .update_case(
                case.id,
                UpdatedCase {
                    price: Some(200),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.price, 200);
        assert_eq!(updated.name, "Кейс");

        let updated = catalog
            .update_item(
                item.id,
                UpdatedItem {
                    rarity: Some(Rarity::Epic),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.rarity, Rarity::Epic);

        catalog.delete_item(item.id).unwrap();
        assert!(catalog.item_by_id(item.id).is_err());
    }

    #[test]
    fn test_delete_case_cascades() {
        let catalog = catalog();

        let first = catalog.create_case(new_case("Первый", 100)).unwrap();
        let second = catalog.create_case(new_case("Второй", 100)).unwrap();

        catalog.create_item(new_item("A", first.id)).unwrap();
        catalog.create_item(new_item("B", first.id)).unwrap();
        let survivor = catalog.create_item(new_item("C", second.id)).unwrap();

        let removed = catalog.delete_case(first.id).unwrap();
        assert_eq!(removed.len(), 2);

        let remaining = catalog.list_items().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, survivor.id);

        // Every surviving item still references an existing case
        for item in remaining {
            assert!(catalog.case_by_id(item.case_id).is_ok());
        }
    }

    #[test]
    fn test_item_requires_existing_case() {
        let catalog = catalog();

        let result = catalog.create_item(new_item("Призрак", 404));
        assert!(matches!(
            result,
            Err(CatalogError::NotFound { resource: "case", .. })
        ));
    }

    #[test]
    fn test_negative_price_is_rejected() {
        let catalog = catalog();

        assert!(matches!(
            catalog.create_case(new_case("Кейс", -1)),
            Err(CatalogError::NegativePrice)
        ));
    }
}
