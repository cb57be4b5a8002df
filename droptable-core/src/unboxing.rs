use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;

use crate::{
    draw_reward, Catalog, CatalogError, Inventories, InventoryEntry, InventoryError, PrimaryKey,
    RewardError, Storage, WalletError, Wallets,
};

/// Where a user's current opening stands.
///
/// Absence from the map is the idle state. `Resolved` sticks around
/// until the user dismisses the result.
#[derive(Debug, Clone)]
pub enum OpeningState {
    Opening,
    Resolved(InventoryEntry),
}

#[derive(Debug, Error)]
pub enum UnboxError {
    /// Only one opening may be in flight per user
    #[error("An opening is already in progress")]
    OpeningInProgress,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Wallet(#[from] WalletError),
    #[error(transparent)]
    Reward(#[from] RewardError),
    #[error(transparent)]
    Inventory(#[from] InventoryError),
    /// The spawned resolve task died
    #[error("Opening task failed: {0}")]
    TaskFailed(String),
}

pub(crate) type Result<T> = std::result::Result<T, UnboxError>;

/// The case-opening flow.
///
/// One opening session walks Idle → Opening → Resolved → Idle. Funds
/// are reserved when the opening starts and only committed once the
/// draw lands in the inventory; any failure on the way rolls them
/// back.
pub struct Unboxing<S> {
    catalog: Catalog<S>,
    wallets: Wallets<S>,
    inventories: Inventories<S>,
    openings: Arc<DashMap<String, OpeningState>>,
    reveal_delay: Duration,
}

impl<S> Clone for Unboxing<S> {
    fn clone(&self) -> Self {
        Self {
            catalog: self.catalog.clone(),
            wallets: self.wallets.clone(),
            inventories: self.inventories.clone(),
            openings: self.openings.clone(),
            reveal_delay: self.reveal_delay,
        }
    }
}

impl<S> Unboxing<S>
where
    S: Storage,
{
    pub fn new(
        catalog: Catalog<S>,
        wallets: Wallets<S>,
        inventories: Inventories<S>,
        reveal_delay: Duration,
    ) -> Self {
        Self {
            catalog,
            wallets,
            inventories,
            openings: Default::default(),
            reveal_delay,
        }
    }

    /// Opens a case for the user, returning the drawn inventory entry.
    ///
    /// The resolve phase runs on its own task, so the opening runs to
    /// completion even if the caller goes away mid-reveal.
    pub async fn open(&self, steam_id: &str, case_id: PrimaryKey) -> Result<InventoryEntry> {
        match self.openings.entry(steam_id.to_string()) {
            Entry::Occupied(mut slot) => {
                if matches!(slot.get(), OpeningState::Opening) {
                    return Err(UnboxError::OpeningInProgress);
                }

                // An undismissed result is replaced by the new opening
                slot.insert(OpeningState::Opening);
            }
            Entry::Vacant(slot) => {
                slot.insert(OpeningState::Opening);
            }
        }

        let this = self.clone();
        let steam_id = steam_id.to_string();

        tokio::spawn(async move { this.resolve(steam_id, case_id).await })
            .await
            .map_err(|e| UnboxError::TaskFailed(e.to_string()))?
    }

    /// Returns the user's current opening state, if any
    pub fn state(&self, steam_id: &str) -> Option<OpeningState> {
        self.openings.get(steam_id).map(|state| state.value().clone())
    }

    /// Puts a resolved opening away.
    ///
    /// An opening that is still revealing can't be dismissed; there is
    /// no cancellation. Dismissing while idle is a no-op.
    pub fn dismiss(&self, steam_id: &str) -> Result<()> {
        let revealing = self
            .openings
            .get(steam_id)
            .map(|state| matches!(*state, OpeningState::Opening))
            .unwrap_or(false);

        if revealing {
            return Err(UnboxError::OpeningInProgress);
        }

        self.openings.remove(steam_id);

        Ok(())
    }

    async fn resolve(self, steam_id: String, case_id: PrimaryKey) -> Result<InventoryEntry> {
        let result = self.resolve_inner(&steam_id, case_id).await;

        match &result {
            Ok(entry) => {
                self.openings
                    .insert(steam_id, OpeningState::Resolved(entry.clone()));
            }
            Err(_) => {
                self.openings.remove(&steam_id);
            }
        }

        result
    }

    async fn resolve_inner(&self, steam_id: &str, case_id: PrimaryKey) -> Result<InventoryEntry> {
        let case = self.catalog.case_by_id(case_id)?;
        let reservation = self.wallets.reserve(steam_id, case.price)?;

        tokio::time::sleep(self.reveal_delay).await;

        let items = self.catalog.items_in_case(case.id)?;
        let reward = {
            let mut rng = rand::thread_rng();
            draw_reward(&case, &items, &mut rng)
        };

        match reward {
            Ok(item) => {
                self.wallets.commit(reservation)?;
                Ok(self.inventories.append(steam_id, item)?)
            }
            Err(e) => {
                self.wallets.rollback(reservation)?;
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{MemoryStorage, NewCase, NewItem, Rarity};

    struct Fixture {
        catalog: Catalog<MemoryStorage>,
        wallets: Wallets<MemoryStorage>,
        inventories: Inventories<MemoryStorage>,
        unboxing: Unboxing<MemoryStorage>,
    }

    fn fixture(starting_balance: i64) -> Fixture {
        let storage = Arc::new(MemoryStorage::default());

        let catalog = Catalog::new(&storage);
        let wallets = Wallets::new(&storage, starting_balance);
        let inventories = Inventories::new(&storage);
        let unboxing = Unboxing::new(
            catalog.clone(),
            wallets.clone(),
            inventories.clone(),
            Duration::ZERO,
        );

        Fixture {
            catalog,
            wallets,
            inventories,
            unboxing,
        }
    }

    fn stocked_case(fixture: &Fixture, price: i64) -> PrimaryKey {
        let case = fixture
            .catalog
            .create_case(NewCase {
                name: "Легендарный кейс".to_string(),
                price,
                image: "👑".to_string(),
                description: String::new(),
            })
            .unwrap();

        for (name, rarity) in [
            ("AK-47 | Огненный змей", Rarity::Legendary),
            ("P90 | Азиимов", Rarity::Common),
        ] {
            fixture
                .catalog
                .create_item(NewItem {
                    name: name.to_string(),
                    rarity,
                    image: "🔥".to_string(),
                    price: 100,
                    case_id: case.id,
                })
                .unwrap();
        }

        case.id
    }

    #[tokio::test]
    async fn test_open_debits_once_and_awards() {
        let fixture = fixture(5000);
        let case_id = stocked_case(&fixture, 1000);

        let entry = fixture.unboxing.open("u", case_id).await.unwrap();

        assert_eq!(fixture.wallets.balance("u").unwrap(), 4000);
        assert_eq!(entry.item.case_id, case_id);

        let inventory = fixture.inventories.list("u").unwrap();
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory[0].entry_id, entry.entry_id);

        assert!(matches!(
            fixture.unboxing.state("u"),
            Some(OpeningState::Resolved(_))
        ));
    }

    #[tokio::test]
    async fn test_insufficient_funds_rejected() {
        let fixture = fixture(50);
        let case_id = stocked_case(&fixture, 100);

        let result = fixture.unboxing.open("u", case_id).await;
        assert!(matches!(
            result,
            Err(UnboxError::Wallet(WalletError::InsufficientFunds { .. }))
        ));

        assert_eq!(fixture.wallets.balance("u").unwrap(), 50);
        assert!(fixture.inventories.list("u").unwrap().is_empty());
        assert!(fixture.unboxing.state("u").is_none());
    }

    #[tokio::test]
    async fn test_empty_pool_rolls_back() {
        let fixture = fixture(5000);

        let case = fixture
            .catalog
            .create_case(NewCase {
                name: "Пустой кейс".to_string(),
                price: 1000,
                image: "📦".to_string(),
                description: String::new(),
            })
            .unwrap();

        let result = fixture.unboxing.open("u", case.id).await;
        assert!(matches!(
            result,
            Err(UnboxError::Reward(RewardError::EmptyPool { .. }))
        ));

        // The reservation was rolled back, not lost
        assert_eq!(fixture.wallets.balance("u").unwrap(), 5000);
        assert!(fixture.unboxing.state("u").is_none());
    }

    #[tokio::test]
    async fn test_one_opening_in_flight() {
        let fixture = fixture(5000);
        let case_id = stocked_case(&fixture, 100);

        let slow = Unboxing::new(
            fixture.catalog.clone(),
            fixture.wallets.clone(),
            fixture.inventories.clone(),
            Duration::from_millis(50),
        );

        let (first, second) = tokio::join!(slow.open("u", case_id), slow.open("u", case_id));

        assert!(first.is_ok());
        assert!(matches!(second, Err(UnboxError::OpeningInProgress)));

        // Only one opening went through
        assert_eq!(fixture.wallets.balance("u").unwrap(), 4900);
        assert_eq!(fixture.inventories.list("u").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dismiss_returns_to_idle() {
        let fixture = fixture(5000);
        let case_id = stocked_case(&fixture, 100);

        fixture.unboxing.open("u", case_id).await.unwrap();
        fixture.unboxing.dismiss("u").unwrap();

        assert!(fixture.unboxing.state("u").is_none());

        // Dismissing while idle is a no-op
        fixture.unboxing.dismiss("u").unwrap();

        // And the next opening can start
        fixture.unboxing.open("u", case_id).await.unwrap();
        assert_eq!(fixture.wallets.balance("u").unwrap(), 4800);
    }

    #[tokio::test]
    async fn test_open_replaces_undismissed_result() {
        let fixture = fixture(5000);
        let case_id = stocked_case(&fixture, 100);

        fixture.unboxing.open("u", case_id).await.unwrap();
        let second = fixture.unboxing.open("u", case_id).await.unwrap();

        // The new reward takes the result slot
        match fixture.unboxing.state("u") {
            Some(OpeningState::Resolved(entry)) => assert_eq!(entry.entry_id, second.entry_id),
            other => panic!("expected a resolved state, got {other:?}"),
        }

        assert_eq!(fixture.inventories.list("u").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_case() {
        let fixture = fixture(5000);

        let result = fixture.unboxing.open("u", 404).await;
        assert!(matches!(result, Err(UnboxError::Catalog(_))));
        assert!(fixture.unboxing.state("u").is_none());
    }
}
