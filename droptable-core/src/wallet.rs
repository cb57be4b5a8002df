use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Storage, StorageError, StorageExt};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct WalletRecord {
    balance: i64,
    reserved: i64,
}

/// Funds set aside for a purchase that hasn't resolved yet.
///
/// A reservation must be either committed or rolled back; dropping it
/// without doing so leaves the funds reserved.
#[derive(Debug)]
#[must_use = "a reservation must be committed or rolled back"]
pub struct Reservation {
    steam_id: String,
    amount: i64,
}

impl Reservation {
    pub fn amount(&self) -> i64 {
        self.amount
    }
}

#[derive(Debug, Error)]
pub enum WalletError {
    /// The balance doesn't cover the requested amount
    #[error("Balance {balance} doesn't cover {required}")]
    InsufficientFunds { balance: i64, required: i64 },
    /// A negative amount was passed in
    #[error("Amount must not be negative")]
    NegativeAmount,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub(crate) type Result<T> = std::result::Result<T, WalletError>;

/// Per-user balances with two-phase spending.
///
/// Opening a case reserves the price first, then commits once the
/// draw resolves or rolls back if it fails, so a failed opening never
/// loses funds. Balances never go negative.
pub struct Wallets<S> {
    storage: Arc<S>,
    starting_balance: i64,
    lock: Arc<Mutex<()>>,
}

impl<S> Clone for Wallets<S> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            starting_balance: self.starting_balance,
            lock: self.lock.clone(),
        }
    }
}

impl<S> Wallets<S>
where
    S: Storage,
{
    pub fn new(storage: &Arc<S>, starting_balance: i64) -> Self {
        Self {
            storage: storage.clone(),
            starting_balance,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Returns the spendable balance, creating the wallet at the
    /// starting balance on first access
    pub fn balance(&self, steam_id: &str) -> Result<i64> {
        let _guard = self.lock.lock();

        Ok(self.record(steam_id)?.balance)
    }

    /// Moves `amount` from balance to reserved
    pub fn reserve(&self, steam_id: &str, amount: i64) -> Result<Reservation> {
        ensure_amount(amount)?;

        let _guard = self.lock.lock();

        let mut record = self.record(steam_id)?;

        if record.balance < amount {
            return Err(WalletError::InsufficientFunds {
                balance: record.balance,
                required: amount,
            });
        }

        record.balance -= amount;
        record.reserved += amount;
        self.write(steam_id, &record)?;

        Ok(Reservation {
            steam_id: steam_id.to_string(),
            amount,
        })
    }

    /// Spends the reserved funds
    pub fn commit(&self, reservation: Reservation) -> Result<()> {
        let _guard = self.lock.lock();

        let mut record = self.record(&reservation.steam_id)?;
        record.reserved -= reservation.amount;
        self.write(&reservation.steam_id, &record)
    }

    /// Returns the reserved funds to the balance
    pub fn rollback(&self, reservation: Reservation) -> Result<()> {
        let _guard = self.lock.lock();

        let mut record = self.record(&reservation.steam_id)?;
        record.reserved -= reservation.amount;
        record.balance += reservation.amount;
        self.write(&reservation.steam_id, &record)
    }

    /// Adds `amount` to the balance
    pub fn credit(&self, steam_id: &str, amount: i64) -> Result<i64> {
        ensure_amount(amount)?;

        let _guard = self.lock.lock();

        let mut record = self.record(steam_id)?;
        record.balance += amount;
        self.write(steam_id, &record)?;

        Ok(record.balance)
    }

    fn record(&self, steam_id: &str) -> Result<WalletRecord> {
        let key = wallet_key(steam_id);

        match self.storage.get_json(&key)? {
            Some(record) => Ok(record),
            None => {
                let record = WalletRecord {
                    balance: self.starting_balance,
                    reserved: 0,
                };

                self.storage.set_json(&key, &record)?;
                Ok(record)
            }
        }
    }

    fn write(&self, steam_id: &str, record: &WalletRecord) -> Result<()> {
        Ok(self.storage.set_json(&wallet_key(steam_id), record)?)
    }
}

fn wallet_key(steam_id: &str) -> String {
    format!("wallet:{steam_id}")
}

fn ensure_amount(amount: i64) -> Result<()> {
    if amount < 0 {
        return Err(WalletError::NegativeAmount);
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::MemoryStorage;

    fn wallets() -> Wallets<MemoryStorage> {
        let storage = Arc::new(MemoryStorage::default());
        Wallets::new(&storage, 5000)
    }

    #[test]
    fn test_starts_at_starting_balance() {
        let wallets = wallets();

        assert_eq!(wallets.balance("76561198000000001").unwrap(), 5000);
    }

    #[test]
    fn test_reserve_then_commit() {
        let wallets = wallets();

        let reservation = wallets.reserve("u", 1000).unwrap();
        assert_eq!(wallets.balance("u").unwrap(), 4000);

        wallets.commit(reservation).unwrap();
        assert_eq!(wallets.balance("u").unwrap(), 4000);
    }

    #[test]
    fn test_reserve_then_rollback_restores_balance() {
        let wallets = wallets();

        let reservation = wallets.reserve("u", 1000).unwrap();
        assert_eq!(wallets.balance("u").unwrap(), 4000);

        wallets.rollback(reservation).unwrap();
        assert_eq!(wallets.balance("u").unwrap(), 5000);
    }

    #[test]
    fn test_insufficient_funds() {
        let storage = Arc::new(MemoryStorage::default());
        let wallets = Wallets::new(&storage, 50);

        let result = wallets.reserve("u", 100);
        assert!(matches!(
            result,
            Err(WalletError::InsufficientFunds {
                balance: 50,
                required: 100
            })
        ));

        // Nothing was mutated
        assert_eq!(wallets.balance("u").unwrap(), 50);
    }

    #[test]
    fn test_credit() {
        let wallets = wallets();

        assert_eq!(wallets.credit("u", 450).unwrap(), 5450);
    }
}
