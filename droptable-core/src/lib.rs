mod auth;
mod catalog;
mod config;
mod identity;
mod inventory;
mod rewards;
mod storage;
mod unboxing;
mod util;
mod wallet;

use std::sync::Arc;

pub use auth::*;
pub use catalog::*;
pub use config::*;
pub use identity::*;
pub use inventory::*;
pub use rewards::*;
pub use storage::*;
pub use unboxing::*;
pub use wallet::*;

/// The droptable storefront system, wiring the catalog, wallets,
/// inventories, the unboxing flow, and authentication over one shared
/// persisted store.
pub struct Droptable<S, I> {
    pub config: DroptableConfig,

    pub catalog: Catalog<S>,
    pub wallets: Wallets<S>,
    pub inventories: Inventories<S>,
    pub unboxing: Unboxing<S>,
    pub auth: Auth<S, I>,
}

impl<S, I> Droptable<S, I>
where
    S: Storage,
    I: IdentityProvider,
{
    /// Creates the system with the default admin policy, the
    /// credential gate from the config
    pub fn new(config: DroptableConfig, storage: S, identity: I) -> storage::Result<Self> {
        let gate = CredentialGate {
            login: config.admin_login.clone(),
            password: config.admin_password.clone(),
        };

        Self::with_policy(config, storage, identity, Arc::new(gate))
    }

    /// Creates the system with a custom admin policy
    pub fn with_policy(
        config: DroptableConfig,
        storage: S,
        identity: I,
        policy: Arc<dyn AdminPolicy>,
    ) -> storage::Result<Self> {
        let storage = Arc::new(storage);
        let identity = Arc::new(identity);

        let catalog = Catalog::new(&storage);
        catalog.seed_if_empty()?;

        let wallets = Wallets::new(&storage, config.starting_balance);
        let inventories = Inventories::new(&storage);

        let unboxing = Unboxing::new(
            catalog.clone(),
            wallets.clone(),
            inventories.clone(),
            config.reveal_delay,
        );

        let auth = Auth::new(&storage, &identity, policy);

        Ok(Self {
            config,
            catalog,
            wallets,
            inventories,
            unboxing,
            auth,
        })
    }
}
