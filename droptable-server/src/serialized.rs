//! All schemas that are exposed from endpoints are defined here
//! along with the ToSerialized impls

use droptable_core::{
    Case as CoreCase, InventoryEntry as CoreInventoryEntry, Item as CoreItem,
    OpeningState as CoreOpeningState, Rarity, SessionData, SteamUser,
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    steam_id: String,
    name: String,
    avatar: String,
    profile_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    token: String,
    user: User,
    admin: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    id: i64,
    name: String,
    price: i64,
    image: String,
    description: String,
    item_count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    id: i64,
    name: String,
    #[schema(value_type = String, example = "legendary")]
    rarity: Rarity,
    image: String,
    price: i64,
    case_id: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntry {
    entry_id: i64,
    item: Item,
    acquired_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Opening {
    /// One of "idle", "opening", or "resolved"
    phase: String,
    reward: Option<InventoryEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    balance: i64,
}

impl Wallet {
    pub fn new(balance: i64) -> Self {
        Self { balance }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleResult {
    balance: i64,
    inventory: Vec<InventoryEntry>,
}

impl SaleResult {
    pub fn new(balance: i64, inventory: Vec<InventoryEntry>) -> Self {
        Self { balance, inventory }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletedCase {
    id: i64,
    /// Ids of the items removed by the cascade
    removed_item_ids: Vec<i64>,
}

impl DeletedCase {
    pub fn new(id: i64, removed_item_ids: Vec<i64>) -> Self {
        Self {
            id,
            removed_item_ids,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginUrl {
    login_url: String,
}

impl LoginUrl {
    pub fn new(login_url: String) -> Self {
        Self { login_url }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DataUrl {
    data_url: String,
}

impl DataUrl {
    pub fn new(data_url: String) -> Self {
        Self { data_url }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AllowList {
    steam_ids: Vec<String>,
}

impl AllowList {
    pub fn new(steam_ids: Vec<String>) -> Self {
        Self { steam_ids }
    }
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl<I, O> ToSerialized<Vec<O>> for Vec<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Vec<O> {
        self.iter().map(|x| x.to_serialized()).collect()
    }
}

impl ToSerialized<User> for SteamUser {
    fn to_serialized(&self) -> User {
        User {
            steam_id: self.steam_id.clone(),
            name: self.name.clone(),
            avatar: self.avatar.clone(),
            profile_url: self.profile_url.clone(),
        }
    }
}

impl ToSerialized<LoginResult> for SessionData {
    fn to_serialized(&self) -> LoginResult {
        LoginResult {
            token: self.token.clone(),
            user: self.user.to_serialized(),
            admin: self.admin,
        }
    }
}

impl ToSerialized<Case> for (CoreCase, usize) {
    fn to_serialized(&self) -> Case {
        let (case, item_count) = self;

        Case {
            id: case.id,
            name: case.name.clone(),
            price: case.price,
            image: case.image.clone(),
            description: case.description.clone(),
            item_count: *item_count,
        }
    }
}

impl ToSerialized<Item> for CoreItem {
    fn to_serialized(&self) -> Item {
        Item {
            id: self.id,
            name: self.name.clone(),
            rarity: self.rarity,
            image: self.image.clone(),
            price: self.price,
            case_id: self.case_id,
        }
    }
}

impl ToSerialized<InventoryEntry> for CoreInventoryEntry {
    fn to_serialized(&self) -> InventoryEntry {
        InventoryEntry {
            entry_id: self.entry_id,
            item: self.item.to_serialized(),
            acquired_at: self.acquired_at.to_rfc3339(),
        }
    }
}

impl ToSerialized<Opening> for Option<CoreOpeningState> {
    fn to_serialized(&self) -> Opening {
        match self {
            None => Opening {
                phase: "idle".to_string(),
                reward: None,
            },
            Some(CoreOpeningState::Opening) => Opening {
                phase: "opening".to_string(),
                reward: None,
            },
            Some(CoreOpeningState::Resolved(entry)) => Opening {
                phase: "resolved".to_string(),
                reward: Some(entry.to_serialized()),
            },
        }
    }
}
