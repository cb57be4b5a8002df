use std::sync::Arc;

use axum::extract::FromRef;
use droptable_core::{Droptable, JsonFileStorage, SteamIdentity};

/// The concrete system the server runs against
pub type App = Droptable<JsonFileStorage, SteamIdentity>;

#[derive(Clone, FromRef)]
pub struct ServerContext {
    pub app: Arc<App>,
}
