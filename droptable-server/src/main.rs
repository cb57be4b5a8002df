use std::{env, sync::Arc};

use droptable_core::{Droptable, DroptableConfig, JsonFileStorage, SteamIdentity};
use droptable_server::{logging, run_server};
use log::{error, info};

#[tokio::main]
async fn main() {
    logging::init_logger();

    let config = DroptableConfig::from_env();
    let data_path =
        env::var("DROPTABLE_DATA_PATH").unwrap_or_else(|_| "droptable.json".to_string());

    info!("Opening the data file at {}...", data_path);

    let storage = match JsonFileStorage::new(&data_path) {
        Ok(storage) => storage,
        Err(error) => {
            error!("Could not open the data file: {}", error);
            return;
        }
    };

    let identity = SteamIdentity::new(config.steam_api_key.clone(), config.public_url.clone());

    match Droptable::new(config, storage, identity) {
        Ok(app) => {
            info!("Initialized successfully.");
            run_server(Arc::new(app)).await
        }
        Err(error) => {
            error!("droptable failed to start: {}", error);
        }
    }
}
