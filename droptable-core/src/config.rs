use std::env;
use std::time::Duration;

/// The configuration of a droptable deployment
#[derive(Debug, Clone)]
pub struct DroptableConfig {
    /// Login accepted by the development admin gate
    pub admin_login: String,
    /// Password accepted by the development admin gate
    pub admin_password: String,
    /// Balance a fresh wallet starts with
    pub starting_balance: i64,
    /// How long the case-opening reveal takes before the draw resolves
    pub reveal_delay: Duration,
    /// Steam Web API key used to fetch player summaries
    pub steam_api_key: String,
    /// The externally visible base URL of this deployment
    pub public_url: String,
}

impl DroptableConfig {
    /// Builds the config from `DROPTABLE_*` environment variables,
    /// falling back to the defaults for anything unset
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            admin_login: env::var("DROPTABLE_ADMIN_LOGIN").unwrap_or(defaults.admin_login),
            admin_password: env::var("DROPTABLE_ADMIN_PASSWORD").unwrap_or(defaults.admin_password),
            starting_balance: env::var("DROPTABLE_STARTING_BALANCE")
                .ok()
                .and_then(|x| x.parse().ok())
                .unwrap_or(defaults.starting_balance),
            reveal_delay: env::var("DROPTABLE_REVEAL_DELAY_MS")
                .ok()
                .and_then(|x| x.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.reveal_delay),
            steam_api_key: env::var("STEAM_API_KEY").unwrap_or(defaults.steam_api_key),
            public_url: env::var("DROPTABLE_PUBLIC_URL").unwrap_or(defaults.public_url),
        }
    }
}

impl Default for DroptableConfig {
    fn default() -> Self {
        Self {
            admin_login: "2o_off".to_string(),
            admin_password: "Gosha2012".to_string(),
            // Enough to open a few of the stock cases
            starting_balance: 5000,
            // Long enough for the reveal animation to play out
            reveal_delay: Duration::from_secs(3),
            steam_api_key: String::new(),
            public_url: "http://localhost:9050".to_string(),
        }
    }
}
