use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

const OPENID_ENDPOINT: &str = "https://steamcommunity.com/openid/login";
const SUMMARIES_ENDPOINT: &str =
    "http://api.steampowered.com/ISteamUser/GetPlayerSummaries/v0002/";

/// A Steam profile resolved from the OpenID handshake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SteamUser {
    pub steam_id: String,
    pub name: String,
    pub avatar: String,
    pub profile_url: String,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    /// The callback did not carry the OpenID claimed id
    #[error("Missing openid.claimed_id parameter")]
    MissingClaimedId,
    /// The provider answered, but not with a usable profile
    #[error("No profile found for the authenticated id")]
    ProfileNotFound,
    /// The provider could not be reached at all
    #[error("Identity provider unreachable: {0}")]
    Unreachable(String),
}

pub(crate) type Result<T> = std::result::Result<T, IdentityError>;

/// Resolves who a user is.
///
/// The seam exists so the storefront can be exercised without a
/// network; production uses [SteamIdentity].
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// The URL the user is redirected to for the external handshake
    async fn login_url(&self) -> Result<String>;

    /// Exchanges the callback query parameters for a profile
    async fn resolve(&self, params: &HashMap<String, String>) -> Result<SteamUser>;
}

/// The real Steam implementation: builds the OpenID checkid_setup URL
/// and exchanges the callback for a profile via GetPlayerSummaries.
pub struct SteamIdentity {
    client: reqwest::Client,
    api_key: String,
    /// The externally visible base URL of this deployment, used as the
    /// OpenID realm and the base of the return-to route
    public_url: String,
}

impl SteamIdentity {
    pub fn new(api_key: String, public_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            public_url,
        }
    }
}

#[async_trait]
impl IdentityProvider for SteamIdentity {
    async fn login_url(&self) -> Result<String> {
        let return_to = format!("{}/v1/auth/callback", self.public_url);

        let mut url =
            Url::parse(OPENID_ENDPOINT).map_err(|e| IdentityError::Unreachable(e.to_string()))?;

        url.query_pairs_mut()
            .append_pair("openid.ns", "http://specs.openid.net/auth/2.0")
            .append_pair("openid.mode", "checkid_setup")
            .append_pair("openid.return_to", &return_to)
            .append_pair("openid.realm", &self.public_url)
            .append_pair(
                "openid.identity",
                "http://specs.openid.net/auth/2.0/identifier_select",
            )
            .append_pair(
                "openid.claimed_id",
                "http://specs.openid.net/auth/2.0/identifier_select",
            );

        Ok(url.to_string())
    }

    async fn resolve(&self, params: &HashMap<String, String>) -> Result<SteamUser> {
        let claimed_id = params
            .get("openid.claimed_id")
            .ok_or(IdentityError::MissingClaimedId)?;

        // The claimed id is a URL whose last segment is the Steam id
        let steam_id = claimed_id
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .ok_or(IdentityError::MissingClaimedId)?;

        let response = self
            .client
            .get(SUMMARIES_ENDPOINT)
            .query(&[("key", self.api_key.as_str()), ("steamids", steam_id)])
            .send()
            .await
            .map_err(|e| IdentityError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IdentityError::ProfileNotFound);
        }

        let envelope: SummariesEnvelope = response
            .json()
            .await
            .map_err(|e| IdentityError::Unreachable(e.to_string()))?;

        let player = envelope
            .response
            .players
            .into_iter()
            .next()
            .ok_or(IdentityError::ProfileNotFound)?;

        Ok(SteamUser {
            steam_id: player.steamid,
            name: player.personaname,
            avatar: player.avatarfull,
            profile_url: player.profileurl,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SummariesEnvelope {
    response: SummariesResponse,
}

#[derive(Debug, Deserialize)]
struct SummariesResponse {
    players: Vec<PlayerSummary>,
}

#[derive(Debug, Deserialize)]
struct PlayerSummary {
    steamid: String,
    personaname: String,
    avatarfull: String,
    profileurl: String,
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_login_url_carries_the_handshake() {
        let identity = SteamIdentity::new(
            "key".to_string(),
            "https://cases.example.com".to_string(),
        );

        let url = Url::parse(&identity.login_url().await.unwrap()).unwrap();
        let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("steamcommunity.com"));
        assert_eq!(pairs["openid.mode"], "checkid_setup");
        assert_eq!(pairs["openid.realm"], "https://cases.example.com");
        assert_eq!(
            pairs["openid.return_to"],
            "https://cases.example.com/v1/auth/callback"
        );
    }

    #[tokio::test]
    async fn test_resolve_requires_claimed_id() {
        let identity = SteamIdentity::new("key".to_string(), "http://localhost".to_string());

        let result = identity.resolve(&HashMap::new()).await;
        assert!(matches!(result, Err(IdentityError::MissingClaimedId)));
    }
}
