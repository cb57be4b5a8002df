use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    util::random_string, IdentityError, IdentityProvider, Storage, StorageError, StorageExt,
    SteamUser,
};

const ALLOW_LIST_KEY: &str = "adminSteamIds";

/// A logged-in user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    /// The session token, or key if you will
    pub token: String,
    pub user: SteamUser,
    /// Whether the session has been elevated through the admin gate
    pub admin: bool,
    pub expires_at: DateTime<Utc>,
}

/// Login and password for the admin gate
#[derive(Debug)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Login or password is incorrect
    #[error("Invalid credentials")]
    InvalidCredentials,
    /// The token doesn't resolve to a live session
    #[error("Session does not exist or has expired")]
    UnknownSession,
    /// The active policy doesn't elevate sessions by credentials
    #[error("Credential elevation is not available")]
    GrantUnavailable,
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub(crate) type Result<T> = std::result::Result<T, AuthError>;

/// Decides who counts as an administrator.
///
/// One policy backs both the storefront and the admin surface, so the
/// two can never disagree about who is an admin.
pub trait AdminPolicy: Send + Sync + 'static {
    /// Checks whether the supplied credentials may elevate the session
    fn authorize(&self, session: &SessionData, credentials: &Credentials) -> Result<()>;

    fn is_admin(&self, session: &SessionData) -> bool;
}

/// The development gate: a literal comparison against two configured
/// strings, elevating the session flag on an exact match of both.
///
/// This is a convenience for local curation and NOT a security
/// boundary; anything real must verify admins out of process.
pub struct CredentialGate {
    pub login: String,
    pub password: String,
}

impl AdminPolicy for CredentialGate {
    fn authorize(&self, _session: &SessionData, credentials: &Credentials) -> Result<()> {
        if credentials.login == self.login && credentials.password == self.password {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    fn is_admin(&self, session: &SessionData) -> bool {
        session.admin
    }
}

/// The allow-list policy: a user is an admin when their Steam id is on
/// the persisted list. An absent list denies everyone.
pub struct AllowList<S> {
    storage: Arc<S>,
}

impl<S> AllowList<S> {
    pub fn new(storage: &Arc<S>) -> Self {
        Self {
            storage: storage.clone(),
        }
    }
}

impl<S> AdminPolicy for AllowList<S>
where
    S: Storage,
{
    fn authorize(&self, _session: &SessionData, _credentials: &Credentials) -> Result<()> {
        Err(AuthError::GrantUnavailable)
    }

    fn is_admin(&self, session: &SessionData) -> bool {
        let ids: Vec<String> = self
            .storage
            .get_json(ALLOW_LIST_KEY)
            .ok()
            .flatten()
            .unwrap_or_default();

        ids.iter().any(|id| *id == session.user.steam_id)
    }
}

/// Sessions and authorization over the storage seam
pub struct Auth<S, I> {
    storage: Arc<S>,
    identity: Arc<I>,
    policy: Arc<dyn AdminPolicy>,
}

impl<S, I> Auth<S, I>
where
    S: Storage,
    I: IdentityProvider,
{
    const SESSION_DURATION_IN_DAYS: i64 = 7;

    pub fn new(storage: &Arc<S>, identity: &Arc<I>, policy: Arc<dyn AdminPolicy>) -> Self {
        Self {
            storage: storage.clone(),
            identity: identity.clone(),
            policy,
        }
    }

    /// The URL to send a user to for the external login handshake
    pub async fn login_url(&self) -> Result<String> {
        Ok(self.identity.login_url().await?)
    }

    /// Exchanges the handshake callback for a new session
    pub async fn login(&self, params: &HashMap<String, String>) -> Result<SessionData> {
        let user = self.identity.resolve(params).await?;

        let session = SessionData {
            token: random_string(32),
            user,
            admin: false,
            expires_at: Utc::now() + Duration::days(Self::SESSION_DURATION_IN_DAYS),
        };

        self.persist(&session)?;

        info!("{} logged in", session.user.name);

        Ok(session)
    }

    /// Returns the session for a token, clearing it if it has expired
    pub fn session(&self, token: &str) -> Result<SessionData> {
        let key = session_key(token);

        let session: SessionData = self
            .storage
            .get_json(&key)?
            .ok_or(AuthError::UnknownSession)?;

        if session.expires_at < Utc::now() {
            self.storage.clear(&key)?;
            return Err(AuthError::UnknownSession);
        }

        Ok(session)
    }

    /// Deletes the associated session, if it exists
    pub fn logout(&self, token: &str) -> Result<()> {
        Ok(self.storage.clear(&session_key(token))?)
    }

    pub fn is_authenticated(&self, token: &str) -> bool {
        self.session(token).is_ok()
    }

    pub fn is_admin(&self, session: &SessionData) -> bool {
        self.policy.is_admin(session)
    }

    /// Elevates a session through the active policy.
    ///
    /// A rejection leaves the session exactly as it was.
    pub fn grant_admin(&self, token: &str, credentials: &Credentials) -> Result<SessionData> {
        let mut session = self.session(token)?;

        self.policy.authorize(&session, credentials)?;

        session.admin = true;
        self.persist(&session)?;

        Ok(session)
    }

    /// Drops the session's admin flag
    pub fn revoke_admin(&self, token: &str) -> Result<SessionData> {
        let mut session = self.session(token)?;

        session.admin = false;
        self.persist(&session)?;

        Ok(session)
    }

    /// Replaces the persisted admin allow-list
    pub fn set_allow_list(&self, steam_ids: &[String]) -> Result<()> {
        Ok(self.storage.set_json(ALLOW_LIST_KEY, &steam_ids)?)
    }

    pub fn allow_list(&self) -> Result<Vec<String>> {
        Ok(self.storage.get_json(ALLOW_LIST_KEY)?.unwrap_or_default())
    }

    fn persist(&self, session: &SessionData) -> Result<()> {
        Ok(self
            .storage
            .set_json(&session_key(&session.token), session)?)
    }
}

fn session_key(token: &str) -> String {
    format!("session:{token}")
}
