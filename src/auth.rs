//! Sign-in and the company email-domain allow-list.
//!
//! [`IdentityProvider`] is the seam to whatever actually verifies
//! credentials. [`AuthGate`] wraps a provider, rejects accounts outside a
//! single email domain, and keeps one session per successful sign-in. Each
//! request names its session through the [`SESSION_COOKIE`] cookie.

use anyhow::{bail, Result};
use futures::future::BoxFuture;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tokio::sync::{watch, RwLock};
use tracing::{info, warn};

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "meet365_session";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not signed in")]
    NotSignedIn,

    #[error("Invalid credential")]
    InvalidCredential,

    #[error("Only {allowed} accounts can sign in, got '{email}'")]
    DomainRejected { email: String, allowed: String },

    #[error("Identity provider error: {0}")]
    Provider(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uid: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Checks credentials. Holds no sign-in state of its own.
pub trait IdentityProvider: Send + Sync {
    /// The user a credential belongs to.
    fn verify(&self, credential: String) -> BoxFuture<'_, Result<User, AuthError>>;
}

/// One configured account for [`StaticIdentityProvider`].
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub credential: String,
    pub user: User,
}

// Keeps the credential out of logs
impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("credential", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

impl Account {
    /// True if `presented` is this account's credential. Runs in constant
    /// time for equal-length inputs.
    pub fn accepts(&self, presented: &str) -> bool {
        let stored = self.credential.as_bytes();
        let presented = presented.as_bytes();
        stored.len() == presented.len() && bool::from(stored.ct_eq(presented))
    }

    /// Parse `credential|uid|email[|display name]` entries separated by commas.
    pub fn parse_list(raw: &str) -> Result<Vec<Account>> {
        raw.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(Account::parse)
            .collect()
    }

    fn parse(entry: &str) -> Result<Account> {
        let parts: Vec<&str> = entry.split('|').map(str::trim).collect();
        let (credential, uid, email, display_name) = match parts.as_slice() {
            [credential, uid, email] => (*credential, *uid, *email, None),
            [credential, uid, email, name] => (*credential, *uid, *email, Some(name.to_string())),
            _ => bail!("Account entry must be 'credential|uid|email[|name]', got {} fields", parts.len()),
        };

        if credential.is_empty() || uid.is_empty() || !email.contains('@') {
            bail!("Account entry for uid '{}' is incomplete", uid);
        }

        Ok(Account {
            credential: credential.to_string(),
            user: User {
                uid: uid.to_string(),
                email: email.to_string(),
                display_name,
            },
        })
    }
}

/// Identity provider backed by a fixed account list.
pub struct StaticIdentityProvider {
    accounts: Vec<Account>,
}

impl StaticIdentityProvider {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn verify(&self, credential: String) -> BoxFuture<'_, Result<User, AuthError>> {
        Box::pin(async move {
            self.accounts
                .iter()
                .find(|account| account.accepts(&credential))
                .map(|account| account.user.clone())
                .ok_or(AuthError::InvalidCredential)
        })
    }
}

/// A signed-in session. The token goes back to the client in
/// [`SESSION_COOKIE`].
#[derive(Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

/// Email-domain allow-list in front of an [`IdentityProvider`], plus the
/// table of live sessions.
///
/// Every session has its own state channel. [`AuthGate::subscribe`] hands
/// out a receiver that sees the session's user and then `None` once it is
/// signed out.
pub struct AuthGate {
    provider: Arc<dyn IdentityProvider>,
    allowed_domain: String,
    sessions: RwLock<HashMap<String, watch::Sender<Option<User>>>>,
}

impl AuthGate {
    pub fn new(provider: Arc<dyn IdentityProvider>, allowed_domain: impl Into<String>) -> Self {
        Self {
            provider,
            allowed_domain: allowed_domain.into(),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn allowed_domain(&self) -> &str {
        &self.allowed_domain
    }

    /// True if `email` belongs to the allowed domain. Case-insensitive.
    pub fn is_allowed(&self, email: &str) -> bool {
        email
            .to_lowercase()
            .ends_with(&format!("@{}", self.allowed_domain.to_lowercase()))
    }

    /// Verify `credential` and open a session for it.
    ///
    /// Accounts outside the allowed domain are turned away before any
    /// session exists, so a rejected sign-in never touches other sessions.
    pub async fn sign_in(&self, credential: String) -> Result<Session, AuthError> {
        let user = self.provider.verify(credential).await?;

        if !self.is_allowed(&user.email) {
            warn!("Rejected sign-in from {} (allowed domain: {})", user.email, self.allowed_domain);
            return Err(AuthError::DomainRejected {
                email: user.email,
                allowed: self.allowed_domain.clone(),
            });
        }

        let token = new_session_token();
        let (state, _) = watch::channel(Some(user.clone()));
        self.sessions.write().await.insert(token.clone(), state);

        info!("User {} signed in", user.uid);
        Ok(Session { token, user })
    }

    /// End one session. Returns false if the token was unknown.
    pub async fn sign_out(&self, token: &str) -> bool {
        match self.sessions.write().await.remove(token) {
            Some(state) => {
                if let Some(user) = state.send_replace(None) {
                    info!("User {} signed out", user.uid);
                }
                true
            }
            None => false,
        }
    }

    /// The user behind a session token, if the session is live.
    pub async fn user_for(&self, token: &str) -> Option<User> {
        self.sessions
            .read()
            .await
            .get(token)
            .and_then(|state| state.borrow().clone())
    }

    pub async fn require_user(&self, token: Option<&str>) -> Result<User, AuthError> {
        match token {
            Some(token) => self.user_for(token).await.ok_or(AuthError::NotSignedIn),
            None => Err(AuthError::NotSignedIn),
        }
    }

    /// Sign-in state of one session, or `None` for an unknown token.
    pub async fn subscribe(&self, token: &str) -> Option<watch::Receiver<Option<User>>> {
        self.sessions.read().await.get(token).map(watch::Sender::subscribe)
    }
}

/// 256 random bits, hex encoded.
fn new_session_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// `Set-Cookie` value for a new session.
pub fn session_cookie(token: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, token)
}

/// `Set-Cookie` value that clears the session cookie.
pub fn cleared_session_cookie() -> String {
    format!("{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax", SESSION_COOKIE)
}
