//! Client-held identity: who is logged in, with which role and bearer token.
//!
//! [`AuthContext`] is the single owner of the current [`Session`]. It is built
//! from a [`SessionStore`] with [`AuthContext::rehydrate`] and is the only
//! thing that writes the persisted entries.

mod store;

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

pub use store::{FileStore, MemoryStore, SessionStore, StoreError};

pub const TOKEN_KEY: &str = "token";
pub const USERNAME_KEY: &str = "username";
pub const ROLE_KEY: &str = "userRole";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("cannot log in without a {0}")]
    Incomplete(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Admin,
    Member,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Member => "member",
            Role::Other(role) => role,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        match value {
            "admin" => Role::Admin,
            "member" => Role::Member,
            other => Role::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct Identity {
    pub username: String,
    pub token: SecretString,
    pub role: Role,
}

/// Either nobody is logged in, or all of username, token and role are known.
#[derive(Debug, Default)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated(Identity),
}

impl Session {
    pub fn is_logged_in(&self) -> bool {
        matches!(self, Session::Authenticated(_))
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated(identity) => Some(identity),
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.identity().map(|i| i.username.as_str())
    }

    pub fn user_role(&self) -> Option<&Role> {
        self.identity().map(|i| &i.role)
    }

    pub fn token(&self) -> Option<&SecretString> {
        self.identity().map(|i| &i.token)
    }

    pub fn is_admin(&self) -> bool {
        self.user_role().is_some_and(Role::is_admin)
    }
}

pub struct AuthContext<S> {
    store: S,
    session: Session,
}

impl<S: SessionStore> AuthContext<S> {
    /// Restores the session persisted in `store`. Anything short of a
    /// complete, non-empty triple leaves the context logged out.
    pub fn rehydrate(store: S) -> Result<Self, StoreError> {
        let (token, username, role) = match read_identity(&store) {
            Ok(entries) => entries,
            Err(StoreError::Json(e)) => {
                tracing::warn!("Ignoring unreadable persisted session: {e}");
                (None, None, None)
            }
            Err(e) => return Err(e),
        };

        let session = match (token, username, role) {
            (Some(token), Some(username), Some(role)) => {
                tracing::debug!(%username, "Restored persisted session");
                Session::Authenticated(Identity {
                    username,
                    token: SecretString::from(token),
                    role: Role::from(role.as_str()),
                })
            }
            (None, None, None) => Session::Anonymous,
            _ => {
                tracing::warn!("Ignoring incomplete persisted session");
                Session::Anonymous
            }
        };
        Ok(Self { store, session })
    }

    /// Persists the identity, then makes it current. The three entries are
    /// written together; if that fails both the store and the in-memory
    /// session keep the previous identity.
    pub fn login(&mut self, username: &str, token: &str, role: &str) -> Result<(), AuthError> {
        for (field, value) in [("username", username), ("token", token), ("role", role)] {
            if value.trim().is_empty() {
                return Err(AuthError::Incomplete(field));
            }
        }
        self.store.update(&[
            (USERNAME_KEY, Some(username)),
            (TOKEN_KEY, Some(token)),
            (ROLE_KEY, Some(role)),
        ])?;
        self.session = Session::Authenticated(Identity {
            username: username.to_owned(),
            token: SecretString::from(token.to_owned()),
            role: Role::from(role),
        });
        tracing::info!(%username, %role, "Logged in");
        Ok(())
    }

    /// Clears the persisted entries, then the in-memory session.
    pub fn logout(&mut self) -> Result<(), StoreError> {
        self.store
            .update(&[(TOKEN_KEY, None), (USERNAME_KEY, None), (ROLE_KEY, None)])?;
        self.session = Session::Anonymous;
        tracing::info!("Logged out");
        Ok(())
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_logged_in()
    }

    pub fn username(&self) -> Option<&str> {
        self.session.username()
    }

    pub fn user_role(&self) -> Option<&Role> {
        self.session.user_role()
    }
}

type StoredIdentity = (Option<String>, Option<String>, Option<String>);

fn read_identity(store: &impl SessionStore) -> Result<StoredIdentity, StoreError> {
    Ok((
        non_empty(store.get(TOKEN_KEY)?),
        non_empty(store.get(USERNAME_KEY)?),
        non_empty(store.get(ROLE_KEY)?),
    ))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Renders the value sent in an `Authorization` header.
pub fn bearer_header(token: &SecretString) -> String {
    format!("Bearer {}", token.expose_secret())
}
