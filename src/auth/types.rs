// Authentication types

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Username/password pair used for a single authentication attempt
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Cached bearer token and its absolute expiry
#[derive(Debug, Clone)]
pub struct TokenState {
    pub token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl TokenState {
    pub fn empty() -> Self {
        Self {
            token: None,
            expires_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// Valid iff a token is present and expiry is strictly after `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.token.is_some() && now < self.expires_at
    }
}

/// Body of `POST /auth`
#[derive(Serialize)]
pub struct AuthRequest<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub username: &'a str,
    pub password: &'a str,
}

impl<'a> AuthRequest<'a> {
    pub fn normal(creds: &'a Credentials) -> Self {
        Self {
            kind: "normal",
            username: &creds.username,
            password: &creds.password,
        }
    }
}
