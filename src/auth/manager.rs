// Token manager holding the single cached Taiga session token
//
// The token is obtained through `POST /auth`, stamped with a local expiry and
// reused until it lapses or a 401 clears it.

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use super::clock::{Clock, SystemClock};
use super::credentials;
use super::exchange;
use super::types::{Credentials, TokenState};
use crate::config::Config;
use crate::error::{Result, TaigaError};

/// Authentication manager
/// Owns the single token slot shared by every tool invocation
pub struct AuthManager {
    /// Current token and its expiry
    state: Arc<RwLock<TokenState>>,

    /// Serialises authentication exchanges so concurrent callers share one login
    login_lock: Mutex<()>,

    /// Configured defaults (API URL, credentials, token lifetime)
    config: Config,

    /// HTTP client for the auth endpoint
    client: Client,

    /// Time source for expiry checks
    clock: Arc<dyn Clock>,
}

impl AuthManager {
    /// Create a new AuthManager using the wall clock
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a new AuthManager with an explicit time source
    pub fn with_clock(config: &Config, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.http_request_timeout))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            state: Arc::new(RwLock::new(TokenState::empty())),
            login_lock: Mutex::new(()),
            config: config.clone(),
            client,
            clock,
        })
    }

    /// Create an AuthManager that already holds a token valid for one hour
    #[cfg(any(test, feature = "test-utils"))]
    pub fn new_for_testing(token: String, config: &Config) -> anyhow::Result<Self> {
        let manager = Self::new(config)?;
        {
            let mut state = manager
                .state
                .try_write()
                .context("Token state unexpectedly locked")?;
            state.token = Some(token);
            state.expires_at = Utc::now() + Duration::hours(1);
        }
        Ok(manager)
    }

    /// Whether a token is cached and its expiry is still in the future
    pub async fn is_authenticated(&self) -> bool {
        let state = self.state.read().await;
        state.is_valid_at(self.clock.now())
    }

    /// Expiry of the cached token (the epoch when none is cached)
    pub async fn expires_at(&self) -> DateTime<Utc> {
        self.state.read().await.expires_at
    }

    /// Authenticate and cache the returned token.
    ///
    /// Explicit credentials win over the configured defaults; the resulting
    /// token supersedes whatever was cached before.
    pub async fn authenticate(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<String> {
        let creds = credentials::resolve(username, password, &self.config)?;

        let _guard = self.login_lock.lock().await;
        self.login(&creds).await
    }

    /// Get a valid token, authenticating with configured credentials when
    /// nothing usable is cached
    pub async fn get_token(&self) -> Result<String> {
        if let Some(token) = self.cached_token().await {
            return Ok(token);
        }

        let creds = credentials::resolve(None, None, &self.config)?;

        let _guard = self.login_lock.lock().await;
        // Another caller may have logged in while we waited
        if let Some(token) = self.cached_token().await {
            return Ok(token);
        }

        tracing::debug!("No valid token cached, authenticating...");
        self.login(&creds).await
    }

    /// Discard the cached token, forcing the next `get_token` to log in again
    pub async fn clear_token(&self) {
        let mut state = self.state.write().await;
        *state = TokenState::empty();
    }

    /// Run the exchange and store the result; callers hold `login_lock`
    async fn login(&self, creds: &Credentials) -> Result<String> {
        let token =
            exchange::exchange_credentials(&self.client, &self.config.api_url, creds).await?;

        let expires_at = self.expiry_from(self.clock.now())?;
        {
            let mut state = self.state.write().await;
            state.token = Some(token.clone());
            state.expires_at = expires_at;
        }

        tracing::debug!(expires_at = %expires_at.to_rfc3339(), "Token cached");
        Ok(token)
    }

    async fn cached_token(&self) -> Option<String> {
        let state = self.state.read().await;
        if state.is_valid_at(self.clock.now()) {
            state.token.clone()
        } else {
            None
        }
    }

    /// `now + TOKEN_EXPIRATION`, refusing lifetimes chrono cannot represent
    fn expiry_from(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        i64::try_from(self.config.token_expiration)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                TaigaError::Config(format!(
                    "TOKEN_EXPIRATION of {} seconds is out of range",
                    self.config.token_expiration
                ))
            })
    }
}
